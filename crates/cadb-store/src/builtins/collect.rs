use async_trait::async_trait;
use serde_json::Value;

use crate::error::DatabaseResult;
use crate::resolver::{ResolveInput, Resolver};

/// `collect`: an array of the dependency values in declaration order.
pub struct CollectResolver;

#[async_trait]
impl Resolver for CollectResolver {
    fn kind(&self) -> &str {
        "collect"
    }

    async fn resolve(&self, input: &ResolveInput<'_>) -> DatabaseResult<Value> {
        Ok(Value::Array(
            input.deps.iter().map(|v| Value::clone(v)).collect(),
        ))
    }
}
