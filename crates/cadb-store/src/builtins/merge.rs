use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{DatabaseError, DatabaseResult};
use crate::resolver::{ResolveInput, Resolver};

/// `merge`: shallow merge of object-valued dependencies. Keys from later
/// dependencies win. An object in `args` is merged first, as defaults.
pub struct MergeResolver;

#[async_trait]
impl Resolver for MergeResolver {
    fn kind(&self) -> &str {
        "merge"
    }

    async fn resolve(&self, input: &ResolveInput<'_>) -> DatabaseResult<Value> {
        let mut merged = match input.args() {
            Value::Object(defaults) => defaults.clone(),
            Value::Null => Map::new(),
            other => {
                return Err(DatabaseError::computation(format!(
                    "merge defaults must be an object, got {other}"
                )))
            }
        };
        for (i, dep) in input.deps.iter().enumerate() {
            let Value::Object(fields) = dep.as_ref() else {
                return Err(DatabaseError::computation(format!(
                    "merge dependency {i} is not an object"
                )));
            };
            merged.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        Ok(Value::Object(merged))
    }
}
