use async_trait::async_trait;
use serde_json::Value;

use crate::error::{DatabaseError, DatabaseResult};
use crate::resolver::{ResolveInput, Resolver};

/// `concat`: concatenates string dependencies into one string, or array
/// dependencies into one array. Mixing the two is an error; no dependencies
/// yields `null`.
///
/// For strings, `args` may carry `{"separator": "..."}`.
pub struct ConcatResolver;

#[async_trait]
impl Resolver for ConcatResolver {
    fn kind(&self) -> &str {
        "concat"
    }

    async fn resolve(&self, input: &ResolveInput<'_>) -> DatabaseResult<Value> {
        let Some(first) = input.deps.first() else {
            return Ok(Value::Null);
        };
        match first.as_ref() {
            Value::String(_) => {
                let separator = input
                    .args()
                    .get("separator")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                let parts = input
                    .deps
                    .iter()
                    .enumerate()
                    .map(|(i, dep)| {
                        dep.as_str().ok_or_else(|| {
                            DatabaseError::computation(format!(
                                "concat dependency {i} is not a string"
                            ))
                        })
                    })
                    .collect::<DatabaseResult<Vec<&str>>>()?;
                Ok(Value::String(parts.join(separator)))
            }
            Value::Array(_) => {
                let mut out = Vec::new();
                for (i, dep) in input.deps.iter().enumerate() {
                    let items = dep.as_array().ok_or_else(|| {
                        DatabaseError::computation(format!("concat dependency {i} is not an array"))
                    })?;
                    out.extend(items.iter().cloned());
                }
                Ok(Value::Array(out))
            }
            other => Err(DatabaseError::computation(format!(
                "concat needs strings or arrays, got {other}"
            ))),
        }
    }
}
