//! Caller-facing operations.
//!
//! Each function reaches the database bound to the given [`Scope`]. Identity
//! derivation happens here, so backends only ever see `(id, object,
//! encoding)` triples.

use std::sync::Arc;

use cadb_types::ObjectId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{DatabaseError, DatabaseResult};
use crate::object::{Object, Recipe};
use crate::scope::Scope;

/// Store `object` and return its identity.
///
/// Whether storing an already-mapped identity is an error depends on the
/// database's duplicate policy.
pub fn store(scope: &Scope, object: impl Into<Object>) -> DatabaseResult<ObjectId> {
    let object = object.into();
    let canonical = object.canonical()?;
    scope.get()?.store(canonical.id, object, canonical.encoding)?;
    Ok(canonical.id)
}

/// Store any serializable Rust value as a raw value.
pub fn store_value<T: Serialize + ?Sized>(scope: &Scope, value: &T) -> DatabaseResult<ObjectId> {
    let value = serde_json::to_value(value).map_err(|e| DatabaseError::Encoding(e.to_string()))?;
    store(scope, Object::Value(value))
}

/// Resolve `id` to its final value.
pub async fn resolve(scope: &Scope, id: ObjectId) -> DatabaseResult<Arc<Value>> {
    scope.get()?.resolve(scope, id).await
}

/// Resolve `id` and decode the value as `T`.
pub async fn resolve_as<T: DeserializeOwned>(scope: &Scope, id: ObjectId) -> DatabaseResult<T> {
    let value = resolve(scope, id).await?;
    T::deserialize(value.as_ref()).map_err(|e| DatabaseError::Decode {
        id,
        reason: e.to_string(),
    })
}

/// Store `recipe`, then resolve it.
pub async fn build(scope: &Scope, recipe: Recipe) -> DatabaseResult<Arc<Value>> {
    let id = store(scope, recipe)?;
    resolve(scope, id).await
}

/// Whether `id` has an entry in any state. Never waits on resolution; the
/// only possible error is a missing binding.
pub fn contains(scope: &Scope, id: &ObjectId) -> DatabaseResult<bool> {
    Ok(scope.get()?.contains(id))
}
