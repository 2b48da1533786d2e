use std::sync::Arc;

use async_trait::async_trait;
use cadb_types::ObjectId;
use serde_json::Value;

use crate::error::DatabaseResult;
use crate::object::Object;
use crate::scope::Scope;

/// Backend boundary of the object database.
///
/// Callers go through the functions in [`crate::api`], which derive
/// identities and reach the backend through a [`Scope`]. Backends implement
/// this trait and must satisfy these invariants:
/// - Exactly one entry per identity; a resolved entry never changes.
/// - `store` never suspends and enforces the configured duplicate policy.
/// - `resolve` runs at most one computation per identity at a time and
///   delivers its outcome to every concurrent caller.
/// - `contains` never blocks on an in-flight resolution and never fails.
#[async_trait]
pub trait Database: Send + Sync {
    /// Accept a new entry for `id`, whose canonical encoding is `encoding`.
    fn store(&self, id: ObjectId, object: Object, encoding: Vec<u8>) -> DatabaseResult<()>;

    /// Resolve `id` to its final value, waiting for an in-flight resolution
    /// when one exists. `scope` supplies the caller's cancellation.
    async fn resolve(&self, scope: &Scope, id: ObjectId) -> DatabaseResult<Arc<Value>>;

    /// Whether any entry (pending, in flight, resolved or failed) exists.
    fn contains(&self, id: &ObjectId) -> bool;

    /// Declared dependencies of a stored object; `None` if absent.
    fn dependencies(&self, id: &ObjectId) -> Option<Vec<ObjectId>>;
}
