//! Content-addressed, lazily-resolving object database.
//!
//! Objects are stored under the BLAKE3 digest of their canonical encoding,
//! so identical content always collapses to one entry. An object is either a
//! raw value or a [`Recipe`]: a resolvable naming a registered [`Resolver`],
//! its arguments, and the identities it depends on. Recipes are resolved on
//! first demand and the result is cached.
//!
//! # Operations
//!
//! All operations take an explicit [`Scope`] bound to one [`Database`]:
//!
//! - [`store`] / [`store_value`] -- persist an object, returning its identity
//! - [`resolve`] / [`resolve_as`] -- the final value of an identity
//! - [`build`] -- store a recipe, then resolve it
//! - [`contains`] -- membership, never blocking
//!
//! # Resolution Rules
//!
//! 1. A resolved entry is immutable and returned without waiting.
//! 2. At most one computation runs per identity; concurrent callers wait for
//!    it and all observe the same outcome.
//! 3. Dependencies resolve before the recipe's resolver runs; a failed
//!    dependency fails the dependent without invoking its resolver.
//! 4. Failures are recorded, never cached as values. Whether a later resolve
//!    re-raises or retries is [`FailurePolicy`].
//! 5. Cancelling a waiter's scope detaches that waiter only.
//! 6. Dependency cycles through nested resolves are a caller error and are
//!    not detected at runtime.
//!
//! # Storage Backends
//!
//! - [`InMemoryDatabase`] -- `HashMap`-based database for tests and embedding

pub mod api;
pub mod builtins;
pub mod config;
mod coordinator;
pub mod entry;
pub mod error;
pub mod graph;
pub mod memory;
pub mod object;
pub mod resolver;
pub mod scope;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use api::{build, contains, resolve, resolve_as, store, store_value};
pub use config::{DuplicatePolicy, FailurePolicy, StoreConfig};
pub use entry::EntryStatus;
pub use error::{ConfigError, DatabaseError, DatabaseResult};
pub use graph::{dependency_report, DependencyReport};
pub use memory::InMemoryDatabase;
pub use object::{Object, Recipe};
pub use resolver::{FnResolver, ResolveInput, Resolver, ResolverRegistry};
pub use scope::{CancelHandle, Scope};
pub use traits::Database;

pub use cadb_types::ObjectId;
