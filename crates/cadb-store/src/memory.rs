use std::sync::Arc;

use async_trait::async_trait;
use cadb_types::ObjectId;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::coordinator::{self, Admission, FlightPublisher, Outcome};
use crate::entry::{Entry, EntryStatus, EntryTable};
use crate::error::{DatabaseError, DatabaseResult};
use crate::object::{Object, Recipe};
use crate::resolver::{ResolveInput, Resolver, ResolverRegistry};
use crate::scope::Scope;
use crate::traits::Database;

struct Inner {
    table: EntryTable,
    registry: ResolverRegistry,
    config: StoreConfig,
}

/// In-memory object database.
///
/// A cheap-to-clone handle: clones share the same entries and resolvers.
/// Each resolution runs on its own tokio task, detached from the caller that
/// started it, so `resolve` must be called from within a tokio runtime.
///
/// A waiter that is cancelled stops waiting; the computation still runs to
/// completion and its outcome is recorded, even when no waiters remain.
#[derive(Clone)]
pub struct InMemoryDatabase {
    inner: Arc<Inner>,
}

impl InMemoryDatabase {
    /// A database with the default configuration and built-in resolvers.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// A database with `config` and the built-in resolvers.
    pub fn with_config(config: StoreConfig) -> Self {
        Self::with_registry(config, ResolverRegistry::with_builtins())
    }

    /// A database with `config` that resolves through `registry`.
    pub fn with_registry(config: StoreConfig, registry: ResolverRegistry) -> Self {
        Self {
            inner: Arc::new(Inner {
                table: EntryTable::new(),
                registry,
                config,
            }),
        }
    }

    /// Register (or replace) the resolver for its kind.
    pub fn register(&self, resolver: Arc<dyn Resolver>) {
        self.inner.registry.register(resolver);
    }

    /// The configuration this database was created with.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// A root scope bound to this database.
    pub fn scope(&self) -> Scope {
        Scope::bound(Arc::new(self.clone()))
    }

    /// Number of entries in any state.
    pub fn len(&self) -> usize {
        self.inner.table.len()
    }

    /// Returns `true` if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All identities, sorted.
    pub fn all_ids(&self) -> Vec<ObjectId> {
        self.inner.table.ids()
    }

    /// Resolution status of `id`, or `None` if it was never stored.
    pub fn status(&self, id: &ObjectId) -> Option<EntryStatus> {
        self.inner.table.read(id, Entry::status)
    }

    /// The canonical encoding `id` was derived from.
    pub fn encoding(&self, id: &ObjectId) -> Option<Arc<[u8]>> {
        self.inner.table.read(id, |entry| Arc::clone(&entry.encoding))
    }

    /// Run `recipe` on its own task and settle the flight with the outcome.
    fn launch(&self, id: ObjectId, recipe: Recipe, publisher: FlightPublisher) {
        let scope = self.scope();
        let inner = Arc::clone(&self.inner);
        let computation = tokio::spawn({
            let inner = Arc::clone(&inner);
            async move { inner.compute(&scope, id, &recipe).await }
        });
        tokio::spawn(async move {
            let outcome = match computation.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(id = %id.short_hex(), error = %e, "resolver task did not complete");
                    let cause = if e.is_panic() {
                        DatabaseError::Panicked
                    } else {
                        DatabaseError::Abandoned
                    };
                    Err(DatabaseError::resolution_failed(id, cause))
                }
            };
            coordinator::settle(&inner.table, publisher, outcome);
        });
    }
}

impl Inner {
    /// Resolve the declared dependencies in order, then run the resolver.
    /// The first failing dependency stops the computation before the
    /// resolver is invoked.
    async fn compute(&self, scope: &Scope, id: ObjectId, recipe: &Recipe) -> Outcome {
        let database = scope.get()?;
        let mut deps = Vec::with_capacity(recipe.deps.len());
        for dep in &recipe.deps {
            let value = database
                .resolve(scope, *dep)
                .await
                .map_err(|e| DatabaseError::resolution_failed(id, e))?;
            deps.push(value);
        }

        let resolver = self.registry.get(&recipe.kind).ok_or_else(|| {
            DatabaseError::resolution_failed(
                id,
                DatabaseError::UnknownResolver(recipe.kind.clone()),
            )
        })?;
        let input = ResolveInput {
            id,
            recipe,
            deps: &deps,
            scope,
        };
        let value = resolver
            .resolve(&input)
            .await
            .map_err(|e| DatabaseError::resolution_failed(id, e))?;
        Ok(Arc::new(value))
    }
}

impl Default for InMemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Database for InMemoryDatabase {
    fn store(&self, id: ObjectId, object: Object, encoding: Vec<u8>) -> DatabaseResult<()> {
        let recipe = object.is_recipe();
        let entry = Entry::new(object, encoding);
        if self
            .inner
            .table
            .insert(id, entry, self.inner.config.duplicate_policy)?
        {
            debug!(id = %id.short_hex(), recipe, "object stored");
        } else {
            debug!(id = %id.short_hex(), "object already stored; reusing");
        }
        Ok(())
    }

    async fn resolve(&self, scope: &Scope, id: ObjectId) -> DatabaseResult<Arc<Value>> {
        let admission = coordinator::admit(&self.inner.table, id, self.inner.config.failure_policy)?;
        match admission {
            Admission::Ready(value) => Ok(value),
            Admission::Join(waiter) => {
                debug!(id = %id.short_hex(), "joined in-flight resolution");
                waiter.wait(scope).await
            }
            Admission::Lead {
                recipe,
                publisher,
                waiter,
            } => {
                self.launch(id, recipe, publisher);
                waiter.wait(scope).await
            }
        }
    }

    fn contains(&self, id: &ObjectId) -> bool {
        self.inner.table.contains(id)
    }

    fn dependencies(&self, id: &ObjectId) -> Option<Vec<ObjectId>> {
        self.inner.table.read(id, Entry::dependencies)
    }
}

impl std::fmt::Debug for InMemoryDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDatabase")
            .field("entry_count", &self.len())
            .field("config", &self.inner.config)
            .finish()
    }
}
