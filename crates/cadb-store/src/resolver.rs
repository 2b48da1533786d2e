//! Resolvers: the registered handlers that turn a [`Recipe`] into a value.
//!
//! A recipe names its resolver by `kind`. The database resolves the recipe's
//! declared dependencies first and hands the resolver their values; a
//! resolver may also store and resolve further objects through
//! [`ResolveInput::scope`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use cadb_types::ObjectId;
use serde_json::Value;
use tracing::warn;

use crate::builtins::{CollectResolver, ConcatResolver, MergeResolver};
use crate::error::DatabaseResult;
use crate::object::Recipe;
use crate::scope::Scope;

/// Everything a resolver sees for one resolution.
pub struct ResolveInput<'a> {
    /// Identity of the recipe being resolved.
    pub id: ObjectId,
    pub recipe: &'a Recipe,
    /// Resolved values of `recipe.deps`, in the same order.
    pub deps: &'a [Arc<Value>],
    /// Scope bound to the resolving database, for nested operations.
    pub scope: &'a Scope,
}

impl ResolveInput<'_> {
    /// The recipe's arguments.
    pub fn args(&self) -> &Value {
        &self.recipe.args
    }
}

/// A handler for one recipe kind.
///
/// Object-safe and `Send + Sync` so resolvers can live in a shared registry
/// as `Arc<dyn Resolver>`.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// The recipe kind this resolver handles (e.g. "collect").
    fn kind(&self) -> &str;

    async fn resolve(&self, input: &ResolveInput<'_>) -> DatabaseResult<Value>;
}

/// Adapts a synchronous closure into a [`Resolver`].
pub struct FnResolver<F> {
    kind: String,
    f: F,
}

impl<F> FnResolver<F>
where
    F: Fn(&ResolveInput<'_>) -> DatabaseResult<Value> + Send + Sync,
{
    /// Wrap `f` as the resolver for `kind`.
    pub fn new(kind: impl Into<String>, f: F) -> Self {
        Self {
            kind: kind.into(),
            f,
        }
    }
}

#[async_trait]
impl<F> Resolver for FnResolver<F>
where
    F: Fn(&ResolveInput<'_>) -> DatabaseResult<Value> + Send + Sync,
{
    fn kind(&self) -> &str {
        &self.kind
    }

    async fn resolve(&self, input: &ResolveInput<'_>) -> DatabaseResult<Value> {
        (self.f)(input)
    }
}

/// Kind-keyed table of resolvers.
pub struct ResolverRegistry {
    resolvers: RwLock<HashMap<String, Arc<dyn Resolver>>>,
}

impl ResolverRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            resolvers: RwLock::new(HashMap::new()),
        }
    }

    /// A registry holding the built-in `collect`, `merge` and `concat`
    /// resolvers.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(CollectResolver));
        registry.register(Arc::new(MergeResolver));
        registry.register(Arc::new(ConcatResolver));
        registry
    }

    /// Register a resolver under its kind, replacing any earlier one.
    ///
    /// Replacing a kind changes what future resolutions compute for recipes
    /// that are not yet resolved; already resolved entries keep their value.
    pub fn register(&self, resolver: Arc<dyn Resolver>) {
        let kind = resolver.kind().to_string();
        let mut map = self.resolvers.write().expect("registry lock poisoned");
        if map.insert(kind.clone(), resolver).is_some() {
            warn!(%kind, "resolver replaced");
        }
    }

    /// The resolver registered for `kind`, if any.
    pub fn get(&self, kind: &str) -> Option<Arc<dyn Resolver>> {
        self.resolvers
            .read()
            .expect("registry lock poisoned")
            .get(kind)
            .cloned()
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<String> {
        let map = self.resolvers.read().expect("registry lock poisoned");
        let mut kinds: Vec<String> = map.keys().cloned().collect();
        kinds.sort();
        kinds
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
