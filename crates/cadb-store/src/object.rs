use cadb_crypto::{canonicalize, Canonical, HasherError};
use cadb_types::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

/// Anything that can be stored in the database.
///
/// The variant tag is part of the canonical encoding, so a raw value and a
/// recipe never share an identity even if their payloads coincide.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum Object {
    /// A final value. Resolving it returns the value itself.
    Value(Value),
    /// A resolvable whose final value is computed on first demand.
    Recipe(Recipe),
}

impl Object {
    /// Canonical encoding and the identity derived from it.
    pub fn canonical(&self) -> Result<Canonical, HasherError> {
        canonicalize(self)
    }

    /// Identities this object declares it depends on. Empty for raw values.
    pub fn dependencies(&self) -> &[ObjectId] {
        match self {
            Self::Value(_) => &[],
            Self::Recipe(recipe) => &recipe.deps,
        }
    }

    pub fn is_recipe(&self) -> bool {
        matches!(self, Self::Recipe(_))
    }
}

impl From<Value> for Object {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Recipe> for Object {
    fn from(recipe: Recipe) -> Self {
        Self::Recipe(recipe)
    }
}

// ---------------------------------------------------------------------------
// Recipe
// ---------------------------------------------------------------------------

/// A resolvable: the name of a registered resolver, its arguments, and the
/// identities whose resolved values it consumes.
///
/// Dependencies are resolved in declaration order before the resolver runs.
/// Their order is part of the recipe's identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub kind: String,
    #[serde(default)]
    pub args: Value,
    #[serde(default)]
    pub deps: Vec<ObjectId>,
}

impl Recipe {
    /// A recipe with no arguments and no dependencies.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            args: Value::Null,
            deps: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }

    pub fn with_dep(mut self, dep: ObjectId) -> Self {
        self.deps.push(dep);
        self
    }

    pub fn with_deps(mut self, deps: impl IntoIterator<Item = ObjectId>) -> Self {
        self.deps.extend(deps);
        self
    }
}
