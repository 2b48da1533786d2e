use cadb_crypto::HasherError;
use cadb_types::ObjectId;

/// Errors from database operations.
///
/// `Clone` because a single resolution failure is delivered to every caller
/// waiting on the same identity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatabaseError {
    /// Store under the `reject` duplicate policy found a live entry.
    #[error("object already mapped: {0}")]
    AlreadyExists(ObjectId),

    /// No entry exists for the identity.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// Resolving `id` failed; `source` is the resolver's own failure or the
    /// failure of a dependency it needed.
    #[error("resolution of {id} failed: {source}")]
    ResolutionFailed {
        id: ObjectId,
        source: Box<DatabaseError>,
    },

    /// A resolver's computation rejected its inputs.
    #[error("computation failed: {0}")]
    Computation(String),

    #[error("no resolver registered for kind {0:?}")]
    UnknownResolver(String),

    #[error("resolver panicked")]
    Panicked,

    /// The resolution task stopped without publishing an outcome (runtime
    /// shutdown).
    #[error("resolution abandoned before completion")]
    Abandoned,

    /// Canonical encoding failed.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// A resolved value did not have the shape the caller asked for.
    #[error("cannot decode {id}: {reason}")]
    Decode { id: ObjectId, reason: String },

    #[error("scope has no database bound")]
    BindingMissing,

    #[error("scope already holds a database")]
    BindingConflict,

    /// The caller's scope was cancelled while it waited on `id`.
    #[error("resolution of {0} cancelled by caller")]
    Cancelled(ObjectId),
}

impl DatabaseError {
    /// Shorthand for resolver implementations.
    pub fn computation(reason: impl Into<String>) -> Self {
        Self::Computation(reason.into())
    }

    pub(crate) fn resolution_failed(id: ObjectId, source: DatabaseError) -> Self {
        Self::ResolutionFailed {
            id,
            source: Box::new(source),
        }
    }

    /// Binding errors mean the scope was assembled wrongly; callers must not
    /// try to recover from them.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::BindingMissing | Self::BindingConflict)
    }

    /// The innermost error of a `ResolutionFailed` chain.
    pub fn root_cause(&self) -> &DatabaseError {
        let mut current = self;
        while let Self::ResolutionFailed { source, .. } = current {
            current = source;
        }
        current
    }

    /// Identities along the failure chain, from the identity the caller asked
    /// for down to the one where the failure originated.
    pub fn chain(&self) -> Vec<ObjectId> {
        let mut ids = Vec::new();
        let mut current = self;
        while let Self::ResolutionFailed { id, source } = current {
            ids.push(*id);
            current = source;
        }
        if let Self::NotFound(id) = current {
            ids.push(*id);
        }
        ids
    }
}

impl From<HasherError> for DatabaseError {
    fn from(e: HasherError) -> Self {
        match e {
            HasherError::Serialization(reason) => Self::Encoding(reason),
        }
    }
}

/// Result alias for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors from loading a [`crate::StoreConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid store configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(tag: &[u8]) -> ObjectId {
        ObjectId::from_bytes(tag)
    }

    #[test]
    fn chain_walks_nested_failures() {
        let err = DatabaseError::resolution_failed(
            id(b"a"),
            DatabaseError::resolution_failed(id(b"b"), DatabaseError::computation("boom")),
        );
        assert_eq!(err.chain(), vec![id(b"a"), id(b"b")]);
        assert_eq!(err.root_cause(), &DatabaseError::computation("boom"));
    }

    #[test]
    fn chain_ends_at_missing_dependency() {
        let err = DatabaseError::resolution_failed(id(b"a"), DatabaseError::NotFound(id(b"gone")));
        assert_eq!(err.chain(), vec![id(b"a"), id(b"gone")]);
    }

    #[test]
    fn only_binding_errors_are_fatal() {
        assert!(DatabaseError::BindingMissing.is_fatal());
        assert!(DatabaseError::BindingConflict.is_fatal());
        assert!(!DatabaseError::NotFound(id(b"x")).is_fatal());
        assert!(!DatabaseError::Cancelled(id(b"x")).is_fatal());
    }

    #[test]
    fn display_includes_failing_identity_and_cause() {
        let err = DatabaseError::resolution_failed(id(b"a"), DatabaseError::computation("bad"));
        let msg = err.to_string();
        assert!(msg.contains(&id(b"a").to_hex()));
        assert!(msg.ends_with("computation failed: bad"));
    }

    #[test]
    fn hasher_errors_become_encoding_errors() {
        let err: DatabaseError = HasherError::Serialization("nope".into()).into();
        assert_eq!(err, DatabaseError::Encoding("nope".into()));
    }
}
