//! Canonical encoding.
//!
//! Values are encoded as compact JSON. `serde_json::Map` is ordered by key
//! (the `preserve_order` feature is never enabled in this workspace) and
//! derived `Serialize` impls emit struct fields in declaration order, so the
//! encoding of a value does not depend on how it was built.

use cadb_types::ObjectId;
use serde::Serialize;

use crate::hasher::{ContentHasher, HasherError};

/// A value's canonical encoding together with the identity derived from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canonical {
    pub id: ObjectId,
    pub encoding: Vec<u8>,
}

impl Canonical {
    /// Digest an already-canonical encoding.
    pub fn from_encoding(encoding: Vec<u8>) -> Self {
        let id = ContentHasher::OBJECT.hash(&encoding);
        Self { id, encoding }
    }
}

/// Encode `value` canonically and derive its identity.
pub fn canonicalize<T: Serialize + ?Sized>(value: &T) -> Result<Canonical, HasherError> {
    let encoding =
        serde_json::to_vec(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
    Ok(Canonical::from_encoding(encoding))
}
