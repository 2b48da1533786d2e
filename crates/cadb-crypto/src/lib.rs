//! Identity derivation for cadb.
//!
//! An object's identity is a domain-separated BLAKE3 digest of its canonical
//! encoding. The encoding is deterministic (same value, same bytes, across
//! processes and time) and structurally sensitive (any semantic difference
//! changes the bytes), which is all the database relies on.
//!
//! All hashing wraps the `blake3` crate — no custom cryptography.

pub mod canonical;
pub mod hasher;

pub use canonical::{canonicalize, Canonical};
pub use hasher::{ContentHasher, HasherError};
