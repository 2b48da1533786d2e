//! Foundation types for cadb.
//!
//! Every other cadb crate depends on `cadb-types` for the identity type that
//! keys the object database.
//!
//! # Key Types
//!
//! - [`ObjectId`] — Content-addressed identifier (BLAKE3 digest of a canonical encoding)
//! - [`TypeError`] — Parse failures for identifiers

pub mod error;
pub mod object;

pub use error::TypeError;
pub use object::ObjectId;
