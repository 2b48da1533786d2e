//! Built-in resolvers.

pub mod collect;
pub mod concat;
pub mod merge;

pub use collect::CollectResolver;
pub use concat::ConcatResolver;
pub use merge::MergeResolver;
