//! Symbolic names used by query construction, bound (eventually) to entity storage metadata.

mod binding;
mod registry;

pub use binding::{Alias, AliasBinding, AliasKind};
pub use registry::AliasRegistry;
