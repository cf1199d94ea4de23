//! Hierarchical scope tree.
//!
//! An ordered forest of position-keyed interval nodes built lazily from
//! tokens, consumed by breadcrumb, folding, and indentation queries.

mod builder;
mod manager;
mod node;

pub use builder::ScopeTreeBuilder;
pub use manager::ScopeManager;
pub use node::{BraceCategory, ScopeKind, ScopeNode};
