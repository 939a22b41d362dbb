//! Record model shared by every backend
//!
//! Defines normalized hits, per-backend result sets and the composite result
//! returned for one query.

mod container;
mod types;

pub use container::AggregateResult;
pub use types::*;
