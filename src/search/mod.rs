//! Search orchestration module
//!
//! Checks a query against the tenant configuration, dispatches it to every
//! enabled backend concurrently and joins the outcomes.

mod error;
mod executor;
mod gate;
mod models;
mod service;

pub use error::SearchError;
pub use executor::Aggregator;
pub use gate::{QueryGate, FEATURE_SECTION};
pub use models::DispatchPlan;
pub use service::LibrarySearch;
