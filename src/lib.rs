//! Library Search: a concurrent catalogue search aggregator
//!
//! A query is checked against the tenant configuration, sent to every
//! enabled backend (Aquabrowser SRU and Summon) at once, and the outcomes
//! are joined into one result keyed by backend. A failing backend is
//! reported in place and never hides the others.

pub mod config;
pub mod engines;
pub mod metrics;
pub mod network;
pub mod results;
pub mod search;
pub mod web;

pub use config::{ConfigProvider, Settings};
pub use engines::Backend;
pub use results::{AggregateResult, BackendError, BackendOutcome, Record, ResultSet};
pub use search::{LibrarySearch, SearchError};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
