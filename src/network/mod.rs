//! HTTP networking module
//!
//! Provides the HTTP client used by every search backend.

mod client;

pub use client::HttpClient;
