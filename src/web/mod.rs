//! Web server module
//!
//! Exposes library search over HTTP, plus health and statistics endpoints.

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
