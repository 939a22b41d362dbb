//! Search backend module
//!
//! Defines the Backend trait and provides a registry for all search backends.

mod loader;
mod registry;
mod traits;
pub(crate) mod xml;

// Backend implementations
pub mod aquabrowser;
pub mod summon;

pub use loader::BackendLoader;
pub use registry::BackendRegistry;
pub use traits::*;
