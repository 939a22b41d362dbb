//! Errors that stop a search before any backend is called

/// Precondition failures reported by the query gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// Library search is switched off for the tenant
    #[error("LibrarySearch is disabled for this tenant")]
    FeatureDisabled,

    /// Empty or whitespace-only query
    #[error("An invalid query was provided")]
    InvalidQuery,

    /// Library search is on but every backend is off
    #[error("All external search APIs are disabled for this tenant")]
    NoBackendsEnabled,
}

impl SearchError {
    /// HTTP status code reported to the caller
    pub fn code(&self) -> u16 {
        match self {
            Self::FeatureDisabled => 403,
            Self::InvalidQuery => 400,
            Self::NoBackendsEnabled => 403,
        }
    }
}
