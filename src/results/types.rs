//! Result type definitions

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// A single search hit, normalized across backends
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    title: Option<String>,
    author: Option<String>,
    publication_date: Option<String>,
    link: Option<String>,
    content_type: Option<String>,
    thumbnail_url: Option<String>,
    publication_place: Option<String>,
    branch: Option<String>,
}

impl Record {
    /// Start building a record
    pub fn builder() -> RecordBuilder {
        RecordBuilder::default()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn publication_date(&self) -> Option<&str> {
        self.publication_date.as_deref()
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        self.thumbnail_url.as_deref()
    }

    pub fn publication_place(&self) -> Option<&str> {
        self.publication_place.as_deref()
    }

    /// Physical location identifier (not every backend has one)
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }
}

/// Builder for [`Record`]; a record cannot be changed once built
#[derive(Debug, Default)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    pub fn title(mut self, value: Option<String>) -> Self {
        self.record.title = value;
        self
    }

    pub fn author(mut self, value: Option<String>) -> Self {
        self.record.author = value;
        self
    }

    pub fn publication_date(mut self, value: Option<String>) -> Self {
        self.record.publication_date = value;
        self
    }

    pub fn link(mut self, value: Option<String>) -> Self {
        self.record.link = value;
        self
    }

    pub fn content_type(mut self, value: Option<String>) -> Self {
        self.record.content_type = value;
        self
    }

    pub fn thumbnail_url(mut self, value: Option<String>) -> Self {
        self.record.thumbnail_url = value;
        self
    }

    pub fn publication_place(mut self, value: Option<String>) -> Self {
        self.record.publication_place = value;
        self
    }

    pub fn branch(mut self, value: Option<String>) -> Self {
        self.record.branch = value;
        self
    }

    pub fn build(self) -> Record {
        self.record
    }
}

/// One backend's answer to one query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Backend-reported hit count; may exceed `records.len()`
    pub total: u64,
    /// Hits in backend order
    #[serde(rename = "results")]
    pub records: Vec<Record>,
}

impl ResultSet {
    pub fn new(total: u64, records: Vec<Record>) -> Self {
        Self { total, records }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Error value stored against a single backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendError {
    pub code: u16,
    #[serde(rename = "msg")]
    pub message: String,
}

impl BackendError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

/// Outcome of one backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOutcome {
    Success(ResultSet),
    Failure(BackendError),
}

impl BackendOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    pub fn results(&self) -> Option<&ResultSet> {
        match self {
            Self::Success(results) => Some(results),
            Self::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&BackendError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(error) => Some(error),
        }
    }
}

// Success serializes as the result set itself, failure as `{"error": {...}}`
impl Serialize for BackendOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Success(results) => results.serialize(serializer),
            Self::Failure(error) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", error)?;
                map.end()
            }
        }
    }
}

/// Per-backend timing information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timing {
    /// Backend identifier
    pub backend: String,
    /// Response time in milliseconds
    pub time_ms: u64,
    /// Whether the call produced a result set
    pub success: bool,
}
