//! Composite result keyed by backend identifier

use super::types::BackendOutcome;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Outcome of every backend dispatched for one query.
///
/// Built once by the aggregator and handed to the caller by value; there are
/// no mutating methods outside this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateResult {
    outcomes: BTreeMap<String, BackendOutcome>,
}

impl AggregateResult {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for a backend. Returns false if the key was already present.
    pub(crate) fn insert(&mut self, backend: impl Into<String>, outcome: BackendOutcome) -> bool {
        let backend = backend.into();
        if self.outcomes.contains_key(&backend) {
            return false;
        }
        self.outcomes.insert(backend, outcome);
        true
    }

    /// Get the outcome of one backend
    pub fn get(&self, backend: &str) -> Option<&BackendOutcome> {
        self.outcomes.get(backend)
    }

    /// Identifiers of the dispatched backends
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.outcomes.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BackendOutcome)> {
        self.outcomes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Backends whose call failed
    pub fn failed(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, outcome)| outcome.is_failure())
            .map(|(name, _)| name)
            .collect()
    }

    /// Sum of the per-backend records actually returned
    pub fn record_count(&self) -> usize {
        self.outcomes
            .values()
            .filter_map(|o| o.results())
            .map(|r| r.len())
            .sum()
    }
}

impl Serialize for AggregateResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.outcomes.serialize(serializer)
    }
}
