//! Per-document accumulated time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::DocumentId;

/// Mapping from document to accumulated whole seconds of active time.
///
/// Values only grow, except through [`TimeLedger::reset`]. Serializes as a
/// flat JSON object (`{"notes/a.md": 42}`) with keys in sorted order so that
/// saved files are stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeLedger(BTreeMap<DocumentId, u64>);

impl TimeLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total for `doc`, or 0 when it has never been tracked.
    pub fn get(&self, doc: &str) -> u64 {
        self.0.get(doc).copied().unwrap_or(0)
    }

    /// Adds `seconds` to `doc` and returns the new total.
    pub fn add(&mut self, doc: &DocumentId, seconds: u64) -> u64 {
        let total = self.0.entry(doc.clone()).or_insert(0);
        *total = total.saturating_add(seconds);
        *total
    }

    /// Removes a document's total, returning what it held.
    pub fn reset(&mut self, doc: &str) -> Option<u64> {
        self.0.remove(doc)
    }

    /// Returns true if `doc` has an entry.
    pub fn contains(&self, doc: &str) -> bool {
        self.0.contains_key(doc)
    }

    /// Sum over every document.
    pub fn total(&self) -> u64 {
        self.0.values().fold(0, |acc, v| acc.saturating_add(*v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&DocumentId, u64)> {
        self.0.iter().map(|(doc, secs)| (doc, *secs))
    }
}

impl FromIterator<(DocumentId, u64)> for TimeLedger {
    fn from_iter<I: IntoIterator<Item = (DocumentId, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
