// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only history of full graph snapshots.
//!
//! Each entry holds a complete configuration map, so restoring an entry never
//! depends on replaying intermediate states. Entries are never removed or
//! reordered within a session.

use serde_json::Value;

/// A labelled snapshot of the whole graph.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Human readable label shown in history listings.
    pub label: String,
    /// Full configuration map captured when the entry was added.
    pub snapshot: Value,
}

/// Ordered collection of history entries.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a snapshot with the given label.
    pub fn push(&mut self, label: String, snapshot: Value) {
        self.entries.push(HistoryEntry { label, snapshot });
    }

    /// Returns the entry at `index`, oldest first.
    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Labels of all entries, oldest first.
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }
}
