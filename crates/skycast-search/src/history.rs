//! Bounded, deduplicated, most-recent-first search history.

/// Maximum number of recent searches kept.
pub const MAX_HISTORY: usize = 5;

/// Cities suggested when the history is empty.
pub const DEFAULT_CITIES: &[&str] = &["Paris", "London", "Tokyo", "New York", "Sydney"];

/// Ordered list of recent successful queries.
///
/// Invariants: no two entries are equal case-insensitively, length never
/// exceeds `MAX_HISTORY`, and the front entry is the most recently
/// promoted one.
#[derive(Debug, Clone, Default)]
pub struct SearchHistory {
    entries: Vec<String>,
}

impl SearchHistory {
    /// Build a history from stored entries, re-applying the invariants.
    ///
    /// Stored data may predate the current bound or contain duplicates;
    /// entries are trimmed, blanks dropped, case-insensitive duplicates
    /// keep their first (most recent) occurrence.
    pub fn from_entries(stored: Vec<String>) -> Self {
        let mut history = Self::default();
        for entry in stored {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            if history.entries.len() >= MAX_HISTORY {
                break;
            }
            if !history.contains(entry) {
                history.entries.push(entry.to_string());
            }
        }
        history
    }

    /// Move `query` to the front, replacing any case-insensitive duplicate
    /// with the new spelling, and truncate to the bound.
    pub fn promote(&mut self, query: &str) {
        let lowered = query.to_lowercase();
        self.entries.retain(|e| e.to_lowercase() != lowered);
        self.entries.insert(0, query.to_string());
        self.entries.truncate(MAX_HISTORY);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn contains(&self, query: &str) -> bool {
        let lowered = query.to_lowercase();
        self.entries.iter().any(|e| e.to_lowercase() == lowered)
    }
}
