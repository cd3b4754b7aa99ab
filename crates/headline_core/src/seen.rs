use std::collections::HashSet;

use crate::Entry;

/// Entries already reported by earlier runs.
///
/// Membership only; the on-disk log keeps the order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeenSet {
    entries: HashSet<Entry>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from log lines. Each line is trimmed; blank lines are skipped.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        lines.into_iter().filter_map(Entry::normalize).collect()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains(text)
    }

    /// Returns `true` when the entry was not present before.
    pub fn insert(&mut self, entry: Entry) -> bool {
        self.entries.insert(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Entry> for SeenSet {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
