/// Packrat memo table keyed by (rule, position)
use std::collections::HashMap;

use super::expr::{RuleId, Value};

/// Resolved or in-flight outcome of one rule at one position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { end: usize, value: Value },
    Failure,
    /// Evaluation has started but not finished; `detected` is set when the
    /// rule re-enters itself at the same position
    InProgress { detected: bool },
}

#[derive(Debug, Clone)]
pub struct MemoEntry {
    pub outcome: Outcome,
    pub uses: usize,
}

impl MemoEntry {
    fn in_progress() -> Self {
        Self {
            outcome: Outcome::InProgress { detected: false },
            uses: 1,
        }
    }
}

/// Single-level table; an entry exists only for pairs that were visited
#[derive(Debug, Default)]
pub struct MemoTable {
    entries: HashMap<(RuleId, usize), MemoEntry>,
    hits: usize,
}

impl MemoTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a cached entry, counting the visit
    pub fn lookup(&mut self, rule: RuleId, pos: usize) -> Option<&mut MemoEntry> {
        let entry = self.entries.get_mut(&(rule, pos))?;
        entry.uses += 1;
        self.hits += 1;
        Some(entry)
    }

    /// Install the in-progress sentinel for a first visit
    pub fn begin(&mut self, rule: RuleId, pos: usize) {
        self.entries.insert((rule, pos), MemoEntry::in_progress());
    }

    /// Replace the outcome, returning whether recursion was detected while
    /// the entry was in progress
    pub fn resolve(&mut self, rule: RuleId, pos: usize, outcome: Outcome) -> bool {
        let entry = self
            .entries
            .entry((rule, pos))
            .or_insert_with(MemoEntry::in_progress);
        let detected = matches!(entry.outcome, Outcome::InProgress { detected: true });
        entry.outcome = outcome;
        detected
    }

    #[must_use]
    pub fn get(&self, rule: RuleId, pos: usize) -> Option<&MemoEntry> {
        self.entries.get(&(rule, pos))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits
    }
}
