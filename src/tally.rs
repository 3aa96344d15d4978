//! Per-worker counters and the error histogram, folded together at the end of a run.

use ahash::AHashMap;
use std::collections::BTreeMap;

/// Line count, bad count and a histogram of failure messages.
///
/// Each worker owns one and hands it over by value when it exits; the pool
/// folds them with [`Tally::combine`], which is associative and commutative.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tally {
    pub lines: u64,
    pub bad: u64,
    pub errors: AHashMap<String, u64>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one failed line under `message`.
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.bad += 1;
        *self.errors.entry(message.into()).or_insert(0) += 1;
    }

    /// Lines that were handled without an error.
    pub fn succeeded(&self) -> u64 {
        self.lines.saturating_sub(self.bad)
    }

    pub fn combine(mut self, other: Tally) -> Tally {
        self.lines += other.lines;
        self.bad += other.bad;
        for (msg, n) in other.errors {
            *self.errors.entry(msg).or_insert(0) += n;
        }
        self
    }

    /// Histogram with keys in sorted order, for reports.
    pub fn sorted_errors(&self) -> BTreeMap<String, u64> {
        self.errors.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }
}
