use std::fmt;
use serde::{Deserialize, Serialize};
use crate::cache::AccessResult;

/// Hit, miss and eviction counters for one simulation run. Can be serialised for reporting
///
/// Counters only ever go up; they are fed the results the cache model hands back and never
/// inspect the cache themselves
#[derive(Debug, Default, Copy, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Stats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl Stats {
    /// Counts one classified access. An eviction is also a miss
    pub fn record(&mut self, result: AccessResult) {
        match result {
            AccessResult::Hit => self.hits += 1,
            AccessResult::MissClean => self.misses += 1,
            AccessResult::MissEviction => {
                self.misses += 1;
                self.evictions += 1;
            }
        }
    }

    pub fn accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of accesses that hit, 0 when nothing was accessed
    pub fn hit_rate(&self) -> f64 {
        match self.accesses() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hits:{} misses:{} evictions:{}", self.hits, self.misses, self.evictions)
    }
}
