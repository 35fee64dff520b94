use std::fmt;

use serde::Serialize;

use crate::replace::AccessResult;

/// Running totals over the whole trace. Only ever incremented.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug, Serialize)]
pub struct StatsReport {
    hits: u64,
    misses: u64,
    evictions: u64,
    accesses: u64,
    miss_rate: f64,
}

impl Stats {
    pub fn record(&mut self, result: AccessResult) {
        match result {
            AccessResult::Hit => self.hits += 1,
            AccessResult::Miss => self.misses += 1,
            AccessResult::MissEviction => {
                self.misses += 1;
                self.evictions += 1;
            }
        }
    }

    pub fn accesses(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn make_report(&self) -> StatsReport {
        let accesses = self.accesses();
        let miss_rate = if accesses == 0 {
            0.0
        } else {
            self.misses as f64 / accesses as f64
        };
        StatsReport {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            accesses,
            miss_rate,
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits:{} misses:{} evictions:{}",
            self.hits, self.misses, self.evictions
        )
    }
}
