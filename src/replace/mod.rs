pub mod counter;

use std::fmt;

use crate::cache::{Addr, Cache};

pub trait Replace: Sized {
    /// Looks `addr` up in its set, filling or replacing a line on a miss.
    fn access(cache: &mut Cache<Self>, addr: Addr) -> AccessResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessResult {
    Hit,
    Miss,
    MissEviction,
}

impl AccessResult {
    pub fn is_hit(self) -> bool {
        self == AccessResult::Hit
    }
}

impl fmt::Display for AccessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AccessResult::Hit => "hit",
            AccessResult::Miss => "miss",
            AccessResult::MissEviction => "miss eviction",
        })
    }
}
