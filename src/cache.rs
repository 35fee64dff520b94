use std::ops::{Not, Range};

use crate::{
    config::{Geometry, ADDR_BITS},
    error::Error,
    replace::{AccessResult, Replace},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Addr {
    pub offset: u64,
    pub set: usize,
    pub tag: u64,
}

#[derive(Debug)]
pub struct BitSection {
    shift: u32,
    mask: u64,
}

impl BitSection {
    fn new(shift: u32, width: u32) -> Self {
        let mask = if width >= ADDR_BITS {
            0u64.not()
        } else {
            (1u64 << width) - 1
        };
        BitSection { shift, mask }
    }

    fn apply(&self, num: u64) -> u64 {
        // shifting a u64 by 64 would overflow; those bits are all gone anyway
        num.checked_shr(self.shift).unwrap_or(0) & self.mask
    }
}

/// One slot of a set. Only the first `occupancy` slots of a set are meaningful.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub tag: u64,
    /// Accesses to this set since the line was last hit or filled.
    pub counter: u64,
}

impl Line {
    pub fn fill(tag: u64) -> Self {
        Line { tag, counter: 0 }
    }
}

#[derive(Debug)]
pub struct Cache<R: Replace> {
    pub lines: Vec<Line>,
    pub occupancy: Vec<usize>,
    pub n_ways: usize,
    pub n_sets: usize,
    offset_sec: BitSection,
    set_sec: BitSection,
    tag_sec: BitSection,
    pub repl: R,
}

impl<R: Replace> Cache<R> {
    /// Allocates all `n_sets * n_ways` lines up front. The store never grows afterwards.
    pub fn new(geometry: Geometry, repl: R) -> Result<Self, Error> {
        let n_ways = geometry.ways;
        let exhausted = || Error::ResourceExhausted {
            set_bits: geometry.set_bits,
            ways: n_ways,
        };

        let n_sets = geometry.n_sets().ok_or_else(exhausted)?;
        let n_lines = n_sets.checked_mul(n_ways).ok_or_else(exhausted)?;

        let mut lines = Vec::new();
        lines.try_reserve_exact(n_lines).map_err(|_| exhausted())?;
        lines.resize(n_lines, Line::default());

        let mut occupancy = Vec::new();
        occupancy.try_reserve_exact(n_sets).map_err(|_| exhausted())?;
        occupancy.resize(n_sets, 0);

        let offset_sec = BitSection::new(0, geometry.block_bits);
        let set_sec = BitSection::new(geometry.block_bits, geometry.set_bits);
        let tag_sec = BitSection::new(geometry.block_bits + geometry.set_bits, ADDR_BITS);

        Ok(Cache {
            lines,
            occupancy,
            n_ways,
            n_sets,
            offset_sec,
            set_sec,
            tag_sec,
            repl,
        })
    }

    pub fn access(&mut self, addr: Addr) -> AccessResult {
        R::access(self, addr)
    }

    pub fn split_addr(&self, addr: u64) -> Addr {
        let offset = self.offset_sec.apply(addr);
        // the set section is narrower than n_sets, which already fit in a usize
        let set = self.set_sec.apply(addr) as usize;
        let tag = self.tag_sec.apply(addr);
        Addr { offset, set, tag }
    }

    pub fn get_set(&self, set: usize) -> Range<usize> {
        set * self.n_ways..(set + 1) * self.n_ways
    }

    /// All slots of `set` together with its occupancy count.
    pub fn set_mut(&mut self, set: usize) -> (&mut [Line], &mut usize) {
        let range = self.get_set(set);
        (&mut self.lines[range], &mut self.occupancy[set])
    }

    /// The occupied lines of `set`, in fill order.
    pub fn resident(&self, set: usize) -> &[Line] {
        let range = self.get_set(set);
        &self.lines[range][..self.occupancy[set]]
    }
}
