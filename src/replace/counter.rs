use crate::cache::{Addr, Cache, Line};

use super::{AccessResult, Replace};

/// Approximate LRU: every access to a set ages each line it does not hit,
/// and a miss into a full set replaces the oldest line.
#[derive(Debug, Default, Clone, Copy)]
pub struct Counter;

impl Replace for Counter {
    fn access(cache: &mut Cache<Self>, addr: Addr) -> AccessResult {
        let n_ways = cache.n_ways;
        let (set_slice, occupancy) = cache.set_mut(addr.set);

        let mut hit = false;
        for line in &mut set_slice[..*occupancy] {
            if line.tag == addr.tag {
                line.counter = 0;
                hit = true;
            } else {
                line.counter += 1;
            }
        }

        if hit {
            AccessResult::Hit
        } else if *occupancy < n_ways {
            set_slice[*occupancy] = Line::fill(addr.tag);
            *occupancy += 1;
            AccessResult::Miss
        } else {
            let victim_way = victim(set_slice);
            set_slice[victim_way] = Line::fill(addr.tag);
            AccessResult::MissEviction
        }
    }
}

/// Way with the largest counter. Ties go to the lowest way, so `max_by_key`
/// (which keeps the last maximum) is not an option here.
fn victim(lines: &[Line]) -> usize {
    lines
        .iter()
        .enumerate()
        .fold(0, |max_way, (way, line)| {
            if line.counter > lines[max_way].counter {
                way
            } else {
                max_way
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Geometry;
    use pretty_assertions_sorted as diff;
    use AccessResult::*;

    fn cache(ways: usize) -> Cache<Counter> {
        Cache::new(Geometry::new(1, ways, 1).unwrap(), Counter).unwrap()
    }

    fn touch(cache: &mut Cache<Counter>, tag: u64) -> AccessResult {
        cache.access(Addr {
            offset: 0,
            set: 0,
            tag,
        })
    }

    fn counters(cache: &Cache<Counter>) -> Vec<(u64, u64)> {
        cache
            .resident(0)
            .iter()
            .map(|line| (line.tag, line.counter))
            .collect()
    }

    #[test]
    fn direct_mapped() {
        let mut c = cache(1);
        diff::assert_eq!(touch(&mut c, 7), Miss);
        diff::assert_eq!(touch(&mut c, 7), Hit);
        diff::assert_eq!(touch(&mut c, 7), Hit);
        diff::assert_eq!(touch(&mut c, 9), MissEviction);
        diff::assert_eq!(touch(&mut c, 7), MissEviction);
        diff::assert_eq!(counters(&c), vec![(7, 0)]);
    }

    #[test]
    fn aging_on_hit_and_fill() {
        let mut c = cache(4);
        diff::assert_eq!(touch(&mut c, 1), Miss);
        diff::assert_eq!(touch(&mut c, 2), Miss);
        diff::assert_eq!(touch(&mut c, 3), Miss);
        diff::assert_eq!(counters(&c), vec![(1, 2), (2, 1), (3, 0)]);

        diff::assert_eq!(touch(&mut c, 1), Hit);
        diff::assert_eq!(counters(&c), vec![(1, 0), (2, 2), (3, 1)]);
        diff::assert_eq!(c.occupancy[0], 3);
        diff::assert_eq!(c.occupancy[1], 0);
    }

    #[test]
    fn evicts_oldest() {
        let mut c = cache(3);
        for tag in [1, 2, 3] {
            touch(&mut c, tag);
        }
        touch(&mut c, 1);
        // counters now 1:0, 2:2, 3:1
        diff::assert_eq!(touch(&mut c, 4), MissEviction);
        diff::assert_eq!(counters(&c), vec![(1, 1), (4, 0), (3, 2)]);
        diff::assert_eq!(touch(&mut c, 5), MissEviction);
        diff::assert_eq!(counters(&c), vec![(1, 2), (4, 1), (5, 0)]);
    }

    #[test]
    fn ties_evict_lowest_way() {
        let lines = [
            Line { tag: 1, counter: 3 },
            Line { tag: 2, counter: 3 },
        ];
        diff::assert_eq!(victim(&lines), 0);

        let lines = [
            Line { tag: 1, counter: 1 },
            Line { tag: 2, counter: 4 },
            Line { tag: 3, counter: 4 },
        ];
        diff::assert_eq!(victim(&lines), 1);
    }

    #[test]
    fn sets_are_independent() {
        let mut c = cache(1);
        let other = Addr {
            offset: 0,
            set: 1,
            tag: 7,
        };
        diff::assert_eq!(touch(&mut c, 7), Miss);
        diff::assert_eq!(c.access(other), Miss);
        diff::assert_eq!(touch(&mut c, 7), Hit);
        diff::assert_eq!(c.resident(1), &[Line::fill(7)]);
    }
}
