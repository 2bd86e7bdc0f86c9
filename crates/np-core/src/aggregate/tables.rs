//! Counting tables with deterministic top-N ordering.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, Copy)]
struct Slot {
    total: u64,
    /// Insertion rank of the key, used to break top-N ties by first-seen
    /// order.
    first_seen: u64,
}

/// Accumulating table keyed by IP or port.
///
/// `top(n)` sorts descending by accumulated value; equal values keep their
/// first-seen order, so repeated reads without new inserts are stable.
#[derive(Debug, Clone, Default)]
pub struct CountTable<K> {
    slots: HashMap<K, Slot>,
    next_rank: u64,
}

impl<K: Eq + Hash + Clone> CountTable<K> {
    pub fn new() -> Self {
        CountTable {
            slots: HashMap::new(),
            next_rank: 0,
        }
    }

    /// Increment the key's count by one.
    pub fn record(&mut self, key: K) {
        self.add(key, 1);
    }

    /// Add `amount` to the key's running total.
    pub fn add(&mut self, key: K, amount: u64) {
        match self.slots.get_mut(&key) {
            Some(slot) => slot.total += amount,
            None => {
                let first_seen = self.next_rank;
                self.next_rank += 1;
                self.slots.insert(
                    key,
                    Slot {
                        total: amount,
                        first_seen,
                    },
                );
            }
        }
    }

    /// Number of distinct keys observed.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Top `n` entries, descending by total, ties by first-seen order.
    pub fn top(&self, n: usize) -> Vec<(K, u64)> {
        let mut entries: Vec<(&K, &Slot)> = self.slots.iter().collect();
        entries.sort_by(|a, b| {
            b.1.total
                .cmp(&a.1.total)
                .then(a.1.first_seen.cmp(&b.1.first_seen))
        });
        entries
            .into_iter()
            .take(n)
            .map(|(key, slot)| (key.clone(), slot.total))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts() {
        let mut table = CountTable::new();
        table.record("a");
        table.record("b");
        table.record("a");
        assert_eq!(table.len(), 2);
        assert_eq!(table.top(5), vec![("a", 2), ("b", 1)]);
    }

    #[test]
    fn test_top_truncates() {
        let mut table = CountTable::new();
        for (key, count) in [("a", 1), ("b", 3), ("c", 2)] {
            table.add(key, count);
        }
        assert_eq!(table.top(2), vec![("b", 3), ("c", 2)]);
    }

    #[test]
    fn test_ties_break_by_first_seen() {
        let mut table = CountTable::new();
        table.add("late", 0);
        table.record("first");
        table.record("second");
        table.record("third");
        // All three carry count 1; order of first insertion wins.
        assert_eq!(
            table.top(3),
            vec![("first", 1), ("second", 1), ("third", 1)]
        );
    }

    #[test]
    fn test_top_is_stable_across_reads() {
        let mut table = CountTable::new();
        for port in [443u16, 80, 8080, 53] {
            table.add(port, 100);
        }
        let first = table.top(4);
        let second = table.top(4);
        assert_eq!(first, second);
    }
}
