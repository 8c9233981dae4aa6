//! Frequency counters with stable top-N selection.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, Copy)]
struct Tally {
    count: u64,
    /// Index of the first time this key was seen, for stable ordering.
    first_seen: usize,
}

/// Counts occurrences per key during one aggregation pass.
///
/// Besides the counts themselves, the counter remembers each key's first
/// encounter so [`FrequencyCounter::top`] can break count ties by
/// encounter order, keeping selection deterministic across runs over the
/// same input.
#[derive(Debug, Clone, Default)]
pub struct FrequencyCounter<K: Eq + Hash + Clone> {
    entries: HashMap<K, Tally>,
    next_index: usize,
}

impl<K: Eq + Hash + Clone> FrequencyCounter<K> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_index: 0,
        }
    }

    /// Adds one occurrence of `key`.
    pub fn increment(&mut self, key: K) {
        self.add(key, 1);
    }

    /// Adds `n` occurrences of `key`.
    pub fn add(&mut self, key: K, n: u64) {
        let next_index = &mut self.next_index;
        let tally = self.entries.entry(key).or_insert_with(|| {
            let first_seen = *next_index;
            *next_index += 1;
            Tally {
                count: 0,
                first_seen,
            }
        });
        tally.count += n;
    }

    pub fn get(&self, key: &K) -> u64 {
        self.entries.get(key).map(|t| t.count).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.values().map(|t| t.count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.entries.iter().map(|(k, t)| (k, t.count))
    }

    /// The `limit` most frequent keys, descending by count, ties broken by
    /// encounter order. `limit == 0` returns everything.
    pub fn top(&self, limit: usize) -> Vec<(K, u64)> {
        let mut ranked: Vec<(&K, &Tally)> = self.entries.iter().collect();
        ranked.sort_by(|a, b| {
            b.1.count
                .cmp(&a.1.count)
                .then(a.1.first_seen.cmp(&b.1.first_seen))
        });
        if limit > 0 {
            ranked.truncate(limit);
        }
        ranked
            .into_iter()
            .map(|(k, t)| (k.clone(), t.count))
            .collect()
    }
}
