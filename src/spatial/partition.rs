//! Sorted interval storage with coarse fixed buckets.
//!
//! Entries are kept sorted by interval minimum. Bucket starts sit at fixed
//! fractions of the indexed value range ([`BUCKET_FRACTIONS`]); each bucket
//! owns the run of entries whose minimum falls inside it. A query narrows to
//! the buckets it can touch, binary searches inside that window and then
//! filters the remaining run lazily.

use ordered_float::OrderedFloat;

use crate::constants::BUCKET_FRACTIONS;
use crate::error::{PointPlaneError, Result};
use crate::spatial::Interval;

/// An indexed value and the interval it covers.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry<T> {
    /// Covered interval.
    pub interval: Interval,
    /// Indexed value.
    pub value: T,
}

impl<T> Entry<T> {
    /// Pair a value with its interval.
    #[must_use]
    pub const fn new(interval: Interval, value: T) -> Self {
        Self { interval, value }
    }
}

/// Sort entries into the order [`SpatialPartitionMap::new`] expects.
pub fn sort_entries<T>(entries: &mut [Entry<T>]) {
    entries.sort_by_key(|entry| OrderedFloat(entry.interval.min));
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Bucket {
    start: f64,
    begin: usize,
    end: usize,
}

/// Interval index over entries sorted by minimum.
#[derive(Clone, Debug, PartialEq)]
pub struct SpatialPartitionMap<T> {
    entries: Vec<Entry<T>>,
    /// Running maximum of `interval.max` over `entries[..=i]`.
    reach: Vec<f64>,
    buckets: Vec<Bucket>,
}

impl<T> Default for SpatialPartitionMap<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            reach: Vec::new(),
            buckets: Vec::new(),
        }
    }
}

impl<T> SpatialPartitionMap<T> {
    /// Index entries already sorted by interval minimum.
    ///
    /// # Errors
    /// Returns [`PointPlaneError::UnsortedEntries`] when the entries are out
    /// of order or a minimum is NaN.
    ///
    /// # Examples
    /// ```
    /// use pointplane::spatial::{Entry, Interval, SpatialPartitionMap};
    /// let map = SpatialPartitionMap::new(vec![
    ///     Entry::new(Interval::new(0.0, 1.0), 'a'),
    ///     Entry::new(Interval::new(2.0, 3.0), 'b'),
    /// ])?;
    /// let hits: Vec<char> = map.view_for(Interval::new(2.5, 4.0)).copied().collect();
    /// assert_eq!(hits, vec!['b']);
    /// # Ok::<(), pointplane::error::PointPlaneError>(())
    /// ```
    pub fn new(entries: Vec<Entry<T>>) -> Result<Self> {
        let sorted = entries
            .windows(2)
            .all(|pair| matches!(pair, [first, second] if first.interval.min <= second.interval.min))
            && entries.iter().all(|entry| !entry.interval.min.is_nan());
        if !sorted {
            return Err(PointPlaneError::UnsortedEntries);
        }
        Ok(Self::from_sorted(entries))
    }

    /// Index entries in any order.
    #[must_use]
    pub fn from_unsorted(mut entries: Vec<Entry<T>>) -> Self {
        sort_entries(&mut entries);
        Self::from_sorted(entries)
    }

    fn from_sorted(entries: Vec<Entry<T>>) -> Self {
        let reach = entries
            .iter()
            .scan(f64::NEG_INFINITY, |running, entry| {
                *running = running.max(entry.interval.max);
                Some(*running)
            })
            .collect();
        let buckets = make_buckets(&entries);
        Self {
            entries,
            reach,
            buckets,
        }
    }

    /// Number of indexed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in index order.
    #[must_use]
    pub fn entries(&self) -> &[Entry<T>] {
        &self.entries
    }

    /// Lazily yields the values whose intervals overlap `query`.
    #[must_use]
    pub fn view_for(&self, query: Interval) -> PartitionView<'_, T> {
        let (window_begin, window_end) = self.window_for(query);
        let window_reach = self.reach.get(window_begin..window_end).unwrap_or(&[]);
        let begin = window_begin + window_reach.partition_point(|reach| *reach < query.min);
        let window = self.entries.get(begin..window_end).unwrap_or(&[]);
        let end = begin + window.partition_point(|entry| entry.interval.min <= query.max);
        PartitionView {
            remaining: self.entries.get(begin..end).unwrap_or(&[]).iter(),
            query,
        }
    }

    /// Index window spanned by the buckets `query` can reach.
    fn window_for(&self, query: Interval) -> (usize, usize) {
        let first = self
            .buckets
            .iter()
            .find(|bucket| {
                bucket.begin < bucket.end
                    && bucket
                        .end
                        .checked_sub(1)
                        .and_then(|last| self.reach.get(last))
                        .is_some_and(|reach| *reach >= query.min)
            })
            .map_or(self.entries.len(), |bucket| bucket.begin);
        let last = self
            .buckets
            .iter()
            .rev()
            .find(|bucket| bucket.start <= query.max && bucket.begin < bucket.end)
            .map_or(0, |bucket| bucket.end);
        (first, last.max(first))
    }
}

fn make_buckets<T>(entries: &[Entry<T>]) -> Vec<Bucket> {
    let (Some(first), Some(highest)) = (
        entries.first().map(|entry| entry.interval.min),
        entries
            .iter()
            .map(|entry| OrderedFloat(entry.interval.max))
            .max()
            .map(OrderedFloat::into_inner),
    ) else {
        return Vec::new();
    };
    let span = highest - first;
    let starts: Vec<f64> = BUCKET_FRACTIONS
        .iter()
        .map(|fraction| first + fraction * span)
        .chain(std::iter::once(f64::INFINITY))
        .collect();
    starts
        .windows(2)
        .filter_map(|pair| match pair {
            [start, next] => Some(Bucket {
                start: *start,
                begin: entries.partition_point(|entry| entry.interval.min < *start),
                end: entries.partition_point(|entry| entry.interval.min < *next),
            }),
            _ => None,
        })
        .collect()
}

/// Lazy, read-only iteration over the values overlapping a query.
#[derive(Clone, Debug)]
pub struct PartitionView<'a, T> {
    remaining: std::slice::Iter<'a, Entry<T>>,
    query: Interval,
}

impl<'a, T> Iterator for PartitionView<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let query = self.query;
        self.remaining
            .by_ref()
            .find(|entry| entry.interval.overlaps(&query))
            .map(|entry| &entry.value)
    }
}
