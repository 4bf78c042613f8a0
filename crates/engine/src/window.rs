use crate::error::{Result, TrendingError};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A half-open time interval `[start, start + size)` in unix seconds.
///
/// Identity, hashing and ordering use `start` only: two windows with the same
/// start are the same window whatever their size.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    start: i64,
    size: i64,
}

impl Window {
    #[must_use]
    pub const fn new(start: i64, size: i64) -> Self {
        Self { start, size }
    }

    #[must_use]
    pub const fn start(&self) -> i64 {
        self.start
    }

    /// Exclusive end of the interval, clamped to `i64::MAX`
    #[must_use]
    pub const fn end(&self) -> i64 {
        self.start.saturating_add(self.size)
    }

    #[must_use]
    pub const fn size(&self) -> i64 {
        self.size
    }

    #[must_use]
    pub const fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp < self.end()
    }
}

impl PartialEq for Window {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start
    }
}

impl Eq for Window {}

impl Hash for Window {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start.hash(state);
    }
}

impl PartialOrd for Window {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Window {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start.cmp(&other.start)
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.start, self.end())
    }
}

/// Maps timestamps onto the overlapping windows that contain them and
/// remembers every window start it has handed out.
#[derive(Debug, Clone)]
pub struct WindowIndex {
    window_size: i64,
    granularity: i64,
    cache: HashMap<i64, Window>,
}

impl WindowIndex {
    /// Both values must be positive with `granularity <= window_size`;
    /// `TrendingConfig::validate` enforces this before an index is built.
    #[must_use]
    pub fn new(window_size: i64, granularity: i64) -> Self {
        debug_assert!(granularity > 0 && granularity <= window_size);
        Self {
            window_size,
            granularity,
            cache: HashMap::new(),
        }
    }

    #[must_use]
    pub const fn window_size(&self) -> i64 {
        self.window_size
    }

    #[must_use]
    pub const fn granularity(&self) -> i64 {
        self.granularity
    }

    /// Start of the anchor window: the largest multiple of granularity <= timestamp.
    ///
    /// `None` when that multiple is below `i64::MIN`.
    #[must_use]
    pub const fn anchor_start(&self, timestamp: i64) -> Option<i64> {
        timestamp.checked_sub(timestamp.rem_euclid(self.granularity))
    }

    /// Anchor window for a timestamp, without recording it.
    ///
    /// Fails when the anchor window would start or end outside `i64`.
    pub fn anchor(&self, timestamp: i64) -> Result<Window> {
        self.anchor_start(timestamp)
            .filter(|start| start.checked_add(self.window_size).is_some())
            .map(|start| Window::new(start, self.window_size))
            .ok_or(TrendingError::TimestampOutOfRange(timestamp))
    }

    /// All windows containing `timestamp`.
    ///
    /// The first element is the anchor window, the rest follow in descending
    /// start order. Every returned start is cached.
    pub fn windows_for(&mut self, timestamp: i64) -> Result<Vec<Window>> {
        let size = self.window_size;
        let starts = self.starts_for(timestamp)?;
        Ok(starts
            .into_iter()
            .map(|start| {
                *self
                    .cache
                    .entry(start)
                    .or_insert_with(|| Window::new(start, size))
            })
            .collect())
    }

    /// Same windows as [`WindowIndex::windows_for`], without recording them
    pub fn lookup(&self, timestamp: i64) -> Result<Vec<Window>> {
        Ok(self
            .starts_for(timestamp)?
            .into_iter()
            .map(|start| self.window_at(start))
            .collect())
    }

    fn starts_for(&self, timestamp: i64) -> Result<Vec<i64>> {
        let mut starts = Vec::with_capacity(self.windows_per_timestamp());
        let mut start = self.anchor(timestamp)?.start();
        loop {
            starts.push(start);
            // timestamp - start < window_size here, so this cannot overflow
            if timestamp - start + self.granularity >= self.window_size {
                break;
            }
            start = start
                .checked_sub(self.granularity)
                .ok_or(TrendingError::TimestampOutOfRange(timestamp))?;
        }
        Ok(starts)
    }

    /// Whether any window starting at `start` has been handed out
    #[must_use]
    pub fn is_observed(&self, start: i64) -> bool {
        self.cache.contains_key(&start)
    }

    /// Cached window for `start`, or a fresh unrecorded one
    #[must_use]
    pub fn window_at(&self, start: i64) -> Window {
        self.cache
            .get(&start)
            .copied()
            .unwrap_or_else(|| Window::new(start, self.window_size))
    }

    /// Number of distinct window starts seen so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Upper bound on how many windows contain a single timestamp
    fn windows_per_timestamp(&self) -> usize {
        usize::try_from((self.window_size + self.granularity - 1) / self.granularity).unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn window_identity_ignores_size() {
        assert_eq!(Window::new(120, 60), Window::new(120, 900));
        assert!(Window::new(0, 900) < Window::new(120, 60));
        assert_eq!(Window::new(120, 60).to_string(), "120, 180");
    }

    #[test]
    fn windows_for_aligned_timestamp() {
        let mut index = WindowIndex::new(60, 15);
        let starts: Vec<i64> = index
            .windows_for(120)
            .unwrap()
            .iter()
            .map(Window::start)
            .collect();
        // 60 itself is excluded: [60, 120) does not contain 120
        assert_eq!(starts, vec![120, 105, 90, 75]);
    }

    #[test]
    fn windows_for_unaligned_timestamp() {
        let mut index = WindowIndex::new(900, 120);
        let starts: Vec<i64> = index
            .windows_for(1_000_000_000)
            .unwrap()
            .iter()
            .map(Window::start)
            .collect();
        assert_eq!(starts.len(), 8);
        assert_eq!(starts[0], 999_999_960);
        assert_eq!(*starts.last().unwrap(), 999_999_120);
    }

    #[test]
    fn tumbling_windows_yield_single_window() {
        let mut index = WindowIndex::new(60, 60);
        let windows = index.windows_for(125).unwrap();
        assert_eq!(windows, vec![Window::new(120, 60)]);
    }

    #[test]
    fn negative_timestamps_floor_toward_negative_infinity() {
        let index = WindowIndex::new(60, 15);
        assert_eq!(index.anchor_start(-1), Some(-15));
        assert_eq!(index.anchor_start(-15), Some(-15));
    }

    #[test]
    fn extreme_timestamps_are_rejected_not_wrapped() {
        let mut index = WindowIndex::new(60, 15);

        // i64::MIN is 7 above the nearest lower multiple of 15
        assert_eq!(index.anchor_start(i64::MIN), None);
        assert_eq!(
            index.windows_for(i64::MIN),
            Err(TrendingError::TimestampOutOfRange(i64::MIN))
        );
        // Anchor fits but older overlapping windows would start below i64::MIN
        assert!(index.windows_for(i64::MIN + 8).is_err());

        // Anchor window would end past i64::MAX
        assert_eq!(
            index.lookup(i64::MAX),
            Err(TrendingError::TimestampOutOfRange(i64::MAX))
        );
        assert!(index.is_empty());

        // Just inside both ends every window is representable
        let low = index.windows_for(i64::MIN + 120).unwrap();
        assert_eq!(low.len(), 4);
        let high = index.windows_for(i64::MAX - 120).unwrap();
        assert_eq!(high.len(), 4);
        assert!(high.iter().all(|w| w.contains(i64::MAX - 120)));

        assert_eq!(Window::new(i64::MAX - 10, 60).end(), i64::MAX);
    }

    #[test]
    fn cache_records_every_start() {
        let mut index = WindowIndex::new(60, 15);
        index.windows_for(120).unwrap();
        index.windows_for(125).unwrap();
        assert_eq!(index.len(), 4);
        assert!(index.is_observed(75));
        assert!(!index.is_observed(60));

        // Lookups do not count as observations
        assert_eq!(index.lookup(30).unwrap().len(), 4);
        assert!(!index.is_observed(30));

        index.clear();
        assert!(index.is_empty());
    }

    proptest! {
        #[test]
        fn proptest_anchor_is_first_and_all_windows_contain_timestamp(
            timestamp in -10_000_000i64..10_000_000i64,
            granularity in 1i64..600,
            factor in 1i64..10,
        ) {
            let window_size = granularity * factor;
            let mut index = WindowIndex::new(window_size, granularity);
            let windows = index.windows_for(timestamp).unwrap();

            let anchor = timestamp - timestamp.rem_euclid(granularity);
            prop_assert_eq!(windows[0].start(), anchor);
            prop_assert_eq!(windows.len() as i64, factor);
            for window in &windows {
                prop_assert!(window.contains(timestamp));
                prop_assert_eq!(window.start().rem_euclid(granularity), 0);
            }
        }

        #[test]
        fn proptest_uneven_window_sizes_cover_timestamp(
            timestamp in 0i64..10_000_000i64,
            granularity in 1i64..600,
            extra in 0i64..600,
        ) {
            let window_size = granularity + extra;
            let mut index = WindowIndex::new(window_size, granularity);
            let windows = index.windows_for(timestamp).unwrap();

            prop_assert!(!windows.is_empty());
            for pair in windows.windows(2) {
                prop_assert_eq!(pair[0].start() - pair[1].start(), granularity);
            }
            for window in &windows {
                prop_assert!(window.contains(timestamp));
            }
            // The next window back would no longer contain the timestamp
            let before = windows.last().unwrap().start() - granularity;
            prop_assert!(!Window::new(before, window_size).contains(timestamp));
        }
    }
}
