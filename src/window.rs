use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Event time in milliseconds (or any caller-chosen unit) since an epoch.
pub type TimestampMs = i64;

/// Smallest representable event time; start of the global window.
pub const TIMESTAMP_MIN: TimestampMs = i64::MIN;
/// Largest representable event time; end of the global window.
pub const TIMESTAMP_MAX: TimestampMs = i64::MAX;

/// A closed-open time range: [start, end).
#[derive(Copy, Clone, Debug, Serialize, Deserialize, Eq)]
pub struct Window {
    pub start: TimestampMs,
    pub end: TimestampMs,
}

impl Window {
    #[inline]
    pub fn new(start: TimestampMs, end: TimestampMs) -> Self {
        debug_assert!(end >= start);
        Self { start, end }
    }

    /// The singleton window spanning all of time.
    #[inline]
    pub const fn global() -> Self {
        Self { start: TIMESTAMP_MIN, end: TIMESTAMP_MAX }
    }

    #[inline]
    pub fn is_global(&self) -> bool {
        *self == Self::global()
    }

    /// Compute the tumbling window [win_start, win_start + size) for a timestamp.
    /// `size_ms` > 0; `offset_ms` may be negative or positive. Bounds that fall
    /// outside the `i64` range saturate at [`TIMESTAMP_MIN`] / [`TIMESTAMP_MAX`].
    #[inline]
    pub fn tumble(ts: TimestampMs, size_ms: i64, offset_ms: i64) -> Self {
        debug_assert!(size_ms > 0);
        let start = align_down(ts, size_ms, offset_ms);
        Self { start: saturate(start), end: saturate(start + i128::from(size_ms)) }
    }

    /// Half-open membership test.
    #[inline]
    pub fn contains(&self, ts: TimestampMs) -> bool {
        self.start <= ts && ts < self.end
    }

    /// True when the two intervals intersect or touch end-to-start.
    /// Session windows merge under this rule.
    #[inline]
    pub fn overlaps_or_adjacent(&self, other: &Window) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Smallest window covering both.
    #[inline]
    pub fn span(&self, other: &Window) -> Window {
        Window { start: self.start.min(other.start), end: self.end.max(other.end) }
    }

    /// Last timestamp still inside the window.
    #[inline]
    pub fn max_timestamp(&self) -> TimestampMs {
        self.end.saturating_sub(1)
    }
}

/// Largest `offset + k * step` that is `<= ts`, widened so it cannot overflow.
#[inline]
pub(crate) fn align_down(ts: TimestampMs, step: i64, offset: i64) -> i128 {
    let ts = i128::from(ts);
    ts - (ts - i128::from(offset)).rem_euclid(i128::from(step))
}

/// Clamp a widened time into the representable range.
#[inline]
pub(crate) fn saturate(t: i128) -> TimestampMs {
    t.clamp(i128::from(TIMESTAMP_MIN), i128::from(TIMESTAMP_MAX)) as TimestampMs
}

// Hash/Ord so Windows can be used as keys and sorted deterministically.
impl PartialEq for Window {
    #[inline] fn eq(&self, other: &Self) -> bool { self.start == other.start && self.end == other.end }
}
impl Hash for Window {
    #[inline] fn hash<H: Hasher>(&self, state: &mut H) { self.start.hash(state); self.end.hash(state); }
}
impl Ord for Window {
    #[inline] fn cmp(&self, o: &Self) -> std::cmp::Ordering {
        self.start.cmp(&o.start).then(self.end.cmp(&o.end))
    }
}
impl PartialOrd for Window {
    #[inline] fn partial_cmp(&self, o: &Self) -> Option<std::cmp::Ordering> { Some(self.cmp(o)) }
}

/// A timestamped element (event-time semantics).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Timestamped<T> {
    pub ts: TimestampMs,
    pub value: T,
}

impl<T> Timestamped<T> {
    #[inline] pub fn new(ts: TimestampMs, value: T) -> Self { Self { ts, value } }
}
