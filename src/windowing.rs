//! Window assignment.
//!
//! A [`WindowFn`] maps an element's event timestamp to the windows it belongs
//! to. Assignment is a pure function of the timestamp:
//!
//! - [`WindowFn::fixed`] -- one window of `size` per element; windows partition time.
//! - [`WindowFn::sliding`] -- up to `ceil(size / period)` overlapping windows per element.
//! - [`WindowFn::sessions`] -- a provisional `[ts, ts + gap)` window; overlapping
//!   and adjacent session windows of the same key are merged by the
//!   [`GroupingEngine`](crate::grouping::GroupingEngine).
//! - [`WindowFn::Global`] -- the single global window.
//!
//! All intervals are half-open, so a timestamp exactly on a boundary belongs to
//! the window that starts there and never to the one that ends there.
//!
//! ```
//! use windbeam::*;
//!
//! let w = WindowFn::sliding(30, 5)?;
//! assert_eq!(w.assign(16).len(), 6);
//! # anyhow::Result::<()>::Ok(())
//! ```

use crate::error::{FlowError, FlowResult};
use crate::window::{align_down, saturate, TimestampMs, Window};
use serde::{Deserialize, Serialize};

/// How elements are assigned to windows.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WindowFn {
    Fixed { size: i64, offset: i64 },
    Sliding { size: i64, period: i64, offset: i64 },
    Sessions { gap: i64 },
    #[default]
    Global,
}

impl WindowFn {
    /// Fixed (tumbling) windows of `size`.
    pub fn fixed(size: i64) -> FlowResult<Self> {
        Self::fixed_with_offset(size, 0)
    }

    /// Fixed windows whose boundaries are shifted by `offset`.
    pub fn fixed_with_offset(size: i64, offset: i64) -> FlowResult<Self> {
        require_positive("size", size)?;
        Ok(WindowFn::Fixed { size, offset: offset.rem_euclid(size) })
    }

    /// Sliding windows of `size` starting every `period`.
    pub fn sliding(size: i64, period: i64) -> FlowResult<Self> {
        Self::sliding_with_offset(size, period, 0)
    }

    pub fn sliding_with_offset(size: i64, period: i64, offset: i64) -> FlowResult<Self> {
        require_positive("size", size)?;
        require_positive("period", period)?;
        if period > size {
            return Err(FlowError::window_spec(format!(
                "sliding period {period} exceeds size {size}; some timestamps would fall in no window"
            )));
        }
        Ok(WindowFn::Sliding { size, period, offset: offset.rem_euclid(period) })
    }

    /// Session windows separated by at least `gap`.
    pub fn sessions(gap: i64) -> FlowResult<Self> {
        require_positive("gap", gap)?;
        Ok(WindowFn::Sessions { gap })
    }

    /// Whether assigned windows must be merged during grouping.
    pub fn is_merging(&self) -> bool {
        matches!(self, WindowFn::Sessions { .. })
    }

    /// Assign a timestamp to its windows, ordered by window start.
    pub fn assign(&self, ts: TimestampMs) -> Vec<Window> {
        match *self {
            WindowFn::Fixed { size, offset } => vec![Window::tumble(ts, size, offset)],
            WindowFn::Sliding { size, period, offset } => {
                // Walk back from the last start <= ts until a window no longer covers ts.
                // Bounds past the i64 range saturate, so every window still contains ts.
                let lower = i128::from(ts) - i128::from(size);
                let mut start = align_down(ts, period, offset);
                let mut out = Vec::with_capacity(self.windows_per_element());
                while start > lower {
                    out.push(Window::new(saturate(start), saturate(start + i128::from(size))));
                    start -= i128::from(period);
                }
                out.reverse();
                out
            }
            WindowFn::Sessions { gap } => vec![Window::new(ts, ts.saturating_add(gap))],
            WindowFn::Global => vec![Window::global()],
        }
    }

    /// Upper bound on the windows one timestamp is assigned to (sessions before
    /// merging). Exact for sliding windows whose period divides their size.
    pub fn windows_per_element(&self) -> usize {
        match *self {
            WindowFn::Sliding { size, period, .. } => ((size - 1) / period + 1) as usize,
            _ => 1,
        }
    }
}

fn require_positive(what: &str, v: i64) -> FlowResult<()> {
    if v <= 0 {
        return Err(FlowError::window_spec(format!("{what} must be positive, got {v}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_boundary_belongs_to_next_window() {
        let w = WindowFn::fixed(60).unwrap();
        assert_eq!(w.assign(59), vec![Window::new(0, 60)]);
        assert_eq!(w.assign(60), vec![Window::new(60, 120)]);
    }

    #[test]
    fn sliding_windows_cover_timestamp() {
        let w = WindowFn::sliding(30, 5).unwrap();
        let ws = w.assign(2);
        assert_eq!(ws.len(), 6);
        assert_eq!(ws.first(), Some(&Window::new(-25, 5)));
        assert_eq!(ws.last(), Some(&Window::new(0, 30)));
        assert!(ws.iter().all(|x| x.contains(2)));
    }

    #[test]
    fn sliding_count_is_exact_when_period_divides_size() {
        let w = WindowFn::sliding(30, 5).unwrap();
        for ts in -100..100 {
            assert_eq!(w.assign(ts).len(), w.windows_per_element(), "ts={ts}");
        }
    }

    #[test]
    fn sliding_with_uneven_period() {
        let w = WindowFn::sliding(10, 3).unwrap();
        for ts in -20..20 {
            let n = w.assign(ts).len();
            assert!(n == 3 || n == 4, "ts={ts} got {n}");
        }
    }

    #[test]
    fn offsets_shift_boundaries() {
        let w = WindowFn::fixed_with_offset(10, 3).unwrap();
        assert_eq!(w.assign(3), vec![Window::new(3, 13)]);
        assert_eq!(w.assign(2), vec![Window::new(-7, 3)]);
    }

    #[test]
    fn assignment_near_the_time_bounds_does_not_overflow() {
        let sliding = WindowFn::sliding(30, 5).unwrap();
        for ts in [i64::MIN, i64::MIN + 3, i64::MAX - 3, i64::MAX - 1] {
            let ws = sliding.assign(ts);
            assert_eq!(ws.len(), 6, "ts={ts}");
            assert!(ws.iter().all(|w| w.contains(ts)), "ts={ts}");
            assert!(ws.windows(2).all(|p| p[0] < p[1]), "ts={ts}");
        }
        assert_eq!(sliding.assign(i64::MAX - 3).last(), Some(&Window::new(i64::MAX - 7, i64::MAX)));
        assert_eq!(sliding.assign(i64::MIN).first(), Some(&Window::new(i64::MIN, i64::MIN + 3)));

        let fixed = WindowFn::fixed_with_offset(10, 3).unwrap();
        assert!(fixed.assign(i64::MIN)[0].contains(i64::MIN));
        assert!(fixed.assign(i64::MAX - 1)[0].contains(i64::MAX - 1));
        assert_eq!(fixed.assign(i64::MAX), vec![Window::new(i64::MAX - 4, i64::MAX)]);

        let sessions = WindowFn::sessions(10).unwrap();
        assert_eq!(sessions.assign(i64::MAX - 2), vec![Window::new(i64::MAX - 2, i64::MAX)]);
    }

    #[test]
    fn rejects_non_positive_parameters() {
        assert!(matches!(WindowFn::fixed(0), Err(FlowError::InvalidWindowSpec(_))));
        assert!(matches!(WindowFn::sliding(10, -1), Err(FlowError::InvalidWindowSpec(_))));
        assert!(matches!(WindowFn::sliding(5, 10), Err(FlowError::InvalidWindowSpec(_))));
        assert!(matches!(WindowFn::sessions(0), Err(FlowError::InvalidWindowSpec(_))));
    }
}
