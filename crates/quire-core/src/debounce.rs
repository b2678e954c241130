#![forbid(unsafe_code)]

//! Trailing-edge debouncer with a single pending slot.
//!
//! A [`Debouncer`] holds at most one pending value. Scheduling a new value
//! replaces the slot (the previous value is returned to the caller and never
//! fires), so exactly one flush is ever live per instance.
//!
//! # Invariants
//!
//! - **Latest-wins**: only the last value scheduled in a burst is emitted.
//! - **Quiet window**: a value fires once `window` has elapsed since the most
//!   recent `schedule` call, never earlier.
//! - **Deterministic**: the caller supplies `now`; identical call sequences
//!   yield identical results.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use quire_core::Debouncer;
//!
//! let start = Instant::now();
//! let mut debouncer = Debouncer::new(Duration::from_millis(500));
//! debouncer.schedule("h", start);
//! debouncer.schedule("he", start + Duration::from_millis(100));
//! assert_eq!(debouncer.poll(start + Duration::from_millis(550)), None);
//! assert_eq!(debouncer.poll(start + Duration::from_millis(600)), Some("he"));
//! ```

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    scheduled_at: Instant,
}

/// Counters describing what the debouncer has done so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DebounceStats {
    /// Total `schedule` calls.
    pub scheduled: u64,
    /// Values replaced before firing.
    pub superseded: u64,
    /// Values emitted by `poll` or `flush`.
    pub fired: u64,
    /// Values dropped by `cancel`.
    pub cancelled: u64,
}

/// Single-slot trailing-edge debouncer.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<Pending<T>>,
    stats: DebounceStats,
}

impl<T> Debouncer<T> {
    /// Create a debouncer with the given quiet window.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            stats: DebounceStats::default(),
        }
    }

    /// The configured quiet window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Change the quiet window. A pending value keeps its schedule time.
    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
    }

    /// Put `value` in the slot, superseding any pending value.
    ///
    /// Returns the superseded value, if there was one.
    pub fn schedule(&mut self, value: T, now: Instant) -> Option<T> {
        self.stats.scheduled = self.stats.scheduled.saturating_add(1);
        let previous = self.pending.replace(Pending {
            value,
            scheduled_at: now,
        });
        previous.map(|pending| {
            self.stats.superseded = self.stats.superseded.saturating_add(1);
            pending.value
        })
    }

    /// Whether a value is waiting to fire.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The instant at which the pending value becomes ready.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending
            .as_ref()
            .map(|pending| pending.scheduled_at + self.window)
    }

    /// Borrow the pending value without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        self.pending.as_ref().map(|pending| &pending.value)
    }

    /// Emit the pending value if its quiet window has elapsed at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let ready = self.pending.as_ref().is_some_and(|pending| {
            now.checked_duration_since(pending.scheduled_at)
                .is_some_and(|elapsed| elapsed >= self.window)
        });
        if ready { self.flush() } else { None }
    }

    /// Emit the pending value immediately, regardless of the window.
    pub fn flush(&mut self) -> Option<T> {
        let pending = self.pending.take()?;
        self.stats.fired = self.stats.fired.saturating_add(1);
        Some(pending.value)
    }

    /// Drop the pending value without emitting it.
    pub fn cancel(&mut self) -> Option<T> {
        let pending = self.pending.take()?;
        self.stats.cancelled = self.stats.cancelled.saturating_add(1);
        Some(pending.value)
    }

    /// Snapshot of the counters.
    #[must_use]
    pub const fn stats(&self) -> DebounceStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const WINDOW: Duration = Duration::from_millis(500);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn fires_after_quiet_window() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(WINDOW);
        assert!(d.schedule(1, t0).is_none());
        assert_eq!(d.poll(t0 + ms(499)), None);
        assert_eq!(d.poll(t0 + ms(500)), Some(1));
        assert!(!d.is_pending());
        assert_eq!(d.poll(t0 + ms(1000)), None);
    }

    #[test]
    fn reschedule_restarts_window() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(WINDOW);
        d.schedule("a", t0);
        assert_eq!(d.schedule("b", t0 + ms(400)), Some("a"));
        assert_eq!(d.poll(t0 + ms(600)), None);
        assert_eq!(d.deadline(), Some(t0 + ms(900)));
        assert_eq!(d.poll(t0 + ms(900)), Some("b"));
    }

    #[test]
    fn flush_ignores_window() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(WINDOW);
        d.schedule(3, t0);
        assert_eq!(d.flush(), Some(3));
        assert_eq!(d.flush(), None);
    }

    #[test]
    fn cancel_drops_value() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(WINDOW);
        d.schedule(3, t0);
        assert_eq!(d.cancel(), Some(3));
        assert_eq!(d.poll(t0 + ms(10_000)), None);
        assert_eq!(d.stats().cancelled, 1);
        assert_eq!(d.stats().fired, 0);
    }

    #[test]
    fn poll_before_schedule_time_is_not_ready() {
        let t0 = Instant::now() + ms(1000);
        let mut d = Debouncer::new(WINDOW);
        d.schedule(1, t0);
        // A clock reading earlier than the schedule never fires.
        assert_eq!(d.poll(t0 - ms(10)), None);
    }

    proptest! {
        #[test]
        fn burst_within_window_fires_once_with_last_value(
            gaps in proptest::collection::vec(0u64..500, 1..40),
        ) {
            let t0 = Instant::now();
            let mut d = Debouncer::new(WINDOW);
            let mut now = t0;
            let mut fired = Vec::new();
            for (i, gap) in gaps.iter().enumerate() {
                now += ms(*gap);
                // Polling mid-burst must never fire: every gap is < window.
                if let Some(v) = d.poll(now) {
                    fired.push(v);
                }
                d.schedule(i, now);
            }
            if let Some(v) = d.poll(now + WINDOW) {
                fired.push(v);
            }
            prop_assert_eq!(fired, vec![gaps.len() - 1]);
            prop_assert_eq!(d.stats().fired, 1);
            prop_assert_eq!(d.stats().superseded, (gaps.len() - 1) as u64);
        }
    }
}
