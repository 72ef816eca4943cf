#![forbid(unsafe_code)]

//! Latest-wins debouncing on top of [`TimerQueue`].
//!
//! # Design
//!
//! [`Debounce<A>`] holds at most one pending timer and the arguments of the
//! most recent [`call`](Debounce::call). Each call cancels the previous
//! timer and schedules a new one `quiet` in the future. When the owner of
//! the queue routes the wake payload back, [`fire`](Debounce::fire) hands out
//! the latest arguments exactly once.
//!
//! ```
//! use core::time::Duration;
//! use unipark_core::{Debounce, TimerQueue};
//!
//! let mut timers = TimerQueue::new();
//! let mut search = Debounce::new(Duration::from_millis(350));
//!
//! search.call(&mut timers, "a", ());
//! search.call(&mut timers, "ab", ());
//!
//! let fired = timers.pop_due(Duration::from_millis(400)).expect("due");
//! assert_eq!(search.fire(fired.id), Some("ab"));
//! assert!(timers.pop_due(Duration::from_secs(10)).is_none());
//! ```
//!
//! # Invariants
//!
//! 1. At most one timer is pending per debouncer; no timer leaks across calls.
//! 2. The action fires at most once per quiet window, with the last arguments.
//! 3. A debouncer that is never called never fires.
//! 4. Stale ids (cancelled or superseded timers) never yield arguments.

use core::time::Duration;

use crate::timer::{TimerId, TimerQueue};

/// Coalesces calls so only the last one within a quiet window fires.
#[derive(Debug)]
pub struct Debounce<A> {
    quiet: Duration,
    pending: Option<TimerId>,
    latest: Option<A>,
    calls: u64,
    fired: u64,
}

impl<A> Debounce<A> {
    /// Create a debouncer with the given quiet window.
    #[must_use]
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
            latest: None,
            calls: 0,
            fired: 0,
        }
    }

    /// The quiet window.
    #[must_use]
    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Record a call, rescheduling the pending invocation.
    ///
    /// `wake` is the payload the queue owner routes back to this debouncer.
    pub fn call<T: Clone>(&mut self, timers: &mut TimerQueue<T>, args: A, wake: T) -> TimerId {
        if let Some(previous) = self.pending.take() {
            timers.cancel(previous);
        }
        self.calls += 1;
        self.latest = Some(args);
        let id = timers.schedule_after(self.quiet, wake);
        self.pending = Some(id);
        id
    }

    /// Consume the pending invocation if `id` is the current timer.
    pub fn fire(&mut self, id: TimerId) -> Option<A> {
        if self.pending != Some(id) {
            return None;
        }
        self.pending = None;
        let args = self.latest.take();
        if args.is_some() {
            self.fired += 1;
        }
        args
    }

    /// Drop the pending invocation. Returns `true` if one was pending.
    pub fn cancel<T: Clone>(&mut self, timers: &mut TimerQueue<T>) -> bool {
        self.latest = None;
        match self.pending.take() {
            Some(id) => timers.cancel(id),
            None => false,
        }
    }

    /// Whether an invocation is waiting for its quiet window to elapse.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The timer currently backing the pending invocation.
    #[must_use]
    pub fn pending_timer(&self) -> Option<TimerId> {
        self.pending
    }

    /// Number of calls received.
    #[must_use]
    pub fn calls(&self) -> u64 {
        self.calls
    }

    /// Number of invocations handed out.
    #[must_use]
    pub fn fired(&self) -> u64 {
        self.fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    /// Drive the queue to `until`, firing the debouncer for every due wake.
    fn run<A>(timers: &mut TimerQueue<()>, d: &mut Debounce<A>, until: Duration) -> Vec<A> {
        let mut out = Vec::new();
        while let Some(f) = timers.pop_due(until) {
            if let Some(args) = d.fire(f.id) {
                out.push(args);
            }
        }
        timers.settle(until);
        out
    }

    #[test]
    fn rapid_calls_coalesce_to_last() {
        let mut timers = TimerQueue::new();
        let mut d = Debounce::new(ms(350));
        for (i, text) in ["p", "pa", "par", "park"].into_iter().enumerate() {
            assert!(run(&mut timers, &mut d, ms(i as u64 * 50)).is_empty());
            d.call(&mut timers, text, ());
        }
        assert_eq!(timers.len(), 1, "one pending timer at a time");
        let fired = run(&mut timers, &mut d, ms(1000));
        assert_eq!(fired, vec!["park"]);
        assert_eq!(d.calls(), 4);
        assert_eq!(d.fired(), 1);
        assert!(!d.is_pending());
    }

    #[test]
    fn quiet_window_measured_from_last_call() {
        let mut timers = TimerQueue::new();
        let mut d = Debounce::new(ms(350));
        d.call(&mut timers, 1, ());
        run(&mut timers, &mut d, ms(300));
        d.call(&mut timers, 2, ());
        assert!(run(&mut timers, &mut d, ms(649)).is_empty());
        assert_eq!(run(&mut timers, &mut d, ms(650)), vec![2]);
    }

    #[test]
    fn separated_calls_fire_separately() {
        let mut timers = TimerQueue::new();
        let mut d = Debounce::new(ms(100));
        d.call(&mut timers, "a", ());
        assert_eq!(run(&mut timers, &mut d, ms(200)), vec!["a"]);
        d.call(&mut timers, "b", ());
        assert_eq!(run(&mut timers, &mut d, ms(400)), vec!["b"]);
    }

    #[test]
    fn never_called_never_fires() {
        let mut timers: TimerQueue<()> = TimerQueue::new();
        let mut d: Debounce<u8> = Debounce::new(ms(10));
        assert!(run(&mut timers, &mut d, ms(1000)).is_empty());
        assert_eq!(d.fired(), 0);
    }

    #[test]
    fn stale_id_yields_nothing() {
        let mut timers = TimerQueue::new();
        let mut d = Debounce::new(ms(10));
        let first = d.call(&mut timers, "old", ());
        let second = d.call(&mut timers, "new", ());
        assert_ne!(first, second);
        assert!(!timers.is_pending(first));
        assert_eq!(d.fire(first), None);
        assert_eq!(d.fire(second), Some("new"));
        assert_eq!(d.fire(second), None, "fires once");
    }

    #[test]
    fn cancel_drops_pending() {
        let mut timers = TimerQueue::new();
        let mut d = Debounce::new(ms(10));
        d.call(&mut timers, 7, ());
        assert!(d.cancel(&mut timers));
        assert!(!d.cancel(&mut timers));
        assert!(timers.is_empty());
        assert!(run(&mut timers, &mut d, ms(100)).is_empty());
    }

    proptest! {
        #[test]
        fn burst_within_window_fires_once_with_last(
            gaps in prop::collection::vec(0u64..349, 1..40),
        ) {
            let mut timers = TimerQueue::new();
            let mut d = Debounce::new(ms(350));
            let mut at = 0u64;
            let mut fired = Vec::new();
            for (i, gap) in gaps.iter().enumerate() {
                at += gap;
                fired.extend(run(&mut timers, &mut d, ms(at)));
                d.call(&mut timers, i, ());
            }
            fired.extend(run(&mut timers, &mut d, ms(at + 350)));
            prop_assert_eq!(fired, vec![gaps.len() - 1]);
            prop_assert!(timers.is_empty());
        }
    }
}
