#![forbid(unsafe_code)]

//! Timer queue: the scheduled-callback primitive of the client core.
//!
//! # Design
//!
//! A [`TimerQueue<T>`] stores payloads of type `T` keyed by
//! `(deadline, sequence)`. It never invokes anything itself; the owner pops
//! due entries with [`TimerQueue::pop_due`] and routes each payload to the
//! component that scheduled it. Handling a payload may schedule further
//! timers, which is why the owner pops one entry at a time instead of
//! draining a batch.
//!
//! # Invariants
//!
//! 1. Entries fire in deadline order; equal deadlines fire in scheduling order.
//! 2. `now()` never moves backwards. Popping an entry moves `now()` to its
//!    deadline, so timers scheduled while handling it are relative to that
//!    deadline and virtual-time runs are reproducible.
//! 3. A cancelled id never fires. Cancelling an unknown or already-fired
//!    one-shot id is a no-op.
//! 4. A repeating timer keeps its [`TimerId`] across firings until cancelled.

use core::time::Duration;
use std::collections::{BTreeMap, HashMap};

/// Smallest period accepted for repeating timers.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle identifying a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Raw numeric value, useful in log fields.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A timer that came due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<T> {
    pub id: TimerId,
    pub deadline: Duration,
    pub payload: T,
}

#[derive(Debug)]
struct Entry<T> {
    id: TimerId,
    payload: T,
    period: Option<Duration>,
}

/// Ordered queue of scheduled payloads.
#[derive(Debug)]
pub struct TimerQueue<T> {
    now: Duration,
    next_id: u64,
    next_seq: u64,
    entries: BTreeMap<(Duration, u64), Entry<T>>,
    index: HashMap<TimerId, (Duration, u64)>,
    fired_total: u64,
}

impl<T: Clone> TimerQueue<T> {
    /// Create an empty queue at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Duration::ZERO)
    }

    /// Create an empty queue whose clock starts at `now`.
    #[must_use]
    pub fn starting_at(now: Duration) -> Self {
        Self {
            now,
            next_id: 1,
            next_seq: 0,
            entries: BTreeMap::new(),
            index: HashMap::new(),
            fired_total: 0,
        }
    }

    /// Current queue time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule `payload` to fire once, `delay` after `now()`.
    pub fn schedule_after(&mut self, delay: Duration, payload: T) -> TimerId {
        let id = self.allocate_id();
        let deadline = self.now.saturating_add(delay);
        self.insert(deadline, Entry {
            id,
            payload,
            period: None,
        });
        id
    }

    /// Schedule `payload` to fire every `period`, first at `now() + period`.
    pub fn schedule_every(&mut self, period: Duration, payload: T) -> TimerId {
        let period = period.max(MIN_PERIOD);
        let id = self.allocate_id();
        let deadline = self.now.saturating_add(period);
        self.insert(deadline, Entry {
            id,
            payload,
            period: Some(period),
        });
        id
    }

    /// Cancel a pending timer. Returns `true` if it was pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.index.remove(&id) {
            Some(key) => self.entries.remove(&key).is_some(),
            None => false,
        }
    }

    /// Whether `id` is still scheduled.
    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.index.contains_key(&id)
    }

    /// Number of scheduled timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deadline of the earliest scheduled timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Total number of firings since creation.
    #[must_use]
    pub fn fired_total(&self) -> u64 {
        self.fired_total
    }

    /// Pop the earliest timer whose deadline is at or before `until`.
    ///
    /// Moves `now()` to the popped deadline. Repeating timers are
    /// rescheduled one period after that deadline under the same id.
    pub fn pop_due(&mut self, until: Duration) -> Option<Fired<T>> {
        let key = *self.entries.keys().next()?;
        if key.0 > until {
            return None;
        }
        let entry = self.entries.remove(&key)?;
        self.index.remove(&entry.id);
        self.now = self.now.max(key.0);
        self.fired_total += 1;

        if let Some(period) = entry.period {
            match key.0.checked_add(period) {
                Some(next) => self.insert(next, Entry {
                    id: entry.id,
                    payload: entry.payload.clone(),
                    period: entry.period,
                }),
                None => {
                    tracing::trace!(timer_id = entry.id.0, "repeating timer past end of time dropped");
                }
            }
        }

        Some(Fired {
            id: entry.id,
            deadline: key.0,
            payload: entry.payload,
        })
    }

    /// Move `now()` forward to `until` once due timers have been popped.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Drop every scheduled timer.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    fn allocate_id(&mut self) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        id
    }

    fn insert(&mut self, deadline: Duration, entry: Entry<T>) {
        let key = (deadline, self.next_seq);
        self.next_seq += 1;
        self.index.insert(entry.id, key);
        self.entries.insert(key, entry);
    }
}

impl<T: Clone> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn drain(q: &mut TimerQueue<&'static str>, until: Duration) -> Vec<&'static str> {
        let mut out = Vec::new();
        while let Some(f) = q.pop_due(until) {
            out.push(f.payload);
        }
        q.settle(until);
        out
    }

    #[test]
    fn fires_in_deadline_order() {
        let mut q = TimerQueue::new();
        q.schedule_after(ms(300), "c");
        q.schedule_after(ms(100), "a");
        q.schedule_after(ms(200), "b");
        assert_eq!(drain(&mut q, ms(1000)), vec!["a", "b", "c"]);
        assert!(q.is_empty());
    }

    #[test]
    fn equal_deadlines_fire_in_scheduling_order() {
        let mut q = TimerQueue::new();
        q.schedule_after(ms(50), "first");
        q.schedule_after(ms(50), "second");
        assert_eq!(drain(&mut q, ms(50)), vec!["first", "second"]);
    }

    #[test]
    fn not_due_before_deadline() {
        let mut q = TimerQueue::new();
        q.schedule_after(ms(100), "x");
        assert!(q.pop_due(ms(99)).is_none());
        assert_eq!(q.next_deadline(), Some(ms(100)));
        assert!(q.pop_due(ms(100)).is_some());
    }

    #[test]
    fn cancel_prevents_firing() {
        let mut q = TimerQueue::new();
        let id = q.schedule_after(ms(10), "x");
        assert!(q.is_pending(id));
        assert!(q.cancel(id));
        assert!(!q.is_pending(id));
        assert!(!q.cancel(id), "second cancel is a no-op");
        assert!(drain(&mut q, ms(100)).is_empty());
    }

    #[test]
    fn repeating_timer_keeps_id_and_period() {
        let mut q = TimerQueue::new();
        let id = q.schedule_every(ms(90), "tick");
        let mut deadlines = Vec::new();
        while let Some(f) = q.pop_due(ms(300)) {
            assert_eq!(f.id, id);
            deadlines.push(f.deadline);
        }
        assert_eq!(deadlines, vec![ms(90), ms(180), ms(270)]);
        assert!(q.is_pending(id));
        assert!(q.cancel(id));
        assert!(q.is_empty());
    }

    #[test]
    fn zero_period_is_clamped() {
        let mut q = TimerQueue::new();
        q.schedule_every(Duration::ZERO, "spin");
        let mut count = 0;
        while q.pop_due(ms(5)).is_some() {
            count += 1;
        }
        assert_eq!(count, 5);
    }

    #[test]
    fn popping_moves_now_to_deadline() {
        let mut q = TimerQueue::new();
        q.schedule_after(ms(100), "a");
        let fired = q.pop_due(ms(1000)).expect("due");
        assert_eq!(fired.deadline, ms(100));
        assert_eq!(q.now(), ms(100));

        // Scheduled relative to the handled deadline, not the drain target.
        q.schedule_after(ms(50), "b");
        assert_eq!(q.next_deadline(), Some(ms(150)));
        q.settle(ms(1000));
        assert_eq!(q.now(), ms(1000));
    }

    #[test]
    fn settle_never_moves_backwards() {
        let mut q: TimerQueue<()> = TimerQueue::starting_at(ms(500));
        q.settle(ms(100));
        assert_eq!(q.now(), ms(500));
    }

    #[test]
    fn repeating_timer_at_end_of_time_fires_once() {
        let mut q = TimerQueue::starting_at(Duration::MAX - ms(10));
        let id = q.schedule_every(ms(10), "tick");
        assert_eq!(drain(&mut q, Duration::MAX), vec!["tick"]);
        assert!(!q.is_pending(id));
        assert!(q.is_empty());
    }

    #[test]
    fn clear_drops_everything() {
        let mut q = TimerQueue::new();
        let a = q.schedule_after(ms(1), "a");
        q.schedule_every(ms(1), "b");
        q.clear();
        assert!(q.is_empty());
        assert!(!q.is_pending(a));
        assert_eq!(q.fired_total(), 0);
    }
}
