#![forbid(unsafe_code)]

//! Toast queue with per-toast decay countdown and safety-net expiry.
//!
//! The queue provides:
//! - Insertion-ordered display (first pushed is shown first)
//! - A repeating decay timer per toast driving the visible countdown
//! - An unconditional expiry timer per toast, independent of decay granularity
//! - Idempotent dismissal with two-phase removal (hide, then remove)
//!
//! # Example
//!
//! ```
//! use core::time::Duration;
//! use unipark_core::{TimerQueue, ToastRequest};
//! use unipark_widgets::{ToastAction, ToastQueue, ToastTimer};
//!
//! let mut timers: TimerQueue<ToastTimer> = TimerQueue::new();
//! let mut queue = ToastQueue::with_defaults();
//!
//! let id = queue.push(&mut timers, ToastRequest::new("Booked"));
//! assert_eq!(queue.get(id).map(|t| t.remaining_percent()), Some(100));
//!
//! // Route due timers back into the queue.
//! let until = Duration::from_millis(4300);
//! while let Some(fired) = timers.pop_due(until) {
//!     queue.on_timer(&mut timers, fired.payload);
//! }
//! assert!(queue.is_empty());
//! assert_eq!(
//!     queue.drain_actions(),
//!     vec![ToastAction::Show(id), ToastAction::Hide(id), ToastAction::Remove(id)]
//! );
//! ```
//!
//! # Invariants
//!
//! 1. A toast has at most one decay timer and one expiry timer, and both are
//!    cancelled when it is dismissed for any reason.
//! 2. `Hide(id)` is always emitted before `Remove(id)`.
//! 3. Dismissing an unknown or already dismissed id is a no-op.
//! 4. A dismissed toast's countdown reads 0, so with the default
//!    configuration the countdown completes no later than the 4200 ms expiry.

use core::fmt;
use core::time::Duration;

use unipark_core::{TimerId, TimerQueue, ToastRequest, ToastVariant};

/// Monotonic toast identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(u64);

impl ToastId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "toast-{}", self.0)
    }
}

/// Timer payloads scheduled by the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastTimer {
    /// Countdown tick.
    Decay(ToastId),
    /// Safety-net dismissal at the end of the lifetime.
    Expire(ToastId),
}

/// Actions for the renderer, in the order they happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastAction {
    /// A toast entered the stack.
    Show(ToastId),
    /// A toast started leaving (exit animation).
    Hide(ToastId),
    /// A toast left the rendered list.
    Remove(ToastId),
}

/// Why a toast left the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    User,
    Decayed,
    Expired,
    Cleared,
}

impl DismissReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Decayed => "decayed",
            Self::Expired => "expired",
            Self::Cleared => "cleared",
        }
    }
}

/// Configuration for the toast queue.
#[derive(Debug, Clone)]
pub struct ToastConfig {
    /// Unconditional lifetime of a toast.
    pub lifetime: Duration,
    /// Interval between countdown ticks.
    pub decay_tick: Duration,
    /// Percentage removed per countdown tick.
    pub decay_step: u8,
    /// Title used when a request carries none.
    pub default_title: String,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            lifetime: Duration::from_millis(4200),
            decay_tick: Duration::from_millis(90),
            decay_step: 2,
            default_title: "Success".to_owned(),
        }
    }
}

impl ToastConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    #[must_use]
    pub fn decay_tick(mut self, tick: Duration) -> Self {
        self.decay_tick = tick;
        self
    }

    /// Set the per-tick decrement. Zero is raised to one so decay terminates.
    #[must_use]
    pub fn decay_step(mut self, step: u8) -> Self {
        self.decay_step = step.max(1);
        self
    }

    #[must_use]
    pub fn default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }
}

/// An active toast.
#[derive(Debug, Clone)]
pub struct Toast {
    pub id: ToastId,
    pub title: String,
    pub message: String,
    pub variant: ToastVariant,
    remaining_percent: u8,
    visible: bool,
    pushed_at: Duration,
    decay: Option<TimerId>,
    expire: Option<TimerId>,
}

impl Toast {
    /// Countdown in percent, 100 at push.
    #[must_use]
    pub fn remaining_percent(&self) -> u8 {
        self.remaining_percent
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Queue time at which the toast was pushed.
    #[must_use]
    pub fn pushed_at(&self) -> Duration {
        self.pushed_at
    }
}

/// Queue statistics for monitoring and debugging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToastStats {
    /// Total toasts pushed.
    pub total_pushed: u64,
    /// Toasts dismissed by the user.
    pub user_dismissed: u64,
    /// Toasts whose countdown reached zero.
    pub decayed: u64,
    /// Toasts removed by the lifetime safety net.
    pub expired: u64,
    /// Toasts removed by `clear`.
    pub cleared: u64,
}

/// Toast notification queue.
#[derive(Debug)]
pub struct ToastQueue {
    active: Vec<Toast>,
    config: ToastConfig,
    next_id: u64,
    actions: Vec<ToastAction>,
    stats: ToastStats,
}

impl ToastQueue {
    #[must_use]
    pub fn new(config: ToastConfig) -> Self {
        Self {
            active: Vec::new(),
            config,
            next_id: 1,
            actions: Vec::new(),
            stats: ToastStats::default(),
        }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ToastConfig::default())
    }

    /// Show a toast and start its countdown and expiry timers.
    pub fn push<T>(&mut self, timers: &mut TimerQueue<T>, request: ToastRequest) -> ToastId
    where
        T: Clone + From<ToastTimer>,
    {
        let id = ToastId(self.next_id);
        self.next_id += 1;

        let variant = request.resolved_variant();
        let decay = timers.schedule_every(self.config.decay_tick, ToastTimer::Decay(id).into());
        let expire = timers.schedule_after(self.config.lifetime, ToastTimer::Expire(id).into());

        tracing::debug!(
            toast_id = id.get(),
            variant = variant.as_str(),
            "toast pushed"
        );

        self.active.push(Toast {
            id,
            title: request
                .title
                .unwrap_or_else(|| self.config.default_title.clone()),
            message: request.message.unwrap_or_default(),
            variant,
            remaining_percent: 100,
            visible: true,
            pushed_at: timers.now(),
            decay: Some(decay),
            expire: Some(expire),
        });
        self.actions.push(ToastAction::Show(id));
        self.stats.total_pushed += 1;
        id
    }

    /// Dismiss a toast on user request.
    ///
    /// Returns `true` if the toast was active; unknown ids are ignored.
    pub fn dismiss<T: Clone>(&mut self, timers: &mut TimerQueue<T>, id: ToastId) -> bool {
        self.dismiss_with(timers, id, DismissReason::User)
    }

    /// Route a timer payload scheduled by this queue.
    pub fn on_timer<T: Clone>(&mut self, timers: &mut TimerQueue<T>, timer: ToastTimer) {
        match timer {
            ToastTimer::Decay(id) => self.decay(timers, id),
            ToastTimer::Expire(id) => {
                self.dismiss_with(timers, id, DismissReason::Expired);
            }
        }
    }

    /// Dismiss every active toast.
    pub fn clear<T: Clone>(&mut self, timers: &mut TimerQueue<T>) {
        let ids: Vec<ToastId> = self.active.iter().map(|t| t.id).collect();
        for id in ids {
            self.dismiss_with(timers, id, DismissReason::Cleared);
        }
    }

    /// Active toasts in display order.
    #[must_use]
    pub fn active(&self) -> &[Toast] {
        &self.active
    }

    #[must_use]
    pub fn get(&self, id: ToastId) -> Option<&Toast> {
        self.active.iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Take the renderer actions accumulated since the last call.
    pub fn drain_actions(&mut self) -> Vec<ToastAction> {
        std::mem::take(&mut self.actions)
    }

    #[must_use]
    pub fn stats(&self) -> &ToastStats {
        &self.stats
    }

    #[must_use]
    pub fn config(&self) -> &ToastConfig {
        &self.config
    }

    // --- Internal methods ---

    fn decay<T: Clone>(&mut self, timers: &mut TimerQueue<T>, id: ToastId) {
        let step = self.config.decay_step.max(1);
        let Some(toast) = self.active.iter_mut().find(|t| t.id == id) else {
            return;
        };
        toast.remaining_percent = toast.remaining_percent.saturating_sub(step);
        if toast.remaining_percent == 0 {
            if let Some(decay) = toast.decay.take() {
                timers.cancel(decay);
            }
            self.dismiss_with(timers, id, DismissReason::Decayed);
        }
    }

    fn dismiss_with<T: Clone>(
        &mut self,
        timers: &mut TimerQueue<T>,
        id: ToastId,
        reason: DismissReason,
    ) -> bool {
        let Some(idx) = self.active.iter().position(|t| t.id == id && t.visible) else {
            return false;
        };

        // Phase one: hide.
        let toast = &mut self.active[idx];
        toast.visible = false;
        toast.remaining_percent = 0;
        if let Some(decay) = toast.decay.take() {
            timers.cancel(decay);
        }
        if let Some(expire) = toast.expire.take() {
            timers.cancel(expire);
        }
        self.actions.push(ToastAction::Hide(id));

        // Phase two: remove.
        self.active.retain(|t| t.visible);
        self.actions.push(ToastAction::Remove(id));

        match reason {
            DismissReason::User => self.stats.user_dismissed += 1,
            DismissReason::Decayed => self.stats.decayed += 1,
            DismissReason::Expired => self.stats.expired += 1,
            DismissReason::Cleared => self.stats.cleared += 1,
        }
        tracing::debug!(toast_id = id.get(), reason = reason.as_str(), "toast dismissed");
        true
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::with_defaults()
    }
}
