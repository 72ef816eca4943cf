#![forbid(unsafe_code)]

//! UniPark Core
//!
//! Leaf building blocks for the UniPark client state core. Nothing in this
//! crate knows about toasts, markers or filters; it only provides the
//! primitives those components are assembled from.
//!
//! # Key Components
//!
//! - [`Clock`] - Monotonic time source ([`DeterministicClock`] for hosts and tests)
//! - [`TimerQueue`] - Scheduled payloads with cancellation, drained in deadline order
//! - [`Debounce`] - Latest-wins coalescing on top of the timer queue
//! - [`Document`] - In-memory model of the page anchors the core mutates
//! - [`event`] - Typed payloads carried on the event bus
//!
//! # Scheduling model
//!
//! Everything here is single-threaded. Waiting is never a blocking call: a
//! component schedules a payload on the [`TimerQueue`] and the owner of the
//! queue routes it back when time has advanced past its deadline.

pub mod clock;
pub mod debounce;
pub mod document;
pub mod error;
pub mod event;
pub mod timer;

pub use clock::{Clock, DeterministicClock, SystemClock};
pub use debounce::Debounce;
pub use document::{Document, Element};
pub use error::{Error, Result};
pub use event::{
    Lot, LotBlur, LotFocus, LotId, MapUpdate, RequestEvent, RequestOutcome, ToastRequest,
    ToastVariant, UserAction,
};
pub use timer::{Fired, TimerId, TimerQueue};
