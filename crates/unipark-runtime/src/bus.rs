#![forbid(unsafe_code)]

//! Typed event bus.
//!
//! # Design
//!
//! Each event kind travels on its own `std::sync::mpsc` channel, so a
//! receiver never has to guess a payload's shape. Producers hold a cloneable
//! [`BusHandle`]; the page owns the [`EventBus`] and drains it with
//! non-blocking `try_recv` calls during [`Page::pump`](crate::Page::pump).
//!
//! Every send is stamped from a shared counter, and [`EventBus::drain`]
//! merges the channels back into send order. A blur sent after a focus is
//! therefore delivered after it, even though the two kinds use different
//! channels.
//!
//! # Failure Modes
//!
//! Sending through a handle whose bus has been dropped returns
//! [`Error::ChannelClosed`](unipark_core::Error::ChannelClosed).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;

use unipark_core::{
    Error, LotBlur, LotFocus, MapUpdate, RequestEvent, Result, ToastRequest, UserAction,
};

/// A message drained from the bus.
#[derive(Debug, Clone, PartialEq)]
pub enum BusMessage {
    Toast(ToastRequest),
    Map(MapUpdate),
    Focus(LotFocus),
    Blur(LotBlur),
    Input(UserAction),
    Request(RequestEvent),
}

impl BusMessage {
    /// Channel name, used in log fields.
    #[must_use]
    pub const fn channel(&self) -> &'static str {
        match self {
            Self::Toast(_) => "toast",
            Self::Map(_) => "map:update",
            Self::Focus(_) => "map:focus",
            Self::Blur(_) => "map:blur",
            Self::Input(_) => "input",
            Self::Request(_) => "request",
        }
    }
}

type Stamped<T> = (u64, T);

struct Channel<T> {
    tx: mpsc::Sender<Stamped<T>>,
    rx: mpsc::Receiver<Stamped<T>>,
}

impl<T> Channel<T> {
    fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    fn drain_into(&self, out: &mut Vec<Stamped<BusMessage>>, wrap: fn(T) -> BusMessage) {
        while let Ok((seq, msg)) = self.rx.try_recv() {
            out.push((seq, wrap(msg)));
        }
    }
}

/// Owner side of the bus.
pub struct EventBus {
    seq: Arc<AtomicU64>,
    toast: Channel<ToastRequest>,
    map: Channel<MapUpdate>,
    focus: Channel<LotFocus>,
    blur: Channel<LotBlur>,
    input: Channel<UserAction>,
    request: Channel<RequestEvent>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("sent", &self.seq.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            seq: Arc::new(AtomicU64::new(0)),
            toast: Channel::new(),
            map: Channel::new(),
            focus: Channel::new(),
            blur: Channel::new(),
            input: Channel::new(),
            request: Channel::new(),
        }
    }

    /// A producer handle for this bus.
    #[must_use]
    pub fn handle(&self) -> BusHandle {
        BusHandle {
            seq: Arc::clone(&self.seq),
            toast: self.toast.tx.clone(),
            map: self.map.tx.clone(),
            focus: self.focus.tx.clone(),
            blur: self.blur.tx.clone(),
            input: self.input.tx.clone(),
            request: self.request.tx.clone(),
        }
    }

    /// Take every pending message, in send order.
    pub fn drain(&self) -> Vec<BusMessage> {
        let mut stamped = Vec::new();
        self.toast.drain_into(&mut stamped, BusMessage::Toast);
        self.map.drain_into(&mut stamped, BusMessage::Map);
        self.focus.drain_into(&mut stamped, BusMessage::Focus);
        self.blur.drain_into(&mut stamped, BusMessage::Blur);
        self.input.drain_into(&mut stamped, BusMessage::Input);
        self.request.drain_into(&mut stamped, BusMessage::Request);
        stamped.sort_by_key(|(seq, _)| *seq);
        stamped.into_iter().map(|(_, msg)| msg).collect()
    }

    /// Total messages sent through any handle.
    #[must_use]
    pub fn sent_total(&self) -> u64 {
        self.seq.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer side of the bus; one sender per event kind.
#[derive(Debug, Clone)]
pub struct BusHandle {
    seq: Arc<AtomicU64>,
    toast: mpsc::Sender<Stamped<ToastRequest>>,
    map: mpsc::Sender<Stamped<MapUpdate>>,
    focus: mpsc::Sender<Stamped<LotFocus>>,
    blur: mpsc::Sender<Stamped<LotBlur>>,
    input: mpsc::Sender<Stamped<UserAction>>,
    request: mpsc::Sender<Stamped<RequestEvent>>,
}

impl BusHandle {
    pub fn toast(&self, request: ToastRequest) -> Result<()> {
        self.send(&self.toast, request, "toast")
    }

    pub fn map_update(&self, update: MapUpdate) -> Result<()> {
        self.send(&self.map, update, "map:update")
    }

    pub fn focus(&self, focus: LotFocus) -> Result<()> {
        self.send(&self.focus, focus, "map:focus")
    }

    pub fn blur(&self, blur: LotBlur) -> Result<()> {
        self.send(&self.blur, blur, "map:blur")
    }

    pub fn input(&self, action: UserAction) -> Result<()> {
        self.send(&self.input, action, "input")
    }

    pub fn request(&self, event: RequestEvent) -> Result<()> {
        self.send(&self.request, event, "request")
    }

    fn send<T>(&self, tx: &mpsc::Sender<Stamped<T>>, msg: T, channel: &'static str) -> Result<()> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        tx.send((seq, msg)).map_err(|_| {
            tracing::warn!(channel, "send on closed bus");
            Error::channel_closed(channel)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use unipark_core::{LotId, RequestOutcome};

    #[test]
    fn drain_preserves_send_order_across_channels() {
        let bus = EventBus::new();
        let handle = bus.handle();
        handle.focus(LotFocus { id: LotId::from("1") }).expect("open");
        handle.toast(ToastRequest::new("Booked")).expect("open");
        handle.blur(LotBlur { id: LotId::from("1") }).expect("open");
        handle.request(RequestEvent::Started).expect("open");

        let channels: Vec<_> = bus.drain().iter().map(BusMessage::channel).collect();
        assert_eq!(channels, vec!["map:focus", "toast", "map:blur", "request"]);
        assert!(bus.drain().is_empty());
        assert_eq!(bus.sent_total(), 4);
    }

    #[test]
    fn cloned_handles_share_ordering() {
        let bus = EventBus::new();
        let a = bus.handle();
        let b = a.clone();
        a.input(UserAction::LiveToggled).expect("open");
        b.input(UserAction::ClearFilters).expect("open");
        a.request(RequestEvent::Completed {
            generation: Some(1),
            outcome: RequestOutcome::Swapped,
        })
        .expect("open");
        let drained = bus.drain();
        assert_eq!(drained[0], BusMessage::Input(UserAction::LiveToggled));
        assert_eq!(drained[1], BusMessage::Input(UserAction::ClearFilters));
        assert_eq!(drained.len(), 3);
    }

    #[test]
    fn send_after_bus_dropped_fails() {
        let handle = EventBus::new().handle();
        let err = handle.map_update(MapUpdate::default()).unwrap_err();
        assert!(matches!(err, Error::ChannelClosed { channel: "map:update" }));
    }
}
