#![forbid(unsafe_code)]

//! The page context: one owner for every component of a page.
//!
//! # Design
//!
//! [`Page`] owns the clock, the timer queue, the document, the event bus and
//! each component. Nothing else holds a reference to any of them; producers
//! talk to the page only through a [`BusHandle`], and the page routes each
//! drained message to the component that owns the affected state.
//!
//! All timers of all components share one [`TimerQueue<PageTimer>`]. The
//! payload says which component scheduled it, so routing a fired timer is a
//! single match.
//!
//! # Driving the page
//!
//! ```
//! use core::time::Duration;
//! use unipark_core::{DeterministicClock, Document, ToastRequest};
//! use unipark_runtime::{Page, PageConfig};
//! use unipark_widgets::RecordingSurface;
//!
//! let mut page: Page<RecordingSurface> =
//!     Page::new(PageConfig::default(), DeterministicClock::new(), Document::new());
//! page.init(|| Ok(RecordingSurface::new())).expect("init");
//!
//! page.handle().toast(ToastRequest::new("Booked")).expect("bus open");
//! page.pump();
//! assert_eq!(page.toasts().len(), 1);
//!
//! page.advance(Duration::from_millis(4300));
//! assert!(page.toasts().is_empty());
//! ```
//!
//! [`pump`](Page::pump) first fires every timer due at the clock's current
//! time, then routes pending bus messages. Timers scheduled while routing are
//! relative to that time.
//!
//! # Lifecycle
//!
//! Messages sent before [`init`](Page::init) stay queued until the page is
//! running. After [`teardown`](Page::teardown) every timer is cancelled and
//! further messages are discarded.

use core::time::Duration;

use unipark_core::{
    Clock, DeterministicClock, Document, Lot, MapUpdate, RequestEvent, Result, TimerQueue,
    ToastRequest, UserAction,
};
use unipark_widgets::{
    Carousel, CarouselTick, FilterController, MapDrawer, MapSurface, MarkerReconciler, PageRequest,
    Pager, SearchDebounce, Submission, ToastAction, ToastId, ToastQueue, ToastTimer,
};

use crate::bus::{BusHandle, BusMessage, EventBus};
use crate::config::PageConfig;

/// Response header carrying a toast payload.
pub const TOAST_HEADER: &str = "X-UniPark-Toast";
/// Response header carrying named client events.
pub const TRIGGER_HEADER: &str = "HX-Trigger";
/// Event name in the trigger header that carries a lot snapshot.
pub const MAP_UPDATE_EVENT: &str = "map:update";

const LOTS_ATTR: &str = "data-lots";

/// Timer payloads of every component on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTimer {
    Toast(ToastTimer),
    Search(SearchDebounce),
    Carousel(CarouselTick),
}

impl From<ToastTimer> for PageTimer {
    fn from(timer: ToastTimer) -> Self {
        Self::Toast(timer)
    }
}

impl From<SearchDebounce> for PageTimer {
    fn from(timer: SearchDebounce) -> Self {
        Self::Search(timer)
    }
}

impl From<CarouselTick> for PageTimer {
    fn from(timer: CarouselTick) -> Self {
        Self::Carousel(timer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Running,
    TornDown,
}

/// Page context object.
#[derive(Debug)]
pub struct Page<S, C = DeterministicClock> {
    config: PageConfig,
    clock: C,
    timers: TimerQueue<PageTimer>,
    doc: Document,
    bus: EventBus,
    handle: BusHandle,
    toasts: ToastQueue,
    map: MarkerReconciler<S>,
    filter: FilterController,
    drawer: MapDrawer,
    pager: Pager,
    carousel: Carousel,
    lifecycle: Lifecycle,
}

impl<S: MapSurface, C: Clock> Page<S, C> {
    #[must_use]
    pub fn new(config: PageConfig, clock: C, doc: Document) -> Self {
        let bus = EventBus::new();
        let handle = bus.handle();
        Self {
            timers: TimerQueue::starting_at(clock.now_mono()),
            toasts: ToastQueue::new(config.toast_config()),
            map: MarkerReconciler::new(config.map.clone()),
            filter: FilterController::new(config.filter_config(), config.anchors.filter_anchors()),
            drawer: MapDrawer::new(config.anchors.drawer_anchors()),
            pager: Pager::new(config.anchors.results_grid.clone()),
            carousel: Carousel::new(config.carousel_config()),
            config,
            clock,
            doc,
            bus,
            handle,
            lifecycle: Lifecycle::Created,
        }
    }

    /// Bind every component to the document and create the map surface.
    ///
    /// The surface factory runs only when the map anchor exists. Its error is
    /// returned, but the rest of the page is running by then and keeps
    /// working without a map.
    pub fn init(&mut self, create_surface: impl FnOnce() -> Result<S>) -> Result<()> {
        if self.lifecycle != Lifecycle::Created {
            tracing::debug!(lifecycle = ?self.lifecycle, "page init skipped");
            return Ok(());
        }
        let _span = tracing::debug_span!("page_init").entered();
        self.lifecycle = Lifecycle::Running;

        let filter_bound = self.filter.init(&mut self.doc);
        let slides = self.carousel.init(&mut self.doc);
        if slides > 0 {
            self.carousel.start(&mut self.timers);
        }

        let (map, lot_count, result) = self.init_map(create_surface);
        tracing::info!(map, lot_count, filter_bound, slides, "page initialized");
        result
    }

    fn init_map(
        &mut self,
        create_surface: impl FnOnce() -> Result<S>,
    ) -> (&'static str, usize, Result<()>) {
        let anchor = self.config.anchors.parking_map.as_str();
        let Some(map_el) = self.doc.get(anchor) else {
            tracing::debug!(anchor, "map anchor missing, map disabled");
            return ("disabled", 0, Ok(()));
        };
        let lots = match map_el.attr(LOTS_ATTR) {
            None => Vec::new(),
            Some(raw) => Lot::parse_list(raw).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "malformed embedded lot data ignored");
                Vec::new()
            }),
        };
        match self.map.initialize(create_surface, &lots) {
            Ok(()) => ("ready", lots.len(), Ok(())),
            Err(err) => {
                tracing::error!(error = %err, "map surface creation failed");
                ("failed", 0, Err(err))
            }
        }
    }

    /// Cancel every timer, remove every marker and stop routing messages.
    ///
    /// Returns the map surface if one was created.
    pub fn teardown(&mut self) -> Option<S> {
        if self.lifecycle == Lifecycle::TornDown {
            return None;
        }
        self.lifecycle = Lifecycle::TornDown;
        self.toasts.clear(&mut self.timers);
        self.filter.teardown(&mut self.timers);
        self.carousel.stop(&mut self.timers);
        self.timers.clear();
        let discarded = self.bus.drain().len();
        tracing::debug!(discarded, "page torn down");
        self.map.teardown()
    }

    /// A producer handle for this page's bus.
    #[must_use]
    pub fn handle(&self) -> BusHandle {
        self.handle.clone()
    }

    /// Fire due timers, then route pending bus messages.
    ///
    /// Returns the number of messages routed.
    pub fn pump(&mut self) -> usize {
        match self.lifecycle {
            Lifecycle::Created => return 0,
            Lifecycle::TornDown => {
                self.bus.drain();
                return 0;
            }
            Lifecycle::Running => {}
        }
        self.fire_due_timers();
        let messages = self.bus.drain();
        let routed = messages.len();
        for message in messages {
            tracing::trace!(channel = message.channel(), "routing message");
            self.route(message);
        }
        routed
    }

    /// Parse response headers and dispatch their payloads on the bus.
    ///
    /// Malformed payloads are logged and dropped. Returns the number of
    /// messages dispatched.
    pub fn ingest_response_headers(&self, toast: Option<&str>, trigger: Option<&str>) -> usize {
        let mut dispatched = 0;

        if let Some(raw) = toast {
            match ToastRequest::from_json(raw) {
                Ok(request) => {
                    if self.handle.toast(request).is_ok() {
                        dispatched += 1;
                    }
                }
                Err(err) => {
                    tracing::warn!(header = TOAST_HEADER, error = %err, "malformed toast payload dropped");
                }
            }
        }

        if let Some(raw) = trigger {
            dispatched += self.ingest_trigger(raw);
        }
        dispatched
    }

    /// Dismiss a toast (the renderer's close button).
    pub fn dismiss_toast(&mut self, id: ToastId) -> bool {
        self.toasts.dismiss(&mut self.timers, id)
    }

    /// Submissions produced since the last call.
    pub fn take_submissions(&mut self) -> Vec<Submission> {
        self.filter.take_submissions()
    }

    /// Load-more requests produced since the last call.
    pub fn take_page_requests(&mut self) -> Vec<PageRequest> {
        self.pager.take_requests()
    }

    /// Toast render actions produced since the last call.
    pub fn drain_toast_actions(&mut self) -> Vec<ToastAction> {
        self.toasts.drain_actions()
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now_mono()
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    #[must_use]
    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Mutable access for hosts applying server swaps to the document.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    #[must_use]
    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    #[must_use]
    pub fn map(&self) -> &MarkerReconciler<S> {
        &self.map
    }

    #[must_use]
    pub fn filter(&self) -> &FilterController {
        &self.filter
    }

    #[must_use]
    pub fn drawer(&self) -> &MapDrawer {
        &self.drawer
    }

    #[must_use]
    pub fn carousel(&self) -> &Carousel {
        &self.carousel
    }

    #[must_use]
    pub fn timers(&self) -> &TimerQueue<PageTimer> {
        &self.timers
    }

    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    // --- Internal methods ---

    fn fire_due_timers(&mut self) -> usize {
        let now = self.clock.now_mono();
        let mut fired = 0;
        while let Some(timer) = self.timers.pop_due(now) {
            fired += 1;
            match timer.payload {
                PageTimer::Toast(t) => self.toasts.on_timer(&mut self.timers, t),
                PageTimer::Search(_) => {
                    let generation = self.filter.on_search_timer(&mut self.doc, timer.id);
                    self.after_submit(generation);
                }
                PageTimer::Carousel(_) => self.carousel.on_tick(&mut self.doc),
            }
        }
        self.timers.settle(now);
        fired
    }

    fn route(&mut self, message: BusMessage) {
        match message {
            BusMessage::Toast(request) => {
                self.toasts.push(&mut self.timers, request);
            }
            BusMessage::Map(update) => self.apply_map_update(&update),
            BusMessage::Focus(focus) => {
                self.map.focus(&focus.id);
            }
            BusMessage::Blur(blur) => {
                self.map.blur(&blur.id);
            }
            BusMessage::Input(action) => self.route_input(action),
            BusMessage::Request(RequestEvent::Started) => {
                self.filter.on_request_started(&mut self.doc);
            }
            BusMessage::Request(RequestEvent::Completed {
                generation,
                outcome,
            }) => {
                self.filter
                    .on_request_completed(&mut self.doc, generation, outcome);
            }
        }
    }

    fn route_input(&mut self, action: UserAction) {
        let doc = &mut self.doc;
        let generation = match action {
            UserAction::SearchInput(text) => {
                self.filter.on_search_input(doc, &mut self.timers, &text);
                None
            }
            UserAction::ChipClicked(value) => self.filter.on_chip_click(doc, value.as_deref()),
            UserAction::LiveToggled => self.filter.on_live_toggle(doc),
            UserAction::ClearFilters => self.filter.on_clear(doc),
            UserAction::SortChanged(sort) => self.filter.on_sort_change(doc, &sort),
            UserAction::MapToggled => {
                self.drawer.toggle(doc);
                None
            }
            UserAction::LoadMoreVisible => {
                self.pager.on_anchor_visible(doc, self.filter.is_busy());
                None
            }
            UserAction::CarouselGoTo(index) => {
                self.carousel.go_to(doc, index);
                None
            }
            UserAction::CarouselPause => {
                self.carousel.stop(&mut self.timers);
                None
            }
            UserAction::CarouselResume => {
                self.carousel.start(&mut self.timers);
                None
            }
        };
        self.after_submit(generation);
    }

    fn after_submit(&mut self, generation: Option<u64>) {
        if generation.is_some() {
            self.pager.reset();
        }
    }

    fn apply_map_update(&mut self, update: &MapUpdate) {
        let applied = match update.revision {
            Some(revision) => self.map.reconcile_revision(revision, &update.lots),
            None => self.map.reconcile(&update.lots),
        };
        tracing::debug!(
            lot_count = update.lots.len(),
            revision = update.revision,
            applied,
            "map update routed"
        );
    }

    fn ingest_trigger(&self, raw: &str) -> usize {
        if !raw.trim_start().starts_with('{') {
            tracing::debug!(header = TRIGGER_HEADER, "trigger without payloads ignored");
            return 0;
        }
        let value: serde_json::Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(header = TRIGGER_HEADER, error = %err, "malformed trigger payload dropped");
                return 0;
            }
        };
        let serde_json::Value::Object(events) = value else {
            tracing::debug!(header = TRIGGER_HEADER, "trigger without payloads ignored");
            return 0;
        };

        let mut dispatched = 0;
        for (name, payload) in events {
            if name != MAP_UPDATE_EVENT {
                tracing::debug!(event = %name, "unhandled trigger event");
                continue;
            }
            match serde_json::from_value::<MapUpdate>(payload) {
                Ok(update) => {
                    if self.handle.map_update(update).is_ok() {
                        dispatched += 1;
                    }
                }
                Err(err) => {
                    tracing::warn!(event = %name, error = %err, "malformed map update dropped");
                }
            }
        }
        dispatched
    }
}

impl<S: MapSurface> Page<S, DeterministicClock> {
    /// Advance virtual time by `dt`, then [`pump`](Self::pump).
    pub fn advance(&mut self, dt: Duration) -> usize {
        self.clock.advance(dt);
        self.pump()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unipark_core::{Element, Error};
    use unipark_widgets::RecordingSurface;

    fn page(doc: Document) -> Page<RecordingSurface> {
        Page::new(PageConfig::default(), DeterministicClock::new(), doc)
    }

    #[test]
    fn messages_before_init_wait_for_running() {
        let mut p = page(Document::new());
        p.handle().toast(ToastRequest::new("Early")).expect("open");
        assert_eq!(p.pump(), 0);
        p.init(|| Ok(RecordingSurface::new())).expect("init");
        assert_eq!(p.pump(), 1);
        assert_eq!(p.toasts().len(), 1);
    }

    #[test]
    fn map_anchor_missing_skips_factory() {
        let mut p = page(Document::new());
        p.init(|| Err(Error::map_surface("should not run")))
            .expect("factory not called");
        assert!(!p.map().is_initialized());
    }

    #[test]
    fn embedded_lots_seed_the_map() {
        let doc = Document::new().with(Element::new("parking-map").with_attr(
            LOTS_ATTR,
            r#"[{"id":1,"title":"A","latitude":1.0,"longitude":1.0},
                {"id":"2","name":"B","latitude":2.0,"longitude":2.0}]"#,
        ));
        let mut p = page(doc);
        p.init(|| Ok(RecordingSurface::new())).expect("init");
        assert_eq!(p.map().marker_count(), 2);
    }

    #[test]
    fn malformed_embedded_lots_mean_no_lots() {
        let doc = Document::new().with(Element::new("parking-map").with_attr(LOTS_ATTR, "[{"));
        let mut p = page(doc);
        p.init(|| Ok(RecordingSurface::new())).expect("init");
        assert!(p.map().is_initialized());
        assert_eq!(p.map().marker_count(), 0);
    }

    #[test]
    fn factory_error_is_returned_and_page_keeps_running() {
        let doc = Document::new().with(Element::new("parking-map"));
        let mut p = page(doc);
        let err = p
            .init(|| Err(Error::map_surface("no container")))
            .unwrap_err();
        assert!(matches!(err, Error::MapSurface { .. }));
        assert_eq!(p.lifecycle(), Lifecycle::Running);
        p.handle().toast(ToastRequest::default()).expect("open");
        p.pump();
        assert_eq!(p.toasts().len(), 1);
    }

    #[test]
    fn teardown_cancels_everything() {
        let doc = Document::new()
            .with(Element::new("parking-map"))
            .with(Element::new("t0").with_attr("data-testimonial", ""))
            .with(Element::new("t1").with_attr("data-testimonial", ""));
        let mut p = page(doc);
        p.init(|| Ok(RecordingSurface::new())).expect("init");
        p.handle().toast(ToastRequest::default()).expect("open");
        p.pump();
        assert!(!p.timers().is_empty());

        let surface = p.teardown().expect("surface");
        assert_eq!(surface.marker_count(), 0);
        assert!(p.timers().is_empty());
        assert!(p.toasts().is_empty());
        assert_eq!(p.lifecycle(), Lifecycle::TornDown);

        p.handle().toast(ToastRequest::default()).expect("open");
        assert_eq!(p.pump(), 0);
        assert!(p.toasts().is_empty());
        assert!(p.teardown().is_none());
    }

    #[test]
    fn trigger_header_ignores_other_events() {
        let mut p = page(Document::new().with(Element::new("parking-map")));
        p.init(|| Ok(RecordingSurface::new())).expect("init");
        let n = p.ingest_response_headers(None, Some(r#"{"reservation:refresh":{}}"#));
        assert_eq!(n, 0);
        assert_eq!(p.ingest_response_headers(None, Some("\"plainEvent\"")), 0);
        assert_eq!(p.ingest_response_headers(None, Some("map:update")), 0);
        assert_eq!(p.pump(), 0);
    }
}
