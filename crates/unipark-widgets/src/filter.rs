#![forbid(unsafe_code)]

//! Filter and search controller.
//!
//! Owns the [`QueryState`] of the search page, turns user triggers into
//! [`Submission`]s for the transport and mirrors state onto the document
//! (chips, live button, hidden form fields, busy markers on the results
//! regions).
//!
//! # Triggers
//!
//! | Trigger | State change | Submission |
//! |---------|--------------|------------|
//! | Search input | `free_text` | After a quiet window (default 350 ms) |
//! | Chip click | `filter_key` | Immediate |
//! | Live toggle | `live_only` flipped | Immediate |
//! | Clear filters | `filter_key = "all"`, `free_text = ""` | Immediate |
//! | Sort change | `sort_key` | Immediate |
//!
//! Chip and button state is painted before the submission leaves, so the UI
//! reflects the query synchronously. An immediate trigger leaves a pending
//! debounced search in place; when that fires it submits whatever the query
//! is at that moment.
//!
//! # Busy tracking
//!
//! Each submission bumps `request_generation`. Completions are classified by
//! generation ([`Completion`]) for the caller, but busy is cleared by any
//! completion, success or failure.
//!
//! # Failure Modes
//!
//! Without the filter form anchor the controller is inert: triggers change
//! nothing and submit nothing.

use core::time::Duration;

use serde::{Deserialize, Serialize};
use unipark_core::{Debounce, Document, Element, RequestOutcome, TimerId, TimerQueue};

/// Filter key meaning "no filter".
pub const FILTER_ALL: &str = "all";

/// Attribute carrying a chip's filter value.
const CHIP_ATTR: &str = "data-filter";
const ACTIVE_CLASS: &str = "is-active";
const LOADING_CLASS: &str = "is-loading";

/// The query the results page is showing (or about to show).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryState {
    pub free_text: String,
    pub filter_key: String,
    pub sort_key: String,
    pub live_only: bool,
    pub request_generation: u64,
}

impl QueryState {
    #[must_use]
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            free_text: String::new(),
            filter_key: config.default_filter.clone(),
            sort_key: config.default_sort.clone(),
            live_only: false,
            request_generation: 0,
        }
    }

    /// Form fields as the server expects them.
    #[must_use]
    pub fn form_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.free_text.clone()),
            ("filter", self.filter_key.clone()),
            ("sort", self.sort_key.clone()),
            ("live", if self.live_only { "1" } else { "" }.to_owned()),
        ]
    }
}

/// A query handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub generation: u64,
    pub query: QueryState,
}

/// How a completed request relates to the latest submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Answers the most recent submission.
    Current,
    /// Answers a superseded submission.
    Stale,
    /// Not tied to a submission (pagination, external requests).
    Untracked,
}

/// Timer payload for the search debounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchDebounce;

/// Element ids the controller binds to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterAnchors {
    pub form: String,
    pub search: String,
    pub live_button: String,
    pub clear_button: String,
    pub results_pane: String,
    pub results_grid: String,
    pub filter_field: String,
    pub sort_field: String,
    pub live_field: String,
}

impl Default for FilterAnchors {
    fn default() -> Self {
        Self {
            form: "filters-form".to_owned(),
            search: "search".to_owned(),
            live_button: "btn-live".to_owned(),
            clear_button: "clear-filters".to_owned(),
            results_pane: "results-pane".to_owned(),
            results_grid: "results-grid".to_owned(),
            filter_field: "selected-filter".to_owned(),
            sort_field: "selected-sort".to_owned(),
            live_field: "selected-live".to_owned(),
        }
    }
}

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub debounce: Duration,
    pub default_filter: String,
    pub default_sort: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(350),
            default_filter: FILTER_ALL.to_owned(),
            default_sort: "closest".to_owned(),
        }
    }
}

/// Search page controller.
#[derive(Debug)]
pub struct FilterController {
    anchors: FilterAnchors,
    config: FilterConfig,
    state: QueryState,
    bound: bool,
    search: Debounce<()>,
    busy: bool,
    busy_rises: u64,
    submissions: Vec<Submission>,
}

impl FilterController {
    #[must_use]
    pub fn new(config: FilterConfig, anchors: FilterAnchors) -> Self {
        Self {
            state: QueryState::new(&config),
            search: Debounce::new(config.debounce),
            anchors,
            config,
            bound: false,
            busy: false,
            busy_rises: 0,
            submissions: Vec::new(),
        }
    }

    /// Bind to the document and adopt the state it was rendered with.
    ///
    /// Returns `false` (and stays inert) when the filter form is missing.
    pub fn init(&mut self, doc: &mut Document) -> bool {
        if !doc.contains(&self.anchors.form) {
            tracing::debug!(anchor = %self.anchors.form, "filter form missing, controller inert");
            self.bound = false;
            return false;
        }
        self.bound = true;

        let field = |id: &str| doc.get(id).map(|e| e.value().to_owned());
        let filter = field(&self.anchors.filter_field).unwrap_or_default();
        if let Some(sort) = field(&self.anchors.sort_field).filter(|s| !s.is_empty()) {
            self.state.sort_key = sort;
        }
        if let Some(text) = field(&self.anchors.search) {
            self.state.free_text = text;
        }
        self.state.live_only = doc
            .get(&self.anchors.live_button)
            .is_some_and(|e| e.flag("aria-pressed"))
            || field(&self.anchors.live_field).as_deref() == Some("1");
        self.state.filter_key = self.normalize_filter(doc, &filter);

        self.paint(doc);
        self.write_busy(doc);
        tracing::debug!(
            filter = %self.state.filter_key,
            sort = %self.state.sort_key,
            live = self.state.live_only,
            "filter controller bound"
        );
        true
    }

    /// Search text changed; submit once input goes quiet.
    pub fn on_search_input<T>(&mut self, doc: &mut Document, timers: &mut TimerQueue<T>, text: &str)
    where
        T: Clone + From<SearchDebounce>,
    {
        if !self.bound {
            return;
        }
        self.state.free_text = text.to_owned();
        doc.update(&self.anchors.search, |e| e.set_value(text));
        self.search.call(timers, (), SearchDebounce.into());
    }

    /// Route the debounce timer. Returns the submitted generation if it fired.
    pub fn on_search_timer(&mut self, doc: &mut Document, id: TimerId) -> Option<u64> {
        self.search.fire(id)?;
        if !self.bound {
            return None;
        }
        Some(self.submit(doc))
    }

    /// A chip was clicked; `None` or an empty value selects "all".
    pub fn on_chip_click(&mut self, doc: &mut Document, value: Option<&str>) -> Option<u64> {
        if !self.bound {
            return None;
        }
        self.state.filter_key = self.normalize_filter(doc, value.unwrap_or_default());
        self.paint(doc);
        Some(self.submit(doc))
    }

    pub fn on_live_toggle(&mut self, doc: &mut Document) -> Option<u64> {
        if !self.bound {
            return None;
        }
        self.state.live_only = !self.state.live_only;
        self.paint(doc);
        Some(self.submit(doc))
    }

    /// Reset the filter and the search text.
    pub fn on_clear(&mut self, doc: &mut Document) -> Option<u64> {
        if !self.bound {
            return None;
        }
        self.state.filter_key = FILTER_ALL.to_owned();
        self.state.free_text.clear();
        doc.update(&self.anchors.search, |e| e.set_value(""));
        self.paint(doc);
        Some(self.submit(doc))
    }

    pub fn on_sort_change(&mut self, doc: &mut Document, sort: &str) -> Option<u64> {
        if !self.bound {
            return None;
        }
        self.state.sort_key = if sort.trim().is_empty() {
            self.config.default_sort.clone()
        } else {
            sort.to_owned()
        };
        self.paint(doc);
        Some(self.submit(doc))
    }

    /// A request left the page (ours or anyone's).
    pub fn on_request_started(&mut self, doc: &mut Document) {
        if self.bound {
            self.set_busy(doc, true);
        }
    }

    /// A request finished. Busy is cleared regardless of outcome.
    pub fn on_request_completed(
        &mut self,
        doc: &mut Document,
        generation: Option<u64>,
        outcome: RequestOutcome,
    ) -> Completion {
        if self.bound {
            self.set_busy(doc, false);
        }
        let completion = match generation {
            None => Completion::Untracked,
            Some(g) if g == self.state.request_generation => Completion::Current,
            Some(_) => Completion::Stale,
        };
        tracing::debug!(
            generation,
            current = self.state.request_generation,
            ?outcome,
            ?completion,
            "request completed"
        );
        completion
    }

    /// Submissions produced since the last call, oldest first.
    pub fn take_submissions(&mut self) -> Vec<Submission> {
        std::mem::take(&mut self.submissions)
    }

    /// Drop the pending search and unbind.
    pub fn teardown<T: Clone>(&mut self, timers: &mut TimerQueue<T>) {
        self.search.cancel(timers);
        self.bound = false;
    }

    #[must_use]
    pub fn state(&self) -> &QueryState {
        &self.state
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Number of times busy went from `false` to `true`.
    #[must_use]
    pub fn busy_rises(&self) -> u64 {
        self.busy_rises
    }

    #[must_use]
    pub fn search_pending(&self) -> bool {
        self.search.is_pending()
    }

    #[must_use]
    pub fn anchors(&self) -> &FilterAnchors {
        &self.anchors
    }

    // --- Internal methods ---

    fn normalize_filter(&self, doc: &Document, raw: &str) -> String {
        let key = raw.trim();
        if key.is_empty() {
            return FILTER_ALL.to_owned();
        }
        let mut chips = doc.with_attr(CHIP_ATTR).peekable();
        if chips.peek().is_none() {
            return key.to_owned();
        }
        if chips.any(|chip| chip.attr(CHIP_ATTR) == Some(key)) {
            key.to_owned()
        } else {
            tracing::debug!(key, "filter key matches no chip, using all");
            FILTER_ALL.to_owned()
        }
    }

    fn submit(&mut self, doc: &mut Document) -> u64 {
        self.state.request_generation += 1;
        let generation = self.state.request_generation;
        self.sync_fields(doc);
        self.set_busy(doc, true);
        self.submissions.push(Submission {
            generation,
            query: self.state.clone(),
        });
        tracing::debug!(
            generation,
            q = %self.state.free_text,
            filter = %self.state.filter_key,
            sort = %self.state.sort_key,
            live = self.state.live_only,
            "search submitted"
        );
        generation
    }

    fn paint(&self, doc: &mut Document) {
        let key = self.state.filter_key.as_str();
        for chip in doc.with_attr_mut(CHIP_ATTR) {
            let active = chip.attr(CHIP_ATTR) == Some(key);
            chip.toggle_class(ACTIVE_CLASS, active);
            chip.set_attr("aria-pressed", active.to_string());
        }

        let live = self.state.live_only;
        doc.update(&self.anchors.live_button, |e| {
            e.set_attr("aria-pressed", live.to_string());
            e.toggle_class(ACTIVE_CLASS, live);
        });
        self.sync_fields(doc);
    }

    fn sync_fields(&self, doc: &mut Document) {
        let live = if self.state.live_only { "1" } else { "" };
        for (id, value) in [
            (&self.anchors.filter_field, self.state.filter_key.as_str()),
            (&self.anchors.sort_field, self.state.sort_key.as_str()),
            (&self.anchors.live_field, live),
        ] {
            if !doc.update(id, |e| e.set_value(value)) {
                doc.insert(
                    Element::new(id.as_str())
                        .with_attr("type", "hidden")
                        .with_value(value),
                );
            }
        }
    }

    fn set_busy(&mut self, doc: &mut Document, busy: bool) {
        if busy && !self.busy {
            self.busy_rises += 1;
        }
        self.busy = busy;
        self.write_busy(doc);
    }

    fn write_busy(&self, doc: &mut Document) {
        let busy = self.busy;
        for id in [&self.anchors.results_pane, &self.anchors.results_grid] {
            doc.update(id, |e| {
                e.set_attr("aria-busy", busy.to_string());
                e.toggle_class(LOADING_CLASS, busy);
            });
        }
    }
}

impl Default for FilterController {
    fn default() -> Self {
        Self::new(FilterConfig::default(), FilterAnchors::default())
    }
}
