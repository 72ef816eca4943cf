//! Property-based invariant tests for the stateful widgets.
//!
//! 1. Marker set equals the id set of the last applied snapshot
//! 2. Focus and blur never change the marker set
//! 3. Exactly one chip is active after any sequence of filter triggers
//! 4. Each toast is removed exactly once, no later than its lifetime
//! 5. A stale revision never changes the marker set

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use proptest::prelude::*;
use unipark_core::{Document, Element, Lot, LotId, TimerQueue, ToastRequest};
use unipark_widgets::{
    FilterController, MarkerReconciler, RecordingSurface, ToastAction, ToastId, ToastQueue,
    ToastTimer,
};

// ── Strategies ──────────────────────────────────────────────────────────

fn lots_strategy() -> impl Strategy<Value = Vec<Lot>> {
    prop::collection::vec(
        (0u64..30, -80.0f64..80.0, -170.0f64..170.0)
            .prop_map(|(id, lat, lng)| Lot::new(id, format!("Lot {id}"), lat, lng)),
        0..15,
    )
}

#[derive(Debug, Clone)]
enum MapOp {
    Reconcile(Vec<Lot>),
    Focus(u64),
    Blur(u64),
}

fn map_op_strategy() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        lots_strategy().prop_map(MapOp::Reconcile),
        (0u64..30).prop_map(MapOp::Focus),
        (0u64..30).prop_map(MapOp::Blur),
    ]
}

#[derive(Debug, Clone)]
enum FilterOp {
    Chip(Option<String>),
    Live,
    Clear,
    Sort(String),
}

fn filter_op_strategy() -> impl Strategy<Value = FilterOp> {
    prop_oneof![
        prop::option::of(prop::sample::select(vec![
            "all".to_owned(),
            "ev".to_owned(),
            "covered".to_owned(),
            "unknown".to_owned(),
            String::new(),
        ]))
        .prop_map(FilterOp::Chip),
        Just(FilterOp::Live),
        Just(FilterOp::Clear),
        prop::sample::select(vec!["closest".to_owned(), "price".to_owned()])
            .prop_map(FilterOp::Sort),
    ]
}

fn id_set(lots: &[Lot]) -> BTreeSet<LotId> {
    lots.iter().map(|l| l.id.clone()).collect()
}

fn ready(lots: &[Lot]) -> MarkerReconciler<RecordingSurface> {
    let mut r = MarkerReconciler::default();
    r.initialize(|| Ok(RecordingSurface::new()), lots)
        .expect("recording surface never fails");
    r
}

// ═══════════════════════════════════════════════════════════════════════
// 1-2. Marker set tracks snapshots; focus/blur are pure restyles
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn marker_set_equals_last_snapshot(
        initial in lots_strategy(),
        ops in prop::collection::vec(map_op_strategy(), 0..30),
    ) {
        let mut r = ready(&initial);
        let mut expected = id_set(&initial);

        for op in &ops {
            match op {
                MapOp::Reconcile(lots) => {
                    r.reconcile(lots);
                    expected = id_set(lots);
                }
                MapOp::Focus(id) => {
                    r.focus(&LotId::from(*id));
                }
                MapOp::Blur(id) => {
                    r.blur(&LotId::from(*id));
                }
            }
            let tracked: BTreeSet<LotId> = r.marker_ids().into_iter().collect();
            prop_assert_eq!(&tracked, &expected);
            let drawn: BTreeSet<LotId> = r
                .surface()
                .map(RecordingSurface::drawn_ids)
                .unwrap_or_default()
                .into_iter()
                .collect();
            prop_assert_eq!(&drawn, &expected);
        }
    }

    #[test]
    fn focus_blur_never_change_marker_set(
        initial in lots_strategy(),
        ids in prop::collection::vec((0u64..30, any::<bool>()), 0..40),
    ) {
        let mut r = ready(&initial);
        let before = r.marker_ids();
        for (id, focus) in ids {
            let id = LotId::from(id);
            if focus {
                r.focus(&id);
            } else {
                r.blur(&id);
            }
        }
        prop_assert_eq!(r.marker_ids(), before);
    }

    #[test]
    fn stale_revision_never_applies(
        first in lots_strategy(),
        second in lots_strategy(),
        rev in 1u64..100,
        back in 0u64..100,
    ) {
        let mut r = ready(&[]);
        prop_assert!(r.reconcile_revision(rev, &first));
        let stale = rev.saturating_sub(back);
        prop_assert!(!r.reconcile_revision(stale, &second));
        let tracked: BTreeSet<LotId> = r.marker_ids().into_iter().collect();
        prop_assert_eq!(tracked, id_set(&first));
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 3. Chip exclusivity
// ═══════════════════════════════════════════════════════════════════════

fn search_page() -> Document {
    Document::new()
        .with(Element::new("filters-form"))
        .with(Element::new("search"))
        .with(Element::new("btn-live"))
        .with(Element::new("results-pane"))
        .with(Element::new("results-grid"))
        .with(Element::new("selected-filter").with_value("all"))
        .with(Element::new("chip-all").with_attr("data-filter", "all"))
        .with(Element::new("chip-ev").with_attr("data-filter", "ev"))
        .with(Element::new("chip-covered").with_attr("data-filter", "covered"))
}

proptest! {
    #[test]
    fn exactly_one_chip_active(ops in prop::collection::vec(filter_op_strategy(), 0..25)) {
        let mut doc = search_page();
        let mut c = FilterController::default();
        prop_assert!(c.init(&mut doc));

        for op in &ops {
            match op {
                FilterOp::Chip(value) => {
                    c.on_chip_click(&mut doc, value.as_deref());
                }
                FilterOp::Live => {
                    c.on_live_toggle(&mut doc);
                }
                FilterOp::Clear => {
                    c.on_clear(&mut doc);
                }
                FilterOp::Sort(sort) => {
                    c.on_sort_change(&mut doc, sort);
                }
            }
            let active: Vec<&Element> = doc
                .with_attr("data-filter")
                .filter(|e| e.flag("aria-pressed"))
                .collect();
            prop_assert_eq!(active.len(), 1);
            prop_assert!(active[0].has_class("is-active"));
            prop_assert_eq!(active[0].attr("data-filter"), Some(c.state().filter_key.as_str()));
            prop_assert_eq!(
                doc.with_attr("data-filter").filter(|e| e.has_class("is-active")).count(),
                1
            );
        }
        prop_assert_eq!(c.take_submissions().len(), ops.len());
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 4. Toast single-firing and lifetime bound
// ═══════════════════════════════════════════════════════════════════════

/// Record the time of every `Remove` action, failing on a second removal.
fn record_removals(queue: &mut ToastQueue, now: u64, removed_at: &mut HashMap<ToastId, u64>) {
    for action in queue.drain_actions() {
        if let ToastAction::Remove(id) = action {
            let prior = removed_at.insert(id, now);
            assert!(prior.is_none(), "toast {id} removed twice");
        }
    }
}

proptest! {
    #[test]
    fn each_toast_removed_once_within_lifetime(
        pushes in prop::collection::vec(0u64..3000, 1..10),
        dismisses in prop::collection::vec((0usize..10, 0u64..5000), 0..10),
    ) {
        let mut timers: TimerQueue<ToastTimer> = TimerQueue::new();
        let mut queue = ToastQueue::with_defaults();

        // Merge pushes and dismisses into one timeline.
        let mut events: Vec<(u64, Option<usize>)> =
            pushes.iter().map(|&at| (at, None)).collect();
        events.extend(dismisses.iter().map(|&(idx, at)| (at, Some(idx))));
        events.sort_by_key(|&(at, dismiss)| (at, dismiss.is_some()));

        let mut ids = Vec::new();
        let mut pushed_at = Vec::new();
        let mut removed_at = HashMap::new();

        for (at, dismiss) in events {
            let until = Duration::from_millis(at);
            while let Some(fired) = timers.pop_due(until) {
                queue.on_timer(&mut timers, fired.payload);
                let now = u64::try_from(fired.deadline.as_millis()).unwrap_or(u64::MAX);
                record_removals(&mut queue, now, &mut removed_at);
            }
            timers.settle(until);
            match dismiss {
                None => {
                    ids.push(queue.push(&mut timers, ToastRequest::new("t")));
                    pushed_at.push(at);
                }
                Some(idx) => {
                    if let Some(&id) = ids.get(idx) {
                        queue.dismiss(&mut timers, id);
                    }
                }
            }
            record_removals(&mut queue, at, &mut removed_at);
        }

        let end = Duration::from_millis(10_000);
        while let Some(fired) = timers.pop_due(end) {
            queue.on_timer(&mut timers, fired.payload);
            let now = u64::try_from(fired.deadline.as_millis()).unwrap_or(u64::MAX);
            record_removals(&mut queue, now, &mut removed_at);
        }

        prop_assert!(queue.is_empty());
        prop_assert!(timers.is_empty());
        prop_assert_eq!(removed_at.len(), ids.len());
        for (id, at) in ids.iter().zip(&pushed_at) {
            let removed = removed_at[id];
            prop_assert!(removed <= at + 4200, "toast {} outlived its lifetime", id);
        }
        let stats = queue.stats();
        prop_assert_eq!(
            stats.user_dismissed + stats.decayed + stats.expired,
            ids.len() as u64
        );
    }
}
