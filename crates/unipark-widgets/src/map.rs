#![forbid(unsafe_code)]

//! Map marker reconciliation.
//!
//! [`MarkerReconciler`] keeps the pins drawn on a [`MapSurface`] equal to
//! the most recently applied lot snapshot and restyles pins on card
//! focus/blur.
//!
//! # Design
//!
//! Reconciliation is a full replacement: every tracked marker is removed
//! from the surface and one marker is created per lot in the new snapshot.
//! Snapshots are small and arrive at human pace, and a full replace leaves
//! no room for drift between `known` and the surface.
//!
//! The surface itself is an external collaborator created lazily through a
//! factory passed to [`MarkerReconciler::initialize`]. Events that arrive
//! before the surface exists are dropped.
//!
//! # Invariants
//!
//! 1. After any applied snapshot, the tracked id set equals the snapshot's id
//!    set (duplicate ids keep their first occurrence).
//! 2. Focus and blur never add or remove markers.
//! 3. The surface factory runs at most once per reconciler lifetime.
//! 4. A snapshot carrying a revision that is not newer than the last applied
//!    revision is rejected.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Factory error | Returned to the caller; reconciler stays uninitialized |
//! | Update before init | Ignored (debug log) |
//! | Unknown id on focus/blur | No-op, returns `false` |

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use unipark_core::{Lot, LotId, Result};

/// A geographic position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for LatLng {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<LatLng> for [f64; 2] {
    fn from(value: LatLng) -> Self {
        [value.lat, value.lng]
    }
}

impl From<&Lot> for LatLng {
    fn from(lot: &Lot) -> Self {
        Self::new(lot.latitude, lot.longitude)
    }
}

/// Surface-assigned handle for a drawn marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerHandle(u64);

impl MarkerHandle {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Circle marker style.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerStyle {
    pub radius: u16,
    pub color: String,
    pub fill_color: String,
    pub fill_opacity: f64,
    pub weight: u16,
}

/// Colours and geometry for default and highlighted markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerPalette {
    pub radius: u16,
    pub default_color: String,
    pub highlight_color: String,
    pub fill_opacity: f64,
    pub weight: u16,
}

impl Default for MarkerPalette {
    fn default() -> Self {
        Self {
            radius: 9,
            default_color: "#22C55E".to_owned(),
            highlight_color: "#7C2AE8".to_owned(),
            fill_opacity: 0.85,
            weight: 2,
        }
    }
}

impl MarkerPalette {
    #[must_use]
    pub fn style(&self, highlighted: bool) -> MarkerStyle {
        let color = if highlighted {
            &self.highlight_color
        } else {
            &self.default_color
        };
        MarkerStyle {
            radius: self.radius,
            color: color.clone(),
            fill_color: color.clone(),
            fill_opacity: self.fill_opacity,
            weight: self.weight,
        }
    }
}

/// Everything the surface needs to draw one lot.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub lot_id: LotId,
    pub position: LatLng,
    pub style: MarkerStyle,
    /// Popup markup; title and address are HTML-escaped.
    pub popup_html: String,
}

impl MarkerSpec {
    #[must_use]
    pub fn for_lot(lot: &Lot, palette: &MarkerPalette) -> Self {
        Self {
            lot_id: lot.id.clone(),
            position: LatLng::from(lot),
            style: palette.style(false),
            popup_html: format!(
                "<strong>{}</strong><br>{}",
                v_htmlescape::escape(lot.display_title()),
                v_htmlescape::escape(&lot.address),
            ),
        }
    }
}

/// Initial map view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapViewConfig {
    pub center: LatLng,
    pub zoom: u8,
    pub max_zoom: u8,
    pub markers: MarkerPalette,
}

impl Default for MapViewConfig {
    fn default() -> Self {
        Self {
            center: LatLng::new(33.8938, 35.5018),
            zoom: 14,
            max_zoom: 19,
            markers: MarkerPalette::default(),
        }
    }
}

/// Drawing operations the reconciler needs from a map library.
pub trait MapSurface {
    /// Draw a marker and return its handle.
    fn add_marker(&mut self, spec: &MarkerSpec) -> MarkerHandle;

    /// Remove a previously drawn marker. Unknown handles are ignored.
    fn remove_marker(&mut self, handle: MarkerHandle);

    /// Restyle a drawn marker in place.
    fn set_marker_style(&mut self, handle: MarkerHandle, style: &MarkerStyle);

    /// Recentre without changing zoom.
    fn pan_to(&mut self, center: LatLng);

    /// Set centre and zoom.
    fn set_view(&mut self, center: LatLng, zoom: u8);
}

/// Counters for monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub applied: u64,
    pub rejected_stale: u64,
    pub ignored_uninitialized: u64,
    pub markers_added: u64,
    pub markers_removed: u64,
}

#[derive(Debug)]
struct Marker {
    handle: MarkerHandle,
    position: LatLng,
    highlighted: bool,
}

/// Keeps drawn markers consistent with lot snapshots.
#[derive(Debug)]
pub struct MarkerReconciler<S> {
    surface: Option<S>,
    factory_used: bool,
    view: MapViewConfig,
    known: HashMap<LotId, Marker>,
    last_revision: Option<u64>,
    stats: ReconcileStats,
}

impl<S: MapSurface> MarkerReconciler<S> {
    #[must_use]
    pub fn new(view: MapViewConfig) -> Self {
        Self {
            surface: None,
            factory_used: false,
            view,
            known: HashMap::new(),
            last_revision: None,
            stats: ReconcileStats::default(),
        }
    }

    /// Create the surface (once) and draw the initial lots.
    ///
    /// The factory is not called again after its first invocation, even if
    /// it failed.
    pub fn initialize(
        &mut self,
        create_surface: impl FnOnce() -> Result<S>,
        initial_lots: &[Lot],
    ) -> Result<()> {
        if self.surface.is_none() {
            if self.factory_used {
                return Ok(());
            }
            self.factory_used = true;
            let mut surface = create_surface()?;
            surface.set_view(self.view.center, self.view.zoom);
            self.surface = Some(surface);
            tracing::debug!(
                lat = self.view.center.lat,
                lng = self.view.center.lng,
                zoom = self.view.zoom,
                "map surface created"
            );
        }
        self.replace_all(initial_lots, false);
        Ok(())
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.surface.is_some()
    }

    /// Replace every marker with one per lot. Returns `false` before init.
    pub fn reconcile(&mut self, lots: &[Lot]) -> bool {
        if self.surface.is_none() {
            self.stats.ignored_uninitialized += 1;
            tracing::debug!(lot_count = lots.len(), "map update before init ignored");
            return false;
        }
        self.replace_all(lots, true);
        true
    }

    /// [`reconcile`](Self::reconcile) guarded by a producer revision.
    pub fn reconcile_revision(&mut self, revision: u64, lots: &[Lot]) -> bool {
        if self.last_revision.is_some_and(|last| revision <= last) {
            self.stats.rejected_stale += 1;
            tracing::debug!(
                revision,
                last = self.last_revision,
                "stale map update rejected"
            );
            return false;
        }
        if !self.reconcile(lots) {
            return false;
        }
        self.last_revision = Some(revision);
        true
    }

    /// Highlight a marker and centre on it.
    pub fn focus(&mut self, id: &LotId) -> bool {
        let (Some(surface), Some(marker)) = (self.surface.as_mut(), self.known.get_mut(id)) else {
            return false;
        };
        surface.pan_to(marker.position);
        surface.set_marker_style(marker.handle, &self.view.markers.style(true));
        marker.highlighted = true;
        true
    }

    /// Restore a marker's default style.
    pub fn blur(&mut self, id: &LotId) -> bool {
        let (Some(surface), Some(marker)) = (self.surface.as_mut(), self.known.get_mut(id)) else {
            return false;
        };
        surface.set_marker_style(marker.handle, &self.view.markers.style(false));
        marker.highlighted = false;
        true
    }

    /// Ids with a drawn marker, sorted.
    #[must_use]
    pub fn marker_ids(&self) -> Vec<LotId> {
        let mut ids: Vec<LotId> = self.known.keys().cloned().collect();
        ids.sort();
        ids
    }

    #[must_use]
    pub fn has_marker(&self, id: &LotId) -> bool {
        self.known.contains_key(id)
    }

    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.known.len()
    }

    /// Whether the marker for `id` is highlighted; `None` if unknown.
    #[must_use]
    pub fn is_highlighted(&self, id: &LotId) -> Option<bool> {
        self.known.get(id).map(|m| m.highlighted)
    }

    #[must_use]
    pub fn last_revision(&self) -> Option<u64> {
        self.last_revision
    }

    #[must_use]
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    #[must_use]
    pub fn stats(&self) -> &ReconcileStats {
        &self.stats
    }

    /// Remove every marker and drop the surface.
    pub fn teardown(&mut self) -> Option<S> {
        let mut surface = self.surface.take()?;
        for (_, marker) in self.known.drain() {
            surface.remove_marker(marker.handle);
            self.stats.markers_removed += 1;
        }
        Some(surface)
    }

    fn replace_all(&mut self, lots: &[Lot], recenter: bool) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        for (_, marker) in self.known.drain() {
            surface.remove_marker(marker.handle);
            self.stats.markers_removed += 1;
        }

        for lot in lots {
            if self.known.contains_key(&lot.id) {
                continue;
            }
            let spec = MarkerSpec::for_lot(lot, &self.view.markers);
            let handle = surface.add_marker(&spec);
            self.known.insert(
                lot.id.clone(),
                Marker {
                    handle,
                    position: spec.position,
                    highlighted: false,
                },
            );
            self.stats.markers_added += 1;
        }

        if recenter {
            if let Some(first) = lots.first() {
                surface.pan_to(LatLng::from(first));
            }
        }

        self.stats.applied += 1;
        tracing::debug!(lot_count = lots.len(), markers = self.known.len(), "markers reconciled");
    }
}

impl<S: MapSurface> Default for MarkerReconciler<S> {
    fn default() -> Self {
        Self::new(MapViewConfig::default())
    }
}

/// One call recorded by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Add(MarkerHandle, LotId),
    Remove(MarkerHandle),
    Style(MarkerHandle, String),
    PanTo(LatLng),
    SetView(LatLng, u8),
}

#[derive(Debug, Clone)]
struct DrawnMarker {
    spec: MarkerSpec,
    style: MarkerStyle,
}

/// In-memory [`MapSurface`] that records every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    next_handle: u64,
    markers: HashMap<MarkerHandle, DrawnMarker>,
    center: Option<LatLng>,
    zoom: Option<u8>,
    ops: Vec<SurfaceOp>,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of markers currently drawn.
    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Lot ids of drawn markers, sorted.
    #[must_use]
    pub fn drawn_ids(&self) -> Vec<LotId> {
        let mut ids: Vec<LotId> = self.markers.values().map(|m| m.spec.lot_id.clone()).collect();
        ids.sort();
        ids
    }

    /// Current colour of the marker drawn for `id`.
    #[must_use]
    pub fn color_of(&self, id: &LotId) -> Option<&str> {
        self.markers
            .values()
            .find(|m| &m.spec.lot_id == id)
            .map(|m| m.style.color.as_str())
    }

    /// Popup markup of the marker drawn for `id`.
    #[must_use]
    pub fn popup_of(&self, id: &LotId) -> Option<&str> {
        self.markers
            .values()
            .find(|m| &m.spec.lot_id == id)
            .map(|m| m.spec.popup_html.as_str())
    }

    #[must_use]
    pub fn center(&self) -> Option<LatLng> {
        self.center
    }

    #[must_use]
    pub fn zoom(&self) -> Option<u8> {
        self.zoom
    }

    #[must_use]
    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
        std::mem::take(&mut self.ops)
    }
}

impl MapSurface for RecordingSurface {
    fn add_marker(&mut self, spec: &MarkerSpec) -> MarkerHandle {
        self.next_handle += 1;
        let handle = MarkerHandle(self.next_handle);
        self.markers.insert(
            handle,
            DrawnMarker {
                spec: spec.clone(),
                style: spec.style.clone(),
            },
        );
        self.ops.push(SurfaceOp::Add(handle, spec.lot_id.clone()));
        handle
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        if self.markers.remove(&handle).is_some() {
            self.ops.push(SurfaceOp::Remove(handle));
        }
    }

    fn set_marker_style(&mut self, handle: MarkerHandle, style: &MarkerStyle) {
        if let Some(marker) = self.markers.get_mut(&handle) {
            marker.style = style.clone();
            self.ops.push(SurfaceOp::Style(handle, style.color.clone()));
        }
    }

    fn pan_to(&mut self, center: LatLng) {
        self.center = Some(center);
        self.ops.push(SurfaceOp::PanTo(center));
    }

    fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.center = Some(center);
        self.zoom = Some(zoom);
        self.ops.push(SurfaceOp::SetView(center, zoom));
    }
}
