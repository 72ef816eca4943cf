#![forbid(unsafe_code)]

//! Stateful components of the UniPark client core.
//!
//! Each component owns its state exclusively and is driven through
//! `&mut self` methods. Components never hold a timer queue or a document;
//! the owner passes them in, which keeps every component testable without a
//! page.
//!
//! # Key Components
//!
//! - [`ToastQueue`] - Notifications with decay countdown and safety-net expiry
//! - [`MarkerReconciler`] - Map pins kept equal to the latest lot snapshot
//! - [`FilterController`] - Query state, debounced search, single-flight submission
//! - [`MapDrawer`] - Map drawer visibility toggle
//! - [`Pager`] - Load-more requests for the results grid
//! - [`Carousel`] - Rotating testimonial slides
//!
//! Timer payloads are component-specific types ([`ToastTimer`],
//! [`SearchDebounce`], [`CarouselTick`]). Components accept any queue whose
//! payload converts from their own type, so the page can multiplex every
//! component onto a single queue.

pub mod carousel;
pub mod drawer;
pub mod filter;
pub mod map;
pub mod pager;
pub mod toast;

pub use carousel::{Carousel, CarouselConfig, CarouselTick};
pub use drawer::{DrawerAnchors, MapDrawer};
pub use filter::{
    Completion, FILTER_ALL, FilterAnchors, FilterConfig, FilterController, QueryState,
    SearchDebounce, Submission,
};
pub use map::{
    LatLng, MapSurface, MapViewConfig, MarkerHandle, MarkerPalette, MarkerReconciler,
    MarkerSpec, MarkerStyle, RecordingSurface, ReconcileStats, SurfaceOp,
};
pub use pager::{PageRequest, Pager};
pub use toast::{
    DismissReason, Toast, ToastAction, ToastConfig, ToastId, ToastQueue, ToastStats, ToastTimer,
};
