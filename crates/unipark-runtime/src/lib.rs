#![forbid(unsafe_code)]

//! UniPark Runtime
//!
//! Wires the client-core components into a page.
//!
//! # Key Components
//!
//! - [`Page`] - Context object owning the clock, timers, document and components
//! - [`EventBus`] / [`BusHandle`] - Typed channels, one per event kind
//! - [`PageConfig`] - TOML/JSON configuration with defaults for every tunable
//! - [`logging`] - `tracing-subscriber` bootstrap for hosts
//!
//! # Event flow
//!
//! Producers send typed messages through a [`BusHandle`]. The page drains
//! the bus in [`Page::pump`], routes each message to the owning component and
//! fires the component timers that came due on its clock.

pub mod bus;
pub mod config;
pub mod logging;
pub mod page;

pub use bus::{BusHandle, BusMessage, EventBus};
pub use config::{AnchorSection, ConfigError, PageConfig};
pub use logging::LogFormat;
pub use page::{
    Lifecycle, MAP_UPDATE_EVENT, Page, PageTimer, TOAST_HEADER, TRIGGER_HEADER,
};
