#![forbid(unsafe_code)]

//! Page configuration.
//!
//! Every tunable of the client core lives in one [`PageConfig`] that can be
//! loaded from TOML or JSON. Sections and fields are all optional; missing
//! values take the defaults the components use on their own.
//!
//! ```toml
//! [toast]
//! lifetime_ms = 5000
//!
//! [search]
//! debounce_ms = 250
//!
//! [map]
//! center = [33.8938, 35.5018]
//! zoom = 13
//! ```

use core::time::Duration;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use unipark_widgets::{
    CarouselConfig, DrawerAnchors, FilterAnchors, FilterConfig, MapViewConfig, ToastConfig,
};

/// Errors that can occur when loading a page configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

/// Top-level configuration for a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub toast: ToastSection,
    pub search: SearchSection,
    pub map: MapViewConfig,
    pub carousel: CarouselSection,
    pub anchors: AnchorSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToastSection {
    pub lifetime_ms: u64,
    pub decay_tick_ms: u64,
    pub decay_step: u8,
    pub default_title: String,
}

impl Default for ToastSection {
    fn default() -> Self {
        Self {
            lifetime_ms: 4200,
            decay_tick_ms: 90,
            decay_step: 2,
            default_title: "Success".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub debounce_ms: u64,
    pub default_filter: String,
    pub default_sort: String,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            debounce_ms: 350,
            default_filter: unipark_widgets::FILTER_ALL.to_owned(),
            default_sort: "closest".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselSection {
    pub interval_ms: u64,
}

impl Default for CarouselSection {
    fn default() -> Self {
        Self { interval_ms: 5000 }
    }
}

/// Element ids of the page anchors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorSection {
    pub filters_form: String,
    pub search: String,
    pub live_button: String,
    pub clear_filters: String,
    pub toggle_map: String,
    pub map_drawer: String,
    pub body: String,
    pub results_pane: String,
    pub results_grid: String,
    pub load_more: String,
    pub selected_filter: String,
    pub selected_sort: String,
    pub selected_live: String,
    pub parking_map: String,
}

impl Default for AnchorSection {
    fn default() -> Self {
        let filter = FilterAnchors::default();
        let drawer = DrawerAnchors::default();
        Self {
            filters_form: filter.form,
            search: filter.search,
            live_button: filter.live_button,
            clear_filters: filter.clear_button,
            toggle_map: drawer.button,
            map_drawer: drawer.drawer,
            body: drawer.body,
            results_pane: filter.results_pane,
            results_grid: filter.results_grid,
            load_more: "load-more-anchor".to_owned(),
            selected_filter: filter.filter_field,
            selected_sort: filter.sort_field,
            selected_live: filter.live_field,
            parking_map: "parking-map".to_owned(),
        }
    }
}

impl AnchorSection {
    #[must_use]
    pub fn filter_anchors(&self) -> FilterAnchors {
        FilterAnchors {
            form: self.filters_form.clone(),
            search: self.search.clone(),
            live_button: self.live_button.clone(),
            clear_button: self.clear_filters.clone(),
            results_pane: self.results_pane.clone(),
            results_grid: self.results_grid.clone(),
            filter_field: self.selected_filter.clone(),
            sort_field: self.selected_sort.clone(),
            live_field: self.selected_live.clone(),
        }
    }

    #[must_use]
    pub fn drawer_anchors(&self) -> DrawerAnchors {
        DrawerAnchors {
            button: self.toggle_map.clone(),
            drawer: self.map_drawer.clone(),
            body: self.body.clone(),
        }
    }
}

impl PageConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Load from a file, choosing the format by extension (`.json` or TOML),
    /// and reject invalid values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_file(path)?,
            _ => Self::from_toml_file(path)?,
        };
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Check values are within acceptable ranges. An empty list means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.toast.lifetime_ms == 0 {
            errors.push("toast.lifetime_ms must be > 0".to_owned());
        }
        if self.toast.decay_tick_ms == 0 {
            errors.push("toast.decay_tick_ms must be > 0".to_owned());
        }
        if self.toast.decay_step == 0 || self.toast.decay_step > 100 {
            errors.push(format!(
                "toast.decay_step must be in 1..=100, got {}",
                self.toast.decay_step
            ));
        }
        if self.carousel.interval_ms == 0 {
            errors.push("carousel.interval_ms must be > 0".to_owned());
        }
        if self.map.zoom > self.map.max_zoom {
            errors.push(format!(
                "map.zoom ({}) exceeds map.max_zoom ({})",
                self.map.zoom, self.map.max_zoom
            ));
        }
        if !(-90.0..=90.0).contains(&self.map.center.lat)
            || !(-180.0..=180.0).contains(&self.map.center.lng)
        {
            errors.push("map.center is not a valid coordinate".to_owned());
        }
        if self.search.default_filter.trim().is_empty() {
            errors.push("search.default_filter must not be empty".to_owned());
        }
        errors
    }

    #[must_use]
    pub fn toast_config(&self) -> ToastConfig {
        ToastConfig::new()
            .lifetime(Duration::from_millis(self.toast.lifetime_ms))
            .decay_tick(Duration::from_millis(self.toast.decay_tick_ms))
            .decay_step(self.toast.decay_step)
            .default_title(self.toast.default_title.clone())
    }

    #[must_use]
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            debounce: Duration::from_millis(self.search.debounce_ms),
            default_filter: self.search.default_filter.clone(),
            default_sort: self.search.default_sort.clone(),
        }
    }

    #[must_use]
    pub fn carousel_config(&self) -> CarouselConfig {
        CarouselConfig {
            interval: Duration::from_millis(self.carousel.interval_ms),
        }
    }
}
