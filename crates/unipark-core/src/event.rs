#![forbid(unsafe_code)]

//! Typed payloads carried between components.
//!
//! Each inbound event kind has its own type, and the runtime gives each its
//! own channel, so payload shape is checked by the compiler rather than by
//! ad hoc parsing at the receiving end. Types that arrive as JSON from the
//! server (toast headers, lot data) derive `Deserialize` and tolerate the
//! extra fields the server sends.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;

/// Opaque lot key.
///
/// The server emits numeric ids; embedded data sometimes carries strings.
/// Both deserialize to the same key so `101` and `"101"` name one lot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LotId(String);

impl LotId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LotId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for LotId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for LotId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for LotId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Self(n.to_string()),
            Raw::Text(s) => Self(s),
        })
    }
}

/// A parking lot as supplied by the server.
///
/// The title is read from `title`, falling back to `name` when `title` is
/// missing or blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawLot")]
pub struct Lot {
    pub id: LotId,
    pub title: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize)]
struct RawLot {
    id: LotId,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: String,
    latitude: f64,
    longitude: f64,
}

impl From<RawLot> for Lot {
    fn from(raw: RawLot) -> Self {
        let title = raw
            .title
            .filter(|t| !t.trim().is_empty())
            .or(raw.name)
            .unwrap_or_default();
        Self {
            id: raw.id,
            title,
            address: raw.address,
            latitude: raw.latitude,
            longitude: raw.longitude,
        }
    }
}

impl Lot {
    #[must_use]
    pub fn new(id: impl Into<LotId>, title: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            address: String::new(),
            latitude,
            longitude,
        }
    }

    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Title for display; unnamed lots read "Parking lot".
    #[must_use]
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Parking lot"
        } else {
            &self.title
        }
    }

    /// Parse a JSON array of lots (embedded page data).
    pub fn parse_list(json: &str) -> Result<Vec<Self>> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Visual variant of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    #[default]
    Success,
    Error,
    Info,
    Warning,
}

impl ToastVariant {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            _ => None,
        }
    }
}

/// Request to show a toast. Every field is optional; the queue fills defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToastRequest {
    pub title: Option<String>,
    pub message: Option<String>,
    pub variant: Option<String>,
}

impl ToastRequest {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn variant(mut self, variant: ToastVariant) -> Self {
        self.variant = Some(variant.as_str().to_owned());
        self
    }

    /// Parse a toast payload (the `X-UniPark-Toast` header body).
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolved variant; unknown or missing values read as success.
    #[must_use]
    pub fn resolved_variant(&self) -> ToastVariant {
        self.variant
            .as_deref()
            .and_then(ToastVariant::parse)
            .unwrap_or_default()
    }
}

/// A complete snapshot of lots for the map.
///
/// `revision`, when present, is a monotonic counter from the producer; the
/// reconciler rejects snapshots that are not newer than the last applied one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapUpdate {
    pub lots: Vec<Lot>,
    pub revision: Option<u64>,
}

impl MapUpdate {
    #[must_use]
    pub fn new(lots: Vec<Lot>) -> Self {
        Self {
            lots,
            revision: None,
        }
    }

    #[must_use]
    pub fn revision(mut self, revision: u64) -> Self {
        self.revision = Some(revision);
        self
    }
}

/// A results card gained focus or hover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotFocus {
    pub id: LotId,
}

/// A results card lost focus or hover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotBlur {
    pub id: LotId,
}

/// Direct user interaction with the search page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// The search input's value changed.
    SearchInput(String),
    /// A filter chip was clicked; `None` for a chip without a value.
    ChipClicked(Option<String>),
    /// The live-availability button was clicked.
    LiveToggled,
    /// The clear-filters control was clicked.
    ClearFilters,
    /// The sort dropdown changed.
    SortChanged(String),
    /// The map drawer button was clicked.
    MapToggled,
    /// The load-more anchor scrolled into view.
    LoadMoreVisible,
    /// Jump the testimonial carousel to a slide.
    CarouselGoTo(usize),
    /// Pause the testimonial carousel (pointer entered).
    CarouselPause,
    /// Resume the testimonial carousel (pointer left).
    CarouselResume,
}

/// How a request round trip ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The response fragment was swapped into the page.
    Swapped,
    /// The server answered with an error or the request failed.
    Failed,
}

/// Request lifecycle notifications from the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestEvent {
    /// A request left the page (including ones not initiated by the controller).
    Started,
    /// A request finished. `generation` is set when it answers a submission.
    Completed {
        generation: Option<u64>,
        outcome: RequestOutcome,
    },
}
