#![forbid(unsafe_code)]

//! Map drawer toggle.

use serde::{Deserialize, Serialize};
use unipark_core::Document;
use unipark_core::document::BODY_ID;

const OPEN_CLASS: &str = "map-open";

/// Element ids the drawer binds to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawerAnchors {
    pub button: String,
    pub drawer: String,
    pub body: String,
}

impl Default for DrawerAnchors {
    fn default() -> Self {
        Self {
            button: "toggle-map".to_owned(),
            drawer: "map-drawer".to_owned(),
            body: BODY_ID.to_owned(),
        }
    }
}

/// Shows and hides the map drawer.
///
/// The button's `aria-pressed` is the source of truth, so a page rendered
/// with the drawer already open toggles closed on the first click.
#[derive(Debug, Default)]
pub struct MapDrawer {
    anchors: DrawerAnchors,
    toggles: u64,
}

impl MapDrawer {
    #[must_use]
    pub fn new(anchors: DrawerAnchors) -> Self {
        Self {
            anchors,
            toggles: 0,
        }
    }

    /// Whether both the button and the drawer exist.
    #[must_use]
    pub fn is_bound(&self, doc: &Document) -> bool {
        doc.contains(&self.anchors.button) && doc.contains(&self.anchors.drawer)
    }

    #[must_use]
    pub fn is_open(&self, doc: &Document) -> bool {
        doc.get(&self.anchors.button)
            .is_some_and(|e| e.flag("aria-pressed"))
    }

    /// Flip the drawer. Returns the new open state, or `None` when unbound.
    pub fn toggle(&mut self, doc: &mut Document) -> Option<bool> {
        if !self.is_bound(doc) {
            tracing::debug!("map drawer anchors missing, toggle ignored");
            return None;
        }
        let open = !self.is_open(doc);
        doc.update(&self.anchors.button, |e| {
            e.set_attr("aria-pressed", open.to_string());
        });
        doc.update(&self.anchors.drawer, |e| {
            e.set_hidden(!open);
            e.set_attr("aria-hidden", (!open).to_string());
        });
        doc.update(&self.anchors.body, |e| e.toggle_class(OPEN_CLASS, open));
        self.toggles += 1;
        tracing::debug!(open, "map drawer toggled");
        Some(open)
    }

    #[must_use]
    pub fn toggles(&self) -> u64 {
        self.toggles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unipark_core::Element;

    fn page() -> Document {
        Document::new()
            .with(Element::new(BODY_ID))
            .with(Element::new("toggle-map").with_attr("aria-pressed", "false"))
            .with(Element::new("map-drawer").hidden(true))
    }

    #[test]
    fn toggle_opens_then_closes() {
        let mut doc = page();
        let mut drawer = MapDrawer::default();

        assert_eq!(drawer.toggle(&mut doc), Some(true));
        let d = doc.get("map-drawer").expect("drawer");
        assert!(!d.is_hidden());
        assert_eq!(d.attr("aria-hidden"), Some("false"));
        assert!(doc.get(BODY_ID).is_some_and(|b| b.has_class("map-open")));
        assert!(drawer.is_open(&doc));

        assert_eq!(drawer.toggle(&mut doc), Some(false));
        let d = doc.get("map-drawer").expect("drawer");
        assert!(d.is_hidden());
        assert_eq!(d.attr("aria-hidden"), Some("true"));
        assert!(!doc.get(BODY_ID).is_some_and(|b| b.has_class("map-open")));
        assert_eq!(drawer.toggles(), 2);
    }

    #[test]
    fn missing_drawer_is_inert() {
        let mut doc = Document::new().with(Element::new("toggle-map"));
        let mut drawer = MapDrawer::default();
        assert_eq!(drawer.toggle(&mut doc), None);
        assert_eq!(doc.get("toggle-map").and_then(|e| e.attr("aria-pressed")), None);
    }
}
