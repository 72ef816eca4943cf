#![forbid(unsafe_code)]

//! Load-more pagination for the results grid.
//!
//! The grid advertises its next page through `data-next-url`. When the
//! load-more anchor scrolls into view the pager emits a [`PageRequest`] for
//! that URL, at most once per URL until [`Pager::reset`] is called after a
//! fresh search replaces the results.

use unipark_core::Document;

const NEXT_URL_ATTR: &str = "data-next-url";

/// Request for the next page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub url: String,
}

#[derive(Debug)]
pub struct Pager {
    grid: String,
    last_requested: Option<String>,
    requests: Vec<PageRequest>,
}

impl Pager {
    #[must_use]
    pub fn new(grid: impl Into<String>) -> Self {
        Self {
            grid: grid.into(),
            last_requested: None,
            requests: Vec::new(),
        }
    }

    /// The load-more anchor became visible.
    ///
    /// Skipped while results are busy, when the grid has no next URL, or when
    /// that URL was already requested.
    pub fn on_anchor_visible(&mut self, doc: &Document, busy: bool) -> Option<&PageRequest> {
        if busy {
            return None;
        }
        let url = doc
            .get(&self.grid)
            .and_then(|grid| grid.attr(NEXT_URL_ATTR))
            .map(str::trim)
            .filter(|url| !url.is_empty())?;
        if self.last_requested.as_deref() == Some(url) {
            tracing::trace!(url, "next page already requested");
            return None;
        }
        tracing::debug!(url, "requesting next page");
        self.last_requested = Some(url.to_owned());
        self.requests.push(PageRequest {
            url: url.to_owned(),
        });
        self.requests.last()
    }

    /// Forget the last requested URL.
    pub fn reset(&mut self) {
        self.last_requested = None;
    }

    pub fn take_requests(&mut self) -> Vec<PageRequest> {
        std::mem::take(&mut self.requests)
    }
}

impl Default for Pager {
    fn default() -> Self {
        Self::new("results-grid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unipark_core::Element;

    fn grid(next: Option<&str>) -> Document {
        let mut el = Element::new("results-grid");
        if let Some(url) = next {
            el = el.with_attr(NEXT_URL_ATTR, url);
        }
        Document::new().with(el)
    }

    #[test]
    fn requests_next_url_once() {
        let doc = grid(Some("/find/?page=2"));
        let mut pager = Pager::default();
        assert_eq!(
            pager.on_anchor_visible(&doc, false).map(|r| r.url.clone()),
            Some("/find/?page=2".to_owned())
        );
        assert!(pager.on_anchor_visible(&doc, false).is_none());
        assert_eq!(pager.take_requests().len(), 1);
    }

    #[test]
    fn reset_allows_same_url_again() {
        let doc = grid(Some("/find/?page=2"));
        let mut pager = Pager::default();
        pager.on_anchor_visible(&doc, false);
        pager.reset();
        assert!(pager.on_anchor_visible(&doc, false).is_some());
    }

    #[test]
    fn new_url_is_requested() {
        let mut doc = grid(Some("/find/?page=2"));
        let mut pager = Pager::default();
        pager.on_anchor_visible(&doc, false);
        doc.update("results-grid", |e| e.set_attr(NEXT_URL_ATTR, "/find/?page=3"));
        assert!(pager.on_anchor_visible(&doc, false).is_some());
    }

    #[test]
    fn skipped_when_busy_or_no_url() {
        let mut pager = Pager::default();
        assert!(pager.on_anchor_visible(&grid(Some("/p2")), true).is_none());
        assert!(pager.on_anchor_visible(&grid(None), false).is_none());
        assert!(pager.on_anchor_visible(&grid(Some("  ")), false).is_none());
        assert!(pager.on_anchor_visible(&Document::new(), false).is_none());
        assert!(pager.take_requests().is_empty());
    }
}
