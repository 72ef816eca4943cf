#![forbid(unsafe_code)]

//! In-memory model of the page anchors the client core touches.
//!
//! The core never renders markup. It toggles classes, writes attributes and
//! flips `hidden` on a handful of elements (results regions, chips, buttons,
//! the map drawer). [`Document`] holds exactly that state so components can
//! be exercised headlessly and tests can query the outcome with the same
//! vocabulary a browser test would use (`has_class`, `attr`).
//!
//! Elements are kept in insertion order, which stands in for document order
//! when a component queries a group (chips, slides).

use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Id of the element standing in for `<body>`.
pub const BODY_ID: &str = "body";

/// A single element: classes, attributes, visibility and form value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    id: String,
    classes: BTreeSet<String>,
    attrs: BTreeMap<String, String>,
    hidden: bool,
    value: String,
}

impl Element {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.insert(class.into());
        self
    }

    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    #[must_use]
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    /// Add or remove `class`, like `classList.toggle(class, on)`.
    pub fn toggle_class(&mut self, class: &str, on: bool) {
        if on {
            if !self.classes.contains(class) {
                self.classes.insert(class.to_owned());
            }
        } else {
            self.classes.remove(class);
        }
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        self.attrs.insert(name.to_owned(), value.into());
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attrs.remove(name)
    }

    /// Reads a boolean ARIA-style attribute (`"true"` is true, anything else false).
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.attr(name) == Some("true")
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }
}

/// The set of elements a page exposes to the client core.
#[derive(Debug, Clone, Default)]
pub struct Document {
    elements: Vec<Element>,
    by_id: HashMap<String, usize>,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an element, replacing any element with the same id in place.
    pub fn insert(&mut self, element: Element) {
        match self.by_id.get(element.id()) {
            Some(&idx) => self.elements[idx] = element,
            None => {
                self.by_id.insert(element.id.clone(), self.elements.len());
                self.elements.push(element);
            }
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, element: Element) -> Self {
        self.insert(element);
        self
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Element> {
        self.by_id.get(id).map(|&idx| &self.elements[idx])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Element> {
        match self.by_id.get(id) {
            Some(&idx) => Some(&mut self.elements[idx]),
            None => None,
        }
    }

    /// Run `f` on the element if it exists. Returns whether it did.
    pub fn update(&mut self, id: &str, f: impl FnOnce(&mut Element)) -> bool {
        match self.get_mut(id) {
            Some(element) => {
                f(element);
                true
            }
            None => false,
        }
    }

    /// Elements carrying attribute `name`, in document order.
    pub fn with_attr<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements.iter().filter(move |e| e.attrs.contains_key(name))
    }

    /// Mutable variant of [`with_attr`](Self::with_attr).
    pub fn with_attr_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut Element> + 'a {
        self.elements
            .iter_mut()
            .filter(move |e| e.attrs.contains_key(name))
    }

    /// Elements carrying `class`, in document order.
    pub fn with_class<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements.iter().filter(move |e| e.has_class(class))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl FromIterator<Element> for Document {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        let mut doc = Self::new();
        for element in iter {
            doc.insert(element);
        }
        doc
    }
}
