#![forbid(unsafe_code)]

//! Rotating testimonial carousel.
//!
//! Slides are the elements carrying `data-testimonial`, in document order.
//! A repeating timer advances the active slide; the active slide carries
//! `opacity-100` and every other slide `opacity-30`.

use core::time::Duration;

use unipark_core::{Document, TimerId, TimerQueue};

const SLIDE_ATTR: &str = "data-testimonial";
const ACTIVE_CLASS: &str = "opacity-100";
const DIMMED_CLASS: &str = "opacity-30";

/// Timer payload for carousel rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarouselTick;

#[derive(Debug, Clone)]
pub struct CarouselConfig {
    pub interval: Duration,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(5000),
        }
    }
}

#[derive(Debug, Default)]
pub struct Carousel {
    config: CarouselConfig,
    index: usize,
    len: usize,
    timer: Option<TimerId>,
}

impl Carousel {
    #[must_use]
    pub fn new(config: CarouselConfig) -> Self {
        Self {
            config,
            index: 0,
            len: 0,
            timer: None,
        }
    }

    /// Count the slides and paint the first one active.
    pub fn init(&mut self, doc: &mut Document) -> usize {
        self.len = doc.with_attr(SLIDE_ATTR).count();
        self.index = 0;
        if self.len > 0 {
            self.paint(doc);
        }
        self.len
    }

    /// Start rotating. No-op without slides or when already running.
    pub fn start<T>(&mut self, timers: &mut TimerQueue<T>) -> bool
    where
        T: Clone + From<CarouselTick>,
    {
        if self.len == 0 || self.timer.is_some() {
            return false;
        }
        self.timer = Some(timers.schedule_every(self.config.interval, CarouselTick.into()));
        true
    }

    pub fn stop<T: Clone>(&mut self, timers: &mut TimerQueue<T>) -> bool {
        match self.timer.take() {
            Some(id) => timers.cancel(id),
            None => false,
        }
    }

    /// Advance to the next slide, wrapping after the last.
    pub fn on_tick(&mut self, doc: &mut Document) {
        if self.len == 0 {
            return;
        }
        self.index = (self.index + 1) % self.len;
        self.paint(doc);
    }

    /// Jump to slide `index`. Out-of-range indices are ignored.
    pub fn go_to(&mut self, doc: &mut Document, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.index = index;
        self.paint(doc);
        true
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    fn paint(&self, doc: &mut Document) {
        for (idx, slide) in doc.with_attr_mut(SLIDE_ATTR).enumerate() {
            let active = idx == self.index;
            slide.toggle_class(ACTIVE_CLASS, active);
            slide.toggle_class(DIMMED_CLASS, !active);
        }
    }
}
