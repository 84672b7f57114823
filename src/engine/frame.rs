use std::time::{Duration, Instant};

/// Minimum spacing between renders. Redraw requests inside one budget
/// window coalesce into a single frame.
pub const FRAME_BUDGET: Duration = Duration::from_millis(16);
/// A scroll stream is considered finished after this much quiet time.
pub const SCROLL_SETTLE: Duration = Duration::from_millis(150);

/// Frame pacing state. Takes `now` explicitly so tests drive time.
pub struct FrameScheduler {
    dirty: bool,
    last_render: Option<Instant>,
    last_scroll: Option<Instant>,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            dirty: false,
            last_render: None,
            last_scroll: None,
        }
    }

    /// Mark state as changed. Any number of marks before the next render
    /// collapse into one frame.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn note_scroll(&mut self, now: Instant) {
        self.last_scroll = Some(now);
        self.dirty = true;
    }

    /// True while scroll events arrived within the settle window. The view
    /// defers expensive work (snapping, preload) until this goes false.
    pub fn is_scrolling(&self, now: Instant) -> bool {
        self.last_scroll
            .is_some_and(|t| now.duration_since(t) < SCROLL_SETTLE)
    }

    /// Whether to render this tick. Consumes the dirty flag when it fires.
    pub fn should_render(&mut self, now: Instant) -> bool {
        if !self.dirty {
            return false;
        }
        let due = self
            .last_render
            .map_or(true, |t| now.duration_since(t) >= FRAME_BUDGET);
        if due {
            self.dirty = false;
            self.last_render = Some(now);
        }
        due
    }

    /// How long until the next render may run. Zero when one is due now;
    /// `None` when nothing is dirty.
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        if !self.dirty {
            return None;
        }
        Some(self.last_render.map_or(Duration::ZERO, |t| {
            FRAME_BUDGET.saturating_sub(now.duration_since(t))
        }))
    }
}
