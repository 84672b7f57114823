use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::item::Item;

const MIN_ZOOM: f64 = 0.1;
const MAX_ZOOM: f64 = 10.0;
/// The time window never collapses below this, so time↔pixel stays finite.
const MIN_WINDOW_MS: i64 = 10;

/// A named display granularity, used for snapping and header ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLevel {
    pub level: f64,
    pub name: &'static str,
    pub snap_interval_ms: i64,
}

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Discrete level table, ordered from most zoomed-out to most zoomed-in.
pub const ZOOM_LEVELS: &[ZoomLevel] = &[
    ZoomLevel { level: 0.1, name: "Years", snap_interval_ms: 365 * MS_PER_DAY },
    ZoomLevel { level: 0.2, name: "Months", snap_interval_ms: 30 * MS_PER_DAY },
    ZoomLevel { level: 0.5, name: "Weeks", snap_interval_ms: 7 * MS_PER_DAY },
    ZoomLevel { level: 1.0, name: "Days", snap_interval_ms: MS_PER_DAY },
    ZoomLevel { level: 2.0, name: "Hours", snap_interval_ms: MS_PER_HOUR },
    ZoomLevel { level: 5.0, name: "Minutes", snap_interval_ms: 15 * MS_PER_MINUTE },
    ZoomLevel { level: 10.0, name: "Seconds", snap_interval_ms: MS_PER_MINUTE },
];

/// The visible time window plus zoom/pan state.
///
/// This is the single source of truth for time↔pixel conversion. It is only
/// mutated through the explicit operations below — layout and render code
/// never touch it directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Leftmost visible instant (inclusive).
    pub start: DateTime<Utc>,
    /// Rightmost visible instant (exclusive). Always after `start`.
    pub end: DateTime<Utc>,
    /// Zoom scalar, clamped to [0.1, 10].
    pub zoom: f64,
    pub pan_x: f32,
    pub pan_y: f32,
    /// Pixel size of the drawing surface the window maps onto.
    pub container_w: f32,
    pub container_h: f32,
    /// Optional symmetric pan clamp (x, y); unbounded when absent.
    #[serde(default)]
    pub pan_limit: Option<(f32, f32)>,
}

impl Default for Viewport {
    fn default() -> Self {
        let now = Utc::now();
        Self::new(now - Duration::days(7), now + Duration::days(7))
    }
}

impl Viewport {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let mut vp = Self {
            start,
            end,
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            container_w: 800.0,
            container_h: 600.0,
            pan_limit: None,
        };
        vp.normalize_window();
        vp
    }

    pub fn set_container_size(&mut self, width: f32, height: f32) {
        self.container_w = width.max(1.0);
        self.container_h = height.max(1.0);
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    fn duration_ms(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64
    }

    /// Milliseconds represented by one horizontal pixel.
    pub fn ms_per_pixel(&self) -> f64 {
        self.duration_ms() / self.container_w as f64
    }

    /// Convert an instant to an x-pixel offset from the window start.
    pub fn time_to_pixel(&self, t: DateTime<Utc>) -> f32 {
        let offset_ms = (t - self.start).num_milliseconds() as f64;
        (offset_ms / self.ms_per_pixel()) as f32
    }

    /// Convert an x-pixel offset back to an instant.
    pub fn pixel_to_time(&self, x: f32) -> DateTime<Utc> {
        let offset_ms = (x as f64 * self.ms_per_pixel()).round() as i64;
        self.start + Duration::milliseconds(offset_ms)
    }

    /// Fraction of the window [0, 1] at which `t` sits. Used by layout for
    /// cross-axis (vertical/radial) mappings.
    pub fn time_fraction(&self, t: DateTime<Utc>) -> f32 {
        let offset_ms = (t - self.start).num_milliseconds() as f64;
        (offset_ms / self.duration_ms()) as f32
    }

    /// True when [start, end] intersects the visible window.
    pub fn intersects(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start <= self.end && end >= self.start
    }

    // --- Zoom ---

    /// Multiply the zoom scalar by `factor`, preserving the instant under
    /// `anchor_px` (viewport center when `None`). Out-of-range requests
    /// saturate against the [0.1, 10] clamp.
    pub fn zoom_by(&mut self, factor: f64, anchor_px: Option<f32>) {
        let clamped = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let effective = clamped / self.zoom;
        if (effective - 1.0).abs() < 1e-9 {
            return;
        }
        let anchor_px = anchor_px.unwrap_or(self.container_w / 2.0);
        let anchor_t = self.pixel_to_time(anchor_px);
        let anchor_frac = (anchor_px / self.container_w) as f64;

        let new_duration_ms = (self.duration_ms() / effective).max(MIN_WINDOW_MS as f64);
        let lead_ms = (new_duration_ms * anchor_frac).round() as i64;
        self.start = anchor_t - Duration::milliseconds(lead_ms);
        self.end = self.start + Duration::milliseconds(new_duration_ms.round() as i64);
        self.zoom = clamped;
        self.normalize_window();
    }

    /// Jump straight to an absolute zoom level.
    pub fn zoom_to(&mut self, level: f64) {
        if self.zoom > 0.0 {
            self.zoom_by(level / self.zoom, None);
        }
    }

    /// Fit the union time-span of `items` with proportional padding on each
    /// side (default callers pass 0.1). No-op when `items` is empty.
    pub fn zoom_to_fit<'a>(&mut self, items: impl IntoIterator<Item = &'a Item>, padding: f64) {
        let mut span: Option<(DateTime<Utc>, DateTime<Utc>)> = None;
        for item in items {
            let end = item.effective_end();
            span = Some(match span {
                None => (item.start, end),
                Some((lo, hi)) => (lo.min(item.start), hi.max(end)),
            });
        }
        let Some((lo, hi)) = span else { return };
        self.fit_span(lo, hi, padding);
    }

    /// Center the window on a single item with proportional padding.
    pub fn zoom_to_item(&mut self, item: &Item, padding: f64) {
        self.fit_span(item.start, item.effective_end(), padding);
    }

    fn fit_span(&mut self, lo: DateTime<Utc>, hi: DateTime<Utc>, padding: f64) {
        let span_ms = ((hi - lo).num_milliseconds() as f64).max(MS_PER_MINUTE as f64);
        let pad = Duration::milliseconds((span_ms * padding).round() as i64);
        self.start = lo - pad;
        self.end = hi + pad;
        self.zoom = 1.0;
        self.pan_x = 0.0;
        self.pan_y = 0.0;
        self.normalize_window();
    }

    // --- Pan ---

    /// Shift the screen-space pan offset. Clamped iff a pan limit is set.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan_to(self.pan_x + dx, self.pan_y + dy);
    }

    pub fn pan_to(&mut self, x: f32, y: f32) {
        match self.pan_limit {
            Some((lx, ly)) => {
                self.pan_x = x.clamp(-lx, lx);
                self.pan_y = y.clamp(-ly, ly);
            }
            None => {
                self.pan_x = x;
                self.pan_y = y;
            }
        }
    }

    /// Shift the time window itself by a horizontal pixel delta (wheel
    /// scroll). Positive `dx_px` moves the window forward in time.
    pub fn scroll_time_by(&mut self, dx_px: f32) {
        let delta = Duration::milliseconds((dx_px as f64 * self.ms_per_pixel()).round() as i64);
        self.start += delta;
        self.end += delta;
    }

    /// Center the window on an instant without changing its duration.
    pub fn pan_to_time(&mut self, t: DateTime<Utc>) {
        let half = Duration::milliseconds((self.duration_ms() / 2.0).round() as i64);
        self.start = t - half;
        self.end = t + half;
        self.normalize_window();
    }

    pub fn reset(&mut self) {
        *self = Viewport {
            container_w: self.container_w,
            container_h: self.container_h,
            pan_limit: self.pan_limit,
            ..Viewport::default()
        };
    }

    // --- Named levels & snapping ---

    /// The discrete level whose threshold the current zoom scalar falls under.
    pub fn current_level(&self) -> ZoomLevel {
        for level in ZOOM_LEVELS {
            if self.zoom <= level.level {
                return *level;
            }
        }
        ZOOM_LEVELS[ZOOM_LEVELS.len() - 1]
    }

    /// Round an instant to the nearest boundary appropriate to the current
    /// zoom (nearest hour when zoomed to hour granularity, and so on).
    pub fn snap_to_nice_time(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        let interval = self.current_level().snap_interval_ms;
        let ms = t.timestamp_millis();
        let snapped = (ms as f64 / interval as f64).round() as i64 * interval;
        Utc.timestamp_millis_opt(snapped).single().unwrap_or(t)
    }

    fn normalize_window(&mut self) {
        if self.end <= self.start {
            self.end = self.start + Duration::milliseconds(MIN_WINDOW_MS);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn vp_january() -> Viewport {
        let mut vp = Viewport::new(day(1), day(31));
        vp.set_container_size(1000.0, 600.0);
        vp
    }

    #[test]
    fn pixel_round_trip_is_stable() {
        let vp = vp_january();
        for d in [1, 5, 14, 30] {
            let t = day(d);
            let back = vp.pixel_to_time(vp.time_to_pixel(t));
            let err_ms = (back - t).num_milliseconds().abs() as f64;
            // One pixel of slack: conversion rounds to whole milliseconds.
            assert!(err_ms <= vp.ms_per_pixel() + 1.0, "drift {err_ms}ms at day {d}");
        }
    }

    #[test]
    fn zoom_preserves_anchor_instant() {
        let mut vp = vp_january();
        let anchor_px = 250.0;
        let before = vp.pixel_to_time(anchor_px);
        vp.zoom_by(2.0, Some(anchor_px));
        let after = vp.pixel_to_time(anchor_px);
        let err_ms = (after - before).num_milliseconds().abs() as f64;
        assert!(err_ms <= vp.ms_per_pixel() + 1.0, "anchor drifted {err_ms}ms");
        assert_eq!(vp.zoom, 2.0);
    }

    #[test]
    fn zoom_saturates_at_clamp() {
        let mut vp = vp_january();
        vp.zoom_by(1000.0, None);
        assert_eq!(vp.zoom, 10.0);
        vp.zoom_by(1e-6, None);
        assert_eq!(vp.zoom, 0.1);
    }

    #[test]
    fn zoom_to_fit_empty_is_noop() {
        let mut vp = vp_january();
        let before = vp.clone();
        vp.zoom_to_fit(std::iter::empty::<&Item>(), 0.1);
        assert_eq!(vp, before);
    }

    #[test]
    fn zoom_to_fit_pads_the_item_span() {
        // Item spanning Jan 10..Jan 15 with 10% padding: 5 days * 1.2
        // centered on the span, i.e. Jan 9 12:00 .. Jan 15 12:00.
        let mut vp = vp_january();
        let item = Item::new("span", day(10), day(15));
        vp.zoom_to_fit(std::iter::once(&item), 0.1);
        assert_eq!(vp.start, Utc.with_ymd_and_hms(2024, 1, 9, 12, 0, 0).unwrap());
        assert_eq!(vp.end, Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap());
        assert_eq!(vp.zoom, 1.0);
        assert_eq!((vp.pan_x, vp.pan_y), (0.0, 0.0));
    }

    #[test]
    fn window_never_collapses() {
        let mut vp = vp_january();
        let item = Item::new_instant("blip", day(10));
        vp.zoom_to_item(&item, 0.0);
        assert!(vp.end > vp.start);
    }

    #[test]
    fn pan_is_clamped_only_with_a_limit() {
        let mut vp = vp_january();
        vp.pan_by(5000.0, -5000.0);
        assert_eq!((vp.pan_x, vp.pan_y), (5000.0, -5000.0));

        vp.pan_limit = Some((100.0, 50.0));
        vp.pan_to(5000.0, -5000.0);
        assert_eq!((vp.pan_x, vp.pan_y), (100.0, -50.0));
    }

    #[test]
    fn pan_to_time_centers_without_resizing() {
        let mut vp = vp_january();
        let duration = vp.duration();
        vp.pan_to_time(day(20));
        assert_eq!(vp.duration(), duration);
        assert_eq!(vp.start + duration / 2, day(20));
    }

    #[test]
    fn scroll_shifts_the_window_not_the_pan() {
        let mut vp = vp_january();
        let before_pan = (vp.pan_x, vp.pan_y);
        vp.scroll_time_by(100.0);
        // 100 px over a 30-day / 1000 px window = 3 days.
        assert_eq!(vp.start, day(4));
        assert_eq!((vp.pan_x, vp.pan_y), before_pan);
    }

    #[test]
    fn snap_rounds_to_level_boundary() {
        let mut vp = vp_january();
        vp.zoom = 2.0; // "Hours"
        let t = Utc.with_ymd_and_hms(2024, 1, 10, 14, 40, 12).unwrap();
        assert_eq!(
            vp.snap_to_nice_time(t),
            Utc.with_ymd_and_hms(2024, 1, 10, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn level_table_is_selected_by_zoom() {
        let mut vp = vp_january();
        vp.zoom = 0.15;
        assert_eq!(vp.current_level().name, "Months");
        vp.zoom = 1.0;
        assert_eq!(vp.current_level().name, "Days");
        vp.zoom = 10.0;
        assert_eq!(vp.current_level().name, "Seconds");
    }
}
