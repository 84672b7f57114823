use egui::Color32;

use crate::engine::layout::ItemBounds;

/// Everything a backend needs to paint one item. Bounds are final screen
/// coordinates, already pan-and-zoom transformed.
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub bounds: ItemBounds,
    pub fill: Color32,
    pub accent: Color32,
    pub label: String,
    pub progress: Option<f32>,
    pub selected: bool,
    pub hovered: bool,
    /// Zero-duration items render as a diamond marker instead of a bar.
    pub instantaneous: bool,
}

#[derive(Debug, Clone)]
pub struct DrawHeader {
    pub bounds: ItemBounds,
    pub label: String,
    pub collapsed: bool,
    pub item_count: usize,
    pub accent: Option<Color32>,
}

/// Backend-neutral draw contract. The view describes the scene through
/// these calls and never touches a painter directly, so a new backend only
/// has to implement this trait.
pub trait RenderDriver {
    fn draw_lane_background(&mut self, index: usize, bounds: ItemBounds);
    fn draw_header(&mut self, header: &DrawHeader);
    fn draw_item(&mut self, item: &DrawItem);
    /// Vertical grid line at `x` with an optional tick label.
    fn draw_time_tick(&mut self, x: f32, label: Option<&str>, major: bool);
    /// Full-height marker line, e.g. the current-time indicator.
    fn draw_marker_line(&mut self, x: f32, label: &str);
}
