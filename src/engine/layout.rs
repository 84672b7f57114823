use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Item, Viewport};

/// How items are arranged on the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutMode {
    Horizontal,
    Vertical,
    Gantt,
    Calendar,
    Spiral,
    Circular,
    Masonry,
}

impl LayoutMode {
    pub const ALL: &'static [LayoutMode] = &[
        LayoutMode::Horizontal,
        LayoutMode::Vertical,
        LayoutMode::Gantt,
        LayoutMode::Calendar,
        LayoutMode::Spiral,
        LayoutMode::Circular,
        LayoutMode::Masonry,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LayoutMode::Horizontal => "Horizontal",
            LayoutMode::Vertical => "Vertical",
            LayoutMode::Gantt => "Gantt",
            LayoutMode::Calendar => "Calendar",
            LayoutMode::Spiral => "Spiral",
            LayoutMode::Circular => "Circular",
            LayoutMode::Masonry => "Masonry",
        }
    }

    /// Modes whose cross axis is the row axis, i.e. the ones the vertical
    /// virtualization window applies to.
    pub fn is_row_based(&self) -> bool {
        matches!(
            self,
            LayoutMode::Horizontal | LayoutMode::Gantt | LayoutMode::Calendar
        )
    }
}

/// Derived screen bounds for one item. Never persisted — recomputed whenever
/// viewport, item set, or mode changes, and safe to discard at any time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ItemBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ItemBounds {
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

pub const LANE_HEIGHT: f32 = 44.0;
pub const LANE_GAP: f32 = 8.0;
pub const ITEM_HEIGHT: f32 = 32.0;
/// Zero-duration items still get this much extent so they stay clickable.
pub const MIN_EXTENT: f32 = 6.0;
const LANE_INSET: f32 = 4.0;
const RADIAL_DOT: f32 = 32.0;

/// Two ranges intersect iff `a.start < b.end && b.start < a.end`.
pub fn ranges_intersect(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Assign a sub-lane to every item of one group, in input order.
///
/// Greedy first-fit: each item takes the lowest sub-lane not occupied by an
/// earlier item whose time range intersects its own. Deterministic and
/// overlap-free on the cross axis, but order-dependent — reordering the
/// input changes which items land in which sub-lane, and the result is not
/// a minimal-lane packing.
pub fn assign_sub_lanes(items: &[&Item]) -> Vec<usize> {
    let mut lanes = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let mut taken: Vec<usize> = Vec::new();
        for (prev_idx, prev) in items[..idx].iter().enumerate() {
            if ranges_intersect(
                item.start,
                item.effective_end(),
                prev.start,
                prev.effective_end(),
            ) {
                taken.push(lanes[prev_idx]);
            }
        }
        let mut lane = 0;
        while taken.contains(&lane) {
            lane += 1;
        }
        lanes.push(lane);
    }
    lanes
}

/// Raw (untransformed) bounds for one item.
///
/// `peers` is the item's group in input order and must contain the item
/// itself; `group_index` is the group's explicit position (0 for ungrouped).
/// Pan and zoom are *not* applied here — callers run the result through
/// [`apply_view_transform`] so drawing and hit-testing share one transform.
pub fn compute_bounds(
    item: &Item,
    peers: &[&Item],
    group_index: usize,
    mode: LayoutMode,
    viewport: &Viewport,
) -> ItemBounds {
    let lanes = assign_sub_lanes(peers);
    let lane = peers
        .iter()
        .position(|p| p.id == item.id)
        .map(|pos| lanes[pos])
        .unwrap_or(0);
    let lane_count = lanes.iter().max().map_or(1, |m| m + 1);
    compute_bounds_in_lane(item, lane, lane_count, group_index, mode, viewport)
}

/// Bounds for an item whose sub-lane is already known (the scene pipeline
/// assigns lanes once per group and reuses them). The group's lane is split
/// into `lane_count` equal bands so stacked peers never overlap on the
/// cross axis.
pub fn compute_bounds_in_lane(
    item: &Item,
    sub_lane: usize,
    lane_count: usize,
    group_index: usize,
    mode: LayoutMode,
    viewport: &Viewport,
) -> ItemBounds {
    let w = viewport.container_w;
    let h = viewport.container_h;
    let start = item.start;
    let end = item.effective_end();

    let group_base = (LANE_HEIGHT + LANE_GAP) * group_index as f32;
    let stride = (LANE_HEIGHT - LANE_INSET) / lane_count.max(1) as f32;
    let lane_offset = sub_lane as f32 * stride;
    let band = (stride - 2.0).max(1.0);

    match mode {
        LayoutMode::Horizontal | LayoutMode::Gantt | LayoutMode::Calendar => {
            let x = viewport.time_to_pixel(start);
            let width = (viewport.time_to_pixel(end) - x).max(MIN_EXTENT);
            let cap = if mode == LayoutMode::Calendar { 20.0 } else { ITEM_HEIGHT };
            ItemBounds {
                x,
                y: group_base + lane_offset,
                width,
                height: cap.min(band),
            }
        }
        LayoutMode::Vertical => {
            let y = viewport.time_fraction(start) * h;
            let height = (viewport.time_fraction(end) * h - y).max(MIN_EXTENT);
            ItemBounds {
                x: group_base + lane_offset,
                y,
                width: ITEM_HEIGHT.min(band),
                height,
            }
        }
        LayoutMode::Spiral | LayoutMode::Circular => {
            let radius_div = if mode == LayoutMode::Spiral { 4.0 } else { 3.0 };
            let radius = w.min(h) / radius_div;
            let angle = viewport.time_fraction(start) * std::f32::consts::TAU;
            ItemBounds {
                x: w / 2.0 + angle.cos() * radius - RADIAL_DOT / 2.0,
                y: h / 2.0 + angle.sin() * radius - RADIAL_DOT / 2.0,
                width: RADIAL_DOT,
                height: RADIAL_DOT,
            }
        }
        LayoutMode::Masonry => {
            let y = viewport.time_fraction(start) * h;
            let height = (viewport.time_fraction(end) * h - y).max(MIN_EXTENT);
            ItemBounds {
                x: 0.0,
                y,
                width: w,
                height,
            }
        }
    }
}

/// The one shared view transform: translate by the pan offset, then scale by
/// the zoom factor. Drawing and hit-testing both go through here; duplicating
/// this math elsewhere is how draw/hit-test drift happens.
pub fn apply_view_transform(bounds: ItemBounds, viewport: &Viewport) -> ItemBounds {
    let zoom = viewport.zoom as f32;
    ItemBounds {
        x: (bounds.x + viewport.pan_x) * zoom,
        y: (bounds.y + viewport.pan_y) * zoom,
        width: bounds.width * zoom,
        height: bounds.height * zoom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, h, 0, 0).unwrap()
    }

    fn viewport() -> Viewport {
        let mut vp = Viewport::new(at(0), at(20));
        vp.set_container_size(1000.0, 500.0);
        vp
    }

    #[test]
    fn identical_spans_stack_in_input_order() {
        let a = Item::new("a", at(10), at(11));
        let b = Item::new("b", at(10), at(11));
        let c = Item::new("c", at(10), at(11));
        let lanes = assign_sub_lanes(&[&a, &b, &c]);
        assert_eq!(lanes, vec![0, 1, 2]);
    }

    #[test]
    fn first_fit_reuses_a_freed_lane() {
        // a[0,10) b[5,15) c[12,20): c clears a, so lane 0 is free again.
        let a = Item::new("a", at(0), at(10));
        let b = Item::new("b", at(5), at(15));
        let c = Item::new("c", at(12), at(20));
        assert_eq!(assign_sub_lanes(&[&a, &b, &c]), vec![0, 1, 0]);
    }

    #[test]
    fn overlapping_peers_never_share_cross_axis_extent() {
        let vp = viewport();
        let items: Vec<Item> = (0..4)
            .map(|i| Item::new(format!("i{i}"), at(2), at(9)))
            .collect();
        let refs: Vec<&Item> = items.iter().collect();
        let bounds: Vec<ItemBounds> = refs
            .iter()
            .map(|item| compute_bounds(item, &refs, 0, LayoutMode::Horizontal, &vp))
            .collect();
        for i in 0..bounds.len() {
            for j in (i + 1)..bounds.len() {
                let (a, b) = (&bounds[i], &bounds[j]);
                let disjoint = a.y + a.height <= b.y || b.y + b.height <= a.y;
                assert!(disjoint, "bounds {i} and {j} overlap vertically");
            }
        }
    }

    #[test]
    fn primary_axis_is_an_affine_time_map() {
        let vp = viewport();
        let item = Item::new("x", at(5), at(10));
        let b = compute_bounds(&item, &[&item], 0, LayoutMode::Gantt, &vp);
        assert_eq!(b.x, vp.time_to_pixel(at(5)));
        assert_eq!(b.x + b.width, vp.time_to_pixel(at(10)));
    }

    #[test]
    fn zero_duration_items_get_minimum_extent() {
        let vp = viewport();
        let item = Item::new_instant("blip", at(5));
        let b = compute_bounds(&item, &[&item], 0, LayoutMode::Horizontal, &vp);
        assert!(b.width >= MIN_EXTENT);
        assert!(b.height >= MIN_EXTENT);
    }

    #[test]
    fn group_index_sets_the_lane_base() {
        let vp = viewport();
        let item = Item::new("x", at(5), at(10));
        let b0 = compute_bounds(&item, &[&item], 0, LayoutMode::Horizontal, &vp);
        let b2 = compute_bounds(&item, &[&item], 2, LayoutMode::Horizontal, &vp);
        assert_eq!(b2.y - b0.y, 2.0 * (LANE_HEIGHT + LANE_GAP));
    }

    #[test]
    fn radial_bounds_lie_on_the_circle() {
        let vp = viewport();
        // Start at 1/4 of the window: angle = PI/2, i.e. bottom of circle.
        let item = Item::new("q", at(5), at(6));
        let b = compute_bounds(&item, &[&item], 0, LayoutMode::Circular, &vp);
        let radius = vp.container_w.min(vp.container_h) / 3.0;
        let cx = b.x + RADIAL_DOT / 2.0 - vp.container_w / 2.0;
        let cy = b.y + RADIAL_DOT / 2.0 - vp.container_h / 2.0;
        let dist = (cx * cx + cy * cy).sqrt();
        assert!((dist - radius).abs() < 0.5, "off-circle by {}", dist - radius);
    }

    #[test]
    fn draw_and_hit_test_share_the_transform() {
        let mut vp = viewport();
        vp.pan_by(40.0, -10.0);
        vp.zoom_by(2.0, None);
        let item = Item::new("x", at(5), at(10));
        let raw = compute_bounds(&item, &[&item], 0, LayoutMode::Horizontal, &vp);
        let drawn = apply_view_transform(raw, &vp);
        // A point inside the drawn rect must hit, one outside must not.
        assert!(drawn.contains(drawn.x + 1.0, drawn.y + 1.0));
        assert!(!drawn.contains(drawn.x - 2.0, drawn.y));
    }

    #[test]
    fn masonry_spans_the_full_cross_axis() {
        let vp = viewport();
        let item = Item::new("wide", at(2), at(4));
        let b = compute_bounds(&item, &[&item], 0, LayoutMode::Masonry, &vp);
        assert_eq!(b.x, 0.0);
        assert_eq!(b.width, vp.container_w);
    }
}
