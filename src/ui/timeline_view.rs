use chrono::{DateTime, Duration, Utc};
use egui::{Id, Pos2, Rect, Sense, Ui, Vec2};
use uuid::Uuid;

use crate::engine::layout::{
    self, ItemBounds, LayoutMode, LANE_GAP, LANE_HEIGHT, MIN_EXTENT,
};
use crate::engine::window::{self, RowKind, DEFAULT_OVERSCAN};
use crate::model::{ActionKind, Item, TimelineStore, Viewport};
use crate::render::{DrawHeader, DrawItem, EguiDriver, RenderDriver};
use crate::ui::theme;

const HANDLE_WIDTH: f32 = theme::HANDLE_WIDTH;
const MAX_TICKS: usize = 200;

/// A finished drag edit, reported so the app can push it onto the history.
#[derive(Debug, Clone)]
pub struct ItemEdit {
    pub kind: ActionKind,
    pub before: Item,
    pub after: Item,
}

/// Result details from one frame of timeline interaction.
#[derive(Debug, Clone, Default)]
pub struct TimelineInteraction {
    pub committed_edit: Option<ItemEdit>,
    pub toggled_group: Option<Uuid>,
    pub viewport_changed: bool,
    pub scrolled: bool,
    /// Scroll position reached the end of the loaded rows.
    pub reached_end: bool,
}

#[derive(Debug, Clone)]
struct DragSnapshot {
    item: Item,
    pointer_x: f32,
}

struct SceneItem {
    id: Uuid,
    bounds: ItemBounds,
    instantaneous: bool,
    /// Row index and full-width band, present in virtualized row modes.
    band: Option<(usize, ItemBounds)>,
}

struct SceneHeader {
    id: Uuid,
    bounds: ItemBounds,
}

struct Scene {
    headers: Vec<SceneHeader>,
    items: Vec<SceneItem>,
    /// Total row extent, pre-transform. Zero for non-row modes.
    content_extent: f32,
}

/// Render the timeline canvas and apply its interactions.
///
/// Bounds are computed once per frame and shared between painting and
/// hit-testing. Drag edits mutate the store live for feedback; the
/// committed before/after pair comes back in the interaction result when
/// the drag ends.
pub fn show_timeline(
    store: &mut TimelineStore,
    viewport: &mut Viewport,
    mode: LayoutMode,
    selected: &mut Option<Uuid>,
    scroll_y: &mut f32,
    ui: &mut Ui,
) -> TimelineInteraction {
    let mut interaction = TimelineInteraction::default();
    let available = ui.available_size();

    let (response, painter) = ui.allocate_painter(available, Sense::click());
    let origin = response.rect.min;
    let canvas = response.rect;

    viewport.set_container_size(canvas.width(), canvas.height() - theme::HEADER_HEIGHT);

    handle_wheel(viewport, scroll_y, &response, ui, &mut interaction);

    let scene = build_scene(store, viewport, mode, *scroll_y);
    clamp_scroll(scroll_y, &scene, viewport, &mut interaction);

    // Background and chrome first, then bars, then interactions on the same
    // rects the bars were painted with.
    painter.rect_filled(canvas, 0.0, theme::BG_DARK);
    {
        let mut driver = EguiDriver::new(&painter, origin, canvas.height());
        draw_chrome(&mut driver, &scene, viewport);
        for header in &scene.headers {
            let group = store.group(header.id);
            let Some(group) = group else { continue };
            driver.draw_header(&DrawHeader {
                bounds: header.bounds,
                label: group.title.clone(),
                collapsed: group.collapsed,
                item_count: store.items_in_group(Some(group.id)).len(),
                accent: group.color,
            });
        }
        let pointer = ui.input(|i| i.pointer.hover_pos());
        for entry in &scene.items {
            let Some(item) = store.item(entry.id) else { continue };
            let hovered = pointer
                .is_some_and(|p| entry.bounds.contains(p.x - origin.x, p.y - origin.y));
            driver.draw_item(&DrawItem {
                bounds: entry.bounds,
                fill: theme::item_fill(item),
                accent: theme::priority_accent(item.priority),
                label: item.title.clone(),
                progress: item.progress,
                selected: *selected == Some(entry.id),
                hovered,
                instantaneous: entry.instantaneous,
            });
        }
    }

    let mut consumed_click = false;

    for header in &scene.headers {
        let rect = screen_rect(origin, header.bounds);
        let resp = ui.interact(
            rect,
            ui.make_persistent_id(("group-header", header.id)),
            Sense::click(),
        );
        if resp.clicked() {
            interaction.toggled_group = Some(header.id);
            consumed_click = true;
        }
    }

    for entry in &scene.items {
        if interact_item(store, viewport, entry, origin, ui, selected, &mut interaction) {
            consumed_click = true;
        }
    }

    if response.clicked() && !consumed_click {
        *selected = None;
    }

    interaction
}

fn screen_rect(origin: Pos2, b: ItemBounds) -> Rect {
    Rect::from_min_size(
        Pos2::new(origin.x + b.x, origin.y + b.y),
        Vec2::new(b.width, b.height),
    )
}

fn handle_wheel(
    viewport: &mut Viewport,
    scroll_y: &mut f32,
    response: &egui::Response,
    ui: &Ui,
    interaction: &mut TimelineInteraction,
) {
    if !ui.rect_contains_pointer(response.rect) {
        return;
    }
    let delta = ui.input(|i| i.smooth_scroll_delta);
    let ctrl = ui.input(|i| i.modifiers.ctrl);
    let shift = ui.input(|i| i.modifiers.shift);

    if ctrl {
        if delta.y != 0.0 {
            let factor = if delta.y > 0.0 { 1.1 } else { 1.0 / 1.1 };
            let anchor = ui
                .input(|i| i.pointer.hover_pos())
                .map(|p| (p.x - response.rect.min.x) / viewport.zoom as f32 - viewport.pan_x);
            viewport.zoom_by(factor, anchor);
            interaction.viewport_changed = true;
        }
        return;
    }

    let (dx, dy) = if shift { (delta.y, 0.0) } else { (delta.x, delta.y) };
    if dx != 0.0 {
        // Wheel-right pans the window back in time, like dragging the sheet.
        viewport.scroll_time_by(-dx / viewport.zoom as f32);
        interaction.viewport_changed = true;
        interaction.scrolled = true;
    }
    if dy != 0.0 {
        *scroll_y -= dy;
        interaction.scrolled = true;
    }
}

fn clamp_scroll(
    scroll_y: &mut f32,
    scene: &Scene,
    viewport: &Viewport,
    interaction: &mut TimelineInteraction,
) {
    let visible = viewport.container_h / viewport.zoom as f32;
    let max = (scene.content_extent - visible).max(0.0);
    *scroll_y = scroll_y.clamp(0.0, max);
    if scene.content_extent > 0.0 && *scroll_y >= max - LANE_HEIGHT {
        interaction.reached_end = true;
    }
}

/// Compute the transformed bounds of everything to mount this frame.
fn build_scene(
    store: &TimelineStore,
    viewport: &Viewport,
    mode: LayoutMode,
    scroll_y: f32,
) -> Scene {
    if mode.is_row_based() && mode != LayoutMode::Horizontal {
        build_row_scene(store, viewport, mode, scroll_y)
    } else if mode == LayoutMode::Horizontal {
        build_lane_scene(store, viewport, scroll_y)
    } else {
        build_free_scene(store, viewport, mode)
    }
}

/// Gantt and calendar modes: one virtualized row per visible item, group
/// headers interleaved. Rows outside the window plus overscan are skipped
/// entirely.
fn build_row_scene(
    store: &TimelineStore,
    viewport: &Viewport,
    mode: LayoutMode,
    scroll_y: f32,
) -> Scene {
    let rows = window::flatten_rows(store);
    let offsets = window::row_offsets(&rows);
    let visible_extent = viewport.container_h / viewport.zoom as f32;
    let range =
        window::compute_visible_range(scroll_y, visible_extent, &rows, &offsets, DEFAULT_OVERSCAN);

    let mut headers = Vec::new();
    let mut items = Vec::new();
    if let Some(range) = range {
        for idx in range.start_index..range.end_index {
            let y = offsets[idx] - scroll_y;
            match rows[idx].kind {
                RowKind::GroupHeader(id) => {
                    let raw = ItemBounds {
                        x: -viewport.pan_x,
                        y,
                        width: viewport.container_w / viewport.zoom as f32,
                        height: rows[idx].extent,
                    };
                    headers.push(SceneHeader {
                        id,
                        bounds: push_below_header(layout::apply_view_transform(raw, viewport)),
                    });
                }
                RowKind::Item(id) => {
                    let Some(item) = store.item(id) else { continue };
                    let x = viewport.time_to_pixel(item.start);
                    let width =
                        (viewport.time_to_pixel(item.effective_end()) - x).max(MIN_EXTENT);
                    let cap: f32 = if mode == LayoutMode::Calendar { 20.0 } else { 32.0 };
                    let raw = ItemBounds {
                        x,
                        y: y + LANE_GAP / 2.0,
                        width,
                        height: cap.min(rows[idx].extent - LANE_GAP),
                    };
                    let band_raw = ItemBounds {
                        x: -viewport.pan_x,
                        y,
                        width: viewport.container_w / viewport.zoom as f32,
                        height: rows[idx].extent,
                    };
                    items.push(SceneItem {
                        id,
                        bounds: push_below_header(layout::apply_view_transform(raw, viewport)),
                        instantaneous: item.is_instant(),
                        band: Some((
                            idx,
                            push_below_header(layout::apply_view_transform(band_raw, viewport)),
                        )),
                    });
                }
            }
        }
    }
    Scene {
        headers,
        items,
        content_extent: window::total_extent(&rows),
    }
}

/// Horizontal mode: one lane per group, overlapping members stacked into
/// sub-lanes inside it. Ungrouped items share lane 0.
fn build_lane_scene(store: &TimelineStore, viewport: &Viewport, scroll_y: f32) -> Scene {
    let mut headers = Vec::new();
    let mut items = Vec::new();
    let mut lane = 0usize;

    let push_group = |members: Vec<&Item>, lane: usize, items: &mut Vec<SceneItem>| {
        let lanes = layout::assign_sub_lanes(&members);
        let lane_count = lanes.iter().max().map_or(1, |m| m + 1);
        for (member, sub_lane) in members.iter().zip(lanes) {
            let mut raw = layout::compute_bounds_in_lane(
                member,
                sub_lane,
                lane_count,
                lane,
                LayoutMode::Horizontal,
                viewport,
            );
            raw.y -= scroll_y;
            items.push(SceneItem {
                id: member.id,
                bounds: push_below_header(layout::apply_view_transform(raw, viewport)),
                instantaneous: member.is_instant(),
                band: None,
            });
        }
    };

    let ungrouped = store.items_in_group(None);
    if !ungrouped.is_empty() {
        push_group(ungrouped, lane, &mut items);
        lane += 1;
    }
    for group in store.groups() {
        let raw = ItemBounds {
            x: -viewport.pan_x,
            y: (LANE_HEIGHT + LANE_GAP) * lane as f32 - scroll_y - 20.0,
            width: viewport.container_w / viewport.zoom as f32,
            height: 20.0,
        };
        headers.push(SceneHeader {
            id: group.id,
            bounds: push_below_header(layout::apply_view_transform(raw, viewport)),
        });
        if !group.collapsed {
            push_group(store.items_in_group(Some(group.id)), lane, &mut items);
        }
        lane += 1;
    }

    Scene {
        headers,
        items,
        content_extent: (LANE_HEIGHT + LANE_GAP) * lane as f32,
    }
}

/// Vertical, radial, and masonry modes position every item from the time
/// fraction directly; no row virtualization applies.
fn build_free_scene(store: &TimelineStore, viewport: &Viewport, mode: LayoutMode) -> Scene {
    let items = store
        .items_in_range(viewport.start, viewport.end)
        .into_iter()
        .map(|item| {
            let group_index = item
                .group
                .and_then(|g| store.group_index(g))
                .map_or(0, |i| i + 1);
            let peers = store.items_in_group(item.group);
            let raw = layout::compute_bounds(item, &peers, group_index, mode, viewport);
            SceneItem {
                id: item.id,
                bounds: push_below_header(layout::apply_view_transform(raw, viewport)),
                instantaneous: item.is_instant(),
                band: None,
            }
        })
        .collect();
    Scene {
        headers: Vec::new(),
        items,
        content_extent: 0.0,
    }
}

fn push_below_header(mut b: ItemBounds) -> ItemBounds {
    b.y += theme::HEADER_HEIGHT;
    b
}

fn draw_chrome(driver: &mut EguiDriver, scene: &Scene, viewport: &Viewport) {
    for entry in &scene.items {
        if let Some((row, band)) = entry.band {
            driver.draw_lane_background(row, band);
        }
    }

    draw_time_ticks(driver, viewport);

    let now = Utc::now();
    if viewport.intersects(now, now) {
        let x = (viewport.time_to_pixel(now) + viewport.pan_x) * viewport.zoom as f32;
        driver.draw_marker_line(x, "Now");
    }
}

fn draw_time_ticks(driver: &mut EguiDriver, viewport: &Viewport) {
    let level = viewport.current_level();
    let interval = Duration::milliseconds(level.snap_interval_ms);
    let mut t = viewport.snap_to_nice_time(viewport.start) - interval;
    let zoom = viewport.zoom as f32;

    for n in 0..MAX_TICKS {
        if t > viewport.end + interval {
            break;
        }
        let x = (viewport.time_to_pixel(t) + viewport.pan_x) * zoom;
        if x >= 0.0 && x <= viewport.container_w {
            let major = n % 5 == 0;
            let label = tick_label(t, level.name);
            driver.draw_time_tick(x, Some(&label), major);
        }
        t += interval;
    }
}

fn tick_label(t: DateTime<Utc>, level_name: &str) -> String {
    let fmt = match level_name {
        "Years" => "%Y",
        "Months" => "%b %Y",
        "Weeks" => "W%V %b",
        "Days" => "%d %b",
        "Hours" => "%H:%M",
        "Minutes" => "%H:%M",
        _ => "%H:%M:%S",
    };
    t.format(fmt).to_string()
}

/// Returns true when the click landed on this item.
fn interact_item(
    store: &mut TimelineStore,
    viewport: &Viewport,
    entry: &SceneItem,
    origin: Pos2,
    ui: &mut Ui,
    selected: &mut Option<Uuid>,
    interaction: &mut TimelineInteraction,
) -> bool {
    let rect = screen_rect(origin, entry.bounds);
    let mut consumed = false;

    let bar = ui.interact(
        rect.expand(if entry.instantaneous { 6.0 } else { 0.0 }),
        ui.make_persistent_id(("item-bar", entry.id)),
        Sense::click_and_drag(),
    );

    let (left, right) = if entry.instantaneous {
        (None, None)
    } else {
        let left_rect = Rect::from_min_max(
            Pos2::new(rect.left() - HANDLE_WIDTH * 0.5, rect.top()),
            Pos2::new(rect.left() + HANDLE_WIDTH * 0.5, rect.bottom()),
        );
        let right_rect = Rect::from_min_max(
            Pos2::new(rect.right() - HANDLE_WIDTH * 0.5, rect.top()),
            Pos2::new(rect.right() + HANDLE_WIDTH * 0.5, rect.bottom()),
        );
        (
            Some(ui.interact(
                left_rect.expand(4.0),
                ui.make_persistent_id(("item-resize-left", entry.id)),
                Sense::drag(),
            )),
            Some(ui.interact(
                right_rect.expand(4.0),
                ui.make_persistent_id(("item-resize-right", entry.id)),
                Sense::drag(),
            )),
        )
    };

    if bar.clicked() {
        *selected = Some(entry.id);
        consumed = true;
    }
    if bar.double_clicked() {
        consumed = true;
    }

    for (resp, edge) in [(Some(&bar), "move"), (left.as_ref(), "left"), (right.as_ref(), "right")]
    {
        let Some(resp) = resp else { continue };
        if resp.drag_started() {
            let ptr_x = resp.interact_pointer_pos().map(|p| p.x).unwrap_or(0.0);
            if let Some(item) = store.item(entry.id).cloned() {
                ui.ctx().data_mut(|data| {
                    data.insert_persisted(
                        drag_id(entry.id, edge),
                        DragSnapshot {
                            item,
                            pointer_x: ptr_x,
                        },
                    );
                });
            }
            *selected = Some(entry.id);
            consumed = true;
        }
    }

    let edge = drag_edge(&bar, left.as_ref(), right.as_ref());
    if let Some((resp, edge)) = edge {
        ui.ctx().set_cursor_icon(if edge == "move" {
            egui::CursorIcon::Grab
        } else {
            egui::CursorIcon::ResizeHorizontal
        });
        let ptr_x = resp.interact_pointer_pos().map(|p| p.x).unwrap_or(0.0);
        let snapshot = ui
            .ctx()
            .data_mut(|data| data.get_persisted::<DragSnapshot>(drag_id(entry.id, edge)));
        if let (Some(snapshot), Some(item)) = (snapshot, store.item(entry.id).cloned()) {
            let mut item = item;
            apply_drag(&mut item, &snapshot, ptr_x, edge, viewport);
            let _ = store.update_item(item);
        }
    }

    for (resp, edge, kind) in [
        (Some(&bar), "move", ActionKind::Move),
        (left.as_ref(), "left", ActionKind::Resize),
        (right.as_ref(), "right", ActionKind::Resize),
    ] {
        let Some(resp) = resp else { continue };
        if resp.drag_stopped() {
            let snapshot = ui
                .ctx()
                .data_mut(|data| data.get_persisted::<DragSnapshot>(drag_id(entry.id, edge)));
            ui.ctx().data_mut(|data| {
                data.remove::<DragSnapshot>(drag_id(entry.id, edge));
            });
            if let (Some(snapshot), Some(item)) = (snapshot, store.item(entry.id).cloned()) {
                let mut item = item;
                snap_edit(&mut item, edge, viewport);
                let _ = store.update_item(item.clone());
                interaction.committed_edit = Some(ItemEdit {
                    kind,
                    before: snapshot.item,
                    after: item,
                });
            }
        }
    }

    if bar.hovered() || left.as_ref().is_some_and(|r| r.hovered())
        || right.as_ref().is_some_and(|r| r.hovered())
    {
        if let Some(item) = store.item(entry.id) {
            show_item_tooltip(ui, item);
        }
    }

    consumed
}

fn drag_edge<'r>(
    bar: &'r egui::Response,
    left: Option<&'r egui::Response>,
    right: Option<&'r egui::Response>,
) -> Option<(&'r egui::Response, &'static str)> {
    if let Some(left) = left.filter(|r| r.dragged()) {
        Some((left, "left"))
    } else if let Some(right) = right.filter(|r| r.dragged()) {
        Some((right, "right"))
    } else if bar.dragged() {
        Some((bar, "move"))
    } else {
        None
    }
}

fn apply_drag(
    item: &mut Item,
    snapshot: &DragSnapshot,
    ptr_x: f32,
    edge: &str,
    viewport: &Viewport,
) {
    // Screen pixels are zoomed; undo the zoom before mapping to time.
    let delta_px = (ptr_x - snapshot.pointer_x) / viewport.zoom as f32;
    let delta = Duration::milliseconds((delta_px as f64 * viewport.ms_per_pixel()).round() as i64);
    let orig = &snapshot.item;
    match edge {
        "left" => {
            let end = orig.effective_end();
            item.start = (orig.start + delta).min(end);
            item.end = orig.end.map(|e| e.max(item.start));
        }
        "right" => {
            if let Some(end) = orig.end {
                item.end = Some((end + delta).max(orig.start));
            }
        }
        _ => {
            item.start = orig.start + delta;
            item.end = orig.end.map(|e| e + delta);
        }
    }
}

/// Round the edited edge to the current zoom level's boundary. Moves keep
/// their duration; only the start snaps.
fn snap_edit(item: &mut Item, edge: &str, viewport: &Viewport) {
    match edge {
        "left" => {
            let snapped = viewport.snap_to_nice_time(item.start);
            item.start = match item.end {
                Some(end) => snapped.min(end),
                None => snapped,
            };
        }
        "right" => {
            if let Some(end) = item.end {
                item.end = Some(viewport.snap_to_nice_time(end).max(item.start));
            }
        }
        _ => {
            let duration = item.end.map(|e| e - item.start);
            item.start = viewport.snap_to_nice_time(item.start);
            item.end = duration.map(|d| item.start + d);
        }
    }
}

fn show_item_tooltip(ui: &Ui, item: &Item) {
    egui::show_tooltip_at_pointer(
        ui.ctx(),
        ui.layer_id(),
        Id::new(("item-tip", item.id)),
        |ui| {
            ui.strong(&item.title);
            match item.end {
                Some(end) => {
                    ui.label(format!(
                        "{} \u{2192} {}",
                        item.start.format("%d/%m/%Y %H:%M"),
                        end.format("%d/%m/%Y %H:%M"),
                    ));
                }
                None => {
                    ui.label(item.start.format("%d/%m/%Y %H:%M").to_string());
                }
            }
            if let Some(progress) = item.progress {
                ui.label(format!("Progress: {}%", (progress * 100.0) as i32));
            }
            if let Some(desc) = &item.description {
                ui.label(egui::RichText::new(desc).weak());
            }
        },
    );
}

fn drag_id(item_id: Uuid, edge: &'static str) -> Id {
    Id::new(("drag", item_id, edge))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, h, 0, 0).unwrap()
    }

    fn viewport() -> Viewport {
        let mut vp = Viewport::new(at(1, 0), at(30, 0));
        vp.set_container_size(1000.0, 600.0);
        vp
    }

    fn snapshot_of(item: &Item, pointer_x: f32) -> DragSnapshot {
        DragSnapshot {
            item: item.clone(),
            pointer_x,
        }
    }

    #[test]
    fn move_drag_shifts_both_edges_by_the_pointer_delta() {
        let vp = viewport();
        let orig = Item::new("t", at(5, 0), at(8, 0));
        let snap = snapshot_of(&orig, 100.0);
        let mut item = orig.clone();
        // 100 px over a 29-day / 1000 px window = 2.9 days.
        apply_drag(&mut item, &snap, 200.0, "move", &vp);
        let shift = item.start - orig.start;
        assert_eq!(item.end.unwrap() - orig.end.unwrap(), shift);
        let expected_ms = (100.0 * vp.ms_per_pixel()).round() as i64;
        assert_eq!(shift.num_milliseconds(), expected_ms);
    }

    #[test]
    fn left_resize_never_crosses_the_end() {
        let vp = viewport();
        let orig = Item::new("t", at(5, 0), at(6, 0));
        let snap = snapshot_of(&orig, 0.0);
        let mut item = orig.clone();
        apply_drag(&mut item, &snap, 900.0, "left", &vp);
        assert_eq!(item.start, item.end.unwrap());
    }

    #[test]
    fn right_resize_on_instant_item_is_ignored() {
        let vp = viewport();
        let orig = Item::new_instant("flag", at(5, 0));
        let snap = snapshot_of(&orig, 0.0);
        let mut item = orig.clone();
        apply_drag(&mut item, &snap, 300.0, "right", &vp);
        assert_eq!(item, orig);
    }

    #[test]
    fn snap_on_move_preserves_duration() {
        let mut vp = viewport();
        vp.zoom = 1.0; // "Days"
        let mut item = Item::new("t", at(5, 7), at(8, 7));
        let duration = item.end.unwrap() - item.start;
        snap_edit(&mut item, "move", &vp);
        assert_eq!(item.start, at(5, 0));
        assert_eq!(item.end.unwrap() - item.start, duration);
    }

    #[test]
    fn tick_labels_follow_the_level() {
        let t = at(5, 14);
        assert_eq!(tick_label(t, "Days"), "05 Jun");
        assert_eq!(tick_label(t, "Hours"), "14:00");
        assert_eq!(tick_label(t, "Years"), "2024");
    }

    #[test]
    fn free_scene_skips_items_outside_the_window() {
        let mut store = TimelineStore::new();
        store.insert_item(Item::new("in", at(5, 0), at(6, 0))).unwrap();
        store
            .insert_item(Item::new(
                "out",
                Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap(),
            ))
            .unwrap();
        let scene = build_free_scene(&store, &viewport(), LayoutMode::Circular);
        assert_eq!(scene.items.len(), 1);
    }

    #[test]
    fn row_scene_mounts_only_rows_near_the_window() {
        let mut store = TimelineStore::new();
        for i in 0..200 {
            store
                .insert_item(Item::new(format!("t{i}"), at(2, 0), at(3, 0)))
                .unwrap();
        }
        let vp = viewport();
        let scene = build_row_scene(&store, &vp, LayoutMode::Gantt, 0.0);
        assert!(scene.items.len() < 40, "mounted {}", scene.items.len());
        assert!(scene.content_extent > vp.container_h);
    }

    #[test]
    fn lane_scene_stacks_group_members_without_overlap() {
        let mut store = TimelineStore::new();
        let group = crate::model::Group::new("g");
        let gid = group.id;
        store.insert_group(group);
        for i in 0..3 {
            let mut item = Item::new(format!("t{i}"), at(5, 0), at(9, 0));
            item.group = Some(gid);
            store.insert_item(item).unwrap();
        }
        let scene = build_lane_scene(&store, &viewport(), 0.0);
        assert_eq!(scene.items.len(), 3);
        for i in 0..3 {
            for j in (i + 1)..3 {
                let (a, b) = (&scene.items[i].bounds, &scene.items[j].bounds);
                let disjoint = a.y + a.height <= b.y || b.y + b.height <= a.y;
                assert!(disjoint, "items {i} and {j} overlap");
            }
        }
    }
}
