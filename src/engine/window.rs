use uuid::Uuid;

use crate::engine::layout::{LANE_GAP, LANE_HEIGHT};
use crate::model::TimelineStore;

/// Rows past the visible edge that are kept mounted so fast scrolling does
/// not reveal blank space before the next layout pass.
pub const DEFAULT_OVERSCAN: usize = 5;

const GROUP_HEADER_HEIGHT: f32 = 28.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    GroupHeader(Uuid),
    Item(Uuid),
}

/// One entry of the flattened row list: group headers interleaved with the
/// items of expanded groups, ungrouped items at the tail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Row {
    pub kind: RowKind,
    pub extent: f32,
}

/// Half-open index range `[start_index, end_index)` into the row list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRange {
    pub start_index: usize,
    pub end_index: usize,
}

impl VisibleRange {
    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start_index && index < self.end_index
    }
}

/// Flatten the store into scroll order: each group contributes a header row,
/// followed by its member items unless the group is collapsed. Items with no
/// group come last. Collapsing therefore changes row indices for everything
/// below the collapsed group, which is why offsets are recomputed rather
/// than cached across structural edits.
pub fn flatten_rows(store: &TimelineStore) -> Vec<Row> {
    let mut rows = Vec::new();
    for group in store.groups() {
        rows.push(Row {
            kind: RowKind::GroupHeader(group.id),
            extent: GROUP_HEADER_HEIGHT,
        });
        if !group.collapsed {
            for item in store.items().iter().filter(|i| i.group == Some(group.id)) {
                rows.push(Row {
                    kind: RowKind::Item(item.id),
                    extent: LANE_HEIGHT + LANE_GAP,
                });
            }
        }
    }
    for item in store.items().iter().filter(|i| i.group.is_none()) {
        rows.push(Row {
            kind: RowKind::Item(item.id),
            extent: LANE_HEIGHT + LANE_GAP,
        });
    }
    rows
}

/// Prefix sums of row extents: `offsets[i]` is the scroll position where row
/// `i` starts, and `offsets[rows.len()]` is the total content extent.
pub fn row_offsets(rows: &[Row]) -> Vec<f32> {
    let mut offsets = Vec::with_capacity(rows.len() + 1);
    let mut acc = 0.0;
    offsets.push(acc);
    for row in rows {
        acc += row.extent;
        offsets.push(acc);
    }
    offsets
}

/// Total scrollable extent of the row list.
pub fn total_extent(rows: &[Row]) -> f32 {
    rows.iter().map(|r| r.extent).sum()
}

/// Compute the half-open row range to mount for a scroll position, widened
/// by `overscan` rows on each side. Returns `None` for an empty row list.
///
/// A row is part of the core (pre-overscan) range iff it intersects the
/// window `[scroll, scroll + container_extent)`.
pub fn compute_visible_range(
    scroll: f32,
    container_extent: f32,
    rows: &[Row],
    offsets: &[f32],
    overscan: usize,
) -> Option<VisibleRange> {
    if rows.is_empty() {
        return None;
    }
    debug_assert_eq!(offsets.len(), rows.len() + 1);
    let scroll = scroll.max(0.0);

    // First row whose end edge is past the window start.
    let first = match offsets[1..=rows.len()]
        .binary_search_by(|end| end.partial_cmp(&scroll).unwrap())
    {
        Ok(i) => (i + 1).min(rows.len() - 1),
        Err(i) => i.min(rows.len() - 1),
    };
    // First row that starts at or past the window end.
    let window_end = scroll + container_extent;
    let stop = match offsets[..rows.len()]
        .binary_search_by(|start| start.partial_cmp(&window_end).unwrap())
    {
        Ok(i) | Err(i) => i,
    };

    let start_index = first.saturating_sub(overscan);
    let end_index = (stop.max(first + 1) + overscan).min(rows.len());
    Some(VisibleRange {
        start_index,
        end_index,
    })
}
