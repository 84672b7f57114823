use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::layout::LayoutMode;
use crate::model::{Group, Item, TimelineStore, Viewport};

/// Everything persisted in a timeline file: the data plus the view state,
/// so reopening a file restores the exact picture that was saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineFile {
    pub items: Vec<Item>,
    pub groups: Vec<Group>,
    pub viewport: Viewport,
    pub mode: LayoutMode,
}

impl TimelineFile {
    pub fn capture(store: &TimelineStore, viewport: &Viewport, mode: LayoutMode) -> Self {
        Self {
            items: store.items().to_vec(),
            groups: store.groups().to_vec(),
            viewport: viewport.clone(),
            mode,
        }
    }
}

/// Save a timeline to a JSON file.
pub fn save_timeline(file: &TimelineFile, path: &Path) -> Result<(), String> {
    let json = serde_json::to_string_pretty(file).map_err(|e| e.to_string())?;
    std::fs::write(path, json).map_err(|e| e.to_string())
}

/// Load a timeline from a JSON file.
pub fn load_timeline(path: &Path) -> Result<TimelineFile, String> {
    let json = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&json).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn save_then_load_round_trips_data_and_view() {
        let mut store = TimelineStore::new();
        let group = Group::new("phase 1");
        let gid = group.id;
        store.insert_group(group);
        let mut item = Item::new(
            "kickoff",
            Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 3, 17, 0, 0).unwrap(),
        );
        item.group = Some(gid);
        item.progress = Some(0.4);
        store.insert_item(item).unwrap();

        let mut viewport = Viewport::default();
        viewport.zoom_by(2.0, None);

        let file = TimelineFile::capture(&store, &viewport, LayoutMode::Gantt);
        let dir = std::env::temp_dir().join("timeloom-file-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("roundtrip.json");

        save_timeline(&file, &path).unwrap();
        let loaded = load_timeline(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.items, file.items);
        assert_eq!(loaded.groups, file.groups);
        assert_eq!(loaded.viewport, file.viewport);
        assert_eq!(loaded.mode, LayoutMode::Gantt);
    }

    #[test]
    fn load_missing_file_is_an_error_not_a_panic() {
        assert!(load_timeline(Path::new("/nonexistent/timeloom.json")).is_err());
    }
}
