use std::path::Path;

use crate::model::{Item, TimelineStore};

/// Export items to a semicolon-delimited CSV file.
///
/// Columns: Title ; Start ; End ; Group ; Priority ; Progress
/// Timestamps are RFC 3339; instantaneous items leave End empty.
/// Returns the number of items written.
pub fn export_csv(store: &TimelineStore, path: &Path) -> Result<usize, String> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_path(path)
        .map_err(|e| format!("Failed to create CSV file: {}", e))?;

    wtr.write_record(["Title", "Start", "End", "Group", "Priority", "Progress"])
        .map_err(|e| format!("Failed to write header: {}", e))?;

    for item in store.items() {
        wtr.write_record(item_record(store, item))
            .map_err(|e| format!("Failed to write item '{}': {}", item.title, e))?;
    }

    wtr.flush().map_err(|e| format!("Failed to flush CSV: {}", e))?;
    Ok(store.items().len())
}

fn item_record(store: &TimelineStore, item: &Item) -> [String; 6] {
    [
        item.title.clone(),
        item.start.to_rfc3339(),
        item.end.map(|e| e.to_rfc3339()).unwrap_or_default(),
        item.group
            .and_then(|g| store.group(g))
            .map(|g| g.title.clone())
            .unwrap_or_default(),
        format!("{:?}", item.priority),
        item.progress
            .map(|p| format!("{}%", (p * 100.0).round() as i32))
            .unwrap_or_default(),
    ]
}
