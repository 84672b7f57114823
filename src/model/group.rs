use egui::Color32;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named lane of items. Group order in the store is explicit array order
/// and determines the lane base offset; it is never inferred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(with = "super::item::color_serde", default)]
    pub color: Option<Color32>,
}

impl Group {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            collapsed: false,
            color: None,
        }
    }
}
