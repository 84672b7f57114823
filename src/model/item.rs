use chrono::{DateTime, Utc};
use egui::Color32;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Importance of an item, rendered as an accent stripe on the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// A single time-ranged entry on the timeline.
///
/// `end == None` marks an instantaneous item (rendered as a diamond); for
/// layout purposes it is treated as `end == start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    /// Group this item belongs to, if any. Group order drives lane layout.
    #[serde(default)]
    pub group: Option<Uuid>,
    /// Display color of the bar (stored as RGBA).
    #[serde(with = "color_serde", default)]
    pub color: Option<Color32>,
    #[serde(default)]
    pub priority: Priority,
    /// Completion ratio in [0, 1], drawn as a darkened overlay.
    #[serde(default)]
    pub progress: Option<f32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<Uuid>,
}

impl Item {
    /// Create a new ranged item with sensible defaults.
    pub fn new(title: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            start,
            end: Some(end),
            group: None,
            color: None,
            priority: Priority::default(),
            progress: None,
            tags: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// Create a new instantaneous item (start == end).
    pub fn new_instant(title: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            start: at,
            end: None,
            group: None,
            color: None,
            priority: Priority::default(),
            progress: None,
            tags: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn is_instant(&self) -> bool {
        match self.end {
            Some(end) => end == self.start,
            None => true,
        }
    }

    /// End instant used by layout and overlap checks; `start` when absent.
    pub fn effective_end(&self) -> DateTime<Utc> {
        self.end.unwrap_or(self.start)
    }

    /// Check the item against the mutation-boundary invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if let Some(end) = self.end {
            if end < self.start {
                return Err(ValidationError::EndBeforeStart {
                    start: self.start,
                    end,
                });
            }
        }
        if let Some(progress) = self.progress {
            if !(0.0..=1.0).contains(&progress) {
                return Err(ValidationError::ProgressOutOfRange(progress));
            }
        }
        Ok(())
    }
}

/// Serde helper for `Option<Color32>`.
pub(crate) mod color_serde {
    use egui::Color32;
    use serde::{self, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(color: &Option<Color32>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        color
            .map(|c| [c.r(), c.g(), c.b(), c.a()])
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Color32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let rgba: Option<[u8; 4]> = Deserialize::deserialize(deserializer)?;
        Ok(rgba.map(|[r, g, b, a]| Color32::from_rgba_premultiplied(r, g, b, a)))
    }
}
