use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DataSourceError;
use crate::model::{Group, Item};

/// One page of an item listing.
#[derive(Debug, Clone, Default)]
pub struct ItemPage {
    pub items: Vec<Item>,
    pub total: usize,
    pub has_more: bool,
}

/// One page of a group listing.
#[derive(Debug, Clone, Default)]
pub struct GroupPage {
    pub groups: Vec<Group>,
    pub total: usize,
    pub has_more: bool,
}

/// Backend the lazy cache pulls from. Implementations run on the cache
/// worker thread, so they may block, but must be safe to share.
pub trait DataSource: Send + Sync {
    fn fetch_items(&self, offset: usize, limit: usize) -> Result<ItemPage, DataSourceError>;

    fn fetch_groups(&self, offset: usize, limit: usize) -> Result<GroupPage, DataSourceError>;

    fn fetch_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Item>, DataSourceError>;

    fn fetch_by_group(&self, group: Uuid) -> Result<Vec<Item>, DataSourceError>;
}

/// Source over a fixed dataset. Items are kept sorted by start time so
/// paged fetches come back in a stable order.
pub struct InMemorySource {
    items: Vec<Item>,
    groups: Vec<Group>,
}

impl InMemorySource {
    pub fn new(mut items: Vec<Item>, groups: Vec<Group>) -> Self {
        items.sort_by_key(|i| i.start);
        Self { items, groups }
    }
}

impl DataSource for InMemorySource {
    fn fetch_items(&self, offset: usize, limit: usize) -> Result<ItemPage, DataSourceError> {
        let total = self.items.len();
        let start = offset.min(total);
        let end = (offset + limit).min(total);
        Ok(ItemPage {
            items: self.items[start..end].to_vec(),
            total,
            has_more: end < total,
        })
    }

    fn fetch_groups(&self, offset: usize, limit: usize) -> Result<GroupPage, DataSourceError> {
        let total = self.groups.len();
        let start = offset.min(total);
        let end = (offset + limit).min(total);
        Ok(GroupPage {
            groups: self.groups[start..end].to_vec(),
            total,
            has_more: end < total,
        })
    }

    fn fetch_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Item>, DataSourceError> {
        Ok(self
            .items
            .iter()
            .filter(|i| i.start < end && i.effective_end() > start)
            .cloned()
            .collect())
    }

    fn fetch_by_group(&self, group: Uuid) -> Result<Vec<Item>, DataSourceError> {
        Ok(self
            .items
            .iter()
            .filter(|i| i.group == Some(group))
            .cloned()
            .collect())
    }
}
