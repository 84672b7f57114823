use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

use super::group::Group;
use super::item::Item;

/// The authoritative owner of items and groups.
///
/// Every other component (viewport, layout, virtualization, cache, render)
/// only reads from the store and produces derived, disposable state. All
/// mutation goes through the validated operations here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineStore {
    items: Vec<Item>,
    groups: Vec<Group>,
    pub modified: DateTime<Utc>,
}

impl Default for TimelineStore {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            groups: Vec::new(),
            modified: Utc::now(),
        }
    }
}

impl TimelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn item(&self, id: Uuid) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn group(&self, id: Uuid) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Lane base index of a group: its explicit position in the group array.
    pub fn group_index(&self, id: Uuid) -> Option<usize> {
        self.groups.iter().position(|g| g.id == id)
    }

    /// Touch the modified timestamp.
    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }

    // --- Validated mutation boundary ---

    /// Add an item, rejecting malformed input before it enters the store.
    pub fn insert_item(&mut self, item: Item) -> Result<(), ValidationError> {
        item.validate()?;
        self.items.push(item);
        self.touch();
        Ok(())
    }

    /// Replace the item with `updated.id`, validating first. The store is
    /// unchanged when validation fails.
    pub fn update_item(&mut self, updated: Item) -> Result<(), ValidationError> {
        updated.validate()?;
        if let Some(slot) = self.items.iter_mut().find(|i| i.id == updated.id) {
            *slot = updated;
            self.touch();
        }
        Ok(())
    }

    pub fn remove_item(&mut self, id: Uuid) -> Option<Item> {
        let pos = self.items.iter().position(|i| i.id == id)?;
        let item = self.items.remove(pos);
        self.touch();
        Some(item)
    }

    /// Put a known-good snapshot back, replacing by id or re-inserting.
    /// Used by undo/redo replay, which only handles values that already
    /// passed validation.
    pub fn restore_item(&mut self, item: Item) {
        match self.items.iter_mut().find(|i| i.id == item.id) {
            Some(slot) => *slot = item,
            None => self.items.push(item),
        }
        self.touch();
    }

    pub fn insert_group(&mut self, group: Group) {
        self.groups.push(group);
        self.touch();
    }

    pub fn restore_group(&mut self, group: Group) {
        match self.groups.iter_mut().find(|g| g.id == group.id) {
            Some(slot) => *slot = group,
            None => self.groups.push(group),
        }
        self.touch();
    }

    /// Flip a group's collapsed flag; returns the new state.
    pub fn toggle_group(&mut self, id: Uuid) -> Option<bool> {
        let group = self.groups.iter_mut().find(|g| g.id == id)?;
        group.collapsed = !group.collapsed;
        let collapsed = group.collapsed;
        self.touch();
        Some(collapsed)
    }

    /// Replace all content at once (snapshot load).
    pub fn replace_all(&mut self, items: Vec<Item>, groups: Vec<Group>) {
        self.items = items;
        self.groups = groups;
        self.touch();
    }

    // --- Batch merge (cache completions) ---

    /// Merge a fetched batch: items already present (by id) are replaced,
    /// new ones appended. Returns the number of newly added items.
    pub fn merge_items(&mut self, batch: Vec<Item>) -> usize {
        let mut added = 0;
        for item in batch {
            match self.items.iter_mut().find(|i| i.id == item.id) {
                Some(slot) => *slot = item,
                None => {
                    self.items.push(item);
                    added += 1;
                }
            }
        }
        if added > 0 {
            self.touch();
        }
        added
    }

    pub fn merge_groups(&mut self, batch: Vec<Group>) -> usize {
        let mut added = 0;
        for group in batch {
            match self.groups.iter_mut().find(|g| g.id == group.id) {
                Some(slot) => *slot = group,
                None => {
                    self.groups.push(group);
                    added += 1;
                }
            }
        }
        if added > 0 {
            self.touch();
        }
        added
    }

    // --- Read-side queries ---

    /// Items of one group (or ungrouped for `None`), in input order.
    pub fn items_in_group(&self, group: Option<Uuid>) -> Vec<&Item> {
        self.items.iter().filter(|i| i.group == group).collect()
    }

    /// Items whose range intersects [start, end].
    pub fn items_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|i| i.start <= end && i.effective_end() >= start)
            .collect()
    }

    /// Union span of all items, `None` when empty.
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let mut span: Option<(DateTime<Utc>, DateTime<Utc>)> = None;
        for item in &self.items {
            let end = item.effective_end();
            span = Some(match span {
                None => (item.start, end),
                Some((lo, hi)) => (lo.min(item.start), hi.max(end)),
            });
        }
        span
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn invalid_item_never_enters_the_store() {
        let mut store = TimelineStore::new();
        let bad = Item::new("bad", day(5), day(2));
        assert!(store.insert_item(bad).is_err());
        assert!(store.items().is_empty());
    }

    #[test]
    fn merge_replaces_by_id_and_appends_new() {
        let mut store = TimelineStore::new();
        let mut a = Item::new("a", day(1), day(2));
        store.insert_item(a.clone()).unwrap();

        a.title = "a2".into();
        let b = Item::new("b", day(3), day(4));
        let added = store.merge_items(vec![a.clone(), b.clone()]);

        assert_eq!(added, 1);
        assert_eq!(store.items().len(), 2);
        assert_eq!(store.item(a.id).unwrap().title, "a2");
        assert!(store.item(b.id).is_some());
    }

    #[test]
    fn range_query_includes_touching_items() {
        let mut store = TimelineStore::new();
        store.insert_item(Item::new("in", day(5), day(10))).unwrap();
        store.insert_item(Item::new("out", day(20), day(25))).unwrap();
        let hits = store.items_in_range(day(1), day(6));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "in");
    }

    #[test]
    fn group_order_is_explicit_array_order() {
        let mut store = TimelineStore::new();
        let g1 = Group::new("first");
        let g2 = Group::new("second");
        store.insert_group(g1.clone());
        store.insert_group(g2.clone());
        assert_eq!(store.group_index(g1.id), Some(0));
        assert_eq!(store.group_index(g2.id), Some(1));
    }

    #[test]
    fn time_span_covers_instants() {
        let mut store = TimelineStore::new();
        store.insert_item(Item::new("a", day(5), day(10))).unwrap();
        store.insert_item(Item::new_instant("late", day(20))).unwrap();
        assert_eq!(store.time_span(), Some((day(5), day(20))));
    }
}
