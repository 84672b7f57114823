use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::group::Group;
use super::item::Item;
use super::store::TimelineStore;
use super::viewport::Viewport;

pub const DEFAULT_CAPACITY: usize = 50;

/// What a logged action did to the authoritative state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Add,
    Update,
    Delete,
    Move,
    Resize,
    GroupChange,
    ViewportChange,
}

impl ActionKind {
    /// Human-readable verb for menu entries and the status bar.
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Add => "Add",
            ActionKind::Update => "Edit",
            ActionKind::Delete => "Delete",
            ActionKind::Move => "Move",
            ActionKind::Resize => "Resize",
            ActionKind::GroupChange => "Group Change",
            ActionKind::ViewportChange => "View Change",
        }
    }
}

/// Whole-value snapshot of the entity an action touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Snapshot {
    Item(Item),
    Group(Group),
    Viewport(Viewport),
}

/// One reversible edit. `before` is captured *prior* to the mutation so the
/// prior state can always be reconstructed, even when several fields change
/// together. Add has no `before`; Delete has no `after`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoAction {
    pub kind: ActionKind,
    pub target: Uuid,
    pub before: Option<Snapshot>,
    pub after: Option<Snapshot>,
    pub at: DateTime<Utc>,
}

impl UndoAction {
    pub fn add(item: Item) -> Self {
        Self {
            kind: ActionKind::Add,
            target: item.id,
            before: None,
            after: Some(Snapshot::Item(item)),
            at: Utc::now(),
        }
    }

    pub fn delete(item: Item) -> Self {
        Self {
            kind: ActionKind::Delete,
            target: item.id,
            before: Some(Snapshot::Item(item)),
            after: None,
            at: Utc::now(),
        }
    }

    pub fn item_edit(kind: ActionKind, before: Item, after: Item) -> Self {
        debug_assert!(matches!(
            kind,
            ActionKind::Update | ActionKind::Move | ActionKind::Resize
        ));
        Self {
            kind,
            target: after.id,
            before: Some(Snapshot::Item(before)),
            after: Some(Snapshot::Item(after)),
            at: Utc::now(),
        }
    }

    pub fn group_change(before: Group, after: Group) -> Self {
        Self {
            kind: ActionKind::GroupChange,
            target: after.id,
            before: Some(Snapshot::Group(before)),
            after: Some(Snapshot::Group(after)),
            at: Utc::now(),
        }
    }

    pub fn viewport_change(before: Viewport, after: Viewport) -> Self {
        Self {
            kind: ActionKind::ViewportChange,
            target: Uuid::nil(),
            before: Some(Snapshot::Viewport(before)),
            after: Some(Snapshot::Viewport(after)),
            at: Utc::now(),
        }
    }
}

/// Append-only, truncatable log of reversible edits with a cursor.
///
/// The cursor counts currently-applied actions. Pushing while the cursor is
/// not at the end discards everything past it — no redo branches survive a
/// new edit. The log is bounded; the oldest action is dropped past capacity.
#[derive(Debug, Default)]
pub struct UndoHistory {
    actions: Vec<UndoAction>,
    cursor: usize,
    capacity: usize,
}

impl UndoHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            actions: Vec::new(),
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.actions.len()
    }

    /// Kind of the action `undo` would revert next.
    pub fn peek_undo(&self) -> Option<ActionKind> {
        self.cursor
            .checked_sub(1)
            .map(|i| self.actions[i].kind)
    }

    /// Kind of the action `redo` would re-apply next.
    pub fn peek_redo(&self) -> Option<ActionKind> {
        self.actions.get(self.cursor).map(|a| a.kind)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
        self.cursor = 0;
    }

    /// Record an action that has just been applied to the authoritative state.
    pub fn push(&mut self, action: UndoAction) {
        self.actions.truncate(self.cursor);
        self.actions.push(action);
        if self.actions.len() > self.capacity {
            self.actions.remove(0);
        }
        self.cursor = self.actions.len();
    }

    /// Revert the action at the cursor. A no-op when there is nothing to
    /// undo (history exhaustion is not an error).
    pub fn undo(&mut self, store: &mut TimelineStore, viewport: &mut Viewport) -> Option<ActionKind> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        let action = self.actions[self.cursor].clone();
        Self::revert(&action, store, viewport);
        Some(action.kind)
    }

    /// Re-apply the action past the cursor; no-op when nothing is redoable.
    pub fn redo(&mut self, store: &mut TimelineStore, viewport: &mut Viewport) -> Option<ActionKind> {
        if !self.can_redo() {
            return None;
        }
        let action = self.actions[self.cursor].clone();
        self.cursor += 1;
        Self::apply(&action, store, viewport);
        Some(action.kind)
    }

    fn revert(action: &UndoAction, store: &mut TimelineStore, viewport: &mut Viewport) {
        match (action.kind, &action.before) {
            (ActionKind::Add, _) => {
                store.remove_item(action.target);
            }
            (ActionKind::Delete, Some(Snapshot::Item(item))) => {
                store.restore_item(item.clone());
            }
            (ActionKind::Update | ActionKind::Move | ActionKind::Resize, Some(Snapshot::Item(item))) => {
                store.restore_item(item.clone());
            }
            (ActionKind::GroupChange, Some(Snapshot::Group(group))) => {
                store.restore_group(group.clone());
            }
            (ActionKind::ViewportChange, Some(Snapshot::Viewport(vp))) => {
                *viewport = vp.clone();
            }
            _ => {}
        }
    }

    fn apply(action: &UndoAction, store: &mut TimelineStore, viewport: &mut Viewport) {
        match (action.kind, &action.after) {
            (ActionKind::Delete, _) => {
                store.remove_item(action.target);
            }
            (ActionKind::Add, Some(Snapshot::Item(item))) => {
                store.restore_item(item.clone());
            }
            (ActionKind::Update | ActionKind::Move | ActionKind::Resize, Some(Snapshot::Item(item))) => {
                store.restore_item(item.clone());
            }
            (ActionKind::GroupChange, Some(Snapshot::Group(group))) => {
                store.restore_group(group.clone());
            }
            (ActionKind::ViewportChange, Some(Snapshot::Viewport(vp))) => {
                *viewport = vp.clone();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn fixture() -> (TimelineStore, Viewport, UndoHistory) {
        (
            TimelineStore::new(),
            Viewport::new(day(1), day(31)),
            UndoHistory::new(),
        )
    }

    #[test]
    fn undo_restores_state_before_the_action() {
        let (mut store, mut vp, mut history) = fixture();
        let item = Item::new("task", day(5), day(10));
        let id = item.id;

        store.insert_item(item.clone()).unwrap();
        history.push(UndoAction::add(item.clone()));

        let before = store.item(id).unwrap().clone();
        let mut moved = before.clone();
        moved.start = day(7);
        moved.end = Some(day(12));
        store.update_item(moved.clone()).unwrap();
        history.push(UndoAction::item_edit(ActionKind::Move, before.clone(), moved.clone()));

        assert_eq!(history.undo(&mut store, &mut vp), Some(ActionKind::Move));
        assert_eq!(store.item(id).unwrap(), &before);

        assert_eq!(history.redo(&mut store, &mut vp), Some(ActionKind::Move));
        assert_eq!(store.item(id).unwrap(), &moved);
    }

    #[test]
    fn undo_of_add_removes_redo_reinserts() {
        let (mut store, mut vp, mut history) = fixture();
        let item = Item::new("task", day(5), day(10));
        let id = item.id;
        store.insert_item(item.clone()).unwrap();
        history.push(UndoAction::add(item));

        history.undo(&mut store, &mut vp);
        assert!(store.item(id).is_none());

        history.redo(&mut store, &mut vp);
        assert!(store.item(id).is_some());
    }

    #[test]
    fn undo_of_delete_reinserts() {
        let (mut store, mut vp, mut history) = fixture();
        let item = Item::new("task", day(5), day(10));
        let id = item.id;
        store.insert_item(item.clone()).unwrap();

        let removed = store.remove_item(id).unwrap();
        history.push(UndoAction::delete(removed));

        history.undo(&mut store, &mut vp);
        assert!(store.item(id).is_some());
    }

    #[test]
    fn pushing_after_undo_discards_the_redo_branch() {
        let (mut store, mut vp, mut history) = fixture();
        let a = Item::new("a", day(1), day(2));
        let b = Item::new("b", day(3), day(4));
        let c = Item::new("c", day(5), day(6));

        store.insert_item(a.clone()).unwrap();
        history.push(UndoAction::add(a));
        store.insert_item(b.clone()).unwrap();
        history.push(UndoAction::add(b.clone()));

        history.undo(&mut store, &mut vp);
        assert!(history.can_redo());

        store.insert_item(c.clone()).unwrap();
        history.push(UndoAction::add(c));
        assert!(!history.can_redo());
        // The discarded branch is gone for good: b never comes back.
        history.undo(&mut store, &mut vp);
        history.redo(&mut store, &mut vp);
        assert!(store.item(b.id).is_none());
    }

    #[test]
    fn exhausted_history_is_a_noop() {
        let (mut store, mut vp, mut history) = fixture();
        assert_eq!(history.undo(&mut store, &mut vp), None);
        assert_eq!(history.redo(&mut store, &mut vp), None);
    }

    #[test]
    fn capacity_drops_the_oldest_action() {
        let (mut store, mut vp, _) = fixture();
        let mut history = UndoHistory::with_capacity(2);
        for title in ["a", "b", "c"] {
            let item = Item::new(title, day(1), day(2));
            store.insert_item(item.clone()).unwrap();
            history.push(UndoAction::add(item));
        }
        assert_eq!(history.len(), 2);
        // Two undos unwind c and b; a is beyond the log.
        history.undo(&mut store, &mut vp);
        history.undo(&mut store, &mut vp);
        assert!(!history.can_undo());
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.items()[0].title, "a");
    }

    #[test]
    fn viewport_change_round_trips() {
        let (mut store, mut vp, mut history) = fixture();
        let before = vp.clone();
        vp.zoom_to_fit(
            std::iter::once(&Item::new("x", day(10), day(15))),
            0.1,
        );
        history.push(UndoAction::viewport_change(before.clone(), vp.clone()));

        history.undo(&mut store, &mut vp);
        assert_eq!(vp, before);
        assert!(history.can_redo());
    }
}
