pub mod group;
pub mod history;
pub mod item;
pub mod store;
pub mod viewport;

pub use group::Group;
pub use history::{ActionKind, UndoAction, UndoHistory};
pub use item::{Item, Priority};
pub use store::TimelineStore;
pub use viewport::Viewport;
