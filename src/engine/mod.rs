pub mod cache;
pub mod frame;
pub mod layout;
pub mod source;
pub mod window;

pub use cache::{LazyCache, RequestKey};
pub use frame::FrameScheduler;
pub use layout::{ItemBounds, LayoutMode};
pub use source::{DataSource, GroupPage, InMemorySource, ItemPage};
pub use window::{Row, RowKind, VisibleRange};
