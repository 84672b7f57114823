pub mod driver;
pub mod egui_driver;

pub use driver::{DrawHeader, DrawItem, RenderDriver};
pub use egui_driver::EguiDriver;
