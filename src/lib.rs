pub mod camera;
pub mod cli;
pub mod config;
pub mod frame;
pub mod loaders;
pub mod math;
pub mod render;
pub mod scene;
pub mod traits;
pub mod widget;

pub use config::{BloomMode, ViewerConfig};
pub use widget::ViewerWidget;
