mod color;
mod transform;

pub use color::{hex_to_linear, hex_to_rgb, srgb_to_linear};
pub use transform::{Object3d, Trs};
