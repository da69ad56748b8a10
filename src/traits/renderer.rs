use anyhow::Result;

use super::viewport::Viewport;
use crate::camera::PerspectiveCamera;
use crate::scene::SceneState;

/// Draws the scene into a mounted rendering surface
pub trait FrameRenderer {
    /// Size the surface was created with
    fn viewport(&self) -> Viewport;

    /// Render one frame: bloom composer first, then the final composer
    fn render(&mut self, scene: &SceneState, camera: &PerspectiveCamera) -> Result<()>;
}
