use anyhow::Result;

use super::renderer::FrameRenderer;
use super::viewport::Viewport;
use crate::config::ViewerConfig;

/// Callback the loader thread fires once an asset load settles
pub type AssetWaker = Box<dyn FnOnce() + Send + 'static>;

/// The container a widget is mounted into
pub trait RenderHost {
    type Renderer: FrameRenderer;

    /// Container size in physical pixels
    fn container_size(&self) -> Viewport;

    /// Create a rendering surface of exactly `viewport` and attach it to the container
    fn attach_surface(&mut self, viewport: Viewport, config: &ViewerConfig) -> Result<Self::Renderer>;

    /// Detach the rendering surface from the container and release it
    fn detach_surface(&mut self, renderer: Self::Renderer);

    /// Schedule one more display-refresh callback
    fn request_frame(&self);

    /// Waker that brings the host back to the widget when a load completes
    fn asset_waker(&self) -> AssetWaker;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PerspectiveCamera;
    use crate::scene::SceneState;
    use std::cell::RefCell;

    struct NullRenderer(Viewport);

    impl FrameRenderer for NullRenderer {
        fn viewport(&self) -> Viewport {
            self.0
        }

        fn render(&mut self, _scene: &SceneState, _camera: &PerspectiveCamera) -> Result<()> {
            Ok(())
        }
    }

    // Mock host for testing trait implementation
    struct MockHost {
        size: Viewport,
        attached: RefCell<usize>,
        frames: RefCell<usize>,
    }

    impl RenderHost for MockHost {
        type Renderer = NullRenderer;

        fn container_size(&self) -> Viewport {
            self.size
        }

        fn attach_surface(&mut self, viewport: Viewport, _config: &ViewerConfig) -> Result<NullRenderer> {
            *self.attached.borrow_mut() += 1;
            Ok(NullRenderer(viewport))
        }

        fn detach_surface(&mut self, _renderer: NullRenderer) {
            *self.attached.borrow_mut() -= 1;
        }

        fn request_frame(&self) {
            *self.frames.borrow_mut() += 1;
        }

        fn asset_waker(&self) -> AssetWaker {
            Box::new(|| {})
        }
    }

    #[test]
    fn test_attach_and_detach_surface() {
        let mut host = MockHost {
            size: Viewport::new(320, 200),
            attached: RefCell::new(0),
            frames: RefCell::new(0),
        };

        let size = host.container_size();
        let renderer = host.attach_surface(size, &ViewerConfig::default()).unwrap();
        assert_eq!(renderer.viewport(), Viewport::new(320, 200));
        assert_eq!(*host.attached.borrow(), 1);

        host.detach_surface(renderer);
        assert_eq!(*host.attached.borrow(), 0);
    }

    #[test]
    fn test_request_frame_counts() {
        let host = MockHost {
            size: Viewport::new(1, 1),
            attached: RefCell::new(0),
            frames: RefCell::new(0),
        };
        host.request_frame();
        host.request_frame();
        assert_eq!(*host.frames.borrow(), 2);
    }
}
