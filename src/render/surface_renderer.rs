use anyhow::{Context, Result};
use std::sync::Arc;
use wgpu::{Surface, SurfaceConfiguration};
use winit::window::Window;

use super::composer::Compositor;
use super::gpu_context::GpuContext;
use crate::camera::PerspectiveCamera;
use crate::config::ViewerConfig;
use crate::scene::SceneState;
use crate::traits::{FrameRenderer, Viewport};

/// Transparent window surface driven by the two-composer pipeline
pub struct SurfaceRenderer {
    gpu: GpuContext,
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    compositor: Compositor,
    viewport: Viewport,
}

impl SurfaceRenderer {
    /// Create a surface of exactly `viewport` on `window`
    pub async fn new(window: Arc<Window>, viewport: Viewport, config: &ViewerConfig) -> Result<Self> {
        let instance = GpuContext::instance();
        let surface = instance
            .create_surface(window)
            .context("Failed to create window surface")?;
        let gpu = GpuContext::new_with_surface(&instance, &surface).await?;

        let caps = surface.get_capabilities(gpu.adapter());
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| caps.formats.first().copied())
            .context("Surface reports no supported formats")?;
        let alpha_mode = choose_alpha_mode(&caps.alpha_modes);
        log::debug!("Surface format {:?}, alpha mode {:?}", format, alpha_mode);

        let (width, height) = viewport.texture_extent();
        let surface_config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(gpu.device(), &surface_config);

        let compositor = Compositor::new(gpu.device(), viewport, format, &config.bloom);

        Ok(Self {
            gpu,
            surface,
            surface_config,
            compositor,
            viewport,
        })
    }
}

/// Prefer a mode that lets transparent pixels show what is behind the window
fn choose_alpha_mode(modes: &[wgpu::CompositeAlphaMode]) -> wgpu::CompositeAlphaMode {
    [
        wgpu::CompositeAlphaMode::PreMultiplied,
        wgpu::CompositeAlphaMode::PostMultiplied,
    ]
    .into_iter()
    .find(|m| modes.contains(m))
    .or_else(|| modes.first().copied())
    .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

impl FrameRenderer for SurfaceRenderer {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn render(&mut self, scene: &SceneState, camera: &PerspectiveCamera) -> Result<()> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated; reconfiguring and skipping frame");
                self.surface.configure(self.gpu.device(), &self.surface_config);
                return Ok(());
            }
            Err(e) => return Err(e).context("Failed to acquire surface texture"),
        };
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        self.compositor
            .render(self.gpu.device(), self.gpu.queue(), &view, scene, camera);
        frame.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::CompositeAlphaMode;

    #[test]
    fn test_alpha_mode_prefers_premultiplied() {
        let modes = [
            CompositeAlphaMode::Opaque,
            CompositeAlphaMode::PostMultiplied,
            CompositeAlphaMode::PreMultiplied,
        ];
        assert_eq!(choose_alpha_mode(&modes), CompositeAlphaMode::PreMultiplied);
    }

    #[test]
    fn test_alpha_mode_falls_back_to_first() {
        assert_eq!(choose_alpha_mode(&[CompositeAlphaMode::Opaque]), CompositeAlphaMode::Opaque);
        assert_eq!(choose_alpha_mode(&[]), CompositeAlphaMode::Auto);
    }
}
