use crate::camera::PerspectiveCamera;
use crate::config::{BloomConfig, BloomMode};
use crate::scene::SceneState;
use crate::traits::Viewport;

use super::bloom::{BloomPass, BloomSettings, HDR_FORMAT};
use super::scene_pass::{ScenePass, SceneResources};

/// Where a step writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Off-screen HDR buffer owned by the bloom composer
    Intermediate,
    /// The presented surface
    Screen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStep {
    /// Clear `Target` and draw the scene into it
    RenderScene(Target),
    /// High-pass, blur and composite from the intermediate render
    Bloom,
    /// Add the bloom result onto `Target`
    BlendBloom(Target),
}

/// Ordered steps one frame executes
///
/// The bloom composer runs first, then the final composer draws the scene a
/// second time straight to the screen. The bloom output reaches the screen
/// only in `BloomMode::Composited`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositorPlan {
    steps: Vec<RenderStep>,
}

impl CompositorPlan {
    pub fn new(mode: BloomMode) -> Self {
        let mut steps = vec![
            // Bloom composer
            RenderStep::RenderScene(Target::Intermediate),
            RenderStep::Bloom,
            RenderStep::BlendBloom(Target::Intermediate),
            // Final composer
            RenderStep::RenderScene(Target::Screen),
        ];
        if mode == BloomMode::Composited {
            steps.push(RenderStep::BlendBloom(Target::Screen));
        }
        Self { steps }
    }

    pub fn steps(&self) -> &[RenderStep] {
        &self.steps
    }

    /// Whether anything from the bloom chain ends up on screen
    pub fn bloom_visible(&self) -> bool {
        self.steps.contains(&RenderStep::BlendBloom(Target::Screen))
    }

    pub fn scene_renders(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, RenderStep::RenderScene(_)))
            .count()
    }
}

/// Both composers plus the resources they share
pub struct Compositor {
    plan: CompositorPlan,
    resources: SceneResources,
    hdr_pass: ScenePass,
    screen_pass: ScenePass,
    hdr_view: wgpu::TextureView,
    bloom: BloomPass,
}

impl Compositor {
    pub fn new(
        device: &wgpu::Device,
        viewport: Viewport,
        surface_format: wgpu::TextureFormat,
        bloom: &BloomConfig,
    ) -> Self {
        let plan = CompositorPlan::new(bloom.mode);
        let resources = SceneResources::new(device, viewport);
        let hdr_pass = ScenePass::new(device, &resources, HDR_FORMAT, "Bloom Composer Scene Pass");
        let screen_pass = ScenePass::new(device, &resources, surface_format, "Final Composer Scene Pass");

        let (width, height) = viewport.texture_extent();
        let hdr_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Bloom Composer Target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HDR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let hdr_view = hdr_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let blend_format = plan.bloom_visible().then_some(surface_format);
        let bloom = BloomPass::new(device, BloomSettings::new(bloom, viewport), &hdr_view, blend_format);

        log::debug!("Compositor plan: {:?}", plan.steps());

        Self {
            plan,
            resources,
            hdr_pass,
            screen_pass,
            hdr_view,
            bloom,
        }
    }

    pub fn plan(&self) -> &CompositorPlan {
        &self.plan
    }

    /// Record and submit one frame onto `surface_view`
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_view: &wgpu::TextureView,
        scene: &SceneState,
        camera: &PerspectiveCamera,
    ) {
        self.resources.prepare(device, queue, scene, camera);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });

        for step in self.plan.steps() {
            match step {
                RenderStep::RenderScene(Target::Intermediate) => {
                    self.hdr_pass.record(&mut encoder, &self.hdr_view, &self.resources)
                }
                RenderStep::RenderScene(Target::Screen) => {
                    self.screen_pass.record(&mut encoder, surface_view, &self.resources)
                }
                RenderStep::Bloom => self.bloom.record(&mut encoder),
                RenderStep::BlendBloom(Target::Intermediate) => {
                    self.bloom.blend_into(&mut encoder, &self.hdr_view)
                }
                RenderStep::BlendBloom(Target::Screen) => {
                    self.bloom.blend_onto_surface(&mut encoder, surface_view)
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bloom_composer_runs_before_final_composer() {
        let plan = CompositorPlan::new(BloomMode::Discarded);
        let intermediate = plan
            .steps()
            .iter()
            .position(|s| *s == RenderStep::RenderScene(Target::Intermediate))
            .unwrap();
        let bloom = plan.steps().iter().position(|s| *s == RenderStep::Bloom).unwrap();
        let screen = plan
            .steps()
            .iter()
            .position(|s| *s == RenderStep::RenderScene(Target::Screen))
            .unwrap();
        assert!(intermediate < bloom);
        assert!(bloom < screen);
    }

    #[test]
    fn test_scene_is_drawn_twice_per_frame() {
        assert_eq!(CompositorPlan::new(BloomMode::Discarded).scene_renders(), 2);
        assert_eq!(CompositorPlan::new(BloomMode::Composited).scene_renders(), 2);
    }

    #[test]
    fn test_discarded_bloom_never_reaches_screen() {
        let plan = CompositorPlan::new(BloomMode::Discarded);
        assert!(!plan.bloom_visible());
        assert_eq!(plan.steps().last(), Some(&RenderStep::RenderScene(Target::Screen)));
    }

    #[test]
    fn test_composited_bloom_blends_after_final_render() {
        let plan = CompositorPlan::new(BloomMode::Composited);
        assert!(plan.bloom_visible());
        assert_eq!(plan.steps().last(), Some(&RenderStep::BlendBloom(Target::Screen)));
    }
}
