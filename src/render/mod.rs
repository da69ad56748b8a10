pub mod bloom;
pub mod composer;
pub mod gpu_context;
pub mod scene_pass;
pub mod surface_renderer;

pub use bloom::{BloomPass, BloomSettings};
pub use composer::{Compositor, CompositorPlan, RenderStep, Target};
pub use gpu_context::GpuContext;
pub use surface_renderer::SurfaceRenderer;
