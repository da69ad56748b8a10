//! Unreal-style bloom: luminosity high-pass, five mips of separable gaussian
//! blur, a weighted mip composite, then an additive copy onto a target.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::config::BloomConfig;
use crate::traits::Viewport;

pub const MIP_COUNT: usize = 5;
pub const KERNEL_RADII: [u32; MIP_COUNT] = [3, 5, 7, 9, 11];
pub const BLOOM_FACTORS: [f32; MIP_COUNT] = [1.0, 0.8, 0.6, 0.4, 0.2];
/// Width of the smoothstep above the luminosity threshold
pub const SMOOTH_WIDTH: f32 = 0.01;
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Bloom parameters plus the derived per-mip values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomSettings {
    pub strength: f32,
    pub radius: f32,
    pub threshold: f32,
    /// Full resolution the pass was built for
    pub resolution: Viewport,
}

impl BloomSettings {
    pub fn new(config: &BloomConfig, resolution: Viewport) -> Self {
        Self {
            strength: config.strength,
            radius: config.radius,
            threshold: config.threshold,
            resolution,
        }
    }

    /// Sizes of the blur mips: half resolution, then halved again per level
    pub fn mip_sizes(&self) -> [(u32, u32); MIP_COUNT] {
        let mut sizes = [(1, 1); MIP_COUNT];
        let mut w = half(self.resolution.width);
        let mut h = half(self.resolution.height);
        for size in sizes.iter_mut() {
            *size = (w.max(1), h.max(1));
            w = half(w);
            h = half(h);
        }
        sizes
    }

    /// Per-mip composite weight: strength * mix(f, 1.2 - f, radius)
    pub fn mip_weights(&self) -> [f32; MIP_COUNT] {
        BLOOM_FACTORS.map(|f| self.strength * (f + (1.2 - f - f) * self.radius))
    }
}

/// Rounded half, matching how the mip chain is sized
fn half(v: u32) -> u32 {
    (v + 1) / 2
}

/// Normalized gaussian weights for taps 0..radius (one side, centre first)
pub fn gaussian_weights(kernel_radius: u32) -> Vec<f32> {
    let sigma = kernel_radius as f32;
    let pdf = |x: f32| 0.39894 * (-0.5 * x * x / (sigma * sigma)).exp() / sigma;
    let raw: Vec<f32> = (0..kernel_radius).map(|i| pdf(i as f32)).collect();
    let total = raw[0] + 2.0 * raw[1..].iter().sum::<f32>();
    raw.into_iter().map(|w| w / total).collect()
}

/// Uniform shared by the high-pass, blur and copy shaders
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct PassParams {
    v0: [f32; 4],
    v1: [f32; 4],
}

impl PassParams {
    fn high_pass(threshold: f32) -> Self {
        Self {
            v0: [threshold, SMOOTH_WIDTH, 0.0, 0.0],
            v1: [0.0; 4],
        }
    }

    fn blur(direction: [f32; 2], size: (u32, u32), kernel_radius: u32) -> Self {
        Self {
            v0: [direction[0], direction[1], 1.0 / size.0 as f32, 1.0 / size.1 as f32],
            v1: [kernel_radius as f32, 0.0, 0.0, 0.0],
        }
    }

    fn copy(opacity: f32) -> Self {
        Self {
            v0: [opacity, 0.0, 0.0, 0.0],
            v1: [0.0; 4],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct CompositeParams {
    weights: [f32; 4],
    last_weight: f32,
    _pad: [f32; 3],
}

struct RenderTarget {
    view: wgpu::TextureView,
}

impl RenderTarget {
    fn new(device: &wgpu::Device, label: &str, (width, height): (u32, u32)) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
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
        Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
        }
    }
}

/// One fullscreen draw: bind group in, target out
struct Step {
    label: &'static str,
    bind_group: wgpu::BindGroup,
    target: usize,
}

/// GPU side of the bloom effect for a fixed resolution
pub struct BloomPass {
    targets: Vec<RenderTarget>,
    steps: Vec<Step>,
    high_pass_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    composite_bind_group: wgpu::BindGroup,
    copy_bind_group: wgpu::BindGroup,
    blend_hdr_pipeline: wgpu::RenderPipeline,
    blend_surface_pipeline: Option<wgpu::RenderPipeline>,
}

// Indices into `targets`
const BRIGHT: usize = 0;
const OUTPUT: usize = 1;
const fn horizontal(i: usize) -> usize {
    2 + i
}
const fn vertical(i: usize) -> usize {
    2 + MIP_COUNT + i
}

impl BloomPass {
    /// Build all targets and pipelines
    ///
    /// `input` is the scene render the bloom reads from. A surface format is
    /// only needed when the result is also blended onto the screen.
    pub fn new(
        device: &wgpu::Device,
        settings: BloomSettings,
        input: &wgpu::TextureView,
        surface_format: Option<wgpu::TextureFormat>,
    ) -> Self {
        let sizes = settings.mip_sizes();

        let mut targets = vec![
            RenderTarget::new(device, "Bloom Bright", sizes[0]),
            RenderTarget::new(device, "Bloom Output", sizes[0]),
        ];
        for (i, &size) in sizes.iter().enumerate() {
            targets.push(RenderTarget::new(device, &format!("Bloom Horizontal {}", i), size));
        }
        for (i, &size) in sizes.iter().enumerate() {
            targets.push(RenderTarget::new(device, &format!("Bloom Vertical {}", i), size));
        }

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Bloom Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let pass_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Pass Layout"),
            entries: &[texture_entry(0), sampler_entry(1), uniform_entry(2)],
        });
        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Composite Layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                texture_entry(2),
                texture_entry(3),
                texture_entry(4),
                sampler_entry(5),
                uniform_entry(6),
            ],
        });

        let pass_bind_group = |label: &str, view: &wgpu::TextureView, params: PassParams| {
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::bytes_of(&params),
                usage: wgpu::BufferUsages::UNIFORM,
            });
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &pass_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: buffer.as_entire_binding(),
                    },
                ],
            })
        };

        let mut steps = vec![Step {
            label: "Bloom High Pass",
            bind_group: pass_bind_group("Bloom High Pass", input, PassParams::high_pass(settings.threshold)),
            target: BRIGHT,
        }];
        for i in 0..MIP_COUNT {
            let source = if i == 0 { BRIGHT } else { vertical(i - 1) };
            steps.push(Step {
                label: "Bloom Blur Horizontal",
                bind_group: pass_bind_group(
                    "Bloom Blur Horizontal",
                    &targets[source].view,
                    PassParams::blur([1.0, 0.0], sizes[i], KERNEL_RADII[i]),
                ),
                target: horizontal(i),
            });
            steps.push(Step {
                label: "Bloom Blur Vertical",
                bind_group: pass_bind_group(
                    "Bloom Blur Vertical",
                    &targets[horizontal(i)].view,
                    PassParams::blur([0.0, 1.0], sizes[i], KERNEL_RADII[i]),
                ),
                target: vertical(i),
            });
        }

        let weights = settings.mip_weights();
        let composite_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Bloom Composite Params"),
            contents: bytemuck::bytes_of(&CompositeParams {
                weights: [weights[0], weights[1], weights[2], weights[3]],
                last_weight: weights[4],
                _pad: [0.0; 3],
            }),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let mut composite_entries: Vec<wgpu::BindGroupEntry> = (0..MIP_COUNT)
            .map(|i| wgpu::BindGroupEntry {
                binding: i as u32,
                resource: wgpu::BindingResource::TextureView(&targets[vertical(i)].view),
            })
            .collect();
        composite_entries.push(wgpu::BindGroupEntry {
            binding: 5,
            resource: wgpu::BindingResource::Sampler(&sampler),
        });
        composite_entries.push(wgpu::BindGroupEntry {
            binding: 6,
            resource: composite_buffer.as_entire_binding(),
        });
        let composite_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bloom Composite Bind Group"),
            layout: &composite_layout,
            entries: &composite_entries,
        });

        let copy_bind_group = pass_bind_group("Bloom Copy", &targets[OUTPUT].view, PassParams::copy(1.0));

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Bloom Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/bloom.wgsl").into()),
        });
        let composite_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Bloom Composite Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/bloom_composite.wgsl").into()),
        });

        let pass_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bloom Pass Pipeline Layout"),
            bind_group_layouts: &[&pass_layout],
            push_constant_ranges: &[],
        });
        let composite_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bloom Composite Pipeline Layout"),
            bind_group_layouts: &[&composite_layout],
            push_constant_ranges: &[],
        });

        let high_pass_pipeline = fullscreen_pipeline(
            device, "Bloom High Pass Pipeline", &pass_pipeline_layout, &shader, "fs_high_pass", HDR_FORMAT, None,
        );
        let blur_pipeline = fullscreen_pipeline(
            device, "Bloom Blur Pipeline", &pass_pipeline_layout, &shader, "fs_blur", HDR_FORMAT, None,
        );
        let composite_pipeline = fullscreen_pipeline(
            device,
            "Bloom Composite Pipeline",
            &composite_pipeline_layout,
            &composite_shader,
            "fs_composite",
            HDR_FORMAT,
            None,
        );
        let blend_hdr_pipeline = fullscreen_pipeline(
            device,
            "Bloom Blend Pipeline",
            &pass_pipeline_layout,
            &shader,
            "fs_copy",
            HDR_FORMAT,
            Some(ADDITIVE),
        );
        let blend_surface_pipeline = surface_format.map(|format| {
            fullscreen_pipeline(
                device,
                "Bloom Surface Blend Pipeline",
                &pass_pipeline_layout,
                &shader,
                "fs_copy",
                format,
                Some(ADDITIVE),
            )
        });

        Self {
            targets,
            steps,
            high_pass_pipeline,
            blur_pipeline,
            composite_pipeline,
            composite_bind_group,
            copy_bind_group,
            blend_hdr_pipeline,
            blend_surface_pipeline,
        }
    }

    /// High-pass, blur chain and composite into the bloom output target
    pub fn record(&self, encoder: &mut wgpu::CommandEncoder) {
        for (i, step) in self.steps.iter().enumerate() {
            let pipeline = if i == 0 {
                &self.high_pass_pipeline
            } else {
                &self.blur_pipeline
            };
            draw_fullscreen(encoder, step.label, &self.targets[step.target].view, pipeline, &step.bind_group);
        }
        draw_fullscreen(
            encoder,
            "Bloom Composite",
            &self.targets[OUTPUT].view,
            &self.composite_pipeline,
            &self.composite_bind_group,
        );
    }

    /// Add the bloom output onto an HDR target (the composer's read buffer)
    pub fn blend_into(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        blend(encoder, "Bloom Blend", target, &self.blend_hdr_pipeline, &self.copy_bind_group);
    }

    /// Add the bloom output onto the presented surface
    ///
    /// No-op when the pass was built without a surface format.
    pub fn blend_onto_surface(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        if let Some(pipeline) = &self.blend_surface_pipeline {
            blend(encoder, "Bloom Surface Blend", target, pipeline, &self.copy_bind_group);
        }
    }
}

const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

fn draw_fullscreen(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
) {
    fullscreen(encoder, label, target, pipeline, bind_group, wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT));
}

fn blend(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
) {
    fullscreen(encoder, label, target, pipeline, bind_group, wgpu::LoadOp::Load);
}

fn fullscreen(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
    load: wgpu::LoadOp<wgpu::Color>,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1); // Fullscreen triangle
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    fragment_entry: &str,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_fullscreen"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}
