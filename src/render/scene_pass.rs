use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::camera::PerspectiveCamera;
use crate::scene::{Model, SceneState, TextureData, Vertex};
use crate::traits::Viewport;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    ambient: [f32; 4],
    light_dir: [f32; 4],
    light_color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct MaterialUniforms {
    base_color: [f32; 4],
    emissive: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct DrawUniforms {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 4],
}

impl DrawUniforms {
    fn new(world: Mat4) -> Self {
        Self {
            model: world.to_cols_array_2d(),
            normal: world.inverse().transpose().to_cols_array_2d(),
        }
    }
}

struct GpuPrimitive {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    material: usize,
}

struct GpuDraw {
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    primitives: Vec<usize>,
}

/// Model data uploaded once, right after the model shows up in the scene
struct GpuModel {
    primitives: Vec<GpuPrimitive>,
    /// Last entry is the default material
    materials: Vec<wgpu::BindGroup>,
    draws: Vec<GpuDraw>,
}

/// Buffers and layouts shared by every scene render of a frame
pub struct SceneResources {
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    frame_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    draw_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    depth_view: wgpu::TextureView,
    model: Option<GpuModel>,
}

impl SceneResources {
    pub fn new(device: &wgpu::Device, viewport: Viewport) -> Self {
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Frame Uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Frame Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT)],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Material Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Draw Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Frame Bind Group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Scene Texture Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            frame_buffer,
            frame_bind_group,
            frame_layout,
            material_layout,
            draw_layout,
            sampler,
            depth_view: create_depth_view(device, viewport),
            model: None,
        }
    }

    /// Write this frame's camera, lights and node transforms
    ///
    /// Uploads the model the first time it is seen.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &SceneState,
        camera: &PerspectiveCamera,
    ) {
        let d = scene.directional.direction();
        let uniforms = FrameUniforms {
            view_proj: camera.view_projection().to_cols_array_2d(),
            ambient: extend(scene.ambient.color),
            light_dir: [d.x, d.y, d.z, 0.0],
            light_color: extend(scene.directional.color),
        };
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&uniforms));

        let Some(model) = scene.model() else {
            return;
        };
        if self.model.is_none() {
            self.model = Some(self.upload(device, queue, model));
        }
        if let Some(gpu_model) = &self.model {
            for (draw, item) in gpu_model.draws.iter().zip(model.draw_items()) {
                queue.write_buffer(
                    &draw.uniform_buffer,
                    0,
                    bytemuck::bytes_of(&DrawUniforms::new(item.world)),
                );
            }
        }
    }

    fn upload(&self, device: &wgpu::Device, queue: &wgpu::Queue, model: &Model) -> GpuModel {
        let textures: Vec<wgpu::TextureView> = model
            .textures
            .iter()
            .map(|t| upload_texture(device, queue, t))
            .collect();
        let white = upload_texture(device, queue, &TextureData::white());

        let mut materials: Vec<wgpu::BindGroup> = model
            .materials
            .iter()
            .map(|m| {
                let view = m
                    .base_color_texture
                    .and_then(|i| textures.get(i))
                    .unwrap_or(&white);
                self.material_bind_group(device, m.base_color, m.emissive, view)
            })
            .collect();
        let default_material = materials.len();
        let fallback = crate::scene::Material::default();
        materials.push(self.material_bind_group(device, fallback.base_color, fallback.emissive, &white));

        let mut primitives = Vec::new();
        let mut mesh_primitives: Vec<Vec<usize>> = Vec::with_capacity(model.meshes.len());
        for mesh in &model.meshes {
            let mut ids = Vec::new();
            for p in &mesh.primitives {
                ids.push(primitives.len());
                primitives.push(GpuPrimitive {
                    vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Model Vertex Buffer"),
                        contents: bytemuck::cast_slice(&p.vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                    index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Model Index Buffer"),
                        contents: bytemuck::cast_slice(&p.indices),
                        usage: wgpu::BufferUsages::INDEX,
                    }),
                    index_count: p.indices.len() as u32,
                    material: p
                        .material
                        .filter(|&i| i < default_material)
                        .unwrap_or(default_material),
                });
            }
            mesh_primitives.push(ids);
        }

        let draws = model
            .draw_items()
            .into_iter()
            .map(|item| {
                let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Model Draw Uniforms"),
                    contents: bytemuck::bytes_of(&DrawUniforms::new(item.world)),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Model Draw Bind Group"),
                    layout: &self.draw_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    }],
                });
                GpuDraw {
                    uniform_buffer,
                    bind_group,
                    primitives: mesh_primitives.get(item.mesh).cloned().unwrap_or_default(),
                }
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Uploaded model: {} primitives, {} draws, {} textures",
            primitives.len(),
            draws.len(),
            textures.len()
        );

        GpuModel {
            primitives,
            materials,
            draws,
        }
    }

    fn material_bind_group(
        &self,
        device: &wgpu::Device,
        base_color: [f32; 4],
        emissive: [f32; 3],
        view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Material Uniforms"),
            contents: bytemuck::bytes_of(&MaterialUniforms {
                base_color,
                emissive: extend(emissive),
            }),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material Bind Group"),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}

/// Scene render pass for one colour target format
pub struct ScenePass {
    label: &'static str,
    pipeline: wgpu::RenderPipeline,
}

impl ScenePass {
    pub fn new(
        device: &wgpu::Device,
        resources: &SceneResources,
        format: wgpu::TextureFormat,
        label: &'static str,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[
                &resources.frame_layout,
                &resources.material_layout,
                &resources.draw_layout,
            ],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                        2 => Float32x2,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        Self { label, pipeline }
    }

    /// Clear `target` to transparent and draw the scene into it
    pub fn record(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView, resources: &SceneResources) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(self.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &resources.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        // Lights only until the model arrives
        let Some(model) = &resources.model else {
            return;
        };

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &resources.frame_bind_group, &[]);
        for draw in &model.draws {
            pass.set_bind_group(2, &draw.bind_group, &[]);
            for &id in &draw.primitives {
                let primitive = &model.primitives[id];
                pass.set_bind_group(1, &model.materials[primitive.material], &[]);
                pass.set_vertex_buffer(0, primitive.vertex_buffer.slice(..));
                pass.set_index_buffer(primitive.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..primitive.index_count, 0, 0..1);
            }
        }
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn extend(rgb: [f32; 3]) -> [f32; 4] {
    [rgb[0], rgb[1], rgb[2], 1.0]
}

fn create_depth_view(device: &wgpu::Device, viewport: Viewport) -> wgpu::TextureView {
    let (width, height) = viewport.texture_extent();
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Scene Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn upload_texture(device: &wgpu::Device, queue: &wgpu::Queue, data: &TextureData) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: data.width,
        height: data.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Model Texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        texture.as_image_copy(),
        &data.rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * data.width),
            rows_per_image: Some(data.height),
        },
        size,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
