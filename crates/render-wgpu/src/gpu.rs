use crate::mesh::{self, InstanceData, Vertex};
use crate::shaders;
use boxroll_common::GridCell;
use boxroll_puzzle::Level;
use boxroll_render::{FrameInput, FramePasses, FrameSchedule, TargetId};
use boxroll_scene::{LightRig, OrbitCamera};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

const SHADOW_MAP_SIZE: u32 = 1024;
const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    light_view_proj: [[f32; 4]; 4],
    inv_view_proj: [[f32; 4]; 4],
    light_dir: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct PostParams {
    time: f32,
    effect: u32,
    _pad: [f32; 2],
}

/// wgpu scene renderer: one cube mesh drawn instanced for the box and every
/// floor cell, through the shadow → beauty → post schedule.
pub struct SceneRenderer {
    shadow_pipeline: wgpu::RenderPipeline,
    solid_pipeline: wgpu::RenderPipeline,
    sky_pipeline: wgpu::RenderPipeline,
    post_pipeline: wgpu::RenderPipeline,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    shadow_bind_group: wgpu::BindGroup,
    post_params_buffer: wgpu::Buffer,
    post_layout: wgpu::BindGroupLayout,
    post_bind_group: wgpu::BindGroup,
    post_sampler: wgpu::Sampler,
    cube_vertex_buffer: wgpu::Buffer,
    cube_index_buffer: wgpu::Buffer,
    cube_index_count: u32,
    instance_buffer: wgpu::Buffer,
    max_instances: u32,
    shadow_view: wgpu::TextureView,
    offscreen_color: wgpu::TextureView,
    offscreen_depth: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals_buffer"),
            contents: bytemuck::bytes_of(&Globals {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                light_view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                inv_view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                light_dir: [0.0, -1.0, 0.0, 0.0],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bind_group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        // Shadow map, sampled with a comparison sampler by the beauty pass.
        let shadow_view = create_depth_texture(
            device,
            "shadow_map",
            SHADOW_MAP_SIZE,
            SHADOW_MAP_SIZE,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );

        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow_bind_group"),
            layout: &shadow_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&shadow_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&shadow_sampler),
                },
            ],
        });

        // Post pass inputs: params uniform + off-screen color.
        let post_params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("post_params_buffer"),
            contents: bytemuck::bytes_of(&PostParams {
                time: 0.0,
                effect: 0,
                _pad: [0.0; 2],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let post_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("post_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        let post_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("post_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
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

        let (offscreen_color, offscreen_depth) = create_offscreen_targets(device, width, height);
        let post_bind_group = create_post_bind_group(
            device,
            &post_layout,
            &post_params_buffer,
            &offscreen_color,
            &post_sampler,
        );

        // Pipelines
        let solid_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("solid_pipeline_layout"),
            bind_group_layouts: &[&globals_layout, &shadow_layout],
            push_constant_ranges: &[],
        });
        let globals_only_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("globals_pipeline_layout"),
                bind_group_layouts: &[&globals_layout],
                push_constant_ranges: &[],
            });
        let post_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("post_pipeline_layout"),
                bind_group_layouts: &[&post_layout],
                push_constant_ranges: &[],
            });

        let vertex_layouts = [
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![
                    0 => Float32x3,
                    1 => Float32x3,
                ],
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<InstanceData>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &wgpu::vertex_attr_array![
                    2 => Float32x4,
                    3 => Float32x4,
                    4 => Float32x4,
                    5 => Float32x4,
                    6 => Float32x4,
                ],
            },
        ];

        let shadow_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shadow_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SHADOW_SHADER.into()),
        });
        let shadow_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shadow_pipeline"),
            layout: Some(&globals_only_layout),
            vertex: wgpu::VertexState {
                module: &shadow_shader,
                entry_point: Some("vs_shadow"),
                compilation_options: Default::default(),
                buffers: &vertex_layouts,
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
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

        let solid_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("solid_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SOLID_SHADER.into()),
        });
        let solid_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("solid_pipeline"),
            layout: Some(&solid_layout),
            vertex: wgpu::VertexState {
                module: &solid_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &vertex_layouts,
            },
            fragment: Some(wgpu::FragmentState {
                module: &solid_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: OFFSCREEN_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
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

        let sky_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sky_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SKY_SHADER.into()),
        });
        let sky_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sky_pipeline"),
            layout: Some(&globals_only_layout),
            vertex: wgpu::VertexState {
                module: &sky_shader,
                entry_point: Some("vs_sky"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &sky_shader,
                entry_point: Some("fs_sky"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: OFFSCREEN_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            // The sky sits at maximum depth behind everything already drawn.
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let post_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("post_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::POST_SHADER.into()),
        });
        let post_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("post_pipeline"),
            layout: Some(&post_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &post_shader,
                entry_point: Some("vs_post"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &post_shader,
                entry_point: Some("fs_post"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Cube mesh, shared by the box and the floor cells.
        let (cube_verts, cube_indices) = mesh::cube_mesh();
        let cube_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_vertex_buffer"),
            contents: bytemuck::cast_slice(&cube_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let cube_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_index_buffer"),
            contents: bytemuck::cast_slice(&cube_indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let cube_index_count = cube_indices.len() as u32;

        // Sized for the built-in map; grown in `render` when a loaded level
        // needs more.
        let max_instances = 64u32;
        let instance_buffer = create_instance_buffer(device, max_instances);

        Self {
            shadow_pipeline,
            solid_pipeline,
            sky_pipeline,
            post_pipeline,
            globals_buffer,
            globals_bind_group,
            shadow_bind_group,
            post_params_buffer,
            post_layout,
            post_bind_group,
            post_sampler,
            cube_vertex_buffer,
            cube_index_buffer,
            cube_index_count,
            instance_buffer,
            max_instances,
            shadow_view,
            offscreen_color,
            offscreen_depth,
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        tracing::debug!(width, height, "recreating offscreen targets");
        let (color, depth) = create_offscreen_targets(device, width, height);
        self.offscreen_color = color;
        self.offscreen_depth = depth;
        self.post_bind_group = create_post_bind_group(
            device,
            &self.post_layout,
            &self.post_params_buffer,
            &self.offscreen_color,
            &self.post_sampler,
        );
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Render one frame through the fixed pass schedule.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_view: &wgpu::TextureView,
        camera: &OrbitCamera,
        light: &LightRig,
        level: &Level,
        input: FrameInput,
        schedule: &mut FrameSchedule,
    ) {
        let view_proj = camera.view_projection();
        queue.write_buffer(
            &self.globals_buffer,
            0,
            bytemuck::bytes_of(&Globals {
                view_proj: view_proj.to_cols_array_2d(),
                light_view_proj: light.view_projection_at(input.time).to_cols_array_2d(),
                inv_view_proj: view_proj.inverse().to_cols_array_2d(),
                light_dir: light.direction_at(input.time).extend(0.0).to_array(),
            }),
        );
        queue.write_buffer(
            &self.post_params_buffer,
            0,
            bytemuck::bytes_of(&PostParams {
                time: input.time,
                effect: input.effect_on as u32,
                _pad: [0.0; 2],
            }),
        );

        let instances = build_instances(level, input.box_xform);
        if instances.len() as u32 > self.max_instances {
            let capacity = (instances.len() as u32).next_power_of_two();
            tracing::debug!(capacity, "growing instance buffer");
            self.instance_buffer = create_instance_buffer(device, capacity);
            self.max_instances = capacity;
        }
        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });
        let mut frame = EncodedFrame {
            renderer: &*self,
            encoder: &mut encoder,
            surface_view,
            instance_count: instances.len() as u32,
        };
        schedule.run_frame(&mut frame);

        queue.submit(std::iter::once(encoder.finish()));
    }
}

/// Build per-frame instances: floor cell slabs, the win marker, and the
/// box with its (possibly mid-roll) transform. The box is always last.
fn build_instances(level: &Level, box_xform: Mat4) -> Vec<InstanceData> {
    let cell = level.cell_size;
    let thickness = cell * 0.25;
    let win = level.win_cell();

    let mut instances = Vec::with_capacity(level.cells.len() + 1);
    let mut seen = Vec::new();
    for pos in &level.cells {
        let grid = GridCell::from_world(*pos);
        if seen.contains(&grid) {
            continue;
        }
        seen.push(grid);
        let center = grid.to_world() - Vec3::new(0.0, cell * 0.5 + thickness * 0.5, 0.0);
        let model =
            Mat4::from_translation(center) * Mat4::from_scale(Vec3::new(cell, thickness, cell));
        let color = if grid == win {
            [0.95, 0.78, 0.22, 1.0] // gold win marker
        } else {
            [0.55, 0.57, 0.62, 1.0]
        };
        instances.push(InstanceData::new(model, color));
    }

    let model = box_xform * Mat4::from_scale(Vec3::splat(cell));
    instances.push(InstanceData::new(model, BOX_COLOR));
    instances
}

const BOX_COLOR: [f32; 4] = [0.82, 0.35, 0.28, 1.0];

fn create_instance_buffer(device: &wgpu::Device, capacity: u32) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("instance_buffer"),
        size: (capacity as u64) * std::mem::size_of::<InstanceData>() as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// One frame's pass implementations, submitted in schedule order.
struct EncodedFrame<'a> {
    renderer: &'a SceneRenderer,
    encoder: &'a mut wgpu::CommandEncoder,
    surface_view: &'a wgpu::TextureView,
    instance_count: u32,
}

impl EncodedFrame<'_> {
    fn draw_instanced(&mut self, pass: &mut wgpu::RenderPass<'_>) {
        let r = self.renderer;
        pass.set_vertex_buffer(0, r.cube_vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, r.instance_buffer.slice(..));
        pass.set_index_buffer(r.cube_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..r.cube_index_count, 0, 0..self.instance_count);
    }
}

impl FramePasses for EncodedFrame<'_> {
    fn shadow(&mut self, target: TargetId) {
        debug_assert_eq!(target, TargetId::ShadowMap);
        let r = self.renderer;
        let mut pass = self
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shadow_pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &r.shadow_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            })
            .forget_lifetime();
        pass.set_pipeline(&r.shadow_pipeline);
        pass.set_bind_group(0, &r.globals_bind_group, &[]);
        self.draw_instanced(&mut pass);
    }

    fn beauty(&mut self, target: TargetId) {
        debug_assert_eq!(target, TargetId::Offscreen);
        let r = self.renderer;
        let mut pass = self
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("beauty_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &r.offscreen_color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &r.offscreen_depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            })
            .forget_lifetime();

        pass.set_pipeline(&r.solid_pipeline);
        pass.set_bind_group(0, &r.globals_bind_group, &[]);
        pass.set_bind_group(1, &r.shadow_bind_group, &[]);
        self.draw_instanced(&mut pass);

        pass.set_pipeline(&r.sky_pipeline);
        pass.set_bind_group(0, &r.globals_bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    fn post(&mut self, target: TargetId) {
        debug_assert_eq!(target, TargetId::Surface);
        let r = self.renderer;
        let mut pass = self
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("post_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.surface_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            })
            .forget_lifetime();
        pass.set_pipeline(&r.post_pipeline);
        pass.set_bind_group(0, &r.post_bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

fn create_depth_texture(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    usage: wgpu::TextureUsages,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

fn create_offscreen_targets(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> (wgpu::TextureView, wgpu::TextureView) {
    let color = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("offscreen_color"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: OFFSCREEN_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let depth = create_depth_texture(
        device,
        "offscreen_depth",
        width,
        height,
        wgpu::TextureUsages::RENDER_ATTACHMENT,
    );
    (color.create_view(&Default::default()), depth)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_level(cells: usize) -> Level {
        let cells = (0..cells)
            .map(|x| Vec3::new(x as f32 * 0.4, 0.0, 0.0))
            .collect();
        Level {
            cell_size: 0.4,
            start: Vec3::ZERO,
            win: Vec3::ZERO,
            cells,
        }
    }

    #[test]
    fn instances_cover_every_cell_plus_the_box() {
        // Levels larger than the initial buffer still get a box instance;
        // `render` grows the buffer to fit.
        let level = strip_level(70);
        let instances = build_instances(&level, Mat4::IDENTITY);
        assert_eq!(instances.len(), 71);
        assert_eq!(instances.last().unwrap().color, BOX_COLOR);
    }

    #[test]
    fn duplicate_cells_collapse_to_one_slab() {
        // The built-in map lists one cell twice; it draws once.
        let level = Level::default();
        let instances = build_instances(&level, Mat4::IDENTITY);
        assert_eq!(instances.len(), 13);
        assert_eq!(instances.last().unwrap().color, BOX_COLOR);
    }

    #[test]
    fn box_instance_carries_the_scaled_roll_transform() {
        let level = strip_level(3);
        let xform = Mat4::from_translation(Vec3::new(0.4, 0.0, 0.0));
        let instances = build_instances(&level, xform);
        let expected = xform * Mat4::from_scale(Vec3::splat(level.cell_size));
        let cols = expected.to_cols_array_2d();
        let last = instances.last().unwrap();
        assert_eq!(last.model_0, cols[0]);
        assert_eq!(last.model_3, cols[3]);
    }
}

fn create_post_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    params: &wgpu::Buffer,
    scene_color: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("post_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: params.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(scene_color),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}
