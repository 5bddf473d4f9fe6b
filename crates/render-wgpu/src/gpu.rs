use crate::mesh::{LineVertex, ShapeMesh, Vertex, tessellate};
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use drivescape_common::{Color, NodeId};
use drivescape_render::RenderView;
use drivescape_scene::{Light, Material, MeshDraw, SceneGraph, ShadowCamera, Shading};
use drivescape_textures::{Texture, TextureSet, TextureSlot, Wrap};
use glam::{Mat4, Vec3};
use std::collections::BTreeMap;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    ambient: [f32; 4],
    sun_dir: [f32; 4],
    sun_color: [f32; 4],
    point_pos: [f32; 4],
    point_color: [f32; 4],
    fog_color: [f32; 4],
    fog_params: [f32; 4],
    light_view_proj: [[f32; 4]; 4],
    shadow_params: [f32; 4],
}

/// Per-draw uniforms, padded to the 256-byte dynamic offset alignment.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct ItemUniform {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    color: [f32; 4],
    specular: [f32; 4],
    emissive: [f32; 4],
    params: [f32; 4],
    _pad: [[f32; 4]; 4],
}

const ITEM_STRIDE: u64 = std::mem::size_of::<ItemUniform>() as u64;
const MAX_ITEMS: usize = 1024;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// Light-space depth offset applied when comparing against the shadow map.
const SHADOW_BIAS: f32 = 0.0015;

struct ShadowMap {
    size: u32,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

enum GpuMesh {
    Triangles {
        vertices: wgpu::Buffer,
        indices: wgpu::Buffer,
        index_count: u32,
    },
    Lines {
        vertices: wgpu::Buffer,
        vertex_count: u32,
    },
}

fn linear_rgb(color: Color, scale: f32) -> [f32; 4] {
    let [r, g, b, _] = color.to_linear();
    [r * scale, g * scale, b * scale, 1.0]
}

impl ItemUniform {
    fn new(world: Mat4, material: &Material) -> Self {
        let [r, g, b, _] = material.color.to_linear();
        let (mode, specular) = match material.shading {
            Shading::Lambert => (0.0, [0.0; 4]),
            Shading::Phong {
                shininess,
                specular,
            } => {
                let [sr, sg, sb, _] = specular.to_linear();
                (1.0, [sr, sg, sb, shininess])
            }
            Shading::Unlit => (2.0, [0.0; 4]),
        };
        Self {
            model: world.to_cols_array_2d(),
            normal_matrix: world.inverse().transpose().to_cols_array_2d(),
            color: [r, g, b, material.opacity],
            specular,
            emissive: linear_rgb(material.emissive, material.emissive_intensity),
            params: [
                material.uv_repeat[0],
                material.uv_repeat[1],
                mode,
                if material.receive_shadow { 1.0 } else { 0.0 },
            ],
            _pad: [[0.0; 4]; 4],
        }
    }
}

/// wgpu scene renderer.
///
/// Renders shadow casters into the sun's depth map, then draws opaque meshes,
/// line overlays and finally translucent meshes sorted back to front.
pub struct WgpuRenderer {
    opaque_pipeline: wgpu::RenderPipeline,
    transparent_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    shadow_pipeline: wgpu::RenderPipeline,
    shadow_layout: wgpu::BindGroupLayout,
    shadow_sampler: wgpu::Sampler,
    shadow_map: ShadowMap,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    item_buffer: wgpu::Buffer,
    item_bind_group: wgpu::BindGroup,
    textures: BTreeMap<TextureSlot, wgpu::BindGroup>,
    untextured: wgpu::BindGroup,
    meshes: BTreeMap<NodeId, GpuMesh>,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        textures: &TextureSet,
    ) -> Self {
        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("globals_buffer"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
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

        let item_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("item_buffer"),
            size: ITEM_STRIDE * MAX_ITEMS as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let item_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("item_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(ITEM_STRIDE),
                },
                count: None,
            }],
        });
        let item_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("item_bind_group"),
            layout: &item_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &item_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(ITEM_STRIDE),
                }),
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let textures_by_slot = textures
            .iter()
            .map(|texture| {
                let group = Self::upload_texture(
                    device,
                    queue,
                    &texture_layout,
                    texture.width,
                    texture.height,
                    &texture.pixels,
                    texture.wrap,
                    texture_label(texture),
                );
                (texture.slot, group)
            })
            .collect();
        let untextured = Self::upload_texture(
            device,
            queue,
            &texture_layout,
            1,
            1,
            &[255; 4],
            Wrap::Clamp,
            "white_texture",
        );

        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow_layout"),
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
        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        // Placeholder until `prepare` sees a shadowed sun.
        let shadow_map = Self::create_shadow_map(device, &shadow_layout, &shadow_sampler, 1);

        let mesh_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh_pipeline_layout"),
            bind_group_layouts: &[&globals_layout, &item_layout, &texture_layout, &shadow_layout],
            push_constant_ranges: &[],
        });
        let caster_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shadow_pipeline_layout"),
            bind_group_layouts: &[&globals_layout, &item_layout],
            push_constant_ranges: &[],
        });
        let line_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("line_pipeline_layout"),
            bind_group_layouts: &[&globals_layout, &item_layout],
            push_constant_ranges: &[],
        });

        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::MESH_SHADER.into()),
        });
        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("line_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::LINE_SHADER.into()),
        });
        let shadow_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shadow_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SHADOW_SHADER.into()),
        });

        let opaque_pipeline = Self::mesh_pipeline(
            device,
            &mesh_layout,
            &mesh_shader,
            surface_format,
            "opaque_pipeline",
            wgpu::BlendState::REPLACE,
            true,
        );
        let transparent_pipeline = Self::mesh_pipeline(
            device,
            &mesh_layout,
            &mesh_shader,
            surface_format,
            "transparent_pipeline",
            wgpu::BlendState::ALPHA_BLENDING,
            false,
        );

        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("line_pipeline"),
            layout: Some(&line_layout),
            vertex: wgpu::VertexState {
                module: &line_shader,
                entry_point: Some("vs_line"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<LineVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x4,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &line_shader,
                entry_point: Some("fs_line"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(depth_state(true)),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let shadow_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shadow_pipeline"),
            layout: Some(&caster_layout),
            vertex: wgpu::VertexState {
                module: &shadow_shader,
                entry_point: Some("vs_shadow"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
                ..depth_state(true)
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            opaque_pipeline,
            transparent_pipeline,
            line_pipeline,
            shadow_pipeline,
            shadow_layout,
            shadow_sampler,
            shadow_map,
            globals_buffer,
            globals_bind_group,
            item_buffer,
            item_bind_group,
            textures: textures_by_slot,
            untextured,
            meshes: BTreeMap::new(),
            depth_texture,
            surface_format,
        }
    }

    fn mesh_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        surface_format: wgpu::TextureFormat,
        label: &str,
        blend: wgpu::BlendState,
        depth_write: bool,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
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
                module: shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(depth_state(depth_write)),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn upload_texture(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        width: u32,
        height: u32,
        pixels: &[u8],
        wrap: Wrap,
        label: &str,
    ) -> wgpu::BindGroup {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            pixels,
        );
        let address_mode = match wrap {
            Wrap::Clamp => wgpu::AddressMode::ClampToEdge,
            Wrap::Repeat => wgpu::AddressMode::Repeat,
        };
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let view = texture.create_view(&Default::default());
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        })
    }

    /// Upload vertex data for any mesh node not seen before and size the
    /// shadow map to the sun's settings.
    ///
    /// Geometry is fixed once a node exists, so each node is tessellated once.
    pub fn prepare(&mut self, device: &wgpu::Device, scene: &SceneGraph) {
        let shadow_size = sun_shadow(scene).map_or(1, |(_, camera)| camera.map_size.max(1));
        if shadow_size != self.shadow_map.size {
            self.shadow_map = Self::create_shadow_map(
                device,
                &self.shadow_layout,
                &self.shadow_sampler,
                shadow_size,
            );
            tracing::debug!(size = shadow_size, "shadow map allocated");
        }

        let mut uploaded = 0usize;
        for draw in scene.visible_meshes() {
            if self.meshes.contains_key(&draw.id) {
                continue;
            }
            let label = format!("mesh_{}", draw.id.0);
            let mesh = match tessellate(draw.geometry) {
                ShapeMesh::Triangles(data) => GpuMesh::Triangles {
                    vertices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&label),
                        contents: bytemuck::cast_slice(&data.vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                    indices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&label),
                        contents: bytemuck::cast_slice(&data.indices),
                        usage: wgpu::BufferUsages::INDEX,
                    }),
                    index_count: data.indices.len() as u32,
                },
                ShapeMesh::Lines(verts) => GpuMesh::Lines {
                    vertices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&label),
                        contents: bytemuck::cast_slice(&verts),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                    vertex_count: verts.len() as u32,
                },
            };
            self.meshes.insert(draw.id, mesh);
            uploaded += 1;
        }
        if uploaded > 0 {
            tracing::debug!(uploaded, total = self.meshes.len(), "mesh buffers uploaded");
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    fn globals(scene: &SceneGraph, view: &RenderView) -> Globals {
        let mut globals = Globals {
            view_proj: view.view_projection().to_cols_array_2d(),
            camera_pos: view.eye.extend(1.0).to_array(),
            ambient: [0.0; 4],
            sun_dir: [0.0, 1.0, 0.0, 0.0],
            sun_color: [0.0; 4],
            point_pos: [0.0; 4],
            point_color: [0.0; 4],
            fog_color: [0.0; 4],
            fog_params: [0.0; 4],
            light_view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            shadow_params: [0.0; 4],
        };
        let (mut has_sun, mut has_point) = (false, false);
        for light in scene.visible_lights() {
            match light.light {
                Light::Ambient { color, intensity } => {
                    let add = linear_rgb(color, intensity);
                    for (acc, c) in globals.ambient.iter_mut().zip(add).take(3) {
                        *acc += c;
                    }
                }
                Light::Directional {
                    color,
                    intensity,
                    shadow,
                } if !has_sun => {
                    has_sun = true;
                    let dir = light.position.normalize_or(Vec3::Y);
                    globals.sun_dir = dir.extend(0.0).to_array();
                    globals.sun_color = linear_rgb(color, intensity);
                    if let Some(camera) = shadow {
                        globals.light_view_proj =
                            camera.view_projection(light.position).to_cols_array_2d();
                        globals.shadow_params =
                            [1.0, SHADOW_BIAS, 1.0 / camera.map_size.max(1) as f32, 0.0];
                    }
                }
                Light::Point {
                    color,
                    intensity,
                    range,
                } if !has_point => {
                    has_point = true;
                    globals.point_pos = light.position.extend(range).to_array();
                    globals.point_color = linear_rgb(color, intensity);
                }
                _ => tracing::trace!(light = ?light.id, "extra light ignored"),
            }
        }
        if let Some(fog) = scene.environment().fog {
            globals.fog_color = linear_rgb(fog.color, 1.0);
            globals.fog_params = [fog.near, fog.far, 1.0, 0.0];
        }
        globals
    }

    /// Render one frame of `scene` into `target`.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        scene: &SceneGraph,
        view: &RenderView,
    ) {
        let globals = Self::globals(scene, view);
        queue.write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        let mut opaque: Vec<MeshDraw<'_>> = Vec::new();
        let mut lines: Vec<MeshDraw<'_>> = Vec::new();
        let mut transparent: Vec<MeshDraw<'_>> = Vec::new();
        for draw in scene.visible_meshes() {
            if draw.geometry.is_lines() {
                lines.push(draw);
            } else if draw.material.is_transparent() {
                transparent.push(draw);
            } else {
                opaque.push(draw);
            }
        }
        let depth = |d: &MeshDraw<'_>| d.world.w_axis.truncate().distance_squared(view.eye);
        transparent.sort_by(|a, b| depth(b).total_cmp(&depth(a)));

        let ordered: Vec<MeshDraw<'_>> = opaque
            .into_iter()
            .chain(lines)
            .chain(transparent)
            .take(MAX_ITEMS)
            .collect();
        let items: Vec<ItemUniform> = ordered
            .iter()
            .map(|d| ItemUniform::new(d.world, d.material))
            .collect();
        if !items.is_empty() {
            queue.write_buffer(&self.item_buffer, 0, bytemuck::cast_slice(&items));
        }

        let [r, g, b, _] = scene.environment().background.to_linear();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        if globals.shadow_params[0] > 0.5 {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shadow_pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_pipeline(&self.shadow_pipeline);
            pass.set_bind_group(0, &self.globals_bind_group, &[]);
            for (index, draw) in ordered.iter().enumerate() {
                if !draw.material.cast_shadow {
                    continue;
                }
                let Some(GpuMesh::Triangles {
                    vertices,
                    indices,
                    index_count,
                }) = self.meshes.get(&draw.id)
                else {
                    continue;
                };
                pass.set_bind_group(1, &self.item_bind_group, &[item_offset(index)]);
                pass.set_vertex_buffer(0, vertices.slice(..));
                pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..*index_count, 0, 0..1);
            }
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.globals_bind_group, &[]);
            pass.set_bind_group(3, &self.shadow_map.bind_group, &[]);
            for (index, draw) in ordered.iter().enumerate() {
                let Some(mesh) = self.meshes.get(&draw.id) else {
                    continue;
                };
                pass.set_bind_group(1, &self.item_bind_group, &[item_offset(index)]);
                match mesh {
                    GpuMesh::Triangles {
                        vertices,
                        indices,
                        index_count,
                    } => {
                        let pipeline = if draw.material.is_transparent() {
                            &self.transparent_pipeline
                        } else {
                            &self.opaque_pipeline
                        };
                        let texture = draw
                            .material
                            .map
                            .and_then(|slot| self.textures.get(&slot))
                            .unwrap_or(&self.untextured);
                        pass.set_pipeline(pipeline);
                        pass.set_bind_group(2, texture, &[]);
                        pass.set_vertex_buffer(0, vertices.slice(..));
                        pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                        pass.draw_indexed(0..*index_count, 0, 0..1);
                    }
                    GpuMesh::Lines {
                        vertices,
                        vertex_count,
                    } => {
                        pass.set_pipeline(&self.line_pipeline);
                        pass.set_vertex_buffer(0, vertices.slice(..));
                        pass.draw(0..*vertex_count, 0..1);
                    }
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_shadow_map(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        size: u32,
    ) -> ShadowMap {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("shadow_map"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&Default::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });
        ShadowMap {
            size,
            view,
            bind_group,
        }
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

fn item_offset(index: usize) -> u32 {
    (index as u64 * ITEM_STRIDE) as u32
}

/// The first directional light, when it casts shadows.
fn sun_shadow(scene: &SceneGraph) -> Option<(Vec3, ShadowCamera)> {
    let sun = scene
        .visible_lights()
        .into_iter()
        .find(|l| matches!(l.light, Light::Directional { .. }))?;
    match sun.light {
        Light::Directional {
            shadow: Some(camera),
            ..
        } => Some((sun.position, camera)),
        _ => None,
    }
}

fn depth_state(write: bool) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: Default::default(),
        bias: Default::default(),
    }
}

fn texture_label(texture: &Texture) -> &'static str {
    match texture.slot {
        TextureSlot::Body => "body_texture",
        TextureSlot::Ground => "ground_texture",
        TextureSlot::Tread => "tread_texture",
        TextureSlot::Metal => "metal_texture",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivescape_common::Transform;
    use drivescape_scene::{Environment, NodeKind};

    #[test]
    fn item_uniform_matches_dynamic_offset_alignment() {
        assert_eq!(ITEM_STRIDE, 256);
    }

    #[test]
    fn phong_material_packs_shininess() {
        let material = Material::phong(Color::WHITE, 120.0).with_specular(Color::WHITE);
        let item = ItemUniform::new(Mat4::IDENTITY, &material);
        assert!(item.specular[..3].iter().all(|c| (c - 1.0).abs() < 1e-6));
        assert_eq!(item.specular[3], 120.0);
        assert_eq!(item.params[2], 1.0);
        assert_eq!(item.color[3], 1.0);
    }

    #[test]
    fn globals_collect_scene_lights_and_fog() {
        let mut scene = SceneGraph::new();
        scene.add(
            "ambient",
            NodeKind::Light(Light::Ambient {
                color: Color::WHITE,
                intensity: 0.5,
            }),
            Transform::default(),
        );
        scene.add(
            "sun",
            NodeKind::Light(Light::Directional {
                color: Color::WHITE,
                intensity: 1.0,
                shadow: None,
            }),
            Transform::from_position(Vec3::new(0.0, 10.0, 0.0)),
        );
        scene.add(
            "lamp",
            NodeKind::Light(Light::Point {
                color: Color::WHITE,
                intensity: 1.0,
                range: 30.0,
            }),
            Transform::from_position(Vec3::new(1.0, 2.0, 3.0)),
        );
        let g = WgpuRenderer::globals(&scene, &RenderView::default());
        assert!(g.ambient[..3].iter().all(|c| (c - 0.5).abs() < 1e-6));
        assert_eq!(g.sun_dir, [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(g.point_pos, [1.0, 2.0, 3.0, 30.0]);
        let fog = Environment::default().fog.unwrap();
        assert_eq!(g.fog_params, [fog.near, fog.far, 1.0, 0.0]);
    }

    #[test]
    fn shadowed_sun_fills_light_space() {
        let camera = ShadowCamera::default();
        let sun = Vec3::new(15.0, 25.0, 10.0);
        let mut scene = SceneGraph::new();
        assert!(sun_shadow(&scene).is_none());
        scene.add(
            "sun",
            NodeKind::Light(Light::Directional {
                color: Color::WHITE,
                intensity: 0.9,
                shadow: Some(camera),
            }),
            Transform::from_position(sun),
        );
        assert_eq!(sun_shadow(&scene), Some((sun, camera)));

        let g = WgpuRenderer::globals(&scene, &RenderView::default());
        assert_eq!(g.shadow_params, [1.0, SHADOW_BIAS, 1.0 / 2048.0, 0.0]);
        assert_eq!(
            g.light_view_proj,
            camera.view_projection(sun).to_cols_array_2d()
        );
    }

    #[test]
    fn unshadowed_sun_leaves_shadows_off() {
        let mut scene = SceneGraph::new();
        scene.add(
            "sun",
            NodeKind::Light(Light::Directional {
                color: Color::WHITE,
                intensity: 1.0,
                shadow: None,
            }),
            Transform::from_position(Vec3::Y),
        );
        assert!(sun_shadow(&scene).is_none());
        let g = WgpuRenderer::globals(&scene, &RenderView::default());
        assert_eq!(g.shadow_params[0], 0.0);
    }

    #[test]
    fn receive_flag_reaches_the_shader() {
        let lit = ItemUniform::new(Mat4::IDENTITY, &Material::default());
        assert_eq!(lit.params[3], 0.0);
        let shaded = ItemUniform::new(
            Mat4::IDENTITY,
            &Material::default().with_shadows(false, true),
        );
        assert_eq!(shaded.params[3], 1.0);
    }
}
