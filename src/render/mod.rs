pub mod texture;

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use bytemuck::{bytes_of, Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use log::{error, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use crate::light::{Attenuation, Light, LightKind};
use crate::mesh::{self, Mesh, VERTEX_STRIDE};
use crate::scene::SceneObject;
use texture::TextureCache;

/// Camera parameters consumed by the renderer's uniform buffer.
#[derive(Clone, Debug)]
pub struct CameraParams {
    pub view_proj: Mat4,
    pub position: Vec3,
}

/// Small emissive cube drawn at the light source's position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LampMarker {
    pub position: Vec3,
    pub color: Vec3,
}

const LAMP_SCALE: f32 = 0.2;

/// GPU renderer backed by wgpu that draws the lit scene and the lamp cube.
pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    depth: DepthBuffer,
    lit_pipeline: wgpu::RenderPipeline,
    wire_pipeline: Option<wgpu::RenderPipeline>,
    lamp_pipeline: wgpu::RenderPipeline,
    global_buffer: wgpu::Buffer,
    global_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    map_layout: wgpu::BindGroupLayout,
    mesh_cache: HashMap<String, MeshBuffers>,
    missing_meshes: HashSet<String>,
    textures: TextureCache,
    default_mesh: MeshBuffers,
    assets_root: PathBuf,
    warned_wireframe: bool,
}

impl Renderer {
    /// Initializes the GPU renderer for the provided window. Asset paths in
    /// scene objects are resolved against `assets_root`.
    pub async fn new(window: Arc<Window>, assets_root: PathBuf) -> Result<Self> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(anyhow!("window has zero area"));
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: Default::default(),
            backend_options: Default::default(),
        });
        let surface = instance.create_surface(Arc::clone(&window))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;

        // Line fill mode is optional; the wireframe toggle degrades
        // gracefully when the adapter lacks it.
        let wire_supported = adapter
            .features()
            .contains(wgpu::Features::POLYGON_MODE_LINE);
        let device_descriptor = wgpu::DeviceDescriptor {
            label: Some("renderer-device"),
            required_features: if wire_supported {
                wgpu::Features::POLYGON_MODE_LINE
            } else {
                wgpu::Features::empty()
            },
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
        };
        let (device, queue) = adapter
            .request_device(&device_descriptor)
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps
                .present_modes
                .iter()
                .copied()
                .find(|mode| {
                    matches!(
                        mode,
                        wgpu::PresentMode::Mailbox | wgpu::PresentMode::Immediate
                    )
                })
                .unwrap_or(wgpu::PresentMode::Fifo),
            desired_maximum_frame_latency: 2,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let depth = DepthBuffer::create(&device, config.width, config.height);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("renderer-shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let global_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("global-bind-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(
                        std::num::NonZeroU64::new(std::mem::size_of::<GlobalUniform>() as u64)
                            .unwrap(),
                    ),
                },
                count: None,
            }],
        });

        // Per-object uniform layout
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object-bind-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(
                        std::num::NonZeroU64::new(std::mem::size_of::<ObjectConstants>() as u64)
                            .unwrap(),
                    ),
                },
                count: None,
            }],
        });

        // Material map layout: diffuse map, specular map, shared sampler
        let map_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("map-bind-layout"),
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

        let lit_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lit-pipeline-layout"),
            bind_group_layouts: &[&global_layout, &object_layout, &map_layout],
            push_constant_ranges: &[],
        });
        let lamp_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lamp-pipeline-layout"),
            bind_group_layouts: &[&global_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let global_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("global-uniform"),
            size: std::mem::size_of::<GlobalUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("global-bind-group"),
            layout: &global_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_buffer.as_entire_binding(),
            }],
        });

        let lit_pipeline = create_pipeline(
            &device,
            &shader,
            &lit_layout,
            surface_format,
            "fs_lit",
            wgpu::PolygonMode::Fill,
            "lit-pipeline",
        );
        let wire_pipeline = wire_supported.then(|| {
            create_pipeline(
                &device,
                &shader,
                &lit_layout,
                surface_format,
                "fs_lit",
                wgpu::PolygonMode::Line,
                "wire-pipeline",
            )
        });
        let lamp_pipeline = create_pipeline(
            &device,
            &shader,
            &lamp_layout,
            surface_format,
            "fs_lamp",
            wgpu::PolygonMode::Fill,
            "lamp-pipeline",
        );

        let default_mesh = MeshBuffers::from_mesh(&device, &Mesh::unit_cube(), "default-cube");
        let textures = TextureCache::new(&device, &queue, assets_root.clone());

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            depth,
            lit_pipeline,
            wire_pipeline,
            lamp_pipeline,
            global_buffer,
            global_bind_group,
            object_layout,
            map_layout,
            mesh_cache: HashMap::new(),
            missing_meshes: HashSet::new(),
            textures,
            default_mesh,
            assets_root,
            warned_wireframe: false,
        })
    }

    /// Returns the identifier of the window owned by the renderer.
    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    /// Exposes the inner window for event handling.
    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn aspect(&self) -> f32 {
        if self.size.height == 0 {
            1.0
        } else {
            self.size.width as f32 / self.size.height as f32
        }
    }

    /// Resizes the swap chain to match the new dimensions.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::create(&self.device, new_size.width, new_size.height);
    }

    /// Uploads the per-frame camera and lighting uniforms.
    pub fn update_globals(&self, camera: &CameraParams, light: &Light, shaded: bool) {
        let uniform = GlobalUniform::pack(camera, light, shaded);
        self.queue
            .write_buffer(&self.global_buffer, 0, bytes_of(&uniform));
    }

    /// Draws the scene objects and, when present, the lamp marker.
    pub fn render(
        &mut self,
        objects: &[SceneObject],
        lamp: Option<&LampMarker>,
        wireframe: bool,
    ) -> Result<(), wgpu::SurfaceError> {
        if wireframe && self.wire_pipeline.is_none() && !self.warned_wireframe {
            warn!("wireframe mode is not supported by this adapter");
            self.warned_wireframe = true;
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("renderer-encoder"),
            });

        // Make sure every referenced mesh and texture is resident before
        // the pass borrows the caches immutably.
        for object in objects {
            if let Some(name) = object.mesh.as_deref() {
                self.ensure_mesh_loaded(name);
            }
            for map in [object.maps.diffuse.as_deref(), object.maps.specular.as_deref()]
                .into_iter()
                .flatten()
            {
                self.textures.ensure_loaded(&self.device, &self.queue, map);
            }
        }

        let mut draws = Vec::new();
        for object in objects {
            let constants = ObjectConstants::for_object(object);
            draws.push((
                object.mesh.clone(),
                self.object_bind_group(&constants),
                self.map_bind_group(object),
            ));
        }
        let lamp_draw = lamp.map(|marker| {
            let constants = ObjectConstants::for_lamp(marker);
            self.object_bind_group(&constants)
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("main-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.1,
                        g: 0.1,
                        b: 0.1,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let pipeline = match (&self.wire_pipeline, wireframe) {
            (Some(wire), true) => wire,
            _ => &self.lit_pipeline,
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.global_bind_group, &[]);

        for (mesh_name, object_bind_group, map_bind_group) in draws.iter() {
            let mesh = match mesh_name.as_deref() {
                Some(name) => self.mesh_cache.get(name).unwrap_or(&self.default_mesh),
                None => &self.default_mesh,
            };
            pass.set_vertex_buffer(0, mesh.vertex.slice(..));
            pass.set_index_buffer(mesh.index.slice(..), wgpu::IndexFormat::Uint32);
            pass.set_bind_group(1, object_bind_group, &[]);
            pass.set_bind_group(2, map_bind_group, &[]);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }

        if let Some(lamp_bind_group) = lamp_draw.as_ref() {
            pass.set_pipeline(&self.lamp_pipeline);
            pass.set_bind_group(0, &self.global_bind_group, &[]);
            pass.set_vertex_buffer(0, self.default_mesh.vertex.slice(..));
            pass.set_index_buffer(self.default_mesh.index.slice(..), wgpu::IndexFormat::Uint32);
            pass.set_bind_group(1, lamp_bind_group, &[]);
            pass.draw_indexed(0..self.default_mesh.index_count, 0, 0..1);
        }

        drop(pass); // explicit to satisfy lifetimes on some backends
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn object_bind_group(&self, constants: &ObjectConstants) -> wgpu::BindGroup {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("object-uniform"),
                contents: bytes_of(constants),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("object-bind-group"),
            layout: &self.object_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }

    fn map_bind_group(&self, object: &SceneObject) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("map-bind-group"),
            layout: &self.map_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(
                        self.textures.view(object.maps.diffuse.as_deref()),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(
                        self.textures.view(object.maps.specular.as_deref()),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(self.textures.sampler()),
                },
            ],
        })
    }

    fn ensure_mesh_loaded(&mut self, name: &str) {
        if self.mesh_cache.contains_key(name) || self.missing_meshes.contains(name) {
            return;
        }
        match self.load_mesh(name) {
            Ok(mesh) => {
                self.mesh_cache.insert(name.to_string(), mesh);
            }
            Err(err) => {
                error!("failed to load mesh {name}: {err:?}");
                self.missing_meshes.insert(name.to_string());
            }
        }
    }

    fn load_mesh(&self, name: &str) -> Result<MeshBuffers> {
        let path = self.assets_root.join(name);
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("unable to read {}", path.display()))?;
        let mesh = mesh::load_obj_from_str(&contents)
            .with_context(|| format!("failed to parse OBJ mesh {name}"))?;
        Ok(MeshBuffers::from_mesh(&self.device, &mesh, name))
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    surface_format: wgpu::TextureFormat,
    fragment_entry: &str,
    polygon_mode: wgpu::PolygonMode,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: (VERTEX_STRIDE * std::mem::size_of::<f32>()) as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: 0,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: (3 * std::mem::size_of::<f32>()) as u64,
                        shader_location: 1,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x2,
                        offset: (6 * std::mem::size_of::<f32>()) as u64,
                        shader_location: 2,
                    },
                ],
            }],
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DepthBuffer::FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        multiview: None,
        cache: None,
    })
}

fn object_model_matrix(object: &SceneObject) -> Mat4 {
    let translation = Mat4::from_translation(object.position);
    let rotation = Mat4::from_rotation_z(object.rotation.z.to_radians())
        * Mat4::from_rotation_y(object.rotation.y.to_radians())
        * Mat4::from_rotation_x(object.rotation.x.to_radians());
    let scale = Mat4::from_scale(object.scale);
    translation * rotation * scale
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    fn from_mesh(device: &wgpu::Device, mesh: &Mesh, label: &str) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: mesh.indices.len() as u32,
        }
    }
}

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

// Discriminants mirrored in the shader's light_kind branch.
const KIND_DIRECTIONAL: u32 = 0;
const KIND_POINT: u32 = 1;
const KIND_SPOT: u32 = 2;
const KIND_UNLIT: u32 = 3;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct GlobalUniform {
    view_proj: [[f32; 4]; 4],
    camera_position: [f32; 4],
    light_position: [f32; 4],
    light_direction: [f32; 4],
    light_ambient: [f32; 4],
    light_diffuse: [f32; 4],
    light_specular: [f32; 4],
    light_attenuation: [f32; 4],
    light_cutoffs: [f32; 4],
    light_kind: [u32; 4],
}

impl GlobalUniform {
    fn pack(camera: &CameraParams, light: &Light, shaded: bool) -> Self {
        let mut position = Vec3::ZERO;
        let mut direction = Vec3::NEG_Z;
        let mut attenuation = Attenuation {
            constant: 1.0,
            linear: 0.0,
            quadratic: 0.0,
        };
        let mut cutoffs = [0.0f32; 4];
        let kind = match light.kind {
            _ if !shaded => KIND_UNLIT,
            LightKind::Directional { direction: d } => {
                direction = d;
                KIND_DIRECTIONAL
            }
            LightKind::Point {
                position: p,
                attenuation: a,
            } => {
                position = p;
                attenuation = a;
                KIND_POINT
            }
            LightKind::Spot {
                position: p,
                direction: d,
                cut_off,
                outer_cut_off,
                attenuation: a,
            } => {
                position = p;
                direction = d;
                attenuation = a;
                cutoffs = [cut_off, outer_cut_off, 0.0, 0.0];
                KIND_SPOT
            }
        };

        Self {
            view_proj: camera.view_proj.to_cols_array_2d(),
            camera_position: camera.position.extend(1.0).into(),
            light_position: position.extend(1.0).into(),
            light_direction: direction.extend(0.0).into(),
            light_ambient: light.color.ambient.extend(1.0).into(),
            light_diffuse: light.color.diffuse.extend(1.0).into(),
            light_specular: light.color.specular.extend(1.0).into(),
            light_attenuation: [
                attenuation.constant,
                attenuation.linear,
                attenuation.quadratic,
                0.0,
            ],
            light_cutoffs: cutoffs,
            light_kind: [kind, 0, 0, 0],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ObjectConstants {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 3],
    diffuse: [f32; 4],
    specular: [f32; 4],
}

impl ObjectConstants {
    fn for_object(object: &SceneObject) -> Self {
        let model = object_model_matrix(object);
        let normal = Mat3::from_mat4(model).inverse().transpose();
        let use_maps = if object.maps.is_empty() { 0.0 } else { 1.0 };
        Self {
            model: model.to_cols_array_2d(),
            normal: mat3_to_3x4(normal),
            diffuse: object.material.diffuse.extend(object.material.shininess).into(),
            specular: object.material.specular.extend(use_maps).into(),
        }
    }

    fn for_lamp(marker: &LampMarker) -> Self {
        let model =
            Mat4::from_translation(marker.position) * Mat4::from_scale(Vec3::splat(LAMP_SCALE));
        Self {
            model: model.to_cols_array_2d(),
            normal: mat3_to_3x4(Mat3::IDENTITY),
            diffuse: marker.color.extend(1.0).into(),
            specular: [0.0; 4],
        }
    }
}

const SHADER: &str = r#"
struct GlobalUniform {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    light_position: vec4<f32>,
    light_direction: vec4<f32>,
    light_ambient: vec4<f32>,
    light_diffuse: vec4<f32>,
    light_specular: vec4<f32>,
    light_attenuation: vec4<f32>,
    light_cutoffs: vec4<f32>,
    light_kind: vec4<u32>,
}

struct ObjectConstants {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    diffuse: vec4<f32>,
    specular: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: GlobalUniform;

@group(1) @binding(0)
var<uniform> object: ObjectConstants;

@group(2) @binding(0)
var diffuse_map: texture_2d<f32>;
@group(2) @binding(1)
var specular_map: texture_2d<f32>;
@group(2) @binding(2)
var map_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_position = object.model * vec4<f32>(input.position, 1.0);
    out.position = globals.view_proj * world_position;
    out.world_pos = world_position.xyz;

    let world_normal = mat3x3<f32>(
        object.normal[0].xyz,
        object.normal[1].xyz,
        object.normal[2].xyz
    ) * input.normal;

    out.normal = normalize(world_normal);
    out.uv = input.uv;
    return out;
}

// light_kind.x: 0 directional, 1 point, 2 spot, 3 unlit.
// object.diffuse.w carries shininess, object.specular.w the use-maps flag.
@fragment
fn fs_lit(input: VertexOutput) -> @location(0) vec4<f32> {
    let sampled_diffuse = textureSample(diffuse_map, map_sampler, input.uv).rgb;
    let sampled_specular = textureSample(specular_map, map_sampler, input.uv).rgb;
    var surface_diffuse = object.diffuse.rgb;
    var surface_specular = object.specular.rgb;
    if (object.specular.w > 0.5) {
        surface_diffuse = sampled_diffuse;
        surface_specular = sampled_specular;
    }

    let kind = globals.light_kind.x;
    if (kind == 3u) {
        return vec4<f32>(surface_diffuse, 1.0);
    }

    let normal = normalize(input.normal);
    var light_dir = normalize(-globals.light_direction.xyz);
    var attenuation = 1.0;
    if (kind != 0u) {
        let to_light = globals.light_position.xyz - input.world_pos;
        let distance = length(to_light);
        light_dir = to_light / distance;
        let a = globals.light_attenuation;
        attenuation = 1.0 / (a.x + a.y * distance + a.z * distance * distance);
    }

    let ambient = globals.light_ambient.rgb * surface_diffuse;
    let diff = max(dot(normal, light_dir), 0.0);
    let diffuse = globals.light_diffuse.rgb * diff * surface_diffuse;

    let view_dir = normalize(globals.camera_position.xyz - input.world_pos);
    let reflect_dir = reflect(-light_dir, normal);
    let spec = pow(max(dot(view_dir, reflect_dir), 0.0), object.diffuse.w);
    let specular = globals.light_specular.rgb * spec * surface_specular;

    var intensity = 1.0;
    if (kind == 2u) {
        let theta = dot(light_dir, normalize(-globals.light_direction.xyz));
        let epsilon = globals.light_cutoffs.x - globals.light_cutoffs.y;
        intensity = clamp((theta - globals.light_cutoffs.y) / epsilon, 0.0, 1.0);
    }

    let color = (ambient + (diffuse + specular) * intensity) * attenuation;
    return vec4<f32>(color, 1.0);
}

@fragment
fn fs_lamp(input: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(object.diffuse.rgb, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::Phong;
    use crate::material::MaterialMaps;

    fn camera() -> CameraParams {
        CameraParams {
            view_proj: Mat4::IDENTITY,
            position: Vec3::new(0.0, 0.0, 3.0),
        }
    }

    #[test]
    fn packs_point_lights() {
        let light = Light::new(LightKind::point(Vec3::new(1.2, 1.0, 2.0)), Phong::default());
        let uniform = GlobalUniform::pack(&camera(), &light, true);
        assert_eq!(uniform.light_kind[0], KIND_POINT);
        assert_eq!(uniform.light_position[..3], [1.2, 1.0, 2.0]);
        assert_eq!(uniform.light_attenuation[..3], [1.0, 0.09, 0.032]);
    }

    #[test]
    fn packs_spot_cutoffs() {
        let light = Light::new(
            LightKind::spot(Vec3::ZERO, Vec3::NEG_Z, 12.5, 17.5),
            Phong::default(),
        );
        let uniform = GlobalUniform::pack(&camera(), &light, true);
        assert_eq!(uniform.light_kind[0], KIND_SPOT);
        assert!(uniform.light_cutoffs[0] > uniform.light_cutoffs[1]);
    }

    #[test]
    fn unshaded_scenes_pack_as_unlit() {
        let light = Light::new(LightKind::point(Vec3::ONE), Phong::default());
        let uniform = GlobalUniform::pack(&camera(), &light, false);
        assert_eq!(uniform.light_kind[0], KIND_UNLIT);
    }

    #[test]
    fn directional_lights_keep_unit_attenuation() {
        let light = Light::new(
            LightKind::directional(Vec3::new(-0.2, -1.0, -0.3)),
            Phong::default(),
        );
        let uniform = GlobalUniform::pack(&camera(), &light, true);
        assert_eq!(uniform.light_kind[0], KIND_DIRECTIONAL);
        assert_eq!(uniform.light_attenuation[..3], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn object_constants_carry_shininess_and_map_flag() {
        let mut object = SceneObject::default();
        object.material.shininess = 32.0;
        let constants = ObjectConstants::for_object(&object);
        assert_eq!(constants.diffuse[3], 32.0);
        assert_eq!(constants.specular[3], 0.0);

        object.maps = MaterialMaps {
            diffuse: Some("assets/container2.png".to_string()),
            specular: None,
        };
        let constants = ObjectConstants::for_object(&object);
        assert_eq!(constants.specular[3], 1.0);
    }

    #[test]
    fn lamp_constants_scale_down_the_cube() {
        let marker = LampMarker {
            position: Vec3::new(0.0, 1.0, 2.0),
            color: Vec3::ONE,
        };
        let constants = ObjectConstants::for_lamp(&marker);
        assert_eq!(constants.model[0][0], LAMP_SCALE);
        assert_eq!(constants.model[3][1], 1.0);
    }

    #[test]
    fn model_matrix_applies_translation_last() {
        let object = SceneObject {
            position: Vec3::new(1.0, 2.0, 3.0),
            scale: Vec3::splat(2.0),
            ..SceneObject::default()
        };
        let model = object_model_matrix(&object);
        let origin = model.transform_point3(Vec3::ZERO);
        assert_eq!(origin, Vec3::new(1.0, 2.0, 3.0));
        let unit = model.transform_vector3(Vec3::X);
        assert!((unit.length() - 2.0).abs() < 1e-5);
    }
}
