use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use shapefall_render::{Geometry, GeometryKey, PerspectiveCamera, Renderer, Scene};
use std::collections::{BTreeMap, HashMap};
use wgpu::util::DeviceExt;

const INITIAL_INSTANCE_CAPACITY: u32 = 1024;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    /// xyz: unit vector towards the light, w: intensity.
    light_dir: [f32; 4],
    light_color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
}

/// Instances sharing one geometry, drawn with a single call.
struct Batch {
    key: GeometryKey,
    geometry: Geometry,
    instances: Vec<InstanceData>,
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

fn uniforms(scene: &Scene, camera: &PerspectiveCamera) -> Uniforms {
    let (light_dir, light_color) = match scene.lights().first() {
        Some(light) => (light.direction_to_light().extend(light.intensity), light.color.to_array()),
        None => (Vec3::Y.extend(0.0), [1.0; 4]),
    };
    Uniforms {
        view_proj: camera.view_projection().to_cols_array_2d(),
        light_dir: light_dir.to_array(),
        light_color,
    }
}

/// Group mesh nodes by geometry. Batches come out in geometry-key order and
/// instances in scene order.
fn batches(scene: &Scene) -> Vec<Batch> {
    let mut grouped: BTreeMap<GeometryKey, Batch> = BTreeMap::new();
    for (_, node) in scene.meshes() {
        let key = node.geometry.key();
        let cols = node.transform.to_matrix().to_cols_array_2d();
        grouped
            .entry(key)
            .or_insert_with(|| Batch {
                key,
                geometry: node.geometry,
                instances: Vec::new(),
            })
            .instances
            .push(InstanceData {
                model_0: cols[0],
                model_1: cols[1],
                model_2: cols[2],
                model_3: cols[3],
                color: node.material.color.to_array(),
            });
    }
    grouped.into_values().collect()
}

/// Capacity needed to hold `needed` instances: unchanged if it already fits,
/// otherwise the next power of two.
fn grown_capacity(current: u32, needed: usize) -> u32 {
    if needed <= current as usize {
        return current;
    }
    u32::try_from(needed)
        .ok()
        .and_then(u32::checked_next_power_of_two)
        .unwrap_or(u32::MAX)
}

fn create_instance_buffer(device: &wgpu::Device, capacity: u32) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("instance_buffer"),
        size: capacity as u64 * std::mem::size_of::<InstanceData>() as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// wgpu scene renderer.
pub struct WgpuRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    meshes: HashMap<GeometryKey, GpuMesh>,
    instance_buffer: wgpu::Buffer,
    instance_capacity: u32,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat, width: u32, height: u32) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                light_dir: [0.0, 1.0, 0.0, 1.0],
                light_color: [1.0; 4],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
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

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
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
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            // No culling: the ground plane is a single-sided quad.
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let instance_buffer = create_instance_buffer(device, INITIAL_INSTANCE_CAPACITY);

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            meshes: HashMap::new(),
            instance_buffer,
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
            depth_texture,
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Number of distinct geometries uploaded so far.
    pub fn cached_meshes(&self) -> usize {
        self.meshes.len()
    }

    /// Number of instances the instance buffer holds before it must grow.
    pub fn instance_capacity(&self) -> u32 {
        self.instance_capacity
    }

    /// Reallocate the instance buffer if `needed` instances do not fit.
    fn reserve_instances(&mut self, device: &wgpu::Device, needed: usize) {
        let capacity = grown_capacity(self.instance_capacity, needed);
        if capacity == self.instance_capacity {
            return;
        }
        tracing::debug!(from = self.instance_capacity, to = capacity, "growing instance buffer");
        self.instance_buffer = create_instance_buffer(device, capacity);
        self.instance_capacity = capacity;
    }

    fn upload(device: &wgpu::Device, key: GeometryKey, geometry: &Geometry) -> GpuMesh {
        let data = geometry.tessellate();
        let vertices: Vec<Vertex> = data
            .positions
            .iter()
            .zip(&data.normals)
            .map(|(&position, &normal)| Vertex { position, normal })
            .collect();
        tracing::debug!(?key, vertices = vertices.len(), "uploading mesh");

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertex_buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_index_buffer"),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
        }
    }

    /// Render one frame of `scene` into `view`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        scene: &Scene,
        camera: &PerspectiveCamera,
    ) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms(scene, camera)));

        let batches = batches(scene);
        for batch in &batches {
            self.meshes
                .entry(batch.key)
                .or_insert_with(|| Self::upload(device, batch.key, &batch.geometry));
        }

        let instances: Vec<InstanceData> = batches.iter().flat_map(|b| b.instances.iter().copied()).collect();
        self.reserve_instances(device, instances.len());
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let bg = scene.background;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: bg.r as f64,
                            g: bg.g as f64,
                            b: bg.b as f64,
                            a: bg.a as f64,
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

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

            let mut first = 0u32;
            for batch in &batches {
                let count = batch.instances.len() as u32;
                if let Some(mesh) = self.meshes.get(&batch.key) {
                    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                    pass.draw_indexed(0..mesh.index_count, 0, first..first + count);
                }
                first += count;
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
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
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

/// One frame's GPU targets bundled with the renderer, so the frame can be
/// handed to code that only knows the [`Renderer`] trait.
pub struct WgpuFrame<'a> {
    pub renderer: &'a mut WgpuRenderer,
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub view: &'a wgpu::TextureView,
}

impl Renderer for WgpuFrame<'_> {
    type Output = ();

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) {
        self.renderer
            .render(self.device, self.queue, self.view, scene, camera);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapefall_common::{Color, Transform};
    use shapefall_render::{DirectionalLight, Material, MeshNode};

    fn unit_box() -> Geometry {
        Geometry::Box {
            width: 1.0,
            height: 1.0,
            depth: 1.0,
        }
    }

    fn ball() -> Geometry {
        Geometry::Sphere {
            radius: 0.5,
            width_segments: 16,
            height_segments: 16,
        }
    }

    #[test]
    fn instances_are_grouped_by_geometry() {
        let mut scene = Scene::new();
        for i in 0..3 {
            scene.add(
                MeshNode::new(unit_box(), Material::standard(Color::WHITE))
                    .with_transform(Transform::from_position(Vec3::new(i as f32, 0.0, 0.0))),
            );
            scene.add(MeshNode::new(ball(), Material::standard(Color::from_hex(0xff0000))));
        }
        let batches = batches(&scene);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches.iter().map(|b| b.instances.len()).sum::<usize>(), 6);

        let boxes = batches.iter().find(|b| b.key == unit_box().key()).unwrap();
        let xs: Vec<f32> = boxes.instances.iter().map(|i| i.model_3[0]).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn every_mesh_reaches_a_batch() {
        let mut scene = Scene::new();
        for i in 0..10_001 {
            let geometry = if i % 2 == 0 { unit_box() } else { ball() };
            scene.add(MeshNode::new(geometry, Material::standard(Color::WHITE)));
        }
        let drawn: usize = batches(&scene).iter().map(|b| b.instances.len()).sum();
        assert_eq!(drawn, scene.mesh_count());
        assert!(grown_capacity(INITIAL_INSTANCE_CAPACITY, drawn) as usize >= drawn);
    }

    #[test]
    fn capacity_grows_to_next_power_of_two() {
        assert_eq!(grown_capacity(1024, 0), 1024);
        assert_eq!(grown_capacity(1024, 1024), 1024);
        assert_eq!(grown_capacity(1024, 1025), 2048);
        assert_eq!(grown_capacity(1024, 10_001), 16_384);
        assert_eq!(grown_capacity(16_384, 500), 16_384);
    }

    #[test]
    fn uniforms_carry_first_light() {
        let mut scene = Scene::new();
        scene.add_light(DirectionalLight {
            color: Color::WHITE,
            intensity: 1.0,
            position: Vec3::new(0.0, 10.0, 0.0),
        });
        let u = uniforms(&scene, &PerspectiveCamera::default());
        assert_eq!(u.light_dir, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(u.light_color, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn unlit_scene_gets_zero_intensity() {
        let u = uniforms(&Scene::new(), &PerspectiveCamera::default());
        assert_eq!(u.light_dir[3], 0.0);
    }
}
