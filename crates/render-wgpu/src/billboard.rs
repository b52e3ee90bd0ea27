use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};
use wgpu::util::DeviceExt;

use vantage_common::Vertex;
use vantage_render::{Camera, RenderStage};

use crate::scene::{DEPTH_FORMAT, Drawable};
use crate::shaders;
use crate::texture::Texture2d;
use crate::RenderError;

/// One billboard instance: world position and quad size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Billboard {
    pub position: Vec3,
    pub scale: Vec2,
}

impl Billboard {
    pub fn new(position: Vec3, scale: Vec2) -> Self {
        Self { position, scale }
    }
}

/// Y rotation in degrees that turns the quad back toward a camera with the
/// given yaw, normalized to [0, 360).
pub fn facing_rotation_degrees(camera_yaw: f32) -> f32 {
    (360.0 - camera_yaw).rem_euclid(360.0)
}

/// Model matrix for one billboard instance facing a camera with `camera_yaw`:
/// translate ∘ rotateY(360° − yaw) ∘ scale(sx, sy, 0). Flattening z keeps the
/// quad planar whatever the source geometry.
pub fn instance_matrix(billboard: &Billboard, camera_yaw: f32) -> Mat4 {
    Mat4::from_translation(billboard.position)
        * Mat4::from_rotation_y(facing_rotation_degrees(camera_yaw).to_radians())
        * Mat4::from_scale(Vec3::new(billboard.scale.x, billboard.scale.y, 0.0))
}

// The one shared quad: unit width and height, origin at bottom-center.
// Texture v runs top-down.
const QUAD: [Vertex; 6] = [
    Vertex { position: [0.5, 1.0, 0.0], uv: [1.0, 0.0] },
    Vertex { position: [-0.5, 1.0, 0.0], uv: [0.0, 0.0] },
    Vertex { position: [-0.5, 0.0, 0.0], uv: [0.0, 1.0] },
    Vertex { position: [-0.5, 0.0, 0.0], uv: [0.0, 1.0] },
    Vertex { position: [0.5, 0.0, 0.0], uv: [1.0, 1.0] },
    Vertex { position: [0.5, 1.0, 0.0], uv: [1.0, 0.0] },
];

/// Most billboards a single renderer will draw per frame.
const MAX_INSTANCES: u32 = 256;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct BillboardUniforms {
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
}

/// Draws camera-facing billboards over a single shared quad.
///
/// The quad geometry is renderer-owned: however many instances exist, there
/// is exactly one vertex buffer. Each instance contributes only a model
/// matrix, rebuilt every frame from the camera's yaw so the quads
/// counter-rotate about the vertical axis (cylindrical facing; pitch is
/// deliberately not compensated).
pub struct BillboardRenderer {
    instances: Vec<Billboard>,
    material: Option<Arc<Texture2d>>,
    gpu: Option<BillboardGpu>,
}

struct BillboardGpu {
    pipeline: wgpu::RenderPipeline,
    quad_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    instance_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    _material: Arc<Texture2d>,
}

impl BillboardRenderer {
    pub fn new(material: Option<Arc<Texture2d>>) -> Self {
        Self {
            instances: Vec::new(),
            material,
            gpu: None,
        }
    }

    pub fn add(&mut self, billboard: Billboard) {
        self.instances.push(billboard);
    }

    pub fn instances(&self) -> &[Billboard] {
        &self.instances
    }

    pub fn is_initialized(&self) -> bool {
        self.gpu.is_some()
    }

    fn gpu(&self) -> Result<&BillboardGpu, RenderError> {
        self.gpu
            .as_ref()
            .ok_or(RenderError::NotInitialized("billboard"))
    }

    /// Build the pipeline and upload the shared quad once.
    pub fn init(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Result<(), RenderError> {
        if self.gpu.is_some() {
            return Err(RenderError::AlreadyInitialized("billboard"));
        }

        let material = self
            .material
            .clone()
            .unwrap_or_else(|| Arc::new(Texture2d::fallback(device, queue)));

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("billboard_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::BILLBOARD_SHADER.into()),
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("billboard_uniforms"),
            contents: bytemuck::bytes_of(&BillboardUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("billboard_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
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

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("billboard_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(material.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(material.sampler()),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("billboard_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("billboard_pipeline"),
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
                            1 => Float32x2,
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
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
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
                // Blended geometry tests against opaque depth but leaves it alone.
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("billboard_quad_buffer"),
            contents: bytemuck::cast_slice(&QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("billboard_instance_buffer"),
            size: u64::from(MAX_INSTANCES) * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        self.gpu = Some(BillboardGpu {
            pipeline,
            quad_buffer,
            instance_buffer,
            instance_count: 0,
            uniform_buffer,
            bind_group,
            _material: material,
        });
        Ok(())
    }
}

impl Drawable for BillboardRenderer {
    fn stage(&self) -> RenderStage {
        RenderStage::Transparent
    }

    fn prepare(&mut self, queue: &wgpu::Queue, camera: &Camera) -> Result<(), RenderError> {
        if self.instances.len() > MAX_INSTANCES as usize {
            tracing::warn!(
                "billboard renderer capped at {MAX_INSTANCES} instances, {} requested",
                self.instances.len()
            );
        }
        let data: Vec<InstanceData> = self
            .instances
            .iter()
            .take(MAX_INSTANCES as usize)
            .map(|billboard| {
                let cols = instance_matrix(billboard, camera.yaw()).to_cols_array_2d();
                InstanceData {
                    model_0: cols[0],
                    model_1: cols[1],
                    model_2: cols[2],
                    model_3: cols[3],
                }
            })
            .collect();

        let Some(gpu) = self.gpu.as_mut() else {
            return Err(RenderError::NotInitialized("billboard"));
        };
        gpu.instance_count = data.len() as u32;
        if !data.is_empty() {
            queue.write_buffer(&gpu.instance_buffer, 0, bytemuck::cast_slice(&data));
        }

        let uniforms = BillboardUniforms {
            view: camera.view_matrix().to_cols_array_2d(),
            projection: camera.projection_matrix().to_cols_array_2d(),
        };
        queue.write_buffer(&gpu.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        Ok(())
    }

    fn record(&self, pass: &mut wgpu::RenderPass<'_>) -> Result<(), RenderError> {
        let gpu = self.gpu()?;
        if gpu.instance_count == 0 {
            return Ok(());
        }
        pass.set_pipeline(&gpu.pipeline);
        pass.set_bind_group(0, &gpu.bind_group, &[]);
        pass.set_vertex_buffer(0, gpu.quad_buffer.slice(..));
        pass.set_vertex_buffer(1, gpu.instance_buffer.slice(..));
        pass.draw(0..QUAD.len() as u32, 0..gpu.instance_count);
        Ok(())
    }

    fn teardown(&mut self) {
        self.gpu = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_counter_rotates_by_camera_yaw() {
        assert_eq!(facing_rotation_degrees(0.0), 0.0);
        assert_eq!(facing_rotation_degrees(90.0), 270.0);
        assert_eq!(facing_rotation_degrees(180.0), 180.0);
        assert_eq!(facing_rotation_degrees(270.0), 90.0);
        // Wrapped yaw lands on the same facing.
        assert_eq!(facing_rotation_degrees(450.0), 270.0);
        assert_eq!(facing_rotation_degrees(-90.0), 90.0);
    }

    #[test]
    fn facing_ignores_camera_pitch_and_position() {
        let billboard = Billboard::new(Vec3::new(3.0, 0.0, -15.0), Vec2::new(2.0, 2.0));
        let mut camera = Camera::new(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            Vec3::Y,
            120.0,
            16.0 / 9.0,
            0.1,
            800.0,
        );
        camera.set_yaw(90.0);
        let reference = instance_matrix(&billboard, camera.yaw());

        camera.set_pitch(45.0);
        camera.set_position(Vec3::new(100.0, -3.0, 12.0));
        assert_eq!(instance_matrix(&billboard, camera.yaw()), reference);
    }

    #[test]
    fn instance_matrix_composes_translate_rotate_scale() {
        let billboard = Billboard::new(Vec3::new(1.0, 2.0, 3.0), Vec2::new(2.0, 4.0));
        let expected = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))
            * Mat4::from_rotation_y(270.0_f32.to_radians())
            * Mat4::from_scale(Vec3::new(2.0, 4.0, 0.0));
        assert!(instance_matrix(&billboard, 90.0).abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn quad_is_unit_sized_with_bottom_center_origin() {
        for v in &QUAD {
            assert!(v.position[0] >= -0.5 && v.position[0] <= 0.5);
            assert!(v.position[1] >= 0.0 && v.position[1] <= 1.0);
            assert_eq!(v.position[2], 0.0);
        }
        assert_eq!(QUAD.len(), 6);
    }

    #[test]
    fn draw_before_init_is_rejected() {
        let renderer = BillboardRenderer::new(None);
        assert_eq!(
            renderer.gpu().err(),
            Some(RenderError::NotInitialized("billboard"))
        );
    }

    #[test]
    fn teardown_is_idempotent() {
        let mut renderer = BillboardRenderer::new(None);
        renderer.add(Billboard::new(Vec3::ZERO, Vec2::ONE));
        renderer.teardown();
        renderer.teardown();
        assert!(!renderer.is_initialized());
        assert_eq!(renderer.instances().len(), 1);
    }
}
