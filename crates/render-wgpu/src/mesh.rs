use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use wgpu::util::DeviceExt;

use vantage_assets::MeshData;
use vantage_common::{Transform, Vertex};
use vantage_render::{Camera, RenderStage};

use crate::scene::{DEPTH_FORMAT, Drawable};
use crate::shaders;
use crate::texture::Texture2d;
use crate::RenderError;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct MeshUniforms {
    transform: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
}

/// Draws one imported triangle mesh with a material texture.
///
/// Owns the vertex buffer uploaded once from its mesh store, the shader
/// pipeline, and a per-instance [`Transform`]. The material is shared: the
/// texture outlives this renderer if anything else still references it.
pub struct MeshRenderer {
    mesh: MeshData,
    material: Option<Arc<Texture2d>>,
    transform: Transform,
    gpu: Option<MeshGpu>,
}

struct MeshGpu {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    // Held so the shared texture outlives the bind group referencing it.
    _material: Arc<Texture2d>,
}

impl MeshRenderer {
    /// Wrap a loaded mesh. `material` may be absent when its decode failed;
    /// `init` then binds a white fallback texture instead.
    pub fn new(mesh: MeshData, material: Option<Arc<Texture2d>>) -> Self {
        Self {
            mesh,
            material,
            transform: Transform::default(),
            gpu: None,
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.transform.rotation = rotation;
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.transform.scale = scale;
    }

    pub fn set_material(&mut self, material: Arc<Texture2d>) {
        self.material = Some(material);
    }

    pub fn is_initialized(&self) -> bool {
        self.gpu.is_some()
    }

    fn gpu(&self) -> Result<&MeshGpu, RenderError> {
        self.gpu.as_ref().ok_or(RenderError::NotInitialized("mesh"))
    }

    /// Build the pipeline and upload the mesh store's vertices once.
    pub fn init(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Result<(), RenderError> {
        if self.gpu.is_some() {
            return Err(RenderError::AlreadyInitialized("mesh"));
        }
        if self.mesh.is_empty() {
            return Err(RenderError::EmptyMesh("mesh"));
        }

        let material = self
            .material
            .clone()
            .unwrap_or_else(|| Arc::new(Texture2d::fallback(device, queue)));

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::MESH_SHADER.into()),
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_uniforms"),
            contents: bytemuck::bytes_of(&MeshUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("mesh_bind_group_layout"),
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
            label: Some("mesh_bind_group"),
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
            label: Some("mesh_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x2,
                    ],
                }],
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

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertex_buffer"),
            contents: bytemuck::cast_slice(self.mesh.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        self.gpu = Some(MeshGpu {
            pipeline,
            vertex_buffer,
            vertex_count: self.mesh.vertex_count(),
            uniform_buffer,
            bind_group,
            _material: material,
        });
        Ok(())
    }
}

impl Drawable for MeshRenderer {
    fn stage(&self) -> RenderStage {
        RenderStage::Opaque
    }

    fn prepare(&mut self, queue: &wgpu::Queue, camera: &Camera) -> Result<(), RenderError> {
        let gpu = self.gpu()?;
        let uniforms = MeshUniforms {
            transform: self.transform.matrix().to_cols_array_2d(),
            view: camera.view_matrix().to_cols_array_2d(),
            projection: camera.projection_matrix().to_cols_array_2d(),
        };
        queue.write_buffer(&gpu.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        Ok(())
    }

    fn record(&self, pass: &mut wgpu::RenderPass<'_>) -> Result<(), RenderError> {
        let gpu = self.gpu()?;
        pass.set_pipeline(&gpu.pipeline);
        pass.set_bind_group(0, &gpu.bind_group, &[]);
        pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
        pass.draw(0..gpu.vertex_count, 0..1);
        Ok(())
    }

    fn teardown(&mut self) {
        self.gpu = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshData {
        MeshData::from_vertices(vec![
            Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0]),
            Vertex::new([1.0, 0.0, 0.0], [1.0, 0.0]),
            Vertex::new([0.0, 1.0, 0.0], [0.0, 1.0]),
        ])
    }

    #[test]
    fn draw_before_init_is_rejected() {
        let renderer = MeshRenderer::new(triangle(), None);
        assert!(!renderer.is_initialized());
        assert_eq!(
            renderer.gpu().err(),
            Some(RenderError::NotInitialized("mesh"))
        );
    }

    #[test]
    fn teardown_is_idempotent() {
        let mut renderer = MeshRenderer::new(triangle(), None);
        renderer.teardown();
        renderer.teardown();
        assert!(!renderer.is_initialized());
    }

    #[test]
    fn transform_mutators_apply() {
        let mut renderer = MeshRenderer::new(triangle(), None);
        renderer.set_position(Vec3::new(0.0, 0.0, -20.0));
        renderer.set_scale(Vec3::new(5.0, 5.0, 10.0));
        renderer.set_rotation(Vec3::new(0.0, 45.0, 0.0));
        let t = renderer.transform();
        assert_eq!(t.position, Vec3::new(0.0, 0.0, -20.0));
        assert_eq!(t.scale, Vec3::new(5.0, 5.0, 10.0));
        assert_eq!(t.rotation, Vec3::new(0.0, 45.0, 0.0));
    }

    #[test]
    fn mesh_uniforms_layout_is_three_mat4() {
        assert_eq!(std::mem::size_of::<MeshUniforms>(), 3 * 64);
    }
}
