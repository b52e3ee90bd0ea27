use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use wgpu::util::DeviceExt;

use vantage_assets::ImageData;
use vantage_render::{Camera, RenderStage};

use crate::scene::{DEPTH_FORMAT, Drawable};
use crate::shaders;
use crate::texture::CubemapTexture;
use crate::RenderError;

/// Remove the translation column from a view matrix so the skybox cube stays
/// centered on the viewer wherever the camera is.
pub fn strip_translation(view: Mat4) -> Mat4 {
    let mut m = view;
    m.w_axis = Vec4::W;
    m
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct SkyVertex {
    position: [f32; 3],
}

const SIDE: f32 = 1.0;

// Unit cube as a plain triangle list; the object-space position doubles as
// the cubemap sample direction, so winding never matters (culling is off).
#[rustfmt::skip]
const CUBE: [SkyVertex; 36] = [
    // -Z face
    SkyVertex { position: [-SIDE,  SIDE, -SIDE] },
    SkyVertex { position: [-SIDE, -SIDE, -SIDE] },
    SkyVertex { position: [ SIDE, -SIDE, -SIDE] },
    SkyVertex { position: [ SIDE, -SIDE, -SIDE] },
    SkyVertex { position: [ SIDE,  SIDE, -SIDE] },
    SkyVertex { position: [-SIDE,  SIDE, -SIDE] },
    // +Z face
    SkyVertex { position: [-SIDE,  SIDE,  SIDE] },
    SkyVertex { position: [-SIDE, -SIDE,  SIDE] },
    SkyVertex { position: [ SIDE, -SIDE,  SIDE] },
    SkyVertex { position: [ SIDE, -SIDE,  SIDE] },
    SkyVertex { position: [ SIDE,  SIDE,  SIDE] },
    SkyVertex { position: [-SIDE,  SIDE,  SIDE] },
    // -X face
    SkyVertex { position: [-SIDE, -SIDE,  SIDE] },
    SkyVertex { position: [-SIDE,  SIDE,  SIDE] },
    SkyVertex { position: [-SIDE,  SIDE, -SIDE] },
    SkyVertex { position: [-SIDE,  SIDE, -SIDE] },
    SkyVertex { position: [-SIDE, -SIDE, -SIDE] },
    SkyVertex { position: [-SIDE, -SIDE,  SIDE] },
    // +X face
    SkyVertex { position: [ SIDE, -SIDE,  SIDE] },
    SkyVertex { position: [ SIDE,  SIDE,  SIDE] },
    SkyVertex { position: [ SIDE,  SIDE, -SIDE] },
    SkyVertex { position: [ SIDE,  SIDE, -SIDE] },
    SkyVertex { position: [ SIDE, -SIDE, -SIDE] },
    SkyVertex { position: [ SIDE, -SIDE,  SIDE] },
    // +Y face
    SkyVertex { position: [-SIDE,  SIDE,  SIDE] },
    SkyVertex { position: [ SIDE,  SIDE,  SIDE] },
    SkyVertex { position: [ SIDE,  SIDE, -SIDE] },
    SkyVertex { position: [ SIDE,  SIDE, -SIDE] },
    SkyVertex { position: [-SIDE,  SIDE, -SIDE] },
    SkyVertex { position: [-SIDE,  SIDE,  SIDE] },
    // -Y face
    SkyVertex { position: [-SIDE, -SIDE,  SIDE] },
    SkyVertex { position: [ SIDE, -SIDE,  SIDE] },
    SkyVertex { position: [ SIDE, -SIDE, -SIDE] },
    SkyVertex { position: [ SIDE, -SIDE, -SIDE] },
    SkyVertex { position: [-SIDE, -SIDE, -SIDE] },
    SkyVertex { position: [-SIDE, -SIDE,  SIDE] },
];

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct SkyboxUniforms {
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
}

/// Draws an inside-out cube sampled from a 6-face cubemap.
///
/// Construction is atomic: the cubemap texture, the cube vertex buffer, and
/// the shader pipeline are all built before the value exists, from faces the
/// asset layer already decoded and validated. The pipeline neither tests nor
/// writes depth, so the background never occludes anything and nothing needs
/// restoring afterwards.
pub struct SkyboxRenderer {
    gpu: Option<SkyboxGpu>,
}

struct SkyboxGpu {
    pipeline: wgpu::RenderPipeline,
    cube_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    // The cubemap lives exactly as long as the rest of the skybox state.
    _cubemap: CubemapTexture,
}

impl SkyboxRenderer {
    /// Build the cubemap, cube buffer, and pipeline from six decoded faces
    /// in +X, -X, +Y, -Y, +Z, -Z order.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        faces: &[ImageData; 6],
    ) -> Self {
        let cubemap = CubemapTexture::new(device, queue, faces, Some("skybox_cubemap"));

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("skybox_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SKYBOX_SHADER.into()),
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("skybox_uniforms"),
            contents: bytemuck::bytes_of(&SkyboxUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("skybox_bind_group_layout"),
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
                        view_dimension: wgpu::TextureViewDimension::Cube,
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
            label: Some("skybox_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(cubemap.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(cubemap.sampler()),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("skybox_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("skybox_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<SkyVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
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
                // Drawn from inside the cube.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let cube_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("skybox_cube_buffer"),
            contents: bytemuck::cast_slice(&CUBE),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            gpu: Some(SkyboxGpu {
                pipeline,
                cube_buffer,
                uniform_buffer,
                bind_group,
                _cubemap: cubemap,
            }),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.gpu.is_some()
    }

    fn gpu(&self) -> Result<&SkyboxGpu, RenderError> {
        self.gpu
            .as_ref()
            .ok_or(RenderError::NotInitialized("skybox"))
    }
}

impl Drawable for SkyboxRenderer {
    fn stage(&self) -> RenderStage {
        RenderStage::Background
    }

    fn prepare(&mut self, queue: &wgpu::Queue, camera: &Camera) -> Result<(), RenderError> {
        let gpu = self.gpu()?;
        let uniforms = SkyboxUniforms {
            view: strip_translation(camera.view_matrix()).to_cols_array_2d(),
            projection: camera.projection_matrix().to_cols_array_2d(),
        };
        queue.write_buffer(&gpu.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        Ok(())
    }

    fn record(&self, pass: &mut wgpu::RenderPass<'_>) -> Result<(), RenderError> {
        let gpu = self.gpu()?;
        pass.set_pipeline(&gpu.pipeline);
        pass.set_bind_group(0, &gpu.bind_group, &[]);
        pass.set_vertex_buffer(0, gpu.cube_buffer.slice(..));
        pass.draw(0..CUBE.len() as u32, 0..1);
        Ok(())
    }

    fn teardown(&mut self) {
        self.gpu = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn stripped_view_has_no_translation() {
        let position = Vec3::new(12.0, -4.0, 33.0);
        let camera = Camera::new(
            position,
            Vec3::ZERO,
            Vec3::Y,
            120.0,
            16.0 / 9.0,
            0.1,
            800.0,
        );

        let stripped = strip_translation(camera.view_matrix());
        assert_eq!(stripped.w_axis, Vec4::W);

        // The camera's own view matrix still carries the position.
        assert_ne!(camera.view_matrix().w_axis, Vec4::W);
        let rotation_only = Mat4::from_mat3(glam::Mat3::from_mat4(camera.view_matrix()));
        assert!(stripped.abs_diff_eq(rotation_only, 1e-6));
    }

    #[test]
    fn cube_covers_all_six_directions() {
        assert_eq!(CUBE.len(), 36);
        for axis in 0..3 {
            for sign in [-SIDE, SIDE] {
                assert!(
                    CUBE.iter().any(|v| v.position[axis] == sign
                        && v.position.iter().all(|c| c.abs() == SIDE)),
                    "missing corner coverage on axis {axis} sign {sign}"
                );
            }
        }
    }
}
