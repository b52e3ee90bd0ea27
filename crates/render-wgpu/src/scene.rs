use vantage_render::{Camera, RenderStage};

use crate::RenderError;

/// Capability surface shared by every drawable variant.
///
/// A drawable owns its GPU resources between initialization and `teardown`
/// and draws in exactly one stage. The draw protocol is split to fit the
/// command-encoder model: `prepare` uploads per-frame data before the render
/// pass opens, `record` emits draw commands inside it.
pub trait Drawable {
    /// The stage this drawable renders in.
    fn stage(&self) -> RenderStage;

    /// Upload per-frame data (uniforms, instance buffers). Runs before the
    /// render pass opens.
    fn prepare(&mut self, queue: &wgpu::Queue, camera: &Camera) -> Result<(), RenderError>;

    /// Record draw commands into the open pass.
    fn record(&self, pass: &mut wgpu::RenderPass<'_>) -> Result<(), RenderError>;

    /// Release GPU resources. Safe to call repeatedly; subsequent draws are
    /// rejected with [`RenderError::NotInitialized`].
    fn teardown(&mut self);
}

/// Background clear color behind all drawables.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.392,
    g: 0.584,
    b: 0.929,
    a: 1.0,
};

/// Depth buffer format shared by every drawable pipeline.
pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Owns the frame sequence: clear, then every render stage in fixed order.
///
/// Drawables are borrowed per frame so the caller keeps concrete access to
/// them between frames (for transforms, instance lists, teardown).
pub struct SceneRenderer {
    depth_view: wgpu::TextureView,
}

impl SceneRenderer {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self {
            depth_view: create_depth_texture(device, width, height),
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_view = create_depth_texture(device, width, height);
    }

    /// Render one frame into `target`: clear color and depth, then submit
    /// each drawable in [`RenderStage::ORDER`].
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        camera: &Camera,
        drawables: &mut [&mut dyn Drawable],
    ) -> Result<(), RenderError> {
        for drawable in drawables.iter_mut() {
            drawable.prepare(queue, camera)?;
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scene_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            for stage in RenderStage::ORDER {
                for drawable in drawables.iter() {
                    if drawable.stage() == stage {
                        drawable.record(&mut pass)?;
                    }
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
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
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}
