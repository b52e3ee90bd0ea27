use anyhow::Result;
use clap::Parser;
use glam::{Vec2, Vec3};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use vantage_assets::{decode_image, import_mesh, load_cubemap_faces};
use vantage_render::{Camera, NavInput};
use vantage_render_wgpu::{
    Billboard, BillboardRenderer, Drawable, MeshRenderer, SceneRenderer, SkyboxRenderer,
    Texture2d,
};

#[derive(Parser)]
#[command(name = "vantage-viewer", about = "Vantage desktop scene viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding the scene assets
    #[arg(long, default_value = "./assets")]
    assets: PathBuf,

    /// Disable vsync
    #[arg(long)]
    no_vsync: bool,
}

const MODEL_FILE: &str = "model.gltf";
const MATERIAL_FILE: &str = "material.png";
const BILLBOARD_FILE: &str = "billboard.png";
/// Skybox faces in +X, -X, +Y, -Y, +Z, -Z order.
const SKYBOX_FILES: [&str; 6] = [
    "right.jpg",
    "left.jpg",
    "top.jpg",
    "bottom.jpg",
    "front.jpg",
    "back.jpg",
];

/// Degrees of model spin per update tick.
const MODEL_SPIN: f32 = 2.5;

/// Application state that survives GPU setup.
struct AppState {
    camera: Camera,
    cursor: Vec2,
    cursor_seen: bool,
    keys_held: std::collections::HashSet<KeyCode>,
    assets_dir: PathBuf,
}

impl AppState {
    fn new(assets_dir: PathBuf) -> Self {
        Self {
            camera: Camera::new(
                Vec3::new(0.0, 0.0, 5.0),
                Vec3::ZERO,
                Vec3::Y,
                120.0,
                16.0 / 9.0,
                0.1,
                800.0,
            ),
            cursor: Vec2::ZERO,
            cursor_seen: false,
            keys_held: std::collections::HashSet::new(),
            assets_dir,
        }
    }

    fn nav_input(&self) -> NavInput {
        let held = |key| self.keys_held.contains(&key);
        NavInput {
            forward: held(KeyCode::KeyW) || held(KeyCode::ArrowUp),
            back: held(KeyCode::KeyS) || held(KeyCode::ArrowDown),
            strafe_left: held(KeyCode::KeyA) || held(KeyCode::ArrowLeft),
            strafe_right: held(KeyCode::KeyD) || held(KeyCode::ArrowRight),
        }
    }
}

/// The demo scene: a spinning textured model, one billboard, a skybox.
///
/// Each member is absent when its assets failed to load; the frame simply
/// draws whatever did load.
struct Scene {
    skybox: Option<SkyboxRenderer>,
    model: Option<MeshRenderer>,
    billboards: Option<BillboardRenderer>,
}

impl Scene {
    /// Load assets and initialize renderers. Every failure is logged and
    /// non-fatal: the affected renderer is left out of the scene.
    fn load(
        assets_dir: &Path,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let skybox_paths = SKYBOX_FILES.map(|name| assets_dir.join(name));
        let skybox = match load_cubemap_faces(&skybox_paths) {
            Ok(faces) => Some(SkyboxRenderer::new(device, queue, surface_format, &faces)),
            Err(e) => {
                tracing::error!("skybox unavailable: {e}");
                None
            }
        };

        let material = match decode_image(assets_dir.join(MATERIAL_FILE)) {
            Ok(image) => Some(Arc::new(Texture2d::new(
                device,
                queue,
                &image,
                Some("model_material"),
            ))),
            Err(e) => {
                tracing::error!("material unavailable: {e}");
                None
            }
        };

        let model = match import_mesh(assets_dir.join(MODEL_FILE)) {
            Ok(mesh) => {
                let mut renderer = MeshRenderer::new(mesh, material);
                renderer.set_position(Vec3::new(0.0, 0.0, -20.0));
                renderer.set_scale(Vec3::new(5.0, 5.0, 10.0));
                match renderer.init(device, queue, surface_format) {
                    Ok(()) => Some(renderer),
                    Err(e) => {
                        tracing::error!("model renderer unavailable: {e}");
                        None
                    }
                }
            }
            Err(e) => {
                tracing::error!("model unavailable: {e}");
                None
            }
        };

        let billboard_material = match decode_image(assets_dir.join(BILLBOARD_FILE)) {
            Ok(image) => Some(Arc::new(Texture2d::new(
                device,
                queue,
                &image,
                Some("billboard_material"),
            ))),
            Err(e) => {
                tracing::error!("billboard texture unavailable: {e}");
                None
            }
        };
        let billboards = {
            let mut renderer = BillboardRenderer::new(billboard_material);
            renderer.add(Billboard::new(Vec3::new(3.0, 0.0, -15.0), Vec2::new(2.0, 2.0)));
            match renderer.init(device, queue, surface_format) {
                Ok(()) => Some(renderer),
                Err(e) => {
                    tracing::error!("billboard renderer unavailable: {e}");
                    None
                }
            }
        };

        Self {
            skybox,
            model,
            billboards,
        }
    }

    /// Per-tick scene animation.
    fn update(&mut self) {
        if let Some(model) = &mut self.model {
            let mut rotation = model.transform().rotation;
            rotation.y += MODEL_SPIN;
            model.set_rotation(rotation);
        }
    }

    fn drawables(&mut self) -> Vec<&mut dyn Drawable> {
        let mut list: Vec<&mut dyn Drawable> = Vec::new();
        if let Some(skybox) = &mut self.skybox {
            list.push(skybox);
        }
        if let Some(model) = &mut self.model {
            list.push(model);
        }
        if let Some(billboards) = &mut self.billboards {
            list.push(billboards);
        }
        list
    }

    fn teardown(&mut self) {
        for drawable in self.drawables() {
            drawable.teardown();
        }
    }
}

struct GpuApp {
    state: AppState,
    present_mode: wgpu::PresentMode,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<SceneRenderer>,
    scene: Option<Scene>,
}

impl GpuApp {
    fn new(state: AppState, present_mode: wgpu::PresentMode) -> Self {
        Self {
            state,
            present_mode,
            window: None,
            surface: None,
            device: None,
            queue: None,
            config: None,
            renderer: None,
            scene: None,
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Vantage Viewer")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .expect("create surface");

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("find adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("vantage_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .expect("create device");

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: self.present_mode,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        self.state
            .camera
            .set_aspect(size.width as f32 / size.height.max(1) as f32);

        let renderer = SceneRenderer::new(&device, size.width, size.height);
        let scene = Scene::load(&self.state.assets_dir, &device, &queue, surface_format);

        let backend = adapter.get_info().backend.to_str();
        window.set_title(&format!("Vantage Viewer — {backend}"));
        tracing::info!("GPU initialized with {backend} backend");

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.config = Some(config);
        self.renderer = Some(renderer);
        self.scene = Some(scene);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(scene) = &mut self.scene {
                    scene.teardown();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let (Some(surface), Some(device), Some(config)) =
                    (&self.surface, &self.device, &mut self.config)
                {
                    config.width = new_size.width.max(1);
                    config.height = new_size.height.max(1);
                    surface.configure(device, config);
                    self.state
                        .camera
                        .set_aspect(config.width as f32 / config.height.max(1) as f32);
                    if let Some(renderer) = &mut self.renderer {
                        renderer.resize(device, config.width, config.height);
                    }
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                if key_state == ElementState::Pressed {
                    if key == KeyCode::Escape {
                        if let Some(scene) = &mut self.scene {
                            scene.teardown();
                        }
                        event_loop.exit();
                        return;
                    }
                    self.state.keys_held.insert(key);
                } else {
                    self.state.keys_held.remove(&key);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.state.cursor = Vec2::new(position.x as f32, position.y as f32);
                // The first position is a baseline, not a look delta.
                if !self.state.cursor_seen {
                    self.state.cursor_seen = true;
                    self.state.camera.set_last_cursor(self.state.cursor);
                }
            }
            WindowEvent::RedrawRequested => {
                let input = self.state.nav_input();
                self.state.camera.navigate(self.state.cursor, input);
                if let Some(scene) = &mut self.scene {
                    scene.update();
                }

                let (Some(surface), Some(device), Some(queue)) =
                    (&self.surface, &self.device, &self.queue)
                else {
                    return;
                };

                let output = match surface.get_current_texture() {
                    Ok(t) => t,
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        if let Some(config) = &self.config {
                            surface.configure(device, config);
                        }
                        return;
                    }
                    Err(e) => {
                        tracing::error!("surface error: {e}");
                        return;
                    }
                };

                let view = output
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());

                if let (Some(renderer), Some(scene)) = (&self.renderer, &mut self.scene) {
                    let mut drawables = scene.drawables();
                    if let Err(e) = renderer.render(
                        device,
                        queue,
                        &view,
                        &self.state.camera,
                        &mut drawables,
                    ) {
                        tracing::error!("frame dropped: {e}");
                    }
                }

                output.present();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("vantage-viewer starting");

    let present_mode = if cli.no_vsync {
        wgpu::PresentMode::AutoNoVsync
    } else {
        wgpu::PresentMode::AutoVsync
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(AppState::new(cli.assets), present_mode);
    event_loop.run_app(&mut app)?;

    Ok(())
}
