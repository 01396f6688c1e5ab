use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use morph_tree::camera::OrbitCamera;
use morph_tree::input::{InputAction, InputHandler};
use morph_tree::renderer::{create_depth_view, SceneRenderer};
use morph_tree::{Scene, SceneConfig, SceneError, SceneResult};

struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    renderer: SceneRenderer,
}

impl Gpu {
    fn new(window: Arc<Window>, scene: &Scene) -> SceneResult<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;
        log::info!("🖥️ Using adapter: {}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Morph Tree Device"),
            ..Default::default()
        }))?;

        let config = surface
            .get_default_config(&adapter, size.width.max(1), size.height.max(1))
            .ok_or(SceneError::UnsupportedSurface)?;
        surface.configure(&device, &config);

        let depth_view = create_depth_view(&device, config.width, config.height);
        let renderer = SceneRenderer::new(&device, config.format, scene);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            depth_view,
            renderer,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, width, height);
    }
}

struct App {
    scene: Scene,
    camera: OrbitCamera,
    gpu: Option<Gpu>,
    start: Instant,
    last_frame: Instant,
    error: Option<SceneError>,
}

impl App {
    fn new(scene: Scene) -> Self {
        let camera = OrbitCamera::new(scene.config().camera.clone(), 16.0 / 10.0);
        let now = Instant::now();
        Self {
            scene,
            camera,
            gpu: None,
            start: now,
            last_frame: now,
            error: None,
        }
    }

    fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    fn handle_action(&mut self, action: InputAction, event_loop: &ActiveEventLoop) {
        match action {
            InputAction::Quit => event_loop.exit(),
            InputAction::CycleMode => {
                self.scene.cycle_mode();
            }
            InputAction::MakeWish => {
                let now = self.elapsed();
                self.scene.make_wish(now);
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        let elapsed = self.elapsed();

        let camera_position = self.camera.position(elapsed);
        self.scene.frame(elapsed, dt, camera_position);

        let Some(gpu) = self.gpu.as_mut() else { return };
        gpu.renderer.upload(&gpu.device, &gpu.queue, &mut self.scene);

        let frame = match gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                let (width, height) = (gpu.config.width, gpu.config.height);
                gpu.resize(width, height);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Surface out of memory, exiting");
                event_loop.exit();
                return;
            }
            Err(e) => {
                log::warn!("Skipping frame: {}", e);
                return;
            }
        };

        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });
        gpu.renderer.render(
            &gpu.queue,
            &mut encoder,
            &view,
            &gpu.depth_view,
            self.camera.view_proj(elapsed),
            camera_position,
            elapsed,
        );
        gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        let attributes = Window::default_attributes()
            .with_title("Morph Tree")
            .with_inner_size(LogicalSize::new(1280.0, 800.0));

        let gpu = event_loop
            .create_window(attributes)
            .map_err(SceneError::from)
            .and_then(|window| Gpu::new(Arc::new(window), &self.scene));

        match gpu {
            Ok(gpu) => {
                let size = gpu.window.inner_size();
                self.camera.set_aspect(size.width, size.height);
                self.gpu = Some(gpu);
                log::info!("🎄 Space cycles shape, Enter makes a wish, Q quits");
            }
            Err(e) => {
                log::error!("Failed to start renderer: {}", e);
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if let Some(action) = InputHandler::handle_window_event(&event) {
            self.handle_action(action, event_loop);
            return;
        }

        match event {
            WindowEvent::Resized(size) => {
                self.camera.set_aspect(size.width, size.height);
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("📄 Loading config from {}", path);
            SceneConfig::load(path)?
        }
        None => {
            let config = SceneConfig::default();
            config.validate()?;
            config
        }
    };

    let mut rng = rand::thread_rng();
    let scene = Scene::new(config, &mut rng);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(scene);
    event_loop.run_app(&mut app)?;

    if let Some(e) = app.error.take() {
        return Err(e.into());
    }
    Ok(())
}
