use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use citydrive_common::FrameOutput;
use citydrive_input::KeyBindings;
use citydrive_kernel::{DriveConfig, Session};
use citydrive_render::CityScene;
use citydrive_render_wgpu::{ChaseView, WgpuRenderer};
use clap::Parser;
use egui::Context as EguiContext;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "citydrive-desktop", about = "Drive a car around a toy city")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON config file; defaults are used for missing fields
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Longest frame gap fed to the tick driver; longer stalls are treated as this.
const MAX_FRAME_TIME: Duration = Duration::from_millis(100);

/// Browser-style identifier for the physical keys the driving bindings use.
fn key_identifier(code: KeyCode) -> Option<&'static str> {
    Some(match code {
        KeyCode::KeyW => "w",
        KeyCode::KeyA => "a",
        KeyCode::KeyS => "s",
        KeyCode::KeyD => "d",
        KeyCode::ArrowUp => "ArrowUp",
        KeyCode::ArrowDown => "ArrowDown",
        KeyCode::ArrowLeft => "ArrowLeft",
        KeyCode::ArrowRight => "ArrowRight",
        _ => return None,
    })
}

/// Simulation-side application state.
struct AppState {
    session: Session,
    scene: CityScene,
    view: ChaseView,
    frame: FrameOutput,
    last_frame: Instant,
    show_hud: bool,
}

impl AppState {
    fn new(mut config: DriveConfig) -> Result<Self> {
        if config.bindings == KeyBindings::default() {
            config.bindings = config.bindings.with_arrow_keys();
        }
        config.record_log = false;
        let view = ChaseView::with_fov_degrees(config.camera.fov_degrees as f32);
        let session = Session::start(config).context("invalid drive configuration")?;
        let frame = session.output();
        Ok(Self {
            session,
            scene: CityScene::generate(),
            view,
            frame,
            last_frame: Instant::now(),
            show_hud: true,
        })
    }

    fn update(&mut self) {
        let now = Instant::now();
        let elapsed = (now - self.last_frame).min(MAX_FRAME_TIME);
        self.last_frame = now;
        self.frame = self.session.frame(elapsed);
    }

    /// Returns `false` when the app should exit.
    fn handle_key(&mut self, code: KeyCode, pressed: bool) -> bool {
        if let Some(key) = key_identifier(code) {
            if pressed {
                self.session.key_down(key);
            } else {
                self.session.key_up(key);
            }
            return true;
        }

        if !pressed {
            return true;
        }

        match code {
            KeyCode::KeyR => {
                self.session.reset();
                self.frame = self.session.output();
                tracing::info!("vehicle reset");
            }
            KeyCode::F1 => {
                self.show_hud = !self.show_hud;
            }
            KeyCode::Escape => return false,
            _ => {}
        }
        true
    }

    fn draw_hud(&self, ctx: &EguiContext) {
        if !self.show_hud {
            return;
        }
        let f = &self.frame;
        let p = f.vehicle.position;
        egui::Window::new("citydrive")
            .anchor(egui::Align2::LEFT_TOP, [12.0, 12.0])
            .resizable(false)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.label(format!("Tick: {}", f.tick));
                ui.label(format!("Speed: {:+.3}", f.speed));
                ui.add(
                    egui::ProgressBar::new(((f.steering + 1.0) / 2.0) as f32)
                        .text(format!("Steering {:+.2}", f.steering)),
                );
                ui.label(format!("Heading: {:.1}°", f.vehicle.heading.to_degrees()));
                ui.label(format!("Position: ({:.1}, {:.1}, {:.1})", p.x, p.y, p.z));
                ui.separator();
                ui.small("WASD / arrows: drive | R: reset | F1: HUD | Esc: quit");
            });
    }

    fn shutdown(self) {
        let summary = self.session.end();
        tracing::info!(
            ticks = summary.ticks,
            distance = summary.distance,
            "citydrive-desktop exiting"
        );
    }
}

/// GPU and window resources, created once the event loop resumes.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext, ground_size: f32) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("citydrive")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("citydrive_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(&device, format, config.width, config.height, ground_size);
        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, format, None, 1, false);

        tracing::info!(backend = ?adapter.get_info().backend, "GPU initialized");

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn redraw(&mut self, state: &AppState, egui_ctx: &EguiContext) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let target = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut view = state.view;
        view.set_viewport(self.config.width, self.config.height);
        self.renderer.render(
            &self.device,
            &self.queue,
            &target,
            &view,
            &state.scene,
            &state.frame,
        );

        self.paint_hud(state, egui_ctx, &target);
        output.present();
    }

    fn paint_hud(&mut self, state: &AppState, egui_ctx: &EguiContext, target: &wgpu::TextureView) {
        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| state.draw_hud(ctx));
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("hud_encoder"),
            });
        self.egui_renderer
            .update_buffers(&self.device, &self.queue, &mut encoder, &paint_jobs, &screen);
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("hud_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer.render(&mut pass, &paint_jobs, &screen);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

struct DriveApp {
    state: Option<AppState>,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    error: Option<anyhow::Error>,
}

impl DriveApp {
    fn new(state: AppState) -> Self {
        Self {
            state: Some(state),
            gpu: None,
            egui_ctx: EguiContext::default(),
            error: None,
        }
    }

    /// Stop the loop and end the session; the session releases its keys.
    fn exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(state) = self.state.take() {
            state.shutdown();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for DriveApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        let Some(state) = &self.state else {
            return;
        };
        match Gpu::new(event_loop, &self.egui_ctx, state.scene.ground_size) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("GPU setup failed: {e:#}");
                self.error = Some(e);
                self.exit(event_loop);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let (Some(gpu), Some(state)) = (&mut self.gpu, &mut self.state) else {
            return;
        };

        if gpu.egui_winit.on_window_event(&gpu.window, &event).consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.exit(event_loop),
            WindowEvent::Focused(false) => state.session.release_keys(),
            WindowEvent::Resized(size) => gpu.resize(size),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: key_state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if !state.handle_key(code, key_state == ElementState::Pressed) {
                    self.exit(event_loop);
                }
            }
            WindowEvent::RedrawRequested => {
                state.update();
                gpu.redraw(state, &self.egui_ctx);
                gpu.window.request_redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = self.state.take() {
            state.shutdown();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => DriveConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => DriveConfig::default(),
    };

    tracing::info!("citydrive-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DriveApp::new(AppState::new(config)?);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
