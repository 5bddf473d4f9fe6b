use anyhow::{Context, Result};
use clap::Parser;
use drivescape_frame::FrameDriver;
use drivescape_input::{Action, InputMapper, Key};
use drivescape_kernel::{MotionParams, Simulation, VehicleState};
use drivescape_render::{CameraControl, FixedCamera, RenderView};
use drivescape_render_wgpu::{OrbitCamera, OrbitConfig, WgpuRenderer};
use drivescape_scene::{SceneGraph, SceneHandles, build_scene};
use drivescape_textures::{TextureSet, TextureSynth};
use drivescape_tools::{Notifications, TelemetryInspector};
use egui::Context as EguiContext;
use glam::Vec2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "drivescape-desktop", about = "Drive a toy vehicle around a procedural scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Seed for textures and tree placement; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// JSON file overriding the motion tuning
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// Vertical field of view of the orbit camera, degrees
    #[arg(long, default_value_t = 75.0)]
    fov: f32,
}

fn map_key(code: KeyCode) -> Key {
    match code {
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::Space => Key::Space,
        KeyCode::KeyR => Key::R,
        KeyCode::KeyG => Key::G,
        _ => Key::Other,
    }
}

/// The interactive orbit camera, or a fixed view when it could not be set up.
enum CameraRig {
    Orbit(OrbitCamera),
    Frozen(FixedCamera),
}

impl CameraRig {
    fn new(config: OrbitConfig) -> Self {
        match OrbitCamera::new(config) {
            Ok(camera) => Self::Orbit(camera),
            Err(e) => {
                tracing::error!("orbit camera unavailable, continuing with a fixed view: {e}");
                Self::Frozen(FixedCamera::default())
            }
        }
    }

    fn control(&mut self) -> &mut dyn CameraControl {
        match self {
            Self::Orbit(camera) => camera,
            Self::Frozen(camera) => camera,
        }
    }

    fn view(&self) -> RenderView {
        match self {
            Self::Orbit(camera) => camera.view(),
            Self::Frozen(camera) => camera.view(),
        }
    }

    fn orbit(&mut self) -> Option<&mut OrbitCamera> {
        match self {
            Self::Orbit(camera) => Some(camera),
            Self::Frozen(_) => None,
        }
    }
}

#[derive(Default)]
struct MouseDrag {
    rotating: bool,
    panning: bool,
    cursor: Option<Vec2>,
}

/// Application state.
struct AppState {
    sim: Simulation,
    mapper: InputMapper,
    scene: SceneGraph,
    handles: SceneHandles,
    textures: TextureSet,
    camera: CameraRig,
    driver: FrameDriver,
    toasts: Notifications,
    mouse: MouseDrag,
    show_telemetry: bool,
}

impl AppState {
    fn new(params: MotionParams, rng: &mut StdRng, orbit: OrbitConfig) -> Result<Self> {
        let textures = TextureSynth::new(&mut *rng).generate_all()?;
        let vehicle = VehicleState::at_rest(params.spawn_position);
        let (scene, handles) = build_scene(&textures, rng, &vehicle)?;
        Ok(Self {
            sim: Simulation::new(params),
            mapper: InputMapper::new(),
            scene,
            handles,
            textures,
            camera: CameraRig::new(orbit),
            driver: FrameDriver::new(params.max_dt),
            toasts: Notifications::new(),
            mouse: MouseDrag::default(),
            show_telemetry: true,
        })
    }

    fn handle_key(&mut self, code: KeyCode, pressed: bool, repeat: bool, now: Instant) {
        if code == KeyCode::F1 {
            if pressed && !repeat {
                self.show_telemetry = !self.show_telemetry;
            }
            return;
        }
        let key = map_key(code);
        let action = match (pressed, repeat) {
            (true, true) => self.mapper.key_repeated(key),
            (true, false) => self.mapper.key_pressed(key),
            (false, _) => self.mapper.key_released(key),
        };
        if let Some(action) = action {
            self.dispatch(action, now);
        }
    }

    fn release_keys(&mut self, now: Instant) {
        if let Some(action) = self.mapper.release_all() {
            self.dispatch(action, now);
        }
    }

    fn dispatch(&mut self, action: Action, now: Instant) {
        if matches!(action, Action::ToggleGrid) {
            match self.scene.toggle_visible(self.handles.grid) {
                Ok(visible) => tracing::debug!(visible, "grid toggled"),
                Err(e) => tracing::error!("failed to toggle grid: {e}"),
            }
        }
        if let Some(notice) = self.sim.apply(&action) {
            tracing::info!("{notice}");
            self.toasts.push(notice.to_string(), now);
        }
    }

    fn mouse_button(&mut self, button: MouseButton, pressed: bool) {
        match button {
            MouseButton::Left => self.mouse.rotating = pressed,
            MouseButton::Right => self.mouse.panning = pressed,
            _ => {}
        }
    }

    fn cursor_moved(&mut self, position: Vec2, viewport_height: f32) {
        let Some(last) = self.mouse.cursor.replace(position) else {
            return;
        };
        let delta = position - last;
        let (rotating, panning) = (self.mouse.rotating, self.mouse.panning);
        if let Some(orbit) = self.camera.orbit() {
            if rotating {
                orbit.rotate(delta, viewport_height);
            }
            if panning {
                orbit.pan(delta, viewport_height);
            }
        }
    }

    fn scroll(&mut self, delta: MouseScrollDelta) {
        let lines = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
        };
        if let Some(orbit) = self.camera.orbit() {
            orbit.zoom(lines);
        }
    }

    fn frame(&mut self, now: Instant, request_redraw: impl FnOnce()) {
        let camera = self.camera.control();
        match self.driver.tick(
            now,
            &mut self.sim,
            &mut self.scene,
            &self.handles,
            Some(camera),
            request_redraw,
        ) {
            Ok(report) => tracing::trace!(frame = report.frame, dt = report.dt, "tick"),
            Err(e) => tracing::error!("failed to update vehicle nodes: {e}"),
        }
        // Nothing replays a live session; keep the log from growing.
        self.sim.drain_events();
    }

    fn draw_ui(&mut self, ctx: &EguiContext, now: Instant) {
        let toasts: Vec<&str> = self.toasts.active(now).collect();
        if !toasts.is_empty() {
            egui::Area::new(egui::Id::new("notifications"))
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .interactable(false)
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        for text in toasts {
                            ui.heading(text);
                        }
                    });
                });
        }

        if !self.show_telemetry {
            return;
        }
        let telemetry = TelemetryInspector::summary(&self.sim);
        egui::SidePanel::left("telemetry")
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Drivescape");
                ui.separator();
                ui.label(format!("Tick: {}", telemetry.tick));
                match (telemetry.position, telemetry.heading_degrees, telemetry.speed) {
                    (Some(p), Some(heading), Some(speed)) => {
                        ui.label(format!("Position: ({:.1}, {:.1}, {:.1})", p.x, p.y, p.z));
                        ui.label(format!("Heading: {heading:.0} deg"));
                        ui.label(format!("Speed: {speed:.1}"));
                    }
                    _ => {
                        ui.label("No vehicle");
                    }
                }
                ui.label(format!(
                    "Gravity: {}",
                    if telemetry.gravity { "on" } else { "off" }
                ));
                ui.label(format!("Keys: {}", telemetry.intent));
                ui.separator();

                ui.heading("Controls");
                egui::Grid::new("controls").striped(true).show(ui, |ui| {
                    for (keys, effect) in TelemetryInspector::controls() {
                        ui.label(*keys);
                        ui.label(*effect);
                        ui.end_row();
                    }
                });
                ui.separator();
                ui.small("Esc: quit");
            });
    }
}

/// Everything that only exists once a window is open.
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
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext, textures: &TextureSet) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Drivescape")
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
        .context("no graphics adapter can present to this window")?;
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("drivescape_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .context("surface reports no texture formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(
            &device,
            &queue,
            surface_format,
            config.width,
            config.height,
            textures,
        );
        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );
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

    fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn draw(&mut self, state: &mut AppState, egui_ctx: &EguiContext, now: Instant) {
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
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.prepare(&self.device, &state.scene);
        self.renderer.render(
            &self.device,
            &self.queue,
            &view,
            &state.scene,
            &state.camera.view(),
        );

        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| state.draw_ui(ctx, now));
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
                label: Some("overlay_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("overlay_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
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
        output.present();
    }
}

/// Releases must reach the app even over the overlay, or keys and drags stick.
fn is_release(event: &WindowEvent) -> bool {
    matches!(
        event,
        WindowEvent::MouseInput {
            state: ElementState::Released,
            ..
        } | WindowEvent::KeyboardInput {
            event: KeyEvent {
                state: ElementState::Released,
                ..
            },
            ..
        }
    )
}

struct DesktopApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    fatal: Option<anyhow::Error>,
}

impl ApplicationHandler for DesktopApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &self.egui_ctx, &self.state.textures) {
            Ok(gpu) => {
                self.state.camera.control().set_aspect(gpu.aspect());
                self.state.driver.clock_mut().restart();
                gpu.window.request_redraw();
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("failed to initialize graphics: {e:#}");
                self.fatal = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
        if response.consumed && !is_release(&event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                gpu.resize(size);
                self.state.camera.control().set_aspect(gpu.aspect());
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: key_state,
                        repeat,
                        ..
                    },
                ..
            } => {
                let pressed = key_state == ElementState::Pressed;
                if code == KeyCode::Escape && pressed {
                    event_loop.exit();
                    return;
                }
                self.state.handle_key(code, pressed, repeat, Instant::now());
            }
            WindowEvent::Focused(false) => {
                self.state.release_keys(Instant::now());
                self.state.mouse = MouseDrag::default();
            }
            WindowEvent::MouseInput {
                button,
                state: btn_state,
                ..
            } => {
                self.state
                    .mouse_button(button, btn_state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                self.state
                    .cursor_moved(position, gpu.config.height as f32);
            }
            WindowEvent::CursorLeft { .. } => {
                self.state.mouse.cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.state.scroll(delta);
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let window = gpu.window.clone();
                self.state.frame(now, move || window.request_redraw());
                gpu.draw(&mut self.state, &self.egui_ctx, now);
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("drivescape-desktop starting");

    let params = match &cli.tuning {
        Some(path) => MotionParams::load(path)?,
        None => MotionParams::default(),
    };
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let orbit = OrbitConfig {
        fov_degrees: cli.fov,
        ..OrbitConfig::default()
    };
    let state = AppState::new(params, &mut rng, orbit)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DesktopApp {
        state,
        gpu: None,
        egui_ctx: EguiContext::default(),
        fatal: None,
    };
    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
