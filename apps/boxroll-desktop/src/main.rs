use anyhow::Result;
use boxroll_input::{roll_key, Action};
use boxroll_puzzle::{Level, Outcome, Phase, Puzzle};
use boxroll_render::{FrameInput, FrameSchedule};
use boxroll_render_wgpu::SceneRenderer;
use boxroll_scene::{LightRig, OrbitCamera};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{
    DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Delay between an off-map landing and the full reset.
const RESET_DELAY: Duration = Duration::from_millis(3000);

#[derive(Parser)]
#[command(name = "boxroll-desktop", about = "Rolling-box puzzle")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Level file (YAML); the built-in map when omitted
    #[arg(long)]
    level: Option<PathBuf>,
}

/// Application state: puzzle, camera, light, and presentation flags.
struct AppState {
    puzzle: Puzzle,
    camera: OrbitCamera,
    light: LightRig,
    schedule: FrameSchedule,
    effect_on: bool,
    reset_deadline: Option<Instant>,
    started: Instant,
    last_frame: Instant,
    dragging: bool,
}

impl AppState {
    fn new(level: Level) -> Self {
        Self {
            puzzle: Puzzle::new(level),
            camera: OrbitCamera::default(),
            light: LightRig::default(),
            schedule: FrameSchedule::new(),
            effect_on: false,
            reset_deadline: None,
            started: Instant::now(),
            last_frame: Instant::now(),
            dragging: false,
        }
    }

    fn apply_action(&mut self, action: Action) {
        match action {
            Action::Roll(direction) => {
                self.puzzle.request_roll(direction);
            }
            Action::Orbit(delta) => self.camera.orbit(delta.x, delta.y),
            Action::Zoom(steps) => self.camera.zoom(steps),
            Action::PanRate(delta) => self.camera.nudge_pan_rate(delta),
            Action::TiltRate(delta) => self.camera.nudge_tilt_rate(delta),
            Action::ToggleEffect => self.effect_on = !self.effect_on,
            Action::Reset => {
                self.puzzle.reset();
                self.effect_on = false;
                self.reset_deadline = None;
            }
            Action::Noop => {}
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool, repeat: bool) {
        if repeat {
            return;
        }
        let movement = match key {
            KeyCode::KeyW => Some('w'),
            KeyCode::KeyA => Some('a'),
            KeyCode::KeyS => Some('s'),
            KeyCode::KeyD => Some('d'),
            _ => None,
        };
        let action = match (key, pressed) {
            (KeyCode::ArrowLeft, true) => Action::PanRate(-1.0),
            (KeyCode::ArrowLeft, false) => Action::PanRate(1.0),
            (KeyCode::ArrowRight, true) => Action::PanRate(1.0),
            (KeyCode::ArrowRight, false) => Action::PanRate(-1.0),
            (KeyCode::ArrowUp, true) => Action::TiltRate(-1.0),
            (KeyCode::ArrowUp, false) => Action::TiltRate(1.0),
            (KeyCode::ArrowDown, true) => Action::TiltRate(1.0),
            (KeyCode::ArrowDown, false) => Action::TiltRate(-1.0),
            (KeyCode::KeyR, true) => Action::Reset,
            _ if pressed => movement
                .and_then(roll_key)
                .map(Action::Roll)
                .unwrap_or(Action::Noop),
            _ => Action::Noop,
        };
        self.apply_action(action);
    }

    fn update(&mut self, dt: f32) {
        self.camera.apply_rates();

        if let Some(outcome) = self.puzzle.advance(dt) {
            match outcome {
                Outcome::Moved => {}
                Outcome::Won => {
                    tracing::info!("puzzle solved");
                }
                Outcome::OffMap => {
                    // The invalid pose stays visible until the reset fires.
                    self.effect_on = true;
                    self.reset_deadline = Some(Instant::now() + RESET_DELAY);
                }
            }
        }

        if let Some(deadline) = self.reset_deadline {
            if Instant::now() >= deadline {
                self.apply_action(Action::Reset);
            }
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        egui::Window::new("boxroll")
            .default_width(220.0)
            .show(ctx, |ui| {
                let cell = self.puzzle.cell();
                ui.label(format!(
                    "Cell: ({:.1}, {:.1}, {:.1})",
                    cell.x as f32 / 100.0,
                    cell.y as f32 / 100.0,
                    cell.z as f32 / 100.0
                ));
                ui.checkbox(&mut self.effect_on, "Glitch effect");
                if ui.button("Reset (R)").clicked() {
                    self.apply_action(Action::Reset);
                }
                ui.separator();
                ui.small("WASD: roll | drag: orbit | wheel: zoom | arrows: pan/tilt");
            });

        if self.puzzle.phase() == Phase::Won {
            egui::Area::new(egui::Id::new("win-message"))
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.heading(egui::RichText::new("You win!").size(48.0).strong());
                });
        }
    }
}

struct GpuApp {
    state: AppState,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<SceneRenderer>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
}

impl GpuApp {
    fn new(level: Level) -> Self {
        Self {
            state: AppState::new(level),
            window: None,
            surface: None,
            device: None,
            queue: None,
            config: None,
            renderer: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Boxroll")
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
                label: Some("boxroll_device"),
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
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        self.state.camera.aspect = size.width as f32 / size.height.max(1) as f32;

        let renderer = SceneRenderer::new(&device, surface_format, size.width, size.height);

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.config = Some(config);
        self.renderer = Some(renderer);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(egui_winit) = &mut self.egui_winit {
            let response = egui_winit.on_window_event(self.window.as_ref().unwrap(), &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let (Some(surface), Some(device), Some(config)) =
                    (&self.surface, &self.device, &mut self.config)
                {
                    config.width = new_size.width.max(1);
                    config.height = new_size.height.max(1);
                    surface.configure(device, config);
                    self.state.camera.aspect =
                        config.width as f32 / config.height.max(1) as f32;
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
                        repeat,
                        ..
                    },
                ..
            } => {
                self.state
                    .handle_key(key, key_state == ElementState::Pressed, repeat);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: btn_state,
                ..
            } => {
                self.state.dragging = btn_state == ElementState::Pressed;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y,
                    MouseScrollDelta::PixelDelta(pos) => -(pos.y as f32).signum(),
                };
                if steps != 0.0 {
                    self.state.apply_action(Action::Zoom(steps));
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.state.last_frame).as_secs_f32().min(0.1);
                self.state.last_frame = now;
                self.state.update(dt);

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

                if let Some(renderer) = &mut self.renderer {
                    // Frame inputs are sampled after update so every pass
                    // reads the same transform.
                    let input = FrameInput {
                        box_xform: self.state.puzzle.current_xform(),
                        time: self.state.started.elapsed().as_secs_f32(),
                        effect_on: self.state.effect_on,
                    };
                    renderer.render(
                        device,
                        queue,
                        &view,
                        &self.state.camera,
                        &self.state.light,
                        self.state.puzzle.level(),
                        input,
                        &mut self.state.schedule,
                    );
                }

                let raw_input = self
                    .egui_winit
                    .as_mut()
                    .unwrap()
                    .take_egui_input(self.window.as_ref().unwrap());
                let full_output = self.egui_ctx.run(raw_input, |ctx| {
                    self.state.draw_ui(ctx);
                });

                self.egui_winit.as_mut().unwrap().handle_platform_output(
                    self.window.as_ref().unwrap(),
                    full_output.platform_output,
                );

                let paint_jobs = self
                    .egui_ctx
                    .tessellate(full_output.shapes, full_output.pixels_per_point);

                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [
                        self.config.as_ref().unwrap().width,
                        self.config.as_ref().unwrap().height,
                    ],
                    pixels_per_point: full_output.pixels_per_point,
                };

                {
                    let egui_renderer = self.egui_renderer.as_mut().unwrap();
                    for (id, image_delta) in &full_output.textures_delta.set {
                        egui_renderer.update_texture(device, queue, *id, image_delta);
                    }
                    let mut encoder =
                        device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("egui_encoder"),
                        });
                    egui_renderer.update_buffers(
                        device,
                        queue,
                        &mut encoder,
                        &paint_jobs,
                        &screen_descriptor,
                    );
                    {
                        let mut pass = encoder
                            .begin_render_pass(&wgpu::RenderPassDescriptor {
                                label: Some("egui_pass"),
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
                        egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
                    }
                    queue.submit(std::iter::once(encoder.finish()));
                    for id in &full_output.textures_delta.free {
                        egui_renderer.free_texture(id);
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

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.state.dragging {
                self.state
                    .apply_action(Action::Orbit(Vec2::new(delta.0 as f32, delta.1 as f32)));
            }
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

    tracing::info!("boxroll-desktop starting");

    let level = match &cli.level {
        Some(path) => Level::from_path(path)?,
        None => Level::default(),
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(level);
    event_loop.run_app(&mut app)?;

    Ok(())
}
