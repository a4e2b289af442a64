mod gpu;
mod host;

use anyhow::Result;
use clap::Parser;
use gpu::GpuContext;
use host::WindowHost;
use shapefall_input::PointerEvent;
use shapefall_kernel::{SceneConfig, Session, SessionError, SessionSummary};
use shapefall_render_wgpu::WgpuFrame;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "shapefall-desktop", about = "Click the ground to drop random shapes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Seed for the shape generator (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Evict the oldest shape once this many exist
    #[arg(long)]
    max_entities: Option<usize>,
}

struct App {
    /// Held until the window exists and the session can mount.
    config: Option<SceneConfig>,
    session: Option<Session<WindowHost>>,
    gpu: Option<GpuContext>,
    cursor: Option<PhysicalPosition<f64>>,
    orbiting: bool,
    show_overlay: bool,
}

impl App {
    fn new(config: SceneConfig) -> Self {
        Self {
            config: Some(config),
            session: None,
            gpu: None,
            cursor: None,
            orbiting: false,
            show_overlay: true,
        }
    }

    fn window(&self) -> Option<&Arc<Window>> {
        self.session.as_ref()?.host().map(WindowHost::window)
    }

    /// Tear the session down, release the GPU surface and leave the loop.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut session) = self.session.take() {
            session.teardown();
        }
        self.gpu = None;
        event_loop.exit();
    }

    fn on_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        if let (true, Some(last), Some(session)) = (self.orbiting, self.cursor, self.session.as_mut()) {
            let height = session
                .host()
                .map(|h| h.window().inner_size().height as f32)
                .unwrap_or(1.0);
            if let Some(controls) = session.controls_mut() {
                controls.rotate((position.x - last.x) as f32, (position.y - last.y) as f32, height);
            }
        }
        self.cursor = Some(position);
    }

    fn on_left_click(&mut self) {
        let (Some(cursor), Some(session)) = (self.cursor, self.session.as_mut()) else {
            return;
        };
        session.dispatch_click(PointerEvent::new(cursor.x as f32, cursor.y as f32));
    }

    fn on_wheel(&mut self, delta: MouseScrollDelta) {
        let steps = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(p) => p.y as f32 / 50.0,
        };
        if let Some(controls) = self.session.as_mut().and_then(Session::controls_mut) {
            controls.zoom(steps);
        }
    }

    /// Draw one frame. The swapchain texture never outlives this call, so a
    /// failed frame can release the surface afterwards.
    fn redraw(&mut self) -> Result<(), SessionError> {
        let (Some(session), Some(gpu)) = (self.session.as_mut(), self.gpu.as_mut()) else {
            return Ok(());
        };
        let Some(window) = session.host().map(|h| h.window().clone()) else {
            return Ok(());
        };
        let Some(output) = gpu.acquire() else {
            window.request_redraw();
            return Ok(());
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut frame = WgpuFrame {
            renderer: &mut gpu.renderer,
            device: &gpu.device,
            queue: &gpu.queue,
            view: &view,
        };
        session.frame(&mut frame)?;

        let summary = session.summary();
        let show = self.show_overlay;
        gpu.paint_overlay(&window, &view, |ctx| draw_overlay(ctx, &summary, show));
        output.present();
        Ok(())
    }
}

fn draw_overlay(ctx: &egui::Context, summary: &SessionSummary, show: bool) {
    if !show {
        return;
    }
    egui::Window::new("Shapefall")
        .anchor(egui::Align2::LEFT_TOP, [8.0, 8.0])
        .resizable(false)
        .collapsible(false)
        .show(ctx, |ui| {
            ui.label(format!("Tick: {}  ({:.1}s)", summary.tick, summary.sim_time));
            ui.label(format!("Shapes: {}", summary.entity_count));
            ui.label(format!(
                "Meshes: {}  Bodies: {}",
                summary.scene_meshes, summary.physics_bodies
            ));
            ui.separator();
            ui.small("LMB: drop shape | RMB drag: orbit | Wheel: zoom | F1: overlay");
        });
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }
        let Some(config) = self.config.take() else {
            return;
        };

        let attrs = Window::default_attributes()
            .with_title("Shapefall")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                tracing::error!(%err, "could not create window");
                event_loop.exit();
                return;
            }
        };

        match GpuContext::new(window.clone()) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(err) => {
                tracing::error!("GPU setup failed: {err:#}");
                event_loop.exit();
                return;
            }
        }

        match Session::mount(Some(WindowHost::new(window)), config) {
            Ok(session) => self.session = Some(session),
            Err(err) => {
                tracing::error!(%err, "mount failed");
                self.shutdown(event_loop);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if let (Some(gpu), Some(window)) = (self.gpu.as_mut(), self.session.as_ref().and_then(|s| s.host())) {
            if gpu.on_window_event(window.window(), &event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(size) => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(size);
                }
            }
            WindowEvent::CursorMoved { position, .. } => self.on_cursor_moved(position),
            WindowEvent::CursorLeft { .. } => self.cursor = None,
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: ElementState::Pressed,
                ..
            } => self.on_left_click(),
            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state,
                ..
            } => self.orbiting = state == ElementState::Pressed,
            WindowEvent::MouseWheel { delta, .. } => self.on_wheel(delta),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::F1),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.show_overlay = !self.show_overlay,
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.redraw() {
                    tracing::error!(%err, "stopping");
                    self.shutdown(event_loop);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        let pending = self.session.as_ref().is_some_and(Session::has_pending_frame);
        if let (true, Some(window)) = (pending, self.window()) {
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

    tracing::info!("shapefall-desktop starting");

    let config = SceneConfig {
        seed: cli.seed,
        max_entities: cli.max_entities,
        ..SceneConfig::default()
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
