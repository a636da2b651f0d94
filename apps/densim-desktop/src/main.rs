use anyhow::{Context, Result};
use clap::Parser;
use densim_assets::load_obj;
use densim_input::{CameraRig, Key, action_for_key};
use densim_render::{Sim, SimConfig};
use densim_render_wgpu::{WgpuBackend, WgpuProvider};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "densim-desktop", about = "Density simulation viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON config file; missing fields take defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the config seed
    #[arg(long)]
    seed: Option<u64>,

    /// OBJ model to add to the scene
    #[arg(long)]
    model: Option<PathBuf>,
}

/// Keys the rig understands. Everything else is ignored.
fn key_for_code(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::KeyX => Key::X,
        KeyCode::KeyY => Key::Y,
        KeyCode::KeyZ => Key::Z,
        KeyCode::KeyI => Key::I,
        KeyCode::KeyO => Key::O,
        KeyCode::KeyP => Key::P,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyE => Key::E,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyS => Key::S,
        _ => return None,
    };
    Some(key)
}

struct App {
    sim: Sim<WgpuBackend>,
    rig: CameraRig,
    window: Option<Arc<Window>>,
    started: Instant,
}

impl App {
    fn new(sim: Sim<WgpuBackend>) -> Self {
        let rig = CameraRig::new(sim.config().camera_position);
        Self {
            sim,
            rig,
            window: None,
            started: Instant::now(),
        }
    }

    fn handle_key(&mut self, key: Key) {
        let model_changed = self.rig.apply(action_for_key(key));
        let eulers = self.rig.camera_eulers;
        self.sim.set_camera_eulers(eulers.x, eulers.y, eulers.z);
        self.sim.set_camera_translation(self.rig.camera_position);
        if model_changed {
            let model = self.rig.model_eulers;
            self.sim.set_model_eulers(model.x, model.y, model.z);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let canvas = self.sim.config().canvas;
        let attrs = Window::default_attributes()
            .with_title("densim")
            .with_inner_size(PhysicalSize::new(canvas.width, canvas.height));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                tracing::error!(%err, "failed to create window");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        pollster::block_on(
            self.sim
                .init(WgpuProvider::new(window.clone(), size.width, size.height)),
        );
        if !self.sim.is_ready() {
            tracing::error!("GPU initialization failed, nothing will be drawn");
        }
        self.sim.resize(size.width, size.height);

        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.sim.resize(new_size.width, new_size.height);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if code == KeyCode::Escape {
                    event_loop.exit();
                } else if let Some(key) = key_for_code(code) {
                    self.handle_key(key);
                }
            }
            WindowEvent::RedrawRequested => {
                let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
                self.sim.render(elapsed_ms);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn load_config(cli: &Cli) -> Result<SimConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            SimConfig::from_json_file(path).with_context(|| format!("loading config {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = load_config(&cli)?;
    tracing::info!(seed = config.seed, cubes = config.cube_count, "densim-desktop starting");

    let mut sim = Sim::new(config);
    if let Some(path) = &cli.model {
        let mesh = load_obj(path)
            .and_then(|obj| obj.into_mesh("model"))
            .with_context(|| format!("loading model {}", path.display()))?;
        tracing::info!(vertices = mesh.vertex_count(), "model loaded");
        sim = sim.with_model(mesh);
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(sim);
    event_loop.run_app(&mut app)?;

    Ok(())
}
