use std::collections::HashSet;
use std::io::BufRead;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use clap::Parser;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use column_voxels::edit::{EditOutcome, EditQueue};
use column_voxels::renderer::{self, BACKGROUND};
use column_voxels::scaler::{ScaleLut, blit_scaled, build_scale_lut};
use column_voxels::{Camera, CameraInput, EngineConfig, WorldGrid};

#[derive(Parser)]
#[command(
    name = "column-voxels",
    about = "Column voxel renderer with a line-based map editor on stdin"
)]
struct Cli {
    /// Map file, width*height*depth RGB triples. The default room is used when absent or corrupt.
    map: Option<PathBuf>,
    /// JSON engine config
    #[arg(long)]
    config: Option<PathBuf>,
    /// Raster width in pixels
    #[arg(long)]
    width: Option<usize>,
    /// Raster height in pixels
    #[arg(long)]
    height: Option<usize>,
    /// Render columns on one thread
    #[arg(long)]
    sequential: bool,
}

impl Cli {
    /// Command-line flags win over the config file.
    fn override_config(&self, config: &mut EngineConfig) {
        if let Some(width) = self.width {
            config.screen_width = width;
        }
        if let Some(height) = self.height {
            config.screen_height = height;
        }
        if self.sequential {
            config.parallel = false;
        }
    }
}

struct App {
    window: Option<Rc<Window>>,
    surface: Option<softbuffer::Surface<Rc<Window>, Rc<Window>>>,
    config: EngineConfig,
    grid: WorldGrid,
    camera: Camera,

    // FPS reporting
    frame_counter: u32,
    last_fps_print: Instant,

    // Fixed-size raster, scaled to the window
    raster: Vec<u32>,
    scale_lut: ScaleLut,

    keys_down: HashSet<KeyCode>,
    last_tick: Instant,

    // Editor lines from the stdin thread, applied between frames
    edit_lines: Receiver<String>,
    edits: EditQueue,
}

impl App {
    fn new(config: EngineConfig, grid: WorldGrid, edit_lines: Receiver<String>) -> Self {
        let camera = Camera::spawn(grid.dims(), config.pitch);
        let raster = vec![0; config.screen_width * config.screen_height];
        Self {
            window: None,
            surface: None,
            config,
            grid,
            camera,
            frame_counter: 0,
            last_fps_print: Instant::now(),
            raster,
            scale_lut: ScaleLut::empty(),
            keys_down: HashSet::new(),
            last_tick: Instant::now(),
            edit_lines,
            edits: EditQueue::new(),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let attributes = Window::default_attributes()
            .with_title("Column Voxels")
            .with_inner_size(LogicalSize::new(
                self.config.screen_width as f64 * 2.0,
                self.config.screen_height as f64 * 2.0,
            ));

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Rc::new(window),
            Err(err) => {
                log::error!("failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };
        let surface = softbuffer::Context::new(window.clone())
            .and_then(|context| softbuffer::Surface::new(&context, window.clone()));
        let surface = match surface {
            Ok(surface) => surface,
            Err(err) => {
                log::error!("failed to create softbuffer surface: {err}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.rebuild_lut(size.width as usize, size.height as usize);

        self.surface = Some(surface);
        self.last_tick = Instant::now();
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("close requested, stopping");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed if code == KeyCode::Escape => event_loop.exit(),
                ElementState::Pressed => {
                    self.keys_down.insert(code);
                }
                ElementState::Released => {
                    self.keys_down.remove(&code);
                }
            },

            WindowEvent::RedrawRequested => {
                self.tick();
                self.apply_edits();
                self.redraw(event_loop, id);
            }

            WindowEvent::Resized(new_size) => {
                self.rebuild_lut(new_size.width as usize, new_size.height as usize);
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl App {
    fn tick(&mut self) {
        // Cap dt to avoid huge jumps if the app was paused
        let now = Instant::now();
        let dt = now.duration_since(self.last_tick).min(Duration::from_millis(100));
        self.last_tick = now;
        let dt_s = dt.as_secs_f64();

        let axis = |pos: &[KeyCode], neg: &[KeyCode]| -> f64 {
            let held = |keys: &[KeyCode]| keys.iter().any(|k| self.keys_down.contains(k));
            (held(pos) as i32 - held(neg) as i32) as f64
        };

        let cfg = &self.config;
        let input = CameraInput {
            forward: axis(
                &[KeyCode::ArrowUp, KeyCode::KeyW],
                &[KeyCode::ArrowDown, KeyCode::KeyS],
            ) * cfg.move_speed
                * dt_s,
            rotate: axis(
                &[KeyCode::ArrowLeft, KeyCode::KeyA],
                &[KeyCode::ArrowRight, KeyCode::KeyD],
            ) * cfg.rot_speed
                * dt_s,
            pitch: axis(&[KeyCode::KeyI], &[KeyCode::KeyK]) * cfg.pitch_speed * dt_s,
            lift: axis(&[KeyCode::KeyJ], &[KeyCode::KeyU]) * cfg.lift_speed * dt_s,
        };
        self.camera.apply(&input, &self.grid);
    }

    fn apply_edits(&mut self) {
        while let Ok(line) = self.edit_lines.try_recv() {
            if let Err(err) = self.edits.push_line(&line) {
                log::warn!("ignoring editor line {line:?}: {err}");
            }
        }
        if self.edits.is_empty() {
            return;
        }

        for outcome in self.edits.drain(&mut self.grid) {
            match outcome {
                EditOutcome::Written { x, y, z } => log::info!("voxel ({x}, {y}, {z}) written"),
                EditOutcome::Rejected(err) => log::warn!("write rejected: {err}"),
                EditOutcome::Save { path, bytes } => match std::fs::write(&path, bytes) {
                    Ok(()) => log::info!("saved to {}", path.display()),
                    Err(err) => log::error!("failed to save {}: {err}", path.display()),
                },
                EditOutcome::SessionEnded => log::info!("editing session ended"),
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop, id: WindowId) {
        let (window, surface) = match (&self.window, &mut self.surface) {
            (Some(w), Some(s)) if w.id() == id => (w, s),
            _ => return,
        };

        let size = window.inner_size();
        let (Some(dw), Some(dh)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return; // Minimized window, skip drawing
        };
        if let Err(err) = surface.resize(dw, dh) {
            log::error!("failed to resize surface: {err}");
            event_loop.exit();
            return;
        }

        let cfg = &self.config;
        let render = if cfg.parallel {
            renderer::render_frame_parallel
        } else {
            renderer::render_frame
        };
        let started = Instant::now();
        match render(
            &mut self.raster,
            cfg.screen_width,
            cfg.screen_height,
            &self.grid,
            &self.camera,
            cfg.hit_budget,
        ) {
            Ok(stats) => log::trace!(
                "frame: {} steps, {} rows in {:?}",
                stats.steps,
                stats.painted_rows,
                started.elapsed()
            ),
            Err(err) => {
                log::error!("render failed: {err}");
                event_loop.exit();
                return;
            }
        }

        let mut buf = match surface.buffer_mut() {
            Ok(buf) => buf,
            Err(err) => {
                log::error!("failed to map surface buffer: {err}");
                event_loop.exit();
                return;
            }
        };
        blit_scaled(
            &mut buf,
            dw.get() as usize,
            &self.raster,
            cfg.screen_width,
            &self.scale_lut,
            BACKGROUND.pack(),
        );
        if let Err(err) = buf.present() {
            log::error!("failed to present frame: {err}");
        }

        self.frame_counter += 1;
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_fps_print).as_secs_f32();
        if elapsed >= 1.0 {
            log::info!(
                "FPS: {:.1}  X: {:.2}  Y: {:.2}",
                self.frame_counter as f32 / elapsed,
                self.camera.pos.x,
                self.camera.pos.y
            );
            self.frame_counter = 0;
            self.last_fps_print = now;
        }

        window.request_redraw();
    }

    fn rebuild_lut(&mut self, dst_w: usize, dst_h: usize) {
        self.scale_lut = build_scale_lut(
            dst_w,
            dst_h,
            self.config.screen_width,
            self.config.screen_height,
        );
    }
}

fn load_grid(cli: &Cli, config: &EngineConfig) -> WorldGrid {
    let Some(path) = &cli.map else {
        log::info!("no map loaded, using defaults");
        return WorldGrid::default_room(config.map);
    };
    match std::fs::read(path) {
        Ok(bytes) => {
            let grid = WorldGrid::load_or_default(config.map, &bytes);
            log::info!("loaded map {}", path.display());
            grid
        }
        Err(err) => {
            log::warn!("failed to read map {}: {err}; using defaults", path.display());
            WorldGrid::default_room(config.map)
        }
    }
}

/// Forwards stdin lines to the render loop until `q` or end of input.
fn spawn_editor_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let quit = line.trim() == "q";
            if tx.send(line).is_err() || quit {
                break;
            }
        }
    });
    rx
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("{err}");
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };
    cli.override_config(&mut config);

    let grid = load_grid(&cli, &config);
    let edit_lines = spawn_editor_reader();

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("failed to create event loop: {err}");
            std::process::exit(1);
        }
    };
    // Redraws are requested continuously from about_to_wait.
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config, grid, edit_lines);
    if let Err(err) = event_loop.run_app(&mut app) {
        log::error!("event loop failed: {err}");
        std::process::exit(1);
    }
}
