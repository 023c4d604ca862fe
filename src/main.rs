use std::path::{Path, PathBuf};
use std::sync::Arc;

use winit::{
    event::*,
    event_loop::EventLoop,
    keyboard::PhysicalKey,
    window::{CursorGrabMode, Window},
};

use meshview::{
    config::{RenderConfig, ViewerConfig},
    controller::{Action, CameraController, CameraUniform, FrameTimer, InputEvent, InputProcessor, InputState, MouseButton, ShadingUniform},
    error::{Result, ViewerError},
    import, logging,
    model::{flatten, Camera, FlattenedScene},
    ui::{self, ModelStats, OverlayInfo},
    view::{GpuContext, OverlayFrame, RenderState, ShadingMode},
};

/// Pixel scroll deltas (touchpads) are converted to lines at this rate.
const PIXELS_PER_LINE: f32 = 20.0;

struct App {
    window: Arc<Window>,
    gpu: GpuContext,
    render: RenderState,

    // egui
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,

    camera: Camera,
    camera_controller: CameraController,
    input_state: InputState,
    input_processor: InputProcessor,
    timer: FrameTimer,

    render_config: RenderConfig,
    shading: ShadingMode,
    show_overlay: bool,
    stats: ModelStats,
    quit_requested: bool,
}

impl App {
    async fn new(window: Arc<Window>, config: &ViewerConfig, scene: &FlattenedScene, stats: ModelStats) -> Result<Self> {
        let size = window.inner_size();
        let gpu = GpuContext::new(window.clone()).await?;
        let render = RenderState::new(&gpu, scene, config.render.clear_color)?;

        let mut camera_controller = CameraController::new(&config.camera);
        let camera = camera_controller.initial_camera(&scene.bounds, &config.camera, size.width, size.height);

        let mut shading = config.render.shading;
        if !shading.is_available(gpu.wireframe_supported) {
            tracing::warn!(requested = shading.label(), "shading mode unavailable, using Lit");
            shading = ShadingMode::Lit;
        }

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(egui_ctx.clone(), egui::ViewportId::ROOT, &window, None, None, None);

        Ok(Self {
            window,
            gpu,
            render,
            egui_state,
            egui_ctx,
            camera,
            camera_controller,
            input_state: InputState::new(),
            input_processor: InputProcessor::default(),
            timer: FrameTimer::new(),
            render_config: config.render.clone(),
            shading,
            show_overlay: config.render.show_overlay,
            stats,
            quit_requested: false,
        })
    }

    fn lock_pointer(&mut self) {
        let grabbed = self
            .window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(e) = grabbed {
            tracing::debug!(error = %e, "cursor grab unavailable");
        }
        self.window.set_cursor_visible(false);
        self.input_state.process_event(&InputEvent::PointerLockChanged { locked: true });
    }

    fn release_pointer(&mut self) {
        let _ = self.window.set_cursor_grab(CursorGrabMode::None);
        self.window.set_cursor_visible(true);
        self.input_state.process_event(&InputEvent::PointerLockChanged { locked: false });
    }

    fn handle_action(&mut self, action: Action) {
        tracing::debug!(?action, "action");
        match action {
            Action::CycleShading => self.set_shading(self.shading.next(self.gpu.wireframe_supported)),
            Action::SelectShading(mode) => self.set_shading(mode),
            Action::ToggleOverlay => self.show_overlay = !self.show_overlay,
            Action::ResetCamera => self.camera_controller.reset(&mut self.camera),
            Action::ReleasePointer => self.release_pointer(),
            Action::Quit => self.quit_requested = true,
        }
    }

    fn set_shading(&mut self, mode: ShadingMode) {
        if mode.is_available(self.gpu.wireframe_supported) {
            self.shading = mode;
            tracing::info!(mode = mode.label(), "shading mode");
        } else {
            tracing::warn!(mode = mode.label(), "shading mode needs POLYGON_MODE_LINE");
        }
    }

    /// Returns true when the event was consumed.
    fn input(&mut self, event: &WindowEvent) -> bool {
        // egui always tracks window state; it only claims input while the pointer is free
        let response = self.egui_state.on_window_event(self.window.as_ref(), event);
        if self.input_state.overlay_claims(response.consumed) {
            return true;
        }

        match event {
            WindowEvent::KeyboardInput { event: KeyEvent { state, physical_key: PhysicalKey::Code(code), repeat, .. }, .. } => {
                match state {
                    ElementState::Pressed => {
                        self.input_state.process_event(&InputEvent::KeyDown(*code));
                        if !repeat {
                            if let Some(action) = self.input_processor.action_for_key(*code) {
                                self.handle_action(action);
                            }
                        }
                    }
                    ElementState::Released => {
                        self.input_state.process_event(&InputEvent::KeyUp(*code));
                    }
                }
                true
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(button) = MouseButton::from_winit(*button) {
                    let is_down = *state == ElementState::Pressed;
                    self.input_state.process_event(&InputEvent::MouseClick { button, is_down });
                    if button == MouseButton::Left && is_down {
                        self.lock_pointer();
                    }
                }
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
                };
                self.input_state.process_event(&InputEvent::MouseWheel { delta_y });
                true
            }
            WindowEvent::Focused(false) => {
                self.input_state.process_event(&InputEvent::FocusLost);
                self.release_pointer();
                true
            }
            _ => false,
        }
    }

    fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.input_state.process_event(&InputEvent::MouseMove { dx: dx as f32, dy: dy as f32 });
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.gpu.resize(new_size.width, new_size.height);
            self.render.resize(&self.gpu.device, new_size.width, new_size.height);
            self.camera.set_aspect(new_size.width, new_size.height);
        }
    }

    fn update(&mut self, dt: f32) {
        let (dx, dy) = self.input_state.consume_look();
        self.camera_controller.apply_look(&mut self.camera, dx, dy);

        let scroll = self.input_state.consume_scroll();
        self.camera_controller.apply_scroll(&mut self.camera, scroll);

        self.camera_controller
            .update_movement(&mut self.camera, &self.input_state, &self.input_processor, dt);

        self.render.write_uniforms(
            &self.gpu.queue,
            &CameraUniform::from_camera(&self.camera),
            &ShadingUniform::new(&self.render_config, self.shading),
        );
    }

    fn build_overlay(&mut self) -> OverlayFrame {
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let info = OverlayInfo {
            fps: self.timer.fps(),
            frame_ms: self.timer.frame_time().as_secs_f32() * 1000.0,
            camera: &self.camera,
            shading: self.shading,
            wireframe_supported: self.gpu.wireframe_supported,
            pointer_locked: self.input_state.pointer_locked,
            stats: &self.stats,
        };
        let show = self.show_overlay;
        let output = self.egui_ctx.run(raw_input, |ctx| {
            if show {
                ui::build_overlay(ctx, &info);
            }
        });
        self.egui_state.handle_platform_output(&self.window, output.platform_output);

        let primitives = self.egui_ctx.tessellate(output.shapes, output.pixels_per_point);
        OverlayFrame {
            primitives,
            textures_delta: output.textures_delta,
            screen: egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.gpu.config.width, self.gpu.config.height],
                pixels_per_point: output.pixels_per_point,
            },
        }
    }

    fn render(&mut self) -> std::result::Result<(), wgpu::SurfaceError> {
        let overlay = self.build_overlay();
        self.render.draw_frame(&self.gpu, self.shading, overlay)
    }
}

fn model_path() -> Result<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| ViewerError::Usage("meshview <path_to_model.obj>".to_string()))
}

fn window_title(base: &str, path: &Path) -> String {
    match path.file_name() {
        Some(name) => format!("{} - {}", base, name.to_string_lossy()),
        None => base.to_string(),
    }
}

#[allow(deprecated)]
fn run() -> Result<()> {
    let path = model_path()?;
    let config = ViewerConfig::discover()?;

    let scene = import::load_scene(&path, &config.import)?;
    let flat = flatten(&scene);
    let stats = ModelStats::new(path.display().to_string(), scene.meshes.len(), &flat);

    let event_loop = EventLoop::new()?;
    let window_attributes = Window::default_attributes()
        .with_title(window_title(&config.window.title, &path))
        .with_inner_size(winit::dpi::LogicalSize::new(config.window.width, config.window.height));
    let window = Arc::new(event_loop.create_window(window_attributes)?);

    let mut app = pollster::block_on(App::new(window, &config, &flat, stats))?;
    drop(flat);
    drop(scene);

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { ref event, window_id } if window_id == app.window.id() => {
            if !app.input(event) {
                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::Resized(physical_size) => app.resize(*physical_size),
                    WindowEvent::RedrawRequested => {
                        let dt = app.timer.tick();
                        app.update(dt);

                        match app.render() {
                            Ok(()) => {}
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                app.resize(app.window.inner_size())
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                tracing::error!("surface out of memory");
                                elwt.exit();
                            }
                            Err(e) => tracing::warn!(error = ?e, "dropped frame"),
                        }
                    }
                    _ => {}
                }
            }
            if app.quit_requested {
                elwt.exit();
            }
        }
        Event::DeviceEvent { event: DeviceEvent::MouseMotion { delta }, .. } => {
            app.handle_mouse_motion(delta.0, delta.1);
        }
        Event::AboutToWait => {
            app.window.request_redraw();
        }
        _ => {}
    })?;

    Ok(())
}

fn main() {
    logging::init();

    if let Err(e) = run() {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
