//! Window creation and event handling via winit.
//!
//! [`GreetingApp`] implements winit's [`ApplicationHandler`]. The scene and
//! the asset loads are started before the event loop, so loading overlaps
//! window and GPU setup. The render loop itself is created once the window
//! exists and is driven by `RedrawRequested`.

use std::sync::Arc;

use glam::Vec2;
use greeting_assets::AssetPipeline;
use greeting_config::Config;
use greeting_render::{
    Camera, OrbitControls, RenderContextError, SceneRenderer, init_render_context_blocking,
};
use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::render_loop::{FrameOutcome, FrameScheduler, RenderLoop, ShutdownHandle};
use crate::scene_setup::{self, GreetingScene};

/// Pixels of trackpad scrolling treated as one wheel line.
const PIXELS_PER_LINE: f32 = 40.0;

/// [`WindowAttributes`] from the window section of the config.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
}

/// Schedules frames through `Window::request_redraw`.
struct RedrawScheduler<'a>(&'a Window);

impl FrameScheduler for RedrawScheduler<'_> {
    fn schedule_next_frame(&mut self) {
        self.0.request_redraw();
    }
}

/// Everything built before the window exists.
struct PendingScene {
    scene: GreetingScene,
    camera: Camera,
    controls: OrbitControls,
    assets: Option<AssetPipeline>,
}

/// Application state for the winit event loop.
pub struct GreetingApp {
    config: Config,
    window: Option<Arc<Window>>,
    pending: Option<PendingScene>,
    render_loop: Option<RenderLoop<SceneRenderer, OrbitControls>>,
    shutdown: ShutdownHandle,
    cursor: Vec2,
}

impl GreetingApp {
    /// Build the static scene and start loading assets.
    pub fn new(config: Config) -> Self {
        let (scene, camera, controls) = scene_setup::build_scene(&config);
        let assets = scene_setup::start_asset_loads(&config.assets);
        Self {
            config,
            window: None,
            pending: Some(PendingScene {
                scene,
                camera,
                controls,
                assets,
            }),
            render_loop: None,
            shutdown: ShutdownHandle::new(),
            cursor: Vec2::ZERO,
        }
    }

    /// Stop flag shared with the render loop.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    fn create_render_loop(&mut self, window: &Arc<Window>) -> Result<(), RenderContextError> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        let context = init_render_context_blocking(Arc::clone(window), self.config.window.vsync)?;
        let renderer = SceneRenderer::new(
            context,
            scene_setup::render_settings(&self.config.render),
        );

        let mut render_loop =
            RenderLoop::new(pending.scene, pending.camera, pending.controls, renderer)
                .with_shutdown(self.shutdown.clone())
                .with_frame_log_interval(self.config.debug.frame_log_interval)
                .with_spin_per_frame(self.config.assets.model_settings.spin_per_frame);
        if let Some(assets) = pending.assets {
            render_loop = render_loop.with_assets(assets);
        }

        let size = window.inner_size();
        render_loop.resize(size.width, size.height);
        render_loop
            .controller_mut()
            .set_viewport_height(size.height as f32);
        self.render_loop = Some(render_loop);
        Ok(())
    }
}

impl ApplicationHandler for GreetingApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window = match event_loop.create_window(window_attributes_from_config(&self.config))
        {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Window creation failed: {e}");
                event_loop.exit();
                return;
            }
        };

        if let Err(e) = self.create_render_loop(&window) {
            error!("GPU initialization failed: {e}");
            event_loop.exit();
            return;
        }

        let size = window.inner_size();
        info!("Window created: {}x{}", size.width, size.height);
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let (Some(window), Some(render_loop)) = (&self.window, &mut self.render_loop) else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                self.shutdown.request_stop();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                render_loop.resize(size.width, size.height);
                render_loop
                    .controller_mut()
                    .set_viewport_height(size.height as f32);
                info!("Window resized to {}x{}", size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                let mut scheduler = RedrawScheduler(window);
                if render_loop.frame(&mut scheduler) == FrameOutcome::Stopped {
                    event_loop.exit();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                render_loop
                    .controller_mut()
                    .pointer_move(self.cursor.x, self.cursor.y);
            }
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => {
                    render_loop
                        .controller_mut()
                        .pointer_down(button, self.cursor.x, self.cursor.y);
                }
                ElementState::Released => render_loop.controller_mut().pointer_up(),
            },
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
                };
                render_loop.controller_mut().scroll(lines);
            }
            _ => {}
        }
    }
}

/// Create an event loop and run the greeting until the window closes.
pub fn run(config: Config) -> Result<(), winit::error::EventLoopError> {
    let event_loop = EventLoop::new()?;
    let mut app = GreetingApp::new(config);
    event_loop.run_app(&mut app)
}
