//! The self-rescheduling frame loop.
//!
//! Every frame integrates finished asset loads, spins the model, updates the
//! camera controller, renders and asks the host for the next frame. The loop
//! never waits on the asset pipeline: a frame renders whatever is in the
//! graph at that moment.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use greeting_assets::AssetPipeline;
use greeting_render::{Camera, CameraController, RenderBackend};
use tracing::{debug, error, info, warn};

use crate::scene_setup::GreetingScene;

/// Rotation added to the model around Y every frame, in radians.
pub const SPIN_PER_FRAME: f32 = 0.005;

/// Where the loop is within its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting for the next frame callback.
    Idle,
    /// Inside [`RenderLoop::frame`].
    Frame,
}

/// Result of one call to [`RenderLoop::frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was drawn and the next one scheduled.
    Rendered,
    /// The backend hit a recoverable error; the next frame is still scheduled.
    Skipped,
    /// The loop is stopped. Nothing was drawn or scheduled.
    Stopped,
}

/// Requests the next frame from the host.
pub trait FrameScheduler {
    fn schedule_next_frame(&mut self);
}

/// Shared stop flag, checked at the start of every frame.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Owns the scene, camera and backend, and advances them one frame at a time.
pub struct RenderLoop<B, C> {
    scene: GreetingScene,
    assets: Option<AssetPipeline>,
    camera: Camera,
    controller: C,
    backend: B,
    shutdown: ShutdownHandle,
    state: LoopState,
    spin_per_frame: f32,
    frame_count: u64,
    skipped_frames: u64,
    frame_log_interval: u64,
}

impl<B: RenderBackend, C: CameraController> RenderLoop<B, C> {
    pub fn new(scene: GreetingScene, camera: Camera, controller: C, backend: B) -> Self {
        Self {
            scene,
            assets: None,
            camera,
            controller,
            backend,
            shutdown: ShutdownHandle::new(),
            state: LoopState::Idle,
            spin_per_frame: SPIN_PER_FRAME,
            frame_count: 0,
            skipped_frames: 0,
            frame_log_interval: 0,
        }
    }

    /// Integrate loads from `pipeline` at the start of every frame.
    pub fn with_assets(mut self, pipeline: AssetPipeline) -> Self {
        self.assets = Some(pipeline);
        self
    }

    /// Use an externally owned stop flag.
    pub fn with_shutdown(mut self, shutdown: ShutdownHandle) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn with_spin_per_frame(mut self, radians: f32) -> Self {
        self.spin_per_frame = radians;
        self
    }

    /// Log frame statistics every `frames` frames; 0 disables them.
    pub fn with_frame_log_interval(mut self, frames: u64) -> Self {
        self.frame_log_interval = frames;
        self
    }

    /// Run one frame and schedule the next, unless the loop is stopped.
    pub fn frame(&mut self, scheduler: &mut impl FrameScheduler) -> FrameOutcome {
        if self.shutdown.is_stopped() {
            self.state = LoopState::Idle;
            return FrameOutcome::Stopped;
        }
        self.state = LoopState::Frame;

        self.integrate_finished_assets();
        self.scene
            .spinning
            .step(&mut self.scene.graph, self.spin_per_frame);
        self.controller.update(&mut self.camera);

        let outcome = match self.backend.render(&self.scene.graph, &self.camera) {
            Ok(()) => FrameOutcome::Rendered,
            Err(err) if err.is_recoverable() => {
                warn!(error = %err, frame = self.frame_count, "Frame skipped");
                self.skipped_frames += 1;
                FrameOutcome::Skipped
            }
            Err(err) => {
                error!(error = %err, "Render backend failed, stopping");
                self.shutdown.request_stop();
                self.state = LoopState::Idle;
                return FrameOutcome::Stopped;
            }
        };

        self.frame_count += 1;
        if self.frame_log_interval > 0 && self.frame_count % self.frame_log_interval == 0 {
            info!(
                frames = self.frame_count,
                skipped = self.skipped_frames,
                nodes = self.scene.graph.len(),
                rotation = self.scene.spinning.total_rotation(),
                "Frame statistics"
            );
        }

        self.state = LoopState::Idle;
        scheduler.schedule_next_frame();
        outcome
    }

    /// Drain every finished load and add it to the scene.
    fn integrate_finished_assets(&mut self) {
        let Some(pipeline) = &self.assets else {
            return;
        };
        for completion in pipeline.drain_completed() {
            let outcome = self.scene.integrate(completion);
            debug!(?outcome, frame = self.frame_count, "Integrated asset completion");
        }
    }

    /// The output surface changed size, in physical pixels.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.camera.set_aspect_ratio(width as f32, height as f32);
        self.backend.resize(width, height);
    }

    pub fn scene(&self) -> &GreetingScene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Frames drawn or skipped so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames
    }

    /// Loads still running on the pipeline, 0 without one.
    pub fn assets_in_flight(&self) -> u64 {
        self.assets
            .as_ref()
            .map_or(0, |pipeline| pipeline.in_flight_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greeting_render::{BackendError, SurfaceError};
    use greeting_scene::SceneGraph;
    use greeting_sky::SkyEnvironment;

    #[derive(Default)]
    struct CountingScheduler(u32);

    impl FrameScheduler for CountingScheduler {
        fn schedule_next_frame(&mut self) {
            self.0 += 1;
        }
    }

    #[derive(Default)]
    struct ScriptedBackend {
        errors: Vec<BackendError>,
        rendered: u32,
        last_size: Option<(u32, u32)>,
    }

    impl RenderBackend for ScriptedBackend {
        fn render(&mut self, _graph: &SceneGraph, _camera: &Camera) -> Result<(), BackendError> {
            if let Some(err) = self.errors.pop() {
                return Err(err);
            }
            self.rendered += 1;
            Ok(())
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.last_size = Some((width, height));
        }
    }

    #[derive(Default)]
    struct CountingController(u32);

    impl CameraController for CountingController {
        fn update(&mut self, _camera: &mut Camera) -> bool {
            self.0 += 1;
            false
        }
    }

    fn test_loop(backend: ScriptedBackend) -> RenderLoop<ScriptedBackend, CountingController> {
        let scene = GreetingScene::new(&SkyEnvironment::build(45.0));
        RenderLoop::new(scene, Camera::default(), CountingController::default(), backend)
    }

    #[test]
    fn test_frame_renders_and_reschedules() {
        let mut render_loop = test_loop(ScriptedBackend::default());
        let mut scheduler = CountingScheduler::default();

        for _ in 0..3 {
            assert_eq!(render_loop.frame(&mut scheduler), FrameOutcome::Rendered);
        }
        assert_eq!(scheduler.0, 3);
        assert_eq!(render_loop.backend().rendered, 3);
        assert_eq!(render_loop.controller_mut().0, 3);
        assert_eq!(render_loop.state(), LoopState::Idle);
    }

    #[test]
    fn test_stop_flag_halts_rendering_and_scheduling() {
        let mut render_loop = test_loop(ScriptedBackend::default());
        let mut scheduler = CountingScheduler::default();

        render_loop.frame(&mut scheduler);
        render_loop.shutdown_handle().request_stop();
        assert_eq!(render_loop.frame(&mut scheduler), FrameOutcome::Stopped);
        assert_eq!(render_loop.frame(&mut scheduler), FrameOutcome::Stopped);
        assert_eq!(scheduler.0, 1);
        assert_eq!(render_loop.backend().rendered, 1);
    }

    #[test]
    fn test_recoverable_error_skips_one_frame() {
        let backend = ScriptedBackend {
            errors: vec![BackendError::from(SurfaceError::Timeout)],
            ..Default::default()
        };
        let mut render_loop = test_loop(backend);
        let mut scheduler = CountingScheduler::default();

        assert_eq!(render_loop.frame(&mut scheduler), FrameOutcome::Skipped);
        assert_eq!(render_loop.frame(&mut scheduler), FrameOutcome::Rendered);
        assert_eq!(scheduler.0, 2);
        assert_eq!(render_loop.skipped_frames(), 1);
    }

    #[test]
    fn test_fatal_error_stops_the_loop() {
        let backend = ScriptedBackend {
            errors: vec![BackendError::from(SurfaceError::OutOfMemory)],
            ..Default::default()
        };
        let mut render_loop = test_loop(backend);
        let mut scheduler = CountingScheduler::default();

        assert_eq!(render_loop.frame(&mut scheduler), FrameOutcome::Stopped);
        assert!(render_loop.shutdown_handle().is_stopped());
        assert_eq!(scheduler.0, 0);
        assert_eq!(render_loop.frame(&mut scheduler), FrameOutcome::Stopped);
    }

    #[test]
    fn test_shared_shutdown_handle() {
        let shutdown = ShutdownHandle::new();
        let mut render_loop =
            test_loop(ScriptedBackend::default()).with_shutdown(shutdown.clone());
        shutdown.request_stop();
        assert_eq!(
            render_loop.frame(&mut CountingScheduler::default()),
            FrameOutcome::Stopped
        );
    }

    #[test]
    fn test_resize_updates_camera_and_backend() {
        let mut render_loop = test_loop(ScriptedBackend::default());
        render_loop.resize(1920, 1080);
        assert!((render_loop.camera().aspect_ratio - 1920.0 / 1080.0).abs() < 1e-6);
        assert_eq!(render_loop.backend().last_size, Some((1920, 1080)));

        render_loop.resize(0, 0);
        assert_eq!(render_loop.backend().last_size, Some((1920, 1080)));
    }
}
