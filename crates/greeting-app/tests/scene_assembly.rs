//! Scene assembly through the render loop with stub assets and a fake
//! backend: partial failure, out-of-order completion and liveness.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use greeting_app::{FrameOutcome, FrameScheduler, GreetingScene, LoopState, RenderLoop};
use greeting_assets::{
    AssetCache, AssetCompletion, AssetJob, AssetKind, AssetLoadError, AssetLoadResult,
    AssetPipeline, Integration, ModelJob, ModelSettings,
};
use greeting_render::{BackendError, Camera, CameraController, RenderBackend};
use greeting_scene::{Node, SceneGraph};
use greeting_sky::SkyEnvironment;

/// Records the node count of every rendered frame.
#[derive(Default)]
struct RecordingBackend {
    node_counts: Vec<usize>,
}

impl RenderBackend for RecordingBackend {
    fn render(&mut self, graph: &SceneGraph, _camera: &Camera) -> Result<(), BackendError> {
        self.node_counts.push(graph.len());
        Ok(())
    }

    fn resize(&mut self, _width: u32, _height: u32) {}
}

struct StillController;

impl CameraController for StillController {
    fn update(&mut self, _camera: &mut Camera) -> bool {
        false
    }
}

#[derive(Default)]
struct Scheduled(u64);

impl FrameScheduler for Scheduled {
    fn schedule_next_frame(&mut self) {
        self.0 += 1;
    }
}

/// Returns a group node, optionally after being released by the test.
struct StubJob {
    kind: AssetKind,
    path: PathBuf,
    gate: Option<mpsc::Receiver<()>>,
}

impl StubJob {
    fn new(kind: AssetKind) -> Self {
        Self {
            kind,
            path: PathBuf::from(format!("stub/{kind}")),
            gate: None,
        }
    }

    fn gated(kind: AssetKind) -> (Self, mpsc::Sender<()>) {
        let (sender, receiver) = mpsc::channel();
        let job = Self {
            gate: Some(receiver),
            ..Self::new(kind)
        };
        (job, sender)
    }
}

impl AssetJob for StubJob {
    fn kind(&self) -> AssetKind {
        self.kind
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn run(&self, _cache: &AssetCache) -> Result<Node, AssetLoadError> {
        if let Some(gate) = &self.gate {
            let _ = gate.recv();
        }
        Ok(Node::group(format!("stub-{}", self.kind)))
    }
}

fn new_loop(pipeline: Option<AssetPipeline>) -> RenderLoop<RecordingBackend, StillController> {
    let scene = GreetingScene::new(&SkyEnvironment::build(45.0));
    let render_loop = RenderLoop::new(
        scene,
        Camera::default(),
        StillController,
        RecordingBackend::default(),
    );
    match pipeline {
        Some(pipeline) => render_loop.with_assets(pipeline),
        None => render_loop,
    }
}

/// Run frames until `done` holds, failing after a generous timeout.
fn pump_until(
    render_loop: &mut RenderLoop<RecordingBackend, StillController>,
    scheduler: &mut Scheduled,
    done: impl Fn(&GreetingScene) -> bool,
) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !done(render_loop.scene()) {
        assert!(Instant::now() < deadline, "scene never reached expected state");
        assert_eq!(render_loop.frame(scheduler), FrameOutcome::Rendered);
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn model_failure_leaves_the_rest_of_the_scene_running() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = AssetPipeline::new(2, AssetCache::new(true)).unwrap();
    pipeline.request(StubJob::new(AssetKind::Text)).unwrap();
    pipeline
        .request(ModelJob::new(
            dir.path().join("missing.gltf"),
            ModelSettings::default(),
        ))
        .unwrap();

    let mut render_loop = new_loop(Some(pipeline));
    let mut scheduler = Scheduled::default();
    pump_until(&mut render_loop, &mut scheduler, |scene| {
        scene.integrator.is_integrated(AssetKind::Text) && !scene.integrator.failures().is_empty()
    });

    let scene = render_loop.scene();
    assert_eq!(scene.graph.len(), 5);
    assert!(scene.graph.find("floor").is_some());
    assert!(scene.graph.sky().is_some());
    assert!(scene.graph.directional_light().is_some());
    assert!(scene.graph.hemisphere_light().is_some());
    assert!(!scene.integrator.is_integrated(AssetKind::Model));
    assert!(matches!(
        scene.integrator.failures()[0].error,
        AssetLoadError::Io { .. }
    ));
    assert!(scene.spinning.target().is_none());

    // The loop keeps going, and the missing model is never spun.
    for _ in 0..100 {
        assert_eq!(render_loop.frame(&mut scheduler), FrameOutcome::Rendered);
    }
    assert_eq!(render_loop.scene().spinning.total_rotation(), 0.0);
    assert_eq!(render_loop.scene().graph.len(), 5);
    assert_eq!(scheduler.0, render_loop.frame_count());
}

#[test]
fn reverse_completion_order_integrates_each_asset_once() {
    let pipeline = AssetPipeline::new(2, AssetCache::new(false)).unwrap();
    let (text, release_text) = StubJob::gated(AssetKind::Text);
    pipeline.request(text).unwrap();
    pipeline.request(StubJob::new(AssetKind::Model)).unwrap();

    let mut render_loop = new_loop(Some(pipeline));
    let mut scheduler = Scheduled::default();
    pump_until(&mut render_loop, &mut scheduler, |scene| {
        scene.integrator.is_integrated(AssetKind::Model)
    });
    assert!(!render_loop.scene().integrator.is_integrated(AssetKind::Text));
    let model_id = render_loop.scene().spinning.target();
    assert!(model_id.is_some());

    release_text.send(()).unwrap();
    pump_until(&mut render_loop, &mut scheduler, |scene| {
        scene.integrator.is_integrated(AssetKind::Text)
    });

    let scene = render_loop.scene();
    assert_eq!(scene.graph.len(), 6);
    assert_eq!(scene.spinning.target(), model_id);
    let stub_names: Vec<_> = scene
        .graph
        .iter()
        .map(|(_, node)| node.name.as_str())
        .filter(|name| name.starts_with("stub-"))
        .collect();
    assert_eq!(stub_names, ["stub-model", "stub-text"]);
    assert!(scene.spinning.total_rotation() > 0.0);
    assert_eq!(render_loop.assets_in_flight(), 0);
}

#[test]
fn duplicate_completions_are_ignored() {
    let mut scene = GreetingScene::new(&SkyEnvironment::build(45.0));
    let completion = || AssetCompletion {
        kind: AssetKind::Model,
        path: PathBuf::from("cake/scene.gltf"),
        result: AssetLoadResult::Loaded(Node::group("cake")),
        elapsed: Duration::ZERO,
    };

    let first = scene.integrate(completion());
    assert!(matches!(first, Integration::Added(_)));
    assert_eq!(scene.integrate(completion()), Integration::Duplicate);
    assert_eq!(scene.graph.len(), 5);
}

#[test]
fn loop_stays_live_without_any_assets() {
    let mut render_loop = new_loop(None);
    let mut scheduler = Scheduled::default();

    for _ in 0..500 {
        assert_eq!(render_loop.frame(&mut scheduler), FrameOutcome::Rendered);
        assert_eq!(render_loop.state(), LoopState::Idle);
    }
    assert_eq!(render_loop.scene().graph.len(), 4);
    assert_eq!(scheduler.0, 500);
    assert!(render_loop.backend().node_counts.iter().all(|&n| n == 4));
}

#[test]
fn pending_assets_do_not_block_frames() {
    let pipeline = AssetPipeline::new(1, AssetCache::new(false)).unwrap();
    let (model, release_model) = StubJob::gated(AssetKind::Model);
    pipeline.request(model).unwrap();

    let mut render_loop = new_loop(Some(pipeline));
    let mut scheduler = Scheduled::default();
    for _ in 0..50 {
        assert_eq!(render_loop.frame(&mut scheduler), FrameOutcome::Rendered);
    }
    assert_eq!(render_loop.scene().graph.len(), 4);
    assert_eq!(render_loop.assets_in_flight(), 1);

    release_model.send(()).unwrap();
    pump_until(&mut render_loop, &mut scheduler, |scene| {
        scene.integrator.is_integrated(AssetKind::Model)
    });
    assert_eq!(render_loop.scene().graph.len(), 5);
}

#[test]
fn environment_is_idempotent() {
    let a = SkyEnvironment::build(22.5);
    let b = SkyEnvironment::build(22.5);
    assert_eq!(a, b);
    assert_eq!(
        GreetingScene::new(&a).graph.len(),
        GreetingScene::new(&b).graph.len()
    );
}

#[test]
fn stopped_loop_neither_renders_nor_schedules() {
    let mut render_loop = new_loop(None);
    let mut scheduler = Scheduled::default();
    let shutdown = render_loop.shutdown_handle();

    render_loop.frame(&mut scheduler);
    shutdown.request_stop();
    for _ in 0..10 {
        assert_eq!(render_loop.frame(&mut scheduler), FrameOutcome::Stopped);
    }
    assert_eq!(scheduler.0, 1);
    assert_eq!(render_loop.backend().node_counts.len(), 1);
}
