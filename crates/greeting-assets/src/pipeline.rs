//! Asset loading on a small pool of worker threads.
//!
//! Jobs go in over a bounded channel; each worker runs one job at a time
//! and sends an [`AssetCompletion`] back. The render thread collects them
//! with [`AssetPipeline::drain_completed`], which never blocks. There is no
//! cancellation and no timeout: a request always yields exactly one
//! completion, even if the job panics.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::cache::AssetCache;
use crate::error::{AssetLoadError, RequestError};
use crate::job::{AssetCompletion, AssetJob, AssetKind, AssetLoadResult};

/// Queue depth for pending jobs and undelivered completions.
const CHANNEL_CAPACITY: usize = 16;

/// One worker per [`AssetKind`], so a stalled load never delays the other.
const MIN_AUTO_WORKERS: usize = 2;
const MAX_AUTO_WORKERS: usize = 4;

/// Worker count used when the caller passes 0.
pub fn default_thread_count() -> usize {
    num_cpus::get()
        .saturating_sub(1)
        .clamp(MIN_AUTO_WORKERS, MAX_AUTO_WORKERS)
}

/// Runs [`AssetJob`]s off the render thread.
pub struct AssetPipeline {
    job_sender: Sender<Box<dyn AssetJob>>,
    result_receiver: Receiver<AssetCompletion>,
    /// Kinds requested this session; each may be requested once.
    requested: DashMap<AssetKind, ()>,
    in_flight: Arc<AtomicU64>,
    thread_count: usize,
}

impl AssetPipeline {
    /// Spawn `thread_count` workers sharing `cache`. A count of 0 sizes the
    /// pool with [`default_thread_count`].
    pub fn new(thread_count: usize, cache: AssetCache) -> std::io::Result<Self> {
        let thread_count = match thread_count {
            0 => default_thread_count(),
            n => n,
        };
        let (job_sender, job_receiver) = bounded::<Box<dyn AssetJob>>(CHANNEL_CAPACITY);
        let (result_sender, result_receiver) = bounded::<AssetCompletion>(CHANNEL_CAPACITY);
        let cache = Arc::new(cache);
        let in_flight = Arc::new(AtomicU64::new(0));

        for index in 0..thread_count {
            let receiver = job_receiver.clone();
            let sender = result_sender.clone();
            let cache = Arc::clone(&cache);
            let in_flight = Arc::clone(&in_flight);

            std::thread::Builder::new()
                .name(format!("asset-loader-{index}"))
                .spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        let completion = run_job(job.as_ref(), &cache);
                        in_flight.fetch_sub(1, Ordering::Relaxed);
                        if sender.send(completion).is_err() {
                            break;
                        }
                    }
                })?;
        }

        tracing::debug!(threads = thread_count, "Asset pipeline started");

        Ok(Self {
            job_sender,
            result_receiver,
            requested: DashMap::new(),
            in_flight,
            thread_count,
        })
    }

    /// Pool sized from the CPU count, with a fresh cache.
    pub fn with_defaults(cache_enabled: bool) -> std::io::Result<Self> {
        Self::new(0, AssetCache::new(cache_enabled))
    }

    /// Queue a job. Each [`AssetKind`] is accepted once per pipeline.
    pub fn request(&self, job: impl AssetJob + 'static) -> Result<(), RequestError> {
        let kind = job.kind();
        match self.requested.entry(kind) {
            Entry::Occupied(_) => return Err(RequestError::AlreadyRequested(kind)),
            Entry::Vacant(slot) => {
                slot.insert(());
            }
        }

        tracing::info!(%kind, path = %job.path().display(), "Requested asset load");
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        self.job_sender.try_send(Box::new(job)).map_err(|e| {
            self.in_flight.fetch_sub(1, Ordering::Relaxed);
            self.requested.remove(&kind);
            match e {
                TrySendError::Full(_) => RequestError::QueueFull,
                TrySendError::Disconnected(_) => RequestError::Disconnected,
            }
        })
    }

    /// All completions that have arrived since the last call. Never blocks.
    pub fn drain_completed(&self) -> Vec<AssetCompletion> {
        let mut completed = Vec::new();
        while let Ok(completion) = self.result_receiver.try_recv() {
            completed.push(completion);
        }
        completed
    }

    /// Jobs queued or running.
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Whether `kind` has been requested.
    pub fn is_requested(&self, kind: AssetKind) -> bool {
        self.requested.contains_key(&kind)
    }

    /// Worker threads in the pool.
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }
}

fn run_job(job: &dyn AssetJob, cache: &AssetCache) -> AssetCompletion {
    let start = Instant::now();
    let result = match panic::catch_unwind(AssertUnwindSafe(|| job.run(cache))) {
        Ok(result) => AssetLoadResult::from(result),
        Err(_) => AssetLoadResult::Failed(AssetLoadError::Worker(job.path().to_path_buf())),
    };
    AssetCompletion {
        kind: job.kind(),
        path: job.path().to_path_buf(),
        result,
        elapsed: start.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greeting_scene::Node;
    use std::path::{Path, PathBuf};
    use std::sync::mpsc;
    use std::time::Duration;

    struct StubJob {
        kind: AssetKind,
        path: PathBuf,
        delay: Duration,
        fail: bool,
    }

    impl StubJob {
        fn new(kind: AssetKind, delay_ms: u64, fail: bool) -> Self {
            Self {
                kind,
                path: PathBuf::from(format!("{kind}.bin")),
                delay: Duration::from_millis(delay_ms),
                fail,
            }
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
            std::thread::sleep(self.delay);
            if self.fail {
                Err(AssetLoadError::EmptyModel(self.path.clone()))
            } else {
                Ok(Node::group(self.kind.to_string()))
            }
        }
    }

    /// Blocks until the test sends on the paired channel.
    struct GatedJob {
        kind: AssetKind,
        path: PathBuf,
        gate: mpsc::Receiver<()>,
    }

    impl GatedJob {
        fn new(kind: AssetKind) -> (Self, mpsc::Sender<()>) {
            let (sender, gate) = mpsc::channel();
            let job = Self {
                kind,
                path: PathBuf::from(format!("{kind}.gated")),
                gate,
            };
            (job, sender)
        }
    }

    impl AssetJob for GatedJob {
        fn kind(&self) -> AssetKind {
            self.kind
        }

        fn path(&self) -> &Path {
            &self.path
        }

        fn run(&self, _cache: &AssetCache) -> Result<Node, AssetLoadError> {
            let _ = self.gate.recv();
            Ok(Node::group(self.kind.to_string()))
        }
    }

    struct PanicJob(PathBuf);

    impl AssetJob for PanicJob {
        fn kind(&self) -> AssetKind {
            AssetKind::Model
        }

        fn path(&self) -> &Path {
            &self.0
        }

        fn run(&self, _cache: &AssetCache) -> Result<Node, AssetLoadError> {
            panic!("loader bug");
        }
    }

    fn wait_for(pipeline: &AssetPipeline, count: usize) -> Vec<AssetCompletion> {
        let mut all = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(10);
        while all.len() < count && Instant::now() < deadline {
            all.extend(pipeline.drain_completed());
            std::thread::sleep(Duration::from_millis(5));
        }
        all
    }

    #[test]
    fn test_each_request_completes_once() {
        let pipeline = AssetPipeline::new(2, AssetCache::default()).unwrap();
        pipeline
            .request(StubJob::new(AssetKind::Text, 5, false))
            .unwrap();
        pipeline
            .request(StubJob::new(AssetKind::Model, 5, true))
            .unwrap();

        let completions = wait_for(&pipeline, 2);
        assert_eq!(completions.len(), 2);
        let text = completions
            .iter()
            .find(|c| c.kind == AssetKind::Text)
            .unwrap();
        assert!(text.result.is_loaded());
        let model = completions
            .iter()
            .find(|c| c.kind == AssetKind::Model)
            .unwrap();
        assert!(!model.result.is_loaded());

        std::thread::sleep(Duration::from_millis(20));
        assert!(pipeline.drain_completed().is_empty());
        assert_eq!(pipeline.in_flight_count(), 0);
    }

    #[test]
    fn test_duplicate_request_rejected() {
        let pipeline = AssetPipeline::new(1, AssetCache::default()).unwrap();
        pipeline
            .request(StubJob::new(AssetKind::Model, 0, false))
            .unwrap();
        let err = pipeline
            .request(StubJob::new(AssetKind::Model, 0, false))
            .unwrap_err();
        assert_eq!(err, RequestError::AlreadyRequested(AssetKind::Model));
        assert!(pipeline.is_requested(AssetKind::Model));
        assert!(!pipeline.is_requested(AssetKind::Text));
    }

    #[test]
    fn test_drain_does_not_block_on_slow_job() {
        let pipeline = AssetPipeline::new(1, AssetCache::default()).unwrap();
        pipeline
            .request(StubJob::new(AssetKind::Model, 500, false))
            .unwrap();
        let start = Instant::now();
        assert!(pipeline.drain_completed().is_empty());
        assert!(start.elapsed() < Duration::from_millis(100));
        assert_eq!(pipeline.in_flight_count(), 1);
    }

    #[test]
    fn test_panicking_job_reports_worker_error() {
        let pipeline = AssetPipeline::new(1, AssetCache::default()).unwrap();
        pipeline
            .request(PanicJob(PathBuf::from("broken.gltf")))
            .unwrap();
        let completions = wait_for(&pipeline, 1);
        assert_eq!(completions.len(), 1);
        assert!(matches!(
            completions[0].result,
            AssetLoadResult::Failed(AssetLoadError::Worker(_))
        ));
    }

    #[test]
    fn test_zero_threads_sizes_pool_from_cpu_count() {
        let pipeline = AssetPipeline::new(0, AssetCache::default()).unwrap();
        assert_eq!(pipeline.thread_count(), default_thread_count());
        assert!(pipeline.thread_count() >= 2);

        let explicit = AssetPipeline::new(3, AssetCache::default()).unwrap();
        assert_eq!(explicit.thread_count(), 3);
    }

    #[test]
    fn test_stalled_text_load_does_not_delay_model_with_default_pool() {
        let pipeline = AssetPipeline::with_defaults(false).unwrap();
        let (text, release_text) = GatedJob::new(AssetKind::Text);
        pipeline.request(text).unwrap();
        pipeline
            .request(StubJob::new(AssetKind::Model, 0, false))
            .unwrap();

        let completions = wait_for(&pipeline, 1);
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].kind, AssetKind::Model);
        assert_eq!(pipeline.in_flight_count(), 1);

        release_text.send(()).unwrap();
        let completions = wait_for(&pipeline, 1);
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].kind, AssetKind::Text);
    }
}
