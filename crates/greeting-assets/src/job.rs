//! Load jobs and their results.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use greeting_scene::Node;

use crate::cache::AssetCache;
use crate::error::AssetLoadError;

/// The independent assets the scene loads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Extruded greeting text.
    Text,
    /// Spinning glTF model.
    Model,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Text => f.write_str("text"),
            AssetKind::Model => f.write_str("model"),
        }
    }
}

/// Outcome of one load. Produced exactly once per request.
#[derive(Debug)]
pub enum AssetLoadResult<T> {
    Loaded(T),
    Failed(AssetLoadError),
}

impl<T> AssetLoadResult<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, AssetLoadResult::Loaded(_))
    }
}

impl<T> From<Result<T, AssetLoadError>> for AssetLoadResult<T> {
    fn from(result: Result<T, AssetLoadError>) -> Self {
        match result {
            Ok(value) => AssetLoadResult::Loaded(value),
            Err(err) => AssetLoadResult::Failed(err),
        }
    }
}

/// A unit of loading work executed on a loader thread.
///
/// `run` builds a detached node tree; it must not assume anything about
/// the scene it will be added to.
pub trait AssetJob: Send {
    fn kind(&self) -> AssetKind;

    /// File the job reads, used for logging and error reports.
    fn path(&self) -> &Path;

    fn run(&self, cache: &AssetCache) -> Result<Node, AssetLoadError>;
}

/// A finished load, delivered to the render thread.
#[derive(Debug)]
pub struct AssetCompletion {
    pub kind: AssetKind,
    pub path: PathBuf,
    pub result: AssetLoadResult<Node>,
    /// Wall time spent in the job.
    pub elapsed: Duration,
}
