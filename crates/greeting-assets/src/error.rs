use std::path::PathBuf;

use crate::job::AssetKind;

/// Why an asset failed to load. Always non-fatal for the scene.
#[derive(Debug, thiserror::Error)]
pub enum AssetLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid typeface font {path}: {reason}")]
    FontParse { path: PathBuf, reason: String },

    #[error("text {0:?} produced no geometry")]
    EmptyText(String),

    #[error("invalid glTF model {path}: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("model {0} contains no triangle meshes")]
    EmptyModel(PathBuf),

    #[error("loader worker panicked while loading {0}")]
    Worker(PathBuf),
}

/// Why a load request was refused.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("{0} asset was already requested")]
    AlreadyRequested(AssetKind),

    #[error("load queue is full")]
    QueueFull,

    #[error("all loader workers have stopped")]
    Disconnected,
}
