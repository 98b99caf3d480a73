//! Background loading of the greeting's decorative assets.
//!
//! Loads run on worker threads and report through a channel. Nothing here
//! touches the [`SceneGraph`](greeting_scene::SceneGraph) except
//! [`AssetIntegrator`], which the render thread calls at frame boundaries.
//! A failed load is logged and dropped; the scene keeps rendering without it.

mod cache;
mod error;
mod integrate;
mod job;
mod model;
mod pipeline;
pub mod text;

pub use cache::AssetCache;
pub use error::{AssetLoadError, RequestError};
pub use integrate::{AssetFailure, AssetIntegrator, Integration};
pub use job::{AssetCompletion, AssetJob, AssetKind, AssetLoadResult};
pub use model::{ModelJob, ModelSettings};
pub use pipeline::{AssetPipeline, default_thread_count};
pub use text::{TextJob, TextSettings};
