//! Configuration for the greeting scene.
//!
//! Settings persist to disk as a RON file and can be overridden from the
//! command line. Every section falls back to its defaults when missing, so
//! older config files keep loading as new fields are added.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    AssetsConfig, CameraConfig, Config, DebugConfig, FogConfig, ModelConfig, RenderConfig,
    SkyConfig, TextConfig, ToneMapping, WindowConfig,
};
pub use error::ConfigError;
