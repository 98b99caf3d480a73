//! The greeting scene application.
//!
//! Builds the scene from configuration, starts the asset loads and drives
//! the frame loop from a winit window.

pub mod platform;
pub mod render_loop;
pub mod scene_setup;
pub mod window;

pub use render_loop::{FrameOutcome, FrameScheduler, LoopState, RenderLoop, ShutdownHandle};
pub use scene_setup::GreetingScene;
