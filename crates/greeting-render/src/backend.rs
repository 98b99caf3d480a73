//! The seam between the render loop and the GPU.

use greeting_scene::SceneGraph;

use crate::camera::Camera;
use crate::gpu::SurfaceError;

/// A frame that could not be drawn.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("surface: {0}")]
    Surface(#[from] SurfaceError),
}

impl BackendError {
    /// Whether the next frame may succeed. Recoverable errors skip one
    /// frame; anything else should stop the loop.
    pub fn is_recoverable(&self) -> bool {
        match self {
            BackendError::Surface(SurfaceError::Timeout | SurfaceError::Lost) => true,
            BackendError::Surface(SurfaceError::OutOfMemory) => false,
        }
    }
}

/// Draws a scene graph from a camera.
pub trait RenderBackend {
    fn render(&mut self, graph: &SceneGraph, camera: &Camera) -> Result<(), BackendError>;

    /// The output surface changed size, in physical pixels.
    fn resize(&mut self, width: u32, height: u32);
}
