//! wgpu rendering for the greeting scene: GPU context, camera and orbit
//! controls, and a three-pass scene renderer (shadow map, sky dome, lit meshes).

pub mod backend;
pub mod camera;
pub mod controls;
pub mod depth;
pub mod gpu;
pub mod mesh_cache;
pub mod pipelines;
pub mod renderer;
pub mod tonemap;
pub mod uniforms;

pub use backend::{BackendError, RenderBackend};
pub use camera::Camera;
pub use controls::{CameraController, OrbitControls};
pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use renderer::{FogSettings, RenderSettings, SceneRenderer};
pub use tonemap::ToneMapping;
pub use uniforms::{DrawUniform, FrameUniform, SkyPassUniform};
