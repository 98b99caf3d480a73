//! Scene graph for the greeting scene.
//!
//! The graph is an append-only list of top-level nodes, each of which may
//! own a tree of children (loaded models). It is owned by the render thread;
//! asset loaders build detached [`Node`] trees and hand them over whole.

mod floor;
mod graph;
mod mesh;
mod node;
mod spin;
mod transform;

pub use floor::floor_node;
pub use graph::{MeshInstance, NodeId, SceneGraph};
pub use mesh::{Material, Mesh, MeshData, ShadingModel, Side, Vertex};
pub use node::{Node, NodeKind};
pub use spin::SpinningAssetState;
pub use transform::Transform;

pub use greeting_sky::hex_to_linear;
