//! Per-frame rotation of the loaded model.

use crate::graph::{NodeId, SceneGraph};

/// Handle to the node that spins every frame, once it exists.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpinningAssetState {
    target: Option<NodeId>,
    total_rotation: f32,
}

impl SpinningAssetState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start spinning `id`. A later call replaces the target.
    pub fn attach(&mut self, id: NodeId) {
        self.target = Some(id);
    }

    /// The spinning node, if any.
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// Accumulated rotation applied so far, in radians.
    pub fn total_rotation(&self) -> f32 {
        self.total_rotation
    }

    /// Rotate the target around its local Y axis by `increment` radians.
    ///
    /// Returns `false` (and does nothing) when no target is attached or the
    /// handle does not resolve.
    pub fn step(&mut self, graph: &mut SceneGraph, increment: f32) -> bool {
        let Some(node) = self.target.and_then(|id| graph.get_mut(id)) else {
            return false;
        };
        node.transform.rotate_y(increment);
        self.total_rotation += increment;
        true
    }
}
