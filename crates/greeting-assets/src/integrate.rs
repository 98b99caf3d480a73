//! Applying finished loads to the scene graph on the render thread.

use std::collections::HashMap;
use std::path::PathBuf;

use greeting_scene::{NodeId, SceneGraph, SpinningAssetState};

use crate::error::AssetLoadError;
use crate::job::{AssetCompletion, AssetKind, AssetLoadResult};

/// A load that failed and was dropped.
#[derive(Debug)]
pub struct AssetFailure {
    pub kind: AssetKind,
    pub path: PathBuf,
    pub error: AssetLoadError,
}

/// What [`AssetIntegrator::apply`] did with a completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Integration {
    /// The node was appended to the graph.
    Added(NodeId),
    /// A node of this kind was already integrated; the new one was dropped.
    Duplicate,
    /// The load failed; the graph is unchanged.
    Failed,
}

/// Tracks which asset kinds have made it into the scene.
#[derive(Debug, Default)]
pub struct AssetIntegrator {
    integrated: HashMap<AssetKind, NodeId>,
    failures: Vec<AssetFailure>,
}

impl AssetIntegrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a successful load to `graph`, or record a failure.
    ///
    /// A loaded model becomes the target of `spinning`.
    pub fn apply(
        &mut self,
        completion: AssetCompletion,
        graph: &mut SceneGraph,
        spinning: &mut SpinningAssetState,
    ) -> Integration {
        let AssetCompletion {
            kind,
            path,
            result,
            elapsed,
        } = completion;

        match result {
            AssetLoadResult::Loaded(node) => {
                if self.integrated.contains_key(&kind) {
                    tracing::warn!(%kind, path = %path.display(), "Ignoring duplicate asset");
                    return Integration::Duplicate;
                }
                let meshes = node.mesh_count();
                let id = graph.add_node(node);
                self.integrated.insert(kind, id);
                if kind == AssetKind::Model {
                    spinning.attach(id);
                }
                tracing::info!(
                    %kind,
                    path = %path.display(),
                    meshes,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Asset added to scene"
                );
                Integration::Added(id)
            }
            AssetLoadResult::Failed(error) => {
                tracing::error!(%kind, path = %path.display(), %error, "Asset failed to load");
                self.failures.push(AssetFailure { kind, path, error });
                Integration::Failed
            }
        }
    }

    /// Graph handle of an integrated asset.
    pub fn node_for(&self, kind: AssetKind) -> Option<NodeId> {
        self.integrated.get(&kind).copied()
    }

    pub fn is_integrated(&self, kind: AssetKind) -> bool {
        self.integrated.contains_key(&kind)
    }

    /// Failed loads, in arrival order.
    pub fn failures(&self) -> &[AssetFailure] {
        &self.failures
    }
}
