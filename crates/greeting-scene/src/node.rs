//! Scene nodes and their payloads.

use greeting_sky::{DirectionalLight, HemisphereLight, SkyNode};

use crate::mesh::Mesh;
use crate::transform::Transform;

/// What a node contributes to the frame.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// Pure transform container.
    Group,
    /// Renderable triangle mesh.
    Mesh(Mesh),
    /// Atmosphere-shaded sky dome.
    Sky(SkyNode),
    /// Sun light.
    DirectionalLight(DirectionalLight),
    /// Sky/ground ambient light.
    HemisphereLight(HemisphereLight),
}

/// A named node with a local transform and an owned subtree.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    /// Rendered into the shadow map.
    pub cast_shadow: bool,
    /// Samples the shadow map when shaded.
    pub receive_shadow: bool,
    pub children: Vec<Node>,
}

impl Node {
    /// A node with an identity transform, no shadows, and no children.
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            transform: Transform::IDENTITY,
            cast_shadow: false,
            receive_shadow: false,
            children: Vec::new(),
        }
    }

    /// An empty group.
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    /// A mesh node.
    pub fn mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self::new(name, NodeKind::Mesh(mesh))
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_cast_shadow(mut self, cast: bool) -> Self {
        self.cast_shadow = cast;
        self
    }

    pub fn with_receive_shadow(mut self, receive: bool) -> Self {
        self.receive_shadow = receive;
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Visit this node and every descendant, depth first, parent before children.
    pub fn traverse(&self, f: &mut impl FnMut(&Node)) {
        f(self);
        for child in &self.children {
            child.traverse(f);
        }
    }

    /// Mutable form of [`traverse`](Self::traverse).
    pub fn traverse_mut(&mut self, f: &mut impl FnMut(&mut Node)) {
        f(self);
        for child in &mut self.children {
            child.traverse_mut(f);
        }
    }

    /// Enable shadow casting on every mesh in this subtree. Groups keep
    /// their own flag.
    pub fn cast_shadows_recursive(&mut self) {
        self.traverse_mut(&mut |node| {
            if matches!(node.kind, NodeKind::Mesh(_)) {
                node.cast_shadow = true;
            }
        });
    }

    /// Number of mesh nodes in this subtree.
    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.traverse(&mut |node| {
            if matches!(node.kind, NodeKind::Mesh(_)) {
                count += 1;
            }
        });
        count
    }
}
