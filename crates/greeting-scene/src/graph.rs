//! Append-only scene graph.

use glam::Mat4;
use greeting_sky::{DirectionalLight, HemisphereLight, SkyEnvironment, SkyNode};

use crate::mesh::Mesh;
use crate::node::{Node, NodeKind};
use crate::transform::Transform;

/// Handle to a top-level node. Stable for the life of the graph, since
/// nodes are never removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in insertion order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A mesh flattened into world space for drawing.
#[derive(Clone, Copy, Debug)]
pub struct MeshInstance<'a> {
    /// Name of the owning node.
    pub name: &'a str,
    /// Object-to-world matrix.
    pub world: Mat4,
    /// Geometry and material.
    pub mesh: &'a Mesh,
    /// Rendered into the shadow map.
    pub cast_shadow: bool,
    /// Samples the shadow map.
    pub receive_shadow: bool,
}

/// Ordered collection of top-level nodes.
#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return its handle.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        tracing::debug!(name = %node.name, index = id.0, "Added scene node");
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Number of top-level nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// First top-level node with the given name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// Append the sky dome, the sun light and the hemisphere light, in that
    /// order.
    pub fn install_environment(&mut self, env: &SkyEnvironment) -> [NodeId; 3] {
        let sky = Node::new("sky", NodeKind::Sky(env.sky))
            .with_transform(Transform::from_scale(env.sky.scale));

        let sun = Node::new("sun", NodeKind::DirectionalLight(env.directional.clone()))
            .with_transform(Transform::from_translation(env.directional.position))
            .with_cast_shadow(env.directional.casts_shadow());

        let hemisphere = Node::new(
            "hemisphere",
            NodeKind::HemisphereLight(env.hemisphere.clone()),
        )
        .with_transform(Transform::from_translation(env.hemisphere.position));

        [
            self.add_node(sky),
            self.add_node(sun),
            self.add_node(hemisphere),
        ]
    }

    /// The first sky dome in the graph.
    pub fn sky(&self) -> Option<&SkyNode> {
        self.nodes.iter().find_map(|n| match &n.kind {
            NodeKind::Sky(sky) => Some(sky),
            _ => None,
        })
    }

    /// The first directional light in the graph.
    pub fn directional_light(&self) -> Option<&DirectionalLight> {
        self.nodes.iter().find_map(|n| match &n.kind {
            NodeKind::DirectionalLight(light) => Some(light),
            _ => None,
        })
    }

    /// The first hemisphere light in the graph.
    pub fn hemisphere_light(&self) -> Option<&HemisphereLight> {
        self.nodes.iter().find_map(|n| match &n.kind {
            NodeKind::HemisphereLight(light) => Some(light),
            _ => None,
        })
    }

    /// Every mesh in the graph with its world matrix, in traversal order.
    pub fn mesh_instances(&self) -> Vec<MeshInstance<'_>> {
        let mut out = Vec::new();
        for node in &self.nodes {
            collect_meshes(node, Mat4::IDENTITY, &mut out);
        }
        out
    }
}

fn collect_meshes<'a>(node: &'a Node, parent: Mat4, out: &mut Vec<MeshInstance<'a>>) {
    let world = parent * node.transform.matrix();
    if let NodeKind::Mesh(mesh) = &node.kind {
        out.push(MeshInstance {
            name: &node.name,
            world,
            mesh,
            cast_shadow: node.cast_shadow,
            receive_shadow: node.receive_shadow,
        });
    }
    for child in &node.children {
        collect_meshes(child, world, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Material, MeshData};
    use glam::Vec3;

    fn leaf(name: &str) -> Node {
        Node::mesh(name, Mesh::new(MeshData::default(), Material::standard(Vec3::ONE)))
    }

    #[test]
    fn test_add_node_returns_sequential_ids() {
        let mut graph = SceneGraph::new();
        let a = graph.add_node(Node::group("a"));
        let b = graph.add_node(Node::group("b"));
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.get(b).unwrap().name, "b");
        assert_eq!(graph.find("a"), Some(a));
        assert!(graph.find("missing").is_none());
    }

    #[test]
    fn test_install_environment_appends_three_nodes_in_order() {
        let mut graph = SceneGraph::new();
        let env = SkyEnvironment::build(30.0);
        let ids = graph.install_environment(&env);

        let names: Vec<_> = graph.iter().map(|(_, n)| n.name.as_str()).collect();
        assert_eq!(names, ["sky", "sun", "hemisphere"]);
        assert_eq!(ids.map(NodeId::index), [0, 1, 2]);
        assert_eq!(graph.sky(), Some(&env.sky));
        assert_eq!(graph.directional_light(), Some(&env.directional));
        assert_eq!(graph.hemisphere_light(), Some(&env.hemisphere));
        assert!(graph.get(ids[1]).unwrap().cast_shadow);
        assert_eq!(
            graph.get(ids[0]).unwrap().transform.scale,
            Vec3::splat(1000.0)
        );
    }

    #[test]
    fn test_mesh_instances_compose_transforms() {
        let mut graph = SceneGraph::new();
        let child = leaf("child").with_transform(Transform::from_translation(Vec3::X));
        let root = Node::group("root")
            .with_transform(Transform::from_translation(Vec3::new(0.0, 5.0, 0.0)))
            .with_child(child);
        graph.add_node(root);
        graph.add_node(leaf("top").with_receive_shadow(true));

        let instances = graph.mesh_instances();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].name, "child");
        let p = instances[0].world.transform_point3(Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::new(1.0, 5.0, 0.0), 1e-6));
        assert!(instances[1].receive_shadow);
    }
}
