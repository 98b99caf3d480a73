//! Ground plane.

use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use greeting_sky::hex_to_linear;

use crate::mesh::{Material, Mesh, MeshData, Side, Vertex};
use crate::node::Node;
use crate::transform::Transform;

/// A square plane of side `size` lying in the XZ plane, shadow-receiving.
///
/// The quad is built in XY facing +Z and then turned a quarter turn around
/// X, so its front face points down; the material renders the back face,
/// which is the one seen from above.
pub fn floor_node(size: f32, color: u32) -> Node {
    let h = size * 0.5;
    let normal = Vec3::Z;
    let vertices = vec![
        Vertex::new(Vec3::new(-h, -h, 0.0), normal),
        Vertex::new(Vec3::new(h, -h, 0.0), normal),
        Vertex::new(Vec3::new(h, h, 0.0), normal),
        Vertex::new(Vec3::new(-h, h, 0.0), normal),
    ];
    let indices = vec![0, 1, 2, 0, 2, 3];
    let material = Material::standard(hex_to_linear(color)).with_side(Side::Back);

    Node::mesh("floor", Mesh::new(MeshData::new(vertices, indices), material))
        .with_transform(Transform::IDENTITY.with_rotation_x(FRAC_PI_2))
        .with_receive_shadow(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    #[test]
    fn test_floor_is_horizontal_and_receives_shadows() {
        let floor = floor_node(1000.0, 0xffffff);
        assert!(floor.receive_shadow);
        assert!(!floor.cast_shadow);

        let NodeKind::Mesh(mesh) = &floor.kind else {
            panic!("floor must be a mesh");
        };
        assert_eq!(mesh.material.side, Side::Back);
        let world = floor.transform.matrix();
        for v in &mesh.data.vertices {
            let p = world.transform_point3(Vec3::from(v.position));
            assert!(p.y.abs() < 1e-3, "vertex off the ground: {p:?}");
            assert!(p.x.abs() <= 500.0 + 1e-3);
        }
    }

    #[test]
    fn test_back_face_points_up() {
        let floor = floor_node(2.0, 0xffffff);
        let n = floor.transform.matrix().transform_vector3(Vec3::Z);
        assert!((-n).abs_diff_eq(Vec3::Y, 1e-6));
    }
}
