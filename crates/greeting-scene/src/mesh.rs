//! Triangle meshes and surface materials.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Interleaved vertex: position + normal, 24 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Object-space unit normal.
    pub normal: [f32; 3],
}

impl Vertex {
    /// Construct from glam vectors.
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
        }
    }
}

/// Indexed triangle list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    /// Vertex data.
    pub vertices: Vec<Vertex>,
    /// Triangle indices, three per triangle, counter-clockwise front faces.
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Construct from parts.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Build from positions and indices, computing smooth vertex normals.
    pub fn with_computed_normals(positions: &[Vec3], indices: Vec<u32>) -> Self {
        let normals = compute_vertex_normals(positions, &indices);
        let vertices = positions
            .iter()
            .zip(normals)
            .map(|(&p, n)| Vertex::new(p, n))
            .collect();
        Self { vertices, indices }
    }

    /// `true` when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.indices.len() < 3 || self.vertices.is_empty()
    }

    /// Number of complete triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds `(min, max)`, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.vertices.iter().map(|v| Vec3::from(v.position));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }
}

/// Area-weighted smooth normals. Vertices referenced by no triangle (or
/// only degenerate ones) get +Y.
pub fn compute_vertex_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (Some(&pa), Some(&pb), Some(&pc)) = (positions.get(a), positions.get(b), positions.get(c))
        else {
            continue;
        };
        let face = (pb - pa).cross(pc - pa);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
        .collect()
}

/// Lighting model used to shade a surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShadingModel {
    /// Metallic-roughness shading.
    Standard {
        /// Perceptual roughness, `0..=1`.
        roughness: f32,
        /// Metalness, `0..=1`.
        metalness: f32,
    },
    /// Blinn-Phong shading.
    Phong {
        /// Specular exponent.
        shininess: f32,
    },
}

/// Which faces of a mesh are rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// Counter-clockwise faces only.
    Front,
    /// Clockwise faces only, with normals flipped.
    Back,
    /// Both.
    Double,
}

/// Surface appearance of a mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Shading model and its parameters.
    pub model: ShadingModel,
    /// Linear RGB base color.
    pub color: Vec3,
    /// Rendered faces.
    pub side: Side,
}

impl Material {
    /// Rough, non-metallic standard material.
    pub fn standard(color: Vec3) -> Self {
        Self {
            model: ShadingModel::Standard {
                roughness: 1.0,
                metalness: 0.0,
            },
            color,
            side: Side::Front,
        }
    }

    /// Phong material with the default shininess of 30.
    pub fn phong(color: Vec3) -> Self {
        Self {
            model: ShadingModel::Phong { shininess: 30.0 },
            color,
            side: Side::Front,
        }
    }

    /// Builder: render the given side.
    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }
}

/// Geometry plus material. The geometry is shared so renderers can cache
/// GPU buffers per allocation.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    /// Shared geometry.
    pub data: Arc<MeshData>,
    /// Surface appearance.
    pub material: Material,
}

impl Mesh {
    /// Wrap geometry and material.
    pub fn new(data: MeshData, material: Material) -> Self {
        Self {
            data: Arc::new(data),
            material,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        assert_eq!(std::mem::offset_of!(Vertex, normal), 12);
    }

    #[test]
    fn test_computed_normals_follow_winding() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let mesh = MeshData::with_computed_normals(&positions, vec![0, 1, 2]);
        for v in &mesh.vertices {
            assert!(Vec3::from(v.normal).abs_diff_eq(Vec3::Z, 1e-6));
        }
    }

    #[test]
    fn test_unreferenced_vertex_gets_up_normal() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE];
        let normals = compute_vertex_normals(&positions, &[0, 1, 2]);
        assert_eq!(normals[3], Vec3::Y);
    }

    #[test]
    fn test_out_of_range_indices_are_skipped() {
        let positions = [Vec3::ZERO, Vec3::X];
        let normals = compute_vertex_normals(&positions, &[0, 1, 7]);
        assert_eq!(normals, vec![Vec3::Y, Vec3::Y]);
    }

    #[test]
    fn test_bounds() {
        let positions = [Vec3::new(-1.0, 0.0, 2.0), Vec3::new(3.0, -2.0, 0.0), Vec3::Y];
        let mesh = MeshData::with_computed_normals(&positions, vec![0, 1, 2]);
        let (lo, hi) = mesh.bounds().unwrap();
        assert_eq!(lo, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(hi, Vec3::new(3.0, 1.0, 2.0));
        assert!(MeshData::default().bounds().is_none());
        assert!(MeshData::default().is_empty());
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_material_constructors() {
        let m = Material::phong(Vec3::ONE).with_side(Side::Double);
        assert_eq!(m.side, Side::Double);
        assert!(matches!(m.model, ShadingModel::Phong { shininess } if shininess == 30.0));
        let s = Material::standard(Vec3::ONE);
        assert!(matches!(s.model, ShadingModel::Standard { .. }));
    }
}
