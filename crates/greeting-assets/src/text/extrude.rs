//! Glyph outlines to a closed prism mesh.
//!
//! Each glyph is filled with the non-zero rule, so overlapping strokes merge
//! and counter-wound contours become holes. The fill is emitted twice (back
//! cap at `z = 0`, front cap at `z = depth`) and every contour edge becomes
//! a flat-shaded side quad.

use glam::{Vec2, Vec3};
use lyon_path::Path;
use lyon_path::math::Point;
use lyon_tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, VertexBuffers,
};

use super::typeface::{GlyphOutline, signed_area};
use greeting_scene::{MeshData, Vertex};

const EPSILON: f32 = 1e-6;

/// Accumulates vertices and outward-facing triangles.
#[derive(Default)]
struct MeshBuilder {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl MeshBuilder {
    fn push_vertex(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(Vertex::new(position, normal));
        index
    }

    /// Add a triangle, flipping its winding if needed so that it is
    /// counter-clockwise when seen from the side `facing` points to.
    fn push_triangle(&mut self, [a, b, c]: [u32; 3], facing: Vec3) {
        let p = |i: u32| Vec3::from(self.vertices[i as usize].position);
        let normal = (p(b) - p(a)).cross(p(c) - p(a));
        if normal.dot(facing) < 0.0 {
            self.indices.extend_from_slice(&[a, c, b]);
        } else {
            self.indices.extend_from_slice(&[a, b, c]);
        }
    }
}

/// Build the extruded mesh for a laid-out string. Glyphs that fail to
/// tessellate are skipped with a warning.
pub fn extrude_glyphs(glyphs: &[GlyphOutline], depth: f32) -> MeshData {
    let mut builder = MeshBuilder::default();
    let mut tessellator = FillTessellator::new();

    for glyph in glyphs {
        if glyph.contours.is_empty() {
            continue;
        }
        let Some(fill) = tessellate(&mut tessellator, &glyph.contours) else {
            tracing::warn!(character = %glyph.character, "Glyph failed to tessellate");
            continue;
        };
        push_caps(&mut builder, &fill, depth);
        push_sides(&mut builder, &glyph.contours, depth);
    }

    MeshData::new(builder.vertices, builder.indices)
}

fn tessellate(
    tessellator: &mut FillTessellator,
    contours: &[Vec<Vec2>],
) -> Option<VertexBuffers<Vec2, u32>> {
    let mut path_builder = Path::builder();
    for contour in contours {
        let Some((first, rest)) = contour.split_first() else {
            continue;
        };
        path_builder.begin(Point::new(first.x, first.y));
        for p in rest {
            path_builder.line_to(Point::new(p.x, p.y));
        }
        path_builder.close();
    }
    let path = path_builder.build();

    let mut geometry: VertexBuffers<Vec2, u32> = VertexBuffers::new();
    let options = FillOptions::default().with_fill_rule(FillRule::NonZero);
    let result = tessellator.tessellate_path(
        &path,
        &options,
        &mut BuffersBuilder::new(&mut geometry, |vertex: FillVertex| {
            Vec2::new(vertex.position().x, vertex.position().y)
        }),
    );

    if result.is_err() || geometry.indices.is_empty() {
        return None;
    }
    Some(geometry)
}

fn push_caps(builder: &mut MeshBuilder, fill: &VertexBuffers<Vec2, u32>, depth: f32) {
    for (z, facing) in [(0.0, Vec3::NEG_Z), (depth, Vec3::Z)] {
        let base = builder.vertices.len() as u32;
        for v in &fill.vertices {
            builder.push_vertex(Vec3::new(v.x, v.y, z), facing);
        }
        for tri in fill.indices.chunks_exact(3) {
            builder.push_triangle([base + tri[0], base + tri[1], base + tri[2]], facing);
        }
    }
}

fn push_sides(builder: &mut MeshBuilder, contours: &[Vec<Vec2>], depth: f32) {
    // Outward is to the right of travel on counter-clockwise outer contours.
    // Holes wind the other way, so the same rule holds for them once the
    // outer contour's orientation is known.
    let orientation = contours
        .iter()
        .map(|c| signed_area(c))
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
        .map_or(1.0, f32::signum);

    for contour in contours {
        let n = contour.len();
        for i in 0..n {
            let p0 = contour[i];
            let p1 = contour[(i + 1) % n];
            let edge = p1 - p0;
            let length = edge.length();
            if length < EPSILON {
                continue;
            }
            let outward = Vec2::new(edge.y, -edge.x) / length * orientation;
            let normal = Vec3::new(outward.x, outward.y, 0.0);

            let a0 = builder.push_vertex(p0.extend(0.0), normal);
            let a1 = builder.push_vertex(p1.extend(0.0), normal);
            let b1 = builder.push_vertex(p1.extend(depth), normal);
            let b0 = builder.push_vertex(p0.extend(depth), normal);
            builder.push_triangle([a0, a1, b1], normal);
            builder.push_triangle([a0, b1, b0], normal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::typeface::Typeface;
    use crate::text::typeface::tests::TEST_FONT;

    fn glyphs(text: &str) -> Vec<GlyphOutline> {
        Typeface::from_slice(TEST_FONT.as_bytes())
            .unwrap()
            .layout(text, 1.0, 12)
            .unwrap()
    }

    /// Every triangle's winding agrees with its vertex normals.
    fn assert_outward(mesh: &MeshData) {
        for tri in mesh.indices.chunks_exact(3) {
            let v = |i: u32| mesh.vertices[i as usize];
            let p = |i: u32| Vec3::from(v(i).position);
            let face = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            let normal = Vec3::from(v(tri[0]).normal);
            assert!(face.dot(normal) >= 0.0, "inward triangle {tri:?}");
        }
    }

    #[test]
    fn test_square_prism() {
        let mesh = extrude_glyphs(&glyphs("A"), 0.1);
        // 2 caps x 2 triangles + 4 sides x 2 triangles
        assert_eq!(mesh.triangle_count(), 12);
        let (lo, hi) = mesh.bounds().unwrap();
        assert!(lo.abs_diff_eq(Vec3::ZERO, 1e-6));
        assert!(hi.abs_diff_eq(Vec3::new(0.5, 0.5, 0.1), 1e-6));
        assert_outward(&mesh);
    }

    #[test]
    fn test_side_normals_point_away_from_solid() {
        let mesh = extrude_glyphs(&glyphs("A"), 0.1);
        let center = Vec2::new(0.25, 0.25);
        for v in &mesh.vertices {
            let n = Vec3::from(v.normal);
            if n.z.abs() > 0.5 {
                continue;
            }
            let p = Vec2::new(v.position[0], v.position[1]);
            assert!((p - center).dot(n.truncate()) > 0.0, "normal {n:?} at {p:?}");
        }
    }

    #[test]
    fn test_hole_is_not_filled() {
        let mesh = extrude_glyphs(&glyphs("O"), 0.1);
        // Cap triangles never cover the hole's center.
        let hole = Vec2::new(0.3, 0.3);
        for tri in mesh.indices.chunks_exact(3) {
            let p: Vec<Vec3> = tri
                .iter()
                .map(|&i| Vec3::from(mesh.vertices[i as usize].position))
                .collect();
            if (p[0].z - p[1].z).abs() > EPSILON || (p[1].z - p[2].z).abs() > EPSILON {
                continue;
            }
            let [a, b, c] = [p[0].truncate(), p[1].truncate(), p[2].truncate()];
            let d1 = (b - a).perp_dot(hole - a);
            let d2 = (c - b).perp_dot(hole - b);
            let d3 = (a - c).perp_dot(hole - c);
            let inside = (d1 > 0.0 && d2 > 0.0 && d3 > 0.0) || (d1 < 0.0 && d2 < 0.0 && d3 < 0.0);
            assert!(!inside, "cap triangle covers the hole");
        }
        // 8 side quads: 4 outer + 4 inner
        let side_triangles = mesh
            .vertices
            .iter()
            .filter(|v| v.normal[2] == 0.0)
            .count()
            / 2;
        assert_eq!(side_triangles, 16);
        assert_outward(&mesh);
    }

    #[test]
    fn test_blank_glyphs_produce_nothing() {
        let mesh = extrude_glyphs(&glyphs("  "), 0.1);
        assert!(mesh.is_empty());
    }
}
