//! Extruded 3D text from typeface JSON fonts.

mod extrude;
mod typeface;

use std::path::{Path, PathBuf};

use glam::Vec3;
use greeting_scene::{Material, Mesh, Node, Transform, hex_to_linear};

use crate::cache::AssetCache;
use crate::error::AssetLoadError;
use crate::job::{AssetJob, AssetKind};

pub use extrude::extrude_glyphs;
pub use typeface::{Glyph, GlyphOutline, Typeface};

/// How the greeting text is shaped and placed.
#[derive(Clone, Debug, PartialEq)]
pub struct TextSettings {
    pub content: String,
    /// Glyph height in world units.
    pub size: f32,
    /// Extrusion depth along +Z.
    pub depth: f32,
    /// Line segments per outline curve.
    pub curve_segments: u32,
    /// Linear RGB color.
    pub color: Vec3,
    pub position: Vec3,
    /// Rotation around the local Y axis, in radians.
    pub rotation_y: f32,
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            content: "Папа, с Днем рождения!".to_string(),
            size: 1.0,
            depth: 0.1,
            curve_segments: 12,
            color: hex_to_linear(0x2196f3),
            position: Vec3::new(-5.0, 1.0, 0.0),
            rotation_y: -std::f32::consts::PI / 10.0,
        }
    }
}

/// Loads a font and builds the greeting text mesh.
#[derive(Clone, Debug)]
pub struct TextJob {
    font_path: PathBuf,
    settings: TextSettings,
}

impl TextJob {
    pub fn new(font_path: impl Into<PathBuf>, settings: TextSettings) -> Self {
        Self {
            font_path: font_path.into(),
            settings,
        }
    }

    /// Build the text node from font bytes.
    pub fn build(&self, font_bytes: &[u8]) -> Result<Node, AssetLoadError> {
        let settings = &self.settings;
        let font_error = |reason: String| AssetLoadError::FontParse {
            path: self.font_path.clone(),
            reason,
        };

        let face = Typeface::from_slice(font_bytes).map_err(font_error)?;
        let glyphs = face
            .layout(&settings.content, settings.size, settings.curve_segments)
            .map_err(font_error)?;
        let mesh = extrude_glyphs(&glyphs, settings.depth);
        if mesh.is_empty() {
            return Err(AssetLoadError::EmptyText(settings.content.clone()));
        }

        tracing::debug!(
            family = %face.family_name,
            glyphs = glyphs.len(),
            triangles = mesh.triangle_count(),
            "Built text mesh"
        );

        let transform = Transform::from_translation(settings.position)
            .with_rotation_y(settings.rotation_y);
        Ok(
            Node::mesh("greeting-text", Mesh::new(mesh, Material::phong(settings.color)))
                .with_transform(transform)
                .with_cast_shadow(true),
        )
    }
}

impl AssetJob for TextJob {
    fn kind(&self) -> AssetKind {
        AssetKind::Text
    }

    fn path(&self) -> &Path {
        &self.font_path
    }

    fn run(&self, cache: &AssetCache) -> Result<Node, AssetLoadError> {
        let bytes = cache.read(&self.font_path)?;
        self.build(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greeting_scene::{NodeKind, ShadingModel};
    use typeface::tests::TEST_FONT;

    fn job(content: &str) -> TextJob {
        TextJob::new(
            "fonts/test.json",
            TextSettings {
                content: content.to_string(),
                ..TextSettings::default()
            },
        )
    }

    #[test]
    fn test_builds_placed_phong_mesh() {
        let node = job("AO").build(TEST_FONT.as_bytes()).unwrap();
        assert!(node.cast_shadow);
        assert_eq!(node.transform.translation, Vec3::new(-5.0, 1.0, 0.0));
        let (axis, angle) = node.transform.rotation.to_axis_angle();
        assert!((angle - std::f32::consts::PI / 10.0).abs() < 1e-5);
        assert!((axis.y + 1.0).abs() < 1e-5, "rotation must be about -Y");

        let NodeKind::Mesh(mesh) = &node.kind else {
            panic!("text must be a mesh");
        };
        assert!(matches!(mesh.material.model, ShadingModel::Phong { .. }));
        assert!(!mesh.data.is_empty());
    }

    #[test]
    fn test_blank_text_is_an_error() {
        let err = job("   ").build(TEST_FONT.as_bytes()).unwrap_err();
        assert!(matches!(err, AssetLoadError::EmptyText(_)));
    }

    #[test]
    fn test_invalid_json_is_font_error() {
        let err = job("A").build(b"not json").unwrap_err();
        assert!(matches!(err, AssetLoadError::FontParse { .. }));
    }

    #[test]
    fn test_run_reads_through_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("font.json");
        std::fs::write(&path, TEST_FONT).unwrap();

        let cache = AssetCache::new(true);
        let job = TextJob::new(&path, TextSettings {
            content: "A".to_string(),
            ..TextSettings::default()
        });
        assert_eq!(job.kind(), AssetKind::Text);
        job.run(&cache).unwrap();
        assert!(cache.contains(&path));
    }

    #[test]
    fn test_missing_font_is_io_error() {
        let cache = AssetCache::new(true);
        let err = job("A").run(&cache).unwrap_err();
        assert!(matches!(err, AssetLoadError::Io { .. }));
    }
}
