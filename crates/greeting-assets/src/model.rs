//! glTF 2.0 models.
//!
//! The default scene becomes a node tree under a positioned root group.
//! Each triangle primitive turns into its own mesh child carrying the
//! primitive's base color. Texture images are not loaded.

use std::path::{Path, PathBuf};

use glam::Vec3;
use greeting_scene::{Material, Mesh, MeshData, Node, ShadingModel, Side, Transform, Vertex};

use crate::cache::AssetCache;
use crate::error::AssetLoadError;
use crate::job::{AssetJob, AssetKind};

/// Placement of the loaded model.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelSettings {
    /// World position of the model root.
    pub position: Vec3,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            position: Vec3::new(-2.0, 4.47, -2.0),
        }
    }
}

/// Loads a `.gltf`/`.glb` file into a shadow-casting node tree.
#[derive(Clone, Debug)]
pub struct ModelJob {
    path: PathBuf,
    settings: ModelSettings,
}

impl ModelJob {
    pub fn new(path: impl Into<PathBuf>, settings: ModelSettings) -> Self {
        Self {
            path: path.into(),
            settings,
        }
    }

    /// Build the model from file bytes. External buffers are resolved
    /// relative to the model's directory.
    pub fn build(&self, bytes: &[u8]) -> Result<Node, AssetLoadError> {
        let gltf_error = |source: gltf::Error| AssetLoadError::Gltf {
            path: self.path.clone(),
            source,
        };

        let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes).map_err(gltf_error)?;
        let buffers =
            gltf::import_buffers(&document, self.path.parent(), blob).map_err(gltf_error)?;

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| AssetLoadError::EmptyModel(self.path.clone()))?;

        let mut root = Node::group(scene.name().unwrap_or("model"))
            .with_transform(Transform::from_translation(self.settings.position));
        for node in scene.nodes() {
            root.children.push(convert_node(&node, &buffers));
        }

        if root.mesh_count() == 0 {
            return Err(AssetLoadError::EmptyModel(self.path.clone()));
        }
        root.cast_shadows_recursive();

        tracing::debug!(
            path = %self.path.display(),
            meshes = root.mesh_count(),
            buffers = buffers.len(),
            "Built model"
        );
        Ok(root)
    }
}

impl AssetJob for ModelJob {
    fn kind(&self) -> AssetKind {
        AssetKind::Model
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn run(&self, cache: &AssetCache) -> Result<Node, AssetLoadError> {
        let bytes = cache.read(&self.path)?;
        self.build(&bytes)
    }
}

fn convert_node(node: &gltf::Node, buffers: &[gltf::buffer::Data]) -> Node {
    let (translation, rotation, scale) = node.transform().decomposed();
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node-{}", node.index()));
    let mut out =
        Node::group(name).with_transform(Transform::from_decomposed(translation, rotation, scale));

    if let Some(mesh) = node.mesh() {
        let mesh_name = mesh.name().unwrap_or("mesh");
        for (i, primitive) in mesh.primitives().enumerate() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                tracing::debug!(mesh = mesh_name, mode = ?primitive.mode(), "Skipping non-triangle primitive");
                continue;
            }
            let Some(data) = convert_primitive(&primitive, buffers) else {
                tracing::warn!(mesh = mesh_name, primitive = i, "Skipping unreadable primitive");
                continue;
            };
            let material = convert_material(&primitive.material());
            out.children
                .push(Node::mesh(format!("{mesh_name}#{i}"), Mesh::new(data, material)));
        }
    }

    for child in node.children() {
        out.children.push(convert_node(&child, buffers));
    }
    out
}

fn convert_primitive(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
) -> Option<MeshData> {
    let reader =
        primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let positions: Vec<Vec3> = reader.read_positions()?.map(Vec3::from).collect();
    let mut indices: Vec<u32> = reader
        .read_indices()
        .map(|iter| iter.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());
    indices.truncate(indices.len() - indices.len() % 3);

    if indices.is_empty() || indices.iter().any(|&i| i as usize >= positions.len()) {
        return None;
    }

    let data = match reader.read_normals() {
        Some(normals) => {
            let vertices = positions
                .iter()
                .zip(normals)
                .map(|(&p, n)| Vertex::new(p, Vec3::from(n)))
                .collect::<Vec<_>>();
            if vertices.len() != positions.len() {
                return None;
            }
            MeshData::new(vertices, indices)
        }
        None => MeshData::with_computed_normals(&positions, indices),
    };
    Some(data)
}

fn convert_material(material: &gltf::Material) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, _] = pbr.base_color_factor();
    Material {
        model: ShadingModel::Standard {
            roughness: pbr.roughness_factor(),
            metalness: pbr.metallic_factor(),
        },
        color: Vec3::new(r, g, b),
        side: if material.double_sided() {
            Side::Double
        } else {
            Side::Front
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greeting_scene::NodeKind;

    const TRIANGLE_BASE64: &str = "AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIA";

    fn triangle_gltf(buffer_uri: &str) -> String {
        format!(
            r#"{{
            "asset": {{ "version": "2.0" }},
            "scene": 0,
            "scenes": [{{ "name": "Cake", "nodes": [0] }}],
            "nodes": [
                {{ "name": "root", "translation": [0, 1, 0], "children": [1] }},
                {{ "name": "slice", "mesh": 0 }}
            ],
            "meshes": [{{
                "name": "slice",
                "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "indices": 1, "material": 0 }}]
            }}],
            "materials": [{{
                "pbrMetallicRoughness": {{
                    "baseColorFactor": [1.0, 0.5, 0.25, 1.0],
                    "metallicFactor": 0.0,
                    "roughnessFactor": 0.8
                }},
                "doubleSided": true
            }}],
            "buffers": [{{ "byteLength": 42, "uri": "{buffer_uri}" }}],
            "bufferViews": [
                {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
                {{ "buffer": 0, "byteOffset": 36, "byteLength": 6 }}
            ],
            "accessors": [
                {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                   "min": [0, 0, 0], "max": [1, 1, 0] }},
                {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }}
            ]
        }}"#
        )
    }

    fn embedded() -> String {
        triangle_gltf(&format!(
            "data:application/octet-stream;base64,{TRIANGLE_BASE64}"
        ))
    }

    fn first_mesh(node: &Node) -> Option<&Node> {
        if matches!(node.kind, NodeKind::Mesh(_)) {
            return Some(node);
        }
        node.children.iter().find_map(first_mesh)
    }

    #[test]
    fn test_builds_positioned_shadow_casting_tree() {
        let job = ModelJob::new("cake/scene.gltf", ModelSettings::default());
        let root = job.build(embedded().as_bytes()).unwrap();

        assert_eq!(root.name, "Cake");
        assert_eq!(root.transform.translation, Vec3::new(-2.0, 4.47, -2.0));
        assert_eq!(root.mesh_count(), 1);
        assert_eq!(root.children[0].name, "root");
        assert_eq!(root.children[0].transform.translation, Vec3::Y);

        assert!(!root.cast_shadow);
        let node = first_mesh(&root).unwrap();
        assert!(node.cast_shadow);
        let NodeKind::Mesh(mesh) = &node.kind else {
            unreachable!();
        };
        assert_eq!(mesh.data.triangle_count(), 1);
        assert_eq!(mesh.material.color, Vec3::new(1.0, 0.5, 0.25));
        assert_eq!(mesh.material.side, Side::Double);
        assert!(matches!(
            mesh.material.model,
            ShadingModel::Standard { roughness, .. } if (roughness - 0.8).abs() < 1e-6
        ));
        for v in &mesh.data.vertices {
            assert!(Vec3::from(v.normal).abs_diff_eq(Vec3::Z, 1e-6));
        }
    }

    #[test]
    fn test_external_buffer_resolved_next_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut bin = Vec::new();
        for f in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bin.extend_from_slice(&f.to_le_bytes());
        }
        for i in [0u16, 1, 2] {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        std::fs::write(dir.path().join("scene.bin"), &bin).unwrap();
        let path = dir.path().join("scene.gltf");
        std::fs::write(&path, triangle_gltf("scene.bin")).unwrap();

        let job = ModelJob::new(&path, ModelSettings::default());
        assert_eq!(job.kind(), AssetKind::Model);
        let root = job.run(&AssetCache::default()).unwrap();
        assert_eq!(root.mesh_count(), 1);
    }

    #[test]
    fn test_scene_without_meshes_is_empty_model() {
        let json = r#"{
            "asset": { "version": "2.0" },
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "name": "empty" }]
        }"#;
        let job = ModelJob::new("empty.gltf", ModelSettings::default());
        let err = job.build(json.as_bytes()).unwrap_err();
        assert!(matches!(err, AssetLoadError::EmptyModel(_)));
    }

    #[test]
    fn test_garbage_is_gltf_error() {
        let job = ModelJob::new("cake/scene.gltf", ModelSettings::default());
        let err = job.build(b"definitely not gltf").unwrap_err();
        assert!(matches!(err, AssetLoadError::Gltf { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let job = ModelJob::new("/nonexistent/cake/scene.gltf", ModelSettings::default());
        let err = job.run(&AssetCache::default()).unwrap_err();
        assert!(matches!(err, AssetLoadError::Io { .. }));
    }
}
