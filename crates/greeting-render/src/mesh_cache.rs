//! GPU copies of scene meshes.
//!
//! Meshes are shared through `Arc<MeshData>`, so the allocation address
//! identifies the geometry. Each entry keeps its `Arc` alive, which stops
//! the address from being reused while the entry exists.

use std::collections::HashMap;
use std::sync::Arc;

use greeting_scene::MeshData;
use wgpu::util::DeviceExt;

/// Vertex and index buffers of one mesh.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, label: &str, data: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

struct Entry {
    mesh: GpuMesh,
    _source: Arc<MeshData>,
    last_used: u64,
}

#[derive(Default)]
pub struct MeshCache {
    entries: HashMap<usize, Entry>,
}

/// Identity of a shared mesh.
pub fn mesh_key(data: &Arc<MeshData>) -> usize {
    Arc::as_ptr(data) as usize
}

impl MeshCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload `data` if it is not resident yet and mark it used in `frame`.
    /// Empty meshes are never uploaded.
    pub fn prepare(&mut self, device: &wgpu::Device, name: &str, data: &Arc<MeshData>, frame: u64) {
        if data.is_empty() {
            return;
        }
        let entry = self.entries.entry(mesh_key(data)).or_insert_with(|| {
            log::debug!(
                "Uploading mesh '{}' ({} triangles)",
                name,
                data.triangle_count()
            );
            Entry {
                mesh: GpuMesh::upload(device, name, data),
                _source: Arc::clone(data),
                last_used: frame,
            }
        });
        entry.last_used = frame;
    }

    pub fn get(&self, data: &Arc<MeshData>) -> Option<&GpuMesh> {
        self.entries.get(&mesh_key(data)).map(|entry| &entry.mesh)
    }

    /// Drop meshes not used in `frame`. Returns how many were dropped.
    pub fn evict_unused(&mut self, frame: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.last_used == frame);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
