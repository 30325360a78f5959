//! GPU copies of the scene's triangle meshes, keyed by geometry id. The filament
//! tube is rebuilt every frame under a fresh id, so entries whose geometry left
//! the graph are pruned before each draw.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable, cast_slice};
use glam::{Vec2, Vec3};
use printfolio_scene::SceneGraph;
use printfolio_scene::geometry::TriangleMesh;
use printfolio_scene::graph::GeometryId;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(super) struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    /// Box face index, or -1 for geometry without faces.
    pub face: f32,
}

impl MeshVertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 4] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2, 3 => Float32];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

pub(super) fn mesh_vertices(mesh: &TriangleMesh) -> Vec<MeshVertex> {
    mesh.positions
        .iter()
        .enumerate()
        .map(|(index, position)| {
            let normal = mesh.normals.get(index).copied().unwrap_or(Vec3::Y);
            let uv = mesh.uvs.get(index).copied().unwrap_or(Vec2::ZERO);
            let face = match mesh.face_ids.get(index) {
                Some(&face) if face != u8::MAX => face as f32,
                _ => -1.0,
            };
            MeshVertex {
                position: position.to_array(),
                normal: normal.to_array(),
                uv: uv.to_array(),
                face,
            }
        })
        .collect()
}

pub(super) struct GpuMesh {
    pub vertex: wgpu::Buffer,
    pub index: wgpu::Buffer,
    pub index_count: u32,
}

#[derive(Default)]
pub(super) struct MeshCache {
    meshes: HashMap<GeometryId, GpuMesh>,
    uploads: u64,
}

impl MeshCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads any of `ids` that are not resident yet.
    pub fn ensure<I>(&mut self, device: &wgpu::Device, graph: &SceneGraph, ids: I)
    where
        I: IntoIterator<Item = GeometryId>,
    {
        for id in ids {
            if self.meshes.contains_key(&id) {
                continue;
            }
            let Some(mesh) = graph.geometry(id) else {
                continue;
            };
            if mesh.indices.is_empty() {
                continue;
            }
            self.meshes.insert(id, upload_mesh(device, mesh));
            self.uploads += 1;
        }
    }

    /// Drops buffers whose geometry was removed from the graph.
    pub fn prune(&mut self, graph: &SceneGraph) -> usize {
        let before = self.meshes.len();
        self.meshes.retain(|id, _| graph.contains_geometry(*id));
        before - self.meshes.len()
    }

    pub fn get(&self, id: GeometryId) -> Option<&GpuMesh> {
        self.meshes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn uploads(&self) -> u64 {
        self.uploads
    }
}

fn upload_mesh(device: &wgpu::Device, mesh: &TriangleMesh) -> GpuMesh {
    let vertices = mesh_vertices(mesh);
    let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("scene-mesh-vertex-buffer"),
        contents: cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("scene-mesh-index-buffer"),
        contents: cast_slice(&mesh.indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    GpuMesh {
        vertex,
        index,
        index_count: mesh.indices.len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printfolio_scene::geometry::Shape;

    #[test]
    fn cuboid_vertices_keep_their_face_ids() {
        let mesh = Shape::cuboid(1.0, 1.0, 1.0).tessellate();
        let vertices = mesh_vertices(&mesh);
        assert_eq!(vertices.len(), mesh.vertex_count());
        for face in 0..6 {
            assert!(vertices.iter().any(|v| v.face == face as f32));
        }
        assert!(vertices.iter().all(|v| v.face >= 0.0));
    }

    #[test]
    fn triangle_soup_has_no_face() {
        let mesh = TriangleMesh::from_triangles(
            &[Vec3::ZERO, Vec3::X, Vec3::Y],
            &[[0, 1, 2]],
        );
        let vertices = mesh_vertices(&mesh);
        assert_eq!(vertices.len(), 3);
        assert!(vertices.iter().all(|v| v.face == -1.0));
        assert_eq!(vertices[0].normal, [0.0, 0.0, 1.0]);
    }
}
