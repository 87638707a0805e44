use serde::{Deserialize, Serialize};
use tablet_kernel::geometry::{Point3d, Vec3};

/// Material slot of the front and back faces.
pub const CAP_MATERIAL: u32 = 0;
/// Material slot of the extruded wall.
pub const SIDE_MATERIAL: u32 = 1;

/// A contiguous run of vertices drawn with one material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialGroup {
    /// First vertex of the run.
    pub start: u32,
    /// Number of vertices (a multiple of three).
    pub count: u32,
    pub material_index: u32,
}

/// A non-indexed triangle mesh for rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    /// Vertex positions [x, y, z, x, y, z, ...]
    pub positions: Vec<f32>,
    /// Vertex normals [nx, ny, nz, ...]
    pub normals: Vec<f32>,
    /// Texture coordinates [u, v, u, v, ...]
    pub uvs: Vec<f32>,
    pub groups: Vec<MaterialGroup>,
}

impl TriangleMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }

    pub fn add_vertex(&mut self, pos: Point3d, normal: Vec3, uv: [f64; 2]) -> u32 {
        let idx = self.vertex_count() as u32;
        self.positions.extend_from_slice(&pos.to_f32_array());
        self.normals.extend_from_slice(&normal.to_f32_array());
        self.uvs.push(uv[0] as f32);
        self.uvs.push(uv[1] as f32);
        idx
    }

    pub fn position(&self, vertex: usize) -> [f32; 3] {
        let i = vertex * 3;
        [self.positions[i], self.positions[i + 1], self.positions[i + 2]]
    }

    pub fn normal(&self, vertex: usize) -> [f32; 3] {
        let i = vertex * 3;
        [self.normals[i], self.normals[i + 1], self.normals[i + 2]]
    }

    pub fn uv(&self, vertex: usize) -> [f32; 2] {
        let i = vertex * 2;
        [self.uvs[i], self.uvs[i + 1]]
    }

    /// Triangle indices belonging to `material_index`.
    pub fn triangles_of(&self, material_index: u32) -> impl Iterator<Item = usize> + '_ {
        self.groups
            .iter()
            .filter(move |g| g.material_index == material_index)
            .flat_map(|g| (g.start / 3)..((g.start + g.count) / 3))
            .map(|t| t as usize)
    }
}
