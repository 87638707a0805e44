//! Feature-edge extraction for the editing outline overlay.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tablet_kernel::geometry::{Point3d, Vec3};

use crate::merge::face_normal;
use crate::mesh::TriangleMesh;

/// Edges whose adjacent faces meet at more than this angle are drawn.
pub const FEATURE_ANGLE_DEG: f64 = 15.0;

/// Vertices closer than this are treated as one when pairing edges.
const WELD_TOLERANCE: f64 = 1e-4;

/// Line segments as `[x0, y0, z0, x1, y1, z1, ...]` in mesh-local space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeOverlay {
    pub positions: Vec<f32>,
}

impl EdgeOverlay {
    pub fn segment_count(&self) -> usize {
        self.positions.len() / 6
    }

    pub fn segment(&self, i: usize) -> [[f32; 3]; 2] {
        let p = &self.positions[i * 6..i * 6 + 6];
        [[p[0], p[1], p[2]], [p[3], p[4], p[5]]]
    }
}

type VertexKey = (i64, i64, i64);

fn quantize(p: &[f32; 3]) -> VertexKey {
    let q = |v: f32| (f64::from(v) / WELD_TOLERANCE).round() as i64;
    (q(p[0]), q(p[1]), q(p[2]))
}

struct EdgeFaces {
    ends: [[f32; 3]; 2],
    normals: Vec<Vec3>,
}

fn to_point(p: [f32; 3]) -> Point3d {
    Point3d::new(f64::from(p[0]), f64::from(p[1]), f64::from(p[2]))
}

/// Boundary edges plus every edge whose two faces meet above
/// [`FEATURE_ANGLE_DEG`]. Segments come out in first-seen order.
pub fn feature_edges(mesh: &TriangleMesh) -> EdgeOverlay {
    let threshold = FEATURE_ANGLE_DEG.to_radians();
    let mut order: Vec<(VertexKey, VertexKey)> = Vec::new();
    let mut edges: HashMap<(VertexKey, VertexKey), EdgeFaces> = HashMap::new();

    for t in 0..mesh.triangle_count() {
        let corners = [mesh.position(t * 3), mesh.position(t * 3 + 1), mesh.position(t * 3 + 2)];
        let normal = face_normal(&corners.map(to_point));
        for i in 0..3 {
            let (a, b) = (corners[i], corners[(i + 1) % 3]);
            let (ka, kb) = (quantize(&a), quantize(&b));
            if ka == kb {
                continue;
            }
            let key = if ka < kb { (ka, kb) } else { (kb, ka) };
            edges
                .entry(key)
                .or_insert_with(|| {
                    order.push(key);
                    EdgeFaces {
                        ends: [a, b],
                        normals: Vec::with_capacity(2),
                    }
                })
                .normals
                .push(normal);
        }
    }

    let mut overlay = EdgeOverlay::default();
    for key in &order {
        let Some(edge) = edges.get(key) else { continue };
        let keep = match edge.normals.as_slice() {
            [_] => true,
            [n0, n1] => n0.angle_to(n1) > threshold,
            _ => true,
        };
        if keep {
            overlay.positions.extend_from_slice(&edge.ends[0]);
            overlay.positions.extend_from_slice(&edge.ends[1]);
        }
    }
    overlay
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_tri(mesh: &mut TriangleMesh, tri: [Point3d; 3]) {
        let n = face_normal(&tri);
        for p in tri {
            mesh.add_vertex(p, n, [0.0, 0.0]);
        }
    }

    #[test]
    fn test_flat_quad_keeps_only_boundary() {
        let mut mesh = TriangleMesh::new();
        let a = Point3d::new(0.0, 0.0, 0.0);
        let b = Point3d::new(1.0, 0.0, 0.0);
        let c = Point3d::new(1.0, 1.0, 0.0);
        let d = Point3d::new(0.0, 1.0, 0.0);
        push_tri(&mut mesh, [a, b, c]);
        push_tri(&mut mesh, [a, c, d]);
        let overlay = feature_edges(&mesh);
        // The shared diagonal is coplanar and dropped.
        assert_eq!(overlay.segment_count(), 4);
        assert_eq!(overlay.segment(0), [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
    }

    #[test]
    fn test_folded_quad_keeps_crease() {
        let mut mesh = TriangleMesh::new();
        let a = Point3d::new(0.0, 0.0, 0.0);
        let b = Point3d::new(1.0, 0.0, 0.0);
        let c = Point3d::new(1.0, 1.0, 0.0);
        let d = Point3d::new(0.0, 1.0, 1.0);
        push_tri(&mut mesh, [a, b, c]);
        push_tri(&mut mesh, [a, c, d]);
        assert_eq!(feature_edges(&mesh).segment_count(), 5);
    }

    #[test]
    fn test_empty_mesh() {
        assert_eq!(feature_edges(&TriangleMesh::new()).segment_count(), 0);
    }
}
