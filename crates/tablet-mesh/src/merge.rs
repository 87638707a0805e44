//! Merge solids into one triangle list and move it into the canonical frame:
//! X centered, base on `y = 0`, Y up, front face at `z = +depth / 2`.

use tablet_kernel::geometry::{BoundingBox, Point3d, Vec3};
use tablet_kernel::{NormalizedShape, Solid, SolidSet};
use tracing::{debug, instrument};

/// Mapping between raw outline space (Y down, back face at `z = 0`) and the
/// canonical mesh frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanonicalFrame {
    pub center_x: f64,
    pub bottom_y: f64,
    pub half_depth: f64,
}

impl CanonicalFrame {
    pub fn to_local(&self, p: &Point3d) -> Point3d {
        Point3d::new(p.x - self.center_x, -(p.y - self.bottom_y), p.z - self.half_depth)
    }

    pub fn to_raw(&self, p: &Point3d) -> Point3d {
        Point3d::new(p.x + self.center_x, self.bottom_y - p.y, p.z + self.half_depth)
    }
}

/// Expanded triangle list in the canonical frame with flat normals.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedGeometry {
    pub triangles: Vec<[Point3d; 3]>,
    pub normals: Vec<Vec3>,
    pub frame: CanonicalFrame,
    pub depth: f64,
}

impl MergedGeometry {
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.triangles.iter().flatten())
    }

    pub fn front_z(&self) -> f64 {
        self.depth * 0.5
    }
}

/// Concatenate solids into a single indexed solid.
pub fn merge_indexed(solids: &[Solid]) -> Solid {
    let mut merged = Solid::new();
    for solid in solids {
        let offset = merged.vertex_count() as u32;
        merged.positions.extend_from_slice(&solid.positions);
        merged
            .triangles
            .extend(solid.triangles.iter().map(|t| [t[0] + offset, t[1] + offset, t[2] + offset]));
    }
    merged
}

/// Flat normal of a triangle; collapsed triangles get `+Z`.
pub fn face_normal(tri: &[Point3d; 3]) -> Vec3 {
    (tri[1] - tri[0])
        .cross(&(tri[2] - tri[0]))
        .normalized()
        .unwrap_or(Vec3::Z)
}

#[instrument(skip_all, fields(solids = set.solids.len()))]
pub fn merge_and_normalize(set: &SolidSet, shape: &NormalizedShape) -> MergedGeometry {
    let merged = merge_indexed(&set.solids);
    let raw: Vec<[Point3d; 3]> = merged
        .triangles
        .iter()
        .map(|t| t.map(|i| merged.positions[i as usize]))
        .collect();

    let bb = BoundingBox::from_points(&merged.positions);
    let center_x = if bb.is_valid() {
        bb.center().x
    } else {
        shape.bounds.center_x()
    };
    let frame = CanonicalFrame {
        center_x,
        bottom_y: shape.bottom_target,
        half_depth: set.depth * 0.5,
    };

    // Negating Y mirrors the mesh and inverts every triangle; swapping the
    // last two corners restores outward winding.
    let triangles: Vec<[Point3d; 3]> = raw
        .iter()
        .map(|t| {
            let [a, b, c] = t.map(|p| frame.to_local(&p));
            [a, c, b]
        })
        .collect();
    let normals = triangles.iter().map(face_normal).collect();

    debug!(triangles = triangles.len(), center_x, "geometry merged");

    MergedGeometry {
        triangles,
        normals,
        frame,
        depth: set.depth,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablet_kernel::geometry::Point2d;
    use tablet_kernel::operations::extrude::extrude_ring;
    use tablet_kernel::{Diagnostics, Outline, TargetDimensions, normalize_shape};

    fn square_setup() -> (SolidSet, NormalizedShape) {
        let ring = vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(100.0, 0.0),
            Point2d::new(100.0, 100.0),
            Point2d::new(0.0, 100.0),
        ];
        let shape = normalize_shape(
            &Outline::new(ring.clone()),
            &TargetDimensions::default(),
            &mut Diagnostics::new(),
        );
        let set = SolidSet {
            solids: vec![extrude_ring(&ring, 100.0, None)],
            depth: 100.0,
        };
        (set, shape)
    }

    #[test]
    fn test_merge_indexed_offsets() {
        let (set, _) = square_setup();
        let doubled = merge_indexed(&[set.solids[0].clone(), set.solids[0].clone()]);
        assert_eq!(doubled.triangle_count(), 24);
        let max_index = doubled.triangles.iter().flatten().max().copied().unwrap();
        assert_eq!(max_index as usize, doubled.vertex_count() - 1);
    }

    #[test]
    fn test_canonical_frame_bounds() {
        let (set, shape) = square_setup();
        let geometry = merge_and_normalize(&set, &shape);
        let bb = geometry.bounding_box();
        assert!((bb.min.x + 50.0).abs() < 1e-9);
        assert!((bb.max.x - 50.0).abs() < 1e-9);
        assert!(bb.min.y.abs() < 1e-9);
        assert!((bb.max.y - 100.0).abs() < 1e-9);
        assert!((bb.min.z + 50.0).abs() < 1e-9);
        assert!((bb.max.z - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_normals_point_outward() {
        let (set, shape) = square_setup();
        let geometry = merge_and_normalize(&set, &shape);
        let center = geometry.bounding_box().center();
        for (tri, n) in geometry.triangles.iter().zip(&geometry.normals) {
            let centroid = Point3d::new(
                (tri[0].x + tri[1].x + tri[2].x) / 3.0,
                (tri[0].y + tri[1].y + tri[2].y) / 3.0,
                (tri[0].z + tri[1].z + tri[2].z) / 3.0,
            );
            assert!((centroid - center).dot(n) > 0.0);
        }
    }

    #[test]
    fn test_frame_round_trip() {
        let frame = CanonicalFrame {
            center_x: 12.0,
            bottom_y: 150.0,
            half_depth: 7.5,
        };
        let p = Point3d::new(3.0, -4.0, 1.0);
        let back = frame.to_raw(&frame.to_local(&p));
        assert!(p.distance_to(&back) < 1e-12);
    }
}
