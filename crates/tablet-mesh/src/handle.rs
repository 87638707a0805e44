//! The published contract read by overlay consumers (inscriptions, motifs,
//! selection outlines).

use nalgebra::{Point3, Similarity3};
use tablet_kernel::geometry::{BoundingBox, Point3d};

use crate::store::MeshKey;

/// Inset applied to surface anchors, as a fraction of the smaller mesh extent.
pub const SURFACE_MARGIN: f64 = 0.02;

/// Child coordinate frame: identity offset with the mesh's uniform scale, so
/// mesh-local hit points can be used unscaled to place children.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleFrame {
    similarity: Similarity3<f64>,
}

impl HandleFrame {
    pub fn new(scale: f64) -> Self {
        Self {
            similarity: Similarity3::from_scaling(scale),
        }
    }

    pub fn scale(&self) -> f64 {
        self.similarity.scaling()
    }

    pub fn to_world(&self, local: &Point3d) -> Point3d {
        let p = self
            .similarity
            .transform_point(&Point3::new(local.x, local.y, local.z));
        Point3d::new(p.x, p.y, p.z)
    }

    pub fn to_local(&self, world: &Point3d) -> Point3d {
        let p = self
            .similarity
            .inverse_transform_point(&Point3::new(world.x, world.y, world.z));
        Point3d::new(p.x, p.y, p.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub mesh: MeshKey,
    /// Mesh-local Z of the front face.
    pub front_z: f64,
    pub units_per_meter: f64,
    pub world_width: f64,
    pub world_height: f64,
    /// Bumped on every geometry rebuild.
    pub version: u64,
    pub frame: HandleFrame,
    pub local_bounds: BoundingBox,
}

impl Handle {
    /// Anchor on the front face for a child overlay, lifted off the surface
    /// to avoid z-fighting. `(x, y)` is clamped inside the mesh bounds.
    pub fn surface_point(&self, x: f64, y: f64, lift: f64) -> Point3d {
        let b = &self.local_bounds;
        let size = b.size();
        let margin = SURFACE_MARGIN * size.x.min(size.y).max(0.0);
        let clamp = |v: f64, lo: f64, hi: f64| {
            if lo + margin <= hi - margin {
                v.clamp(lo + margin, hi - margin)
            } else {
                (lo + hi) * 0.5
            }
        };
        let x = if x.is_finite() { x } else { b.center().x };
        let y = if y.is_finite() { y } else { b.center().y };
        Point3d::new(
            clamp(x, b.min.x, b.max.x),
            clamp(y, b.min.y, b.max.y),
            self.front_z + lift,
        )
    }

    /// World-space bounds for selection overlays.
    pub fn world_bounds(&self) -> BoundingBox {
        let min = self.frame.to_world(&self.local_bounds.min);
        let max = self.frame.to_world(&self.local_bounds.max);
        BoundingBox::from_points([&min, &max])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn handle() -> Handle {
        Handle {
            mesh: MeshKey::from(KeyData::from_ffi(1)),
            front_z: 50.0,
            units_per_meter: 100.0,
            world_width: 1.0,
            world_height: 1.0,
            version: 1,
            frame: HandleFrame::new(0.01),
            local_bounds: BoundingBox::new(
                Point3d::new(-50.0, 0.0, -50.0),
                Point3d::new(50.0, 100.0, 50.0),
            ),
        }
    }

    #[test]
    fn test_frame_round_trip() {
        let frame = HandleFrame::new(0.02);
        let p = Point3d::new(10.0, -3.0, 7.0);
        let world = frame.to_world(&p);
        assert!((world.x - 0.2).abs() < 1e-12);
        assert!(frame.to_local(&world).distance_to(&p) < 1e-9);
    }

    #[test]
    fn test_surface_point_lifted_and_clamped() {
        let h = handle();
        let p = h.surface_point(500.0, 50.0, 0.5);
        assert!((p.x - 48.0).abs() < 1e-9);
        assert!((p.y - 50.0).abs() < 1e-9);
        assert!((p.z - 50.5).abs() < 1e-12);
    }

    #[test]
    fn test_surface_point_non_finite() {
        let p = handle().surface_point(f64::NAN, 10.0, 0.0);
        assert_eq!(p.x, 0.0);
    }

    #[test]
    fn test_world_bounds_scaled() {
        let bb = handle().world_bounds();
        assert!((bb.max.x - 0.5).abs() < 1e-12);
        assert!((bb.max.y - 1.0).abs() < 1e-12);
        assert!((bb.min.z + 0.5).abs() < 1e-12);
    }
}
