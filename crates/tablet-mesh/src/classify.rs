//! Split triangles into cap (front/back) and side groups.

use tablet_kernel::geometry::Point3d;
use tracing::debug;

use crate::merge::MergedGeometry;
use crate::mesh::{CAP_MATERIAL, MaterialGroup, SIDE_MATERIAL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceClass {
    Cap,
    Side,
}

impl FaceClass {
    pub fn material_index(self) -> u32 {
        match self {
            Self::Cap => CAP_MATERIAL,
            Self::Side => SIDE_MATERIAL,
        }
    }
}

/// Distance from the cap planes within which a vertex counts as on the cap.
pub fn cap_tolerance(depth: f64) -> f64 {
    (depth.abs() * 0.01).max(0.25)
}

pub fn classify_triangle(tri: &[Point3d; 3], front_z: f64, tol: f64) -> FaceClass {
    let on = |plane: f64| tri.iter().all(|p| (p.z - plane).abs() <= tol);
    if on(front_z) || on(-front_z) {
        FaceClass::Cap
    } else {
        FaceClass::Side
    }
}

/// Build `(start, count, material)` runs over a class stream, flushing a
/// run whenever the class changes. Counts are in vertices.
pub fn build_groups(classes: &[FaceClass]) -> Vec<MaterialGroup> {
    let mut groups = Vec::new();
    let mut current: Option<(FaceClass, usize)> = None;
    for (i, &class) in classes.iter().enumerate() {
        match current {
            Some((c, _)) if c == class => {}
            Some((c, start)) => {
                groups.push(group(c, start, i));
                current = Some((class, i));
            }
            None => current = Some((class, i)),
        }
    }
    if let Some((c, start)) = current {
        groups.push(group(c, start, classes.len()));
    }
    groups
}

fn group(class: FaceClass, start: usize, end: usize) -> MaterialGroup {
    MaterialGroup {
        start: (start * 3) as u32,
        count: ((end - start) * 3) as u32,
        material_index: class.material_index(),
    }
}

/// Merged geometry reordered caps-first, with its per-triangle classes and
/// material runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedGeometry {
    pub geometry: MergedGeometry,
    pub classes: Vec<FaceClass>,
    pub groups: Vec<MaterialGroup>,
}

/// Classify every triangle and stably partition caps ahead of sides so each
/// material gets exactly one run.
pub fn classify_faces(geometry: MergedGeometry) -> ClassifiedGeometry {
    let front_z = geometry.front_z();
    let tol = cap_tolerance(geometry.depth);
    let raw: Vec<FaceClass> = geometry
        .triangles
        .iter()
        .map(|t| classify_triangle(t, front_z, tol))
        .collect();

    let order: Vec<usize> = (0..raw.len())
        .filter(|&i| raw[i] == FaceClass::Cap)
        .chain((0..raw.len()).filter(|&i| raw[i] == FaceClass::Side))
        .collect();

    let MergedGeometry {
        triangles,
        normals,
        frame,
        depth,
    } = geometry;
    let geometry = MergedGeometry {
        triangles: order.iter().map(|&i| triangles[i]).collect(),
        normals: order.iter().map(|&i| normals[i]).collect(),
        frame,
        depth,
    };
    let classes: Vec<FaceClass> = order.iter().map(|&i| raw[i]).collect();
    let groups = build_groups(&classes);

    debug!(
        caps = classes.iter().filter(|c| **c == FaceClass::Cap).count(),
        sides = classes.iter().filter(|c| **c == FaceClass::Side).count(),
        tol,
        "faces classified"
    );

    ClassifiedGeometry {
        geometry,
        classes,
        groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_floor() {
        assert_eq!(cap_tolerance(5.0), 0.25);
        assert!((cap_tolerance(-100.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_classify_triangle() {
        let cap = [
            Point3d::new(0.0, 0.0, 50.0),
            Point3d::new(1.0, 0.0, 49.9),
            Point3d::new(0.0, 1.0, 50.0),
        ];
        let side = [
            Point3d::new(0.0, 0.0, 50.0),
            Point3d::new(1.0, 0.0, -50.0),
            Point3d::new(0.0, 1.0, 50.0),
        ];
        assert_eq!(classify_triangle(&cap, 50.0, 1.0), FaceClass::Cap);
        assert_eq!(classify_triangle(&side, 50.0, 1.0), FaceClass::Side);
    }

    #[test]
    fn test_build_groups_flushes_on_change() {
        use FaceClass::*;
        let groups = build_groups(&[Cap, Cap, Side, Side, Side, Cap]);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0], MaterialGroup { start: 0, count: 6, material_index: 0 });
        assert_eq!(groups[1], MaterialGroup { start: 6, count: 9, material_index: 1 });
        assert_eq!(groups[2], MaterialGroup { start: 15, count: 3, material_index: 0 });
    }

    #[test]
    fn test_build_groups_empty() {
        assert!(build_groups(&[]).is_empty());
    }
}
