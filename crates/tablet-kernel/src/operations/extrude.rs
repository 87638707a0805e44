//! Solid builder: extrude the outline (and the preserve-top band) into
//! indexed triangle solids in raw outline space.
//!
//! Solids span `z = 0` (back) to `z = depth` (front). Triangles wind so that
//! their normals point out of the solid in this right-handed raw frame.

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::normalize::{NormalizedShape, Resize, TargetDimensions};
use super::sample::ResizedOutline;
use super::{Diagnostics, Fallback};
use crate::geometry::point::{Point2d, Point3d};
use crate::outline::{Outline, signed_area};
use crate::{EPS, Tolerance};

/// Rounded edge profile. Sizes are in outline units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BevelOptions {
    pub segments: u32,
    /// Inset of the cap polygon from the wall.
    pub size: f64,
    /// Depth consumed by the rounded edge on each side.
    pub thickness: f64,
}

impl Default for BevelOptions {
    fn default() -> Self {
        Self {
            segments: 2,
            size: 0.8,
            thickness: 0.8,
        }
    }
}

/// An indexed triangle solid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Solid {
    pub positions: Vec<Point3d>,
    pub triangles: Vec<[u32; 3]>,
}

impl Solid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn add_vertex(&mut self, p: Point3d) -> u32 {
        let idx = self.positions.len() as u32;
        self.positions.push(p);
        idx
    }

    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.triangles.push([i0, i1, i2]);
    }

    /// Pull every vertex below `max_y` up onto it and drop the triangles that
    /// collapse to zero area.
    pub fn clamp_y(&mut self, max_y: f64) {
        for p in &mut self.positions {
            p.y = p.y.min(max_y);
        }
        let positions = &self.positions;
        self.triangles.retain(|t| {
            let a = positions[t[0] as usize];
            let b = positions[t[1] as usize];
            let c = positions[t[2] as usize];
            (b - a).cross(&(c - a)).length_squared() > EPS * EPS
        });
    }
}

/// All solids of one tablet, ready for merging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolidSet {
    pub solids: Vec<Solid>,
    /// Extrusion depth actually used (outline units, positive).
    pub depth: f64,
}

impl SolidSet {
    pub fn triangle_count(&self) -> usize {
        self.solids.iter().map(Solid::triangle_count).sum()
    }
}

/// One cross-section of the wall: the ring inset by `inset` at height `z`.
#[derive(Debug, Clone, Copy)]
struct Section {
    inset: f64,
    z: f64,
}

fn sections(depth: f64, bevel: Option<(f64, f64, u32)>) -> Vec<Section> {
    let Some((size, thickness, segments)) = bevel else {
        return vec![Section { inset: 0.0, z: 0.0 }, Section { inset: 0.0, z: depth }];
    };
    let arc = |k: u32| {
        let theta = k as f64 / segments as f64 * FRAC_PI_2;
        (size * (1.0 - theta.sin()), thickness * (1.0 - theta.cos()))
    };
    let mut out = Vec::with_capacity(2 * segments as usize + 2);
    for k in 0..=segments {
        let (inset, dz) = arc(k);
        out.push(Section { inset, z: dz });
    }
    for k in (0..=segments).rev() {
        let (inset, dz) = arc(k);
        // Thickness at half the depth makes the two middle sections coincide.
        if out.last().is_some_and(|s: &Section| s.z >= depth - dz) {
            continue;
        }
        out.push(Section {
            inset,
            z: depth - dz,
        });
    }
    out
}

/// Move each vertex of a counter-clockwise ring inward by `distance` along
/// its mitred normal. Miters are limited to twice the distance.
fn inset_ring(ring: &[Point2d], distance: f64) -> Vec<Point2d> {
    if distance <= 0.0 {
        return ring.to_vec();
    }
    let n = ring.len();
    let edge_normal = |i: usize| {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let (ex, ey) = (b.x - a.x, b.y - a.y);
        let len = (ex * ex + ey * ey).sqrt();
        if len < EPS { (0.0, 0.0) } else { (ey / len, -ex / len) }
    };
    (0..n)
        .map(|i| {
            let n1 = edge_normal((i + n - 1) % n);
            let n2 = edge_normal(i);
            let (mut mx, mut my) = (n1.0 + n2.0, n1.1 + n2.1);
            let mut len = (mx * mx + my * my).sqrt();
            if len < EPS {
                (mx, my) = n2;
                len = 1.0;
            }
            let (mx, my) = (mx / len, my / len);
            let denom = (mx * n2.0 + my * n2.1).max(0.5);
            let d = distance / denom;
            Point2d::new(ring[i].x - mx * d, ring[i].y - my * d)
        })
        .collect()
}

/// Triangulate a simple ring, falling back to a fan when ear clipping fails.
/// Triangles come back counter-clockwise.
fn triangulate(ring: &[Point2d]) -> Vec<[usize; 3]> {
    let coords: Vec<f64> = ring.iter().flat_map(|p| [p.x, p.y]).collect();
    let flat = earcutr::earcut(&coords, &[], 2).unwrap_or_default();
    let mut tris: Vec<[usize; 3]> = if flat.len() >= 3 {
        flat.chunks_exact(3).map(|t| [t[0], t[1], t[2]]).collect()
    } else {
        (1..ring.len().saturating_sub(1)).map(|i| [0, i, i + 1]).collect()
    };
    for t in &mut tris {
        if signed_area(&[ring[t[0]], ring[t[1]], ring[t[2]]]) < 0.0 {
            t.swap(1, 2);
        }
    }
    tris
}

/// Extrude a closed ring from `z = 0` to `z = depth`.
pub fn extrude_ring(points: &[Point2d], depth: f64, bevel: Option<&BevelOptions>) -> Solid {
    let mut ring = points.to_vec();
    if signed_area(&ring) < 0.0 {
        ring.reverse();
    }
    let mut solid = Solid::new();
    let n = ring.len();
    if n < 3 {
        return solid;
    }

    let bevel = bevel.and_then(|opts| {
        let (min_x, max_x, min_y, max_y) = ring.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
            |(x0, x1, y0, y1), p| (x0.min(p.x), x1.max(p.x), y0.min(p.y), y1.max(p.y)),
        );
        let size = opts.size.min(0.25 * (max_x - min_x).min(max_y - min_y));
        let thickness = opts.thickness.min(depth * 0.5);
        (size > EPS && thickness > EPS).then_some((size, thickness, opts.segments.max(1)))
    });
    let profile = sections(depth, bevel);

    // Caps use the innermost ring so they meet the first and last sections.
    let cap_ring = inset_ring(&ring, profile[0].inset);
    let cap_tris = triangulate(&cap_ring);
    let back_z = profile[0].z;
    let front_z = profile[profile.len() - 1].z;

    let back: Vec<u32> = cap_ring
        .iter()
        .map(|p| solid.add_vertex(Point3d::from_2d(*p, back_z)))
        .collect();
    for t in &cap_tris {
        solid.add_triangle(back[t[0]], back[t[2]], back[t[1]]);
    }
    let front: Vec<u32> = cap_ring
        .iter()
        .map(|p| solid.add_vertex(Point3d::from_2d(*p, front_z)))
        .collect();
    for t in &cap_tris {
        solid.add_triangle(front[t[0]], front[t[1]], front[t[2]]);
    }

    let rings: Vec<Vec<u32>> = profile
        .iter()
        .map(|s| {
            inset_ring(&ring, s.inset)
                .into_iter()
                .map(|p| solid.add_vertex(Point3d::from_2d(p, s.z)))
                .collect()
        })
        .collect();
    for pair in rings.windows(2) {
        let (lower, upper) = (&pair[0], &pair[1]);
        for i in 0..n {
            let j = (i + 1) % n;
            solid.add_triangle(lower[i], lower[j], upper[j]);
            solid.add_triangle(lower[i], upper[j], upper[i]);
        }
    }

    solid
}

fn rectangle(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2d> {
    vec![
        Point2d::new(x0, y0),
        Point2d::new(x1, y0),
        Point2d::new(x1, y1),
        Point2d::new(x0, y1),
    ]
}

/// Build the core solid and, when extending, the band solid below it.
#[instrument(skip_all, fields(resize = ?shape.resize))]
pub fn build_solids(
    outline: &Outline,
    resized: &ResizedOutline,
    shape: &NormalizedShape,
    dims: &TargetDimensions,
    diagnostics: &mut Diagnostics,
) -> SolidSet {
    let tol = Tolerance::default();
    let depth = tol.floor(dims.depth.abs());
    let bevel = dims.bevel.then_some(&dims.bevel_options);
    let b = shape.bounds;

    let core_ring: Vec<Point2d> = if outline.len() >= 3 && outline.signed_area().abs() > EPS {
        outline.points().to_vec()
    } else {
        warn!(points = outline.len(), "outline has no area, extruding its bounds");
        if !diagnostics.contains(|f| matches!(f, Fallback::DegenerateShape { .. })) {
            diagnostics.push(Fallback::DegenerateShape {
                width: b.max_x - b.min_x,
                height: b.max_y - b.min_y,
            });
        }
        rectangle(b.min_x, b.min_y, b.min_x + b.dx, b.min_y + b.dy)
    };

    let mut core = extrude_ring(&core_ring, depth, bevel);
    let mut solids = Vec::with_capacity(2);
    match shape.resize {
        Resize::Clip => {
            core.clamp_y(shape.bottom_target);
            solids.push(core);
        }
        Resize::Extend { .. } => {
            solids.push(core);
            let (x0, x1) = resized.band.unwrap_or((b.min_x, b.max_x));
            let band = rectangle(x0, b.max_y - tol.band_overlap, x1, shape.bottom_target);
            solids.push(extrude_ring(&band, depth, bevel));
        }
        Resize::Unchanged => solids.push(core),
    }

    let set = SolidSet { solids, depth };
    debug!(
        solids = set.solids.len(),
        triangles = set.triangle_count(),
        depth,
        "solids built"
    );
    set
}
