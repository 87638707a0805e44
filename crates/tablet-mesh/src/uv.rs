//! Texture coordinates.
//!
//! Caps get a single box projection across the mesh bounds. Side walls are
//! unwrapped along the outline: `u` is the fraction of the perimeter at which
//! a vertex sits on the sampled outline and `v` is its fraction of the depth.

use std::collections::HashMap;

use tablet_kernel::geometry::BoundingBox;
use tablet_kernel::operations::sample::PerimeterHit;
use tablet_kernel::{Diagnostics, Fallback, SampledOutline};
use tracing::{instrument, warn};

use crate::classify::{ClassifiedGeometry, FaceClass};

pub type TriangleUv = [[f64; 2]; 3];

/// Unwrap `u` values of a triangle that straddles the perimeter seam so that
/// interpolation runs the short way round.
pub fn fix_seam(mut u: [f64; 3]) -> [f64; 3] {
    let straddles = (0..3).any(|i| (u[i] - u[(i + 1) % 3]).abs() > 0.5);
    if straddles {
        for value in &mut u {
            if *value < 0.5 {
                *value += 1.0;
            }
        }
    }
    u
}

fn unit(value: f64, min: f64, extent: f64) -> f64 {
    if extent > 0.0 { (value - min) / extent } else { 0.0 }
}

/// Box projection of `(x, y)` into `[0, 1]` over `bounds`.
pub fn cap_uv(x: f64, y: f64, bounds: &BoundingBox) -> [f64; 2] {
    let size = bounds.size();
    [unit(x, bounds.min.x, size.x), unit(y, bounds.min.y, size.y)]
}

/// Per-triangle UVs in the order of `classified.geometry.triangles`.
#[instrument(skip_all, fields(triangles = classified.classes.len()))]
pub fn map_uvs(
    classified: &ClassifiedGeometry,
    sampled: &SampledOutline,
    diagnostics: &mut Diagnostics,
) -> Vec<TriangleUv> {
    let geometry = &classified.geometry;
    let bounds = geometry.bounding_box();
    let half_depth = geometry.depth * 0.5;
    let mut cache: HashMap<(u64, u64), PerimeterHit> = HashMap::new();
    let mut failures = 0usize;

    let uvs = geometry
        .triangles
        .iter()
        .zip(&classified.classes)
        .map(|(tri, class)| match class {
            FaceClass::Cap => tri.map(|p| cap_uv(p.x, p.y, &bounds)),
            FaceClass::Side => {
                let u = tri.map(|p| {
                    let raw = geometry.frame.to_raw(&p).xy();
                    let hit = *cache
                        .entry((raw.x.to_bits(), raw.y.to_bits()))
                        .or_insert_with(|| {
                            let hit = sampled.projected_perimeter(&raw);
                            if hit.zero_length {
                                failures += 1;
                            }
                            hit
                        });
                    hit.fraction
                });
                let u = fix_seam(u);
                let v = tri.map(|p| unit(p.z, -half_depth, geometry.depth).clamp(0.0, 1.0));
                [[u[0], v[0]], [u[1], v[1]], [u[2], v[2]]]
            }
        })
        .collect();

    if failures > 0 {
        warn!(failures, "perimeter projection hit zero-length segments");
        diagnostics.push(Fallback::ProjectionFailure { count: failures });
    }
    uvs
}
