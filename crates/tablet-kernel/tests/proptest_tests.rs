//! Property-based tests for outline pipeline invariants using the `proptest` crate.

use proptest::prelude::*;

use tablet_kernel::geometry::Point2d;
use tablet_kernel::operations::extrude::extrude_ring;
use tablet_kernel::{
    Diagnostics, Outline, Resize, SampledOutline, TargetDimensions, normalize_shape,
};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

/// Regular polygon parameters: side count, radius, center, phase.
fn arb_polygon() -> impl Strategy<Value = (usize, f64, f64, f64, f64)> {
    (3usize..40, 1.0f64..500.0, -1000.0f64..1000.0, -1000.0f64..1000.0, 0.0f64..1.0)
}

fn polygon(sides: usize, radius: f64, cx: f64, cy: f64, phase: f64) -> Vec<Point2d> {
    (0..sides)
        .map(|i| {
            let a = std::f64::consts::TAU * (i as f64 + phase) / sides as f64;
            Point2d::new(cx + radius * a.cos(), cy + radius * a.sin())
        })
        .collect()
}

fn arb_rect() -> impl Strategy<Value = (f64, f64)> {
    (1.0f64..1000.0, 1.0f64..1000.0)
}

const TOL: f64 = 1e-6;

// ---------------------------------------------------------------------------
// 1. Sample points project back onto their own perimeter fraction
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn sample_projection_round_trip(
        (sides, radius, cx, cy, phase) in arb_polygon(),
        pick in 0usize..256,
    ) {
        let outline = Outline::new(polygon(sides, radius, cx, cy, phase));
        let sampled = SampledOutline::resample(&outline, 256);
        let i = pick % sampled.len();
        let hit = sampled.projected_perimeter(&sampled.points()[i]);
        let expected = sampled.fraction_at(i);
        let diff = (hit.fraction - expected).abs();
        // Sample 0 may come back as a hair under 1.0.
        prop_assert!(diff < TOL || (1.0 - diff) < TOL,
            "sample {} projected to {} instead of {}", i, hit.fraction, expected);
        prop_assert!(!hit.zero_length);
    }
}

// ---------------------------------------------------------------------------
// 2. Cumulative length is monotonic and the fraction stays in [0, 1)
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn cumulative_length_monotonic(
        (sides, radius, cx, cy, phase) in arb_polygon(),
        (qx, qy) in (-2000.0f64..2000.0, -2000.0f64..2000.0),
    ) {
        let outline = Outline::new(polygon(sides, radius, cx, cy, phase));
        let sampled = SampledOutline::resample(&outline, 512);
        for w in sampled.cumulative().windows(2) {
            prop_assert!(w[1] >= w[0]);
        }
        prop_assert!(sampled.total_length() >= *sampled.cumulative().last().unwrap());
        let hit = sampled.projected_perimeter(&Point2d::new(qx, qy));
        prop_assert!((0.0..1.0).contains(&hit.fraction));
    }
}

// ---------------------------------------------------------------------------
// 3. Requested width is honored exactly
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn world_width_matches_target(
        (w, h) in arb_rect(),
        target in 0.01f64..100.0,
        scale in 0.001f64..1.0,
    ) {
        let outline = Outline::new(vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(w, 0.0),
            Point2d::new(w, h),
            Point2d::new(0.0, h),
        ]);
        let dims = TargetDimensions {
            target_width: Some(target),
            scale,
            ..TargetDimensions::default()
        };
        let shape = normalize_shape(&outline, &dims, &mut Diagnostics::new());
        prop_assert!((shape.world_width() - target).abs() < TOL * target.max(1.0));
        prop_assert_eq!(shape.resize, Resize::Unchanged);
    }
}

// ---------------------------------------------------------------------------
// 4. Extruded solids enclose positive volume (outward winding)
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn extrusion_winds_outward(
        (sides, radius, _, _, phase) in arb_polygon(),
        depth in 0.5f64..200.0,
        reversed in any::<bool>(),
    ) {
        // Centered so the divergence sum does not lose precision.
        let mut ring = polygon(sides, radius, 0.0, 0.0, phase);
        if reversed {
            ring.reverse();
        }
        let solid = extrude_ring(&ring, depth, None);
        let volume: f64 = solid
            .triangles
            .iter()
            .map(|t| {
                let a = solid.positions[t[0] as usize].to_vec3();
                let b = solid.positions[t[1] as usize].to_vec3();
                let c = solid.positions[t[2] as usize].to_vec3();
                a.dot(&b.cross(&c)) / 6.0
            })
            .sum();
        let area = Outline::new(ring).signed_area().abs();
        prop_assert!((volume - area * depth).abs() < 1e-6 * area * depth,
            "volume {} vs expected {}", volume, area * depth);
    }
}

// ---------------------------------------------------------------------------
// 5. Degenerate outlines never produce non-finite scales
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn degenerate_outline_finite(
        x in -100.0f64..100.0,
        y in -100.0f64..100.0,
        target in prop::option::of(-10.0f64..10.0),
    ) {
        let outline = Outline::new(vec![Point2d::new(x, y), Point2d::new(x, y)]);
        let dims = TargetDimensions {
            target_width: target,
            ..TargetDimensions::default()
        };
        let mut diagnostics = Diagnostics::new();
        let shape = normalize_shape(&outline, &dims, &mut diagnostics);
        prop_assert!(shape.units_per_meter().is_finite());
        prop_assert!(shape.world_width().is_finite());
        prop_assert!(!diagnostics.is_clean());
    }
}
