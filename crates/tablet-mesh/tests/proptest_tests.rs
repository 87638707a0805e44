//! Property-based tests for mesh-level invariants using the `proptest` crate.

use proptest::prelude::*;

use tablet_kernel::geometry::Point2d;
use tablet_kernel::{Outline, Resize};
use tablet_mesh::uv::fix_seam;
use tablet_mesh::{CAP_MATERIAL, SIDE_MATERIAL, TabletConfig, TriangleMesh, build_tablet};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_u() -> impl Strategy<Value = f64> {
    0.0f64..1.0
}

/// Rectangle extents and an optional height request in world units.
fn arb_tablet() -> impl Strategy<Value = (f64, f64, f64, Option<f64>)> {
    (
        10.0f64..400.0,
        10.0f64..400.0,
        1.0f64..200.0,
        prop::option::of(0.05f64..8.0),
    )
}

fn rectangle(w: f64, h: f64) -> Outline {
    Outline::new(vec![
        Point2d::new(0.0, 0.0),
        Point2d::new(w, 0.0),
        Point2d::new(w, h),
        Point2d::new(0.0, h),
    ])
}

fn z_dominant(n: [f32; 3]) -> bool {
    n[2].abs() > n[0].abs() && n[2].abs() > n[1].abs()
}

/// Triangle centroid and doubled area.
fn centroid_and_area(mesh: &TriangleMesh, t: usize) -> ([f32; 3], f32) {
    let [a, b, c] = [mesh.position(t * 3), mesh.position(t * 3 + 1), mesh.position(t * 3 + 2)];
    let e1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let e2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let cross = [
        e1[1] * e2[2] - e1[2] * e2[1],
        e1[2] * e2[0] - e1[0] * e2[2],
        e1[0] * e2[1] - e1[1] * e2[0],
    ];
    let area = (cross[0] * cross[0] + cross[1] * cross[1] + cross[2] * cross[2]).sqrt();
    let centroid = [0, 1, 2].map(|i| (a[i] + b[i] + c[i]) / 3.0);
    (centroid, area)
}

// ---------------------------------------------------------------------------
// 1. Seam fix brings straddling triangles within half a wrap
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn seam_fix_closes_wrap(
        high in 0.75f64..1.0,
        low in 0.0f64..0.25,
        mid in prop::sample::select(vec![0.0, 0.1, 0.9, 0.99]),
    ) {
        let u = fix_seam([high, low, mid]);
        for i in 0..3 {
            prop_assert!((u[i] - u[(i + 1) % 3]).abs() <= 0.5,
                "seam fix left {:?}", u);
        }
    }
}

// ---------------------------------------------------------------------------
// 2. Seam fix is a no-op on triangles away from the seam
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn seam_fix_idle_near_each_other(a in arb_u(), da in -0.2f64..0.2, db in -0.2f64..0.2) {
        let u = [a, (a + da).clamp(0.0, 0.999), (a + db).clamp(0.0, 0.999)];
        prop_assert_eq!(fix_seam(u), u);
    }
}

// ---------------------------------------------------------------------------
// 3. Every build yields finite buffers, one run per material and outward caps
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]
    #[test]
    fn tablet_build_invariants(
        (w, h, depth, target_height) in arb_tablet(),
        bevel in any::<bool>(),
    ) {
        let config = TabletConfig {
            depth,
            bevel,
            target_height,
            sample_count: 512,
            ..TabletConfig::default()
        };
        let build = build_tablet(&rectangle(w, h), &config);
        let mesh = &build.mesh.mesh;

        prop_assert!(mesh.positions.iter().all(|v| v.is_finite()));
        prop_assert!(mesh.uvs.iter().all(|v| v.is_finite()));
        prop_assert!(mesh.groups.len() <= 2);
        prop_assert!(mesh.triangles_of(CAP_MATERIAL).count() > 0);
        prop_assert!(mesh.triangles_of(SIDE_MATERIAL).count() > 0);
        prop_assert!((build.front_z - depth / 2.0).abs() < 1e-9);
        prop_assert!(build.local_bounds.min.y.abs() < 1e-6);

        // Clipping folds the lower bevel walls onto the base plane, inside the
        // cap tolerance, so only Z-facing cap triangles must face the cap.
        for t in mesh.triangles_of(CAP_MATERIAL) {
            let n = mesh.normal(t * 3);
            let z = mesh.position(t * 3)[2];
            if z_dominant(n) {
                prop_assert!(n[2] * z > 0.0, "cap triangle {} normal {:?} at z {}", t, n, z);
            }
        }

        // A single rectangle solid is convex, so every face points away from
        // the box center. Triangles touching the base may have been clamped.
        if !matches!(build.shape.resize, Resize::Extend { .. }) {
            let c = build.local_bounds.center();
            let center = [c.x as f32, c.y as f32, c.z as f32];
            for t in 0..mesh.triangle_count() {
                let (centroid, area) = centroid_and_area(mesh, t);
                let on_base = (t * 3..t * 3 + 3).any(|v| mesh.position(v)[1].abs() < 1e-3);
                if area < 1e-6 || on_base {
                    continue;
                }
                let n = mesh.normal(t * 3);
                let outward: f32 = (0..3).map(|i| (centroid[i] - center[i]) * n[i]).sum();
                prop_assert!(outward > 0.0, "triangle {} normal {:?} faces inward", t, n);
            }
        }
    }
}
