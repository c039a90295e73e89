//! Property-based tests for the centerline stages.
//!
//! Run with: cargo test -p vessel-centerline -- proptest

use nalgebra::{Point3, Vector3};
use proptest::prelude::*;
use vessel_centerline::{CenterlineParams, accumulate, optimize_elastic_forces, track_centerline};
use vessel_mesh::{Domain, FaceIndex, Mesh};

// =============================================================================
// Strategies
// =============================================================================

/// A straight tube with random radius, length, ring count and placement,
/// together with params scaled to its radius.
fn arb_tube() -> impl Strategy<Value = (Mesh, CenterlineParams)> {
    (
        6.0..14.0f64,
        20usize..50,
        12usize..24,
        prop::array::uniform3(-20.0..20.0f64),
    )
        .prop_map(|(radius, length, segments, [dx, dy, dz])| {
            let mut mesh = Mesh::open_tube(radius, length as f64, segments, length);
            mesh.translate(Vector3::new(dx, dy, dz));
            let params = CenterlineParams::default()
                .with_acc_radius(radius + 4.0)
                .with_probe_distance(radius)
                .with_track_step(4.0);
            (mesh, params)
        })
}

fn domain_for(mesh: &Mesh, params: &CenterlineParams) -> Domain {
    Domain::from_mesh_bounds(mesh, params.domain_padding, params.max_voxels).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// The peak lies in the domain and recorded directions are unit vectors.
    #[test]
    fn accumulation_peak_and_directions((mesh, params) in arb_tube()) {
        let acc = accumulate(&mesh, domain_for(&mesh, &params), &params).unwrap();

        prop_assert!(acc.domain().contains_voxel(acc.peak()));
        prop_assert!(acc.stats.max_hits > 0);
        for (_, dir) in acc.directions.iter() {
            let n = dir.norm();
            prop_assert!(n == 0.0 || (n - 1.0).abs() < 1e-9);
        }
    }

    /// Tracking output is ordered by height and contains the seed.
    #[test]
    fn tracking_sorted_by_z((mesh, params) in arb_tube()) {
        let acc = accumulate(&mesh, domain_for(&mesh, &params), &params).unwrap();
        let seed = Domain::voxel_center(acc.peak());
        let polyline = track_centerline(&acc.hits, &acc.directions, seed, &params);

        prop_assert!(!polyline.is_empty());
        prop_assert!(polyline.windows(2).all(|w| w[0].z <= w[1].z));
        prop_assert!(polyline.contains(&seed));
    }

    /// Relaxation never adds points and keeps the survivors finite.
    #[test]
    fn relaxation_never_grows(
        (mesh, params) in arb_tube(),
        raw in prop::collection::vec(prop::array::uniform3(-40.0..80.0f64), 0..12),
    ) {
        let domain = domain_for(&mesh, &params);
        let directions = vessel_mesh::VoxelGrid::filled(domain, Vector3::z());
        let index = FaceIndex::new(&mesh);
        let polyline: Vec<Point3<f64>> = raw.iter().map(|&[x, y, z]| Point3::new(x, y, z)).collect();

        let params = params.with_max_relaxation_iterations(200);
        let result = optimize_elastic_forces(&mesh, &index, &directions, &polyline, &params);

        prop_assert!(result.points.len() <= polyline.len());
        prop_assert_eq!(result.points.len() + result.dropped, polyline.len());
        prop_assert!(result.points.iter().all(|p| p.iter().all(|c| c.is_finite())));
    }
}
