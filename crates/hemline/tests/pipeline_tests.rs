//! End-to-end tests through the public API: fold generation, offsetting and
//! stitching on known inputs, and full garments written to disk.

use approx::assert_relative_eq;
use hem_mesh::{Mesh, validate_mesh};
use hemline::{
    Boundaries, FoldParameters, FoldVariant, GarmentBuilder, GarmentConfig, GarmentKind,
    HemErrorCode, HemlineError, Topology, generate, generate_stl, offset_curve, stitch,
};
use nalgebra::Point3;

// =============================================================================
// Known inputs
// =============================================================================

#[test]
fn test_single_fold_control_points() {
    let params = FoldParameters {
        min_ruffle_width: 2.0,
        max_ruffle_width: 2.0,
        min_base_width: 3.0,
        max_base_width: 3.0,
        min_height: 1.0,
        max_height: 1.0,
        num_folds: 1,
        symmetric_fold: true,
        random_seed: Some(42),
        ..FoldParameters::default()
    };

    let pattern = generate(&params, FoldVariant::Cartesian).unwrap();
    assert_eq!(
        pattern.control_points,
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(5.0, 1.0, 0.0),
            Point3::new(6.0, 0.0, 0.0),
        ]
    );
}

#[test]
fn test_straight_line_offset() {
    let line = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
    ];
    let sides = offset_curve(&line, 0.5).unwrap();

    let expected_outer = [(0.0, 0.5), (1.0, 0.5), (2.0, 0.5)];
    let expected_inner = [(0.0, -0.5), (1.0, -0.5), (2.0, -0.5)];
    for i in 0..3 {
        assert_relative_eq!(sides.outer[i].x, expected_outer[i].0, epsilon = 1e-12);
        assert_relative_eq!(sides.outer[i].y, expected_outer[i].1, epsilon = 1e-12);
        assert_relative_eq!(sides.inner[i].x, expected_inner[i].0, epsilon = 1e-12);
        assert_relative_eq!(sides.inner[i].y, expected_inner[i].1, epsilon = 1e-12);
    }
}

#[test]
fn test_open_stitch_of_four_points() {
    let line: Vec<_> = (0..4).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
    let sides = offset_curve(&line, 0.5).unwrap();
    let mesh = stitch(&Boundaries::extruded(&sides, 1.0).unwrap(), Topology::OpenStrip).unwrap();

    // 4 * 3 + 2 = 14 quads, 8 points per layer.
    assert_eq!(Topology::OpenStrip.quad_count(4), 14);
    assert_eq!(mesh.face_count(), 28);
    assert_eq!(mesh.vertex_count() / 2, 8);
}

#[test]
fn test_error_kinds() {
    let err = generate(&FoldParameters::curtain().with_num_folds(0), FoldVariant::Cartesian)
        .unwrap_err();
    assert_eq!(err.code(), HemErrorCode::InvalidParameter);

    let short = offset_curve(&[Point3::origin()], 0.5).unwrap_err();
    assert_eq!(short.code(), HemErrorCode::ShapeMismatch);

    let repeated = [Point3::origin(), Point3::origin()];
    let err = offset_curve(&repeated, 0.5).unwrap_err();
    assert!(matches!(err, HemlineError::DegenerateGeometry { index: 1 }));
}

// =============================================================================
// Garments
// =============================================================================

#[test]
fn test_every_kind_generates_closed_mesh() {
    for kind in GarmentKind::ALL {
        let result = GarmentBuilder::new(kind)
            .seed(2024)
            .sampling_step(0.005)
            .build()
            .unwrap();
        let report = result.report();

        assert!(report.is_watertight, "{}: {}", kind, report);
        assert!(report.is_manifold, "{}", kind);
        assert_eq!(report.inconsistent_winding_count, 0, "{}", kind);
        assert_eq!(
            report.euler_characteristic(),
            result.topology.euler_characteristic(),
            "{}",
            kind
        );
        assert_eq!(
            result.mesh.face_count(),
            result.topology.triangle_count(result.sample_count)
        );
    }
}

#[test]
fn test_skirt_tapers_towards_top() {
    let result = GarmentBuilder::new(GarmentKind::Skirt)
        .seed(5)
        .sampling_step(0.005)
        .height(30.0)
        .build()
        .unwrap();

    let max_radius_at = |z: f64| {
        result
            .mesh
            .positions()
            .filter(|p| (p.z - z).abs() < 1e-9)
            .map(|p| p.coords.xy().norm())
            .fold(0.0, f64::max)
    };
    assert!(max_radius_at(30.0) < max_radius_at(0.0));
}

#[test]
fn test_seed_replays_request() {
    let first = generate_stl(&GarmentConfig::new(GarmentKind::Cape).with_sampling_step(0.01)).unwrap();
    let replay = generate_stl(
        &GarmentConfig::new(GarmentKind::Cape)
            .with_sampling_step(0.01)
            .with_seed(first.seed),
    )
    .unwrap();
    assert_eq!(first.stl, replay.stl);
}

#[test]
fn test_garment_saved_and_reloaded() {
    let result = GarmentBuilder::new(GarmentKind::Curtain)
        .seed(11)
        .sampling_step(0.01)
        .build()
        .unwrap();

    let file = tempfile::Builder::new().suffix(".stl").tempfile().unwrap();
    result.mesh.save(file.path()).unwrap();

    let loaded = Mesh::load(file.path()).unwrap();
    let report = validate_mesh(&loaded);
    assert_eq!(loaded.face_count(), result.mesh.face_count());
    assert!(report.is_printable(), "{}", report);
    assert_relative_eq!(report.volume(), result.report().volume(), max_relative = 1e-4);
}

#[test]
fn test_config_file_drives_generation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tube.toml");
    std::fs::write(
        &path,
        r#"
kind = "tube"
numFolds = 12
randomSeed = 77
samplingStep = 0.01
thickness = 0.25
height = 4.0
"#,
    )
    .unwrap();

    let config = GarmentConfig::from_file(&path).unwrap();
    let export = generate_stl(&config).unwrap();
    assert_eq!(export.seed, 77);
    assert_eq!(export.kind, GarmentKind::Tube);

    let dims = export.report.dimensions().unwrap();
    assert_relative_eq!(dims.2, 4.0, epsilon = 1e-9);
}
