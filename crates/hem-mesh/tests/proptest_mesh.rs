//! Property-based tests for repair invariants.
//!
//! Run with: cargo test -p hem-mesh -- proptest

use hem_mesh::{Mesh, RepairParams, Vertex, fix_winding_order, validate_mesh};
use proptest::prelude::*;

/// Closed prism over a regular `sides`-gon, consistently wound outward.
fn prism(sides: usize, radius: f64, height: f64) -> Mesh {
    let mut mesh = Mesh::new();
    let n = sides as u32;

    for z in [0.0, height] {
        for i in 0..sides {
            let angle = std::f64::consts::TAU * i as f64 / sides as f64;
            mesh.vertices.push(Vertex::from_coords(
                radius * angle.cos(),
                radius * angle.sin(),
                z,
            ));
        }
    }
    let bottom_center = mesh.vertices.len() as u32;
    mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
    mesh.vertices.push(Vertex::from_coords(0.0, 0.0, height));
    let top_center = bottom_center + 1;

    for i in 0..n {
        let j = (i + 1) % n;
        mesh.faces.push([i, j, n + j]);
        mesh.faces.push([i, n + j, n + i]);
        mesh.faces.push([bottom_center, j, i]);
        mesh.faces.push([top_center, n + i, n + j]);
    }
    mesh
}

fn arb_prism() -> impl Strategy<Value = Mesh> {
    (3usize..24, 0.5f64..50.0, 0.5f64..50.0).prop_map(|(s, r, h)| prism(s, r, h))
}

proptest! {
    #[test]
    fn proptest_prism_fixture_is_printable(mesh in arb_prism()) {
        let report = validate_mesh(&mesh);
        prop_assert!(report.is_printable());
        prop_assert_eq!(report.euler_characteristic(), 2);
    }

    #[test]
    fn proptest_fix_winding_restores_consistency(
        mesh in arb_prism(),
        flips in prop::collection::vec(any::<bool>(), 96),
    ) {
        let mut mesh = mesh;
        // Leave face 0 alone so the flood fill seed keeps the outward side.
        for (face, flip) in mesh.faces.iter_mut().zip(&flips).skip(1) {
            if *flip {
                face.swap(1, 2);
            }
        }

        fix_winding_order(&mut mesh);
        let report = validate_mesh(&mesh);
        prop_assert_eq!(report.inconsistent_winding_count, 0);
        prop_assert!(!report.is_inside_out);
    }

    #[test]
    fn proptest_repair_never_grows_vertices(mesh in arb_prism(), drop in 0usize..8) {
        let mut mesh = mesh;
        let vertices_before = mesh.vertex_count();
        let faces_before = mesh.face_count();
        let drop = drop.min(mesh.faces.len() - 1);
        mesh.faces.remove(drop);

        mesh.repair_with_config(&RepairParams::default()).unwrap();
        prop_assert!(mesh.vertex_count() <= vertices_before);
        prop_assert_eq!(mesh.face_count(), faces_before);
        prop_assert!(validate_mesh(&mesh).is_watertight);
    }
}
