use std::rc::Rc;

use mesh_bender::bend::{FillingMode, MeshBender, SourceMesh};
use mesh_bender::geom::{Point3, Quat, Tolerance, Vec3};
use mesh_bender::path::{CubicCurve, SampleProvider, Spline, SplineNode};
use mesh_bender::{BendEngine, EngineError};

fn strip(length: f64, segments: u32) -> Rc<SourceMesh> {
    let mut positions = Vec::new();
    for i in 0..=segments {
        let x = f64::from(i) / f64::from(segments) * length;
        positions.push(Point3::new(x, -0.5, 0.0));
        positions.push(Point3::new(x, 0.5, 0.0));
    }
    let mut triangles = Vec::new();
    for i in 0..segments {
        let a = i * 2;
        triangles.extend_from_slice(&[a, a + 2, a + 1, a + 1, a + 2, a + 3]);
    }
    let normals = vec![Vec3::Z; positions.len()];
    let mesh = SourceMesh::builder(positions, triangles)
        .with_normals(normals)
        .build()
        .expect("strip mesh");
    Rc::new(mesh)
}

fn quarter_arc(radius: f64) -> Rc<CubicCurve> {
    let k = 0.5523 * radius;
    Rc::new(CubicCurve::new(
        SplineNode::new(Point3::ORIGIN, Point3::new(0.0, 0.0, k)),
        SplineNode::new(
            Point3::new(radius, 0.0, radius),
            Point3::new(radius + k, 0.0, radius),
        ),
    ))
}

#[test]
fn strip_follows_quarter_arc() {
    let curve = quarter_arc(10.0);
    let mut bender = MeshBender::new();
    bender.set_source(strip(10.0, 20));
    bender
        .set_curve_interval(Some(Rc::clone(&curve) as Rc<dyn SampleProvider>))
        .expect("curve provided");
    let diagnostics = bender.compute();
    assert!(diagnostics.bent);
    assert_eq!(diagnostics.samples_resolved, 21);

    let result = bender.result();
    let vertices = result.vertices();

    // Both ends of the strip sit on the curve's end points, offset laterally along Y.
    let start_mid = vertices[0].lerp(vertices[1], 0.5);
    let end_mid = vertices[40].lerp(vertices[41], 0.5);
    assert!(Tolerance::LOOSE.approx_eq_point3(start_mid, Point3::ORIGIN));
    assert!(Tolerance::LOOSE.approx_eq_point3(end_mid, Point3::new(10.0, 0.0, 10.0)));
    assert!(Tolerance::LOOSE.approx_eq_f64(vertices[1].y - vertices[0].y, 1.0));

    // Bending is a rigid frame per ring: normals stay unit length.
    for normal in result.normals() {
        assert!(Tolerance::LOOSE.approx_eq_f64(normal.length(), 1.0));
    }
}

#[test]
fn bender_tracks_spline_edits_and_releases_it() {
    let node = |z: f64| SplineNode::new(Point3::new(0.0, 0.0, z), Point3::new(0.0, 0.0, z + 1.0));
    let spline = Rc::new(Spline::new(vec![node(0.0), node(3.0), node(6.0)], false).expect("spline"));

    let mut bender = MeshBender::new();
    bender.set_source(strip(4.0, 4));
    bender.set_filling_mode(FillingMode::StretchToInterval);
    bender
        .set_path_interval(Some(Rc::clone(&spline) as Rc<dyn SampleProvider>), 1.0, 5.0)
        .expect("start inside spline");
    bender.compute_if_needed().expect("dirty after bind");

    let end_before = bender.result().vertices()[9];
    assert!(Tolerance::LOOSE.approx_eq_f64(end_before.z, 5.0));

    // Pulling the middle node sideways moves the bent strip without an explicit compute.
    spline
        .set_node(
            1,
            SplineNode::new(Point3::new(2.0, 0.0, 3.0), Point3::new(2.0, 0.0, 4.0)),
        )
        .expect("node exists");
    let moved = bender.result().vertices()[4];
    assert!(moved.x.abs() > 0.1, "{moved:?}");
    assert!(bender.compute_if_needed().is_none());

    assert_eq!(spline.listener_count(), 1);
    drop(bender);
    assert_eq!(spline.listener_count(), 0);
}

#[test]
fn rotated_pre_transform_swaps_bend_axis() {
    // A strip laid along Y, rotated onto X before bending, follows a straight curve.
    let positions = vec![
        Point3::new(-0.5, 0.0, 0.0),
        Point3::new(0.5, 0.0, 0.0),
        Point3::new(-0.5, 6.0, 0.0),
        Point3::new(0.5, 6.0, 0.0),
    ];
    let mesh = Rc::new(SourceMesh::new(positions, vec![0, 2, 1, 1, 2, 3]).expect("quad"));
    let curve = Rc::new(CubicCurve::new(
        SplineNode::new(Point3::ORIGIN, Point3::new(0.0, 0.0, 2.0)),
        SplineNode::new(Point3::new(0.0, 0.0, 6.0), Point3::new(0.0, 0.0, 8.0)),
    ));

    let mut bender = MeshBender::new();
    bender.set_source(mesh);
    bender.set_rotation(Quat::from_axis_angle_degrees(Vec3::Z, -90.0));
    bender
        .set_curve_interval(Some(curve as Rc<dyn SampleProvider>))
        .expect("curve provided");
    bender.compute();

    // Rates use the raw X extent (1), so the rotated far end gets a rate above 1 and clamps to
    // the curve end. Every vertex still lands on the curve.
    for vertex in bender.result().vertices() {
        assert!(vertex.z >= -1e-9 && vertex.z <= 6.0 + 1e-9, "{vertex:?}");
    }
}

#[test]
fn engine_round_trip() {
    let mut engine = BendEngine::new();
    engine
        .try_load_source(
            &[0.0, -1.0, 0.0, 4.0, -1.0, 0.0, 4.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            vec![0, 1, 2, 0, 2, 3],
        )
        .expect("valid quad");
    engine
        .try_set_nodes(vec![
            SplineNode::new(Point3::ORIGIN, Point3::new(0.0, 0.0, 2.0)),
            SplineNode::new(Point3::new(0.0, 0.0, 6.0), Point3::new(0.0, 0.0, 8.0)),
            SplineNode::new(Point3::new(0.0, 0.0, 12.0), Point3::new(0.0, 0.0, 14.0)),
        ])
        .expect("valid nodes");

    assert!(matches!(
        engine.try_set_nodes(Vec::new()),
        Err(EngineError::Curve(_))
    ));

    engine.try_set_loop(false).expect("spline present");
    assert!(engine.mesh_export().is_err());

    let spline = Rc::clone(engine.spline().expect("nodes set"));
    engine
        .try_bind_path(10.0, 14.0)
        .expect("start inside spline");
    engine.try_evaluate().expect("ready").expect("dirty");

    let export = engine.mesh_export().expect("evaluated");
    assert_eq!(export.vertices.len(), 4);
    // Start at 10, extent 4: the far end wraps to distance 2.
    assert!((export.vertices[1][2] - 2.0).abs() < 1e-6);
    assert!((export.vertices[0][2] - 10.0).abs() < 1e-6);
    assert_eq!(spline.listener_count(), 1);
}
