use std::rc::Rc;

use super::{StubProvider, provider, strip_mesh};
use crate::bend::MeshBender;
use crate::geom::{Point3, Tolerance};
use crate::path::{CubicCurve, SampleProvider, Spline, SplineNode};

fn z_node(z: f64) -> SplineNode {
    SplineNode::new(Point3::new(0.0, 0.0, z), Point3::new(0.0, 0.0, z + 1.0))
}

#[test]
fn dropping_bender_unsubscribes() {
    let stub = StubProvider::new(10.0);
    {
        let mut bender = MeshBender::new();
        bender
            .set_curve_interval(provider(&stub))
            .expect("provider is present");
        assert_eq!(stub.listener_count(), 1);
    }
    assert_eq!(stub.listener_count(), 0);

    // Notifying afterwards reaches nobody.
    stub.set_length(12.0);
    assert_eq!(stub.calls(), 0);
}

#[test]
fn rebinding_moves_subscription() {
    let first = StubProvider::new(10.0);
    let second = StubProvider::new(20.0);
    let mut bender = MeshBender::new();

    bender
        .set_curve_interval(provider(&first))
        .expect("provider is present");
    bender
        .set_path_interval(provider(&second), 5.0, 15.0)
        .expect("start inside the provider");
    assert_eq!(first.listener_count(), 0);
    assert_eq!(second.listener_count(), 1);

    // Rebinding to the same provider keeps a single subscription.
    bender
        .set_curve_interval(provider(&second))
        .expect("provider is present");
    assert_eq!(second.listener_count(), 1);
}

#[test]
fn moving_curve_node_recomputes_without_compute_call() {
    let curve = Rc::new(CubicCurve::new(
        SplineNode::new(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 10.0 / 3.0)),
        SplineNode::new(Point3::new(0.0, 0.0, 10.0), Point3::new(0.0, 0.0, 40.0 / 3.0)),
    ));
    let mut bender = MeshBender::new();
    bender.set_source(strip_mesh());
    bender
        .set_curve_interval(Some(Rc::clone(&curve) as Rc<dyn SampleProvider>))
        .expect("provider is present");
    bender.compute();
    let before = bender.result().vertices()[9];
    assert!(Tolerance::LOOSE.approx_eq_f64(before.z, 10.0));

    let (_, end) = curve.nodes();
    curve.set_end(SplineNode {
        position: Point3::new(5.0, 0.0, 10.0),
        direction: Point3::new(5.0, 0.0, 12.0),
        ..end
    });

    let after = bender.result().vertices()[9];
    assert!(Tolerance::LOOSE.approx_eq_point3(after, Point3::new(5.0, 1.0, 10.0)));
    assert!(!bender.is_dirty());
}

#[test]
fn editing_bound_spline_recomputes() {
    let spline = Rc::new(
        Spline::new(vec![z_node(0.0), z_node(3.0), z_node(6.0), z_node(9.0)], false)
            .expect("valid spline"),
    );
    let mut bender = MeshBender::new();
    bender.set_source(strip_mesh());
    bender
        .set_path_interval(Some(Rc::clone(&spline) as Rc<dyn SampleProvider>), 1.0, 11.0)
        .expect("start inside the spline");
    bender.compute();
    let passes = |bender: &MeshBender| bender.last_diagnostics().map(|d| d.vertex_count);
    assert_eq!(passes(&bender), Some(10));

    let before = bender.result().vertices().to_vec();
    spline.add_node(z_node(12.0));
    let after = bender.result().vertices().to_vec();
    assert_ne!(before, after);
}

#[test]
fn notification_during_compute_is_skipped() {
    let stub = StubProvider::new(10.0);
    stub.notify_while_sampling(true);
    let mut bender = MeshBender::new();
    bender.set_source(strip_mesh());
    bender
        .set_curve_interval(provider(&stub))
        .expect("provider is present");

    // Each sample fires a notification while the bender is mid-pass; none re-enter.
    let diagnostics = bender.compute();
    assert!(diagnostics.bent);
    assert_eq!(stub.calls(), 5);
    // The provider reported a change mid-pass, so another pass is due.
    assert!(bender.is_dirty());
}

#[test]
fn edit_while_result_is_borrowed_is_deferred() {
    let curve = Rc::new(CubicCurve::new(
        SplineNode::new(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 10.0 / 3.0)),
        SplineNode::new(Point3::new(0.0, 0.0, 10.0), Point3::new(0.0, 0.0, 40.0 / 3.0)),
    ));
    let mut bender = MeshBender::new();
    bender.set_source(strip_mesh());
    bender
        .set_curve_interval(Some(Rc::clone(&curve) as Rc<dyn SampleProvider>))
        .expect("provider is present");
    bender.compute();
    assert!(!bender.is_dirty());

    {
        let view = bender.result();
        curve.set_end(SplineNode::new(
            Point3::new(0.0, 0.0, 20.0),
            Point3::new(0.0, 0.0, 20.0 + 10.0 / 3.0),
        ));
        assert!(Tolerance::LOOSE.approx_eq_f64(view.vertices()[9].z, 10.0));
    }

    assert!(bender.is_dirty());
    let diagnostics = bender.compute_if_needed().expect("deferred edit pending");
    assert!(diagnostics.bent);
    assert!(Tolerance::LOOSE.approx_eq_f64(bender.result().vertices()[9].z, 20.0));
    assert!(bender.compute_if_needed().is_none());
}
