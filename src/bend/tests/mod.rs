use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::bend::SourceMesh;
use crate::geom::{Point3, Quat, Vec3};
use crate::path::{ChangeListener, ChangeListeners, FrameSample, ListenerId, SampleProvider};

mod test_lifecycle;

/// Straight provider along +Z that records every distance it is sampled at.
pub(super) struct StubProvider {
    length: Cell<f64>,
    distances: RefCell<Vec<f64>>,
    notify_on_sample: Cell<bool>,
    listeners: ChangeListeners,
}

impl StubProvider {
    pub(super) fn new(length: f64) -> Rc<Self> {
        Rc::new(Self {
            length: Cell::new(length),
            distances: RefCell::new(Vec::new()),
            notify_on_sample: Cell::new(false),
            listeners: ChangeListeners::new(),
        })
    }

    pub(super) fn set_length(&self, length: f64) {
        self.length.set(length);
        self.listeners.notify();
    }

    /// Fire a change notification from inside `sample_at`.
    pub(super) fn notify_while_sampling(&self, enabled: bool) {
        self.notify_on_sample.set(enabled);
    }

    pub(super) fn calls(&self) -> usize {
        self.distances.borrow().len()
    }

    pub(super) fn distances(&self) -> Vec<f64> {
        self.distances.borrow().clone()
    }

    pub(super) fn clear(&self) {
        self.distances.borrow_mut().clear();
    }
}

impl SampleProvider for StubProvider {
    fn length(&self) -> f64 {
        self.length.get()
    }

    fn sample_at(&self, distance: f64) -> FrameSample {
        self.distances.borrow_mut().push(distance);
        if self.notify_on_sample.get() {
            self.listeners.notify();
        }
        FrameSample::new(
            Point3::new(0.0, 0.0, distance),
            Quat::IDENTITY,
            [1.0, 1.0],
            0.0,
        )
        .at_distance(distance)
    }

    fn subscribe(&self, listener: ChangeListener) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

pub(super) fn provider(stub: &Rc<StubProvider>) -> Option<Rc<dyn SampleProvider>> {
    Some(Rc::clone(stub) as Rc<dyn SampleProvider>)
}

/// Flat strip in the XY plane: X in [0, 10] at 2.5 steps, Y in {-1, 1}.
pub(super) fn strip_mesh() -> Rc<SourceMesh> {
    let mut positions = Vec::new();
    for column in 0..5 {
        let x = f64::from(column) * 2.5;
        positions.push(Point3::new(x, -1.0, 0.0));
        positions.push(Point3::new(x, 1.0, 0.0));
    }
    let mut triangles = Vec::new();
    for column in 0..4u32 {
        let base = column * 2;
        triangles.extend_from_slice(&[base, base + 2, base + 1, base + 1, base + 2, base + 3]);
    }
    let normals = vec![Vec3::Z; positions.len()];
    let mesh = SourceMesh::builder(positions, triangles)
        .with_normals(normals)
        .build()
        .expect("strip mesh is valid");
    Rc::new(mesh)
}
