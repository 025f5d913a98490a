//! Single cubic segment between two spline nodes.

use std::cell::RefCell;

use crate::geom::{ArcLengthTable, CubicBezier3, Curve3, Quat, Vec3};

use super::node::SplineNode;
use super::sample::{ChangeListener, ChangeListeners, FrameSample, ListenerId, SampleProvider};

/// Number of chord steps used for the arc-length table.
pub const ARC_LENGTH_STEPS: usize = 30;

/// Immutable geometry of one segment; rebuilt whenever a node changes.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CurveSegment {
    n1: SplineNode,
    n2: SplineNode,
    bezier: CubicBezier3,
    table: ArcLengthTable,
}

impl CurveSegment {
    pub(crate) fn new(n1: SplineNode, n2: SplineNode) -> Self {
        let bezier = CubicBezier3::new(n1.position, n1.direction, n2.inverse_direction(), n2.position);
        let table = ArcLengthTable::build(&bezier, ARC_LENGTH_STEPS);
        Self {
            n1,
            n2,
            bezier,
            table,
        }
    }

    pub(crate) fn nodes(&self) -> (SplineNode, SplineNode) {
        (self.n1, self.n2)
    }

    pub(crate) fn length(&self) -> f64 {
        self.table.total_length()
    }

    /// Sample at a local distance, clamped into the segment.
    pub(crate) fn sample_at(&self, distance: f64) -> FrameSample {
        let distance = if distance.is_nan() {
            0.0
        } else {
            distance.clamp(0.0, self.length())
        };
        let t = self.table.parameter_at(distance);

        let location = self.bezier.point_at(t);
        let tangent = self
            .bezier
            .tangent_at(t)
            .or_else(|| self.bezier.p3.sub_point(self.bezier.p0).normalized())
            .unwrap_or(Vec3::Z);
        let up = self.n1.up.lerp(self.n2.up, t);
        let orientation = Quat::look_rotation(tangent, up).unwrap_or(Quat::IDENTITY);

        let scale = [
            lerp(self.n1.scale[0], self.n2.scale[0], t),
            lerp(self.n1.scale[1], self.n2.scale[1], t),
        ];
        let roll = lerp(self.n1.roll, self.n2.roll, t);

        FrameSample::new(location, orientation, scale, roll).at_distance(distance)
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Editable cubic curve between two nodes.
///
/// Node edits rebuild the arc-length table and then notify subscribers, so a bender bound to
/// this curve recomputes immediately.
#[derive(Debug)]
pub struct CubicCurve {
    segment: RefCell<CurveSegment>,
    listeners: ChangeListeners,
}

impl CubicCurve {
    #[must_use]
    pub fn new(n1: SplineNode, n2: SplineNode) -> Self {
        Self {
            segment: RefCell::new(CurveSegment::new(n1, n2)),
            listeners: ChangeListeners::new(),
        }
    }

    #[must_use]
    pub fn nodes(&self) -> (SplineNode, SplineNode) {
        self.segment.borrow().nodes()
    }

    pub fn set_nodes(&self, n1: SplineNode, n2: SplineNode) {
        if self.nodes() == (n1, n2) {
            return;
        }
        *self.segment.borrow_mut() = CurveSegment::new(n1, n2);
        log::debug!("curve nodes changed, length {:.4}", self.length());
        self.listeners.notify();
    }

    pub fn set_start(&self, node: SplineNode) {
        let (_, n2) = self.nodes();
        self.set_nodes(node, n2);
    }

    pub fn set_end(&self, node: SplineNode) {
        let (n1, _) = self.nodes();
        self.set_nodes(n1, node);
    }
}

impl SampleProvider for CubicCurve {
    fn length(&self) -> f64 {
        self.segment.borrow().length()
    }

    fn sample_at(&self, distance: f64) -> FrameSample {
        self.segment.borrow().sample_at(distance)
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
