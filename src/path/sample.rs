//! The sample-provider seam between the bender and the curves it follows.
//!
//! A provider answers one question, "what frame lies at this arc-length distance?", and lets
//! interested parties subscribe to its edits. Listeners are plain `Rc<dyn Fn()>` callbacks kept
//! in a [`ChangeListeners`] registry; subscription and removal are always explicit.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::geom::{Point3, Quat};

/// Frame resolved at a distance along a curve or path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSample {
    pub location: Point3,
    /// Orientation whose local +Z is the path's forward direction.
    pub orientation: Quat,
    /// Lateral scale factors `[x, y]`.
    pub scale: [f64; 2],
    /// Roll about the forward axis, in degrees.
    pub roll: f64,
    /// Absolute distance along the provider this sample was taken at.
    pub distance: f64,
}

impl FrameSample {
    #[must_use]
    pub const fn new(location: Point3, orientation: Quat, scale: [f64; 2], roll: f64) -> Self {
        Self {
            location,
            orientation,
            scale,
            roll,
            distance: 0.0,
        }
    }

    #[must_use]
    pub const fn at_distance(mut self, distance: f64) -> Self {
        self.distance = distance;
        self
    }

    #[must_use]
    pub const fn scale_x(&self) -> f64 {
        self.scale[0]
    }

    #[must_use]
    pub const fn scale_y(&self) -> f64 {
        self.scale[1]
    }
}

/// Callback invoked after a provider's geometry changed.
pub type ChangeListener = Rc<dyn Fn()>;

/// Handle returned by [`SampleProvider::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Anything a mesh can be bent along: a single curve segment or a longer path.
pub trait SampleProvider {
    /// Total arc length.
    fn length(&self) -> f64;

    /// Frame at `distance` along the provider. Out-of-range distances are clamped.
    fn sample_at(&self, distance: f64) -> FrameSample;

    fn subscribe(&self, listener: ChangeListener) -> ListenerId;

    /// Returns `false` when `id` was not subscribed.
    fn unsubscribe(&self, id: ListenerId) -> bool;

    fn listener_count(&self) -> usize;
}

/// Listener registry with interior mutability so providers can be shared behind `Rc`.
#[derive(Default)]
pub struct ChangeListeners {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(ListenerId, ChangeListener)>>,
}

impl ChangeListeners {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: ChangeListener) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.entries.borrow_mut().push((id, listener));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every listener. The list is snapshotted first, so listeners may subscribe or
    /// unsubscribe while being notified.
    pub fn notify(&self) {
        let snapshot: Vec<ChangeListener> = self
            .entries
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in snapshot {
            listener();
        }
    }
}

impl fmt::Debug for ChangeListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeListeners")
            .field("count", &self.len())
            .finish()
    }
}
