//! Composite path made of consecutive cubic segments.

use std::cell::RefCell;

use super::curve::CurveSegment;
use super::node::SplineNode;
use super::sample::{ChangeListener, ChangeListeners, FrameSample, ListenerId, SampleProvider};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CurveError {
    #[error("a spline needs at least 2 nodes, got {count}")]
    NotEnoughNodes { count: usize },
    #[error("node index {index} is out of range for {count} nodes")]
    NodeIndexOutOfRange { index: usize, count: usize },
}

#[derive(Debug, Clone)]
struct SplineState {
    nodes: Vec<SplineNode>,
    segments: Vec<CurveSegment>,
    is_loop: bool,
}

impl SplineState {
    fn new(nodes: Vec<SplineNode>, is_loop: bool) -> Self {
        let mut state = Self {
            nodes,
            segments: Vec::new(),
            is_loop,
        };
        state.rebuild_all();
        state
    }

    fn segment_count(&self) -> usize {
        let n = self.nodes.len();
        if self.is_loop { n } else { n.saturating_sub(1) }
    }

    fn build_segment(&self, index: usize) -> CurveSegment {
        let next = (index + 1) % self.nodes.len();
        CurveSegment::new(self.nodes[index], self.nodes[next])
    }

    fn rebuild_all(&mut self) {
        self.segments = (0..self.segment_count())
            .map(|i| self.build_segment(i))
            .collect();
    }

    /// Rebuild only the (at most two) segments touching node `index`.
    fn rebuild_around(&mut self, index: usize) {
        let count = self.segment_count();
        let n = self.nodes.len();
        let previous = if index > 0 {
            Some(index - 1)
        } else if self.is_loop {
            Some(n - 1)
        } else {
            None
        };
        for segment in [previous, Some(index)].into_iter().flatten() {
            if segment < count {
                self.segments[segment] = self.build_segment(segment);
            }
        }
    }

    fn length(&self) -> f64 {
        self.segments.iter().map(CurveSegment::length).sum()
    }

    fn sample_at(&self, distance: f64) -> FrameSample {
        let total = self.length();
        let distance = if distance.is_nan() {
            0.0
        } else {
            distance.clamp(0.0, total)
        };

        let mut start = 0.0;
        for (i, segment) in self.segments.iter().enumerate() {
            let length = segment.length();
            let is_last = i + 1 == self.segments.len();
            if distance <= start + length || is_last {
                return segment.sample_at(distance - start).at_distance(distance);
            }
            start += length;
        }

        // Unreachable for a validated spline; keep a sane frame anyway.
        FrameSample::new(
            self.nodes.first().map(|n| n.position).unwrap_or_default(),
            crate::geom::Quat::IDENTITY,
            [1.0, 1.0],
            0.0,
        )
        .at_distance(distance)
    }
}

/// Editable multi-segment path, optionally closed into a loop.
///
/// Every node edit is forwarded to subscribers as a single change notification.
#[derive(Debug)]
pub struct Spline {
    state: RefCell<SplineState>,
    listeners: ChangeListeners,
}

impl Spline {
    /// Create a spline through `nodes`. A loop adds a closing segment from the last node back
    /// to the first.
    ///
    /// # Errors
    /// Returns [`CurveError::NotEnoughNodes`] for fewer than two nodes.
    pub fn new(nodes: Vec<SplineNode>, is_loop: bool) -> Result<Self, CurveError> {
        if nodes.len() < 2 {
            return Err(CurveError::NotEnoughNodes { count: nodes.len() });
        }
        Ok(Self {
            state: RefCell::new(SplineState::new(nodes, is_loop)),
            listeners: ChangeListeners::new(),
        })
    }

    #[must_use]
    pub fn nodes(&self) -> Vec<SplineNode> {
        self.state.borrow().nodes.clone()
    }

    #[must_use]
    pub fn node(&self, index: usize) -> Option<SplineNode> {
        self.state.borrow().nodes.get(index).copied()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.state.borrow().nodes.len()
    }

    #[must_use]
    pub fn curve_count(&self) -> usize {
        self.state.borrow().segments.len()
    }

    /// Length of segment `index`, if it exists.
    #[must_use]
    pub fn curve_length(&self, index: usize) -> Option<f64> {
        self.state.borrow().segments.get(index).map(CurveSegment::length)
    }

    #[must_use]
    pub fn is_loop(&self) -> bool {
        self.state.borrow().is_loop
    }

    pub fn set_loop(&self, is_loop: bool) {
        {
            let mut state = self.state.borrow_mut();
            if state.is_loop == is_loop {
                return;
            }
            state.is_loop = is_loop;
            state.rebuild_all();
        }
        self.changed();
    }

    /// Replace node `index`.
    ///
    /// # Errors
    /// Returns [`CurveError::NodeIndexOutOfRange`] if `index` does not exist.
    pub fn set_node(&self, index: usize, node: SplineNode) -> Result<(), CurveError> {
        {
            let mut state = self.state.borrow_mut();
            let count = state.nodes.len();
            let slot = state
                .nodes
                .get_mut(index)
                .ok_or(CurveError::NodeIndexOutOfRange { index, count })?;
            if *slot == node {
                return Ok(());
            }
            *slot = node;
            state.rebuild_around(index);
        }
        self.changed();
        Ok(())
    }

    pub fn add_node(&self, node: SplineNode) {
        {
            let mut state = self.state.borrow_mut();
            state.nodes.push(node);
            state.rebuild_all();
        }
        self.changed();
    }

    /// Insert a node before `index` (`index == node_count()` appends).
    ///
    /// # Errors
    /// Returns [`CurveError::NodeIndexOutOfRange`] if `index > node_count()`.
    pub fn insert_node(&self, index: usize, node: SplineNode) -> Result<(), CurveError> {
        {
            let mut state = self.state.borrow_mut();
            let count = state.nodes.len();
            if index > count {
                return Err(CurveError::NodeIndexOutOfRange { index, count });
            }
            state.nodes.insert(index, node);
            state.rebuild_all();
        }
        self.changed();
        Ok(())
    }

    /// Remove node `index`; a spline never drops below two nodes.
    ///
    /// # Errors
    /// Returns [`CurveError::NodeIndexOutOfRange`] for a bad index and
    /// [`CurveError::NotEnoughNodes`] when only two nodes remain.
    pub fn remove_node(&self, index: usize) -> Result<SplineNode, CurveError> {
        let removed = {
            let mut state = self.state.borrow_mut();
            let count = state.nodes.len();
            if index >= count {
                return Err(CurveError::NodeIndexOutOfRange { index, count });
            }
            if count <= 2 {
                return Err(CurveError::NotEnoughNodes { count: count - 1 });
            }
            let removed = state.nodes.remove(index);
            state.rebuild_all();
            removed
        };
        self.changed();
        Ok(removed)
    }

    fn changed(&self) {
        log::debug!(
            "spline changed: {} nodes, length {:.4}",
            self.node_count(),
            self.length()
        );
        self.listeners.notify();
    }
}

impl SampleProvider for Spline {
    fn length(&self) -> f64 {
        self.state.borrow().length()
    }

    fn sample_at(&self, distance: f64) -> FrameSample {
        self.state.borrow().sample_at(distance)
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
