//! Curves and paths a mesh can be bent along.
//!
//! [`CubicCurve`] is a single Bezier segment between two [`SplineNode`]s; [`Spline`] chains
//! several of them. Both implement [`SampleProvider`], the only interface the bender sees.

mod curve;
mod node;
mod sample;
mod spline;

pub use curve::{ARC_LENGTH_STEPS, CubicCurve};
pub use node::SplineNode;
pub use sample::{ChangeListener, ChangeListeners, FrameSample, ListenerId, SampleProvider};
pub use spline::{CurveError, Spline};
