mod core;
mod curve;
mod metrics;

pub use core::{BBox, Point3, Quat, Tolerance, Vec3};
pub use curve::{ArcLengthTable, CubicBezier3, Curve3};
pub use metrics::{BendMetrics, BendTimingReport, TimingBucket};
