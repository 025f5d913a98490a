use super::core::{Point3, Tolerance, Vec3};

pub trait Curve3 {
    fn point_at(&self, t: f64) -> Point3;

    #[must_use]
    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    /// First derivative by central differences; curves with a closed form override this.
    #[must_use]
    fn derivative_at(&self, t: f64) -> Vec3 {
        let (a, b) = self.domain();
        let span = b - a;
        if !span.is_finite() || span == 0.0 {
            return Vec3::ZERO;
        }

        let h = 1e-6 * span.abs();
        let t0 = (t - h).max(a);
        let t1 = (t + h).min(b);
        if t1 == t0 {
            return Vec3::ZERO;
        }

        self.point_at(t1)
            .sub_point(self.point_at(t0))
            .mul_scalar(1.0 / (t1 - t0))
    }

    /// Unit tangent at `t`, or `None` where the derivative vanishes.
    #[must_use]
    fn tangent_at(&self, t: f64) -> Option<Vec3> {
        self.derivative_at(t).normalized()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier3 {
    pub p0: Point3,
    pub p1: Point3,
    pub p2: Point3,
    pub p3: Point3,
}

impl CubicBezier3 {
    #[must_use]
    pub const fn new(p0: Point3, p1: Point3, p2: Point3, p3: Point3) -> Self {
        Self { p0, p1, p2, p3 }
    }
}

impl Curve3 for CubicBezier3 {
    fn point_at(&self, t: f64) -> Point3 {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        let u2 = u * u;
        let t2 = t * t;
        let p = self
            .p0
            .to_vec3()
            .mul_scalar(u2 * u)
            .add(self.p1.to_vec3().mul_scalar(3.0 * u2 * t))
            .add(self.p2.to_vec3().mul_scalar(3.0 * u * t2))
            .add(self.p3.to_vec3().mul_scalar(t2 * t));
        Point3::from(p)
    }

    fn derivative_at(&self, t: f64) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        let a = self.p1.sub_point(self.p0);
        let b = self.p2.sub_point(self.p1);
        let c = self.p3.sub_point(self.p2);
        a.mul_scalar(3.0 * u * u)
            .add(b.mul_scalar(6.0 * u * t))
            .add(c.mul_scalar(3.0 * t * t))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ArcLengthEntry {
    parameter: f64,
    arc_length: f64,
}

/// Cumulative chord-length table mapping arc length to curve parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcLengthTable {
    entries: Vec<ArcLengthEntry>,
}

impl ArcLengthTable {
    /// Sample `curve` at `steps + 1` evenly spaced parameters.
    #[must_use]
    pub fn build<C: Curve3>(curve: &C, steps: usize) -> Self {
        let steps = steps.max(1);
        let (t0, t1) = curve.domain();
        let span = t1 - t0;

        let mut entries = Vec::with_capacity(steps + 1);
        let mut prev = curve.point_at(t0);
        let mut cumulative = 0.0;
        entries.push(ArcLengthEntry {
            parameter: t0,
            arc_length: 0.0,
        });

        for i in 1..=steps {
            let t = t0 + span * (i as f64 / steps as f64);
            let curr = curve.point_at(t);
            cumulative += curr.sub_point(prev).length();
            entries.push(ArcLengthEntry {
                parameter: t,
                arc_length: cumulative,
            });
            prev = curr;
        }

        Self { entries }
    }

    #[must_use]
    pub fn total_length(&self) -> f64 {
        self.entries.last().map_or(0.0, |e| e.arc_length)
    }

    /// Parameter at `distance` along the curve, clamped to the curve's domain.
    #[must_use]
    pub fn parameter_at(&self, distance: f64) -> f64 {
        let (Some(first), Some(last)) = (self.entries.first(), self.entries.last()) else {
            return 0.0;
        };
        if self.entries.len() == 1 || distance.is_nan() || distance <= 0.0 {
            return first.parameter;
        }
        if distance >= last.arc_length {
            return last.parameter;
        }

        let idx = self
            .entries
            .binary_search_by(|entry| {
                entry
                    .arc_length
                    .partial_cmp(&distance)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or_else(|i| i.saturating_sub(1));

        let idx = idx.min(self.entries.len() - 2);
        let e0 = self.entries[idx];
        let e1 = self.entries[idx + 1];

        let segment_length = e1.arc_length - e0.arc_length;
        if Tolerance::ZERO_LENGTH.is_zero_length(segment_length) {
            return e0.parameter;
        }

        let ratio = (distance - e0.arc_length) / segment_length;
        e0.parameter + (e1.parameter - e0.parameter) * ratio.clamp(0.0, 1.0)
    }
}
