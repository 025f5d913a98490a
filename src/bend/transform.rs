//! Per-vertex bending transform and the per-pass sample cache.

use std::collections::HashMap;

use crate::geom::{Quat, Vec3};
use crate::path::FrameSample;

use super::source::MeshVertex;

/// Normalized position of `x` along the bend axis. A zero extent maps everything to 0.
#[must_use]
pub fn distance_rate(x: f64, min_x: f64, extent: f64) -> f64 {
    if extent == 0.0 {
        0.0
    } else {
        (x - min_x).abs() / extent
    }
}

/// Map a pre-transformed vertex onto the path frame in `sample`.
///
/// The vertex loses its X coordinate: lateral Y/Z are scaled by the sample's `(y, x)` factors,
/// rolled about X, then rotated into the path frame and moved to the sample location.
#[must_use]
pub fn bend_vertex(vertex: MeshVertex, sample: &FrameSample) -> MeshVertex {
    let lateral = vertex
        .position
        .to_vec3()
        .mul_components(Vec3::new(0.0, sample.scale_y(), sample.scale_x()));

    let roll = Quat::from_axis_angle_degrees(Vec3::X, sample.roll);
    let mut position = roll.rotate(lateral);
    let normal = roll.rotate(vertex.normal);
    position.x = 0.0;

    // The path's forward axis is +Z; the mesh's bend axis is +X.
    let frame = sample.orientation * Quat::from_axis_angle_degrees(Vec3::Y, -90.0);
    MeshVertex {
        position: sample.location + frame.rotate(position),
        normal: frame.rotate(normal),
    }
}

/// Samples resolved during one bend pass, keyed by the exact bits of the distance rate.
///
/// Rates that differ in the last bit are separate entries.
#[derive(Debug, Default)]
pub struct SampleCache {
    entries: HashMap<u64, FrameSample>,
    hits: usize,
    misses: usize,
}

impl SampleCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached sample for `rate`, resolving it with `resolve` on a miss.
    pub fn get_or_insert_with(
        &mut self,
        rate: f64,
        resolve: impl FnOnce() -> FrameSample,
    ) -> FrameSample {
        if let Some(sample) = self.entries.get(&rate.to_bits()) {
            self.hits += 1;
            return *sample;
        }
        self.misses += 1;
        let sample = resolve();
        self.entries.insert(rate.to_bits(), sample);
        sample
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits
    }

    #[must_use]
    pub fn misses(&self) -> usize {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Point3, Tolerance};

    fn sample_at(location: Point3) -> FrameSample {
        FrameSample::new(location, Quat::IDENTITY, [1.0, 1.0], 0.0)
    }

    #[test]
    fn test_distance_rate() {
        assert_eq!(distance_rate(5.0, 0.0, 10.0), 0.5);
        assert_eq!(distance_rate(-2.0, -2.0, 4.0), 0.0);
        assert_eq!(distance_rate(3.0, 3.0, 0.0), 0.0);
        // Vertices moved below min_x by a pre-transform still produce a positive rate.
        assert_eq!(distance_rate(-1.0, 0.0, 10.0), 0.1);
    }

    #[test]
    fn test_identity_frame_keeps_lateral_offset() {
        let vertex = MeshVertex::new(Point3::new(7.0, 2.0, 0.0), Vec3::Y);
        let bent = bend_vertex(vertex, &sample_at(Point3::new(0.0, 0.0, 7.0)));
        assert!(Tolerance::LOOSE.approx_eq_point3(bent.position, Point3::new(0.0, 2.0, 7.0)));
        assert!(Tolerance::LOOSE.approx_eq_vec3(bent.normal, Vec3::Y));
    }

    #[test]
    fn test_lateral_scale_is_cross_mapped() {
        // sample.scale[0] scales the mesh's Z, sample.scale[1] its Y.
        let sample = FrameSample::new(Point3::ORIGIN, Quat::IDENTITY, [3.0, 2.0], 0.0);
        let bent = bend_vertex(MeshVertex::new(Point3::new(0.0, 1.0, 1.0), Vec3::Z), &sample);
        // Mesh Z becomes path -X after the yaw correction.
        assert!(Tolerance::LOOSE.approx_eq_point3(bent.position, Point3::new(-3.0, 2.0, 0.0)));
        assert!(Tolerance::LOOSE.approx_eq_vec3(bent.normal, Vec3::new(-1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_roll_rotates_about_bend_axis() {
        let sample = FrameSample::new(Point3::ORIGIN, Quat::IDENTITY, [1.0, 1.0], 90.0);
        let bent = bend_vertex(MeshVertex::new(Point3::new(4.0, 1.0, 0.0), Vec3::Y), &sample);
        // Y rolls onto Z, which the yaw correction maps to -X.
        assert!(Tolerance::LOOSE.approx_eq_point3(bent.position, Point3::new(-1.0, 0.0, 0.0)));
        assert!(Tolerance::LOOSE.approx_eq_vec3(bent.normal, Vec3::new(-1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_cache_resolves_each_rate_once() {
        let mut cache = SampleCache::new();
        let mut calls = 0;
        for rate in [0.0, 0.5, 0.0, 0.5, 1.0] {
            cache.get_or_insert_with(rate, || {
                calls += 1;
                sample_at(Point3::new(0.0, 0.0, rate))
            });
        }
        assert_eq!(calls, 3);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.misses(), 3);

        // Exact-bit keys: the neighbouring float is a separate entry.
        let next = f64::from_bits(0.5_f64.to_bits() + 1);
        cache.get_or_insert_with(next, || sample_at(Point3::ORIGIN));
        assert_eq!(cache.len(), 4);
    }
}
