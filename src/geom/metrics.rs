//! Opt-in timing hooks for the bend pipeline.
//!
//! Timing is only collected when the `bend_metrics` feature is enabled and the target is not
//! WASM (`std::time::Instant` is unavailable there). Otherwise every call compiles to a plain
//! closure invocation.
//!
//! ```ignore
//! let mut metrics = BendMetrics::default();
//! metrics.begin();
//! let sample = metrics.time(TimingBucket::Sampling, || provider.sample_at(distance));
//! if let Some(report) = metrics.end() {
//!     println!("sampling: {} ns", report.sampling_ns);
//! }
//! ```

/// Phases of a bend pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Applying the pre-transform to source vertices.
    PreTransform,
    /// Provider lookups on sample-cache misses.
    Sampling,
    /// Per-vertex scale, roll and placement.
    Bending,
    /// Bounding box recomputation.
    Bounds,
}

/// Cumulative nanoseconds per bucket.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BendTimingReport {
    pub pre_transform_ns: u64,
    pub sampling_ns: u64,
    pub bending_ns: u64,
    pub bounds_ns: u64,
}

impl BendTimingReport {
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.pre_transform_ns
            .saturating_add(self.sampling_ns)
            .saturating_add(self.bending_ns)
            .saturating_add(self.bounds_ns)
    }

    /// Total time in milliseconds (for display purposes).
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }
}

/// Accumulator for bend timings.
///
/// When the `bend_metrics` feature is disabled (or on WASM), all methods are no-ops and
/// [`end`](Self::end) returns `None`.
#[derive(Debug, Default)]
pub struct BendMetrics {
    #[cfg(all(feature = "bend_metrics", not(target_arch = "wasm32")))]
    report: BendTimingReport,
}

impl BendMetrics {
    /// Resets all counters.
    pub fn begin(&mut self) {
        #[cfg(all(feature = "bend_metrics", not(target_arch = "wasm32")))]
        {
            self.report = BendTimingReport::default();
        }
    }

    #[must_use]
    pub fn end(&self) -> Option<BendTimingReport> {
        #[cfg(all(feature = "bend_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "bend_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Times `f` and accumulates the elapsed time in `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "bend_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            self.add_to_bucket(bucket, nanos);
            result
        }

        #[cfg(not(all(feature = "bend_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }

    #[cfg(all(feature = "bend_metrics", not(target_arch = "wasm32")))]
    fn add_to_bucket(&mut self, bucket: TimingBucket, nanos: u64) {
        let slot = match bucket {
            TimingBucket::PreTransform => &mut self.report.pre_transform_ns,
            TimingBucket::Sampling => &mut self.report.sampling_ns,
            TimingBucket::Bending => &mut self.report.bending_ns,
            TimingBucket::Bounds => &mut self.report.bounds_ns,
        };
        *slot = slot.saturating_add(nanos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_report_total() {
        let report = BendTimingReport {
            pre_transform_ns: 500,
            sampling_ns: 1000,
            bending_ns: 2000,
            bounds_ns: 2500,
        };
        assert_eq!(report.total_ns(), 6000);
        assert!((report.total_ms() - 0.006).abs() < 1e-9);
    }

    #[test]
    fn test_time_returns_closure_result() {
        let mut metrics = BendMetrics::default();
        metrics.begin();
        assert_eq!(metrics.time(TimingBucket::Bending, || 42), 42);
        let report = metrics.end();
        #[cfg(not(all(feature = "bend_metrics", not(target_arch = "wasm32"))))]
        assert!(report.is_none());
        #[cfg(all(feature = "bend_metrics", not(target_arch = "wasm32")))]
        assert!(report.is_some());
    }
}
