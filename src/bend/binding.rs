//! Which provider a bender follows, and how vertex rates map to distances on it.

use std::fmt;
use std::rc::Rc;

use crate::geom::Tolerance;
use crate::path::{FrameSample, SampleProvider};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindingError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("path start distance {start} is out of range, expected 0 < start < {length}")]
    OutOfRange { start: f64, length: f64 },
}

/// The active interval a bender is bound to.
///
/// `Curve` spreads the mesh over the whole provider. `Path` lays it out from `start` using the
/// mesh's own extent, wrapping around past the provider's end.
#[derive(Clone, Default)]
pub enum IntervalBinding {
    #[default]
    Unbound,
    Curve(Rc<dyn SampleProvider>),
    Path {
        provider: Rc<dyn SampleProvider>,
        start: f64,
        end: f64,
    },
}

impl IntervalBinding {
    /// Bind to a whole curve segment.
    ///
    /// # Errors
    /// [`BindingError::InvalidArgument`] when `provider` is `None`.
    pub fn curve(provider: Option<Rc<dyn SampleProvider>>) -> Result<Self, BindingError> {
        let provider = provider.ok_or(BindingError::InvalidArgument("curve provider is required"))?;
        Ok(Self::Curve(provider))
    }

    /// Bind to a range of a longer path starting at `start`.
    ///
    /// # Errors
    /// [`BindingError::InvalidArgument`] when `provider` is `None`;
    /// [`BindingError::OutOfRange`] unless `0 < start < provider.length()`.
    pub fn path(
        provider: Option<Rc<dyn SampleProvider>>,
        start: f64,
        end: f64,
    ) -> Result<Self, BindingError> {
        let provider = provider.ok_or(BindingError::InvalidArgument("path provider is required"))?;
        let length = provider.length();
        // Written so NaN fails as well.
        if !(start > 0.0 && start < length) {
            return Err(BindingError::OutOfRange { start, length });
        }
        Ok(Self::Path {
            provider,
            start,
            end,
        })
    }

    #[must_use]
    pub fn provider(&self) -> Option<&Rc<dyn SampleProvider>> {
        match self {
            Self::Unbound => None,
            Self::Curve(provider) | Self::Path { provider, .. } => Some(provider),
        }
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        !matches!(self, Self::Unbound)
    }

    /// The bound provider together with how rates map to distances on it.
    #[must_use]
    pub fn mapping(&self) -> Option<(&Rc<dyn SampleProvider>, DistanceMapping)> {
        match self {
            Self::Unbound => None,
            Self::Curve(provider) => Some((provider, DistanceMapping::Direct)),
            Self::Path {
                provider, start, ..
            } => Some((provider, DistanceMapping::Offset { start: *start })),
        }
    }

    /// Frame for a vertex at `rate`, or `None` while unbound.
    #[must_use]
    pub fn sample(&self, rate: f64, mesh_extent: f64) -> Option<FrameSample> {
        self.mapping().map(|(provider, mapping)| {
            provider.sample_at(mapping.distance(rate, mesh_extent, provider.length()))
        })
    }

    /// `true` for a path binding whose provider is too short to wrap around.
    #[must_use]
    pub fn has_degenerate_path(&self) -> bool {
        match self {
            Self::Path { provider, .. } => is_degenerate_length(provider.length()),
            _ => false,
        }
    }
}

impl fmt::Debug for IntervalBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbound => f.write_str("Unbound"),
            Self::Curve(provider) => f
                .debug_struct("Curve")
                .field("length", &provider.length())
                .finish(),
            Self::Path {
                provider,
                start,
                end,
            } => f
                .debug_struct("Path")
                .field("length", &provider.length())
                .field("start", start)
                .field("end", end)
                .finish(),
        }
    }
}

/// Rate-to-distance policy of a binding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceMapping {
    /// `rate` scales the provider's full length.
    Direct,
    /// The mesh is laid out from `start` at its own extent, wrapping past the provider's end.
    Offset { start: f64 },
}

impl DistanceMapping {
    #[must_use]
    pub fn distance(self, rate: f64, mesh_extent: f64, provider_length: f64) -> f64 {
        match self {
            Self::Direct => provider_length * rate,
            Self::Offset { start } => wrap_distance(start + mesh_extent * rate, provider_length),
        }
    }
}

fn is_degenerate_length(length: f64) -> bool {
    !length.is_finite() || Tolerance::ZERO_LENGTH.is_zero_length(length)
}

/// Reduce `distance` into `[0, length]` by whole path lengths.
///
/// Degenerate lengths clamp to 0 instead of reducing.
pub(crate) fn wrap_distance(distance: f64, length: f64) -> f64 {
    if is_degenerate_length(length) {
        return 0.0;
    }
    if distance > length {
        let laps = ((distance - length) / length).ceil();
        (distance - laps * length).clamp(0.0, length)
    } else {
        distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_distance_matches_repeated_subtraction() {
        for (distance, length) in [(13.0, 10.0), (20.0, 10.0), (25.0, 10.0), (4.0, 10.0)] {
            let mut expected = distance;
            while expected > length {
                expected -= length;
            }
            assert_eq!(wrap_distance(distance, length), expected);
        }
    }

    #[test]
    fn test_wrap_distance_guards_degenerate_length() {
        assert_eq!(wrap_distance(5.0, 0.0), 0.0);
        assert_eq!(wrap_distance(5.0, 1e-15), 0.0);
        assert_eq!(wrap_distance(5.0, f64::INFINITY), 0.0);
        assert_eq!(wrap_distance(5.0, f64::NAN), 0.0);
        // Huge distance over a tiny but valid length terminates.
        let wrapped = wrap_distance(1e12, 1e-6);
        assert!((0.0..=1e-6).contains(&wrapped));
    }

    #[test]
    fn test_curve_binding_requires_provider() {
        assert!(matches!(
            IntervalBinding::curve(None),
            Err(BindingError::InvalidArgument(_))
        ));
        assert!(matches!(
            IntervalBinding::path(None, 1.0, 2.0),
            Err(BindingError::InvalidArgument(_))
        ));
    }
}
