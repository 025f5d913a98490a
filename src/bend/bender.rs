//! The mesh bender handle.
//!
//! [`MeshBender`] owns its configuration and result behind `Rc<RefCell<_>>` so that the bound
//! provider can trigger a recompute through a listener. The listener only keeps a `Weak`
//! reference: the provider never keeps a bender alive, and the bender removes its subscription
//! on every rebind and when dropped. A notification that finds the state borrowed is recorded in
//! a flag outside the `RefCell` and picked up by the next [`MeshBender::compute_if_needed`].

use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use crate::geom::{BendMetrics, BendTimingReport, Quat, TimingBucket, Vec3};
use crate::path::{ChangeListener, ListenerId, SampleProvider};

use super::binding::{BindingError, IntervalBinding};
use super::config::{BendConfiguration, FillingMode};
use super::result::ResultBuffer;
use super::source::SourceMesh;
use super::transform::{SampleCache, bend_vertex, distance_rate};

/// Summary of one bend pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BendDiagnostics {
    /// `true` when the result buffer was rewritten.
    pub bent: bool,

    pub vertex_count: usize,

    /// Provider lookups, i.e. distinct distance rates.
    pub samples_resolved: usize,

    /// Vertices that reused an already resolved sample.
    pub cache_hits: usize,

    /// Only populated with the `bend_metrics` feature on native targets.
    pub timing: Option<BendTimingReport>,

    pub warnings: Vec<String>,
}

#[derive(Debug, Default)]
struct BenderState {
    config: BendConfiguration,
    result: ResultBuffer,
    subscription: Option<ListenerId>,
    last_diagnostics: Option<BendDiagnostics>,
}

impl BenderState {
    fn unsubscribe(&mut self) {
        let Some(id) = self.subscription.take() else {
            return;
        };
        if let Some(provider) = self.config.binding().provider() {
            provider.unsubscribe(id);
        }
    }

    fn compute(&mut self) -> BendDiagnostics {
        let mut diagnostics = BendDiagnostics::default();

        let Some(source) = self.config.source().map(Rc::clone) else {
            return self.skip(diagnostics, "no source mesh assigned");
        };
        let binding = self.config.binding().clone();
        let Some((provider, mapping)) = binding.mapping() else {
            return self.skip(diagnostics, "no curve or path bound");
        };

        if binding.has_degenerate_path() {
            let warning = format!(
                "path length {} is degenerate, all vertices sampled at distance 0",
                provider.length()
            );
            log::warn!("{warning}");
            diagnostics.warnings.push(warning);
        }

        let mut metrics = BendMetrics::default();
        metrics.begin();

        let mut cache = SampleCache::new();
        let (min_x, extent) = (source.min_x(), source.length());
        let provider_length = provider.length();

        let mut vertices = Vec::with_capacity(source.vertex_count());
        let mut normals = Vec::with_capacity(source.vertex_count());
        let mut pending = source.transformed_vertices(self.config.pre_transform());
        while let Some(vertex) = metrics.time(TimingBucket::PreTransform, || pending.next()) {
            let rate = distance_rate(vertex.position.x, min_x, extent);
            let sample = cache.get_or_insert_with(rate, || {
                metrics.time(TimingBucket::Sampling, || {
                    provider.sample_at(mapping.distance(rate, extent, provider_length))
                })
            });
            let bent = metrics.time(TimingBucket::Bending, || bend_vertex(vertex, &sample));
            vertices.push(bent.position);
            normals.push(bent.normal);
        }

        self.result.replace_geometry(vertices, normals);
        let result = &mut self.result;
        metrics.time(TimingBucket::Bounds, || result.recompute_bounds());
        self.config.clear_dirty();

        diagnostics.bent = true;
        diagnostics.vertex_count = source.vertex_count();
        diagnostics.samples_resolved = cache.misses();
        diagnostics.cache_hits = cache.hits();
        diagnostics.timing = metrics.end();

        log::debug!(
            "bent {} vertices with {} samples ({} cache hits)",
            diagnostics.vertex_count,
            diagnostics.samples_resolved,
            diagnostics.cache_hits
        );

        self.last_diagnostics = Some(diagnostics.clone());
        diagnostics
    }

    fn skip(&mut self, mut diagnostics: BendDiagnostics, reason: &str) -> BendDiagnostics {
        log::warn!("bend skipped: {reason}");
        diagnostics.warnings.push(format!("bend skipped: {reason}"));
        self.last_diagnostics = Some(diagnostics.clone());
        diagnostics
    }
}

/// Bends a [`SourceMesh`] along a curve segment or a range of a longer path.
///
/// Setters mark the bender dirty only when a value changes; [`compute_if_needed`] then bends
/// at most once. Edits to the bound provider recompute immediately.
///
/// [`compute_if_needed`]: Self::compute_if_needed
#[derive(Debug, Default)]
pub struct MeshBender {
    state: Rc<RefCell<BenderState>>,
    /// Set when a provider change could not be applied immediately.
    pending: Rc<Cell<bool>>,
}

impl MeshBender {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn config(&self) -> Ref<'_, BendConfiguration> {
        Ref::map(self.state.borrow(), |state| &state.config)
    }

    #[must_use]
    pub fn result(&self) -> Ref<'_, ResultBuffer> {
        Ref::map(self.state.borrow(), |state| &state.result)
    }

    /// Diagnostics of the latest pass, including passes triggered by provider edits.
    #[must_use]
    pub fn last_diagnostics(&self) -> Option<BendDiagnostics> {
        self.state.borrow().last_diagnostics.clone()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.pending.get() || self.state.borrow().config.is_dirty()
    }

    /// Assign the mesh to bend. A new mesh is copied into the result buffer once.
    pub fn set_source(&mut self, source: Rc<SourceMesh>) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.config.set_source(Rc::clone(&source)) {
            return false;
        }
        state.result.assign_source(&source);
        log::debug!(
            "source mesh assigned: {} vertices, {} triangles",
            source.vertex_count(),
            source.triangle_count()
        );
        true
    }

    pub fn set_translation(&mut self, translation: Vec3) -> bool {
        self.state.borrow_mut().config.set_translation(translation)
    }

    pub fn set_rotation(&mut self, rotation: Quat) -> bool {
        self.state.borrow_mut().config.set_rotation(rotation)
    }

    /// X is clamped to `[-1, 1]`.
    pub fn set_scale(&mut self, scale: Vec3) -> bool {
        self.state.borrow_mut().config.set_scale(scale)
    }

    pub fn set_filling_mode(&mut self, mode: FillingMode) -> bool {
        self.state.borrow_mut().config.set_filling_mode(mode)
    }

    /// Bend along the whole of `provider`.
    ///
    /// # Errors
    /// [`BindingError::InvalidArgument`] when `provider` is `None`. The current binding is kept.
    pub fn set_curve_interval(
        &mut self,
        provider: Option<Rc<dyn SampleProvider>>,
    ) -> Result<(), BindingError> {
        let binding = IntervalBinding::curve(provider)?;
        self.bind(binding);
        Ok(())
    }

    /// Bend along `provider` starting `start` units in, wrapping past its end.
    ///
    /// # Errors
    /// [`BindingError::InvalidArgument`] when `provider` is `None`,
    /// [`BindingError::OutOfRange`] unless `0 < start < provider.length()`.
    /// The current binding is kept on error.
    pub fn set_path_interval(
        &mut self,
        provider: Option<Rc<dyn SampleProvider>>,
        start: f64,
        end: f64,
    ) -> Result<(), BindingError> {
        let binding = IntervalBinding::path(provider, start, end)?;
        self.bind(binding);
        Ok(())
    }

    /// Bend if anything changed since the last successful pass, including provider edits that
    /// arrived while the bender was borrowed.
    pub fn compute_if_needed(&mut self) -> Option<BendDiagnostics> {
        let mut state = self.state.borrow_mut();
        if !self.pending.get() && !state.config.is_dirty() {
            return None;
        }
        self.pending.set(false);
        Some(state.compute())
    }

    /// Bend unconditionally.
    pub fn compute(&mut self) -> BendDiagnostics {
        self.pending.set(false);
        self.state.borrow_mut().compute()
    }

    fn bind(&mut self, binding: IntervalBinding) {
        let listener = self.listener();
        let mut state = self.state.borrow_mut();
        state.unsubscribe();
        let subscription = binding
            .provider()
            .map(|provider| provider.subscribe(listener));
        log::debug!("bound to {binding:?}");
        state.config.set_binding(binding);
        state.subscription = subscription;
    }

    fn listener(&self) -> ChangeListener {
        let weak: Weak<RefCell<BenderState>> = Rc::downgrade(&self.state);
        let pending = Rc::downgrade(&self.pending);
        Rc::new(move || {
            let (Some(shared), Some(pending)) = (weak.upgrade(), pending.upgrade()) else {
                return;
            };
            let Ok(mut state) = shared.try_borrow_mut() else {
                log::warn!("provider changed while the bender was busy, recompute deferred");
                pending.set(true);
                return;
            };
            pending.set(false);
            state.compute();
        })
    }
}

impl Drop for MeshBender {
    fn drop(&mut self) {
        match self.state.try_borrow_mut() {
            Ok(mut state) => state.unsubscribe(),
            Err(_) => log::warn!("bender dropped while borrowed, provider subscription left behind"),
        }
    }
}
