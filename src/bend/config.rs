//! Bend configuration with change tracking.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::geom::{Quat, Vec3};

use super::binding::IntervalBinding;
use super::source::{PreTransform, SourceMesh};

/// How the source mesh is meant to be laid out over the interval.
///
/// Stored for the source-mesh collaborator; the bend itself does not branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillingMode {
    #[default]
    Once,
    Repeat,
    StretchToInterval,
}

/// Everything a bend pass reads, plus the dirty flag.
///
/// Setters return `true` when the stored value actually changed; only then is the
/// configuration marked dirty.
#[derive(Debug, Clone)]
pub struct BendConfiguration {
    source: Option<Rc<SourceMesh>>,
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,
    filling_mode: FillingMode,
    binding: IntervalBinding,
    dirty: bool,
}

impl Default for BendConfiguration {
    fn default() -> Self {
        Self {
            source: None,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            filling_mode: FillingMode::default(),
            binding: IntervalBinding::Unbound,
            dirty: true,
        }
    }
}

impl BendConfiguration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn source(&self) -> Option<&Rc<SourceMesh>> {
        self.source.as_ref()
    }

    #[must_use]
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    #[must_use]
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    #[must_use]
    pub fn filling_mode(&self) -> FillingMode {
        self.filling_mode
    }

    #[must_use]
    pub fn binding(&self) -> &IntervalBinding {
        &self.binding
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[must_use]
    pub fn pre_transform(&self) -> PreTransform {
        PreTransform {
            translation: self.translation,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    /// Meshes compare by identity, not content.
    pub fn set_source(&mut self, source: Rc<SourceMesh>) -> bool {
        if self
            .source
            .as_ref()
            .is_some_and(|current| Rc::ptr_eq(current, &source))
        {
            return false;
        }
        self.source = Some(source);
        self.dirty = true;
        true
    }

    pub fn set_translation(&mut self, translation: Vec3) -> bool {
        update(&mut self.translation, translation, &mut self.dirty)
    }

    pub fn set_rotation(&mut self, rotation: Quat) -> bool {
        update(&mut self.rotation, rotation, &mut self.dirty)
    }

    /// Store `scale` with its X component clamped to `[-1, 1]`. A NaN X falls back to 1.
    pub fn set_scale(&mut self, scale: Vec3) -> bool {
        let x = if scale.x.is_nan() {
            log::warn!("scale.x is NaN, using 1.0");
            1.0
        } else {
            scale.x.clamp(-1.0, 1.0)
        };
        update(&mut self.scale, Vec3::new(x, scale.y, scale.z), &mut self.dirty)
    }

    pub fn set_filling_mode(&mut self, mode: FillingMode) -> bool {
        update(&mut self.filling_mode, mode, &mut self.dirty)
    }

    /// Replace the binding wholesale. Bindings are always considered a change.
    pub fn set_binding(&mut self, binding: IntervalBinding) -> IntervalBinding {
        self.dirty = true;
        std::mem::replace(&mut self.binding, binding)
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

fn update<T: PartialEq>(slot: &mut T, value: T, dirty: &mut bool) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    *dirty = true;
    true
}
