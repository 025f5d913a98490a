//! Bending a source mesh along a sample provider.
//!
//! The pipeline per vertex: pre-transform, distance rate along X, cached provider sample,
//! lateral scale and roll, placement in the path frame.

mod bender;
mod binding;
mod config;
mod result;
mod source;
mod transform;

pub use bender::{BendDiagnostics, MeshBender};
pub use binding::{BindingError, DistanceMapping, IntervalBinding};
pub use config::{BendConfiguration, FillingMode};
pub use result::ResultBuffer;
pub use source::{MAX_UV_CHANNELS, MeshError, MeshVertex, PreTransform, SourceMesh, SourceMeshBuilder};
pub use transform::{SampleCache, bend_vertex, distance_rate};

#[cfg(test)]
mod tests;
