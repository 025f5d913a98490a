//! Immutable source geometry and the pure pre-transform applied before bending.

use crate::geom::{BBox, Point3, Quat, Vec3};

/// Maximum number of UV channels carried through to the result.
pub const MAX_UV_CHANNELS: usize = 8;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("{attribute} has {actual} entries but the mesh has {expected} vertices")]
    AttributeLength {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("at most 8 UV channels are supported, got {count}")]
    TooManyUvChannels { count: usize },
    #[error("triangle index list length {len} is not a multiple of 3")]
    TriangleListLength { len: usize },
    #[error("triangle index {index} is out of bounds for {vertex_count} vertices")]
    IndexOutOfBounds { index: u32, vertex_count: usize },
    #[error("vertex {index} has a non-finite position")]
    NonFinitePosition { index: usize },
}

/// Position and normal of a single vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    pub position: Point3,
    pub normal: Vec3,
}

impl MeshVertex {
    #[must_use]
    pub const fn new(position: Point3, normal: Vec3) -> Self {
        Self { position, normal }
    }
}

/// Scale, rotation and translation applied to every source vertex before it is bent.
///
/// Positions are scaled component-wise, rotated, then translated. Normals are only rotated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl PreTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub fn apply(&self, vertex: MeshVertex) -> MeshVertex {
        let scaled = vertex.position.to_vec3().mul_components(self.scale);
        let rotated = self.rotation.rotate(scaled);
        MeshVertex {
            position: Point3::from(rotated.add(self.translation)),
            normal: self.rotation.rotate(vertex.normal),
        }
    }
}

impl Default for PreTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Validated, immutable mesh snapshot used as bend input.
///
/// The longitudinal extent along X (`min_x`, `length`) is computed once at build time from the
/// raw positions.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMesh {
    positions: Vec<Point3>,
    normals: Vec<Vec3>,
    tangents: Vec<[f64; 4]>,
    uv_channels: Vec<Vec<[f64; 2]>>,
    triangles: Vec<u32>,
    min_x: f64,
    length: f64,
}

impl SourceMesh {
    /// Build a mesh from positions and triangles only; normals default to zero vectors.
    ///
    /// # Errors
    /// See [`SourceMeshBuilder::build`].
    pub fn new(positions: Vec<Point3>, triangles: Vec<u32>) -> Result<Self, MeshError> {
        Self::builder(positions, triangles).build()
    }

    #[must_use]
    pub fn builder(positions: Vec<Point3>, triangles: Vec<u32>) -> SourceMeshBuilder {
        SourceMeshBuilder {
            positions,
            triangles,
            normals: None,
            tangents: Vec::new(),
            uv_channels: Vec::new(),
        }
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    #[must_use]
    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    #[must_use]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    #[must_use]
    pub fn tangents(&self) -> &[[f64; 4]] {
        &self.tangents
    }

    #[must_use]
    pub fn uv_channels(&self) -> &[Vec<[f64; 2]>] {
        &self.uv_channels
    }

    #[must_use]
    pub fn triangles(&self) -> &[u32] {
        &self.triangles
    }

    /// Smallest X coordinate of the raw positions.
    #[must_use]
    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    /// Longitudinal extent along X of the raw positions.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    #[must_use]
    pub fn bounds(&self) -> Option<BBox> {
        BBox::from_points(&self.positions)
    }

    #[must_use]
    pub fn vertices(&self) -> impl Iterator<Item = MeshVertex> + '_ {
        self.positions
            .iter()
            .zip(&self.normals)
            .map(|(position, normal)| MeshVertex::new(*position, *normal))
    }

    /// Vertices with `transform` applied, computed on demand.
    pub fn transformed_vertices(
        &self,
        transform: PreTransform,
    ) -> impl Iterator<Item = MeshVertex> + '_ {
        self.vertices().map(move |vertex| transform.apply(vertex))
    }
}

/// Collects optional attributes before validation.
#[derive(Debug, Clone)]
pub struct SourceMeshBuilder {
    positions: Vec<Point3>,
    triangles: Vec<u32>,
    normals: Option<Vec<Vec3>>,
    tangents: Vec<[f64; 4]>,
    uv_channels: Vec<Vec<[f64; 2]>>,
}

impl SourceMeshBuilder {
    #[must_use]
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    #[must_use]
    pub fn with_tangents(mut self, tangents: Vec<[f64; 4]>) -> Self {
        self.tangents = tangents;
        self
    }

    /// Append one UV channel; channels keep their insertion order.
    #[must_use]
    pub fn with_uv_channel(mut self, uvs: Vec<[f64; 2]>) -> Self {
        self.uv_channels.push(uvs);
        self
    }

    /// Validate and freeze the mesh.
    ///
    /// # Errors
    /// - [`MeshError::NonFinitePosition`] for NaN or infinite coordinates.
    /// - [`MeshError::AttributeLength`] when normals, tangents or a UV channel do not have one
    ///   entry per vertex (empty tangents are allowed).
    /// - [`MeshError::TooManyUvChannels`] for more than [`MAX_UV_CHANNELS`] channels.
    /// - [`MeshError::TriangleListLength`] / [`MeshError::IndexOutOfBounds`] for bad triangles.
    pub fn build(self) -> Result<SourceMesh, MeshError> {
        let vertex_count = self.positions.len();

        if let Some(index) = self
            .positions
            .iter()
            .position(|p| !p.to_vec3().is_finite())
        {
            return Err(MeshError::NonFinitePosition { index });
        }

        let normals = match self.normals {
            Some(normals) => {
                check_length("normals", vertex_count, normals.len())?;
                normals
            }
            None => vec![Vec3::ZERO; vertex_count],
        };

        if !self.tangents.is_empty() {
            check_length("tangents", vertex_count, self.tangents.len())?;
        }

        if self.uv_channels.len() > MAX_UV_CHANNELS {
            return Err(MeshError::TooManyUvChannels {
                count: self.uv_channels.len(),
            });
        }
        for uvs in &self.uv_channels {
            check_length("uv channel", vertex_count, uvs.len())?;
        }

        if self.triangles.len() % 3 != 0 {
            return Err(MeshError::TriangleListLength {
                len: self.triangles.len(),
            });
        }
        if let Some(&index) = self
            .triangles
            .iter()
            .find(|&&index| index as usize >= vertex_count)
        {
            return Err(MeshError::IndexOutOfBounds {
                index,
                vertex_count,
            });
        }

        let (min_x, max_x) = self
            .positions
            .iter()
            .fold(None, |acc: Option<(f64, f64)>, p| match acc {
                Some((lo, hi)) => Some((lo.min(p.x), hi.max(p.x))),
                None => Some((p.x, p.x)),
            })
            .unwrap_or((0.0, 0.0));

        Ok(SourceMesh {
            positions: self.positions,
            normals,
            tangents: self.tangents,
            uv_channels: self.uv_channels,
            triangles: self.triangles,
            min_x,
            length: max_x - min_x,
        })
    }
}

fn check_length(attribute: &'static str, expected: usize, actual: usize) -> Result<(), MeshError> {
    if expected == actual {
        Ok(())
    } else {
        Err(MeshError::AttributeLength {
            attribute,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Tolerance;

    fn quad() -> Vec<Point3> {
        vec![
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(10.0, -1.0, 0.0),
            Point3::new(10.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_build_computes_longitudinal_extent() {
        let mesh = SourceMesh::new(quad(), vec![0, 1, 2, 0, 2, 3]).expect("valid quad");
        assert_eq!(mesh.min_x(), 0.0);
        assert_eq!(mesh.length(), 10.0);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.normals().iter().all(|n| *n == Vec3::ZERO));
    }

    #[test]
    fn test_build_rejects_bad_attributes() {
        let err = SourceMesh::builder(quad(), vec![])
            .with_normals(vec![Vec3::Z; 3])
            .build();
        assert_eq!(
            err,
            Err(MeshError::AttributeLength {
                attribute: "normals",
                expected: 4,
                actual: 3
            })
        );

        let mut builder = SourceMesh::builder(quad(), vec![]);
        for _ in 0..=MAX_UV_CHANNELS {
            builder = builder.with_uv_channel(vec![[0.0, 0.0]; 4]);
        }
        assert_eq!(
            builder.build(),
            Err(MeshError::TooManyUvChannels { count: 9 })
        );

        assert_eq!(
            SourceMesh::new(quad(), vec![0, 1]),
            Err(MeshError::TriangleListLength { len: 2 })
        );
        assert_eq!(
            SourceMesh::new(quad(), vec![0, 1, 4]),
            Err(MeshError::IndexOutOfBounds {
                index: 4,
                vertex_count: 4
            })
        );

        let mut positions = quad();
        positions[2].y = f64::NAN;
        assert_eq!(
            SourceMesh::new(positions, vec![]),
            Err(MeshError::NonFinitePosition { index: 2 })
        );
    }

    #[test]
    fn test_pre_transform_order() {
        // Scale first, then rotate 90 degrees about Z, then translate.
        let transform = PreTransform {
            translation: Vec3::new(0.0, 0.0, 5.0),
            rotation: Quat::from_axis_angle_degrees(Vec3::Z, 90.0),
            scale: Vec3::new(2.0, 1.0, 1.0),
        };
        let out = transform.apply(MeshVertex::new(Point3::new(1.0, 0.0, 0.0), Vec3::X));
        assert!(Tolerance::LOOSE.approx_eq_point3(out.position, Point3::new(0.0, 2.0, 5.0)));
        assert!(Tolerance::LOOSE.approx_eq_vec3(out.normal, Vec3::Y));
    }

    #[test]
    fn test_transformed_vertices_leave_source_untouched() {
        let mesh = SourceMesh::new(quad(), vec![]).expect("valid quad");
        let transform = PreTransform {
            translation: Vec3::new(1.0, 0.0, 0.0),
            ..PreTransform::IDENTITY
        };
        let moved: Vec<MeshVertex> = mesh.transformed_vertices(transform).collect();
        assert_eq!(moved[1].position, Point3::new(11.0, -1.0, 0.0));
        assert_eq!(mesh.positions()[1], Point3::new(10.0, -1.0, 0.0));

        // Restartable: a second pass yields the same sequence.
        let again: Vec<MeshVertex> = mesh.transformed_vertices(transform).collect();
        assert_eq!(moved, again);
    }
}
