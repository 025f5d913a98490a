//! Bent output buffer and its Wavefront OBJ export.

use std::io::{self, Write};

use serde::Serialize;

use crate::geom::{BBox, Point3, Vec3};

use super::source::SourceMesh;

/// Output of the bender: bent vertices and normals plus attributes carried over unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultBuffer {
    vertices: Vec<Point3>,
    normals: Vec<Vec3>,
    uv_channels: Vec<Vec<[f64; 2]>>,
    tangents: Vec<[f64; 4]>,
    triangles: Vec<u32>,
    bounds: Option<BBox>,
}

impl ResultBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy every attribute of `source`, including the unbent positions and normals.
    pub fn assign_source(&mut self, source: &SourceMesh) {
        self.vertices = source.positions().to_vec();
        self.normals = source.normals().to_vec();
        self.uv_channels = source.uv_channels().to_vec();
        self.tangents = source.tangents().to_vec();
        self.triangles = source.triangles().to_vec();
        self.recompute_bounds();
    }

    /// Swap in freshly bent geometry; passthrough attributes are left alone.
    pub fn replace_geometry(&mut self, vertices: Vec<Point3>, normals: Vec<Vec3>) {
        self.vertices = vertices;
        self.normals = normals;
    }

    pub fn recompute_bounds(&mut self) {
        self.bounds = BBox::from_points(&self.vertices);
    }

    #[must_use]
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    #[must_use]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    #[must_use]
    pub fn uv_channels(&self) -> &[Vec<[f64; 2]>] {
        &self.uv_channels
    }

    #[must_use]
    pub fn tangents(&self) -> &[[f64; 4]] {
        &self.tangents
    }

    #[must_use]
    pub fn triangles(&self) -> &[u32] {
        &self.triangles
    }

    #[must_use]
    pub fn bounds(&self) -> Option<BBox> {
        self.bounds
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Write the mesh as Wavefront OBJ (positions, normals, first UV channel, faces).
    ///
    /// # Errors
    /// Propagates I/O errors from `out`.
    pub fn write_obj<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for v in &self.vertices {
            writeln!(out, "v {} {} {}", v.x, v.y, v.z)?;
        }
        let uvs = self.uv_channels.first().filter(|uvs| !uvs.is_empty());
        if let Some(uvs) = uvs {
            for uv in uvs {
                writeln!(out, "vt {} {}", uv[0], uv[1])?;
            }
        }
        for n in &self.normals {
            writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
        }
        for tri in self.triangles.chunks_exact(3) {
            let [a, b, c] = [tri[0] + 1, tri[1] + 1, tri[2] + 1];
            if uvs.is_some() {
                writeln!(out, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")?;
            } else {
                writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}")?;
            }
        }
        Ok(())
    }
}
