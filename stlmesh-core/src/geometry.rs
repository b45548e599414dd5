/// Indexed mesh produced by the decoders
use std::ops::Range;

use nalgebra::{Point3, Vector3};

use crate::error::LoadErrorCause;
use crate::interner::VertexInterner;

/// Floats per point or normal in the flattened buffers
pub const COMPONENTS: usize = 3;
/// Integers per face: (point, normal, texcoord) for each of three vertices
pub const FACE_STRIDE: usize = 9;

/// One corner of a face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceVertex {
    pub point: u32,
    pub normal: u32,
    pub tex_coord: u32,
}

/// A triangle face defined by three indexed corners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub vertices: [FaceVertex; 3],
}

impl Face {
    pub fn point_indices(&self) -> [u32; 3] {
        self.vertices.map(|v| v.point)
    }

    /// All three corners share the triangle's normal
    pub fn normal_index(&self) -> u32 {
        self.vertices[0].normal
    }
}

/// An indexed triangle mesh in point/normal/texcoord layout.
///
/// `points` holds each distinct vertex once, in the order it was first met.
/// `normals` holds one entry per triangle. There is a single placeholder
/// texture coordinate shared by every face. `faces` stores nine integers per
/// triangle: `p, n, t` for vertex 1, vertex 2 and vertex 3.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub points: Vec<f32>,
    pub normals: Vec<f32>,
    pub tex_coords: Vec<f32>,
    pub faces: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    pub fn with_capacity(triangles: usize, points: usize) -> Self {
        Self {
            points: Vec::with_capacity(points * COMPONENTS),
            normals: Vec::with_capacity(triangles * COMPONENTS),
            tex_coords: vec![0.0, 0.0],
            faces: Vec::with_capacity(triangles * FACE_STRIDE),
        }
    }

    pub fn point_count(&self) -> usize {
        self.points.len() / COMPONENTS
    }

    pub fn triangle_count(&self) -> usize {
        self.normals.len() / COMPONENTS
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn point(&self, index: usize) -> Option<Point3<f32>> {
        let p = self.points.get(span(index, COMPONENTS)?)?;
        Some(Point3::new(p[0], p[1], p[2]))
    }

    pub fn normal(&self, triangle: usize) -> Option<Vector3<f32>> {
        let n = self.normals.get(span(triangle, COMPONENTS)?)?;
        Some(Vector3::new(n[0], n[1], n[2]))
    }

    pub fn face(&self, triangle: usize) -> Option<Face> {
        let f = self.faces.get(span(triangle, FACE_STRIDE)?)?;
        Some(face_from_slice(f))
    }

    pub fn faces(&self) -> impl Iterator<Item = Face> + '_ {
        self.faces.chunks_exact(FACE_STRIDE).map(face_from_slice)
    }

    /// Axis-aligned bounds over all finite points
    pub fn bounds(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        let mut finite = self
            .points
            .chunks_exact(COMPONENTS)
            .map(|p| Point3::new(p[0], p[1], p[2]))
            .filter(|p| p.iter().all(|c| c.is_finite()));

        let first = finite.next()?;
        Some(finite.fold((first, first), |(min, max), p| {
            (min.inf(&p), max.sup(&p))
        }))
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

/// Element range of record `index` in a flat buffer, if it fits in `usize`
fn span(index: usize, stride: usize) -> Option<Range<usize>> {
    let start = index.checked_mul(stride)?;
    Some(start..start.checked_add(stride)?)
}

fn face_from_slice(f: &[u32]) -> Face {
    let corner = |i: usize| FaceVertex {
        point: f[i],
        normal: f[i + 1],
        tex_coord: f[i + 2],
    };
    Face {
        vertices: [corner(0), corner(3), corner(6)],
    }
}

/// Per-decode working state: the vertex interner and the mesh being filled.
///
/// Both decoders feed triangles through [`MeshBuilder::push_triangle`] so the
/// binary and ASCII paths assign indices identically.
pub(crate) struct MeshBuilder<'a> {
    interner: &'a mut VertexInterner,
    mesh: Mesh,
}

impl<'a> MeshBuilder<'a> {
    /// The interner is cleared on entry and again when the builder is dropped;
    /// dedup state never outlives a decode.
    pub(crate) fn new(interner: &'a mut VertexInterner, triangles_hint: usize) -> Self {
        interner.clear();
        interner.reserve(triangles_hint);
        Self {
            interner,
            mesh: Mesh::with_capacity(triangles_hint, triangles_hint),
        }
    }

    pub(crate) fn push_triangle(
        &mut self,
        normal: Vector3<f32>,
        vertices: [Point3<f32>; 3],
    ) -> Result<(), LoadErrorCause> {
        let normal_index =
            u32::try_from(self.mesh.triangle_count()).map_err(|_| LoadErrorCause::IndexOverflow)?;

        // Order matters: vertex 1 is interned before vertex 2 and 3.
        let mut indices = [0u32; 3];
        for (slot, vertex) in indices.iter_mut().zip(vertices) {
            *slot = self.intern(vertex)?;
        }

        self.mesh.normals.extend_from_slice(normal.as_slice());
        for point in indices {
            self.mesh.faces.extend_from_slice(&[point, normal_index, 0]);
        }
        Ok(())
    }

    fn intern(&mut self, point: Point3<f32>) -> Result<u32, LoadErrorCause> {
        let (index, inserted) = self
            .interner
            .intern(&point)
            .ok_or(LoadErrorCause::IndexOverflow)?;
        if inserted {
            self.mesh.points.extend_from_slice(point.coords.as_slice());
        }
        Ok(index)
    }

    pub(crate) fn finish(mut self) -> Mesh {
        if self.interner.len() != self.mesh.point_count() {
            tracing::warn!(
                interned = self.interner.len(),
                points = self.mesh.point_count(),
                "unique point count diverges from point buffer"
            );
        }
        std::mem::take(&mut self.mesh)
    }
}

/// Dedup entries die with the decode, successful or not; capacity is kept.
impl Drop for MeshBuilder<'_> {
    fn drop(&mut self) {
        self.interner.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32, z: f32) -> Point3<f32> {
        Point3::new(x, y, z)
    }

    #[test]
    fn test_shared_edge_reuses_indices() {
        let mut interner = VertexInterner::new();
        let mut builder = MeshBuilder::new(&mut interner, 2);
        let up = Vector3::new(0.0, 0.0, 1.0);
        builder
            .push_triangle(up, [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0)])
            .unwrap();
        builder
            .push_triangle(up, [p(0.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(0.0, 1.0, 0.0)])
            .unwrap();
        let mesh = builder.finish();

        assert_eq!(mesh.point_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.faces, vec![0, 0, 0, 1, 0, 0, 2, 0, 0, 0, 1, 0, 2, 1, 0, 3, 1, 0]);
        assert_eq!(mesh.tex_coords, vec![0.0, 0.0]);
        assert!(interner.is_empty());
    }

    #[test]
    fn test_dropped_builder_clears_interner() {
        let mut interner = VertexInterner::new();
        {
            let mut builder = MeshBuilder::new(&mut interner, 1);
            builder
                .push_triangle(Vector3::zeros(), [p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(3.0, 0.0, 0.0)])
                .unwrap();
        }
        assert!(interner.is_empty());
        assert!(interner.capacity() > 0);
    }

    #[test]
    fn test_face_accessors() {
        let mut interner = VertexInterner::new();
        let mut builder = MeshBuilder::new(&mut interner, 1);
        builder.push_triangle(
            Vector3::new(0.0, 1.0, 0.0),
            [p(0.0, 0.0, 0.0), p(0.0, 0.0, 1.0), p(1.0, 0.0, 0.0)],
        )
        .unwrap();
        let mesh = builder.finish();

        let face = mesh.face(0).unwrap();
        assert_eq!(face.point_indices(), [0, 1, 2]);
        assert_eq!(face.normal_index(), 0);
        assert_eq!(mesh.normal(0), Some(Vector3::new(0.0, 1.0, 0.0)));
        assert_eq!(mesh.point(2), Some(p(1.0, 0.0, 0.0)));
        assert_eq!(mesh.point(3), None);
        assert_eq!(mesh.face(1), None);
        assert_eq!(mesh.faces().count(), 1);
    }

    #[test]
    fn test_accessors_reject_huge_indices() {
        let mesh = Mesh {
            points: vec![0.0; 3],
            normals: vec![0.0; 3],
            faces: vec![0; 9],
            ..Mesh::new()
        };
        assert_eq!(mesh.point(usize::MAX), None);
        assert_eq!(mesh.normal(usize::MAX / 3), None);
        assert_eq!(mesh.face(usize::MAX / 9 + 1), None);
    }

    #[test]
    fn test_bounds_skip_non_finite_points() {
        let mesh = Mesh {
            points: vec![-1.0, 2.0, 0.5, f32::NAN, 0.0, 0.0, 3.0, -4.0, 1.0],
            ..Mesh::new()
        };
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, p(-1.0, -4.0, 0.5));
        assert_eq!(max, p(3.0, 2.0, 1.0));
        assert_eq!(Mesh::new().bounds(), None);
    }
}
