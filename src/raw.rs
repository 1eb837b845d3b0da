//! The flat exchange representation: vertex attributes plus index triples.
//!
//! This is the only form in which mesh data enters or leaves the crate:
//! generators produce it, loaders fill it, renderers consume it. Half edges
//! are derived state and never serialized; [`HalfEdgeMesh::from_raw`]
//! rebuilds them by replaying `add_vertex`/`add_triangle`.

use cgmath::{Point3, Vector3};
use failure::Fail;
use fxhash::FxHashMap;

use crate::{handle::hsize, mesh::HalfEdgeMesh};


/// An indexed triangle list: positions (plus optional per vertex texture
/// coordinates and normals) and 0-based index triples into them.
#[derive(Debug, Clone, Default)]
pub struct RawTriMesh {
    pub positions: Vec<Point3<f64>>,

    /// Per vertex texture coordinates; if present, must have one entry per
    /// position.
    pub uvs: Option<Vec<Vector3<f64>>>,

    /// Per vertex normals; if present, must have one entry per position.
    pub normals: Option<Vec<Vector3<f64>>>,

    /// Counter clockwise index triples into `positions`.
    pub triangles: Vec<[hsize; 3]>,
}

/// Errors for malformed raw input.
///
/// These are data errors, not programmer errors: raw triangle lists
/// typically come from files or foreign APIs, so a broken one must be
/// reported at the offending triangle instead of blowing up somewhere in a
/// later traversal.
#[derive(Debug, Fail)]
pub enum RawError {
    #[fail(
        display = "triangle {} references vertex index {}, but only {} vertices exist",
        triangle, index, vertex_count
    )]
    VertexIndexOutOfBounds {
        triangle: usize,
        index: hsize,
        vertex_count: usize,
    },

    #[fail(display = "triangle {} uses vertex index {} more than once", triangle, index)]
    DegenerateTriangle { triangle: usize, index: hsize },

    #[fail(
        display = "{} count ({}) does not match position count ({})",
        attribute, len, vertex_count
    )]
    AttributeLengthMismatch {
        attribute: &'static str,
        len: usize,
        vertex_count: usize,
    },
}

impl HalfEdgeMesh {
    /// Builds a fully connected mesh from a flat triangle list by replaying
    /// `add_vertex` and `add_triangle` in order.
    ///
    /// All indices are validated before use, so malformed input fails with
    /// a [`RawError`] naming the offending triangle.
    pub fn from_raw(raw: &RawTriMesh) -> Result<Self, RawError> {
        let vertex_count = raw.positions.len();
        if let Some(uvs) = &raw.uvs {
            if uvs.len() != vertex_count {
                return Err(RawError::AttributeLengthMismatch {
                    attribute: "uv",
                    len: uvs.len(),
                    vertex_count,
                });
            }
        }
        if let Some(normals) = &raw.normals {
            if normals.len() != vertex_count {
                return Err(RawError::AttributeLengthMismatch {
                    attribute: "normal",
                    len: normals.len(),
                    vertex_count,
                });
            }
        }

        let mut mesh = HalfEdgeMesh::new();
        mesh.reserve_vertices(vertex_count as hsize);
        mesh.reserve_triangles(raw.triangles.len() as hsize);

        let mut handles = Vec::with_capacity(vertex_count);
        for (i, &position) in raw.positions.iter().enumerate() {
            let uv = raw.uvs.as_ref().map(|uvs| uvs[i]);
            let normal = raw.normals.as_ref().map(|normals| normals[i]);
            handles.push(mesh.add_vertex_full(position, uv, normal));
        }

        for (i, &[a, b, c]) in raw.triangles.iter().enumerate() {
            for &index in &[a, b, c] {
                if index as usize >= vertex_count {
                    return Err(RawError::VertexIndexOutOfBounds {
                        triangle: i,
                        index,
                        vertex_count,
                    });
                }
            }
            if a == b || b == c || c == a {
                let index = if a == b || a == c { a } else { b };
                return Err(RawError::DegenerateTriangle { triangle: i, index });
            }

            mesh.add_triangle([
                handles[a as usize],
                handles[b as usize],
                handles[c as usize],
            ]);
        }

        mesh.has_normals = raw.normals.is_some();
        Ok(mesh)
    }

    /// Flattens the mesh back into an indexed triangle list.
    ///
    /// Arena holes left by removals are compacted away, so the raw indices
    /// do not necessarily match handle indices. Texture coordinates are
    /// exported if every vertex has one; normals are exported if the mesh's
    /// `has_normals` flag is set (vertices without a normal get a zero
    /// vector).
    pub fn to_raw(&self) -> RawTriMesh {
        let vertex_count = self.num_vertices() as usize;

        let mut index_of = FxHashMap::default();
        let mut positions = Vec::with_capacity(vertex_count);
        let mut uvs = Vec::with_capacity(vertex_count);
        let mut normals = Vec::with_capacity(vertex_count);
        for (i, vh) in self.vertex_handles().enumerate() {
            let v = &self.vertices[vh];
            index_of.insert(vh, i as hsize);
            positions.push(v.position);
            if let Some(uv) = v.uv {
                uvs.push(uv);
            }
            normals.push(v.normal.unwrap_or_else(|| Vector3::new(0.0, 0.0, 0.0)));
        }

        let triangles = self
            .triangle_handles()
            .map(|th| {
                let [a, b, c] = self.triangles[th].vertices;
                [index_of[&a], index_of[&b], index_of[&c]]
            })
            .collect();

        RawTriMesh {
            positions,
            uvs: if uvs.len() == vertex_count { Some(uvs) } else { None },
            normals: if self.has_normals { Some(normals) } else { None },
            triangles,
        }
    }
}


#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;

    fn tri(x: f64) -> RawTriMesh {
        RawTriMesh {
            positions: vec![
                Point3::new(x, 0.0, 0.0),
                Point3::new(x + 1.0, 0.0, 0.0),
                Point3::new(x, 1.0, 0.0),
            ],
            uvs: None,
            normals: None,
            triangles: vec![[0, 1, 2]],
        }
    }

    #[test]
    fn index_out_of_bounds_is_reported() {
        let mut raw = tri(0.0);
        raw.triangles[0] = [0, 1, 3];

        match HalfEdgeMesh::from_raw(&raw) {
            Err(RawError::VertexIndexOutOfBounds { triangle: 0, index: 3, vertex_count: 3 }) => {}
            other => panic!("expected out of bounds error, got {:?}", other),
        }
    }

    #[test]
    fn repeated_index_is_reported() {
        let mut raw = tri(0.0);
        raw.triangles[0] = [0, 1, 1];

        match HalfEdgeMesh::from_raw(&raw) {
            Err(RawError::DegenerateTriangle { triangle: 0, index: 1 }) => {}
            other => panic!("expected degenerate triangle error, got {:?}", other),
        }
    }

    #[test]
    fn attribute_length_mismatch_is_reported() {
        let mut raw = tri(0.0);
        raw.normals = Some(vec![cgmath::vec3(0.0, 0.0, 1.0); 2]);

        match HalfEdgeMesh::from_raw(&raw) {
            Err(RawError::AttributeLengthMismatch { attribute: "normal", len: 2, vertex_count: 3 }) => {}
            other => panic!("expected length mismatch error, got {:?}", other),
        }
    }

    #[test]
    fn round_trip_keeps_connectivity() {
        let raw = tri(0.0);
        let mesh = HalfEdgeMesh::from_raw(&raw).unwrap();
        let back = mesh.to_raw();

        assert_eq!(back.positions, raw.positions);
        assert_eq!(back.triangles, raw.triangles);
        assert!(back.normals.is_none());
    }
}
