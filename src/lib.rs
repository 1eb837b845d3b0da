//! A half edge data structure for triangle meshes.
//!
//! This crate maintains full connectivity information for a triangle mesh:
//! every directed edge is an explicit *half edge* that links to its
//! opposite, to its neighbors within the triangle (or boundary cycle) and
//! to the vertex it starts at. On top of that structure, adjacency queries
//! like "all triangles around this vertex", "is this vertex on the
//! boundary?" or "walk all boundary loops" run in time proportional to the
//! size of their answer, without any auxiliary indices.
//!
//! The heart of the crate is [`mesh::HalfEdgeMesh`] and in particular its
//! [`add_triangle`][mesh::HalfEdgeMesh::add_triangle] and
//! [`remove_triangle`][mesh::HalfEdgeMesh::remove_triangle] operations,
//! which keep all links consistent as the mesh grows and shrinks.
//!
//! # Quick start
//!
//! ```
//! use cgmath::Point3;
//! use hem::mesh::HalfEdgeMesh;
//!
//! let mut mesh = HalfEdgeMesh::new();
//! let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
//! let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
//! let c = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
//! let t = mesh.add_triangle([a, b, c]);
//!
//! assert!(!mesh.is_closed());
//! assert_eq!(mesh.triangle(t).vertex_handles(), [a, b, c]);
//! assert_eq!(mesh.boundary_edges().count(), 3);
//! ```
//!
//! Mesh data enters and leaves the crate as flat vertex/index lists
//! ([`raw::RawTriMesh`]); the [`shape`] module generates such lists for a
//! few primitives.

pub mod handle;
pub mod math;
pub mod mesh;
pub mod raw;
pub mod refs;
pub mod shape;

pub use crate::{
    handle::{hsize, Handle, HalfEdgeHandle, TriangleHandle, VertexHandle},
    mesh::HalfEdgeMesh,
    raw::{RawError, RawTriMesh},
};

/// Reexports of the traits of this crate for convenient glob imports.
pub mod prelude {
    pub use crate::{handle::Handle, math::VectorExt};
}
