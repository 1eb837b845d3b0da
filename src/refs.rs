//! Reference objects for elements within a mesh.
//!
//! A reference object is just a handle paired with a borrow of the mesh the
//! handle belongs to. All derived per-element queries (rings, neighbors,
//! dihedral angles) live here, so the mesh itself only deals in handles and
//! raw records.

use cgmath::{EuclideanSpace, InnerSpace, Point3, Vector3};

use crate::{
    handle::{HalfEdgeHandle, TriangleHandle, VertexHandle},
    math::VectorExt,
    mesh::{HalfEdgeMesh, IncidentHalfEdges},
};


/// A reference to a vertex within a mesh.
#[derive(Debug, Clone, Copy)]
pub struct VertexRef<'a> {
    mesh: &'a HalfEdgeMesh,
    handle: VertexHandle,
}

/// A reference to a half edge within a mesh.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdgeRef<'a> {
    mesh: &'a HalfEdgeMesh,
    handle: HalfEdgeHandle,
}

/// A reference to a triangle within a mesh.
#[derive(Debug, Clone, Copy)]
pub struct TriangleRef<'a> {
    mesh: &'a HalfEdgeMesh,
    handle: TriangleHandle,
}


// ===========================================================================
// ===== VertexRef
// ===========================================================================

impl<'a> VertexRef<'a> {
    pub(crate) fn new(mesh: &'a HalfEdgeMesh, handle: VertexHandle) -> Self {
        Self { mesh, handle }
    }

    /// Returns the stored handle.
    pub fn handle(&self) -> VertexHandle {
        self.handle
    }

    /// Returns the linked mesh.
    pub fn mesh(&self) -> &'a HalfEdgeMesh {
        self.mesh
    }

    pub fn position(&self) -> Point3<f64> {
        self.mesh.vertices[self.handle].position
    }

    /// The texture coordinate, if one was supplied when the vertex was
    /// added.
    pub fn uv(&self) -> Option<Vector3<f64>> {
        self.mesh.vertices[self.handle].uv
    }

    /// The vertex normal, if one was supplied or computed via
    /// [`HalfEdgeMesh::calculate_vertex_normals`].
    pub fn normal(&self) -> Option<Vector3<f64>> {
        self.mesh.vertices[self.handle].normal
    }

    /// One outgoing half edge of this vertex, or `None` if the vertex is
    /// not connected to anything.
    pub fn outgoing_half_edge(&self) -> Option<HalfEdgeRef<'a>> {
        self.mesh.vertices[self.handle]
            .outgoing
            .into_option()
            .map(|heh| HalfEdgeRef::new(self.mesh, heh))
    }

    /// Whether any incident half edge lies on the boundary.
    pub fn is_on_border(&self) -> bool {
        // The mesh keeps a boundary half edge as the `outgoing` anchor of
        // every boundary vertex, so one lookup decides this.
        match self.mesh.vertices[self.handle].outgoing.into_option() {
            None => false,
            Some(heh) => self.mesh.half_edges[heh].triangle.is_none(),
        }
    }

    /// All outgoing half edges, in clockwise order around the vertex.
    pub fn incident_half_edges(&self) -> impl Iterator<Item = HalfEdgeRef<'a>> {
        let mesh = self.mesh;
        IncidentHalfEdges::new(mesh, self.handle).map(move |heh| HalfEdgeRef::new(mesh, heh))
    }

    /// All vertices directly connected to this one by an edge.
    pub fn neighbor_vertices(&self) -> impl Iterator<Item = VertexRef<'a>> {
        let mesh = self.mesh;
        IncidentHalfEdges::new(mesh, self.handle)
            .map(move |heh| VertexRef::new(mesh, mesh.end_of(heh)))
    }

    /// All triangles touching this vertex.
    pub fn triangles(&self) -> impl Iterator<Item = TriangleRef<'a>> {
        let mesh = self.mesh;
        IncidentHalfEdges::new(mesh, self.handle)
            .filter_map(move |heh| mesh.half_edges[heh].triangle.into_option())
            .map(move |th| TriangleRef::new(mesh, th))
    }

    /// The half edge going from this vertex to `other`, if the two are
    /// connected.
    pub fn half_edge_to(&self, other: VertexHandle) -> Option<HalfEdgeRef<'a>> {
        let mesh = self.mesh;
        IncidentHalfEdges::new(mesh, self.handle)
            .find(|&heh| mesh.end_of(heh) == other)
            .map(|heh| HalfEdgeRef::new(mesh, heh))
    }
}


// ===========================================================================
// ===== HalfEdgeRef
// ===========================================================================

impl<'a> HalfEdgeRef<'a> {
    pub(crate) fn new(mesh: &'a HalfEdgeMesh, handle: HalfEdgeHandle) -> Self {
        Self { mesh, handle }
    }

    /// Returns the stored handle.
    pub fn handle(&self) -> HalfEdgeHandle {
        self.handle
    }

    /// Returns the linked mesh.
    pub fn mesh(&self) -> &'a HalfEdgeMesh {
        self.mesh
    }

    pub fn start_vertex(&self) -> VertexRef<'a> {
        VertexRef::new(self.mesh, self.mesh.half_edges[self.handle].start)
    }

    pub fn end_vertex(&self) -> VertexRef<'a> {
        VertexRef::new(self.mesh, self.mesh.end_of(self.handle))
    }

    /// The triangle this half edge belongs to, `None` for boundary half
    /// edges.
    pub fn triangle(&self) -> Option<TriangleRef<'a>> {
        self.mesh.half_edges[self.handle]
            .triangle
            .into_option()
            .map(|th| TriangleRef::new(self.mesh, th))
    }

    /// The triangle on the other side of this edge.
    pub fn opposite_triangle(&self) -> Option<TriangleRef<'a>> {
        self.opposite().triangle()
    }

    pub fn next(&self) -> HalfEdgeRef<'a> {
        HalfEdgeRef::new(self.mesh, self.mesh.half_edges[self.handle].next)
    }

    pub fn prev(&self) -> HalfEdgeRef<'a> {
        HalfEdgeRef::new(self.mesh, self.mesh.half_edges[self.handle].prev)
    }

    pub fn opposite(&self) -> HalfEdgeRef<'a> {
        HalfEdgeRef::new(self.mesh, self.mesh.half_edges[self.handle].opposite)
    }

    /// Whether this edge has an open side.
    pub fn is_on_border(&self) -> bool {
        self.mesh.half_edges[self.handle].triangle.is_none()
            || self.opposite().triangle().is_none()
    }

    /// Distance between the two end points, computed when the edge was
    /// created.
    pub fn length(&self) -> f64 {
        self.mesh.half_edges[self.handle].length
    }

    /// The dihedral angle between the two triangles adjacent to this edge,
    /// in radians. Returns 0 if either side is open.
    pub fn angle(&self) -> f64 {
        match (self.triangle(), self.opposite_triangle()) {
            (Some(a), Some(b)) => a.normal().angle_to(b.normal()),
            _ => 0.0,
        }
    }
}


// ===========================================================================
// ===== TriangleRef
// ===========================================================================

impl<'a> TriangleRef<'a> {
    pub(crate) fn new(mesh: &'a HalfEdgeMesh, handle: TriangleHandle) -> Self {
        Self { mesh, handle }
    }

    /// Returns the stored handle.
    pub fn handle(&self) -> TriangleHandle {
        self.handle
    }

    /// Returns the linked mesh.
    pub fn mesh(&self) -> &'a HalfEdgeMesh {
        self.mesh
    }

    /// The three vertex handles, in counter clockwise order.
    pub fn vertex_handles(&self) -> [VertexHandle; 3] {
        self.mesh.triangles[self.handle].vertices
    }

    /// The three vertices, in counter clockwise order.
    pub fn vertices(&self) -> [VertexRef<'a>; 3] {
        let [a, b, c] = self.vertex_handles();
        [
            VertexRef::new(self.mesh, a),
            VertexRef::new(self.mesh, b),
            VertexRef::new(self.mesh, c),
        ]
    }

    /// The entry point into this triangle's half edge cycle. It starts at
    /// the triangle's first vertex.
    pub fn half_edge(&self) -> HalfEdgeRef<'a> {
        HalfEdgeRef::new(self.mesh, self.mesh.triangles[self.handle].half_edge)
    }

    /// The three half edges of this triangle (entry, its next, its prev).
    pub fn half_edges(&self) -> [HalfEdgeRef<'a>; 3] {
        let he = self.half_edge();
        [he, he.next(), he.prev()]
    }

    /// The triangles sharing an edge with this one, `None` per open side.
    pub fn neighbors(&self) -> [Option<TriangleRef<'a>>; 3] {
        let [a, b, c] = self.half_edges();
        [a.opposite_triangle(), b.opposite_triangle(), c.opposite_triangle()]
    }

    /// Unit normal, computed from the vertex positions at insertion.
    pub fn normal(&self) -> Vector3<f64> {
        self.mesh.triangles[self.handle].normal
    }

    /// Surface area.
    pub fn area(&self) -> f64 {
        self.mesh.triangles[self.handle].area
    }

    /// The signed volume of the tetrahedron spanned by this triangle and
    /// the origin. Only meaningful summed over a closed, consistently
    /// oriented mesh.
    pub fn signed_volume(&self) -> f64 {
        let [a, b, c] = self.vertices();
        let (pa, pb, pc) = (a.position().to_vec(), b.position().to_vec(), c.position().to_vec());

        pa.dot(pb.cross(pc)) / 6.0
    }

    /// Whether any of the triangle's edges lies on the boundary.
    pub fn is_on_border(&self) -> bool {
        let [a, b, c] = self.half_edges();
        a.is_on_border() || b.is_on_border() || c.is_on_border()
    }

    /// The dihedral angle towards the given neighbor triangle, in radians.
    /// Returns 0 if `other` does not share an edge with this triangle.
    pub fn angle_to(&self, other: TriangleHandle) -> f64 {
        self.half_edges()
            .iter()
            .find(|he| he.opposite_triangle().map(|t| t.handle()) == Some(other))
            .map(|he| he.angle())
            .unwrap_or(0.0)
    }
}
