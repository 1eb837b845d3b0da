//! Everything related to the [`HalfEdgeMesh`].

// # Some notes for developers about this implementation
//
// - The inner half edges of a triangle run counter clockwise; each one
//   stores the triangle it belongs to. Half edges without a triangle form
//   the boundary cycles of the mesh. Both kinds participate in the same
//   `next`/`prev` linked cycles.
// - Half edges are only ever created and destroyed in pairs. `opposite` is
//   always valid and `opposite.opposite` is always the half edge itself.
// - A vertex on the boundary always stores a boundary half edge as its
//   `outgoing` anchor. Several algorithms (gap splicing, ring walks on open
//   fans) rely on this.

use std::fmt;

use cgmath::{InnerSpace, MetricSpace, Point3, Vector3};
use optional::Optioned as Opt;
use smallvec::SmallVec;

use crate::{
    handle::{hsize, Handle, HalfEdgeHandle, TriangleHandle, VertexHandle},
    math::VectorExt,
    refs::{HalfEdgeRef, TriangleRef, VertexRef},
};
use self::storage::ElementVec;

pub use self::adj::{BoundaryEdges, IncidentHalfEdges};

mod adj;
mod storage;
#[cfg(test)]
mod tests;


const NON_MANIFOLD_VERTEX_ERR: &str =
    "new triangle would add a non-manifold vertex (attached vertex has no boundary gap)";
const NON_MANIFOLD_EDGE_ERR: &str =
    "new triangle would add a non-manifold edge";


// ===============================================================================================
// ===== Definition of types stored inside the data structure
// ===============================================================================================

/// A triangle mesh that stores full connectivity information as half edges.
///
/// Every undirected edge of the mesh is represented by two directed *half
/// edges*, one per traversal direction. Each half edge knows its start
/// vertex, the triangle it belongs to (if any), its `next` and `prev` half
/// edge within that triangle (or within a boundary cycle) and its
/// `opposite`. This makes all local adjacency queries (vertex rings,
/// triangle neighbors, boundary walks) answerable in time proportional to
/// the size of the answer.
///
/// Vertices, triangles and half edges live in flat arenas and refer to each
/// other by [handle][crate::handle]. Removing an element leaves a hole in
/// its arena; handles are never reused or re-indexed.
#[derive(Clone)]
pub struct HalfEdgeMesh {
    pub(crate) vertices: ElementVec<VertexHandle, Vertex>,
    pub(crate) triangles: ElementVec<TriangleHandle, Triangle>,
    pub(crate) half_edges: ElementVec<HalfEdgeHandle, HalfEdge>,

    /// Whether per vertex normal data is populated (either loaded from raw
    /// input or computed by `calculate_vertex_normals`).
    pub(crate) has_normals: bool,
}

/// Data stored per vertex.
#[derive(Clone, Copy)]
pub(crate) struct Vertex {
    pub(crate) position: Point3<f64>,
    pub(crate) uv: Option<Vector3<f64>>,
    pub(crate) normal: Option<Vector3<f64>>,

    /// Handle of one outgoing half edge.
    ///
    /// - If the vertex is isolated, this is none.
    /// - If the vertex lies on a boundary, this is one of its boundary
    ///   (triangle-less) half edges.
    /// - Otherwise it is arbitrary.
    pub(crate) outgoing: Opt<HalfEdgeHandle>,
}

/// Data stored per half edge.
#[derive(Clone, Copy)]
pub(crate) struct HalfEdge {
    /// The vertex this half edge starts at. The end vertex is
    /// `opposite.start`.
    pub(crate) start: VertexHandle,

    /// The triangle this half edge belongs to, none for boundary half
    /// edges.
    pub(crate) triangle: Opt<TriangleHandle>,

    /// The next half edge within the triangle or boundary cycle (counter
    /// clockwise).
    pub(crate) next: HalfEdgeHandle,

    /// The previous half edge within the triangle or boundary cycle.
    pub(crate) prev: HalfEdgeHandle,

    /// The half edge between the same two vertices pointing the other way.
    pub(crate) opposite: HalfEdgeHandle,

    /// Distance between the two end points, computed when the pair is
    /// created.
    pub(crate) length: f64,
}

/// Data stored per triangle.
#[derive(Clone, Copy)]
pub(crate) struct Triangle {
    /// The three vertices in counter clockwise order. The array can be
    /// cyclically rotated (`set_first_vertex`) without changing the
    /// triangle.
    pub(crate) vertices: [VertexHandle; 3],

    /// Entry point into the half edge cycle; starts at `vertices[0]`.
    pub(crate) half_edge: HalfEdgeHandle,

    /// Unit normal, computed from the vertex positions at insertion.
    pub(crate) normal: Vector3<f64>,

    /// Surface area, computed from the vertex positions at insertion.
    pub(crate) area: f64,
}


/// Helper macro to set the `next` and `prev` handles in one line. These two
/// handles always have to be set at the same time, so with this macro you
/// cannot forget one half.
macro_rules! link {
    ($mesh:ident, $prev:expr => $next:expr) => {{
        let prev = $prev;
        let next = $next;
        $mesh.half_edges[prev].next = next;
        $mesh.half_edges[next].prev = prev;
    }};
}

/// Cyclically rotates `vs` so that `front` comes first. `front` must be one
/// of the three values.
fn rotated_to_front(vs: [VertexHandle; 3], front: VertexHandle) -> [VertexHandle; 3] {
    let [a, b, c] = vs;
    if front == b {
        [b, c, a]
    } else if front == c {
        [c, a, b]
    } else {
        [a, b, c]
    }
}


// ===============================================================================================
// ===== Internal helper methods
// ===============================================================================================

impl HalfEdgeMesh {
    /// Makes sure the given handle points to an existing vertex, panics
    /// otherwise.
    pub(crate) fn check_vertex(&self, vh: VertexHandle) {
        if !self.vertices.contains(vh) {
            panic!(
                "{:?} was passed to a half edge mesh, but this vertex does not exist in this mesh",
                vh,
            );
        }
    }

    /// Makes sure the given handle points to an existing triangle, panics
    /// otherwise.
    pub(crate) fn check_triangle(&self, th: TriangleHandle) {
        if !self.triangles.contains(th) {
            panic!(
                "{:?} was passed to a half edge mesh, but this triangle does not exist in this mesh",
                th,
            );
        }
    }

    /// Makes sure the given handle points to an existing half edge, panics
    /// otherwise.
    pub(crate) fn check_half_edge(&self, heh: HalfEdgeHandle) {
        if !self.half_edges.contains(heh) {
            panic!(
                "{:?} was passed to a half edge mesh, but this half edge does not exist in \
                    this mesh",
                heh,
            );
        }
    }

    /// The vertex the given half edge points to.
    pub(crate) fn end_of(&self, heh: HalfEdgeHandle) -> VertexHandle {
        self.half_edges[self.half_edges[heh].opposite].start
    }

    /// The next outgoing half edge when rotating around the start vertex of
    /// `heh` (via `prev.opposite`).
    pub(crate) fn next_outgoing_around(&self, heh: HalfEdgeHandle) -> HalfEdgeHandle {
        self.half_edges[self.half_edges[heh].prev].opposite
    }

    /// Tries to find the half edge from `from` to `to`. Returns `None` if
    /// there is no edge between the two vertices.
    fn he_between(&self, from: VertexHandle, to: VertexHandle) -> Option<HalfEdgeHandle> {
        let start = self.vertices[from].outgoing.into_option()?;
        let mut he = start;
        loop {
            if self.end_of(he) == to {
                return Some(he);
            }

            he = self.next_outgoing_around(he);
            if he == start {
                return None;
            }
        }
    }

    /// Computes unit normal and area of the triangle spanned by the three
    /// vertex positions, from the cross product of its edge vectors.
    fn face_geometry(&self, [a, b, c]: [VertexHandle; 3]) -> (Vector3<f64>, f64) {
        let pa = self.vertices[a].position;
        let pb = self.vertices[b].position;
        let pc = self.vertices[c].position;

        let cross = (pb - pa).cross(pc - pa);
        (cross.normalized(), cross.magnitude() * 0.5)
    }

    /// Pushes the two half edges of a new edge between `from` and `to`. The
    /// forward half edge (`from -> to`) carries `triangle`, the backward one
    /// is boundary. The `next` and `prev` fields are dummies that every
    /// caller has to overwrite.
    fn push_edge_pair(
        &mut self,
        from: VertexHandle,
        to: VertexHandle,
        triangle: TriangleHandle,
    ) -> (HalfEdgeHandle, HalfEdgeHandle) {
        let length = self.vertices[from].position.distance(self.vertices[to].position);
        let dummy = HalfEdgeHandle::new(0);

        let forward = self.half_edges.push(HalfEdge {
            start: from,
            triangle: Opt::some(triangle),
            next: dummy,
            prev: dummy,
            opposite: dummy,
            length,
        });
        let backward = self.half_edges.push(HalfEdge {
            start: to,
            triangle: Opt::none(),
            next: dummy,
            prev: dummy,
            opposite: forward,
            length,
        });
        self.half_edges[forward].opposite = backward;

        (forward, backward)
    }

    /// Splices a freshly created boundary corner into the existing boundary
    /// cycle of the attached vertex `v`.
    ///
    /// `arriving` and `leaving` are the new boundary half edges that end
    /// respectively start at `v`. The vertex's current boundary gap is
    /// opened up and the new corner inserted into it:
    ///
    /// ```text
    ///            ^           /
    ///     gap_in  \         /  gap_out
    ///              \       v
    ///                 (v)
    ///               ^/    \
    ///     arriving  /      \  leaving
    ///              /        v
    /// ```
    ///
    /// becomes `gap_in -> leaving` and `arriving -> gap_out`. If `v` has
    /// several boundary gaps (a multi fan-blade vertex), any of them is a
    /// correct insertion point; we use the one the `outgoing` anchor points
    /// at.
    fn splice_into_gap(
        &mut self,
        v: VertexHandle,
        arriving: HalfEdgeHandle,
        leaving: HalfEdgeHandle,
    ) {
        let gap_out = match self.vertices[v].outgoing.into_option() {
            Some(he) => he,
            None => unreachable!("splice_into_gap called for detached vertex"),
        };
        assert!(
            self.half_edges[gap_out].triangle.is_none(),
            "{}", NON_MANIFOLD_VERTEX_ERR,
        );
        let gap_in = self.half_edges[gap_out].prev;

        link!(self, gap_in => leaving);
        link!(self, arriving => gap_out);
    }

    /// Fixes the boundary cycle at a corner whose two adjacent sides
    /// (`arriving` ends at `v`, `leaving` starts at `v`) are adopted by the
    /// new triangle. Both already carry the new triangle; their own `next`
    /// and `prev` are overwritten by the caller afterwards.
    ///
    /// In the common case the boundary runs `arriving -> leaving` directly
    /// and there is nothing to do. If other fan blades sit between the two
    /// in the vertex's cycle, filling the corner would tear the cycle
    /// apart, so the blade chain containing `leaving` is cut out and
    /// reinserted behind `arriving`'s old continuation. That keeps all
    /// blades of `v` in one `prev.opposite` orbit.
    fn close_corner(
        &mut self,
        v: VertexHandle,
        arriving: HalfEdgeHandle,
        leaving: HalfEdgeHandle,
    ) {
        let continuation = self.half_edges[arriving].next; // leaves v
        if continuation == leaving {
            return;
        }

        // Walk the arriving half edges around `v`, starting inside the
        // blade of `leaving`, until the blade's closing boundary edge.
        let start = self.half_edges[leaving].opposite;
        let mut arr = start;
        let blade_end = loop {
            if self.half_edges[arr].triangle.is_none() {
                break arr;
            }

            arr = self.half_edges[self.half_edges[arr].next].opposite;
            if arr == start {
                panic!("bug: no boundary gap in the blade of {:?} around {:?}", leaving, v);
            }
        };

        // Cut the blade span `leaving ... blade_end` out of the cycle and
        // reinsert it in front of `continuation`. The write order matters
        // when the blade reaches all the way around to `leaving`'s own
        // gap.
        let before_leaving = self.half_edges[leaving].prev; // arrives at v
        let after_blade = self.half_edges[blade_end].next;  // leaves v
        link!(self, before_leaving => after_blade);
        link!(self, blade_end => continuation);

        // `continuation` is a boundary half edge leaving `v`, so it is a
        // valid anchor whether or not more gaps remain.
        self.vertices[v].outgoing = Opt::some(continuation);
    }

    /// Redirects `v`'s `outgoing` anchor if it still references `old`,
    /// which just became an interior half edge. If the ring around `v`
    /// still contains a boundary half edge, the anchor moves there;
    /// otherwise the vertex is interior now and `old` is as good an anchor
    /// as any.
    fn fix_outgoing(&mut self, v: VertexHandle, old: HalfEdgeHandle) {
        if self.vertices[v].outgoing != Opt::some(old) {
            return;
        }

        let mut he = old;
        loop {
            if self.half_edges[he].triangle.is_none() {
                self.vertices[v].outgoing = Opt::some(he);
                return;
            }

            he = self.next_outgoing_around(he);
            if he == old {
                return;
            }
        }
    }

    /// Detaches the edge of `inner` from its removed triangle: if the
    /// opposite half edge still has a triangle, `inner` stays as a boundary
    /// half edge; otherwise the whole pair is removed from storage.
    fn detach_or_remove_edge(&mut self, inner: HalfEdgeHandle) {
        let opposite = self.half_edges[inner].opposite;
        if self.half_edges[opposite].triangle.is_none() {
            self.half_edges.remove(inner);
            self.half_edges.remove(opposite);
        } else {
            self.half_edges[inner].triangle = Opt::none();
        }
    }
}


// ===============================================================================================
// ===== Mutation
// ===============================================================================================

impl HalfEdgeMesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: ElementVec::new(),
            triangles: ElementVec::new(),
            half_edges: ElementVec::new(),
            has_normals: false,
        }
    }

    /// Adds a vertex at the given position, not connected to anything yet.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexHandle {
        self.add_vertex_full(position, None, None)
    }

    /// Adds a vertex with optional texture coordinate and normal.
    pub fn add_vertex_full(
        &mut self,
        position: Point3<f64>,
        uv: Option<Vector3<f64>>,
        normal: Option<Vector3<f64>>,
    ) -> VertexHandle {
        self.vertices.push(Vertex {
            position,
            uv,
            normal,
            outgoing: Opt::none(),
        })
    }

    /// Adds a triangle between the three given vertices (counter clockwise
    /// winding) and wires its half edges into the existing connectivity.
    ///
    /// Depending on how much of the triangle already exists in the mesh,
    /// this creates 6, 4, 2 or 0 new half edges:
    ///
    /// - no side of the triangle exists yet: three new edges (6 half
    ///   edges), one fresh boundary cycle, spliced into the boundary of
    ///   every vertex that is already attached to the mesh;
    /// - one side exists: that boundary half edge is adopted as an inner
    ///   half edge and two new edges are created;
    /// - two sides exist: both are adopted, one new edge closes the
    ///   triangle;
    /// - all three sides exist: the triangle exactly fills a hole, the
    ///   three boundary half edges are adopted and nothing is created.
    ///
    /// # Panics
    ///
    /// Panics if a vertex handle is invalid, if the vertices are not
    /// pairwise distinct, or if the new triangle would create a
    /// non-manifold edge (a side that already has triangles on both sides)
    /// or a non-manifold vertex (attaching to a vertex whose fan is already
    /// closed).
    pub fn add_triangle(&mut self, [a, b, c]: [VertexHandle; 3]) -> TriangleHandle {
        assert!(
            a != b && b != c && a != c,
            "vertices of new triangle are not unique: [{:?}, {:?}, {:?}]",
            a, b, c,
        );
        self.check_vertex(a);
        self.check_vertex(b);
        self.check_vertex(c);

        // Find the directed sides of the new triangle that already exist.
        // Any such half edge has to be free (triangle-less), or the edge
        // would end up with more than two triangles.
        let existing = [
            self.he_between(a, b),
            self.he_between(b, c),
            self.he_between(c, a),
        ];
        for he in existing.iter().filter_map(|&he| he) {
            assert!(self.half_edges[he].triangle.is_none(), "{}", NON_MANIFOLD_EDGE_ERR);
        }

        // Rotate the vertices into the canonical position of the matching
        // case: the vertex off the shared side first (one side exists), or
        // the corner both shared sides touch first (two sides exist).
        match existing {
            [None, None, None] => self.insert_detached([a, b, c]),
            [Some(e), None, None] => self.insert_one_shared([c, a, b], e),
            [None, Some(e), None] => self.insert_one_shared([a, b, c], e),
            [None, None, Some(e)] => self.insert_one_shared([b, c, a], e),
            [Some(e1), Some(e2), None] => self.insert_two_shared([b, c, a], e2, e1),
            [None, Some(e1), Some(e2)] => self.insert_two_shared([c, a, b], e2, e1),
            [Some(e2), None, Some(e1)] => self.insert_two_shared([a, b, c], e2, e1),
            [Some(e1), Some(e2), Some(e3)] => self.insert_closing([a, b, c], [e1, e2, e3]),
        }
    }

    /// No side of the triangle exists yet: create all three edge pairs and
    /// splice the new boundary corners into the boundary cycles of the
    /// vertices that are already attached.
    fn insert_detached(&mut self, vs: [VertexHandle; 3]) -> TriangleHandle {
        // Rotate an attached vertex into a canonical slot. This does not
        // change the wiring logic below (every corner is handled on its
        // own), but keeps the stored vertex order predictable.
        let attached: SmallVec<[VertexHandle; 3]> = vs
            .iter()
            .copied()
            .filter(|&v| self.vertices[v].outgoing.is_some())
            .collect();
        let vs = match attached.len() {
            1 => rotated_to_front(vs, attached[0]),
            2 => {
                let detached = vs
                    .iter()
                    .copied()
                    .find(|v| !attached.contains(v))
                    .unwrap();
                rotated_to_front(vs, detached)
            }
            _ => vs,
        };
        let [v1, v2, v3] = vs;

        let (normal, area) = self.face_geometry(vs);
        let th = self.triangles.push(Triangle {
            vertices: vs,
            half_edge: HalfEdgeHandle::new(0), // overwritten below
            normal,
            area,
        });

        let (h1, o1) = self.push_edge_pair(v1, v2, th);
        let (h2, o2) = self.push_edge_pair(v2, v3, th);
        let (h3, o3) = self.push_edge_pair(v3, v1, th);
        self.triangles[th].half_edge = h1;

        // Inner cycle (counter clockwise) and the new boundary cycle
        // around it (clockwise: o1 ends at v1, so o3 follows it).
        link!(self, h1 => h2);
        link!(self, h2 => h3);
        link!(self, h3 => h1);
        link!(self, o1 => o3);
        link!(self, o3 => o2);
        link!(self, o2 => o1);

        // Hook each corner up to what is already there. `arriving` and
        // `leaving` are the new boundary half edges ending and starting at
        // the corner vertex.
        for &(vh, arriving, leaving) in &[(v1, o1, o3), (v2, o2, o1), (v3, o3, o2)] {
            if self.vertices[vh].outgoing.is_some() {
                self.splice_into_gap(vh, arriving, leaving);
            } else {
                self.vertices[vh].outgoing = Opt::some(leaving);
            }
        }

        th
    }

    /// Exactly one side of the triangle already exists. `vs` is rotated
    /// such that the shared side is `v2 -> v3`; `shared` is that half edge.
    ///
    /// ```text
    ///               (v1)
    ///               ^/ ^\
    ///           o1 //   \\ o3
    ///              // new \\
    ///             /v       \v
    ///           (v2) ----> (v3)
    ///              \ shared /
    ///               existing
    ///               triangle
    /// ```
    ///
    /// The shared half edge leaves its boundary cycle and becomes an inner
    /// half edge; the new boundary path `v2 -> v1 -> v3` takes its place.
    fn insert_one_shared(
        &mut self,
        vs: [VertexHandle; 3],
        shared: HalfEdgeHandle,
    ) -> TriangleHandle {
        let [v1, v2, v3] = vs;
        let h2 = shared;

        let (normal, area) = self.face_geometry(vs);
        let th = self.triangles.push(Triangle {
            vertices: vs,
            half_edge: HalfEdgeHandle::new(0),
            normal,
            area,
        });

        // The boundary neighborhood of the reused edge, captured before any
        // relinking.
        let before_h2 = self.half_edges[h2].prev; // arrives at v2
        let after_h2 = self.half_edges[h2].next;  // leaves v3

        let (h1, o1) = self.push_edge_pair(v1, v2, th);
        let (h3, o3) = self.push_edge_pair(v3, v1, th);
        self.triangles[th].half_edge = h1;
        self.half_edges[h2].triangle = Opt::some(th);

        link!(self, h1 => h2);
        link!(self, h2 => h3);
        link!(self, h3 => h1);

        // New boundary path v2 -> v1 -> v3 replaces the reused edge in its
        // boundary cycle.
        link!(self, before_h2 => o1);
        link!(self, o1 => o3);
        link!(self, o3 => after_h2);

        // The corner at v1 either starts a fresh fan blade (v1 detached) or
        // is spliced into v1's boundary like in the detached case.
        if self.vertices[v1].outgoing.is_some() {
            self.splice_into_gap(v1, o1, o3);
        } else {
            self.vertices[v1].outgoing = Opt::some(o3);
        }

        // The reused edge is interior now; if it was the boundary anchor of
        // its start vertex, the anchor moves to its replacement.
        if self.vertices[v2].outgoing == Opt::some(h2) {
            self.vertices[v2].outgoing = Opt::some(o1);
        }

        th
    }

    /// Two sides of the triangle already exist. `vs` is rotated such that
    /// both shared sides touch `v1`: `h1` is the existing `v1 -> v2`, `h3`
    /// the existing `v3 -> v1`.
    ///
    /// ```text
    ///           \             ^
    ///  before_h1 \           / after_h3   (only present on multi-blade v1)
    ///             v         /
    ///               (v1)
    ///               ^/ ^\
    ///           h3 //   \\ h1
    ///              // new \\
    ///             /v       \v
    ///           (v3) <---- (v2)
    ///                  h2
    /// ```
    ///
    /// One new edge pair closes the triangle; its boundary half `o2`
    /// (`v3 -> v2`) bridges the cycle the two adopted edges leave behind.
    fn insert_two_shared(
        &mut self,
        vs: [VertexHandle; 3],
        h1: HalfEdgeHandle,
        h3: HalfEdgeHandle,
    ) -> TriangleHandle {
        let [v1, v2, v3] = vs;

        let (normal, area) = self.face_geometry(vs);
        let th = self.triangles.push(Triangle {
            vertices: vs,
            half_edge: h1,
            normal,
            area,
        });

        let after_h1 = self.half_edges[h1].next;   // leaves v2
        let before_h3 = self.half_edges[h3].prev;  // arrives at v3

        let (h2, o2) = self.push_edge_pair(v2, v3, th);
        self.half_edges[h1].triangle = Opt::some(th);
        self.half_edges[h3].triangle = Opt::some(th);

        // o2 takes over the boundary path the adopted edges leave behind,
        // and the corner at v1 is closed. Only then may the inner cycle
        // overwrite the adopted edges' links.
        link!(self, before_h3 => o2);
        link!(self, o2 => after_h1);
        self.close_corner(v1, h3, h1);

        link!(self, h1 => h2);
        link!(self, h2 => h3);
        link!(self, h3 => h1);

        self.fix_outgoing(v1, h1);
        self.fix_outgoing(v3, h3);

        th
    }

    /// All three sides already exist: the triangle exactly fills a hole.
    /// The three boundary half edges are adopted without creating or (in
    /// the common case) relinking anything. `edges` are the existing half
    /// edges `v1 -> v2`, `v2 -> v3`, `v3 -> v1`.
    fn insert_closing(
        &mut self,
        vs: [VertexHandle; 3],
        edges: [HalfEdgeHandle; 3],
    ) -> TriangleHandle {
        let [v1, v2, v3] = vs;
        let [h1, h2, h3] = edges;

        let (normal, area) = self.face_geometry(vs);
        let th = self.triangles.push(Triangle {
            vertices: vs,
            half_edge: h1,
            normal,
            area,
        });

        for &heh in &edges {
            self.half_edges[heh].triangle = Opt::some(th);
        }

        // Close the three corners while the old boundary links are still in
        // place. If the hole is exactly this triangle (the usual case),
        // none of these has anything to do and no link is touched at all.
        self.close_corner(v2, h1, h2);
        self.close_corner(v3, h2, h3);
        self.close_corner(v1, h3, h1);

        link!(self, h1 => h2);
        link!(self, h2 => h3);
        link!(self, h3 => h1);

        self.fix_outgoing(v2, h2);
        self.fix_outgoing(v3, h3);
        self.fix_outgoing(v1, h1);

        th
    }

    /// Cyclically rotates the stored vertex order of `t` so that `v` comes
    /// first. Does nothing if `v` is not a vertex of the triangle. The
    /// entry half edge is rotated along, so it keeps starting at the first
    /// vertex.
    pub fn set_first_vertex(&mut self, t: TriangleHandle, v: VertexHandle) {
        self.check_triangle(t);
        let vs = self.triangles[t].vertices;
        if !vs.contains(&v) {
            return;
        }

        let mut he = self.triangles[t].half_edge;
        while self.half_edges[he].start != v {
            he = self.half_edges[he].next;
        }

        let tri = &mut self.triangles[t];
        tri.vertices = rotated_to_front(vs, v);
        tri.half_edge = he;
    }

    /// Removes the triangle from the mesh.
    ///
    /// Its three half edges lose their triangle reference. Each of the
    /// three edges whose opposite side is open as well is removed
    /// completely, with the surrounding `next`/`prev` cycles bridged and
    /// vertex anchors redirected. Edges shared with a surviving triangle
    /// stay behind as boundary.
    pub fn remove_triangle(&mut self, t: TriangleHandle) {
        self.check_triangle(t);

        // We handle one corner per loop iteration, reading all needed
        // handles before anything is overwritten or removed. The first
        // corner's inner half edge is needed until the end of the loop, so
        // its edge is detached only after the loop (every other edge is
        // detached in its own iteration).
        //
        // Corner situation (the corner vertex `v`, the dying triangle `T`,
        // the two outer half edges):
        //
        //                    ?
        //              ?           ?
        //                   (v)
        //                  ^/ ^\
        //      outer_out  //   \\  outer_in
        //                //  T  \\
        //               /v       \v
        //              ( )       ( )
        //
        let start = self.triangles[t].half_edge;
        let mut inner_in = start;
        loop {
            let inner_out = self.half_edges[inner_in].next;
            let vh = self.end_of(inner_in);
            let outer_out = self.half_edges[inner_in].opposite; // leaves v
            let outer_in = self.half_edges[inner_out].opposite; // arrives at v

            let kept_in = self.half_edges[outer_in].triangle.is_some();
            let kept_out = self.half_edges[outer_out].triangle.is_some();
            match (kept_in, kept_out) {
                // `T` is the only thing attached to `v`: both edges at this
                // corner disappear and `v` becomes isolated.
                (false, false) if self.half_edges[outer_in].next == outer_out => {
                    self.vertices[vh].outgoing = Opt::none();
                }

                // Both edges at this corner disappear, but `v` keeps other
                // fan blades. Bridge the boundary cycle across the corner.
                (false, false) => {
                    let blade_start = self.half_edges[outer_in].next; // leaves v
                    let blade_end = self.half_edges[outer_out].prev;  // arrives at v
                    self.vertices[vh].outgoing = Opt::some(blade_start);
                    link!(self, blade_end => blade_start);
                }

                // The incoming edge is shared with another triangle and
                // survives (as boundary); the outgoing edge disappears. The
                // gap before the dying edge now ends at `inner_out`.
                (true, false) => {
                    let blade_end = self.half_edges[outer_out].prev;
                    link!(self, blade_end => inner_out);
                    self.vertices[vh].outgoing = Opt::some(inner_out);
                }

                // Mirror image: the outgoing edge survives, the incoming
                // one disappears. `inner_in` becomes boundary and continues
                // where the dying edge's cycle went.
                (false, true) => {
                    let blade_start = self.half_edges[outer_in].next;
                    link!(self, inner_in => blade_start);
                    // `v`'s anchor cannot reference a dying half edge here:
                    // the only dying edge leaving `v` is `inner_out`, which
                    // was interior before this call.
                }

                // Both neighbor triangles survive: no edge is removed, the
                // two inner half edges become a fresh boundary gap at `v`
                // (they already link `inner_in -> inner_out`).
                (true, true) => {
                    self.vertices[vh].outgoing = Opt::some(inner_out);
                }
            }

            if inner_in != start {
                self.detach_or_remove_edge(inner_in);

                if inner_out == start {
                    break;
                }
            }

            inner_in = inner_out;
        }

        self.detach_or_remove_edge(start);
        self.triangles.remove(t);
    }

    /// Removes the vertex and every triangle attached to it.
    pub fn remove_vertex(&mut self, v: VertexHandle) {
        self.check_vertex(v);

        while let Some(outgoing) = self.vertices[v].outgoing.into_option() {
            // Find a triangle in the ring. One always exists while the
            // vertex has any half edge: an edge with two open sides is
            // removed, never kept.
            let mut he = outgoing;
            let t = loop {
                if let Some(t) = self.half_edges[he].triangle.into_option() {
                    break t;
                }

                he = self.next_outgoing_around(he);
                if he == outgoing {
                    panic!("bug: ring of {:?} has half edges but no triangle", v);
                }
            };

            self.remove_triangle(t);
        }

        self.vertices.remove(v);
    }

    /// Removes a vertex that is not connected to anything. Panics if the
    /// vertex still has an outgoing half edge.
    pub fn remove_isolated_vertex(&mut self, v: VertexHandle) {
        self.check_vertex(v);
        assert!(
            self.vertices[v].outgoing.is_none(),
            "{:?} is not isolated but was passed to `remove_isolated_vertex`",
            v,
        );

        self.vertices.remove(v);
    }

    /// Reserves storage for `count` additional vertices.
    pub fn reserve_vertices(&mut self, count: hsize) {
        self.vertices.reserve(count);
    }

    /// Reserves storage for `count` additional triangles (and their half
    /// edges).
    pub fn reserve_triangles(&mut self, count: hsize) {
        self.triangles.reserve(count);
        self.half_edges.reserve(count * 3);
    }
}

impl Default for HalfEdgeMesh {
    fn default() -> Self {
        Self::new()
    }
}


// ===============================================================================================
// ===== Queries
// ===============================================================================================

impl HalfEdgeMesh {
    pub fn num_vertices(&self) -> hsize {
        self.vertices.num_elements()
    }

    pub fn num_triangles(&self) -> hsize {
        self.triangles.num_elements()
    }

    pub fn num_half_edges(&self) -> hsize {
        self.half_edges.num_elements()
    }

    pub fn contains_vertex(&self, vh: VertexHandle) -> bool {
        self.vertices.contains(vh)
    }

    pub fn contains_triangle(&self, th: TriangleHandle) -> bool {
        self.triangles.contains(th)
    }

    pub fn contains_half_edge(&self, heh: HalfEdgeHandle) -> bool {
        self.half_edges.contains(heh)
    }

    /// Returns a reference object for the given vertex. Panics if the
    /// handle does not belong to this mesh.
    pub fn vertex(&self, vh: VertexHandle) -> VertexRef<'_> {
        self.check_vertex(vh);
        VertexRef::new(self, vh)
    }

    /// Returns a reference object for the given triangle. Panics if the
    /// handle does not belong to this mesh.
    pub fn triangle(&self, th: TriangleHandle) -> TriangleRef<'_> {
        self.check_triangle(th);
        TriangleRef::new(self, th)
    }

    /// Returns a reference object for the given half edge. Panics if the
    /// handle does not belong to this mesh.
    pub fn half_edge(&self, heh: HalfEdgeHandle) -> HalfEdgeRef<'_> {
        self.check_half_edge(heh);
        HalfEdgeRef::new(self, heh)
    }

    pub fn vertex_handles(&self) -> impl Iterator<Item = VertexHandle> + '_ {
        self.vertices.handles()
    }

    pub fn triangle_handles(&self) -> impl Iterator<Item = TriangleHandle> + '_ {
        self.triangles.handles()
    }

    pub fn half_edge_handles(&self) -> impl Iterator<Item = HalfEdgeHandle> + '_ {
        self.half_edges.handles()
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertexRef<'_>> {
        let mesh = self;
        self.vertices.handles().map(move |vh| VertexRef::new(mesh, vh))
    }

    pub fn triangles(&self) -> impl Iterator<Item = TriangleRef<'_>> {
        let mesh = self;
        self.triangles.handles().map(move |th| TriangleRef::new(mesh, th))
    }

    pub fn half_edges(&self) -> impl Iterator<Item = HalfEdgeRef<'_>> {
        let mesh = self;
        self.half_edges.handles().map(move |heh| HalfEdgeRef::new(mesh, heh))
    }

    /// Tries to find the half edge going from `from` to `to`. Returns
    /// `None` if the two vertices are not connected.
    pub fn half_edge_between(
        &self,
        from: VertexHandle,
        to: VertexHandle,
    ) -> Option<HalfEdgeHandle> {
        self.check_vertex(from);
        self.check_vertex(to);
        self.he_between(from, to)
    }

    /// Walks all boundary cycles, yielding the `(start, end)` vertex pair
    /// of every boundary half edge, one cycle after the other.
    pub fn boundary_edges(&self) -> BoundaryEdges<'_> {
        BoundaryEdges::new(self)
    }

    /// The boundary as a flat vertex sequence with every loop vertex
    /// appearing twice (end of one segment, start of the next), ready to be
    /// rendered as line segments.
    pub fn boundary_vertices(&self) -> impl Iterator<Item = VertexHandle> + '_ {
        self.boundary_edges()
            .flat_map(|(a, b)| std::iter::once(a).chain(std::iter::once(b)))
    }

    /// Whether the mesh has no boundary at all.
    pub fn is_closed(&self) -> bool {
        let mesh = self;
        self.half_edges
            .handles()
            .all(|heh| mesh.half_edges[heh].triangle.is_some())
    }

    /// The volume enclosed by the mesh: the absolute sum of the signed
    /// tetrahedron volumes of all triangles. Only meaningful for a closed,
    /// consistently oriented mesh; returns 0 for an open mesh.
    pub fn volume(&self) -> f64 {
        if !self.is_closed() {
            return 0.0;
        }

        self.triangles().map(|t| t.signed_volume()).sum::<f64>().abs()
    }

    /// Whether per vertex normals are populated.
    pub fn has_normals(&self) -> bool {
        self.has_normals
    }

    /// Computes a normal for every vertex from the normals of its incident
    /// triangles, weighted by triangle area. Incident triangles whose
    /// normal direction duplicates an already gathered one (coplanar
    /// neighbors, common in grid generated meshes) are counted once, so a
    /// vertex between two large coplanar triangles and one slanted one is
    /// not biased towards the plane.
    pub fn calculate_vertex_normals(&mut self) {
        let vhs: Vec<VertexHandle> = self.vertices.handles().collect();
        for vh in vhs {
            let mut gathered: SmallVec<[(Vector3<f64>, f64); 8]> = SmallVec::new();
            if let Some(start) = self.vertices[vh].outgoing.into_option() {
                let mut he = start;
                loop {
                    if let Some(t) = self.half_edges[he].triangle.into_option() {
                        let (normal, area) = (self.triangles[t].normal, self.triangles[t].area);
                        if !gathered.iter().any(|&(n, _)| n.approx_direction_eq(normal)) {
                            gathered.push((normal, area));
                        }
                    }

                    he = self.next_outgoing_around(he);
                    if he == start {
                        break;
                    }
                }
            }

            self.vertices[vh].normal = if gathered.is_empty() {
                None
            } else {
                let sum = gathered
                    .iter()
                    .fold(Vector3::new(0.0, 0.0, 0.0), |acc, &(n, a)| acc + n * a);
                Some(sum.normalized())
            };
        }

        self.has_normals = true;
    }

    /// Checks all invariants of the data structure and panics with a
    /// description of the problem if any is violated. Intended for tests
    /// and debugging; this is linear in the size of the mesh.
    pub fn check_integrity(&self) {
        // Check vertices.
        for vh in self.vertices.handles() {
            if let Some(outgoing) = self.vertices[vh].outgoing.into_option() {
                if !self.half_edges.contains(outgoing) {
                    panic!(
                        "bug (broken reference): [{:?}].outgoing = Some({:?}), but that \
                            half edge does not exist!",
                        vh, outgoing,
                    );
                }
                if self.half_edges[outgoing].start != vh {
                    panic!(
                        "bug: [{:?}].outgoing = Some({:?}), but [{:?}].start = {:?} \
                            (should be {:?})",
                        vh, outgoing, outgoing, self.half_edges[outgoing].start, vh,
                    );
                }

                // The boundary anchor rule: if the ring contains a boundary
                // half edge, the anchor has to be one.
                if self.half_edges[outgoing].triangle.is_some() {
                    let mut he = outgoing;
                    loop {
                        if self.half_edges[he].triangle.is_none() {
                            panic!(
                                "bug: [{:?}].outgoing = Some({:?}) is an interior half \
                                    edge, but the ring contains the boundary half edge {:?}",
                                vh, outgoing, he,
                            );
                        }

                        he = self.next_outgoing_around(he);
                        if he == outgoing {
                            break;
                        }
                    }
                }
            }
        }

        // Check half edges.
        for heh in self.half_edges.handles() {
            let he = &self.half_edges[heh];
            for &(what, link) in &[("next", he.next), ("prev", he.prev), ("opposite", he.opposite)] {
                if !self.half_edges.contains(link) {
                    panic!(
                        "bug (broken reference): [{:?}].{} = {:?}, but that half edge \
                            does not exist!",
                        heh, what, link,
                    );
                }
            }
            if !self.vertices.contains(he.start) {
                panic!(
                    "bug (broken reference): [{:?}].start = {:?}, but that vertex does \
                        not exist!",
                    heh, he.start,
                );
            }
            if let Some(t) = he.triangle.into_option() {
                if !self.triangles.contains(t) {
                    panic!(
                        "bug (broken reference): [{:?}].triangle = Some({:?}), but that \
                            triangle does not exist!",
                        heh, t,
                    );
                }
            }

            if self.half_edges[he.opposite].opposite != heh {
                panic!(
                    "bug: [{:?}].opposite = {:?}, but [{:?}].opposite = {:?}",
                    heh, he.opposite, he.opposite, self.half_edges[he.opposite].opposite,
                );
            }
            if self.half_edges[he.next].prev != heh {
                panic!(
                    "bug: [{:?}].next = {:?}, but [{:?}].prev = {:?}",
                    heh, he.next, he.next, self.half_edges[he.next].prev,
                );
            }
            if self.half_edges[he.prev].next != heh {
                panic!(
                    "bug: [{:?}].prev = {:?}, but [{:?}].next = {:?}",
                    heh, he.prev, he.prev, self.half_edges[he.prev].next,
                );
            }
            // Cycles are homogeneous: a triangle cycle stays within its
            // triangle, a boundary cycle within the boundary.
            if self.half_edges[he.next].triangle != he.triangle {
                panic!(
                    "bug: [{:?}].triangle = {:?}, but its next ({:?}) has triangle {:?}",
                    heh, he.triangle, he.next, self.half_edges[he.next].triangle,
                );
            }
            // `next` continues where this half edge ends.
            if self.half_edges[he.next].start != self.end_of(heh) {
                panic!(
                    "bug: [{:?}] ends at {:?}, but its next ({:?}) starts at {:?}",
                    heh, self.end_of(heh), he.next, self.half_edges[he.next].start,
                );
            }
        }

        // Check triangles.
        for th in self.triangles.handles() {
            let tri = &self.triangles[th];
            if !self.half_edges.contains(tri.half_edge) {
                panic!(
                    "bug (broken reference): [{:?}].half_edge = {:?}, but that half edge \
                        does not exist!",
                    th, tri.half_edge,
                );
            }

            let e0 = tri.half_edge;
            let e1 = self.half_edges[e0].next;
            let e2 = self.half_edges[e1].next;
            if self.half_edges[e2].next != e0 {
                panic!(
                    "bug: walking `next` from [{:?}].half_edge = {:?} does not return \
                        after three steps",
                    th, e0,
                );
            }
            for &e in &[e0, e1, e2] {
                if self.half_edges[e].triangle != Opt::some(th) {
                    panic!(
                        "bug: {:?} is in the cycle of {:?}, but carries triangle {:?}",
                        e, th, self.half_edges[e].triangle,
                    );
                }
            }

            // The stored vertex order matches the cycle, up to rotation
            // anchored at the entry half edge.
            let starts = [
                self.half_edges[e0].start,
                self.half_edges[e1].start,
                self.half_edges[e2].start,
            ];
            if starts != tri.vertices {
                panic!(
                    "bug: [{:?}].vertices = {:?}, but its half edge cycle starts at {:?}",
                    th, tri.vertices, starts,
                );
            }
        }
    }
}

impl fmt::Debug for HalfEdgeMesh {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("HalfEdgeMesh")
            .field("vertices", &self.vertices)
            .field("triangles", &self.triangles)
            .field("half_edges", &self.half_edges)
            .field("has_normals", &self.has_normals)
            .finish()
    }
}

impl fmt::Debug for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Vertex {{ position: [{:.2}, {:.2}, {:.2}], outgoing: {:?} }}",
            self.position.x, self.position.y, self.position.z, self.outgoing,
        )
    }
}

impl fmt::Debug for HalfEdge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "HalfEdge {{ start: {:?}, next: {:?}, prev: {:?}, opposite: {:?}, triangle: {:?} }}",
            self.start, self.next, self.prev, self.opposite, self.triangle,
        )
    }
}

impl fmt::Debug for Triangle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Triangle {{ vertices: {:?}, half_edge: {:?} }}",
            self.vertices, self.half_edge,
        )
    }
}
