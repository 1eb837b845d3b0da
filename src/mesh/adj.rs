//! Iterators over adjacent elements: vertex rings and boundary cycles.

use fxhash::FxHashSet;

use crate::handle::{Handle, HalfEdgeHandle, VertexHandle};
use super::HalfEdgeMesh;


/// Iterator over all outgoing half edges of one vertex, in clockwise order.
///
/// Rotating around a vertex means repeatedly stepping to `prev.opposite` of
/// the current outgoing half edge. The walk is a finite cycle for every
/// vertex of a manifold mesh: on the boundary, the step crosses the
/// vertex's gap via the boundary cycle links instead of getting stuck
/// there. Termination does not depend on where the walk starts, but the
/// mesh starts it at the vertex's `outgoing` anchor.
#[derive(Debug, Clone)]
pub struct IncidentHalfEdges<'a> {
    mesh: &'a HalfEdgeMesh,
    start: HalfEdgeHandle,
    next: Option<HalfEdgeHandle>,
}

impl<'a> IncidentHalfEdges<'a> {
    pub(crate) fn new(mesh: &'a HalfEdgeMesh, v: VertexHandle) -> Self {
        match mesh.vertices[v].outgoing.into_option() {
            None => Self {
                mesh,
                start: HalfEdgeHandle::new(0),
                next: None,
            },
            Some(start) => Self {
                mesh,
                start,
                next: Some(start),
            },
        }
    }
}

impl Iterator for IncidentHalfEdges<'_> {
    type Item = HalfEdgeHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let out = self.next?;
        let after = self.mesh.next_outgoing_around(out);
        self.next = if after == self.start { None } else { Some(after) };

        Some(out)
    }
}


/// Iterator over all boundary half edges of a mesh, yielding the
/// `(start, end)` vertex pair of each.
///
/// The half edges of one boundary cycle are yielded consecutively (walking
/// `next`), and cycles are visited until no unvisited boundary half edge
/// remains. Every boundary half edge is visited exactly once, so this
/// terminates on any finite mesh.
#[derive(Debug)]
pub struct BoundaryEdges<'a> {
    mesh: &'a HalfEdgeMesh,
    visited: FxHashSet<HalfEdgeHandle>,
    current: Option<HalfEdgeHandle>,

    /// Scan position for finding the start of the next cycle. Half edge
    /// indices below this are either visited or known to be interior.
    scan: usize,
}

impl<'a> BoundaryEdges<'a> {
    pub(crate) fn new(mesh: &'a HalfEdgeMesh) -> Self {
        Self {
            mesh,
            visited: FxHashSet::default(),
            current: None,
            scan: 0,
        }
    }

    /// Finds an unvisited boundary half edge, advancing the scan cursor.
    fn next_cycle_start(&mut self) -> Option<HalfEdgeHandle> {
        let end = self.mesh.half_edges.next_push_handle().to_usize();
        while self.scan < end {
            let heh = HalfEdgeHandle::from_usize(self.scan);
            self.scan += 1;

            if self.mesh.half_edges.contains(heh)
                && self.mesh.half_edges[heh].triangle.is_none()
                && !self.visited.contains(&heh)
            {
                return Some(heh);
            }
        }

        None
    }
}

impl Iterator for BoundaryEdges<'_> {
    type Item = (VertexHandle, VertexHandle);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let heh = match self.current.take() {
                Some(heh) => heh,
                None => self.next_cycle_start()?,
            };

            if self.visited.contains(&heh) {
                // Cycle closed; look for the next one.
                continue;
            }

            self.visited.insert(heh);
            self.visited.insert(self.mesh.half_edges[heh].opposite);
            self.current = Some(self.mesh.half_edges[heh].next);

            let he = &self.mesh.half_edges[heh];
            return Some((he.start, self.mesh.end_of(heh)));
        }
    }
}
