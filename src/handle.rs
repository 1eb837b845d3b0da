//! Typed index handles used to refer to mesh elements.
//!
//! All elements of a [`HalfEdgeMesh`][crate::mesh::HalfEdgeMesh] live in flat
//! arrays and refer to one another by index. To avoid mixing up the index
//! spaces of vertices, triangles and half edges, each one gets its own
//! newtype handle. A handle is `Copy`, compares cheaply and prints compactly
//! (`V3`, `T0`, `HE17`).
//!
//! "No such element" is *not* part of a handle's value range. Where an
//! optional reference is needed, handles are wrapped in
//! [`optional::Optioned`], which uses `hsize::max_value()` as the niche.
//! This is why [`Handle::from_usize`] rejects that value.

use std::fmt;


/// The integer type underlying all handles.
///
/// By default this is `u32`, which keeps the hot connectivity records small
/// and is plenty for meshes with up to ~4 billion half edges. Enable the
/// `large-handle` feature to switch to `u64`.
#[allow(non_camel_case_types)]
#[cfg(not(feature = "large-handle"))]
pub type hsize = u32;

/// The integer type underlying all handles (`large-handle` version).
#[allow(non_camel_case_types)]
#[cfg(feature = "large-handle")]
pub type hsize = u64;


/// Types that are used to refer to a mesh element.
pub trait Handle: 'static + Copy + fmt::Debug + Eq + Ord + std::hash::Hash {
    /// Creates a handle from the given index.
    fn new(idx: hsize) -> Self;

    /// Returns the index of the current handle.
    fn idx(&self) -> hsize;

    /// Helper to create a handle from a `usize`. Panics if the value does not
    /// fit into `hsize` or collides with the "none" niche.
    #[inline(always)]
    fn from_usize(raw: usize) -> Self {
        assert!(
            raw < hsize::max_value() as usize,
            "handle index {} out of range",
            raw,
        );
        Self::new(raw as hsize)
    }

    /// Helper to get the handle's index as `usize`.
    #[inline(always)]
    fn to_usize(&self) -> usize {
        self.idx() as usize
    }
}

macro_rules! make_handle_type {
    ($(#[$attr:meta])* $name:ident = $short:expr) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(hsize);

        impl Handle for $name {
            #[inline(always)]
            fn new(id: hsize) -> Self {
                $name(id)
            }

            #[inline(always)]
            fn idx(&self) -> hsize {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, concat!($short, "{}"), self.0)
            }
        }

        // These two impls let a handle be stored inside `optional::Optioned`,
        // with `hsize::max_value()` as the "none" value. This mirrors the
        // `-1` sentinel commonly used in index based mesh representations,
        // without spending an extra discriminant byte per link.
        impl optional::Noned for $name {
            #[inline(always)]
            fn is_none(&self) -> bool {
                self.0 == hsize::max_value()
            }

            #[inline(always)]
            fn get_none() -> Self {
                $name(hsize::max_value())
            }
        }

        impl optional::OptEq for $name {
            #[inline(always)]
            fn opt_eq(&self, other: &Self) -> bool {
                self == other
            }
        }
    }
}

make_handle_type!(
    /// A handle referring to a vertex.
    VertexHandle = "V"
);
make_handle_type!(
    /// A handle referring to a triangle.
    TriangleHandle = "T"
);
make_handle_type!(
    /// A handle referring to a half edge.
    HalfEdgeHandle = "HE"
);

// The whole point of the `Optioned` wrapper is that an optional link costs
// exactly as much as a mandatory one.
static_assertions::assert_eq_size!(optional::Optioned<VertexHandle>, VertexHandle);
static_assertions::assert_eq_size!(optional::Optioned<HalfEdgeHandle>, HalfEdgeHandle);


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_repr() {
        assert_eq!(format!("{:?}", VertexHandle::new(3)), "V3");
        assert_eq!(format!("{:?}", TriangleHandle::new(0)), "T0");
        assert_eq!(format!("{:?}", HalfEdgeHandle::new(17)), "HE17");
    }

    #[test]
    fn usize_round_trip() {
        let h = HalfEdgeHandle::from_usize(42);
        assert_eq!(h.to_usize(), 42);
        assert_eq!(h, HalfEdgeHandle::new(42));
    }

    #[test]
    #[should_panic]
    fn from_usize_rejects_niche() {
        VertexHandle::from_usize(hsize::max_value() as usize);
    }
}
