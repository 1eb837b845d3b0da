//! Small geometry helpers on top of `cgmath`.
//!
//! The mesh stores positions as `cgmath::Point3<f64>` and directions as
//! `cgmath::Vector3<f64>`; everything cgmath already does well (arithmetic,
//! dot, cross, lengths) is used directly. This module only adds the handful
//! of operations the mesh code needs on top, most of which have "degenerate
//! input is fine" semantics instead of NaN propagation: generator code feeds
//! us plenty of almost-zero vectors and expects them to be tolerated.

use cgmath::{InnerSpace, Vector3};


/// Tolerance for "do these two vectors point the same way" comparisons.
///
/// Applied to the squared length of the difference of the two vectors, so
/// the corresponding per-component tolerance is in the order of 1e-2. That
/// is deliberately coarse: it is used to merge normals of coplanar triangles
/// coming out of grid generators, not to compare arbitrary geometry.
pub const DIRECTION_EPS_SQ: f64 = 1e-3;


/// Extension methods for `Vector3<f64>`.
pub trait VectorExt: Sized {
    /// Divides by `divisor`, returning the zero vector if `divisor` is zero.
    fn try_div(self, divisor: f64) -> Self;

    /// Returns this vector scaled to length 1.
    ///
    /// The zero vector is returned unchanged, and a vector that already has
    /// length 1 is passed through without touching its components.
    fn normalized(self) -> Self;

    /// Returns the angle between `self` and `other` in radians, in
    /// `[0, π]`. Returns 0 if either vector has length zero.
    fn angle_to(self, other: Self) -> f64;

    /// Returns the component of `self` parallel to `other`.
    fn project_onto_vector(self, other: Self) -> Self;

    /// Returns `self` with its component along `normal` removed, i.e. the
    /// projection onto the plane through the origin with the given normal.
    fn project_onto_plane(self, normal: Self) -> Self;

    /// Reflects `self` across the plane with the given normal.
    fn reflect_across(self, normal: Self) -> Self;

    /// Whether `self` and `other` point in (approximately) the same
    /// direction, within [`DIRECTION_EPS_SQ`].
    fn approx_direction_eq(self, other: Self) -> bool;
}

impl VectorExt for Vector3<f64> {
    fn try_div(self, divisor: f64) -> Self {
        if divisor == 0.0 {
            return Vector3::new(0.0, 0.0, 0.0);
        }

        self / divisor
    }

    fn normalized(self) -> Self {
        let len_sq = self.magnitude2();
        if len_sq == 0.0 || len_sq == 1.0 {
            return self;
        }

        self / len_sq.sqrt()
    }

    fn angle_to(self, other: Self) -> f64 {
        let denom = self.magnitude() * other.magnitude();
        if denom == 0.0 {
            return 0.0;
        }

        // Clamp against rounding: `dot / denom` can end up a hair outside
        // [-1, 1] for (anti)parallel vectors, which would make `acos` NaN.
        (self.dot(other) / denom).max(-1.0).min(1.0).acos()
    }

    fn project_onto_vector(self, other: Self) -> Self {
        let dir = other.normalized();
        dir * self.dot(dir)
    }

    fn project_onto_plane(self, normal: Self) -> Self {
        self - self.project_onto_vector(normal)
    }

    fn reflect_across(self, normal: Self) -> Self {
        self - self.project_onto_vector(normal) * 2.0
    }

    fn approx_direction_eq(self, other: Self) -> bool {
        (self - other).magnitude2() < DIRECTION_EPS_SQ
    }
}


#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use cgmath::vec3;
    use std::f64::consts::{FRAC_PI_2, PI};

    use super::*;

    #[test]
    fn try_div_zero_divisor() {
        assert_eq!(vec3(1.0, 2.0, 3.0).try_div(0.0), vec3(0.0, 0.0, 0.0));
        assert_eq!(vec3(1.0, 2.0, 4.0).try_div(2.0), vec3(0.5, 1.0, 2.0));
    }

    #[test]
    fn normalized_is_idempotent() {
        let v = vec3(3.0, 0.0, 4.0).normalized();
        assert_relative_eq!(v.magnitude(), 1.0);

        // Already normalized vectors pass through bit-identical.
        assert_eq!(v.normalized(), v);
        let unit = vec3(0.0, 1.0, 0.0);
        assert_eq!(unit.normalized(), unit);
    }

    #[test]
    fn normalized_zero_stays_zero() {
        let zero = vec3(0.0, 0.0, 0.0);
        assert_eq!(zero.normalized(), zero);
    }

    #[test]
    fn angles() {
        assert_relative_eq!(vec3(1.0, 0.0, 0.0).angle_to(vec3(0.0, 1.0, 0.0)), FRAC_PI_2);
        assert_relative_eq!(vec3(1.0, 0.0, 0.0).angle_to(vec3(-2.0, 0.0, 0.0)), PI);
        assert_relative_eq!(vec3(1.0, 1.0, 0.0).angle_to(vec3(3.0, 3.0, 0.0)), 0.0);

        // Degenerate input does not produce NaN.
        assert_eq!(vec3(0.0, 0.0, 0.0).angle_to(vec3(1.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn projections() {
        let v = vec3(1.0, 2.0, 0.0);
        assert_relative_eq!(v.project_onto_vector(vec3(5.0, 0.0, 0.0)), vec3(1.0, 0.0, 0.0));
        assert_relative_eq!(v.project_onto_plane(vec3(0.0, 1.0, 0.0)), vec3(1.0, 0.0, 0.0));
    }

    #[test]
    fn reflection() {
        let v = vec3(1.0, -1.0, 0.0);
        assert_relative_eq!(v.reflect_across(vec3(0.0, 1.0, 0.0)), vec3(1.0, 1.0, 0.0));
    }

    #[test]
    fn direction_comparison_is_fuzzy() {
        let a = vec3(0.0, 0.0, 1.0);
        assert!(a.approx_direction_eq(vec3(0.0, 1e-4, 1.0)));
        assert!(!a.approx_direction_eq(vec3(0.0, 1.0, 0.0)));
    }
}
