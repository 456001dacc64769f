//! Rays traced through a volume.

use crate::math::{AffineTransform, Point, Real, Vector};

/// A ray for volume traversal queries.
///
/// Points along the ray are `origin + dir * t`. The direction does not need to be
/// normalized: all the parameters returned by the iterators of this crate are expressed
/// in units of `dir`.
///
/// # Example
///
/// ```rust
/// use vdbtrace::query::Ray;
/// use vdbtrace::math::{Point, Vector};
///
/// let ray = Ray::new(Point::origin(), Vector::new(2.0, 0.0, 0.0));
/// assert_eq!(ray.point_at(1.5), Point::new(3.0, 0.0, 0.0));
/// assert!(!ray.is_degenerate());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[repr(C)]
pub struct Ray {
    /// Starting point of the ray.
    pub origin: Point<Real>,
    /// Direction vector of the ray.
    pub dir: Vector<Real>,
}

impl Ray {
    /// Creates a new ray from an origin point and direction vector.
    pub fn new(origin: Point<Real>, dir: Vector<Real>) -> Ray {
        Ray { origin, dir }
    }

    /// Transforms this ray by the given affine transform.
    ///
    /// The parameterization is preserved: `xf(self.point_at(t)) == result.point_at(t)`.
    #[inline]
    pub fn transform_by(&self, xf: &AffineTransform) -> Self {
        Self::new(xf.transform_point(&self.origin), xf.transform_vector(&self.dir))
    }

    /// Computes a point along the ray at parameter `t`.
    #[inline]
    pub fn point_at(&self, t: Real) -> Point<Real> {
        self.origin + self.dir * t
    }

    /// Does this ray have a zero or non-finite direction, or a non-finite origin?
    ///
    /// Traversals of degenerate rays produce nothing.
    pub fn is_degenerate(&self) -> bool {
        self.dir == Vector::zeros()
            || self.dir.iter().any(|c| !c.is_finite())
            || self.origin.iter().any(|c| !c.is_finite())
    }
}
