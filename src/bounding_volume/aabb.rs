//! Axis Aligned Bounding Box.

use crate::math::{Point, Real, Vector, DIM};
use num::Bounded;

/// An Axis-Aligned Bounding Box (AABB) with floating-point corners.
///
/// In this crate AABBs describe the index-space extent of grid nodes and voxels, as well as
/// the object-space bounds of a volume.
///
/// # Example
///
/// ```rust
/// use vdbtrace::bounding_volume::Aabb;
/// use vdbtrace::math::Point;
///
/// let aabb = Aabb::new(Point::new(0.0, 0.0, 0.0), Point::new(8.0, 8.0, 8.0));
/// assert!(!aabb.is_empty());
/// assert_eq!(aabb.extents().x, 8.0);
/// ```
#[derive(Debug, PartialEq, Copy, Clone)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// The point with the smallest coordinates.
    pub mins: Point<Real>,
    /// The point with the largest coordinates.
    pub maxs: Point<Real>,
}

impl Aabb {
    /// Creates a new AABB.
    #[inline]
    pub fn new(mins: Point<Real>, maxs: Point<Real>) -> Aabb {
        Aabb { mins, maxs }
    }

    /// Creates an invalid AABB with inverted bounds.
    ///
    /// Useful as the initial value of a merge.
    #[inline]
    pub fn new_invalid() -> Self {
        Self::new(
            Vector::repeat(Real::max_value()).into(),
            Vector::repeat(-Real::max_value()).into(),
        )
    }

    /// The smallest AABB containing all the given points.
    pub fn from_points<'a>(pts: impl IntoIterator<Item = &'a Point<Real>>) -> Self {
        let mut result = Self::new_invalid();
        for pt in pts {
            result.take_point(*pt);
        }
        result
    }

    /// Enlarges this AABB so it also contains the point `pt`.
    pub fn take_point(&mut self, pt: Point<Real>) {
        self.mins = self.mins.coords.inf(&pt.coords).into();
        self.maxs = self.maxs.coords.sup(&pt.coords).into();
    }

    /// Does this AABB have inverted bounds on at least one axis?
    #[inline]
    pub fn is_empty(&self) -> bool {
        (0..DIM).any(|i| !(self.mins[i] <= self.maxs[i]))
    }

    /// The extents of this AABB.
    #[inline]
    pub fn extents(&self) -> Vector<Real> {
        self.maxs - self.mins
    }

    /// The eight corners of this AABB.
    pub fn vertices(&self) -> [Point<Real>; 8] {
        let (a, b) = (self.mins, self.maxs);
        [
            Point::new(a.x, a.y, a.z),
            Point::new(b.x, a.y, a.z),
            Point::new(a.x, b.y, a.z),
            Point::new(b.x, b.y, a.z),
            Point::new(a.x, a.y, b.z),
            Point::new(b.x, a.y, b.z),
            Point::new(a.x, b.y, b.z),
            Point::new(b.x, b.y, b.z),
        ]
    }

    /// Computes the parameters of the two intersection points between a line and this AABB.
    ///
    /// The parameters are such that the point are given by `orig + dir * parameter`.
    /// Returns `None` if there is no intersection.
    pub fn clip_line_parameters(
        &self,
        orig: &Point<Real>,
        dir: &Vector<Real>,
    ) -> Option<(Real, Real)> {
        let mut tmax: Real = Bounded::max_value();
        let mut tmin: Real = -tmax;

        for i in 0usize..DIM {
            if dir[i] == 0.0 {
                if orig[i] < self.mins[i] || orig[i] > self.maxs[i] {
                    return None;
                }
            } else {
                let denom = 1.0 / dir[i];
                let mut inter_with_near_halfspace = (self.mins[i] - orig[i]) * denom;
                let mut inter_with_far_halfspace = (self.maxs[i] - orig[i]) * denom;

                if inter_with_near_halfspace > inter_with_far_halfspace {
                    core::mem::swap(
                        &mut inter_with_near_halfspace,
                        &mut inter_with_far_halfspace,
                    )
                }

                tmin = tmin.max(inter_with_near_halfspace);
                tmax = tmax.min(inter_with_far_halfspace);

                if tmin > tmax {
                    return None;
                }
            }
        }

        Some((tmin, tmax))
    }

    /// The parameter at which a line leaves this AABB.
    ///
    /// Only the far slab of each axis is considered, so this is meaningful when the line
    /// is known to be inside the box at some parameter. Axes with a zero direction
    /// component never bound the result.
    #[inline]
    pub fn exit_parameter(&self, orig: &Point<Real>, dir: &Vector<Real>) -> Real {
        let mut tmax = Real::max_value();

        for i in 0..DIM {
            if dir[i] > 0.0 {
                tmax = tmax.min((self.maxs[i] - orig[i]) / dir[i]);
            } else if dir[i] < 0.0 {
                tmax = tmax.min((self.mins[i] - orig[i]) / dir[i]);
            }
        }

        tmax
    }
}
