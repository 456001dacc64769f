use crate::bounding_volume::Aabb;
use crate::math::{IndexPoint, Point, Real, Vector3};

/// An integer box `[lower, upper)` of the index space of a grid.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct IndexBox {
    /// The smallest coordinates (inclusive).
    pub lower: IndexPoint,
    /// The largest coordinates (exclusive).
    pub upper: IndexPoint,
}

impl Default for IndexBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl IndexBox {
    /// Creates the box `[lower, upper)`.
    pub fn new(lower: IndexPoint, upper: IndexPoint) -> Self {
        Self { lower, upper }
    }

    /// A box containing nothing, neutral for [`Self::extend`].
    pub fn empty() -> Self {
        Self::new(
            IndexPoint::new(i32::MAX, i32::MAX, i32::MAX),
            IndexPoint::new(i32::MIN, i32::MIN, i32::MIN),
        )
    }

    /// Is this box empty on at least one axis?
    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.lower[i] >= self.upper[i])
    }

    /// Grows this box to contain the cube `[origin, origin + size)`.
    pub fn extend_cube(&mut self, origin: IndexPoint, size: i64) {
        for i in 0..3 {
            let hi = (origin[i] as i64 + size).min(i32::MAX as i64) as i32;
            self.lower[i] = self.lower[i].min(origin[i]);
            self.upper[i] = self.upper[i].max(hi);
        }
    }

    /// The size of this box along each axis; zero for empty axes.
    pub fn extents(&self) -> Vector3<i64> {
        Vector3::from_fn(|i, _| (self.upper[i] as i64 - self.lower[i] as i64).max(0))
    }

    /// The same box with floating-point corners.
    pub fn to_aabb(&self) -> Aabb {
        if self.is_empty() {
            return Aabb::new_invalid();
        }
        Aabb::new(
            Point::new(
                self.lower.x as Real,
                self.lower.y as Real,
                self.lower.z as Real,
            ),
            Point::new(
                self.upper.x as Real,
                self.upper.y as Real,
                self.upper.z as Real,
            ),
        )
    }
}
