use crate::math::Real;

/// A closed range `[lower, upper]` of scalars.
///
/// This is used both for the value bounds stored in every grid voxel and for the
/// parametric ranges along rays. A range with `lower > upper` is empty; the canonical empty
/// range is `[+inf, -inf]` so that extending it by any value yields that value.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ValueRange {
    /// The smallest value of the range.
    pub lower: Real,
    /// The largest value of the range.
    pub upper: Real,
}

impl Default for ValueRange {
    fn default() -> Self {
        Self::empty()
    }
}

impl ValueRange {
    /// Create the range `[lower, upper]`.
    #[inline]
    pub const fn new(lower: Real, upper: Real) -> Self {
        Self { lower, upper }
    }

    /// The empty range `[+inf, -inf]`.
    #[inline]
    pub const fn empty() -> Self {
        Self::new(Real::INFINITY, Real::NEG_INFINITY)
    }

    /// Create the range `[e, e]` (single value).
    #[must_use]
    pub const fn splat(e: Real) -> Self {
        Self::new(e, e)
    }

    /// Is this range empty?
    ///
    /// NaN bounds make a range empty too.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.lower <= self.upper)
    }

    /// Does this range contain the given value?
    #[inline]
    #[must_use]
    pub fn contains(&self, t: Real) -> bool {
        self.lower <= t && self.upper >= t
    }

    /// The width of this range, zero if it is empty.
    #[must_use]
    pub fn width(self) -> Real {
        if self.is_empty() {
            0.0
        } else {
            self.upper - self.lower
        }
    }

    /// The average of the two range endpoints.
    #[must_use]
    pub fn midpoint(self) -> Real {
        (self.lower + self.upper) * 0.5
    }

    /// Grows this range so that it contains `t`.
    #[inline]
    pub fn extend(&mut self, t: Real) {
        self.lower = self.lower.min(t);
        self.upper = self.upper.max(t);
    }

    /// Grows this range so that it contains `other`.
    #[inline]
    pub fn extend_range(&mut self, other: &Self) {
        if !other.is_empty() {
            self.lower = self.lower.min(other.lower);
            self.upper = self.upper.max(other.upper);
        }
    }

    /// The smallest range containing both `self` and `other`.
    #[must_use]
    pub fn union(mut self, other: Self) -> Self {
        self.extend_range(&other);
        self
    }

    /// Computes the intersection between two ranges.
    ///
    /// Returns `None` if the ranges are disjoint.
    #[must_use]
    pub fn intersect(self, rhs: Self) -> Option<Self> {
        let result = Self::new(self.lower.max(rhs.lower), self.upper.min(rhs.upper));

        if result.is_empty() {
            None
        } else {
            Some(result)
        }
    }

    /// Do these two ranges share at least one value?
    #[inline]
    #[must_use]
    pub fn overlaps(&self, rhs: &Self) -> bool {
        self.lower <= rhs.upper && rhs.lower <= self.upper
    }

    /// Computes the range of all the values of `values`.
    ///
    /// NaN values are ignored.
    #[must_use]
    pub fn from_values(values: &[Real]) -> Self {
        // Four independent accumulators so the loop vectorizes.
        let mut lower = [Real::INFINITY; 4];
        let mut upper = [Real::NEG_INFINITY; 4];
        let mut chunks = values.chunks_exact(4);

        for chunk in &mut chunks {
            for k in 0..4 {
                lower[k] = lower[k].min(chunk[k]);
                upper[k] = upper[k].max(chunk[k]);
            }
        }

        let mut result = Self::new(
            lower[0].min(lower[1]).min(lower[2].min(lower[3])),
            upper[0].max(upper[1]).max(upper[2].max(upper[3])),
        );

        for v in chunks.remainder() {
            result.extend(*v);
        }

        result
    }
}

impl approx::AbsDiffEq for ValueRange {
    type Epsilon = Real;

    fn default_epsilon() -> Real {
        Real::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Real) -> bool {
        self.lower.abs_diff_eq(&other.lower, epsilon)
            && self.upper.abs_diff_eq(&other.upper, epsilon)
    }
}

impl approx::RelativeEq for ValueRange {
    fn default_max_relative() -> Real {
        Real::EPSILON
    }

    fn relative_eq(&self, other: &Self, epsilon: Real, max_relative: Real) -> bool {
        self.lower.relative_eq(&other.lower, epsilon, max_relative)
            && self.upper.relative_eq(&other.upper, epsilon, max_relative)
    }
}
