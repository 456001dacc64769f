use crate::bounding_volume::IndexBox;
use crate::grid::{Filter, Grid};
use crate::math::{Real, Vector};
use crate::query::{IntervalIterator, IteratorState, Ray, ValueSelector};
use crate::utils::{self, ValueRange};
use arrayvec::ArrayVec;

/// Upper bound, in bytes, of the size of a [`HitIterator`].
pub const HIT_ITERATOR_MAX_SIZE: usize = 1024;

/// The default parametric tolerance of hit locations.
pub const DEFAULT_HIT_EPSILON: Real = 1.0e-4;

static_assertions::const_assert!(
    size_of::<HitIterator<'static>>() <= HIT_ITERATOR_MAX_SIZE
);

/// A point where a ray crosses an isovalue.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Hit {
    /// The ray parameter of the crossing.
    pub t: Real,
    /// The isovalue that was crossed.
    pub sample: Real,
    /// Half the width of the parametric range known to contain the crossing.
    pub epsilon: Real,
}

/// Finds the crossings of a set of isovalues along a ray, in increasing order.
///
/// The ray is split into the voxels reported by an [`IntervalIterator`], empty ones
/// included. A section of the ray is only searched if the cells its samples read may hold
/// an isovalue, background included: with trilinear filtering, the field one index unit
/// before a leaf already depends on it. Searched sections are marched with a fixed step;
/// the first sign change of `sample - isovalue` is then refined by bisection.
///
/// # Example
///
/// ```
/// use vdbtrace::grid::{DataBuffer, GridBuilder, GridLayout};
/// use vdbtrace::math::{Point, Vector};
/// use vdbtrace::query::{HitIterator, Ray, ValueSelector};
/// use vdbtrace::utils::ValueRange;
///
/// // One dense 4x4x4 leaf holding the x coordinate of each voxel.
/// let values: Vec<f32> = (0..64).map(|i| (i >> 4) as f32).collect();
/// let grid = GridBuilder::new(GridLayout::new([2, 2, 2, 2]).unwrap())
///     .build(&[3], &[[0, 0, 0]], &[1], &[DataBuffer::from(values)])
///     .unwrap();
///
/// let ray = Ray::new(Point::new(-1.0, 1.5, 1.5), Vector::x());
/// let isovalues = ValueSelector::from_values([1.5]);
/// let hits: Vec<_> =
///     HitIterator::new(&grid, &ray, ValueRange::new(0.0, 100.0), &isovalues).collect();
///
/// assert!((hits[0].t - 2.5).abs() < 1.0e-3);
/// ```
#[derive(Clone, Debug)]
pub struct HitIterator<'a> {
    intervals: IntervalIterator<'a>,
    isovalues: &'a [Real],
    filter: Filter,
    step_scale: Real,
    hit_epsilon: Real,
    // The ray in index space, and the parametric length of one index unit along it.
    ray: Ray,
    delta_t: Real,
    // Sections of the ray left to check, the last one first.
    pending: ArrayVec<ValueRange, 2>,
    // The section after the last voxel, where the field still reads the grid.
    lead_out: Option<ValueRange>,
    // The section being marched, and the parameter the march resumes from.
    current: Option<ValueRange>,
    t: Real,
    last_hit_t: Real,
    exhausted: bool,
}

impl<'a> HitIterator<'a> {
    /// An iterator over the crossings of `selector`'s values by the object-space `ray` with
    /// parameters in `t_range`.
    pub fn new(
        grid: &'a Grid,
        ray: &Ray,
        t_range: ValueRange,
        selector: &'a ValueSelector,
    ) -> Self {
        let intervals = IntervalIterator::new(grid, ray, t_range, None);
        let isovalues = selector.values();
        let index_ray = ray.transform_by(grid.object_to_index());
        let mut pending = ArrayVec::new();
        let mut lead_out = None;

        let exhausted = isovalues.is_empty()
            || grid.is_empty()
            || ray.is_degenerate()
            || index_ray.is_degenerate();

        if !exhausted {
            // Trilinear samples up to one unit below the lowest cell read it.
            let mut shell = grid.index_bounds().to_aabb();
            shell.mins -= Vector::repeat(1.0);

            if let Some((t0, t1)) = shell.clip_line_parameters(&index_ray.origin, &index_ray.dir)
            {
                let outer = ValueRange::new(t0.max(t_range.lower), t1.min(t_range.upper));
                match intervals.clipped_t_range() {
                    Some(inner) => {
                        lead_out = Some(ValueRange::new(inner.upper, outer.upper));
                        pending.push(ValueRange::new(outer.lower, inner.lower));
                    }
                    None => pending.push(outer),
                }
            }
        }

        Self {
            intervals,
            isovalues,
            filter: Filter::default(),
            step_scale: 1.0,
            hit_epsilon: DEFAULT_HIT_EPSILON,
            ray: index_ray,
            delta_t: 1.0 / index_ray.dir.norm(),
            pending,
            lead_out,
            current: None,
            t: 0.0,
            last_hit_t: Real::NEG_INFINITY,
            exhausted,
        }
    }

    /// Sets the filter used to sample the grid.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the marching step, relative to the parametric size of one index unit.
    ///
    /// Crossings closer to each other than one step may be missed.
    pub fn with_step_scale(mut self, step_scale: Real) -> Self {
        self.step_scale = step_scale;
        self
    }

    /// Sets the parametric tolerance of hit locations.
    pub fn with_hit_epsilon(mut self, hit_epsilon: Real) -> Self {
        self.hit_epsilon = hit_epsilon;
        self
    }

    /// The state of the search.
    pub fn state(&self) -> IteratorState {
        if self.exhausted {
            IteratorState::Exhausted
        } else {
            IteratorState::Active
        }
    }

    #[inline]
    fn epsilon(&self, t: Real) -> Real {
        self.hit_epsilon.max(4.0 * Real::EPSILON * t.abs())
    }

    #[inline]
    fn sample(&self, t: Real) -> Real {
        let pt = self.ray.point_at(t);
        self.intervals.grid().sample_index(&pt, self.filter)
    }

    /// Splits the next voxel along the ray into the sections that may differ from the
    /// background, or takes the lead-out once voxels are exhausted.
    fn advance_span(&mut self) -> bool {
        let Some(span) = self.intervals.next_span() else {
            let Some(lead_out) = self.lead_out.take() else {
                return false;
            };
            self.pending.push(lead_out);
            return true;
        };
        let t_range = span.interval.t_range;

        if !span.empty {
            self.pending.push(t_range);
            return true;
        }

        // Samples farther than one unit from the upper faces of an empty voxel only read
        // its own cells.
        let (mut inner_lower, mut inner_upper) = (Real::NEG_INFINITY, Real::INFINITY);
        for i in 0..3 {
            let (o, d) = (self.ray.origin[i], self.ray.dir[i]);
            let face = (span.cells.upper[i] as Real - 1.0 - o) / d;
            if d > 0.0 {
                inner_upper = inner_upper.min(face);
            } else if d < 0.0 {
                inner_lower = inner_lower.max(face);
            } else if o >= span.cells.upper[i] as Real - 1.0 {
                inner_upper = Real::NEG_INFINITY;
            }
        }

        let eps = self.epsilon(t_range.lower).max(self.epsilon(t_range.upper));
        let lower = t_range.lower.max(inner_lower + eps);
        let upper = t_range.upper.min(inner_upper - eps);
        if lower < upper {
            self.pending.push(ValueRange::new(upper, t_range.upper));
            self.pending.push(ValueRange::new(t_range.lower, lower));
        } else {
            self.pending.push(t_range);
        }

        true
    }

    /// Bounds on the values sampled between `section.lower` and `section.upper`.
    fn sampled_range(&self, section: &ValueRange) -> ValueRange {
        let a = self.ray.point_at(section.lower);
        let b = self.ray.point_at(section.upper);
        let lower = a.coords.inf(&b.coords).map(|x| x.floor() as i32);
        let upper = a.coords.sup(&b.coords).map(|x| (x.floor() as i32).saturating_add(2));
        self.intervals
            .grid()
            .value_range_in(&IndexBox::new(lower.into(), upper.into()))
    }

    /// Marches `[self.t, section.upper]` looking for the first crossing.
    fn search(&mut self, section: &ValueRange) -> Option<Hit> {
        let t_end = section.upper;
        let step = (self.delta_t * self.step_scale).max(self.epsilon(t_end));

        let mut t0 = self.t;
        let mut f0 = self.sample(t0);

        while t0 < t_end {
            let t1 = (t0 + step).min(t_end);
            let f1 = self.sample(t1);
            let mut best: Option<(ValueRange, Real)> = None;

            for iso in self.isovalues {
                let fa = f0 - iso;
                let fb = f1 - iso;

                if fa != 0.0 && utils::brackets_zero(fa, fb) {
                    let bracket = utils::bisect_root(
                        |t| self.sample(t) - iso,
                        t0,
                        fa,
                        t1,
                        self.hit_epsilon,
                        utils::DEFAULT_MAX_BISECTIONS,
                    );

                    let closer = match best {
                        Some((b, _)) => bracket.midpoint() < b.midpoint(),
                        None => true,
                    };
                    if closer {
                        best = Some((bracket, *iso));
                    }
                }
            }

            if let Some((bracket, iso)) = best {
                let t = bracket.midpoint();
                if t > self.last_hit_t {
                    self.last_hit_t = t;
                    self.t = t + self.epsilon(t);
                    return Some(Hit {
                        t,
                        sample: iso,
                        epsilon: (bracket.width() * 0.5).max(self.epsilon(t)),
                    });
                }
            }

            t0 = t1;
            f0 = f1;
        }

        None
    }

    /// Reports the next crossing along the ray.
    ///
    /// Returns `None` once the whole ray was searched, and on every call after that.
    pub fn next_hit(&mut self) -> Option<Hit> {
        while !self.exhausted {
            if let Some(section) = self.current {
                if let Some(hit) = self.search(&section) {
                    if self.t >= section.upper {
                        self.current = None;
                    }
                    return Some(hit);
                }
                self.current = None;
                continue;
            }

            if let Some(section) = self.pending.pop() {
                let range = self.sampled_range(&section);
                if section.lower < section.upper
                    && self.isovalues.iter().any(|v| range.contains(*v))
                {
                    let resume = self.last_hit_t + self.epsilon(self.last_hit_t);
                    self.t = section.lower.max(resume);
                    if self.t < section.upper {
                        self.current = Some(section);
                    }
                }
                continue;
            }

            if !self.advance_span() {
                self.exhausted = true;
            }
        }

        None
    }
}

impl Iterator for HitIterator<'_> {
    type Item = Hit;

    #[inline]
    fn next(&mut self) -> Option<Hit> {
        self.next_hit()
    }
}

impl core::iter::FusedIterator for HitIterator<'_> {}
