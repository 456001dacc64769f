use crate::bounding_volume::IndexBox;
use crate::grid::{Grid, Voxel, NUM_LEVELS};
use crate::math::{IndexPoint, Offset, Point, Real};
use crate::query::{Ray, ValueSelector};
use crate::utils::ValueRange;
use arrayvec::ArrayVec;
use core::sync::atomic::Ordering;

/// Upper bound, in bytes, of the size of an [`IntervalIterator`].
pub const INTERVAL_ITERATOR_MAX_SIZE: usize = 512;

static_assertions::const_assert!(
    size_of::<IntervalIterator<'static>>() <= INTERVAL_ITERATOR_MAX_SIZE
);

/// A contiguous section of a ray with bounds of the values it crosses.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Interval {
    /// The half-open parametric range `[lower, upper)` of the ray covered by this interval.
    pub t_range: ValueRange,
    /// Bounds of every value the ray may cross in this interval.
    pub value_range: ValueRange,
    /// The parametric length of one index-space unit along the ray.
    pub nominal_delta_t: Real,
    /// The level of the voxel this interval was generated from.
    pub depth: usize,
}

/// The lifecycle of a ray traversal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IteratorState {
    /// No ray was given yet.
    Uninitialized,
    /// The traversal has more intervals to report.
    Active,
    /// The ray left the grid. Nothing will be reported anymore.
    Exhausted,
}

/// A voxel crossed by a ray.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Span {
    pub interval: Interval,
    /// The index-space cells of the voxel.
    pub cells: IndexBox,
    pub empty: bool,
}

#[derive(Copy, Clone, Debug)]
struct Frame {
    level: usize,
    node: u32,
    // The offset of the lower corner of the node.
    origin: Offset,
}

/// Walks the non-empty voxels of a grid crossed by a ray, in front-to-back order.
///
/// This is a hierarchical DDA: the iterator keeps the chain of nodes containing the current
/// position on a fixed-size stack, pops the nodes the ray left, and descends through child
/// pointers down to [`Grid::max_iterator_depth`]. Empty voxels are skipped at the
/// coarsest level they appear on. Each other voxel yields one [`Interval`].
///
/// The iterator never allocates, and reports intervals one at a time so that a
/// traversal can be abandoned at any point.
///
/// # Example
///
/// ```
/// use vdbtrace::grid::{DataBuffer, GridBuilder, GridLayout};
/// use vdbtrace::math::{Point, Vector};
/// use vdbtrace::query::{IntervalIterator, Ray};
/// use vdbtrace::utils::ValueRange;
///
/// let layout = GridLayout::new([2, 2, 2, 2]).unwrap();
/// let grid = GridBuilder::new(layout)
///     .build(&[2], &[[0, 0, 0]], &[0], &[DataBuffer::constant(0.5)])
///     .unwrap();
///
/// let ray = Ray::new(Point::new(-1.0, 1.0, 1.0), Vector::x());
/// let intervals: Vec<_> =
///     IntervalIterator::new(&grid, &ray, ValueRange::new(0.0, 100.0), None).collect();
///
/// assert_eq!(intervals.len(), 1);
/// assert_eq!(intervals[0].t_range, ValueRange::new(1.0, 17.0));
/// ```
#[derive(Clone, Debug)]
pub struct IntervalIterator<'a> {
    grid: &'a Grid,
    selector: Option<&'a ValueSelector>,
    // The ray, in index space.
    ray: Ray,
    t: Real,
    t_end: Real,
    // The cell containing the ray right after `t`.
    cell: [i64; 3],
    nominal_delta_t: Real,
    state: IteratorState,
    stack: ArrayVec<Frame, NUM_LEVELS>,
}

impl<'a> IntervalIterator<'a> {
    /// An iterator over `grid` that has no ray yet.
    pub fn uninitialized(grid: &'a Grid) -> Self {
        Self {
            grid,
            selector: None,
            ray: Ray::new(Point::origin(), na::zero()),
            t: 0.0,
            t_end: 0.0,
            cell: [0; 3],
            nominal_delta_t: 0.0,
            state: IteratorState::Uninitialized,
            stack: ArrayVec::new(),
        }
    }

    /// An iterator over the intervals of `grid` crossed by the object-space `ray` with
    /// parameters in `t_range`.
    ///
    /// If `selector` is given, intervals whose value range does not overlap its ranges are
    /// skipped.
    pub fn new(
        grid: &'a Grid,
        ray: &Ray,
        t_range: ValueRange,
        selector: Option<&'a ValueSelector>,
    ) -> Self {
        let mut result = Self::uninitialized(grid);
        result.init(ray, t_range, selector);
        result
    }

    /// Restarts this iterator on another ray.
    ///
    /// The ray is clipped against the bounds of the grid. The iterator is exhausted
    /// immediately if nothing is left: empty grid, degenerate ray, empty parametric range,
    /// or a ray missing the grid.
    pub fn init(&mut self, ray: &Ray, t_range: ValueRange, selector: Option<&'a ValueSelector>) {
        self.selector = selector;
        self.stack.clear();
        self.state = IteratorState::Exhausted;

        if self.grid.is_empty() || ray.is_degenerate() || !(t_range.lower < t_range.upper) {
            return;
        }

        let ray = ray.transform_by(self.grid.object_to_index());
        if ray.is_degenerate() {
            return;
        }

        let bounds = self.grid.index_bounds().to_aabb();
        let Some((t0, t1)) = bounds.clip_line_parameters(&ray.origin, &ray.dir) else {
            return;
        };

        let t0 = t0.max(t_range.lower);
        let t1 = t1.min(t_range.upper);
        if !(t0 < t1) {
            return;
        }

        self.ray = ray;
        self.t = t0;
        self.t_end = t1;
        self.cell = self.cell_at(t0);
        self.nominal_delta_t = 1.0 / ray.dir.norm();
        self.state = IteratorState::Active;
    }

    /// The current state of the traversal.
    #[inline]
    pub fn state(&self) -> IteratorState {
        self.state
    }

    /// The grid traversed by this iterator.
    #[inline]
    pub fn grid(&self) -> &'a Grid {
        self.grid
    }

    /// The ray in index space. Parameters along this ray match the object-space ray.
    #[inline]
    pub fn index_ray(&self) -> &Ray {
        &self.ray
    }

    /// The clipped parametric range of the current ray, if it is active.
    pub fn clipped_t_range(&self) -> Option<ValueRange> {
        (self.state == IteratorState::Active).then(|| ValueRange::new(self.t, self.t_end))
    }

    /// The smallest parametric step taken at parameter `t`.
    #[inline]
    fn epsilon(&self, t: Real) -> Real {
        self.grid
            .iterator_epsilon()
            .max(4.0 * Real::EPSILON * t.abs())
            .max(Real::MIN_POSITIVE)
    }

    fn exhaust(&mut self) {
        self.state = IteratorState::Exhausted;
        self.stack.clear();
    }

    /// The cell the ray enters at parameter `t`, clamped to the index bounds of the grid.
    ///
    /// A point lying on a cell face belongs to the cell on the side the ray moves to.
    fn cell_at(&self, t: Real) -> [i64; 3] {
        let pt = self.ray.point_at(t);
        let bounds = self.grid.index_bounds();

        core::array::from_fn(|i| {
            let mut cell = pt[i].floor();
            if self.ray.dir[i] < 0.0 && cell == pt[i] {
                cell -= 1.0;
            }
            (cell as i64).clamp(bounds.lower[i] as i64, bounds.upper[i] as i64 - 1)
        })
    }

    /// The offset from the root origin of `cell`, if it is inside of the root node.
    fn cell_offset(&self, cell: &[i64; 3]) -> Option<Offset> {
        let root = self.grid.root_origin();
        let res = self.grid.layout().level_res(0) as i64;
        let mut offset = Offset::origin();

        for i in 0..3 {
            let d = cell[i] - root[i] as i64;
            if d < 0 || d >= res {
                return None;
            }
            offset[i] = d as u32;
        }

        Some(offset)
    }

    /// Finds the voxel containing `offset`, updating the node stack.
    ///
    /// Returns the level of the voxel and its global index in that level.
    fn locate(&mut self, offset: &Offset) -> (usize, usize) {
        let grid = self.grid;
        let layout = grid.layout();

        while let Some(top) = self.stack.last() {
            if layout.node_origin(offset, top.level) == top.origin {
                break;
            }
            let _ = self.stack.pop();
        }

        if self.stack.is_empty() {
            self.stack.push(Frame {
                level: 0,
                node: 0,
                origin: Offset::origin(),
            });
        }

        loop {
            // The stack was made non-empty above and only grows in this loop.
            let top = self.stack[self.stack.len() - 1];
            let v = grid.voxel_index(top.node as usize, offset, top.level);

            match grid.level(top.level).voxel(v) {
                Voxel::ChildPointer(child) if top.level < grid.max_iterator_depth() => {
                    let level = top.level + 1;
                    self.stack.push(Frame {
                        level,
                        node: child,
                        origin: layout.node_origin(offset, level),
                    });
                }
                _ => return (top.level, v),
            }
        }
    }

    /// The index-space cells of the level `level` voxel containing `offset`.
    fn voxel_cells(&self, offset: &Offset, level: usize) -> IndexBox {
        let layout = self.grid.layout();
        let res = layout.voxel_res(level) as i64;
        let lower = layout.node_origin(offset, level + 1);
        let root = self.grid.root_origin();
        let lower = IndexPoint::from(na::Vector3::from_fn(|i, _| {
            (root[i] as i64 + lower[i] as i64) as i32
        }));
        let upper = lower.map(|x| (x as i64 + res).min(i32::MAX as i64) as i32);
        IndexBox::new(lower, upper)
    }

    /// Reports the next voxel crossed by the ray, empty or not.
    ///
    /// Leaf accesses are counted here.
    pub(crate) fn next_span(&mut self) -> Option<Span> {
        if self.state != IteratorState::Active {
            return None;
        }

        let t = self.t;
        if !(t < self.t_end) {
            self.exhaust();
            return None;
        }

        let Some(offset) = self.cell_offset(&self.cell) else {
            self.exhaust();
            return None;
        };
        let (level, v) = self.locate(&offset);
        let cells = self.voxel_cells(&offset, level);

        // Leave the voxel through the faces hit first, and step to the cell behind them.
        let dir = self.ray.dir;
        let exits: [Real; 3] = core::array::from_fn(|i| {
            if dir[i] > 0.0 {
                (cells.upper[i] as Real - self.ray.origin[i]) / dir[i]
            } else if dir[i] < 0.0 {
                (cells.lower[i] as Real - self.ray.origin[i]) / dir[i]
            } else {
                Real::MAX
            }
        });
        let exit = exits[0].min(exits[1]).min(exits[2]);
        let pt = self.ray.point_at(exit);
        let next_cell = core::array::from_fn(|i| {
            let (lower, upper) = (cells.lower[i] as i64, cells.upper[i] as i64);
            if dir[i] > 0.0 && exits[i] <= exit {
                upper
            } else if dir[i] < 0.0 && exits[i] <= exit {
                lower - 1
            } else {
                (pt[i].floor() as i64).clamp(lower, upper - 1)
            }
        });

        let t_exit = exit.max(t + self.epsilon(t)).min(self.t_end);
        self.t = t_exit;
        self.cell = next_cell;

        let lvl = self.grid.level(level);
        let voxel = lvl.voxel(v);
        if voxel.is_leaf() {
            if let Some(usage) = self.grid.leaf_usage() {
                let _ = usage[lvl.leaf_index[v] as usize].fetch_add(1, Ordering::Relaxed);
            }
        }

        Some(Span {
            interval: Interval {
                t_range: ValueRange::new(t, t_exit),
                value_range: lvl.value_range(v),
                nominal_delta_t: self.nominal_delta_t,
                depth: level,
            },
            cells,
            empty: voxel.is_empty(),
        })
    }

    /// Reports the next interval along the ray.
    ///
    /// Returns `None` once the ray left the grid, and on every call after that.
    pub fn next_interval(&mut self) -> Option<Interval> {
        while let Some(span) = self.next_span() {
            if span.empty {
                continue;
            }

            if let Some(selector) = self.selector {
                if !selector.overlaps(&span.interval.value_range) {
                    continue;
                }
            }

            return Some(span.interval);
        }

        None
    }
}

impl Iterator for IntervalIterator<'_> {
    type Item = Interval;

    #[inline]
    fn next(&mut self) -> Option<Interval> {
        self.next_interval()
    }
}

impl core::iter::FusedIterator for IntervalIterator<'_> {}
