//! Instrumentation of the traversals of a grid.

use crate::grid::Grid;
use core::sync::atomic::{AtomicU32, Ordering};

/// The name of the observer counting the visits of each leaf.
pub const LEAF_NODE_ACCESS: &str = "LeafNodeAccess";

/// Counts how many times each leaf of a grid was visited by interval iterators.
///
/// The counters are owned by the grid: they are allocated by the first observer created
/// on a grid, and outlive the observers. Iterators increment them as long as they exist,
/// whether an observer is alive or not.
///
/// # Example
///
/// ```
/// use vdbtrace::grid::{DataBuffer, GridBuilder, GridLayout};
/// use vdbtrace::math::{Point, Vector};
/// use vdbtrace::observer::LeafAccessObserver;
/// use vdbtrace::query::{IntervalIterator, Ray};
/// use vdbtrace::utils::ValueRange;
///
/// let grid = GridBuilder::new(GridLayout::new([2, 2, 2, 2]).unwrap())
///     .build(&[2], &[[0, 0, 0]], &[0], &[DataBuffer::constant(0.5)])
///     .unwrap();
/// let observer = LeafAccessObserver::new(&grid);
///
/// let ray = Ray::new(Point::new(-1.0, 1.0, 1.0), Vector::x());
/// let _ = IntervalIterator::new(&grid, &ray, ValueRange::new(0.0, 100.0), None).count();
/// assert_eq!(observer.counts(), vec![1]);
/// ```
#[derive(Copy, Clone, Debug)]
pub struct LeafAccessObserver<'a> {
    counters: &'a [AtomicU32],
}

impl<'a> LeafAccessObserver<'a> {
    /// An observer of the leaves of `grid`, allocating its counters if needed.
    pub fn new(grid: &'a Grid) -> Self {
        Self {
            counters: grid.leaf_usage_or_init(),
        }
    }

    /// The number of counters, i.e., the number of leaves of the grid.
    #[inline]
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Does the grid have no leaf?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// The number of visits of the leaf with index `leaf` in the input arrays.
    pub fn count(&self, leaf: usize) -> Option<u32> {
        self.counters
            .get(leaf)
            .map(|counter| counter.load(Ordering::Relaxed))
    }

    /// A snapshot of all the counters.
    pub fn counts(&self) -> Vec<u32> {
        self.counters
            .iter()
            .map(|counter| counter.load(Ordering::Relaxed))
            .collect()
    }

    /// Sets all the counters to zero.
    pub fn reset(&self) {
        for counter in self.counters {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
