//! Traversal of many rays at once.
//!
//! With the `parallel` feature enabled, rays are distributed over the rayon thread pool.
//! Each ray is traversed by its own iterator, so results do not depend on the scheduling.

use crate::grid::{Filter, Grid};
use crate::query::{Hit, HitIterator, Interval, IntervalIterator, Ray, ValueSelector};
use crate::utils::ValueRange;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "parallel")]
fn map_rays<T: Send>(rays: &[Ray], f: impl Fn(&Ray) -> T + Sync + Send) -> Vec<T> {
    rays.par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
fn map_rays<T>(rays: &[Ray], f: impl Fn(&Ray) -> T) -> Vec<T> {
    rays.iter().map(f).collect()
}

/// All the intervals of each ray of `rays`, in the same order as the rays.
pub fn intervals_for_rays(
    grid: &Grid,
    rays: &[Ray],
    t_range: ValueRange,
    selector: Option<&ValueSelector>,
) -> Vec<Vec<Interval>> {
    map_rays(rays, |ray| {
        IntervalIterator::new(grid, ray, t_range, selector).collect()
    })
}

/// All the isovalue crossings of each ray of `rays`, in the same order as the rays.
pub fn hits_for_rays(
    grid: &Grid,
    rays: &[Ray],
    t_range: ValueRange,
    selector: &ValueSelector,
    filter: Filter,
) -> Vec<Vec<Hit>> {
    map_rays(rays, |ray| {
        HitIterator::new(grid, ray, t_range, selector)
            .with_filter(filter)
            .collect()
    })
}
