//! Ray traversal queries.
//!
//! * [`IntervalIterator`] reports the sections of a ray crossing non-empty regions of a
//!   grid, with bounds of the values found there.
//! * [`HitIterator`] reports the points where a ray crosses a set of isovalues.
//! * [`batch`] runs either of them over many rays.
//!
//! Rays are given in object space. The parameters of intervals and hits are parameters
//! along that ray.

pub use self::hit_iterator::{Hit, HitIterator, DEFAULT_HIT_EPSILON, HIT_ITERATOR_MAX_SIZE};
pub use self::interval_iterator::{
    Interval, IntervalIterator, IteratorState, INTERVAL_ITERATOR_MAX_SIZE,
};
pub use self::ray::Ray;
pub use self::value_selector::ValueSelector;

pub mod batch;
mod hit_iterator;
mod interval_iterator;
mod ray;
mod value_selector;
