/*!
vdbtrace
========

**vdbtrace** is a sparse, multi-level volumetric grid (a "VDB" grid) together
with the ray iterators used by volume renderers: an interval iterator that
walks the non-empty regions crossed by a ray with their value bounds, and a
hit iterator that locates isosurface crossings.

```
use std::sync::Arc;
use vdbtrace::grid::DataBuffer;
use vdbtrace::math::{Point, Vector};
use vdbtrace::query::Ray;
use vdbtrace::utils::ValueRange;
use vdbtrace::volume::{VdbParams, VdbVolume};

let params = VdbParams {
    level: Some(vec![3]),
    origin: Some(vec![[0, 0, 0]]),
    format: Some(vec![0]),
    data: Some(vec![DataBuffer::Float(Arc::from(vec![0.5]))]),
    ..VdbParams::default()
};
let mut volume = VdbVolume::new(params);
volume.commit().unwrap();

let ray = Ray::new(Point::new(-1.0, 1.0, 1.0), Vector::x());
let mut intervals = volume
    .interval_iterator(&ray, ValueRange::new(0.0, 100.0), None)
    .unwrap();
let interval = intervals.next_interval().unwrap();
assert_eq!(interval.value_range, ValueRange::splat(0.5));
```
*/

#![deny(non_camel_case_types)]
#![deny(unused_parens)]
#![deny(non_upper_case_globals)]
#![deny(unused_results)]
#![warn(missing_docs)]
#![warn(unused_imports)]
#![allow(missing_copy_implementations)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::module_inception)]
#![allow(clippy::manual_range_contains)] // This usually makes it way more verbose that it could be.
#![deny(unused_qualifications)]

#[cfg(feature = "serde-serialize")]
#[macro_use]
extern crate serde;
extern crate num_traits as num;

pub extern crate nalgebra as na;

pub mod bounding_volume;
pub mod error;
pub mod grid;
pub mod observer;
pub mod query;
pub mod utils;
pub mod volume;

pub use crate::error::VdbError;

mod real {
    /// The scalar type used throughout this crate.
    pub use f32 as Real;
}

/// Aliases for mathematical types.
pub mod math {
    pub use super::real::*;
    pub use crate::utils::AffineTransform;
    pub use na::{Matrix3, Point3, Vector3};

    /// The dimension of the space.
    pub const DIM: usize = 3;

    /// The point type.
    pub use Point3 as Point;

    /// The vector type.
    pub use Vector3 as Vector;

    /// The matrix type.
    pub use Matrix3 as Matrix;

    /// An integer coordinate of the index space.
    pub type IndexPoint = Point3<i32>;

    /// An unsigned offset from the root origin of a grid.
    pub type Offset = Point3<u32>;
}
