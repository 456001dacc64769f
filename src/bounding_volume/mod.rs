//! Bounding volumes.

#[doc(inline)]
pub use crate::bounding_volume::aabb::Aabb;
pub use crate::bounding_volume::index_box::IndexBox;

#[doc(hidden)]
pub mod aabb;
mod index_box;
