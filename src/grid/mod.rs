//! The sparse multi-level grid, its construction, and point sampling.

pub use self::builder::{GridBuilder, DEFAULT_ITERATOR_EPSILON};
pub use self::data::{DataBuffer, DataType};
pub use self::grid::Grid;
pub use self::layout::{
    GridLayout, DEFAULT_LOG_RESOLUTION, MAX_LEVEL_LOG_RESOLUTION, MAX_TOTAL_LOG_RESOLUTION,
    NUM_LEVELS,
};
pub use self::level::Level;
pub use self::sampler::Filter;
pub use self::voxel::{LeafFormat, LeafHandle, Voxel};

mod builder;
mod data;
mod grid;
mod layout;
mod level;
mod sampler;
mod validation;
mod voxel;
