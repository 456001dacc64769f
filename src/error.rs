//! Errors reported while committing a volume or using it before a commit.

use crate::grid::NUM_LEVELS;
use crate::math::IndexPoint;

/// Error raised by the construction of a grid or by the misuse of a volume.
///
/// Every error is reported synchronously by the function that detected it. A volume that
/// failed to commit holds no grid at all; it must be committed again successfully before
/// it can be sampled or traversed.
///
/// # Example
///
/// ```
/// use vdbtrace::volume::{VdbParams, VdbVolume};
/// use vdbtrace::VdbError;
///
/// let mut volume = VdbVolume::new(VdbParams::default());
/// assert_eq!(volume.commit(), Err(VdbError::MissingParameter("level")));
/// assert!(volume.grid().is_err());
/// ```
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum VdbError {
    /// A required parameter was never set.
    #[error("parameter `{0}` is not set")]
    MissingParameter(&'static str),

    /// The leaf arrays do not all have the same length.
    #[error("level, origin, format, and data must all have the same size (got {level}, {origin}, {format}, {data})")]
    ArraySizeMismatch {
        /// Length of the `level` array.
        level: usize,
        /// Length of the `origin` array.
        origin: usize,
        /// Length of the `format` array.
        format: usize,
        /// Length of the `data` array.
        data: usize,
    },

    /// The element type is not supported (only 32-bit floats are).
    #[error("data type is {0} but only float is supported")]
    UnsupportedDataType(&'static str),

    /// The leaf format is neither a tile nor a dense buffer.
    #[error("leaf {leaf} has format {format}, only 0 (tile) and 1 (dense) are supported")]
    UnsupportedLeafFormat {
        /// Index of the offending leaf.
        leaf: usize,
        /// The raw format value.
        format: u32,
    },

    /// The payload of a leaf does not have the number of elements its format requires.
    #[error("leaf {leaf} has {found} values but its format requires {expected}")]
    LeafDataSize {
        /// Index of the offending leaf.
        leaf: usize,
        /// Required number of values.
        expected: usize,
        /// Actual number of values.
        found: usize,
    },

    /// The level layout is not usable.
    #[error("invalid level layout: {0}")]
    InvalidLayout(&'static str),

    /// The index-to-object matrix cannot be inverted.
    #[error("the index-to-object transform is not invertible")]
    NonInvertibleTransform,

    /// The requested observer type does not exist for this volume.
    #[error("observer type `{0}` is not supported")]
    UnsupportedObserver(String),

    /// A leaf was given on the root level.
    #[error("leaf {0}: there must not be any leaf nodes on level 0")]
    LeafOnRootLevel(usize),

    /// A leaf was given on a level that does not exist.
    #[error("leaf {leaf} is on level {level}, but levels are limited to 1..{max}", max = NUM_LEVELS)]
    InvalidLeafLevel {
        /// Index of the offending leaf.
        leaf: usize,
        /// The requested level.
        level: u32,
    },

    /// A leaf origin is not a multiple of its node resolution.
    #[error("leaf {leaf} origin {origin} is not aligned to the level {level} node resolution")]
    MisalignedLeaf {
        /// Index of the offending leaf.
        leaf: usize,
        /// Level of the leaf.
        level: u32,
        /// Origin of the leaf.
        origin: IndexPoint,
    },

    /// The union of all leaves is larger than a single root node.
    #[error("input leaves do not fit into a single root level node")]
    LeavesDoNotFit,

    /// Two leaves claim the same voxel. This indicates inconsistent input.
    #[error("attempted to insert a leaf node into a leaf node (level {level}, origin {origin})")]
    LeafCollision {
        /// Level of the node holding the occupied voxel.
        level: usize,
        /// Origin of the leaf that could not be inserted.
        origin: IndexPoint,
    },

    /// There are more leaves than leaf handles can address.
    #[error("{0} leaves given, at most 2^32 - 1 are supported")]
    TooManyLeaves(usize),

    /// More nodes were requested on a level than were counted during sizing.
    #[error("level {0} ran out of preallocated nodes")]
    NodeCapacityExceeded(usize),

    /// The grid buffers could not be allocated.
    #[error("failed to allocate {0} bytes for the grid")]
    AllocationFailed(usize),

    /// The volume has not been committed successfully.
    #[error("the volume has not been committed")]
    NotCommitted,
}
