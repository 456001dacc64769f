use crate::error::VdbError;
use crate::grid::{LeafHandle, Voxel};
use crate::utils::ValueRange;

/// Allocates a zero-initialized buffer, reporting allocation failures instead of aborting.
pub(crate) fn allocate<T: Clone>(
    len: usize,
    fill: T,
    bytes_allocated: &mut usize,
) -> Result<Vec<T>, VdbError> {
    let num_bytes = len.saturating_mul(size_of::<T>());
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| VdbError::AllocationFailed(num_bytes))?;
    buffer.resize(len, fill);
    *bytes_allocated += num_bytes;
    Ok(buffer)
}

/// All the nodes of one level of a grid.
///
/// Nodes are stored densely: the voxels of node `n` occupy the range
/// `n * num_voxels..(n + 1) * num_voxels` of the three parallel arrays.
#[derive(Clone, Debug, Default)]
pub struct Level {
    pub(crate) num_nodes: usize,
    pub(crate) capacity: usize,
    pub(crate) voxels: Vec<Voxel>,
    pub(crate) value_range: Vec<ValueRange>,
    pub(crate) leaf_index: Vec<LeafHandle>,
}

impl Level {
    /// Allocates storage for `capacity` nodes of `num_voxels` voxels each.
    pub(crate) fn allocate(
        capacity: usize,
        num_voxels: usize,
        bytes_allocated: &mut usize,
    ) -> Result<Self, VdbError> {
        let len = capacity
            .checked_mul(num_voxels)
            .ok_or(VdbError::AllocationFailed(usize::MAX))?;

        Ok(Self {
            num_nodes: 0,
            capacity,
            voxels: allocate(len, Voxel::Empty, bytes_allocated)?,
            value_range: allocate(len, ValueRange::empty(), bytes_allocated)?,
            leaf_index: allocate(len, 0, bytes_allocated)?,
        })
    }

    /// The number of nodes in use on this level.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// The number of nodes this level was sized for.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// All the voxels of this level.
    #[inline]
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    /// The voxel with the given global index.
    #[inline]
    pub fn voxel(&self, index: usize) -> Voxel {
        self.voxels[index]
    }

    /// The value range of everything below the voxel with the given global index.
    #[inline]
    pub fn value_range(&self, index: usize) -> ValueRange {
        self.value_range[index]
    }

    /// The index of the input leaf stored in the voxel with the given global index.
    ///
    /// Returns `None` unless the voxel is a tile or a leaf pointer.
    #[inline]
    pub fn leaf_index(&self, index: usize) -> Option<LeafHandle> {
        if self.voxels[index].is_leaf() {
            Some(self.leaf_index[index])
        } else {
            None
        }
    }
}
