use crate::bounding_volume::{Aabb, IndexBox};
use crate::grid::{GridLayout, Level, LeafHandle, NUM_LEVELS};
use crate::math::{AffineTransform, IndexPoint, Offset, Real};
use crate::utils::ValueRange;
use core::sync::atomic::AtomicU32;
use std::sync::{Arc, OnceLock};

/// A sparse multi-level volumetric grid.
///
/// The grid is a tree of fixed depth [`NUM_LEVELS`]: a single root node on level 0, and on
/// each level below it the nodes referenced by child pointers of the level above. Leaves
/// live on levels `1..NUM_LEVELS` and are stored either as constant tiles directly in the
/// voxel of their parent, or as a handle to their dense payload.
///
/// Grids are built by [`crate::grid::GridBuilder`] and never modified afterwards, except
/// for the leaf access counters which are atomic.
#[derive(Debug)]
pub struct Grid {
    pub(crate) layout: GridLayout,
    pub(crate) root_origin: IndexPoint,
    pub(crate) index_to_object: AffineTransform,
    pub(crate) object_to_index: AffineTransform,
    pub(crate) max_sampling_depth: usize,
    pub(crate) max_iterator_depth: usize,
    pub(crate) num_leaves: [usize; NUM_LEVELS],
    pub(crate) total_num_leaves: usize,
    pub(crate) value_range: ValueRange,
    pub(crate) index_bounds: IndexBox,
    pub(crate) object_bounds: Aabb,
    pub(crate) levels: [Level; NUM_LEVELS],
    pub(crate) leaf_data: Vec<Arc<[f32]>>,
    pub(crate) iterator_epsilon: Real,
    pub(crate) background: Real,
    pub(crate) bytes_allocated: usize,
    pub(crate) usage: OnceLock<Box<[AtomicU32]>>,
}

impl Grid {
    /// The branching factors of this grid.
    #[inline]
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// The index-space coordinates of the lower corner of the root node.
    #[inline]
    pub fn root_origin(&self) -> IndexPoint {
        self.root_origin
    }

    /// The transform from index space to object space.
    #[inline]
    pub fn index_to_object(&self) -> &AffineTransform {
        &self.index_to_object
    }

    /// The transform from object space to index space.
    #[inline]
    pub fn object_to_index(&self) -> &AffineTransform {
        &self.object_to_index
    }

    /// The deepest level the sampler descends to.
    #[inline]
    pub fn max_sampling_depth(&self) -> usize {
        self.max_sampling_depth
    }

    /// The deepest level the interval iterator descends to.
    #[inline]
    pub fn max_iterator_depth(&self) -> usize {
        self.max_iterator_depth
    }

    /// The number of leaves inserted on level `level`.
    #[inline]
    pub fn num_leaves(&self, level: usize) -> usize {
        self.num_leaves[level]
    }

    /// The number of leaves of this grid.
    #[inline]
    pub fn total_num_leaves(&self) -> usize {
        self.total_num_leaves
    }

    /// The range of all the values stored in this grid.
    #[inline]
    pub fn value_range(&self) -> ValueRange {
        self.value_range
    }

    /// The integer box covered by the leaves, in index space.
    #[inline]
    pub fn index_bounds(&self) -> &IndexBox {
        &self.index_bounds
    }

    /// The axis-aligned bounding box of the leaves, in object space.
    #[inline]
    pub fn bounds(&self) -> &Aabb {
        &self.object_bounds
    }

    /// The nodes of level `level`.
    #[inline]
    pub fn level(&self, level: usize) -> &Level {
        &self.levels[level]
    }

    /// The value returned by the sampler outside of any leaf.
    #[inline]
    pub fn background(&self) -> Real {
        self.background
    }

    /// The minimum parametric step of the interval iterator.
    #[inline]
    pub fn iterator_epsilon(&self) -> Real {
        self.iterator_epsilon
    }

    /// The dense payload referenced by a leaf pointer.
    #[inline]
    pub fn leaf_data(&self, handle: LeafHandle) -> Option<&[f32]> {
        self.leaf_data.get(handle as usize).map(|data| &**data)
    }

    /// The number of bytes allocated for the nodes and counters of this grid.
    ///
    /// Leaf payloads are shared with the caller and are not included.
    pub fn bytes_allocated(&self) -> usize {
        let usage = self
            .usage
            .get()
            .map(|usage| usage.len() * size_of::<AtomicU32>())
            .unwrap_or(0);
        self.bytes_allocated + usage
    }

    /// The leaf access counters, if they were requested.
    #[inline]
    pub fn leaf_usage(&self) -> Option<&[AtomicU32]> {
        self.usage.get().map(|usage| &**usage)
    }

    /// The leaf access counters, allocated and zeroed on first call.
    pub fn leaf_usage_or_init(&self) -> &[AtomicU32] {
        self.usage.get_or_init(|| {
            (0..self.total_num_leaves)
                .map(|_| AtomicU32::new(0))
                .collect()
        })
    }

    /// Does this grid contain no leaf at all?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_num_leaves == 0
    }

    /// The offset of the index-space cell `cell` from the root origin.
    ///
    /// Returns `None` if the cell is outside of the root node.
    pub fn offset_of(&self, cell: &IndexPoint) -> Option<Offset> {
        let res = self.layout.level_res(0) as i64;
        let mut offset = Offset::origin();
        for i in 0..3 {
            let d = cell[i] as i64 - self.root_origin[i] as i64;
            if d < 0 || d >= res {
                return None;
            }
            offset[i] = d as u32;
        }
        Some(offset)
    }

    /// The global index of the level `level` voxel containing `offset` in node `node`.
    #[inline]
    pub(crate) fn voxel_index(&self, node: usize, offset: &Offset, level: usize) -> usize {
        node * self.layout.num_voxels(level) + self.layout.linear_voxel_index(offset, level)
    }
}
