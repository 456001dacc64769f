use crate::bounding_volume::{Aabb, IndexBox};
use crate::error::VdbError;
use crate::grid::{
    DataBuffer, Grid, GridLayout, LeafFormat, LeafHandle, Level, Voxel, NUM_LEVELS,
};
use crate::math::{AffineTransform, IndexPoint, Offset, Real};
use crate::utils::ValueRange;
use std::sync::{Arc, OnceLock};

/// The default minimum parametric step of the interval iterator.
pub const DEFAULT_ITERATOR_EPSILON: Real = 1.0e-5;

/// A leaf that passed validation.
struct LeafInput {
    level: usize,
    origin: IndexPoint,
    format: LeafFormat,
    data: Arc<[f32]>,
    range: ValueRange,
}

#[inline]
fn offset_key(offset: &Offset) -> (u32, u32, u32) {
    (offset.x, offset.y, offset.z)
}

/// Builds a [`Grid`] from a flat list of leaves.
///
/// The grid is built in two passes. The first pass counts, bottom-up, how many distinct
/// nodes each level needs, so that all the node storage is allocated once. The second
/// pass inserts every leaf by walking from the root, allocating child nodes the first
/// time they are referenced. Leaves are inserted level by level in increasing offset
/// order, so the resulting node numbering does not depend on the order of the input.
///
/// # Example
///
/// ```
/// use vdbtrace::grid::{DataBuffer, GridBuilder, GridLayout};
///
/// let layout = GridLayout::new([2, 2, 2, 2]).unwrap();
/// let grid = GridBuilder::new(layout)
///     .build(&[2], &[[0, 0, 0]], &[0], &[DataBuffer::constant(0.5)])
///     .unwrap();
///
/// assert_eq!(grid.total_num_leaves(), 1);
/// assert!(grid.level(0).voxel(0).is_child_pointer());
/// assert_eq!(grid.level(1).voxel(0).tile_value(), Some(0.5));
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridBuilder {
    layout: GridLayout,
    index_to_object: AffineTransform,
    max_sampling_depth: usize,
    max_iterator_depth: usize,
    iterator_epsilon: Real,
    background: Real,
}

impl Default for GridBuilder {
    fn default() -> Self {
        Self::new(GridLayout::default())
    }
}

impl GridBuilder {
    /// A builder for grids with the given layout, an identity transform, and full depth.
    pub fn new(layout: GridLayout) -> Self {
        Self {
            layout,
            index_to_object: AffineTransform::identity(),
            max_sampling_depth: NUM_LEVELS - 1,
            max_iterator_depth: NUM_LEVELS - 1,
            iterator_epsilon: DEFAULT_ITERATOR_EPSILON,
            background: 0.0,
        }
    }

    /// Sets the transform from index space to object space.
    pub fn index_to_object(mut self, index_to_object: AffineTransform) -> Self {
        self.index_to_object = index_to_object;
        self
    }

    /// Sets the deepest level the sampler descends to. Values past the last level are clamped.
    pub fn max_sampling_depth(mut self, depth: usize) -> Self {
        self.max_sampling_depth = depth.min(NUM_LEVELS - 1);
        self
    }

    /// Sets the deepest level the interval iterator descends to. Values past the last level
    /// are clamped.
    pub fn max_iterator_depth(mut self, depth: usize) -> Self {
        self.max_iterator_depth = depth.min(NUM_LEVELS - 1);
        self
    }

    /// Sets the minimum parametric step of the interval iterator.
    pub fn iterator_epsilon(mut self, epsilon: Real) -> Self {
        self.iterator_epsilon = epsilon;
        self
    }

    /// Sets the value sampled outside of every leaf.
    pub fn background(mut self, background: Real) -> Self {
        self.background = background;
        self
    }

    /// Builds a grid from the parallel leaf arrays.
    ///
    /// Leaf `i` lives on level `level[i]` (in `1..NUM_LEVELS`), has its lower corner at
    /// `origin[i]` (a multiple of the node resolution of its level), and its payload is
    /// `data[i]`, interpreted according to `format[i]`.
    pub fn build(
        &self,
        level: &[u32],
        origin: &[[i32; 3]],
        format: &[u32],
        data: &[DataBuffer],
    ) -> Result<Grid, VdbError> {
        let num_leaves = level.len();
        if origin.len() != num_leaves || format.len() != num_leaves || data.len() != num_leaves
        {
            return Err(VdbError::ArraySizeMismatch {
                level: level.len(),
                origin: origin.len(),
                format: format.len(),
                data: data.len(),
            });
        }

        if num_leaves > LeafHandle::MAX as usize {
            return Err(VdbError::TooManyLeaves(num_leaves));
        }

        let object_to_index = self
            .index_to_object
            .try_inverse()
            .ok_or(VdbError::NonInvertibleTransform)?;

        let leaves = self.validate_leaves(level, origin, format, data)?;
        let index_bounds = self.compute_index_bounds(&leaves);
        let root_origin = self.compute_root_origin(&index_bounds)?;
        let offsets: Vec<Offset> = leaves
            .iter()
            .map(|leaf| Offset::from((leaf.origin - root_origin).map(|d| d as u32)))
            .collect();

        // Bin leaves per level, in increasing offset order.
        let mut bins: [Vec<usize>; NUM_LEVELS] = Default::default();
        for (i, leaf) in leaves.iter().enumerate() {
            bins[leaf.level].push(i);
        }
        for bin in &mut bins {
            bin.sort_by_key(|i| offset_key(&offsets[*i]));
        }

        let mut bytes_allocated = 0;
        let mut levels = self.allocate_levels(&offsets, &bins, &mut bytes_allocated)?;

        levels[0].num_nodes = 1;
        for bin in &bins {
            for &i in bin {
                self.insert_leaf(&mut levels, &leaves[i], i, &offsets[i])?;
            }
        }

        let value_range = levels[0]
            .value_range
            .iter()
            .fold(ValueRange::empty(), |acc, range| acc.union(*range));

        let object_bounds = if index_bounds.is_empty() {
            Aabb::new_invalid()
        } else {
            let corners = index_bounds
                .to_aabb()
                .vertices()
                .map(|pt| self.index_to_object.transform_point(&pt));
            Aabb::from_points(&corners)
        };

        let mut num_leaves_per_level = [0; NUM_LEVELS];
        for (count, bin) in num_leaves_per_level.iter_mut().zip(bins.iter()) {
            *count = bin.len();
        }

        log::debug!(
            "built a grid with {} leaves, {:?} nodes per level, {} bytes",
            num_leaves,
            levels.each_ref().map(|level| level.num_nodes),
            bytes_allocated
        );

        Ok(Grid {
            layout: self.layout,
            root_origin,
            index_to_object: self.index_to_object,
            object_to_index,
            max_sampling_depth: self.max_sampling_depth,
            max_iterator_depth: self.max_iterator_depth,
            num_leaves: num_leaves_per_level,
            total_num_leaves: num_leaves,
            value_range,
            index_bounds,
            object_bounds,
            levels,
            leaf_data: leaves.into_iter().map(|leaf| leaf.data).collect(),
            iterator_epsilon: self.iterator_epsilon,
            background: self.background,
            bytes_allocated,
            usage: OnceLock::new(),
        })
    }

    fn validate_leaves(
        &self,
        level: &[u32],
        origin: &[[i32; 3]],
        format: &[u32],
        data: &[DataBuffer],
    ) -> Result<Vec<LeafInput>, VdbError> {
        let mut leaves = Vec::with_capacity(level.len());

        for i in 0..level.len() {
            let leaf_level = level[i];
            if leaf_level == 0 {
                return Err(VdbError::LeafOnRootLevel(i));
            }
            if leaf_level as usize >= NUM_LEVELS {
                return Err(VdbError::InvalidLeafLevel {
                    leaf: i,
                    level: leaf_level,
                });
            }
            let leaf_level = leaf_level as usize;

            let leaf_origin = IndexPoint::from(origin[i]);
            let res = self.layout.level_res(leaf_level) as i32;
            if leaf_origin.iter().any(|x| x.rem_euclid(res) != 0) {
                return Err(VdbError::MisalignedLeaf {
                    leaf: i,
                    level: leaf_level as u32,
                    origin: leaf_origin,
                });
            }

            let leaf_format = LeafFormat::from_raw(format[i], i)?;
            let values = data[i]
                .as_f32()
                .ok_or(VdbError::UnsupportedDataType(data[i].data_type().name()))?;

            let range = match leaf_format {
                LeafFormat::Tile => {
                    let value = *values.first().ok_or(VdbError::LeafDataSize {
                        leaf: i,
                        expected: 1,
                        found: 0,
                    })?;
                    ValueRange::splat(value)
                }
                LeafFormat::Dense => {
                    let expected = self.layout.num_voxels(leaf_level);
                    if values.len() != expected {
                        return Err(VdbError::LeafDataSize {
                            leaf: i,
                            expected,
                            found: values.len(),
                        });
                    }
                    ValueRange::from_values(values)
                }
            };

            leaves.push(LeafInput {
                level: leaf_level,
                origin: leaf_origin,
                format: leaf_format,
                data: values.clone(),
                range,
            });
        }

        Ok(leaves)
    }

    fn compute_index_bounds(&self, leaves: &[LeafInput]) -> IndexBox {
        let mut bounds = IndexBox::empty();
        for leaf in leaves {
            bounds.extend_cube(leaf.origin, self.layout.level_res(leaf.level) as i64);
        }
        bounds
    }

    /// The lower corner of the bounds rounded down to the level 1 node resolution.
    fn compute_root_origin(&self, bounds: &IndexBox) -> Result<IndexPoint, VdbError> {
        if bounds.is_empty() {
            return Ok(IndexPoint::origin());
        }

        let res = self.layout.level_res(1) as i64;
        let root_res = self.layout.level_res(0) as i64;
        let root_origin = bounds.lower.map(|x| (x as i64).div_euclid(res) * res);

        for i in 0..3 {
            if bounds.upper[i] as i64 - root_origin[i] > root_res {
                return Err(VdbError::LeavesDoNotFit);
            }
        }

        Ok(root_origin.map(|x| x as i32))
    }

    /// Counts the nodes needed on each level and allocates their storage.
    fn allocate_levels(
        &self,
        offsets: &[Offset],
        bins: &[Vec<usize>; NUM_LEVELS],
        bytes_allocated: &mut usize,
    ) -> Result<[Level; NUM_LEVELS], VdbError> {
        let mut capacity = [0; NUM_LEVELS];
        let mut child_origins: Vec<Offset> = Vec::new();

        // The parents of level `l` leaves and of level `l` nodes are level `l - 1` nodes.
        for l in (1..NUM_LEVELS).rev() {
            let mut origins: Vec<Offset> = bins[l]
                .iter()
                .map(|i| &offsets[*i])
                .chain(child_origins.iter())
                .map(|offset| self.layout.node_origin(offset, l - 1))
                .collect();
            origins.sort_unstable_by_key(offset_key);
            origins.dedup();

            capacity[l - 1] = origins.len();
            child_origins = origins;
        }

        debug_assert!(capacity[0] <= 1);
        capacity[0] = 1;

        let mut levels: [Level; NUM_LEVELS] = Default::default();
        for (l, level) in levels.iter_mut().enumerate() {
            *level = Level::allocate(capacity[l], self.layout.num_voxels(l), bytes_allocated)?;
        }

        Ok(levels)
    }

    fn insert_leaf(
        &self,
        levels: &mut [Level; NUM_LEVELS],
        leaf: &LeafInput,
        leaf_id: usize,
        offset: &Offset,
    ) -> Result<(), VdbError> {
        let mut node = 0;

        for l in 0..leaf.level {
            let (parents, children) = levels.split_at_mut(l + 1);
            let level = &mut parents[l];
            let v = node * self.layout.num_voxels(l) + self.layout.linear_voxel_index(offset, l);
            let is_parent = l + 1 == leaf.level;

            level.value_range[v].extend_range(&leaf.range);

            match level.voxels[v] {
                Voxel::Empty if is_parent => {
                    level.voxels[v] = match leaf.format {
                        LeafFormat::Tile => Voxel::tile(leaf.data[0]),
                        LeafFormat::Dense => {
                            Voxel::leaf_pointer(leaf_id as LeafHandle, LeafFormat::Dense)
                        }
                    };
                    level.leaf_index[v] = leaf_id as LeafHandle;
                }
                Voxel::Empty => {
                    let child = &mut children[0];
                    if child.num_nodes >= child.capacity {
                        return Err(VdbError::NodeCapacityExceeded(l + 1));
                    }
                    node = child.num_nodes;
                    child.num_nodes += 1;
                    level.voxels[v] = Voxel::child_pointer(node as u32);
                }
                Voxel::ChildPointer(child) if !is_parent => node = child as usize,
                _ => {
                    log::error!(
                        "leaf {} (level {}, origin {}) collides with a leaf on level {}",
                        leaf_id,
                        leaf.level,
                        leaf.origin,
                        l
                    );
                    return Err(VdbError::LeafCollision {
                        level: l,
                        origin: leaf.origin,
                    });
                }
            }
        }

        Ok(())
    }
}
