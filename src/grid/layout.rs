use crate::error::VdbError;
use crate::math::Offset;

/// The number of levels of every grid, root included.
pub const NUM_LEVELS: usize = 4;

/// The log2 of the number of voxels per axis of the nodes of each level, root first.
pub const DEFAULT_LOG_RESOLUTION: [u32; NUM_LEVELS] = [6, 5, 4, 3];

/// The largest supported log2 resolution of a single level.
pub const MAX_LEVEL_LOG_RESOLUTION: u32 = 10;

/// The largest supported log2 span of the root node, so that offsets fit in `u32`.
pub const MAX_TOTAL_LOG_RESOLUTION: u32 = 30;

/// The branching factors of the levels of a grid.
///
/// Level `l` nodes have `2^log_res(l)` voxels per axis. Resolutions are powers of two so
/// that all the address computations are bit masks and shifts on unsigned offsets from
/// the root origin:
///
/// * a node of level `l` spans [`Self::level_res`]`(l)` index units per axis;
/// * a voxel of level `l` spans [`Self::voxel_res`]`(l) = level_res(l + 1)` units;
/// * a leaf inserted on level `l` covers one node of level `l`, and is referenced from a
///   voxel of level `l - 1`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde-serialize",
    derive(Serialize, Deserialize),
    serde(try_from = "[u32; NUM_LEVELS]", into = "[u32; NUM_LEVELS]")
)]
pub struct GridLayout {
    log_res: [u32; NUM_LEVELS],
    // total_log_res[l] = sum(log_res[l..]), with total_log_res[NUM_LEVELS] = 0.
    total_log_res: [u32; NUM_LEVELS + 1],
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::from_valid(DEFAULT_LOG_RESOLUTION)
    }
}

impl TryFrom<[u32; NUM_LEVELS]> for GridLayout {
    type Error = VdbError;

    fn try_from(log_res: [u32; NUM_LEVELS]) -> Result<Self, VdbError> {
        Self::new(log_res)
    }
}

impl From<GridLayout> for [u32; NUM_LEVELS] {
    fn from(layout: GridLayout) -> Self {
        layout.log_res
    }
}

impl GridLayout {
    /// Creates a layout from the log2 resolution of each level, root first.
    pub fn new(log_res: [u32; NUM_LEVELS]) -> Result<Self, VdbError> {
        if log_res
            .iter()
            .any(|r| *r == 0 || *r > MAX_LEVEL_LOG_RESOLUTION)
        {
            return Err(VdbError::InvalidLayout(
                "every level must have a log resolution in 1..=10",
            ));
        }

        if log_res.iter().sum::<u32>() > MAX_TOTAL_LOG_RESOLUTION {
            return Err(VdbError::InvalidLayout(
                "the root node must not span more than 2^30 voxels per axis",
            ));
        }

        Ok(Self::from_valid(log_res))
    }

    fn from_valid(log_res: [u32; NUM_LEVELS]) -> Self {
        let mut total_log_res = [0; NUM_LEVELS + 1];
        for l in (0..NUM_LEVELS).rev() {
            total_log_res[l] = total_log_res[l + 1] + log_res[l];
        }

        Self {
            log_res,
            total_log_res,
        }
    }

    /// The log2 number of voxels per axis of the nodes of level `level`.
    #[inline]
    pub fn log_res(&self, level: usize) -> u32 {
        self.log_res[level]
    }

    /// The log2 span, in index units, of a node of level `level`.
    ///
    /// `level` may be `NUM_LEVELS`, which gives zero (a single index voxel).
    #[inline]
    pub fn total_log_res(&self, level: usize) -> u32 {
        self.total_log_res[level]
    }

    /// The span, in index units, of a node of level `level` along each axis.
    #[inline]
    pub fn level_res(&self, level: usize) -> u32 {
        1 << self.total_log_res[level]
    }

    /// The span, in index units, of a voxel of level `level` along each axis.
    #[inline]
    pub fn voxel_res(&self, level: usize) -> u32 {
        self.level_res(level + 1)
    }

    /// The number of voxels of a node of level `level`.
    #[inline]
    pub fn num_voxels(&self, level: usize) -> usize {
        1 << (3 * self.log_res[level])
    }

    /// The origin of the level `level` node containing `offset`.
    ///
    /// Node origins are obtained by masking out the lower bits of the offset.
    #[inline]
    pub fn node_origin(&self, offset: &Offset, level: usize) -> Offset {
        let mask = !(self.level_res(level) - 1);
        Offset::new(offset.x & mask, offset.y & mask, offset.z & mask)
    }

    /// The coordinates of the voxel containing `offset` inside its level `level` node.
    #[inline]
    pub fn voxel_coords(&self, offset: &Offset, level: usize) -> [u32; 3] {
        // The lower bits are the offset from the node origin. Shifting by the
        // child log resolution gives the voxel coordinates.
        let mask = self.level_res(level) - 1;
        let shift = self.total_log_res[level + 1];
        [
            (offset.x & mask) >> shift,
            (offset.y & mask) >> shift,
            (offset.z & mask) >> shift,
        ]
    }

    /// The linear index, inside its level `level` node, of the voxel containing `offset`.
    ///
    /// Voxels are stored with `x` varying slowest and `z` fastest.
    #[inline]
    pub fn linear_voxel_index(&self, offset: &Offset, level: usize) -> usize {
        let [x, y, z] = self.voxel_coords(offset, level);
        self.linearize(x, y, z, level)
    }

    /// The linear index of the voxel with coordinates `(x, y, z)` in a level `level` node.
    #[inline]
    pub fn linearize(&self, x: u32, y: u32, z: u32, level: usize) -> usize {
        let shift = self.log_res[level];
        ((x as usize) << (2 * shift)) + ((y as usize) << shift) + z as usize
    }
}
