use crate::error::VdbError;
use crate::math::Real;

/// The encoding of the payload of a leaf.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum LeafFormat {
    /// The whole leaf has one constant value, the first element of its buffer.
    Tile = 0,
    /// The leaf stores one value per voxel of its level.
    Dense = 1,
}

impl LeafFormat {
    /// Decodes a raw leaf format. `leaf` is only used for error reporting.
    pub fn from_raw(format: u32, leaf: usize) -> Result<Self, VdbError> {
        match format {
            0 => Ok(Self::Tile),
            1 => Ok(Self::Dense),
            _ => Err(VdbError::UnsupportedLeafFormat { leaf, format }),
        }
    }
}

/// A handle to the payload of a leaf stored in the grid's leaf table.
pub type LeafHandle = u32;

/// The content of one cell of a grid node.
///
/// # Packed representation
///
/// [`Voxel::to_bits`] and [`Voxel::from_bits`] convert from and to a single `u64` with the
/// following layout:
///
/// | bits     | content                                                          |
/// |----------|------------------------------------------------------------------|
/// | `0..2`   | tag: `0` empty, `1` tile, `2` leaf pointer, `3` child pointer     |
/// | `2..4`   | leaf format (leaf pointers only): `0` tile, `1` dense              |
/// | `4..32`  | zero                                                             |
/// | `32..64` | tile value bits, leaf handle, or child node index                 |
///
/// # Example
///
/// ```
/// use vdbtrace::grid::Voxel;
///
/// let voxel = Voxel::child_pointer(12);
/// assert!(voxel.is_child_pointer());
/// assert_eq!(voxel.child_index(), Some(12));
/// assert_eq!(Voxel::from_bits(voxel.to_bits()), Some(voxel));
/// assert_eq!(Voxel::tile(0.5).child_index(), None);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum Voxel {
    /// Nothing below this voxel.
    #[default]
    Empty,
    /// The whole region of the voxel has one constant value.
    Tile(Real),
    /// The voxel region is described by the payload of a leaf.
    LeafPointer {
        /// Handle of the payload in the grid's leaf table.
        data: LeafHandle,
        /// Encoding of the payload.
        format: LeafFormat,
    },
    /// The voxel is refined by the node with this index in the next level.
    ChildPointer(u32),
}

const TAG_MASK: u64 = 0b11;
const TAG_EMPTY: u64 = 0;
const TAG_TILE: u64 = 1;
const TAG_LEAF: u64 = 2;
const TAG_CHILD: u64 = 3;
const FORMAT_SHIFT: u32 = 2;
const FORMAT_MASK: u64 = 0b11;
const PAYLOAD_SHIFT: u32 = 32;

impl Voxel {
    /// An empty voxel.
    #[inline]
    pub const fn empty() -> Self {
        Self::Empty
    }

    /// A voxel with a constant value.
    #[inline]
    pub const fn tile(value: Real) -> Self {
        Self::Tile(value)
    }

    /// A voxel pointing to leaf payload.
    #[inline]
    pub const fn leaf_pointer(data: LeafHandle, format: LeafFormat) -> Self {
        Self::LeafPointer { data, format }
    }

    /// A voxel pointing to the node `index` of the next level.
    #[inline]
    pub const fn child_pointer(index: u32) -> Self {
        Self::ChildPointer(index)
    }

    /// Is there nothing below this voxel?
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Is this a constant tile?
    #[inline]
    pub fn is_tile(&self) -> bool {
        matches!(self, Self::Tile(_))
    }

    /// Does this voxel point to leaf payload?
    #[inline]
    pub fn is_leaf_pointer(&self) -> bool {
        matches!(self, Self::LeafPointer { .. })
    }

    /// Does this voxel point to a child node?
    #[inline]
    pub fn is_child_pointer(&self) -> bool {
        matches!(self, Self::ChildPointer(_))
    }

    /// Is this voxel a leaf, i.e., a tile or a leaf pointer?
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.is_tile() || self.is_leaf_pointer()
    }

    /// The index of the child node, if this is a child pointer.
    #[inline]
    pub fn child_index(&self) -> Option<u32> {
        match self {
            Self::ChildPointer(index) => Some(*index),
            _ => None,
        }
    }

    /// The constant value, if this is a tile.
    #[inline]
    pub fn tile_value(&self) -> Option<Real> {
        match self {
            Self::Tile(value) => Some(*value),
            _ => None,
        }
    }

    /// The payload handle and format, if this is a leaf pointer.
    #[inline]
    pub fn leaf_handle(&self) -> Option<(LeafHandle, LeafFormat)> {
        match self {
            Self::LeafPointer { data, format } => Some((*data, *format)),
            _ => None,
        }
    }

    /// Packs this voxel into a single word.
    pub fn to_bits(&self) -> u64 {
        match *self {
            Self::Empty => TAG_EMPTY,
            Self::Tile(value) => TAG_TILE | ((value.to_bits() as u64) << PAYLOAD_SHIFT),
            Self::LeafPointer { data, format } => {
                TAG_LEAF
                    | ((format as u64) << FORMAT_SHIFT)
                    | ((data as u64) << PAYLOAD_SHIFT)
            }
            Self::ChildPointer(index) => TAG_CHILD | ((index as u64) << PAYLOAD_SHIFT),
        }
    }

    /// Unpacks a voxel packed with [`Self::to_bits`].
    ///
    /// Returns `None` if the low bits do not follow the documented layout.
    pub fn from_bits(bits: u64) -> Option<Self> {
        let payload = (bits >> PAYLOAD_SHIFT) as u32;
        let format_bits = (bits >> FORMAT_SHIFT) & FORMAT_MASK;

        if bits & 0xffff_fff0 != 0 {
            return None;
        }

        match bits & TAG_MASK {
            TAG_EMPTY if bits == TAG_EMPTY => Some(Self::Empty),
            TAG_TILE if format_bits == 0 => Some(Self::Tile(Real::from_bits(payload))),
            TAG_LEAF => {
                let format = match format_bits {
                    0 => LeafFormat::Tile,
                    1 => LeafFormat::Dense,
                    _ => return None,
                };
                Some(Self::LeafPointer {
                    data: payload,
                    format,
                })
            }
            TAG_CHILD if format_bits == 0 => Some(Self::ChildPointer(payload)),
            _ => None,
        }
    }
}
