use crate::error::VdbError;
use std::sync::Arc;

/// The element types a volume may be configured with.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum DataType {
    /// 8-bit unsigned integers.
    UChar,
    /// 16-bit signed integers.
    Short,
    /// 16-bit unsigned integers.
    UShort,
    /// 32-bit unsigned integers.
    UInt,
    /// 32-bit floats. The only type grids can be built from.
    #[default]
    Float,
    /// 64-bit floats.
    Double,
}

impl DataType {
    /// A short human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::UChar => "uchar",
            Self::Short => "short",
            Self::UShort => "ushort",
            Self::UInt => "uint",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Fails unless this is the element type grids are built from.
    pub fn ensure_supported(self) -> Result<(), VdbError> {
        if self == Self::Float {
            Ok(())
        } else {
            Err(VdbError::UnsupportedDataType(self.name()))
        }
    }
}

/// A shared, typed buffer holding the payload of one leaf.
///
/// Buffers are reference counted so that the caller and the grid can both hold them
/// without copying the voxel values.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum DataBuffer {
    /// 32-bit floats.
    Float(Arc<[f32]>),
    /// 32-bit unsigned integers.
    UInt(Arc<[u32]>),
    /// 64-bit floats.
    Double(Arc<[f64]>),
}

impl From<Vec<f32>> for DataBuffer {
    fn from(values: Vec<f32>) -> Self {
        Self::Float(values.into())
    }
}

impl DataBuffer {
    /// A float buffer holding a single value.
    pub fn constant(value: f32) -> Self {
        Self::Float(Arc::from([value]))
    }

    /// The number of elements of this buffer.
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::UInt(v) => v.len(),
            Self::Double(v) => v.len(),
        }
    }

    /// Does this buffer contain no elements?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element type of this buffer.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Float(_) => DataType::Float,
            Self::UInt(_) => DataType::UInt,
            Self::Double(_) => DataType::Double,
        }
    }

    /// The elements of this buffer if they are floats.
    pub fn as_f32(&self) -> Option<&Arc<[f32]>> {
        match self {
            Self::Float(v) => Some(v),
            _ => None,
        }
    }
}
