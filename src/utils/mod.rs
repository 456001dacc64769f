//! Value ranges, affine transforms, and root finding.

pub use self::affine::AffineTransform;
pub use self::root::{bisect_root, brackets_zero, DEFAULT_MAX_BISECTIONS};
pub use self::value_range::ValueRange;

mod affine;
mod root;
mod value_range;
