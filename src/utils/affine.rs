use crate::math::{Matrix, Point, Real, Vector};

/// An affine transform `x ↦ linear * x + translation` between the index space of a grid
/// and object space.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct AffineTransform {
    /// The linear part of the transform.
    pub linear: Matrix<Real>,
    /// The translation part of the transform.
    pub translation: Vector<Real>,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    /// The identity transform.
    pub fn identity() -> Self {
        Self {
            linear: Matrix::identity(),
            translation: Vector::zeros(),
        }
    }

    /// A transform scaling each axis then translating.
    pub fn from_scale_translation(scale: Vector<Real>, translation: Vector<Real>) -> Self {
        Self {
            linear: Matrix::from_diagonal(&scale),
            translation,
        }
    }

    /// Reads a transform from 12 floats: four rows of three values holding the images of
    /// the `x`, `y` and `z` axes, then the translation.
    ///
    /// Slices shorter than 12 elements yield the identity.
    pub fn from_slice(values: &[Real]) -> Self {
        if values.len() < 12 {
            return Self::identity();
        }

        let vx = Vector::new(values[0], values[1], values[2]);
        let vy = Vector::new(values[3], values[4], values[5]);
        let vz = Vector::new(values[6], values[7], values[8]);

        Self {
            linear: Matrix::from_columns(&[vx, vy, vz]),
            translation: Vector::new(values[9], values[10], values[11]),
        }
    }

    /// The inverse transform, if the linear part is invertible.
    pub fn try_inverse(&self) -> Option<Self> {
        let linear = self.linear.try_inverse()?;
        let translation = -(linear * self.translation);
        Some(Self {
            linear,
            translation,
        })
    }

    /// Transforms a point.
    #[inline]
    pub fn transform_point(&self, pt: &Point<Real>) -> Point<Real> {
        Point::from(self.linear * pt.coords + self.translation)
    }

    /// Transforms a vector; the translation is ignored.
    #[inline]
    pub fn transform_vector(&self, v: &Vector<Real>) -> Vector<Real> {
        self.linear * v
    }
}
