use crate::math::Real;
use crate::utils::ValueRange;

/// The default maximum number of bisection steps. Enough to exhaust the
/// mantissa of a `f32` on any bracket.
pub const DEFAULT_MAX_BISECTIONS: usize = 48;

/// Do `fa` and `fb` lie on opposite sides of zero?
///
/// An exact zero at either end counts as a crossing.
#[inline]
pub fn brackets_zero(fa: Real, fb: Real) -> bool {
    (fa <= 0.0 && fb >= 0.0) || (fa >= 0.0 && fb <= 0.0)
}

/// Locates a root of `f` on `[a, b]` by bisection.
///
/// `fa` must be `f(a)`, and `f(a)`, `f(b)` must bracket zero (see [`brackets_zero`]).
/// The search stops once the bracket is narrower than `tolerance` or after
/// `max_iterations` halvings. The final bracket is returned; it is always contained in
/// `[a, b]` and still brackets zero.
pub fn bisect_root(
    f: impl Fn(Real) -> Real,
    mut a: Real,
    mut fa: Real,
    mut b: Real,
    tolerance: Real,
    max_iterations: usize,
) -> ValueRange {
    if fa == 0.0 {
        return ValueRange::splat(a);
    }

    for _ in 0..max_iterations {
        if b - a <= tolerance {
            break;
        }

        let mid = (a + b) * 0.5;
        if mid <= a || mid >= b {
            // No representable value left between the bounds.
            break;
        }

        let fmid = f(mid);
        if fmid == 0.0 {
            return ValueRange::splat(mid);
        }

        if brackets_zero(fa, fmid) {
            b = mid;
        } else {
            a = mid;
            fa = fmid;
        }
    }

    ValueRange::new(a, b)
}
