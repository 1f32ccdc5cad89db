//! Pose geometry
//!
//! Gesture predicates reduce a limb to angles between joint vectors that
//! share a pivot joint.

use crate::{Position3D, SapienError, SapienResult};

/// Vectors shorter than this are treated as degenerate
pub const DEGENERATE_EPSILON: f64 = 1e-9;

/// Angle in degrees, in `[0, 180]`, between `a - pivot` and `b - pivot`.
///
/// Fails with `DegenerateGeometry` when either joint sits on the pivot.
pub fn angle(a: Position3D, b: Position3D, pivot: Position3D) -> SapienResult<f64> {
    let va = a - pivot;
    let vb = b - pivot;

    let ma = va.magnitude();
    let mb = vb.magnitude();

    for magnitude in [ma, mb] {
        if !magnitude.is_finite() {
            return Err(SapienError::NonFinitePosition);
        }
        if magnitude < DEGENERATE_EPSILON {
            return Err(SapienError::DegenerateGeometry { magnitude });
        }
    }

    // Rounding can push the cosine slightly outside [-1, 1]
    let cos = (va.dot(&vb) / (ma * mb)).clamp(-1.0, 1.0);
    Ok(cos.acos().to_degrees())
}
