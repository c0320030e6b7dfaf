//! Angle arithmetic on the 360° circle.
//!
//! Angles follow screen-independent math convention: 0° points right, 90° up,
//! 180° left and 270° down.

use crate::error::AtlasError;

/// Frame angles are whole degrees in `[0, 360)`.
pub type Degrees = u16;

/// The angles swept by a generator stepping around the circle by `step`
/// degrees, starting at 0°.
pub fn angles_for_step(step: u32) -> Result<Vec<Degrees>, AtlasError> {
    if step == 0 || step > 360 {
        return Err(AtlasError::configuration(format!(
            "step must be between 1 and 360, got {}",
            step
        )));
    }

    Ok((0..360).step_by(step as usize).collect())
}

/// Wraps any angle into `[0, 360)`.
pub fn normalize(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);

    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// The angle of `pointer` as seen from `anchor`, in screen coordinates where y
/// grows downward.
pub fn pointer_angle(anchor: (f64, f64), pointer: (f64, f64)) -> f64 {
    let dx = pointer.0 - anchor.0;
    let dy = pointer.1 - anchor.1;

    normalize((-dy).atan2(dx).to_degrees())
}

pub fn circular_distance(a: f64, b: f64) -> f64 {
    let diff = (normalize(a) - normalize(b)).abs();
    diff.min(360.0 - diff)
}

/// Picks the angle in `angles` closest to `raw` around the circle. Ties go to
/// the lower angle.
///
/// Returns `None` only if `angles` is empty.
pub fn nearest_angle(angles: &[Degrees], raw: f64) -> Option<Degrees> {
    let mut best: Option<(Degrees, f64)> = None;

    for &angle in angles {
        let distance = circular_distance(f64::from(angle), raw);

        best = match best {
            Some((best_angle, best_distance))
                if best_distance < distance
                    || (best_distance == distance && best_angle <= angle) =>
            {
                Some((best_angle, best_distance))
            }
            _ => Some((angle, distance)),
        };
    }

    best.map(|(angle, _)| angle)
}
