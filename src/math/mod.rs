pub mod distance_2d;
pub mod intersect_2d;
pub mod polygon_2d;
pub mod polygon_3d;

use std::f64::consts::PI;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 4x4 transformation matrix.
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Distance below which two model points are treated as the same vertex.
pub const LINEAR_TOLERANCE: f64 = 1e-6;

/// Largest angle spanned by one chord when an arc is discretized.
pub const ARC_STEP: f64 = PI / 24.0;

/// Number of chords used to approximate an arc sweeping `angle` radians.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn arc_segments(angle: f64) -> usize {
    // Shave rounding noise so exact multiples of the step do not gain a chord.
    ((angle.abs() / ARC_STEP - 1e-9).ceil() as usize).max(1)
}
