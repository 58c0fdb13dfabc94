use nalgebra::{Rotation3, Unit};

use crate::error::{OperationError, Result};
use crate::math::{Matrix4, Point3, Vector3, TOLERANCE};
use crate::topology::{SolidId, TopologyStore};

use super::GeneralTransform;

/// Rigid rotation of a solid about an arbitrary axis.
pub struct Rotate {
    solid: SolidId,
    axis_origin: Point3,
    axis_direction: Vector3,
    angle: f64,
}

impl Rotate {
    /// Creates a new `Rotate` operation.
    ///
    /// * `angle` - Rotation angle in radians, counter-clockwise about the
    ///   axis direction.
    #[must_use]
    pub fn new(solid: SolidId, axis_origin: Point3, axis_direction: Vector3, angle: f64) -> Self {
        Self {
            solid,
            axis_origin,
            axis_direction,
            angle,
        }
    }

    /// Executes the rotation, modifying the solid in-place.
    ///
    /// # Errors
    ///
    /// Returns an error if the axis direction is zero-length.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<()> {
        let axis = Unit::try_new(self.axis_direction, TOLERANCE).ok_or_else(|| {
            OperationError::InvalidInput("rotation axis must be non-zero".into())
        })?;
        let pivot = self.axis_origin.coords;
        let matrix = Matrix4::new_translation(&pivot)
            * Rotation3::from_axis_angle(&axis, self.angle).to_homogeneous()
            * Matrix4::new_translation(&-pivot);

        GeneralTransform::new(self.solid, matrix).execute(store)
    }
}
