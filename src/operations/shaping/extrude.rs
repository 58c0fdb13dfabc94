use crate::error::{OperationError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::operations::boolean::assemble_solid;
use crate::tessellation::triangulate_loops;
use crate::topology::{FaceId, SolidId, TopologyStore};

/// Extrudes a planar face along a direction vector to create a solid.
///
/// Holes in the face become through-holes of the prism.
pub struct Extrude {
    face: FaceId,
    direction: Vector3,
}

impl Extrude {
    /// Creates a new `Extrude` operation.
    #[must_use]
    pub fn new(face: FaceId, direction: Vector3) -> Self {
        Self { face, direction }
    }

    /// Executes the extrusion, creating the solid in the topology store.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] if the direction is zero-length
    /// or lies in the plane of the face.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<SolidId> {
        if self.direction.norm() < TOLERANCE {
            return Err(
                OperationError::InvalidInput("extrude direction must be non-zero".into()).into(),
            );
        }

        let face = store.face(self.face)?;
        let plane = face.surface.clone();
        let along = plane.plane_normal().dot(&self.direction);
        if along.abs() < TOLERANCE {
            return Err(OperationError::InvalidInput(
                "extrude direction lies in the face plane".into(),
            )
            .into());
        }
        let loops = face
            .wires()
            .into_iter()
            .map(|wire| store.wire_points(wire))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let d = self.direction;
        let cap = triangulate_loops(&plane, &loops)?;
        let mut polygons: Vec<Vec<Point3>> = Vec::with_capacity(2 * cap.indices.len());
        for i in 0..cap.indices.len() {
            let [a, b, c] = cap.triangle(i);
            // Cap triangles run CCW about the face normal.
            if along > 0.0 {
                polygons.push(vec![c, b, a]);
                polygons.push(vec![a + d, b + d, c + d]);
            } else {
                polygons.push(vec![a, b, c]);
                polygons.push(vec![c + d, b + d, a + d]);
            }
        }

        for points in &loops {
            let n = points.len();
            for i in 0..n {
                let (p, q) = (points[i], points[(i + 1) % n]);
                let mut side = vec![p, q, q + d, p + d];
                if along < 0.0 {
                    side.reverse();
                }
                polygons.push(side);
            }
        }

        assemble_solid(store, &polygons)
    }
}
