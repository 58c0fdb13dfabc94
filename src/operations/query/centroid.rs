use crate::error::{OperationError, Result};
use crate::math::{Point3, Vector3};
use crate::tessellation::TessellateFace;
use crate::topology::{FaceId, TopologyStore};

/// Area-weighted centroid of a planar face, holes excluded.
pub struct FaceCentroid {
    face: FaceId,
}

impl FaceCentroid {
    /// Creates a new `FaceCentroid` query.
    #[must_use]
    pub fn new(face: FaceId) -> Self {
        Self { face }
    }

    /// Executes the query.
    ///
    /// # Errors
    ///
    /// Returns an error if the face cannot be tessellated or has no area.
    pub fn execute(&self, store: &TopologyStore) -> Result<Point3> {
        let mesh = TessellateFace::new(self.face).execute(store)?;
        let mut weighted = Vector3::zeros();
        let mut total = 0.0;
        for i in 0..mesh.indices.len() {
            let [a, b, c] = mesh.triangle(i);
            let area = (b - a).cross(&(c - a)).norm() * 0.5;
            weighted += (a.coords + b.coords + c.coords) * (area / 3.0);
            total += area;
        }
        if total <= f64::EPSILON {
            return Err(OperationError::Failed("face has zero area".into()).into());
        }
        Ok(Point3::from(weighted / total))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::{MakeFace, MakeWire};

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 2.0)
    }

    #[test]
    fn rectangle_centroid() {
        let mut store = TopologyStore::new();
        let wire = MakeWire::new(vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 2.0), p(0.0, 2.0)], true)
            .execute(&mut store)
            .unwrap();
        let face = MakeFace::new(wire, vec![]).execute(&mut store).unwrap();
        let c = FaceCentroid::new(face).execute(&store).unwrap();
        assert!((c - Point3::new(2.0, 1.0, 2.0)).norm() < 1e-9);
    }

    #[test]
    fn l_shape_centroid_is_area_weighted() {
        let mut store = TopologyStore::new();
        let wire = MakeWire::new(
            vec![
                p(0.0, 0.0),
                p(4.0, 0.0),
                p(4.0, 2.0),
                p(2.0, 2.0),
                p(2.0, 4.0),
                p(0.0, 4.0),
            ],
            true,
        )
        .execute(&mut store)
        .unwrap();
        let face = MakeFace::new(wire, vec![]).execute(&mut store).unwrap();
        let c = FaceCentroid::new(face).execute(&store).unwrap();
        // Pieces: [0,4]x[0,2] area 8 at (2,1); [0,2]x[2,4] area 4 at (1,3).
        let expected = (8.0 * 2.0 + 4.0 * 1.0) / 12.0;
        assert!((c.x - expected).abs() < 1e-9);
        assert!((c.y - (8.0 * 1.0 + 4.0 * 3.0) / 12.0).abs() < 1e-9);
    }
}
