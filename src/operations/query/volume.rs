use crate::error::Result;
use crate::tessellation::TessellateSolid;
use crate::topology::{SolidId, TopologyStore};

/// Computes the volume of a solid.
///
/// Uses tessellation and the signed tetrahedron method. For each triangle,
/// computes `(1/6) * v0 . (v1 x v2)` and sums over all triangles. Faces are
/// triangulated counter-clockwise about their outward normals, so the sum is
/// positive for a well-formed solid and negative for one turned inside out.
pub struct Volume {
    solid: SolidId,
}

impl Volume {
    /// Creates a new `Volume` query.
    #[must_use]
    pub fn new(solid: SolidId) -> Self {
        Self { solid }
    }

    /// Executes the query, returning the signed volume.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid cannot be tessellated.
    pub fn execute(&self, store: &TopologyStore) -> Result<f64> {
        let mesh = TessellateSolid::new(self.solid).execute(store)?;
        let six_volume: f64 = (0..mesh.indices.len())
            .map(|i| {
                let [v0, v1, v2] = mesh.triangle(i);
                v0.coords.dot(&v1.coords.cross(&v2.coords))
            })
            .sum();
        Ok(six_volume / 6.0)
    }
}
