use tracing::debug;

use crate::error::{OperationError, Result};
use crate::math::polygon_3d::{max_plane_deviation, newell_normal, signed_volume};
use crate::math::{Point3, LINEAR_TOLERANCE};
use crate::operations::boolean::assemble_solid;
use crate::topology::{SolidId, TopologyStore, WireId};

/// Ruled loft through a sequence of closed wires.
///
/// Consecutive sections are joined vertex-to-vertex, so every section must
/// have the same number of edges. The first and last sections are capped
/// with planar faces.
pub struct Loft {
    sections: Vec<WireId>,
}

impl Loft {
    /// Creates a new `Loft` operation.
    #[must_use]
    pub fn new(sections: Vec<WireId>) -> Self {
        Self { sections }
    }

    /// Executes the loft, creating the solid in the topology store.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] for fewer than two sections,
    /// an open section, or sections with differing edge counts. Fails if the
    /// sections do not bound a single closed solid.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<SolidId> {
        if self.sections.len() < 2 {
            return Err(OperationError::InvalidInput(format!(
                "loft needs at least 2 sections, got {}",
                self.sections.len()
            ))
            .into());
        }

        let mut rings: Vec<Vec<Point3>> = Vec::with_capacity(self.sections.len());
        for (index, &wire) in self.sections.iter().enumerate() {
            if !store.wire(wire)?.is_closed {
                return Err(OperationError::InvalidInput(format!(
                    "loft section {index} is not closed"
                ))
                .into());
            }
            rings.push(store.wire_points(wire)?);
        }
        let n = rings[0].len();
        if let Some(index) = rings.iter().position(|ring| ring.len() != n) {
            return Err(OperationError::InvalidInput(format!(
                "loft section {index} has {} edges, expected {n}",
                rings[index].len()
            ))
            .into());
        }

        let polygons = ruled_polygons(&rings, false);
        debug!(sections = rings.len(), edges = n, "loft");
        assemble_solid(store, &polygons)
    }
}

/// Outward-facing polygons of a ruled sweep through rings of equal length.
///
/// Open sweeps are capped with the first and last rings. A periodic sweep
/// joins the last ring back to the first and has no caps.
pub(crate) fn ruled_polygons(rings: &[Vec<Point3>], periodic: bool) -> Vec<Vec<Point3>> {
    let Some(first) = rings.first() else {
        return Vec::new();
    };
    let n = first.len();
    let spans = if periodic { rings.len() } else { rings.len() - 1 };

    let mut polygons = Vec::with_capacity(2 + 2 * n * spans);
    if !periodic {
        polygons.push(first.iter().rev().copied().collect::<Vec<_>>());
    }
    for s in 0..spans {
        let (lower, upper) = (&rings[s], &rings[(s + 1) % rings.len()]);
        for i in 0..n {
            let j = (i + 1) % n;
            push_side(&mut polygons, [lower[i], lower[j], upper[j], upper[i]]);
        }
    }
    if !periodic {
        polygons.push(rings[rings.len() - 1].clone());
    }

    if signed_volume(&polygons) < 0.0 {
        for polygon in &mut polygons {
            polygon.reverse();
        }
    }
    polygons
}

/// Adds a side quad, split along a diagonal when it is twisted.
fn push_side(polygons: &mut Vec<Vec<Point3>>, quad: [Point3; 4]) {
    let flat = newell_normal(&quad)
        .is_some_and(|normal| max_plane_deviation(&quad, &quad[0], &normal) <= LINEAR_TOLERANCE);
    if flat {
        polygons.push(quad.to_vec());
    } else {
        polygons.push(vec![quad[0], quad[1], quad[2]]);
        polygons.push(vec![quad[0], quad[2], quad[3]]);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::MakeWire;
    use crate::operations::query::{IsValid, Volume};

    fn square(store: &mut TopologyStore, half: f64, z: f64) -> WireId {
        MakeWire::new(
            vec![
                Point3::new(-half, -half, z),
                Point3::new(half, -half, z),
                Point3::new(half, half, z),
                Point3::new(-half, half, z),
            ],
            true,
        )
        .execute(store)
        .unwrap()
    }

    #[test]
    fn prism_between_equal_squares() {
        let mut store = TopologyStore::new();
        let bottom = square(&mut store, 1.0, 0.0);
        let top = square(&mut store, 1.0, 3.0);
        let solid = Loft::new(vec![bottom, top]).execute(&mut store).unwrap();
        assert!(IsValid::new(solid).execute(&store));
        assert!((Volume::new(solid).execute(&store).unwrap() - 12.0).abs() < 1e-9);
        assert_eq!(store.solid_faces(solid).unwrap().len(), 6);
    }

    #[test]
    fn downward_loft_is_reoriented() {
        let mut store = TopologyStore::new();
        let top = square(&mut store, 1.0, 0.0);
        let bottom = square(&mut store, 1.0, -2.0);
        let solid = Loft::new(vec![top, bottom]).execute(&mut store).unwrap();
        assert!((Volume::new(solid).execute(&store).unwrap() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn frustum_through_three_sections() {
        let mut store = TopologyStore::new();
        let a = square(&mut store, 2.0, 0.0);
        let b = square(&mut store, 1.5, 1.0);
        let c = square(&mut store, 1.0, 2.0);
        let solid = Loft::new(vec![a, b, c]).execute(&mut store).unwrap();
        assert!(IsValid::new(solid).execute(&store));
        // Two stacked frusta: h/3 * (A1 + A2 + sqrt(A1 A2)).
        let expected = (16.0 + 9.0 + 12.0) / 3.0 + (9.0 + 4.0 + 6.0) / 3.0;
        assert!((Volume::new(solid).execute(&store).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn mismatched_edge_counts_are_rejected() {
        let mut store = TopologyStore::new();
        let quad = square(&mut store, 1.0, 0.0);
        let tri = MakeWire::new(
            vec![
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(1.0, 0.0, 1.0),
                Point3::new(0.0, 1.0, 1.0),
            ],
            true,
        )
        .execute(&mut store)
        .unwrap();
        let err = Loft::new(vec![quad, tri]).execute(&mut store).unwrap_err();
        assert!(matches!(
            err,
            crate::error::BoxlidError::Operation(OperationError::InvalidInput(_))
        ));
    }

    #[test]
    fn single_section_is_rejected() {
        let mut store = TopologyStore::new();
        let quad = square(&mut store, 1.0, 0.0);
        assert!(Loft::new(vec![quad]).execute(&mut store).is_err());
    }

    #[test]
    fn open_section_is_rejected() {
        let mut store = TopologyStore::new();
        let quad = square(&mut store, 1.0, 0.0);
        let open = MakeWire::new(
            vec![
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(1.0, 0.0, 1.0),
                Point3::new(1.0, 1.0, 1.0),
                Point3::new(0.0, 1.0, 1.0),
            ],
            false,
        )
        .execute(&mut store)
        .unwrap();
        assert!(Loft::new(vec![quad, open]).execute(&mut store).is_err());
    }
}
