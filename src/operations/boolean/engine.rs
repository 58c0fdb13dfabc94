use tracing::debug;

use crate::error::{OperationError, Result};
use crate::math::Point3;
use crate::tessellation::TessellateFace;
use crate::topology::{SolidId, TopologyStore};

use super::assemble::assemble_solid;
use super::bsp::{self, BspPolygon, BspTree};
use super::select::BooleanOp;

/// Executes a boolean operation on two solids.
///
/// Both boundaries are triangulated, clipped against each other in BSP
/// trees, and the surviving polygons are assembled into a new solid. The
/// inputs are left untouched.
///
/// # Errors
///
/// Returns an error if either solid cannot be tessellated or the result
/// does not assemble into a single closed solid.
pub fn boolean_execute(
    store: &mut TopologyStore,
    solid_a: SolidId,
    solid_b: SolidId,
    op: BooleanOp,
) -> Result<SolidId> {
    let polygons_a = solid_polygons(store, solid_a)?;
    let polygons_b = solid_polygons(store, solid_b)?;
    let (count_a, count_b) = (polygons_a.len(), polygons_b.len());

    let a = BspTree::new(polygons_a);
    let b = BspTree::new(polygons_b);
    let result = match op {
        BooleanOp::Union => bsp::union(a, b),
        BooleanOp::Subtract => bsp::subtract(a, b),
    };
    debug!(?op, count_a, count_b, result = result.len(), "bsp boolean");

    if result.is_empty() {
        return Err(OperationError::Failed(format!("{op:?} produced an empty solid")).into());
    }
    let loops: Vec<Vec<Point3>> = result.into_iter().map(|p| p.vertices).collect();
    assemble_solid(store, &loops)
}

/// Triangulated boundary of a solid as BSP polygons, facing outward.
fn solid_polygons(store: &TopologyStore, solid: SolidId) -> Result<Vec<BspPolygon>> {
    let mut polygons = Vec::new();
    for face in store.solid_faces(solid)? {
        let mesh = TessellateFace::new(face).execute(store)?;
        polygons.extend((0..mesh.indices.len()).filter_map(|i| BspPolygon::new(mesh.triangle(i).to_vec())));
    }
    Ok(polygons)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::MakeBox;
    use crate::operations::query::{BoundingBox, IsValid, Volume};

    fn make_box(store: &mut TopologyStore, min: [f64; 3], max: [f64; 3]) -> SolidId {
        MakeBox::new(Point3::from(min), Point3::from(max))
            .execute(store)
            .unwrap()
    }

    #[test]
    fn cavity_subtraction_keeps_floor() {
        let mut store = TopologyStore::new();
        let outer = make_box(&mut store, [-5.0, -5.0, 0.0], [5.0, 5.0, 10.0]);
        let inner = make_box(&mut store, [-4.0, -4.0, 1.0], [4.0, 4.0, 11.0]);
        let cup = boolean_execute(&mut store, outer, inner, BooleanOp::Subtract).unwrap();

        assert!(IsValid::new(cup).execute(&store));
        let volume = Volume::new(cup).execute(&store).unwrap();
        assert!((volume - (1000.0 - 64.0 * 9.0)).abs() < 1e-6);
        // Outer walls, floor, inner walls, inner floor and the rim.
        assert_eq!(store.solid_faces(cup).unwrap().len(), 11);
    }

    #[test]
    fn coplanar_subtraction_cuts_flush_notch() {
        let mut store = TopologyStore::new();
        let block = make_box(&mut store, [0.0, 0.0, 0.0], [4.0, 4.0, 4.0]);
        let notch = make_box(&mut store, [0.0, 0.0, 2.0], [2.0, 4.0, 4.0]);
        let result = boolean_execute(&mut store, block, notch, BooleanOp::Subtract).unwrap();

        assert!(IsValid::new(result).execute(&store));
        let volume = Volume::new(result).execute(&store).unwrap();
        assert!((volume - 48.0).abs() < 1e-6);
        assert_eq!(store.solid_faces(result).unwrap().len(), 8);
    }

    #[test]
    fn union_of_overlapping_boxes() {
        let mut store = TopologyStore::new();
        let a = make_box(&mut store, [0.0, 0.0, 0.0], [2.0, 2.0, 2.0]);
        let b = make_box(&mut store, [1.0, 0.0, 0.0], [3.0, 2.0, 2.0]);
        let merged = boolean_execute(&mut store, a, b, BooleanOp::Union).unwrap();

        assert!(IsValid::new(merged).execute(&store));
        assert_eq!(store.solid_faces(merged).unwrap().len(), 6);
        let aabb = BoundingBox::new(merged).execute(&store).unwrap();
        assert!((aabb.max.x - 3.0).abs() < 1e-9);
    }

    #[test]
    fn subtraction_through_the_middle_is_rejected() {
        let mut store = TopologyStore::new();
        let bar = make_box(&mut store, [0.0, 0.0, 0.0], [6.0, 1.0, 1.0]);
        let saw = make_box(&mut store, [2.0, -1.0, -1.0], [4.0, 2.0, 2.0]);
        assert!(boolean_execute(&mut store, bar, saw, BooleanOp::Subtract).is_err());
    }
}
