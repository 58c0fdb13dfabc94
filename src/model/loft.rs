use crate::error::{OperationError, Result};
use crate::operations::boolean::Subtract;
use crate::operations::shaping::Loft;
use crate::topology::{FaceId, SolidId, TopologyStore};

/// Lofts two faces with matching topology into one solid.
///
/// The outer wires are lofted into the body and each pair of inner wires is
/// lofted and cut out of it, so holes run through the result. Neither face
/// is modified.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`] if the faces have different
/// numbers of inner wires, or paired wires have different edge counts.
/// Boolean failures propagate unchanged.
pub fn loft_faces(store: &mut TopologyStore, first: FaceId, second: FaceId) -> Result<SolidId> {
    let (outer_a, inner_a) = {
        let face = store.face(first)?;
        (face.outer_wire, face.inner_wires.clone())
    };
    let (outer_b, inner_b) = {
        let face = store.face(second)?;
        (face.outer_wire, face.inner_wires.clone())
    };
    if inner_a.len() != inner_b.len() {
        return Err(OperationError::InvalidInput(format!(
            "faces have {} and {} inner wires",
            inner_a.len(),
            inner_b.len()
        ))
        .into());
    }

    let mut solid = Loft::new(vec![outer_a, outer_b]).execute(store)?;
    for (wire_a, wire_b) in inner_a.into_iter().zip(inner_b) {
        let hole = Loft::new(vec![wire_a, wire_b]).execute(store)?;
        solid = Subtract::new(solid, hole).execute(store)?;
    }
    Ok(solid)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::error::BoxlidError;
    use crate::math::{Point3, Vector3};
    use crate::operations::creation::{MakeFace, MakeWire};
    use crate::operations::query::{IsValid, Volume};
    use crate::operations::transform::CopyFace;
    use crate::topology::WireId;

    fn square(store: &mut TopologyStore, half: f64) -> WireId {
        MakeWire::new(
            vec![
                Point3::new(-half, -half, 0.0),
                Point3::new(half, -half, 0.0),
                Point3::new(half, half, 0.0),
                Point3::new(-half, half, 0.0),
            ],
            true,
        )
        .execute(store)
        .unwrap()
    }

    #[test]
    fn ring_face_lofts_into_a_tube() {
        let mut store = TopologyStore::new();
        let outer = square(&mut store, 3.0);
        let inner = square(&mut store, 1.0);
        let face = MakeFace::new(outer, vec![inner]).execute(&mut store).unwrap();
        let copy = CopyFace::new(face)
            .translated(Vector3::new(0.0, 0.0, -2.0))
            .execute(&mut store)
            .unwrap();

        let solid = loft_faces(&mut store, face, copy).unwrap();
        assert!(IsValid::new(solid).execute(&store));
        assert_relative_eq!(
            Volume::new(solid).execute(&store).unwrap(),
            (36.0 - 4.0) * 2.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn inner_wire_count_mismatch_is_rejected() {
        let mut store = TopologyStore::new();
        let outer = square(&mut store, 3.0);
        let inner = square(&mut store, 1.0);
        let ring = MakeFace::new(outer, vec![inner]).execute(&mut store).unwrap();
        let plain_outer = square(&mut store, 3.0);
        let plain = MakeFace::new(plain_outer, vec![]).execute(&mut store).unwrap();
        let lowered = CopyFace::new(plain)
            .translated(Vector3::new(0.0, 0.0, -1.0))
            .execute(&mut store)
            .unwrap();

        let result = loft_faces(&mut store, ring, lowered);
        assert!(matches!(
            result,
            Err(BoxlidError::Operation(OperationError::InvalidInput(_)))
        ));
    }
}
