use crate::error::Result;
use crate::math::{Matrix4, Vector3};
use crate::operations::creation::{MakeFace, MakeWire};
use crate::topology::{FaceId, TopologyStore};

use super::general::transform_point;

/// Creates an independent, transformed copy of a face.
///
/// The copy gets its own vertices, edges and wires; the source face is not
/// touched.
pub struct CopyFace {
    face: FaceId,
    matrix: Matrix4,
}

impl CopyFace {
    /// Creates a new `CopyFace` operation producing an untransformed copy.
    #[must_use]
    pub fn new(face: FaceId) -> Self {
        Self {
            face,
            matrix: Matrix4::identity(),
        }
    }

    /// Translates the copy by `offset`.
    #[must_use]
    pub fn translated(mut self, offset: Vector3) -> Self {
        self.matrix = Matrix4::new_translation(&offset) * self.matrix;
        self
    }

    /// Executes the copy, creating the new face in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if the source face is missing or the transformed
    /// boundary is no longer a valid face.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<FaceId> {
        let face = store.face(self.face)?;
        let outer = face.outer_wire;
        let inners = face.inner_wires.clone();

        let outer_copy = self.copy_wire(store, outer)?;
        let mut inner_copies = Vec::with_capacity(inners.len());
        for wire in inners {
            inner_copies.push(self.copy_wire(store, wire)?);
        }
        MakeFace::new(outer_copy, inner_copies).execute(store)
    }

    fn copy_wire(
        &self,
        store: &mut TopologyStore,
        wire: crate::topology::WireId,
    ) -> Result<crate::topology::WireId> {
        let points = store
            .wire_points(wire)?
            .iter()
            .map(|p| transform_point(&self.matrix, p))
            .collect();
        MakeWire::new(points, true).execute(store)
    }
}
