use crate::geometry::surface::Plane;

use super::wire::WireId;

slotmap::new_key_type! {
    /// Unique identifier for a face in the topology store.
    pub struct FaceId;
}

/// Data associated with a topological face.
///
/// A face is a bounded region on a plane, defined by an outer wire
/// and optionally inner wires (holes). The outer wire runs
/// counter-clockwise about the plane normal, inner wires clockwise.
#[derive(Debug, Clone)]
pub struct FaceData {
    /// The plane on which this face lies. Its normal is the face normal.
    pub surface: Plane,
    /// The outer boundary wire.
    pub outer_wire: WireId,
    /// Inner boundary wires (holes).
    pub inner_wires: Vec<WireId>,
}

impl FaceData {
    /// All boundary wires, outer first.
    #[must_use]
    pub fn wires(&self) -> Vec<WireId> {
        std::iter::once(self.outer_wire)
            .chain(self.inner_wires.iter().copied())
            .collect()
    }
}
