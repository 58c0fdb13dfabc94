use std::collections::HashMap;

use crate::error::Result;
use crate::math::{Point3, Vector3};
use crate::topology::{EdgeId, FaceId, SolidId, TopologyStore, VertexId};

/// Edge and vertex incidence of a solid's faces.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    /// Faces in shell order.
    pub faces: Vec<FaceId>,
    /// Faces using each edge, in shell order.
    pub edge_faces: HashMap<EdgeId, Vec<FaceId>>,
    /// Faces touching each vertex, in shell order.
    pub vertex_faces: HashMap<VertexId, Vec<FaceId>>,
    /// Outward unit normal of each face.
    pub face_normals: HashMap<FaceId, Vector3>,
    /// Boundary loops of each face as points, outer loop first.
    pub face_loops: HashMap<FaceId, Vec<Vec<Point3>>>,
}

impl Adjacency {
    /// Faces sharing `edge`.
    #[must_use]
    pub fn faces_of_edge(&self, edge: EdgeId) -> &[FaceId] {
        self.edge_faces.get(&edge).map_or(&[][..], Vec::as_slice)
    }

    /// Faces touching `vertex`.
    #[must_use]
    pub fn faces_of_vertex(&self, vertex: VertexId) -> &[FaceId] {
        self.vertex_faces.get(&vertex).map_or(&[][..], Vec::as_slice)
    }

    /// Outward normal of `face`.
    #[must_use]
    pub fn normal(&self, face: FaceId) -> Option<&Vector3> {
        self.face_normals.get(&face)
    }
}

/// Builds the [`Adjacency`] of a solid.
pub struct SolidAdjacency {
    solid: SolidId,
}

impl SolidAdjacency {
    /// Creates a new `SolidAdjacency` query.
    #[must_use]
    pub fn new(solid: SolidId) -> Self {
        Self { solid }
    }

    /// Executes the query.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid or any of its topology is missing.
    pub fn execute(&self, store: &TopologyStore) -> Result<Adjacency> {
        let mut adjacency = Adjacency {
            faces: store.solid_faces(self.solid)?,
            ..Adjacency::default()
        };
        for &face in &adjacency.faces {
            let data = store.face(face)?;
            adjacency
                .face_normals
                .insert(face, *data.surface.plane_normal());
            let mut loops = Vec::with_capacity(1 + data.inner_wires.len());
            for wire in data.wires() {
                for oe in &store.wire(wire)?.edges {
                    push_unique(adjacency.edge_faces.entry(oe.edge).or_default(), face);
                    let vertex = store.oriented_start(*oe)?;
                    push_unique(adjacency.vertex_faces.entry(vertex).or_default(), face);
                }
                loops.push(store.wire_points(wire)?);
            }
            adjacency.face_loops.insert(face, loops);
        }
        Ok(adjacency)
    }
}

fn push_unique(faces: &mut Vec<FaceId>, face: FaceId) {
    if !faces.contains(&face) {
        faces.push(face);
    }
}
