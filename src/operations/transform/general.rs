use std::collections::HashSet;

use crate::error::Result;
use crate::geometry::curve::Line;
use crate::geometry::surface::Plane;
use crate::math::{Matrix4, Point3};
use crate::topology::{EdgeId, FaceId, SolidId, TopologyStore, VertexId};

/// Applies an arbitrary 4x4 transformation matrix to a solid.
pub struct GeneralTransform {
    solid: SolidId,
    matrix: Matrix4,
}

impl GeneralTransform {
    /// Creates a new `GeneralTransform` operation.
    #[must_use]
    pub fn new(solid: SolidId, matrix: Matrix4) -> Self {
        Self { solid, matrix }
    }

    /// Executes the transformation, modifying the solid in-place.
    ///
    /// Transforms all vertex positions using the 4x4 matrix, then rebuilds
    /// each edge line and face plane from the updated vertex positions.
    ///
    /// # Errors
    ///
    /// Returns an error if any topology entity is missing or an edge or face
    /// degenerates under the transform.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<()> {
        let faces = store.solid_faces(self.solid)?;
        transform_faces(store, &faces, &self.matrix)
    }
}

/// Transforms every vertex, edge and plane reachable from `faces`, once each.
pub(crate) fn transform_faces(
    store: &mut TopologyStore,
    faces: &[FaceId],
    matrix: &Matrix4,
) -> Result<()> {
    let mut seen_edges = HashSet::new();
    let mut edges: Vec<EdgeId> = Vec::new();
    for &face in faces {
        for wire in store.face(face)?.wires() {
            for oe in &store.wire(wire)?.edges {
                if seen_edges.insert(oe.edge) {
                    edges.push(oe.edge);
                }
            }
        }
    }

    let mut seen_vertices = HashSet::new();
    let mut vertices: Vec<VertexId> = Vec::new();
    for &edge in &edges {
        let data = store.edge(edge)?;
        for vid in [data.start, data.end] {
            if seen_vertices.insert(vid) {
                vertices.push(vid);
            }
        }
    }

    for vid in vertices {
        let vertex = store.vertex_mut(vid)?;
        vertex.point = transform_point(matrix, &vertex.point);
    }

    for edge in edges {
        let data = store.edge(edge)?;
        let start = store.vertex(data.start)?.point;
        let end = store.vertex(data.end)?.point;
        let line = Line::through(start, end)?;
        let data = store.edge_mut(edge)?;
        data.curve = line;
        data.t_start = 0.0;
        data.t_end = (end - start).norm();
    }

    for &face in faces {
        let outer = store.face(face)?.outer_wire;
        let plane = Plane::from_polygon(&store.wire_points(outer)?)?;
        store.face_mut(face)?.surface = plane;
    }
    Ok(())
}

/// Transforms a point by a 4x4 matrix (homogeneous coordinates).
pub(crate) fn transform_point(matrix: &Matrix4, point: &Point3) -> Point3 {
    matrix.transform_point(point)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Vector3;
    use crate::operations::creation::MakeBox;
    use crate::operations::query::{BoundingBox, IsValid, Volume};

    #[test]
    fn uniform_scale_scales_volume() {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 2.0, 3.0))
            .execute(&mut store)
            .unwrap();
        GeneralTransform::new(solid, Matrix4::new_scaling(2.0))
            .execute(&mut store)
            .unwrap();
        assert!((Volume::new(solid).execute(&store).unwrap() - 48.0).abs() < 1e-9);
        assert!(IsValid::new(solid).execute(&store));
    }

    #[test]
    fn edges_and_planes_follow_vertices() {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let shift = Vector3::new(0.0, 0.0, 5.0);
        GeneralTransform::new(solid, Matrix4::new_translation(&shift))
            .execute(&mut store)
            .unwrap();

        let aabb = BoundingBox::new(solid).execute(&store).unwrap();
        assert!((aabb.min.z - 5.0).abs() < 1e-12);
        for face in store.solid_faces(solid).unwrap() {
            let data = store.face(face).unwrap();
            for p in store.wire_points(data.outer_wire).unwrap() {
                assert!(data.surface.signed_distance(&p).abs() < 1e-12);
            }
            for oe in &store.wire(data.outer_wire).unwrap().edges {
                let edge = store.edge(oe.edge).unwrap();
                let start = store.vertex(edge.start).unwrap().point;
                assert!((edge.curve.point_at(edge.t_start) - start).norm() < 1e-12);
            }
        }
    }
}
