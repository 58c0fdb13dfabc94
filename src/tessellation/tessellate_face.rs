use std::collections::{HashMap, HashSet, VecDeque};

use spade::handles::FixedFaceHandle;
use spade::{
    ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation,
};

use crate::error::{Result, TessellationError};
use crate::geometry::surface::Plane;
use crate::math::Point3;
use crate::topology::{FaceId, TopologyStore};

use super::TriangleMesh;

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Tessellates a planar face (holes included) into a triangle mesh.
///
/// The mesh reuses the exact boundary vertex positions of the face, so
/// adjacent faces tessellated separately meet without cracks.
pub struct TessellateFace {
    face: FaceId,
}

impl TessellateFace {
    /// Creates a new `TessellateFace` operation.
    #[must_use]
    pub fn new(face: FaceId) -> Self {
        Self { face }
    }

    /// Executes the tessellation, returning a triangle mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is missing or its boundary cannot be
    /// triangulated (self-intersecting loops, invalid coordinates).
    pub fn execute(&self, store: &TopologyStore) -> Result<TriangleMesh> {
        let face = store.face(self.face)?;
        let mut loops = Vec::with_capacity(1 + face.inner_wires.len());
        for wire in face.wires() {
            loops.push(store.wire_points(wire)?);
        }
        triangulate_loops(&face.surface, &loops)
    }
}

/// Triangulates closed boundary loops lying on `plane`.
///
/// Triangles come out counter-clockwise about the plane normal regardless
/// of the loops' own winding; the interior is decided by crossing parity.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn triangulate_loops(plane: &Plane, loops: &[Vec<Point3>]) -> Result<TriangleMesh> {
    let mut cdt = Cdt::new();
    let mut originals: HashMap<usize, Point3> = HashMap::new();

    for points in loops {
        insert_constraint_loop(&mut cdt, plane, points, &mut originals)?;
    }

    let interior_faces = classify_interior_faces(&cdt);
    let normal = *plane.plane_normal();

    let mut mesh = TriangleMesh::default();
    let mut vertex_map: HashMap<usize, u32> = HashMap::new();

    for face_handle in cdt.inner_faces() {
        if !interior_faces.contains(&face_handle.fix().index()) {
            continue;
        }

        let mut tri_indices = [0u32; 3];
        for (i, vh) in face_handle.vertices().iter().enumerate() {
            let idx = vh.fix().index();
            let mesh_idx = if let Some(&existing) = vertex_map.get(&idx) {
                existing
            } else {
                let p3 = originals.get(&idx).copied().unwrap_or_else(|| {
                    let pos = vh.position();
                    plane.point_at(pos.x, pos.y)
                });
                let new_idx = mesh.vertices.len() as u32;
                mesh.vertices.push(p3);
                mesh.normals.push(normal);
                vertex_map.insert(idx, new_idx);
                new_idx
            };
            tri_indices[i] = mesh_idx;
        }

        mesh.indices.push(tri_indices);
    }

    if mesh.indices.is_empty() {
        return Err(TessellationError::Failed("face has no interior triangles".into()).into());
    }

    Ok(mesh)
}

/// Inserts a closed loop of points into the CDT as constraint edges.
fn insert_constraint_loop(
    cdt: &mut Cdt,
    plane: &Plane,
    points: &[Point3],
    originals: &mut HashMap<usize, Point3>,
) -> Result<()> {
    if points.len() < 3 {
        return Err(
            TessellationError::Failed("constraint loop needs at least 3 points".into()).into(),
        );
    }

    let mut handles = Vec::with_capacity(points.len());
    for p in points {
        let uv = plane.project(p);
        let h = cdt
            .insert(SpadePoint2::new(uv.x, uv.y))
            .map_err(|e: InsertionError| TessellationError::Failed(format!("CDT insert: {e}")))?;
        originals.entry(h.index()).or_insert(*p);
        handles.push(h);
    }

    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if from == to {
            continue;
        }
        if !cdt.can_add_constraint(from, to) {
            return Err(TessellationError::Failed(
                "face boundary intersects itself".into(),
            )
            .into());
        }
        cdt.add_constraint(from, to);
    }

    Ok(())
}

/// Classifies which inner faces of the CDT are inside the polygon using flood-fill.
///
/// Starts from faces adjacent to the outer (infinite) face at depth 0. Each time
/// a constraint edge is crossed, depth increments. Odd depth = interior.
fn classify_interior_faces(cdt: &Cdt) -> HashSet<usize> {
    let mut interior = HashSet::new();
    let mut depth_map: HashMap<usize, u32> = HashMap::new();
    let mut queue: VecDeque<(FixedFaceHandle<spade::handles::InnerTag>, u32)> = VecDeque::new();

    let outer_fix = cdt.outer_face().fix();

    for edge in cdt.directed_edges() {
        if edge.face().fix() != outer_fix {
            continue;
        }
        if let Some(inner) = edge.rev().face().as_inner() {
            let idx = inner.fix().index();
            if depth_map.contains_key(&idx) {
                continue;
            }
            let depth = u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            depth_map.insert(idx, depth);
            if depth % 2 == 1 {
                interior.insert(idx);
            }
            queue.push_back((inner.fix(), depth));
        }
    }

    while let Some((face_fix, depth)) = queue.pop_front() {
        let face = cdt.face(face_fix);
        for edge in face.adjacent_edges() {
            let Some(neighbor) = edge.rev().face().as_inner() else {
                continue;
            };
            let n_idx = neighbor.fix().index();
            if depth_map.contains_key(&n_idx) {
                continue;
            }
            let new_depth = depth + u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            depth_map.insert(n_idx, new_depth);
            if new_depth % 2 == 1 {
                interior.insert(n_idx);
            }
            queue.push_back((neighbor.fix(), new_depth));
        }
    }

    interior
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Vector3;
    use crate::operations::creation::{MakeFace, MakeWire};

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn make_face_from_points(store: &mut TopologyStore, points: Vec<Point3>) -> FaceId {
        let wire = MakeWire::new(points, true).execute(store).unwrap();
        MakeFace::new(wire, vec![]).execute(store).unwrap()
    }

    #[test]
    fn triangle_produces_1_triangle() {
        let mut store = TopologyStore::new();
        let face = make_face_from_points(&mut store, vec![p(0.0, 0.0), p(4.0, 0.0), p(2.0, 3.0)]);
        let mesh = TessellateFace::new(face).execute(&store).unwrap();
        assert_eq!(mesh.indices.len(), 1);
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.normals.len(), 3);
    }

    #[test]
    fn square_produces_2_triangles() {
        let mut store = TopologyStore::new();
        let face = make_face_from_points(
            &mut store,
            vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 4.0), p(0.0, 4.0)],
        );
        let mesh = TessellateFace::new(face).execute(&store).unwrap();
        assert_eq!(mesh.indices.len(), 2);
        assert_eq!(mesh.vertices.len(), 4);
    }

    #[test]
    fn l_shape_concave_tessellates() {
        let mut store = TopologyStore::new();
        let face = make_face_from_points(
            &mut store,
            vec![
                p(0.0, 0.0),
                p(4.0, 0.0),
                p(4.0, 2.0),
                p(2.0, 2.0),
                p(2.0, 4.0),
                p(0.0, 4.0),
            ],
        );
        let mesh = TessellateFace::new(face).execute(&store).unwrap();
        assert_eq!(mesh.indices.len(), 4);
        assert!((mesh.area() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn hole_is_left_open() {
        let mut store = TopologyStore::new();
        let outer = MakeWire::new(
            vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)],
            true,
        )
        .execute(&mut store)
        .unwrap();
        let inner = MakeWire::new(
            vec![p(3.0, 3.0), p(3.0, 7.0), p(7.0, 7.0), p(7.0, 3.0)],
            true,
        )
        .execute(&mut store)
        .unwrap();
        let face = MakeFace::new(outer, vec![inner]).execute(&mut store).unwrap();
        let mesh = TessellateFace::new(face).execute(&store).unwrap();
        assert!((mesh.area() - 84.0).abs() < 1e-9);
        assert_eq!(mesh.vertices.len(), 8);
    }

    #[test]
    fn triangles_follow_face_normal() {
        let mut store = TopologyStore::new();
        // Clockwise seen from +Z, so the face normal is -Z.
        let face = make_face_from_points(
            &mut store,
            vec![p(0.0, 0.0), p(0.0, 3.0), p(3.0, 3.0), p(3.0, 0.0)],
        );
        let mesh = TessellateFace::new(face).execute(&store).unwrap();
        for i in 0..mesh.indices.len() {
            let [a, b, c] = mesh.triangle(i);
            let n = (b - a).cross(&(c - a));
            assert!(n.dot(&Vector3::z()) < 0.0);
        }
    }

    #[test]
    fn self_intersecting_loop_is_rejected() {
        let plane = Plane::from_normal(Point3::origin(), Vector3::z()).unwrap();
        let bow_tie = vec![p(0.0, 0.0), p(2.0, 2.0), p(2.0, 0.0), p(0.0, 2.0)];
        assert!(triangulate_loops(&plane, &[bow_tie]).is_err());
    }
}
