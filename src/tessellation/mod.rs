mod tessellate_face;
mod tessellate_solid;

pub use tessellate_face::TessellateFace;
pub(crate) use tessellate_face::triangulate_loops;
pub use tessellate_solid::TessellateSolid;

use crate::math::{Point3, Vector3};

/// A triangle mesh approximation of one or more faces.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Vertex normals.
    pub normals: Vec<Vector3>,
    /// Triangle indices (each triple defines a triangle, counter-clockwise
    /// about the normal).
    pub indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Appends another mesh, re-basing its indices.
    #[allow(clippy::cast_possible_truncation)]
    pub fn merge(&mut self, other: &TriangleMesh) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.normals.extend_from_slice(&other.normals);
        self.indices
            .extend(other.indices.iter().map(|t| [t[0] + base, t[1] + base, t[2] + base]));
    }

    /// Corner positions of triangle `index`.
    #[must_use]
    pub fn triangle(&self, index: usize) -> [Point3; 3] {
        let t = self.indices[index];
        [
            self.vertices[t[0] as usize],
            self.vertices[t[1] as usize],
            self.vertices[t[2] as usize],
        ]
    }

    /// Total area of all triangles.
    #[must_use]
    pub fn area(&self) -> f64 {
        (0..self.indices.len())
            .map(|i| {
                let [a, b, c] = self.triangle(i);
                (b - a).cross(&(c - a)).norm() * 0.5
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(z: f64) -> TriangleMesh {
        TriangleMesh {
            vertices: vec![
                Point3::new(0.0, 0.0, z),
                Point3::new(2.0, 0.0, z),
                Point3::new(0.0, 2.0, z),
            ],
            normals: vec![Vector3::z(); 3],
            indices: vec![[0, 1, 2]],
        }
    }

    #[test]
    fn merge_rebases_indices() {
        let mut mesh = tri(0.0);
        mesh.merge(&tri(1.0));
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.indices[1], [3, 4, 5]);
        assert!((mesh.triangle(1)[0].z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn area_sums_triangles() {
        let mut mesh = tri(0.0);
        mesh.merge(&tri(3.0));
        assert!((mesh.area() - 4.0).abs() < 1e-12);
    }
}
