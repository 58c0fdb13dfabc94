use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{IoError, Result};
use crate::math::Point3;
use crate::operations::boolean::UnionFind;
use crate::operations::query::Aabb;
use crate::tessellation::{TessellateSolid, TriangleMesh};
use crate::topology::{CompoundId, TopologyStore};

/// Writes every solid of a compound into one binary STL file.
pub struct ExportStl {
    compound: CompoundId,
}

impl ExportStl {
    /// Creates a new `ExportStl` operation.
    #[must_use]
    pub fn new(compound: CompoundId) -> Self {
        Self { compound }
    }

    /// Tessellates the compound and writes it to `path`, replacing any
    /// existing file. Returns the number of triangles written.
    ///
    /// # Errors
    ///
    /// Returns an error if a solid cannot be tessellated or the file cannot
    /// be written.
    #[allow(clippy::cast_possible_truncation)]
    pub fn execute(&self, store: &TopologyStore, path: &Path) -> Result<usize> {
        let mut mesh = TriangleMesh::default();
        for &solid in &store.compound(self.compound)?.solids {
            mesh.merge(&TessellateSolid::new(solid).execute(store)?);
        }

        let triangles: Vec<stl_io::Triangle> = mesh
            .indices
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let n = mesh.normals[t[0] as usize];
                let [a, b, c] = mesh.triangle(i);
                stl_io::Triangle {
                    normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                    vertices: [vertex(&a), vertex(&b), vertex(&c)],
                }
            })
            .collect();

        let write_error = |source: std::io::Error| IoError::Write {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(write_error)?;
        let mut writer = BufWriter::new(file);
        stl_io::write_stl(&mut writer, triangles.iter()).map_err(write_error)?;
        writer.flush().map_err(write_error)?;

        info!(path = %path.display(), triangles = triangles.len(), "wrote STL");
        Ok(triangles.len())
    }
}

#[allow(clippy::cast_possible_truncation)]
fn vertex(p: &Point3) -> stl_io::Vertex {
    stl_io::Vertex::new([p.x as f32, p.y as f32, p.z as f32])
}

/// Summary of an STL file read back from disk.
#[derive(Debug, Clone)]
pub struct StlReport {
    /// Number of triangles in the file.
    pub triangles: usize,
    /// Bounds of each edge-connected group of triangles.
    pub shells: Vec<Aabb>,
}

/// Reads an STL file and reports its triangles and connected shells.
pub struct InspectStl {
    path: PathBuf,
}

impl InspectStl {
    /// Creates a new `InspectStl` query.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Executes the query.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Read`] if the file cannot be opened and
    /// [`IoError::Stl`] if its contents are not STL.
    pub fn execute(&self) -> Result<StlReport> {
        let file = File::open(&self.path).map_err(|source| IoError::Read {
            path: self.path.clone(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        let stl = stl_io::read_stl(&mut reader).map_err(|e| IoError::Stl(e.to_string()))?;

        let points: Vec<Point3> = stl
            .vertices
            .iter()
            .map(|v| Point3::new(f64::from(v.0[0]), f64::from(v.0[1]), f64::from(v.0[2])))
            .collect();

        let mut groups = UnionFind::new(points.len());
        for face in &stl.faces {
            let [a, b, c] = face.vertices;
            if a.max(b).max(c) >= points.len() {
                return Err(IoError::Stl(format!(
                    "triangle index out of range in {}",
                    self.path.display()
                ))
                .into());
            }
            groups.union(a, b);
            groups.union(b, c);
        }

        let shells: Vec<Aabb> = groups
            .groups()
            .into_iter()
            .filter_map(|members| Aabb::from_points(members.iter().map(|&m| &points[m])))
            .collect();

        debug!(
            path = %self.path.display(),
            triangles = stl.faces.len(),
            shells = shells.len(),
            "read STL"
        );
        Ok(StlReport {
            triangles: stl.faces.len(),
            shells,
        })
    }
}
