use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::io::ExportStl;
use crate::math::{Point3, Vector3};
use crate::operations::creation::MakeCompound;
use crate::operations::transform::{Rotate, Translate};
use crate::topology::{CompoundId, TopologyStore};

use super::{BuildContainer, ContainerParams, LedgeKind};

/// File name the assembly is written to.
pub const OUTPUT_FILE: &str = "container_with_lid.stl";

/// Footprint of both parts before the wall thickness is added.
const FOOTPRINT: f64 = 20.0;

/// Parameters of the container and lid pair.
#[derive(Debug, Clone, PartialEq)]
pub struct LidParams {
    /// Requested outer width. Overridden by a fixed footprint.
    pub width: f64,
    /// Requested outer depth. Overridden by a fixed footprint.
    pub depth: f64,
    /// Combined height, split 80/20 between body and lid.
    pub height: f64,
    pub thickness: f64,
    pub ledge: f64,
    pub fillet: f64,
    /// Rim slope in degrees.
    pub angle: f64,
    pub tolerance: f64,
}

impl Default for LidParams {
    fn default() -> Self {
        Self {
            width: 100.0,
            depth: 100.0,
            height: 100.0,
            thickness: 5.0,
            ledge: 10.0,
            fillet: 3.0,
            angle: 15.0,
            tolerance: 0.2,
        }
    }
}

/// Builds the body and the lid as two separate solids in one compound.
///
/// The lid is turned half a revolution about Z and moved along X so the two
/// parts sit side by side without touching.
///
/// # Errors
///
/// Propagates the first kernel error from either part.
pub fn build_container_with_lid(
    store: &mut TopologyStore,
    params: &LidParams,
) -> Result<CompoundId> {
    let side = FOOTPRINT + params.thickness;
    debug!(
        requested_width = params.width,
        requested_depth = params.depth,
        side,
        "width and depth fixed to the footprint"
    );
    let part = |height: f64, kind: LedgeKind| ContainerParams {
        width: side,
        depth: side,
        height,
        thickness: params.thickness,
        ledge: params.ledge,
        kind,
        fillet: params.fillet,
        angle: params.angle,
        tolerance: params.tolerance,
    };

    let body = BuildContainer::new(part(
        params.height * 0.8 + params.thickness,
        LedgeKind::Exterior,
    ))
    .execute(store)?;
    let lid = BuildContainer::new(part(
        params.height * 0.2 + params.thickness,
        LedgeKind::Interior,
    ))
    .execute(store)?;

    Rotate::new(lid, Point3::origin(), Vector3::z(), PI).execute(store)?;
    Translate::new(lid, Vector3::new(side * 1.2, 0.0, 0.0)).execute(store)?;

    MakeCompound::new(vec![body, lid]).execute(store)
}

/// Builds the pair and writes it to [`OUTPUT_FILE`] in `dir`, returning the
/// path written.
///
/// # Errors
///
/// Propagates kernel errors; nothing is written unless both parts build.
/// Fails with an I/O error if the file cannot be written.
pub fn container_with_lid_in(dir: &Path, params: &LidParams) -> Result<PathBuf> {
    let mut store = TopologyStore::new();
    let compound = build_container_with_lid(&mut store, params)?;
    let path = dir.join(OUTPUT_FILE);
    ExportStl::new(compound).execute(&store, &path)?;
    Ok(path)
}

/// Builds the pair and writes [`OUTPUT_FILE`] into the working directory.
///
/// # Errors
///
/// See [`container_with_lid_in`].
pub fn container_with_lid(params: &LidParams) -> Result<PathBuf> {
    container_with_lid_in(Path::new(""), params)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::io::InspectStl;
    use crate::operations::query::{BoundingBox, IsValid};

    #[test]
    fn parts_are_two_disjoint_solids() {
        let mut store = TopologyStore::new();
        let compound = build_container_with_lid(&mut store, &LidParams::default()).unwrap();
        let solids = store.compound(compound).unwrap().solids.clone();
        assert_eq!(solids.len(), 2);

        let body = BoundingBox::new(solids[0]).execute(&store).unwrap();
        let lid = BoundingBox::new(solids[1]).execute(&store).unwrap();
        assert!(!body.overlaps(&lid));

        // The body's outer rim is lowered, so its top is the inner ridge,
        // at the rim slope's height one ridge width in from the outer wall.
        let side = 25.0;
        let drop = side * 15.0_f64.to_radians().tan();
        let ridge_inset = 5.0 - LedgeKind::Exterior.half_thickness(5.0, 0.2);
        let ridge_top = 85.0 - drop * ridge_inset / side;
        assert!(body.max.z < 85.0 - 0.5);
        assert_relative_eq!(body.max.z, ridge_top, epsilon = 0.05);
        assert_relative_eq!(body.min.z, 0.0, epsilon = 1e-9);

        // The lid keeps its outer ridge, so its top is the full height.
        assert_relative_eq!(lid.max.z, 25.0, epsilon = 1e-9);
        assert_relative_eq!(lid.min.x, 17.5, epsilon = 1e-9);
        for solid in solids {
            assert!(IsValid::new(solid).execute(&store));
        }
    }

    #[test]
    fn default_export_holds_two_shells() {
        let dir = tempfile::tempdir().unwrap();
        let path = container_with_lid_in(dir.path(), &LidParams::default()).unwrap();
        assert_eq!(path, dir.path().join(OUTPUT_FILE));
        assert!(std::fs::metadata(&path).unwrap().len() > 0);

        let report = InspectStl::new(&path).execute().unwrap();
        assert!(report.triangles > 0);
        assert_eq!(report.shells.len(), 2);
        assert!(!report.shells[0].overlaps(&report.shells[1]));
    }

    #[test]
    fn failed_build_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let params = LidParams {
            tolerance: 5.0,
            ..LidParams::default()
        };
        assert!(container_with_lid_in(dir.path(), &params).is_err());
        assert!(!dir.path().join(OUTPUT_FILE).exists());
    }
}
