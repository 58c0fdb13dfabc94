use tracing::debug;

use crate::error::{Result, TopologyError};
use crate::math::{Point3, Vector3};
use crate::operations::boolean::Subtract;
use crate::operations::creation::{MakeBox, MakeFace, MakeWire};
use crate::operations::modification::Fillet;
use crate::operations::offset::WireOffset2D;
use crate::operations::query::{Axis, SelectEdges, SelectFaces, Selector};
use crate::operations::shaping::Extrude;
use crate::operations::transform::CopyFace;
use crate::topology::{SolidId, TopologyStore};

use super::loft_faces;

/// Which side of the wall the seating ledge is cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgeKind {
    /// The outer half of the rim is lowered, leaving an inner ridge.
    Exterior,
    /// The inner half of the rim is lowered, leaving an outer ridge.
    Interior,
}

impl LedgeKind {
    /// Half of the wall thickness left to the ridge, corrected for the fit
    /// clearance so the exterior ridge slides inside the interior one.
    #[must_use]
    pub fn half_thickness(self, thickness: f64, tolerance: f64) -> f64 {
        match self {
            Self::Exterior => (thickness - tolerance) / 2.0,
            Self::Interior => (thickness + tolerance) / 2.0,
        }
    }
}

/// Parameters of one half of the container.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerParams {
    /// Outer extent along X.
    pub width: f64,
    /// Outer extent along Y.
    pub depth: f64,
    /// Outer extent along Z, at the high side of the sloped rim.
    pub height: f64,
    /// Wall and floor thickness.
    pub thickness: f64,
    /// Vertical depth of the seating ledge.
    pub ledge: f64,
    /// Which half of the rim the ledge is cut from.
    pub kind: LedgeKind,
    /// Radius of the vertical and bottom edge fillets. Zero keeps edges sharp.
    pub fillet: f64,
    /// Slope of the rim in degrees.
    pub angle: f64,
    /// Fit clearance between the two ledges.
    pub tolerance: f64,
}

impl Default for ContainerParams {
    fn default() -> Self {
        Self {
            width: 100.0,
            depth: 100.0,
            height: 100.0,
            thickness: 5.0,
            ledge: 10.0,
            kind: LedgeKind::Exterior,
            fillet: 3.0,
            angle: 15.0,
            tolerance: 0.2,
        }
    }
}

/// Builds one half of the container: a hollow box whose rim is cut into a
/// sloped plane with a seating ledge around it.
pub struct BuildContainer {
    params: ContainerParams,
}

impl BuildContainer {
    /// Creates a new `BuildContainer` operation.
    #[must_use]
    pub fn new(params: ContainerParams) -> Self {
        Self { params }
    }

    /// Executes the construction.
    ///
    /// # Errors
    ///
    /// Fails with the underlying kernel error when the ledge offset
    /// degenerates (a tolerance at or beyond the wall thickness), when a cut
    /// leaves more than one piece, or when a fillet cannot be placed.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<SolidId> {
        let p = &self.params;
        let (hw, hd, t) = (p.width / 2.0, p.depth / 2.0, p.thickness);

        let outer = MakeBox::new(Point3::new(-hw, -hd, 0.0), Point3::new(hw, hd, p.height))
            .execute(store)?;
        let cavity = MakeBox::new(
            Point3::new(-hw + t, -hd + t, t),
            Point3::new(hw - t, hd - t, t + p.height),
        )
        .execute(store)?;
        let mut body = Subtract::new(outer, cavity).execute(store)?;

        let wedge = self.wedge(store)?;
        body = Subtract::new(body, wedge).execute(store)?;

        let step = SelectFaces::new(body, Selector::Max(Axis::Z))
            .execute(store)?
            .into_iter()
            .next()
            .ok_or_else(|| TopologyError::InvalidTopology("container has no top face".into()))?;
        let (rim, opening) = {
            let face = store.face(step)?;
            let opening = face.inner_wires.first().copied().ok_or_else(|| {
                TopologyError::InvalidTopology("top face has no opening".into())
            })?;
            (face.outer_wire, opening)
        };

        let half = p.kind.half_thickness(t, p.tolerance);
        let offset = WireOffset2D::new(opening, half)
            .bounded_by(step)
            .execute(store)?;
        let ledge_face = match p.kind {
            LedgeKind::Exterior => MakeFace::new(rim, vec![offset]),
            LedgeKind::Interior => MakeFace::new(offset, vec![opening]),
        }
        .execute(store)?;
        let lowered = CopyFace::new(ledge_face)
            .translated(Vector3::new(0.0, 0.0, -p.ledge))
            .execute(store)?;
        let ledge = loft_faces(store, ledge_face, lowered)?;
        debug!(kind = ?p.kind, half, "ledge cut");

        body = Subtract::new(body, ledge).execute(store)?;
        let vertical = SelectEdges::new(body, Selector::Parallel(Axis::Z)).execute(store)?;
        body = Fillet::new(body, vertical, p.fillet).execute(store)?;

        body = Subtract::new(body, ledge).execute(store)?;
        let bottom = SelectEdges::new(body, Selector::Min(Axis::Z)).execute(store)?;
        Fillet::new(body, bottom, p.fillet).execute(store)
    }

    /// Prism removed above the sloped rim.
    ///
    /// Sketched on the +X side: from the top of the +Y edge down to
    /// `depth * tan(angle)` below the top at the -Y edge, back up, and
    /// pushed through the full width.
    fn wedge(&self, store: &mut TopologyStore) -> Result<SolidId> {
        let p = &self.params;
        let (hw, hd) = (p.width / 2.0, p.depth / 2.0);
        let drop = p.depth * p.angle.to_radians().tan();
        let profile = MakeWire::new(
            vec![
                Point3::new(hw, hd, p.height),
                Point3::new(hw, -hd, p.height - drop),
                Point3::new(hw, -hd, p.height),
            ],
            true,
        )
        .execute(store)?;
        let face = MakeFace::new(profile, vec![]).execute(store)?;
        Extrude::new(face, Vector3::new(-p.width, 0.0, 0.0)).execute(store)
    }
}
