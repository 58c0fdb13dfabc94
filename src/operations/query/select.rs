use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{BoxlidError, OperationError, Result};
use crate::math::{Point3, Vector3};
use crate::topology::{EdgeId, FaceId, SolidId, TopologyStore};

use super::FaceCentroid;

/// Angular and positional tolerance used when matching selectors.
pub const SELECTOR_TOLERANCE: f64 = 1e-4;

/// A principal axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Unit vector along the axis.
    #[must_use]
    pub fn direction(self) -> Vector3 {
        match self {
            Self::X => Vector3::x(),
            Self::Y => Vector3::y(),
            Self::Z => Vector3::z(),
        }
    }
}

/// Picks edges or faces of a solid by direction.
///
/// Parsed from the short string forms `"|Z"` (parallel to Z), `">Z"`
/// (farthest along +Z) and `"<Z"` (farthest along -Z), for any axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// Edges whose direction, or faces whose normal, is parallel to the axis.
    Parallel(Axis),
    /// Entities whose centre is maximal along the axis.
    Max(Axis),
    /// Entities whose centre is minimal along the axis.
    Min(Axis),
}

impl FromStr for Selector {
    type Err = BoxlidError;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.trim().chars();
        let (Some(kind), Some(axis), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(OperationError::InvalidInput(format!("unknown selector '{s}'")).into());
        };
        let axis = match axis.to_ascii_uppercase() {
            'X' => Axis::X,
            'Y' => Axis::Y,
            'Z' => Axis::Z,
            _ => {
                return Err(OperationError::InvalidInput(format!("unknown axis in '{s}'")).into())
            }
        };
        match kind {
            '|' => Ok(Self::Parallel(axis)),
            '>' => Ok(Self::Max(axis)),
            '<' => Ok(Self::Min(axis)),
            _ => Err(OperationError::InvalidInput(format!("unknown selector '{s}'")).into()),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, axis) = match self {
            Self::Parallel(a) => ('|', a),
            Self::Max(a) => ('>', a),
            Self::Min(a) => ('<', a),
        };
        write!(f, "{kind}{axis:?}")
    }
}

fn is_parallel(v: &Vector3, axis: Axis) -> bool {
    let len = v.norm();
    len > f64::EPSILON && (v / len).cross(&axis.direction()).norm() < SELECTOR_TOLERANCE
}

/// Keeps the items whose measure along the axis is extreme.
fn extremes<T: Copy>(items: &[(T, Point3)], axis: Axis, max: bool) -> Vec<T> {
    let d = axis.direction();
    let sign = if max { 1.0 } else { -1.0 };
    let best = items
        .iter()
        .map(|(_, c)| sign * c.coords.dot(&d))
        .fold(f64::NEG_INFINITY, f64::max);
    items
        .iter()
        .filter(|(_, c)| sign * c.coords.dot(&d) >= best - SELECTOR_TOLERANCE)
        .map(|(item, _)| *item)
        .collect()
}

/// Selects the edges of a solid matching a [`Selector`].
pub struct SelectEdges {
    solid: SolidId,
    selector: Selector,
}

impl SelectEdges {
    /// Creates a new `SelectEdges` query.
    #[must_use]
    pub fn new(solid: SolidId, selector: Selector) -> Self {
        Self { solid, selector }
    }

    /// Executes the query, returning matching edges in boundary order.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid or any of its topology is missing.
    pub fn execute(&self, store: &TopologyStore) -> Result<Vec<EdgeId>> {
        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for face in store.solid_faces(self.solid)? {
            for wire in store.face(face)?.wires() {
                for oe in &store.wire(wire)?.edges {
                    if seen.insert(oe.edge) {
                        let data = store.edge(oe.edge)?;
                        let a = store.vertex(data.start)?.point;
                        let b = store.vertex(data.end)?.point;
                        edges.push((oe.edge, a, b));
                    }
                }
            }
        }

        Ok(match self.selector {
            Selector::Parallel(axis) => edges
                .into_iter()
                .filter(|(_, a, b)| is_parallel(&(b - a), axis))
                .map(|(e, _, _)| e)
                .collect(),
            Selector::Max(axis) | Selector::Min(axis) => {
                let centres: Vec<_> = edges
                    .into_iter()
                    .map(|(e, a, b)| (e, Point3::from((a.coords + b.coords) * 0.5)))
                    .collect();
                extremes(&centres, axis, matches!(self.selector, Selector::Max(_)))
            }
        })
    }
}

/// Selects the faces of a solid matching a [`Selector`].
pub struct SelectFaces {
    solid: SolidId,
    selector: Selector,
}

impl SelectFaces {
    /// Creates a new `SelectFaces` query.
    #[must_use]
    pub fn new(solid: SolidId, selector: Selector) -> Self {
        Self { solid, selector }
    }

    /// Executes the query, returning matching faces in shell order.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid is missing or a face centroid cannot be
    /// computed.
    pub fn execute(&self, store: &TopologyStore) -> Result<Vec<FaceId>> {
        let faces = store.solid_faces(self.solid)?;
        match self.selector {
            Selector::Parallel(axis) => {
                let mut selected = Vec::new();
                for face in faces {
                    if is_parallel(store.face(face)?.surface.plane_normal(), axis) {
                        selected.push(face);
                    }
                }
                Ok(selected)
            }
            Selector::Max(axis) | Selector::Min(axis) => {
                let centres = faces
                    .into_iter()
                    .map(|f| FaceCentroid::new(f).execute(store).map(|c| (f, c)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(extremes(
                    &centres,
                    axis,
                    matches!(self.selector, Selector::Max(_)),
                ))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::MakeBox;

    fn unit_box(store: &mut TopologyStore) -> SolidId {
        MakeBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 3.0, 4.0))
            .execute(store)
            .unwrap()
    }

    #[test]
    fn parses_short_forms() {
        assert_eq!("|Z".parse::<Selector>().unwrap(), Selector::Parallel(Axis::Z));
        assert_eq!(">x".parse::<Selector>().unwrap(), Selector::Max(Axis::X));
        assert_eq!("<Y".parse::<Selector>().unwrap(), Selector::Min(Axis::Y));
        assert_eq!(Selector::Min(Axis::Z).to_string(), "<Z");
        assert!("Z".parse::<Selector>().is_err());
        assert!("|W".parse::<Selector>().is_err());
        assert!(">ZZ".parse::<Selector>().is_err());
    }

    #[test]
    fn box_has_4_vertical_edges() {
        let mut store = TopologyStore::new();
        let solid = unit_box(&mut store);
        let edges = SelectEdges::new(solid, "|Z".parse().unwrap())
            .execute(&store)
            .unwrap();
        assert_eq!(edges.len(), 4);
        for e in edges {
            let data = store.edge(e).unwrap();
            assert!(data.curve.direction().cross(&Vector3::z()).norm() < 1e-9);
        }
    }

    #[test]
    fn bottom_edges_and_faces() {
        let mut store = TopologyStore::new();
        let solid = unit_box(&mut store);
        let edges = SelectEdges::new(solid, Selector::Min(Axis::Z))
            .execute(&store)
            .unwrap();
        assert_eq!(edges.len(), 4);

        let top = SelectFaces::new(solid, Selector::Max(Axis::Z))
            .execute(&store)
            .unwrap();
        assert_eq!(top.len(), 1);
        let normal = store.face(top[0]).unwrap().surface.plane_normal();
        assert!((normal - Vector3::z()).norm() < 1e-9);

        let sides = SelectFaces::new(solid, Selector::Parallel(Axis::X))
            .execute(&store)
            .unwrap();
        assert_eq!(sides.len(), 2);
    }
}
