use crate::error::{GeometryError, OperationError, Result, TopologyError};
use crate::geometry::surface::Plane;
use crate::math::distance_2d::point_to_loop_dist;
use crate::math::intersect_2d::segments_touch_2d;
use crate::math::polygon_2d::point_in_polygon_2d;
use crate::math::polygon_3d::{max_plane_deviation, newell_vector};
use crate::math::{Point2, Point3, LINEAR_TOLERANCE};
use crate::topology::{FaceData, FaceId, TopologyStore, WireId};

use super::make_wire::reverse_wire;

/// Creates a planar face from an outer boundary wire and optional holes.
///
/// The face normal follows the winding of the outer wire. Hole wires that
/// wind the same way as the outer wire are replaced by reversed copies, so
/// wires shared with other faces are never modified.
pub struct MakeFace {
    outer_wire: WireId,
    inner_wires: Vec<WireId>,
}

impl MakeFace {
    /// Creates a new `MakeFace` operation.
    #[must_use]
    pub fn new(outer_wire: WireId, inner_wires: Vec<WireId>) -> Self {
        Self {
            outer_wire,
            inner_wires,
        }
    }

    /// Executes the operation, creating the face in the topology store.
    ///
    /// # Errors
    ///
    /// - [`TopologyError::WireNotClosed`] if any wire is open.
    /// - [`GeometryError::Degenerate`] if the wires are not coplanar or the
    ///   outer wire encloses no area.
    /// - [`OperationError::InvalidInput`] if the outer wire intersects itself,
    ///   a hole is not strictly inside the outer boundary, or holes touch.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<FaceId> {
        let outer = closed_wire_points(store, self.outer_wire)?;
        let plane = Plane::from_polygon(&outer)?;
        let tolerance = planarity_tolerance(&outer);
        check_on_plane(&outer, &plane, tolerance)?;

        let outer_2d: Vec<Point2> = outer.iter().map(|p| plane.project(p)).collect();
        if !loop_is_simple(&outer_2d) {
            return Err(
                OperationError::InvalidInput("outer wire intersects itself".into()).into(),
            );
        }

        let mut holes_2d: Vec<Vec<Point2>> = Vec::with_capacity(self.inner_wires.len());
        let mut inner_wires = Vec::with_capacity(self.inner_wires.len());
        for &wire in &self.inner_wires {
            let points = closed_wire_points(store, wire)?;
            check_on_plane(&points, &plane, tolerance)?;
            let hole: Vec<Point2> = points.iter().map(|p| plane.project(p)).collect();

            if !loop_is_simple(&hole) {
                return Err(
                    OperationError::InvalidInput("inner wire intersects itself".into()).into(),
                );
            }
            if !loop_strictly_inside(&hole, &outer_2d) {
                return Err(OperationError::InvalidInput(
                    "inner wire is not strictly inside the outer wire".into(),
                )
                .into());
            }
            if holes_2d.iter().any(|other| loops_interfere(&hole, other)) {
                return Err(
                    OperationError::InvalidInput("inner wires overlap".into()).into(),
                );
            }

            let same_winding = newell_vector(&points).dot(plane.plane_normal()) > 0.0;
            inner_wires.push(if same_winding {
                reverse_wire(store, wire)?
            } else {
                wire
            });
            holes_2d.push(hole);
        }

        Ok(store.add_face(FaceData {
            surface: plane,
            outer_wire: self.outer_wire,
            inner_wires,
        }))
    }
}

/// Points of a wire that must be closed and have at least three vertices.
fn closed_wire_points(store: &TopologyStore, wire: WireId) -> Result<Vec<Point3>> {
    if !store.wire(wire)?.is_closed {
        return Err(TopologyError::WireNotClosed.into());
    }
    let points = store.wire_points(wire)?;
    if points.len() < 3 {
        return Err(
            GeometryError::Degenerate("face wire needs at least 3 vertices".into()).into(),
        );
    }
    Ok(points)
}

/// Allowed off-plane distance, scaled with the size of the boundary.
fn planarity_tolerance(points: &[Point3]) -> f64 {
    let mut extent: f64 = 0.0;
    for p in points {
        extent = extent.max((p - points[0]).norm());
    }
    LINEAR_TOLERANCE.max(extent * 1e-9)
}

fn check_on_plane(points: &[Point3], plane: &Plane, tolerance: f64) -> Result<()> {
    if max_plane_deviation(points, plane.origin(), plane.plane_normal()) > tolerance {
        return Err(GeometryError::Degenerate("face wires are not coplanar".into()).into());
    }
    Ok(())
}

/// Returns `true` if no two non-adjacent edges of the loop touch.
pub(crate) fn loop_is_simple(points: &[Point2]) -> bool {
    let n = points.len();
    for i in 0..n {
        let (a0, a1) = (points[i], points[(i + 1) % n]);
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (b0, b1) = (points[j], points[(j + 1) % n]);
            if segments_touch_2d(&a0, &a1, &b0, &b1, LINEAR_TOLERANCE) {
                return false;
            }
        }
    }
    true
}

/// Returns `true` if every vertex of `inner` lies inside `outer`, away from
/// its boundary, and no edges of the two loops touch.
pub(crate) fn loop_strictly_inside(inner: &[Point2], outer: &[Point2]) -> bool {
    inner.iter().all(|p| {
        point_in_polygon_2d(p, outer) && point_to_loop_dist(p, outer) > LINEAR_TOLERANCE
    }) && !loops_touch(inner, outer)
}

/// Returns `true` if the loops touch or one contains the other.
fn loops_interfere(a: &[Point2], b: &[Point2]) -> bool {
    loops_touch(a, b) || point_in_polygon_2d(&a[0], b) || point_in_polygon_2d(&b[0], a)
}

fn loops_touch(a: &[Point2], b: &[Point2]) -> bool {
    let (n, m) = (a.len(), b.len());
    (0..n).any(|i| {
        (0..m).any(|j| {
            segments_touch_2d(
                &a[i],
                &a[(i + 1) % n],
                &b[j],
                &b[(j + 1) % m],
                LINEAR_TOLERANCE,
            )
        })
    })
}
