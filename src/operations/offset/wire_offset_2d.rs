use crate::error::{OperationError, Result};
use crate::geometry::surface::Plane;
use crate::math::distance_2d::point_to_loop_dist;
use crate::math::intersect_2d::{line_line_intersect_2d, segments_touch_2d};
use crate::math::polygon_2d::{point_in_polygon_2d, signed_area_2d};
use crate::math::polygon_3d::{max_plane_deviation, newell_normal};
use crate::math::{arc_segments, Point2, Vector2, LINEAR_TOLERANCE, TOLERANCE};
use crate::operations::creation::{loop_is_simple, MakeWire};
use crate::topology::{FaceId, TopologyStore, WireId};

/// Points further than this from the offset plane are rejected.
const PLANARITY_TOLERANCE: f64 = 1e-5;

/// Offsets a closed planar wire within its plane.
///
/// A positive distance grows the region the wire encloses and a negative
/// distance shrinks it, whichever way the wire runs. Where the offset edges
/// separate, the corner is filled with a circular arc around the original
/// vertex; where they overlap, the edges are extended to their intersection.
/// The result runs in the same direction as the input.
pub struct WireOffset2D {
    wire: WireId,
    distance: f64,
    bound: Option<FaceId>,
}

impl WireOffset2D {
    /// Creates a new `WireOffset2D` operation.
    #[must_use]
    pub fn new(wire: WireId, distance: f64) -> Self {
        Self {
            wire,
            distance,
            bound: None,
        }
    }

    /// Offsets in the plane of `face` and requires the result to lie
    /// strictly inside its material, clear of every boundary loop.
    #[must_use]
    pub fn bounded_by(mut self, face: FaceId) -> Self {
        self.bound = Some(face);
        self
    }

    /// Executes the offset, creating the result wire in the topology store.
    ///
    /// # Errors
    ///
    /// - [`OperationError::InvalidInput`] if `|distance|` is within
    ///   [`TOLERANCE`] of zero, or the wire is open, degenerate or not planar.
    /// - [`OperationError::Failed`] if the offset collapses, intersects
    ///   itself, flips orientation, or leaves the bounding face.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<WireId> {
        if self.distance.abs() <= TOLERANCE {
            return Err(OperationError::InvalidInput(format!(
                "offset distance {} is too small",
                self.distance
            ))
            .into());
        }
        if !store.wire(self.wire)?.is_closed {
            return Err(OperationError::InvalidInput("offset wire must be closed".into()).into());
        }
        let points = store.wire_points(self.wire)?;

        let plane = match self.bound {
            Some(face) => store.face(face)?.surface.clone(),
            None => Plane::from_polygon(&points)?,
        };
        if let Some(normal) = newell_normal(&points) {
            let deviation = max_plane_deviation(&points, plane.origin(), plane.plane_normal());
            if deviation > PLANARITY_TOLERANCE || normal.cross(plane.plane_normal()).norm() > 1e-6 {
                return Err(
                    OperationError::InvalidInput("offset wire is not in the offset plane".into())
                        .into(),
                );
            }
        }

        let flat: Vec<Point2> = points.iter().map(|p| plane.project(p)).collect();
        let result = offset_loop(&flat, self.distance)?;

        if let Some(face) = self.bound {
            let face = store.face(face)?;
            let mut boundary = Vec::with_capacity(1 + face.inner_wires.len());
            for wire in face.wires() {
                let loop_points = store.wire_points(wire)?;
                boundary.push(loop_points.iter().map(|p| plane.project(p)).collect::<Vec<_>>());
            }
            check_inside_material(&result, &boundary)?;
        }

        let lifted = result.iter().map(|uv| plane.lift(uv)).collect();
        MakeWire::new(lifted, true).execute(store)
    }
}

/// Offsets a simple 2D loop, keeping its direction.
fn offset_loop(points: &[Point2], distance: f64) -> Result<Vec<Point2>> {
    let n = points.len();
    let area = signed_area_2d(points);
    if n < 3 || area.abs() <= TOLERANCE {
        return Err(OperationError::InvalidInput("offset wire encloses no area".into()).into());
    }
    let sense = area.signum();

    // Unit edge directions and outward normals.
    let mut dirs = Vec::with_capacity(n);
    let mut normals = Vec::with_capacity(n);
    for i in 0..n {
        let edge = points[(i + 1) % n] - points[i];
        let length = edge.norm();
        if length <= TOLERANCE {
            return Err(OperationError::InvalidInput("offset wire has a zero-length edge".into()).into());
        }
        let dir = edge / length;
        dirs.push(dir);
        normals.push(Vector2::new(dir.y, -dir.x) * sense);
    }

    let mut result: Vec<Point2> = Vec::new();
    for i in 0..n {
        let prev = (i + n - 1) % n;
        let corner = points[i];
        let (d_in, d_out) = (dirs[prev], dirs[i]);
        let (n_in, n_out) = (normals[prev], normals[i]);
        let turn = d_in.perp(&d_out);

        if turn.abs() <= 1e-12 && d_in.dot(&d_out) > 0.0 {
            result.push(corner + n_out * distance);
        } else if sense * turn * distance > 0.0 {
            // The offset edges separate: round the gap.
            let from = n_in * distance;
            let to = n_out * distance;
            let sweep = from.perp(&to).atan2(from.dot(&to));
            let steps = arc_segments(sweep.abs());
            for k in 0..=steps {
                #[allow(clippy::cast_precision_loss)]
                let angle = sweep * k as f64 / steps as f64;
                let (s, c) = angle.sin_cos();
                result.push(corner + Vector2::new(from.x * c - from.y * s, from.x * s + from.y * c));
            }
        } else {
            let a = points[prev] + n_in * distance;
            let b = corner + n_out * distance;
            let (t, _) = line_line_intersect_2d(&a, &d_in, &b, &d_out).ok_or_else(|| {
                OperationError::Failed("offset edges are antiparallel at a corner".into())
            })?;
            result.push(a + d_in * t);
        }
    }
    result.dedup_by(|a, b| (*a - *b).norm() < LINEAR_TOLERANCE);
    while result.len() > 1 && (result[0] - result[result.len() - 1]).norm() < LINEAR_TOLERANCE {
        result.pop();
    }

    if result.len() < 3 {
        return Err(OperationError::Failed("offset collapsed".into()).into());
    }
    let result_area = signed_area_2d(&result);
    if result_area * area <= 0.0 {
        return Err(OperationError::Failed("offset flipped orientation".into()).into());
    }
    if !loop_is_simple(&result) {
        return Err(OperationError::Failed("offset intersects itself".into()).into());
    }
    let reach = distance.abs() - LINEAR_TOLERANCE;
    if result.iter().any(|p| point_to_loop_dist(p, points) < reach) {
        return Err(OperationError::Failed("offset collapsed onto the original wire".into()).into());
    }
    Ok(result)
}

/// Requires `result` to lie inside the outer loop, outside every hole, and
/// clear of all of them.
fn check_inside_material(result: &[Point2], boundary: &[Vec<Point2>]) -> Result<()> {
    let leaves = || OperationError::Failed("offset leaves the face".into());
    for (index, ring) in boundary.iter().enumerate() {
        let want_inside = index == 0;
        for p in result {
            if point_in_polygon_2d(p, ring) != want_inside
                || point_to_loop_dist(p, ring) <= LINEAR_TOLERANCE
            {
                return Err(leaves().into());
            }
        }
        let m = ring.len();
        let n = result.len();
        for i in 0..n {
            for j in 0..m {
                if segments_touch_2d(
                    &result[i],
                    &result[(i + 1) % n],
                    &ring[j],
                    &ring[(j + 1) % m],
                    LINEAR_TOLERANCE,
                ) {
                    return Err(leaves().into());
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::distance_2d::point_to_segment_dist;
    use crate::math::Point3;
    use crate::operations::creation::MakeFace;
    use approx::assert_relative_eq;

    fn square(store: &mut TopologyStore, lo: f64, hi: f64, ccw: bool) -> WireId {
        let mut points = vec![
            Point3::new(lo, lo, 0.0),
            Point3::new(hi, lo, 0.0),
            Point3::new(hi, hi, 0.0),
            Point3::new(lo, hi, 0.0),
        ];
        if !ccw {
            points.reverse();
        }
        MakeWire::new(points, true).execute(store).unwrap()
    }

    fn distance_to_square(p: &Point3, lo: f64, hi: f64) -> f64 {
        let corners = [
            Point2::new(lo, lo),
            Point2::new(hi, lo),
            Point2::new(hi, hi),
            Point2::new(lo, hi),
        ];
        let q = Point2::new(p.x, p.y);
        (0..4)
            .map(|i| point_to_segment_dist(&q, &corners[i], &corners[(i + 1) % 4]))
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn outward_offset_rounds_every_corner() {
        let mut store = TopologyStore::new();
        let wire = square(&mut store, 0.0, 10.0, true);
        let offset = WireOffset2D::new(wire, 1.0).execute(&mut store).unwrap();
        let points = store.wire_points(offset).unwrap();

        // 4 arcs of 12 segments, 13 points each.
        assert_eq!(points.len(), 52);
        for p in &points {
            assert_relative_eq!(distance_to_square(p, 0.0, 10.0), 1.0, epsilon = 1e-9);
            assert_relative_eq!(p.z, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn direction_is_independent_of_winding() {
        let mut store = TopologyStore::new();
        let wire = square(&mut store, 0.0, 10.0, false);
        let offset = WireOffset2D::new(wire, 1.0).execute(&mut store).unwrap();
        let points = store.wire_points(offset).unwrap();
        assert!(points.iter().all(|p| p.x < 0.0 || p.x > 10.0 || p.y < 0.0 || p.y > 10.0));
        // Still clockwise.
        let flat: Vec<Point2> = points.iter().map(|p| Point2::new(p.x, p.y)).collect();
        assert!(signed_area_2d(&flat) < 0.0);
    }

    #[test]
    fn inward_offset_mitres_corners() {
        let mut store = TopologyStore::new();
        let wire = square(&mut store, 0.0, 10.0, true);
        let offset = WireOffset2D::new(wire, -2.0).execute(&mut store).unwrap();
        let points = store.wire_points(offset).unwrap();
        assert_eq!(points.len(), 4);
        assert_relative_eq!(points[0].x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(points[0].y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn reflex_corner_is_mitred_when_growing() {
        let mut store = TopologyStore::new();
        let l_shape = MakeWire::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(4.0, 0.0, 0.0),
                Point3::new(4.0, 2.0, 0.0),
                Point3::new(2.0, 2.0, 0.0),
                Point3::new(2.0, 4.0, 0.0),
                Point3::new(0.0, 4.0, 0.0),
            ],
            true,
        )
        .execute(&mut store)
        .unwrap();
        let offset = WireOffset2D::new(l_shape, 0.5).execute(&mut store).unwrap();
        let points = store.wire_points(offset).unwrap();
        // Five rounded corners of 13 points and one mitre.
        assert_eq!(points.len(), 5 * 13 + 1);
        assert!(points
            .iter()
            .any(|p| (p - Point3::new(2.5, 2.5, 0.0)).norm() < 1e-9));
    }

    #[test]
    fn collapsing_offset_fails() {
        let mut store = TopologyStore::new();
        let wire = square(&mut store, 0.0, 10.0, true);
        assert!(WireOffset2D::new(wire, -5.0).execute(&mut store).is_err());
        assert!(WireOffset2D::new(wire, -7.0).execute(&mut store).is_err());
    }

    #[test]
    fn zero_distance_is_rejected() {
        let mut store = TopologyStore::new();
        let wire = square(&mut store, 0.0, 10.0, true);
        assert!(WireOffset2D::new(wire, 0.0).execute(&mut store).is_err());
    }

    #[test]
    fn bounded_offset_must_stay_in_face() {
        let mut store = TopologyStore::new();
        let outer = square(&mut store, 0.0, 10.0, true);
        let inner = square(&mut store, 2.0, 8.0, false);
        let ring = MakeFace::new(outer, vec![inner]).execute(&mut store).unwrap();

        // Halfway across the 2-wide wall is fine.
        assert!(WireOffset2D::new(inner, 1.0)
            .bounded_by(ring)
            .execute(&mut store)
            .is_ok());
        // Reaching the outer boundary is not.
        assert!(WireOffset2D::new(inner, 2.0)
            .bounded_by(ring)
            .execute(&mut store)
            .is_err());
        // Shrinking into the hole is not.
        assert!(WireOffset2D::new(inner, -0.5)
            .bounded_by(ring)
            .execute(&mut store)
            .is_err());
    }
}
