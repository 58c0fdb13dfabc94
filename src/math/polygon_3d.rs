use super::{Point3, Vector3, TOLERANCE};

/// Unnormalized polygon normal by Newell's method.
///
/// Its length is twice the polygon area, so it also serves as an area test.
#[must_use]
pub fn newell_vector(points: &[Point3]) -> Vector3 {
    let n = points.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let curr = &points[i];
        let next = &points[(i + 1) % n];
        normal.x += (curr.y - next.y) * (curr.z + next.z);
        normal.y += (curr.z - next.z) * (curr.x + next.x);
        normal.z += (curr.x - next.x) * (curr.y + next.y);
    }
    normal
}

/// Unit polygon normal by Newell's method, or `None` for a degenerate polygon.
#[must_use]
pub fn newell_normal(points: &[Point3]) -> Option<Vector3> {
    let normal = newell_vector(points);
    let len = normal.norm();
    (len > TOLERANCE).then(|| normal / len)
}

/// Largest distance of any point from the plane through `origin` with unit `normal`.
#[must_use]
pub fn max_plane_deviation(points: &[Point3], origin: &Point3, normal: &Vector3) -> f64 {
    points
        .iter()
        .map(|p| (p - origin).dot(normal).abs())
        .fold(0.0, f64::max)
}

/// Signed volume enclosed by a set of closed, consistently oriented polygons.
///
/// Positive when the polygons face outward.
#[must_use]
pub fn signed_volume(polygons: &[Vec<Point3>]) -> f64 {
    let mut six_volume = 0.0;
    for polygon in polygons {
        let Some(first) = polygon.first() else {
            continue;
        };
        for i in 1..polygon.len().saturating_sub(1) {
            let a = polygon[i];
            let b = polygon[i + 1];
            six_volume += first.coords.dot(&a.coords.cross(&b.coords));
        }
    }
    six_volume / 6.0
}
