use super::{Point2, Vector2, TOLERANCE};

/// Parametric 2D line-line intersection.
///
/// Given lines `p1 + t * d1` and `p2 + u * d2`, returns `(t, u)` if not parallel.
#[must_use]
pub fn line_line_intersect_2d(
    p1: &Point2,
    d1: &Vector2,
    p2: &Point2,
    d2: &Vector2,
) -> Option<(f64, f64)> {
    let cross = d1.perp(d2);
    if cross.abs() < TOLERANCE {
        return None;
    }
    let diff = p2 - p1;
    let t = diff.perp(d2) / cross;
    let u = diff.perp(d1) / cross;
    Some((t, u))
}

/// Returns `true` if segments `a0`-`a1` and `b0`-`b1` cross or touch.
///
/// Collinear overlaps count as touching.
#[must_use]
pub fn segments_touch_2d(a0: &Point2, a1: &Point2, b0: &Point2, b1: &Point2, eps: f64) -> bool {
    let da = a1 - a0;
    let db = b1 - b0;

    if let Some((t, u)) = line_line_intersect_2d(a0, &da, b0, &db) {
        let ta = eps / da.norm().max(TOLERANCE);
        let tb = eps / db.norm().max(TOLERANCE);
        return t >= -ta && t <= 1.0 + ta && u >= -tb && u <= 1.0 + tb;
    }

    // Parallel: touching only if collinear and the projections overlap.
    let len = da.norm().max(TOLERANCE);
    if (b0 - a0).perp(&da).abs() / len > eps {
        return false;
    }
    let dir = da / len;
    let (s0, s1) = ((b0 - a0).dot(&dir), (b1 - a0).dot(&dir));
    s0.max(s1) >= -eps && s0.min(s1) <= len + eps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn crossing_lines_meet_at_parameters() {
        let (t, u) = line_line_intersect_2d(
            &p(0.0, 0.0),
            &Vector2::new(2.0, 0.0),
            &p(1.0, -1.0),
            &Vector2::new(0.0, 2.0),
        )
        .unwrap_or_default();
        assert!((t - 0.5).abs() < 1e-12);
        assert!((u - 0.5).abs() < 1e-12);
    }

    #[test]
    fn parallel_lines_have_no_intersection() {
        let r = line_line_intersect_2d(
            &p(0.0, 0.0),
            &Vector2::new(1.0, 0.0),
            &p(0.0, 1.0),
            &Vector2::new(3.0, 0.0),
        );
        assert!(r.is_none());
    }

    #[test]
    fn touching_and_disjoint_segments() {
        assert!(segments_touch_2d(&p(0.0, 0.0), &p(2.0, 2.0), &p(0.0, 2.0), &p(2.0, 0.0), 1e-9));
        assert!(segments_touch_2d(&p(0.0, 0.0), &p(1.0, 0.0), &p(1.0, 0.0), &p(1.0, 1.0), 1e-9));
        assert!(!segments_touch_2d(&p(0.0, 0.0), &p(1.0, 0.0), &p(0.0, 1.0), &p(1.0, 1.0), 1e-9));
        assert!(segments_touch_2d(&p(0.0, 0.0), &p(2.0, 0.0), &p(1.0, 0.0), &p(3.0, 0.0), 1e-9));
        assert!(!segments_touch_2d(&p(0.0, 0.0), &p(1.0, 0.0), &p(2.0, 0.0), &p(3.0, 0.0), 1e-9));
    }
}
