use crate::error::{OperationError, Result};
use crate::math::Point3;
use crate::topology::{SolidId, TopologyStore};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Smallest box containing every point, or `None` for no points.
    #[must_use]
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(
            Self {
                min: first,
                max: first,
            },
            |acc, p| acc.including(p),
        ))
    }

    /// This box grown to contain `point`.
    #[must_use]
    pub fn including(self, point: &Point3) -> Self {
        Self {
            min: self.min.inf(point),
            max: self.max.sup(point),
        }
    }

    /// Smallest box containing both boxes.
    #[must_use]
    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Returns `true` if the boxes share any point, boundaries included.
    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        (0..3).all(|i| self.min[i] <= other.max[i] && other.min[i] <= self.max[i])
    }
}

/// Computes the axis-aligned bounding box of a solid.
pub struct BoundingBox {
    solid: SolidId,
}

impl BoundingBox {
    /// Creates a new `BoundingBox` query.
    #[must_use]
    pub fn new(solid: SolidId) -> Self {
        Self { solid }
    }

    /// Executes the query, returning the AABB of all boundary vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid or any of its topology is missing, or
    /// the solid has no vertices.
    pub fn execute(&self, store: &TopologyStore) -> Result<Aabb> {
        let mut points = Vec::new();
        for face in store.solid_faces(self.solid)? {
            for wire in store.face(face)?.wires() {
                points.extend(store.wire_points(wire)?);
            }
        }
        Aabb::from_points(&points)
            .ok_or_else(|| OperationError::InvalidInput("solid has no vertices".into()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aabb(min: [f64; 3], max: [f64; 3]) -> Aabb {
        Aabb {
            min: Point3::from(min),
            max: Point3::from(max),
        }
    }

    #[test]
    fn overlap_and_separation() {
        let a = aabb([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let b = aabb([0.5, 0.5, 0.5], [2.0, 2.0, 2.0]);
        let c = aabb([1.5, 0.0, 0.0], [2.0, 1.0, 1.0]);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        let both = a.union(&c);
        assert_eq!(both.max.x, 2.0);
    }

    #[test]
    fn from_points_spans_all() {
        let points = [Point3::new(1.0, -2.0, 0.0), Point3::new(-1.0, 3.0, 0.5)];
        let bounds = Aabb::from_points(&points).unwrap_or(aabb([0.0; 3], [0.0; 3]));
        assert_eq!(bounds.min, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(bounds.max, Point3::new(1.0, 3.0, 0.5));
        assert!(Aabb::from_points(&[]).is_none());
    }
}
