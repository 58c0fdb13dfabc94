use crate::math::{Point3, Vector3};

/// Distance below which a point counts as lying on a splitting plane.
pub(crate) const BSP_EPSILON: f64 = 1e-5;

const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

/// Oriented plane `normal . p = w`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BspPlane {
    normal: Vector3,
    w: f64,
}

impl BspPlane {
    fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            w: -self.w,
        }
    }

    fn classify(&self, point: &Point3) -> u8 {
        let t = self.normal.dot(&point.coords) - self.w;
        if t < -BSP_EPSILON {
            BACK
        } else if t > BSP_EPSILON {
            FRONT
        } else {
            COPLANAR
        }
    }
}

/// Convex planar polygon carried through the tree.
///
/// Pieces produced by splitting keep the plane of the polygon they came
/// from.
#[derive(Debug, Clone)]
pub(crate) struct BspPolygon {
    pub(crate) vertices: Vec<Point3>,
    plane: BspPlane,
}

impl BspPolygon {
    /// Builds a polygon, or `None` when its vertices span no area.
    pub(crate) fn new(vertices: Vec<Point3>) -> Option<Self> {
        let normal = crate::math::polygon_3d::newell_normal(&vertices)?;
        let w = normal.dot(&vertices[0].coords);
        Some(Self {
            vertices,
            plane: BspPlane { normal, w },
        })
    }

    fn flip(&mut self) {
        self.vertices.reverse();
        self.plane = self.plane.flipped();
    }
}

#[derive(Default)]
struct SplitResult {
    coplanar_front: Vec<BspPolygon>,
    coplanar_back: Vec<BspPolygon>,
    front: Vec<BspPolygon>,
    back: Vec<BspPolygon>,
}

fn split_polygon(plane: &BspPlane, polygon: BspPolygon, out: &mut SplitResult) {
    let types: Vec<u8> = polygon.vertices.iter().map(|v| plane.classify(v)).collect();
    let polygon_type = types.iter().fold(COPLANAR, |acc, &t| acc | t);

    match polygon_type {
        COPLANAR => {
            if plane.normal.dot(&polygon.plane.normal) > 0.0 {
                out.coplanar_front.push(polygon);
            } else {
                out.coplanar_back.push(polygon);
            }
        }
        FRONT => out.front.push(polygon),
        BACK => out.back.push(polygon),
        _ => {
            let n = polygon.vertices.len();
            let mut f = Vec::with_capacity(n + 1);
            let mut b = Vec::with_capacity(n + 1);
            for i in 0..n {
                let j = (i + 1) % n;
                let (ti, tj) = (types[i], types[j]);
                let (vi, vj) = (polygon.vertices[i], polygon.vertices[j]);
                if ti != BACK {
                    f.push(vi);
                }
                if ti != FRONT {
                    b.push(vi);
                }
                if ti | tj == SPANNING {
                    let t = (plane.w - plane.normal.dot(&vi.coords))
                        / plane.normal.dot(&(vj - vi));
                    let v = vi + (vj - vi) * t;
                    f.push(v);
                    b.push(v);
                }
            }
            if f.len() >= 3 {
                out.front.push(BspPolygon {
                    vertices: f,
                    plane: polygon.plane,
                });
            }
            if b.len() >= 3 {
                out.back.push(BspPolygon {
                    vertices: b,
                    plane: polygon.plane,
                });
            }
        }
    }
}

#[derive(Default)]
struct BspNode {
    plane: Option<BspPlane>,
    front: Option<usize>,
    back: Option<usize>,
    polygons: Vec<BspPolygon>,
}

/// Binary space partitioning tree over the boundary of one solid.
///
/// Nodes live in an arena; every algorithm walks it with an explicit
/// stack so deep trees cannot exhaust the call stack.
pub(crate) struct BspTree {
    nodes: Vec<BspNode>,
}

impl BspTree {
    pub(crate) fn new(polygons: Vec<BspPolygon>) -> Self {
        let mut tree = Self {
            nodes: vec![BspNode::default()],
        };
        tree.build(polygons);
        tree
    }

    fn child(&mut self, node: usize, front: bool) -> usize {
        let existing = if front {
            self.nodes[node].front
        } else {
            self.nodes[node].back
        };
        if let Some(index) = existing {
            return index;
        }
        let index = self.nodes.len();
        self.nodes.push(BspNode::default());
        if front {
            self.nodes[node].front = Some(index);
        } else {
            self.nodes[node].back = Some(index);
        }
        index
    }

    /// Inserts polygons, splitting them by the planes already in the tree.
    pub(crate) fn build(&mut self, polygons: Vec<BspPolygon>) {
        let mut stack = vec![(0usize, polygons)];
        while let Some((node, polygons)) = stack.pop() {
            if polygons.is_empty() {
                continue;
            }
            let plane = *self.nodes[node]
                .plane
                .get_or_insert(polygons[0].plane);
            let mut split = SplitResult::default();
            for polygon in polygons {
                split_polygon(&plane, polygon, &mut split);
            }
            let here = &mut self.nodes[node].polygons;
            here.append(&mut split.coplanar_front);
            here.append(&mut split.coplanar_back);
            if !split.front.is_empty() {
                let child = self.child(node, true);
                stack.push((child, split.front));
            }
            if !split.back.is_empty() {
                let child = self.child(node, false);
                stack.push((child, split.back));
            }
        }
    }

    /// Converts solid space to empty space and vice versa.
    pub(crate) fn invert(&mut self) {
        for node in &mut self.nodes {
            for polygon in &mut node.polygons {
                polygon.flip();
            }
            node.plane = node.plane.map(BspPlane::flipped);
            std::mem::swap(&mut node.front, &mut node.back);
        }
    }

    /// Removes the parts of `polygons` that lie inside this tree's solid.
    fn clip_polygons(&self, polygons: Vec<BspPolygon>) -> Vec<BspPolygon> {
        let mut kept = Vec::new();
        let mut stack = vec![(0usize, polygons)];
        while let Some((index, polygons)) = stack.pop() {
            let node = &self.nodes[index];
            let Some(plane) = node.plane else {
                kept.extend(polygons);
                continue;
            };
            let mut split = SplitResult::default();
            for polygon in polygons {
                split_polygon(&plane, polygon, &mut split);
            }
            let mut front = split.front;
            front.append(&mut split.coplanar_front);
            let mut back = split.back;
            back.append(&mut split.coplanar_back);

            match node.front {
                Some(child) => stack.push((child, front)),
                None => kept.extend(front),
            }
            if let Some(child) = node.back {
                stack.push((child, back));
            }
        }
        kept
    }

    /// Removes every polygon of this tree that lies inside `other`.
    pub(crate) fn clip_to(&mut self, other: &BspTree) {
        for node in &mut self.nodes {
            let polygons = std::mem::take(&mut node.polygons);
            node.polygons = other.clip_polygons(polygons);
        }
    }

    pub(crate) fn all_polygons(&self) -> Vec<BspPolygon> {
        self.nodes
            .iter()
            .flat_map(|node| node.polygons.iter().cloned())
            .collect()
    }

    pub(crate) fn into_polygons(self) -> Vec<BspPolygon> {
        self.nodes
            .into_iter()
            .flat_map(|node| node.polygons)
            .collect()
    }
}

/// Boundary polygons of `a ∪ b`.
pub(crate) fn union(mut a: BspTree, mut b: BspTree) -> Vec<BspPolygon> {
    a.clip_to(&b);
    b.clip_to(&a);
    b.invert();
    b.clip_to(&a);
    b.invert();
    a.build(b.all_polygons());
    a.into_polygons()
}

/// Boundary polygons of `a − b`.
pub(crate) fn subtract(mut a: BspTree, mut b: BspTree) -> Vec<BspPolygon> {
    a.invert();
    a.clip_to(&b);
    b.clip_to(&a);
    b.invert();
    b.clip_to(&a);
    b.invert();
    a.build(b.all_polygons());
    a.invert();
    a.into_polygons()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::polygon_3d::signed_volume;

    fn cube(min: Point3, size: f64) -> Vec<BspPolygon> {
        let p = |x: f64, y: f64, z: f64| Point3::new(min.x + x * size, min.y + y * size, min.z + z * size);
        let quads = [
            [p(0., 0., 0.), p(0., 1., 0.), p(1., 1., 0.), p(1., 0., 0.)],
            [p(0., 0., 1.), p(1., 0., 1.), p(1., 1., 1.), p(0., 1., 1.)],
            [p(0., 0., 0.), p(1., 0., 0.), p(1., 0., 1.), p(0., 0., 1.)],
            [p(0., 1., 0.), p(0., 1., 1.), p(1., 1., 1.), p(1., 1., 0.)],
            [p(0., 0., 0.), p(0., 0., 1.), p(0., 1., 1.), p(0., 1., 0.)],
            [p(1., 0., 0.), p(1., 1., 0.), p(1., 1., 1.), p(1., 0., 1.)],
        ];
        quads
            .iter()
            .map(|q| BspPolygon::new(q.to_vec()).unwrap())
            .collect()
    }

    fn volume(polygons: &[BspPolygon]) -> f64 {
        let loops: Vec<Vec<Point3>> = polygons.iter().map(|p| p.vertices.clone()).collect();
        signed_volume(&loops)
    }

    #[test]
    fn split_spanning_polygon_keeps_both_sides() {
        let plane = BspPlane {
            normal: Vector3::new(1.0, 0.0, 0.0),
            w: 0.5,
        };
        let square = BspPolygon::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ])
        .unwrap();
        let mut out = SplitResult::default();
        split_polygon(&plane, square, &mut out);
        assert_eq!(out.front.len(), 1);
        assert_eq!(out.back.len(), 1);
        assert!(out.front[0].vertices.iter().all(|v| v.x >= 0.5 - 1e-12));
        assert!(out.back[0].vertices.iter().all(|v| v.x <= 0.5 + 1e-12));
    }

    #[test]
    fn subtract_overlapping_cubes() {
        let a = BspTree::new(cube(Point3::new(0.0, 0.0, 0.0), 2.0));
        let b = BspTree::new(cube(Point3::new(1.0, 1.0, 1.0), 2.0));
        let result = subtract(a, b);
        assert!((volume(&result) - 7.0).abs() < 1e-9);
    }

    #[test]
    fn union_overlapping_cubes() {
        let a = BspTree::new(cube(Point3::new(0.0, 0.0, 0.0), 2.0));
        let b = BspTree::new(cube(Point3::new(1.0, 1.0, 1.0), 2.0));
        let result = union(a, b);
        assert!((volume(&result) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn subtract_disjoint_leaves_original() {
        let a = BspTree::new(cube(Point3::new(0.0, 0.0, 0.0), 1.0));
        let b = BspTree::new(cube(Point3::new(5.0, 5.0, 5.0), 1.0));
        let result = subtract(a, b);
        assert!((volume(&result) - 1.0).abs() < 1e-12);
    }
}
