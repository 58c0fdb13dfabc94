use std::collections::HashMap;

use tracing::debug;

use crate::error::{OperationError, Result};
use crate::geometry::surface::Plane;
use crate::math::polygon_2d::{point_in_polygon_2d, signed_area_2d};
use crate::math::polygon_3d::{newell_vector, signed_volume};
use crate::math::{Point2, Point3, Vector3};
use crate::operations::creation::{add_line_edge, MakeSolid};
use crate::topology::{
    EdgeId, FaceData, FaceId, OrientedEdge, ShellData, SolidId, TopologyStore, VertexData,
    VertexId, WireData,
};

/// Distance under which two points are welded into one vertex.
pub(crate) const WELD_TOLERANCE: f64 = 1e-5;

/// Largest distance of a merged polygon's vertices from its region's plane.
const PLANE_TOLERANCE: f64 = 0.5 * WELD_TOLERANCE;

/// Assembles a closed B-rep solid from outward-facing planar polygons.
///
/// The polygons may carry T-junctions and may split one planar region into
/// many pieces, as boolean output does. Coincident points are welded,
/// coplanar neighbours are merged into single faces with holes, collinear
/// seam vertices are dropped, and adjacent faces share edges.
///
/// # Errors
///
/// Returns [`OperationError::Failed`] when the polygons are empty, do not
/// close up, or enclose more than one disconnected lump.
pub(crate) fn assemble_solid(store: &mut TopologyStore, polygons: &[Vec<Point3>]) -> Result<SolidId> {
    let mut welder = PointWelder::new(WELD_TOLERANCE);
    let mut soup: Vec<Vec<usize>> = Vec::with_capacity(polygons.len());
    for polygon in polygons {
        let mut ids: Vec<usize> = polygon.iter().map(|p| welder.index_of(p)).collect();
        ids.dedup();
        while ids.len() > 1 && ids.first() == ids.last() {
            ids.pop();
        }
        if ids.len() >= 3 && !is_sliver(&welder.points, &ids) {
            soup.push(ids);
        }
    }
    if soup.is_empty() {
        return Err(OperationError::Failed("result has no faces".into()).into());
    }

    let points = welder.points;
    insert_t_junctions(&points, &mut soup);

    let mut faces = Vec::new();
    for group in coplanar_groups(&points, &soup) {
        faces.extend(group_faces(&points, &soup, &group)?);
    }
    remove_seam_vertices(&points, &mut faces);

    debug!(
        polygons = polygons.len(),
        vertices = points.len(),
        faces = faces.len(),
        "assembling solid"
    );
    build_topology(store, &points, &faces)
}

/// Boundary loops of one planar face, as indices into the welded points.
struct FaceLoops {
    origin: Point3,
    normal: Vector3,
    outer: Vec<usize>,
    holes: Vec<Vec<usize>>,
}

impl FaceLoops {
    fn loops(&self) -> impl Iterator<Item = &Vec<usize>> {
        std::iter::once(&self.outer).chain(self.holes.iter())
    }
}

/// Grid hash that maps nearby points onto one index.
struct PointWelder {
    cell_size: f64,
    cells: HashMap<(i64, i64, i64), Vec<usize>>,
    points: Vec<Point3>,
}

impl PointWelder {
    fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            points: Vec::new(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_key(&self, p: &Point3) -> (i64, i64, i64) {
        let inv = 1.0 / self.cell_size;
        (
            (p.x * inv).floor() as i64,
            (p.y * inv).floor() as i64,
            (p.z * inv).floor() as i64,
        )
    }

    fn index_of(&mut self, point: &Point3) -> usize {
        let key = self.cell_key(point);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let neighbor = (key.0 + dx, key.1 + dy, key.2 + dz);
                    if let Some(entries) = self.cells.get(&neighbor) {
                        for &index in entries {
                            if (point - self.points[index]).norm() < self.cell_size {
                                return index;
                            }
                        }
                    }
                }
            }
        }
        let index = self.points.len();
        self.points.push(*point);
        self.cells.entry(key).or_default().push(index);
        index
    }
}

fn loop_points(points: &[Point3], ids: &[usize]) -> Vec<Point3> {
    ids.iter().map(|&i| points[i]).collect()
}

/// A polygon whose vertices all lie within weld distance of a line.
fn is_sliver(points: &[Point3], ids: &[usize]) -> bool {
    let area = newell_vector(&loop_points(points, ids)).norm() * 0.5;
    let n = ids.len();
    let longest = (0..n)
        .map(|i| (points[ids[(i + 1) % n]] - points[ids[i]]).norm())
        .fold(0.0, f64::max);
    area <= 0.5 * WELD_TOLERANCE * longest
}

/// Splits every polygon edge at the welded vertices lying on it.
fn insert_t_junctions(points: &[Point3], soup: &mut [Vec<usize>]) {
    let mut used = vec![false; points.len()];
    for polygon in soup.iter() {
        for &i in polygon {
            used[i] = true;
        }
    }
    let by_axis: [Vec<usize>; 3] = std::array::from_fn(|axis| {
        let mut ids: Vec<usize> = (0..points.len()).filter(|&i| used[i]).collect();
        ids.sort_by(|&a, &b| points[a][axis].total_cmp(&points[b][axis]));
        ids
    });

    for polygon in soup.iter_mut() {
        let n = polygon.len();
        let mut split = Vec::with_capacity(n);
        for i in 0..n {
            let (a, b) = (polygon[i], polygon[(i + 1) % n]);
            split.push(a);
            split.extend(vertices_on_segment(points, &by_axis, a, b));
        }
        *polygon = split;
    }
}

/// Vertices strictly inside segment `a → b`, ordered from `a`.
fn vertices_on_segment(
    points: &[Point3],
    by_axis: &[Vec<usize>; 3],
    a: usize,
    b: usize,
) -> Vec<usize> {
    let (pa, pb) = (points[a], points[b]);
    let d = pb - pa;
    let length = d.norm();
    if length <= 2.0 * WELD_TOLERANCE {
        return Vec::new();
    }

    let axis = (0..3)
        .min_by(|&i, &j| d[i].abs().total_cmp(&d[j].abs()))
        .unwrap_or(0);
    let lo = pa[axis].min(pb[axis]) - WELD_TOLERANCE;
    let hi = pa[axis].max(pb[axis]) + WELD_TOLERANCE;
    let sorted = &by_axis[axis];
    let start = sorted.partition_point(|&i| points[i][axis] < lo);

    let mut hits: Vec<(f64, usize)> = Vec::new();
    for &v in sorted[start..].iter().take_while(|&&i| points[i][axis] <= hi) {
        if v == a || v == b {
            continue;
        }
        let along = (points[v] - pa).dot(&d) / length;
        if along <= WELD_TOLERANCE || along >= length - WELD_TOLERANCE {
            continue;
        }
        let foot = pa + d * (along / length);
        if (points[v] - foot).norm() < WELD_TOLERANCE {
            hits.push((along, v));
        }
    }
    hits.sort_by(|x, y| x.0.total_cmp(&y.0));
    hits.into_iter().map(|(_, v)| v).collect()
}

/// Disjoint-set forest with path halving.
pub(crate) struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    pub(crate) fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    pub(crate) fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[rb] = ra;
        }
    }

    /// Members of every set, in order of first appearance.
    pub(crate) fn groups(&mut self) -> Vec<Vec<usize>> {
        let mut slot: HashMap<usize, usize> = HashMap::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for x in 0..self.parent.len() {
            let root = self.find(x);
            let index = *slot.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[index].push(x);
        }
        groups
    }
}

fn undirected(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

/// Polygons merged into one planar region, with the plane they were tested against.
struct CoplanarGroup {
    members: Vec<usize>,
    origin: Point3,
    normal: Vector3,
}

/// Grows planar regions over shared edges.
///
/// Each region is seeded by its largest remaining polygon, and a neighbour
/// joins only when all of its vertices lie within [`PLANE_TOLERANCE`] of the
/// seed plane, so a run of nearly coplanar pieces cannot drift off it.
fn coplanar_groups(points: &[Point3], soup: &[Vec<usize>]) -> Vec<CoplanarGroup> {
    let area_vectors: Vec<Vector3> = soup
        .iter()
        .map(|ids| newell_vector(&loop_points(points, ids)))
        .collect();

    let mut by_edge: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    for (index, ids) in soup.iter().enumerate() {
        let n = ids.len();
        for i in 0..n {
            by_edge
                .entry(undirected(ids[i], ids[(i + 1) % n]))
                .or_default()
                .push(index);
        }
    }
    let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); soup.len()];
    for users in by_edge.values() {
        for (k, &p) in users.iter().enumerate() {
            for &q in &users[k + 1..] {
                if p != q {
                    neighbours[p].push(q);
                    neighbours[q].push(p);
                }
            }
        }
    }

    let mut order: Vec<usize> = (0..soup.len()).collect();
    order.sort_by(|&a, &b| area_vectors[b].norm().total_cmp(&area_vectors[a].norm()));

    let mut assigned = vec![false; soup.len()];
    let mut groups = Vec::new();
    for seed in order {
        if assigned[seed] {
            continue;
        }
        assigned[seed] = true;
        let normal = area_vectors[seed].normalize();
        let seed_points = loop_points(points, &soup[seed]);
        #[allow(clippy::cast_precision_loss)]
        let origin = Point3::from(
            seed_points.iter().map(|p| p.coords).sum::<Vector3>() / seed_points.len() as f64,
        );

        let mut members = vec![seed];
        let mut frontier = vec![seed];
        while let Some(current) = frontier.pop() {
            for &q in &neighbours[current] {
                if assigned[q] || area_vectors[q].dot(&normal) <= 0.5 * area_vectors[q].norm() {
                    continue;
                }
                let on_plane = soup[q]
                    .iter()
                    .all(|&v| normal.dot(&(points[v] - origin)).abs() < PLANE_TOLERANCE);
                if on_plane {
                    assigned[q] = true;
                    members.push(q);
                    frontier.push(q);
                }
            }
        }
        members.sort_unstable();
        groups.push(CoplanarGroup {
            members,
            origin,
            normal,
        });
    }
    groups
}

/// Boundary loops of a coplanar group, sorted into faces.
fn group_faces(
    points: &[Point3],
    soup: &[Vec<usize>],
    group: &CoplanarGroup,
) -> Result<Vec<FaceLoops>> {
    let mut net: HashMap<(usize, usize), i32> = HashMap::new();
    for &index in &group.members {
        let ids = &soup[index];
        let n = ids.len();
        for i in 0..n {
            let (a, b) = (ids[i], ids[(i + 1) % n]);
            *net.entry(undirected(a, b)).or_insert(0) += if a < b { 1 } else { -1 };
        }
    }
    let (origin, normal) = (group.origin, group.normal);

    let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut edge_count = 0usize;
    let mut keys: Vec<_> = net.into_iter().filter(|&(_, c)| c != 0).collect();
    keys.sort_unstable();
    for ((lo, hi), count) in keys {
        let (from, to) = if count > 0 { (lo, hi) } else { (hi, lo) };
        for _ in 0..count.unsigned_abs() {
            outgoing.entry(from).or_default().push(to);
            edge_count += 1;
        }
    }

    let mut loops = Vec::new();
    let mut starts: Vec<usize> = outgoing.keys().copied().collect();
    starts.sort_unstable();
    for start in starts {
        while let Some(next) = outgoing.get_mut(&start).and_then(Vec::pop) {
            let mut chain = vec![start];
            let mut current = next;
            while current != start {
                chain.push(current);
                if chain.len() > edge_count {
                    return Err(OperationError::Failed("boundary loop does not close".into()).into());
                }
                current = outgoing
                    .get_mut(&current)
                    .and_then(Vec::pop)
                    .ok_or_else(|| OperationError::Failed("open boundary in result".into()))?;
            }
            loops.extend(split_at_repeats(chain));
        }
    }

    let frame = Plane::from_normal(origin, normal)?;
    let mut outers: Vec<(Vec<usize>, Vec<Point2>, f64)> = Vec::new();
    let mut holes: Vec<(Vec<usize>, Vec<Point2>)> = Vec::new();
    for ids in loops {
        let flat: Vec<Point2> = ids.iter().map(|&i| frame.project(&points[i])).collect();
        let area = signed_area_2d(&flat);
        if area > WELD_TOLERANCE * WELD_TOLERANCE {
            outers.push((ids, flat, area));
        } else if area < -WELD_TOLERANCE * WELD_TOLERANCE {
            holes.push((ids, flat));
        }
    }

    let mut faces: Vec<FaceLoops> = outers
        .iter()
        .map(|(ids, _, _)| FaceLoops {
            origin,
            normal,
            outer: ids.clone(),
            holes: Vec::new(),
        })
        .collect();
    for (ids, flat) in holes {
        let probe = Point2::from((flat[0].coords + flat[1].coords) * 0.5);
        let owner = outers
            .iter()
            .enumerate()
            .filter(|(_, (_, outer, _))| point_in_polygon_2d(&probe, outer))
            .min_by(|a, b| a.1 .2.total_cmp(&b.1 .2))
            .map(|(index, _)| index)
            .ok_or_else(|| OperationError::Failed("hole loop outside every face".into()))?;
        faces[owner].holes.push(ids);
    }
    Ok(faces)
}

/// Splits a closed vertex loop wherever it revisits a vertex.
fn split_at_repeats(chain: Vec<usize>) -> Vec<Vec<usize>> {
    let mut result = Vec::new();
    let mut path: Vec<usize> = Vec::with_capacity(chain.len());
    let mut position: HashMap<usize, usize> = HashMap::new();
    for v in chain {
        if let Some(&at) = position.get(&v) {
            let cut: Vec<usize> = path.drain(at..).collect();
            for w in &cut[1..] {
                position.remove(w);
            }
            path.push(v);
            if cut.len() >= 3 {
                result.push(cut);
            }
        } else {
            position.insert(v, path.len());
            path.push(v);
        }
    }
    if path.len() >= 3 {
        result.push(path);
    }
    result
}

/// Drops vertices that sit mid-way along a straight seam between two faces.
fn remove_seam_vertices(points: &[Point3], faces: &mut [FaceLoops]) {
    // vertex -> (face, collinear) for every loop occurrence
    let mut uses: HashMap<usize, Vec<(usize, bool)>> = HashMap::new();
    for (face_index, face) in faces.iter().enumerate() {
        for ids in face.loops() {
            let n = ids.len();
            for i in 0..n {
                let prev = points[ids[(i + n - 1) % n]];
                let here = points[ids[i]];
                let next = points[ids[(i + 1) % n]];
                uses.entry(ids[i])
                    .or_default()
                    .push((face_index, is_straight(&prev, &here, &next)));
            }
        }
    }

    let removable: std::collections::HashSet<usize> = uses
        .into_iter()
        .filter(|(_, occ)| occ.len() == 2 && occ[0].0 != occ[1].0 && occ[0].1 && occ[1].1)
        .map(|(v, _)| v)
        .collect();
    if removable.is_empty() {
        return;
    }

    for face in faces.iter_mut() {
        face.outer.retain(|v| !removable.contains(v));
        for hole in &mut face.holes {
            hole.retain(|v| !removable.contains(v));
        }
    }
}

fn is_straight(prev: &Point3, here: &Point3, next: &Point3) -> bool {
    let chord = next - prev;
    let length = chord.norm();
    if length < WELD_TOLERANCE {
        return false;
    }
    let offset = (here - prev).cross(&chord).norm() / length;
    offset < WELD_TOLERANCE && (here - prev).dot(&(next - here)) > 0.0
}

/// Creates vertices, shared edges, wires, faces, shells and the solid.
fn build_topology(store: &mut TopologyStore, points: &[Point3], faces: &[FaceLoops]) -> Result<SolidId> {
    let mut vertex_ids: HashMap<usize, VertexId> = HashMap::new();
    let mut edges: HashMap<(usize, usize), (EdgeId, usize)> = HashMap::new();
    let mut edge_faces: HashMap<(usize, usize), Vec<(usize, bool)>> = HashMap::new();
    let mut face_ids: Vec<FaceId> = Vec::with_capacity(faces.len());

    for (face_index, face) in faces.iter().enumerate() {
        let mut wires = Vec::with_capacity(1 + face.holes.len());
        for ids in face.loops() {
            let n = ids.len();
            let mut oriented = Vec::with_capacity(n);
            for i in 0..n {
                let (a, b) = (ids[i], ids[(i + 1) % n]);
                for &index in &[a, b] {
                    if let std::collections::hash_map::Entry::Vacant(slot) = vertex_ids.entry(index) {
                        slot.insert(store.add_vertex(VertexData::new(points[index])));
                    }
                }
                let key = undirected(a, b);
                let (edge, start) = if let Some(&existing) = edges.get(&key) {
                    existing
                } else {
                    let edge = add_line_edge(store, vertex_ids[&a], vertex_ids[&b])?;
                    edges.insert(key, (edge, a));
                    (edge, a)
                };
                oriented.push(OrientedEdge::new(edge, start == a));
                edge_faces.entry(key).or_default().push((face_index, start == a));
            }
            wires.push(store.add_wire(WireData {
                edges: oriented,
                is_closed: true,
            }));
        }
        let surface = Plane::from_normal(face.origin, face.normal)?;
        face_ids.push(store.add_face(FaceData {
            surface,
            outer_wire: wires[0],
            inner_wires: wires[1..].to_vec(),
        }));
    }

    let mut sets = UnionFind::new(faces.len());
    for users in edge_faces.values() {
        for pair in users.windows(2) {
            sets.union(pair[0].0, pair[1].0);
        }
    }

    let mut lumps = Vec::new();
    let mut voids = Vec::new();
    for members in sets.groups() {
        let loops: Vec<Vec<Point3>> = members
            .iter()
            .flat_map(|&f| faces[f].loops().map(|ids| loop_points(points, ids)))
            .collect();
        let volume = signed_volume(&loops);
        let is_closed = edge_faces.values().all(|users| {
            !members.contains(&users[0].0)
                || (users.len() == 2 && users[0].1 != users[1].1)
        });
        let shell = store.add_shell(ShellData {
            faces: members.iter().map(|&f| face_ids[f]).collect(),
            is_closed,
        });
        if volume > 0.0 {
            lumps.push(shell);
        } else {
            voids.push(shell);
        }
    }

    match lumps.as_slice() {
        [lump] => MakeSolid::new(*lump, voids).execute(store),
        _ => Err(OperationError::Failed(format!(
            "result splits into {} disconnected lumps",
            lumps.len()
        ))
        .into()),
    }
}
