use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use tracing::{debug, warn};

use crate::error::{OperationError, Result, TopologyError};
use crate::math::{arc_segments, Point3, Vector3, TOLERANCE};
use crate::operations::boolean::{assemble_solid, Subtract, Union};
use crate::operations::query::{Adjacency, SolidAdjacency};
use crate::operations::shaping::ruled_polygons;
use crate::topology::{EdgeId, FaceId, SolidId, TopologyStore, VertexId, WireId};

/// Faces whose normals are closer than this angle are treated as tangent.
const SMOOTH_ANGLE: f64 = PI / 18.0;

/// How far a fillet tool reaches past the faces it touches, per unit radius.
const OVERSHOOT: f64 = 0.05;

/// Smallest `|n . e|` for a face at a chain end to serve as its end cap.
const CAP_ALIGNMENT: f64 = 0.3;

/// Share of the collapse distance a profile may use on a tightly turning chain.
const REACH_MARGIN: f64 = 0.95;

/// Profiles shrunk below this factor are rejected.
const MIN_PROFILE_SCALE: f64 = 0.25;

/// Constant-radius fillet of straight edges.
///
/// Selected edges are grouped into chains that run along one shared face.
/// Each chain is swept with a spandrel profile, the region between the sharp
/// edge and the rounding arc, mitred where consecutive edges meet. Convex
/// chains are cut away from the solid and concave chains are filled in.
/// The arc is faceted in steps of at most [`crate::math::ARC_STEP`].
///
/// Where a chain turns tighter than the radius allows, its profile is
/// shrunk locally so the sweep stays free of self-intersections.
pub struct Fillet {
    solid: SolidId,
    edges: Vec<EdgeId>,
    radius: f64,
}

/// Where an edge sits inside the boundary loop of the face its chain follows.
#[derive(Debug, Clone, Copy)]
struct LoopSlot {
    face: FaceId,
    wire: WireId,
    index: usize,
    forward: bool,
}

/// One selected edge, oriented along the loop of its chain face.
#[derive(Debug, Clone, Copy)]
struct EdgeSpan {
    slot: LoopSlot,
    other: FaceId,
    start_vertex: VertexId,
    end_vertex: VertexId,
    start: Point3,
    end: Point3,
    normal: Vector3,
    other_normal: Vector3,
    convex: bool,
}

impl EdgeSpan {
    fn direction(&self) -> Vector3 {
        (self.end - self.start).normalize()
    }

    fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// Unit directions from the edge into the chain face and the other face.
    fn inward(&self) -> (Vector3, Vector3) {
        let d = self.direction();
        (self.normal.cross(&d), d.cross(&self.other_normal))
    }

    /// Angle between the two faces, measured across the filleted wedge.
    fn opening(&self) -> f64 {
        let (t1, t2) = self.inward();
        t1.dot(&t2).clamp(-1.0, 1.0).acos()
    }
}

#[derive(Debug)]
struct Chain {
    spans: Vec<EdgeSpan>,
    closed: bool,
}

impl Chain {
    fn convex(&self) -> bool {
        self.spans.first().is_some_and(|span| span.convex)
    }
}

impl Fillet {
    /// Creates a new `Fillet` operation.
    #[must_use]
    pub fn new(solid: SolidId, edges: Vec<EdgeId>, radius: f64) -> Self {
        Self {
            solid,
            edges,
            radius,
        }
    }

    /// Executes the fillet, returning the rounded solid.
    ///
    /// A radius of zero or less leaves the solid untouched and returns it.
    /// Edges not shared by exactly two faces of the solid, and edges between
    /// nearly tangent faces, are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Failed`] if a chain turns too tightly for
    /// the radius, or if a boolean step cannot produce a single solid.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<SolidId> {
        if self.radius <= TOLERANCE {
            debug!(radius = self.radius, "fillet radius is zero, solid unchanged");
            return Ok(self.solid);
        }

        let adjacency = SolidAdjacency::new(self.solid).execute(store)?;
        let chains = self.chains(store, &adjacency)?;
        debug!(
            edges = self.edges.len(),
            chains = chains.len(),
            radius = self.radius,
            "fillet"
        );

        let mut tools = Vec::with_capacity(chains.len());
        for chain in &chains {
            let rings = self.sweep_sections(chain, &adjacency)?;
            let polygons = ruled_polygons(&rings, chain.closed);
            tools.push((assemble_solid(store, &polygons)?, chain.convex()));
        }

        let mut solid = self.solid;
        for (tool, convex) in tools {
            solid = if convex {
                Subtract::new(solid, tool).execute(store)?
            } else {
                Union::new(solid, tool).execute(store)?
            };
        }
        Ok(solid)
    }

    fn overshoot(&self, convex: bool) -> f64 {
        let distance = self.radius * OVERSHOOT;
        if convex {
            distance
        } else {
            -distance
        }
    }

    /// Groups the usable selected edges into chains.
    fn chains(&self, store: &TopologyStore, adjacency: &Adjacency) -> Result<Vec<Chain>> {
        let smooth = SMOOTH_ANGLE.cos();
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        for &edge in &self.edges {
            if !seen.insert(edge) {
                continue;
            }
            let faces = adjacency.faces_of_edge(edge);
            let &[a, b] = faces else {
                warn!(?edge, faces = faces.len(), "fillet edge is not shared by two faces, skipped");
                continue;
            };
            if face_normal(adjacency, a)?.dot(&face_normal(adjacency, b)?) > smooth {
                debug!(?edge, "faces meet tangentially, edge skipped");
                continue;
            }
            order.push(edge);
        }
        let eligible: HashSet<EdgeId> = order.iter().copied().collect();

        let mut slots: HashMap<EdgeId, Vec<LoopSlot>> = HashMap::new();
        let mut per_face: HashMap<FaceId, usize> = HashMap::new();
        for &face in &adjacency.faces {
            for wire in store.face(face)?.wires() {
                for (index, oe) in store.wire(wire)?.edges.iter().enumerate() {
                    if eligible.contains(&oe.edge) {
                        slots.entry(oe.edge).or_default().push(LoopSlot {
                            face,
                            wire,
                            index,
                            forward: oe.forward,
                        });
                        *per_face.entry(face).or_default() += 1;
                    }
                }
            }
        }

        // Each edge follows whichever of its faces carries the most selected edges.
        let mut spans: HashMap<EdgeId, EdgeSpan> = HashMap::new();
        for &edge in &order {
            let best = slots.get(&edge).and_then(|candidates| {
                candidates
                    .iter()
                    .copied()
                    .max_by_key(|s| (per_face.get(&s.face).copied().unwrap_or(0), s.forward))
            });
            if let Some(slot) = best {
                spans.insert(edge, edge_span(store, adjacency, edge, slot)?);
            }
        }

        let mut used = HashSet::new();
        let mut chains = Vec::new();
        for &edge in &order {
            let Some(&seed) = spans.get(&edge) else {
                continue;
            };
            if !used.insert(edge) {
                continue;
            }
            let loop_edges = &store.wire(seed.slot.wire)?.edges;
            let len = loop_edges.len();
            let joins = |other: EdgeId, used: &HashSet<EdgeId>| {
                spans.get(&other).copied().filter(|s| {
                    s.slot.face == seed.slot.face && s.convex == seed.convex && !used.contains(&other)
                })
            };

            let mut ahead = Vec::new();
            let mut closed = false;
            let mut i = seed.slot.index;
            loop {
                i = (i + 1) % len;
                let next = loop_edges[i].edge;
                if next == edge {
                    closed = true;
                    break;
                }
                let Some(span) = joins(next, &used) else {
                    break;
                };
                used.insert(next);
                ahead.push(span);
            }

            let mut behind = Vec::new();
            if !closed {
                let mut i = seed.slot.index;
                loop {
                    i = (i + len - 1) % len;
                    let prev = loop_edges[i].edge;
                    let Some(span) = joins(prev, &used) else {
                        break;
                    };
                    used.insert(prev);
                    behind.push(span);
                }
            }

            behind.reverse();
            behind.push(seed);
            behind.extend(ahead);
            chains.push(Chain {
                spans: behind,
                closed,
            });
        }
        Ok(chains)
    }

    /// Cross-sections of a chain's sweep, one per chain vertex.
    fn sweep_sections(&self, chain: &Chain, adjacency: &Adjacency) -> Result<Vec<Vec<Point3>>> {
        let spans = &chain.spans;
        let m = spans.len();
        let chords = spans
            .iter()
            .map(|span| arc_segments(PI - span.opening()))
            .max()
            .unwrap_or(1);
        let profiles: Vec<Vec<Vector3>> = spans.iter().map(|s| self.profile(s, chords)).collect();
        let scales = self.profile_scales(chain)?;

        let mut rings = Vec::with_capacity(m + 1);
        if !chain.closed {
            rings.push(self.end_section(&spans[0], &profiles[0], scales[0], adjacency, false)?);
        }
        let first_joint = usize::from(!chain.closed);
        for j in first_joint..m {
            let prev = (j + m - 1) % m;
            rings.push(joint_section(
                (&spans[prev], profiles[prev].as_slice()),
                (&spans[j], profiles[j].as_slice()),
                scales[prev].min(scales[j]),
            )?);
        }
        if !chain.closed {
            let last = m - 1;
            rings.push(self.end_section(
                &spans[last],
                &profiles[last],
                scales[last],
                adjacency,
                true,
            )?);
        }
        Ok(rings)
    }

    /// Spandrel cross-section of a span as offsets from a point on its edge.
    ///
    /// The polygon runs from the tangent point on the chain face, out past
    /// both faces by the overshoot, to the tangent point on the other face,
    /// and back along the arc.
    #[allow(clippy::cast_precision_loss)]
    fn profile(&self, span: &EdgeSpan, chords: usize) -> Vec<Vector3> {
        let (t1, t2) = span.inward();
        let opening = span.opening();
        let half = opening / 2.0;
        let reach = self.radius / half.tan();
        let centre = (t1 + t2).normalize() * (self.radius / half.sin());
        let delta = self.overshoot(span.convex);
        let (p1, p2) = (t1 * reach, t2 * reach);

        let mut offsets = Vec::with_capacity(4 + chords);
        offsets.push(p1);
        offsets.push(p1 + span.normal * delta);
        offsets.push((span.normal + span.other_normal) * delta);
        offsets.push(p2 + span.other_normal * delta);
        offsets.push(p2);

        let u0 = (p2 - centre) / self.radius;
        let u1 = (p1 - centre) / self.radius;
        let w = (u1 - u0 * u0.dot(&u1)).normalize();
        let sweep = PI - opening;
        for k in 1..chords {
            let a = sweep * k as f64 / chords as f64;
            offsets.push(centre + (u0 * a.cos() + w * a.sin()) * self.radius);
        }
        offsets
    }

    /// Per-span profile scale keeping mitred sections from crossing.
    fn profile_scales(&self, chain: &Chain) -> Result<Vec<f64>> {
        let spans = &chain.spans;
        let m = spans.len();
        // tan of half the turn toward the chain face at the joint before span `j`
        let shrink_at = |j: usize| {
            if !chain.closed && (j == 0 || j == m) {
                return 0.0;
            }
            let prev = &spans[(j + m - 1) % m];
            let next = &spans[j % m];
            let (a, b) = (prev.direction(), next.direction());
            let turn = next.normal.dot(&a.cross(&b)).atan2(a.dot(&b));
            (turn / 2.0).tan().max(0.0)
        };

        spans
            .iter()
            .enumerate()
            .map(|(i, span)| {
                let reach = self.radius / (span.opening() / 2.0).tan();
                let shrink = shrink_at(i) + shrink_at(i + 1);
                let limit = if shrink > 0.0 {
                    REACH_MARGIN * span.length() / shrink
                } else {
                    f64::INFINITY
                };
                let scale = (limit / reach).min(1.0);
                if scale < MIN_PROFILE_SCALE {
                    return Err(OperationError::Failed(format!(
                        "fillet radius {} is too large for a chain turning at edge {i}",
                        self.radius
                    ))
                    .into());
                }
                Ok(scale)
            })
            .collect()
    }

    /// Section at an open chain end, laid onto the end cap face when there
    /// is one.
    fn end_section(
        &self,
        span: &EdgeSpan,
        profile: &[Vector3],
        scale: f64,
        adjacency: &Adjacency,
        at_end: bool,
    ) -> Result<Vec<Point3>> {
        let d = span.direction();
        let (vertex, base, outward) = if at_end {
            (span.end_vertex, span.end, d)
        } else {
            (span.start_vertex, span.start, -d)
        };

        let cap = adjacency
            .faces_of_vertex(vertex)
            .iter()
            .copied()
            .filter(|&f| f != span.slot.face && f != span.other)
            .filter_map(|f| adjacency.normal(f).copied())
            .max_by(|a, b| a.dot(&d).abs().total_cmp(&b.dot(&d).abs()));
        let (origin, normal) = match cap {
            Some(n) if n.dot(&d).abs() > CAP_ALIGNMENT => {
                let shift = self.overshoot(span.convex);
                // only ever lengthen the tool
                let shift = if shift * n.dot(&outward) > 0.0 { shift } else { 0.0 };
                (base + n * shift, n)
            }
            _ => (base, d),
        };

        profile
            .iter()
            .map(|offset| project_along(&(base + offset * scale), &d, &origin, &normal))
            .collect()
    }
}

/// Section on the mitre plane between two consecutive spans.
fn joint_section(
    (prev, prev_profile): (&EdgeSpan, &[Vector3]),
    (next, next_profile): (&EdgeSpan, &[Vector3]),
    scale: f64,
) -> Result<Vec<Point3>> {
    let (a, b) = (prev.direction(), next.direction());
    let mitre = (a + b)
        .try_normalize(TOLERANCE)
        .ok_or_else(|| OperationError::Failed("fillet chain folds back on itself".into()))?;
    let joint = next.start;
    prev_profile
        .iter()
        .zip(next_profile)
        .map(|(p, q)| -> Result<Point3> {
            let x = project_along(&(joint + p * scale), &a, &joint, &mitre)?;
            let y = project_along(&(joint + q * scale), &b, &joint, &mitre)?;
            Ok(Point3::from((x.coords + y.coords) * 0.5))
        })
        .collect()
}

/// Slides `point` along `direction` onto the plane through `origin`.
fn project_along(
    point: &Point3,
    direction: &Vector3,
    origin: &Point3,
    normal: &Vector3,
) -> Result<Point3> {
    let denom = direction.dot(normal);
    if denom.abs() < 1e-3 {
        return Err(OperationError::Failed("fillet section is parallel to its edge".into()).into());
    }
    Ok(point + direction * ((origin - point).dot(normal) / denom))
}

fn face_normal(adjacency: &Adjacency, face: FaceId) -> Result<Vector3> {
    adjacency
        .normal(face)
        .copied()
        .ok_or_else(|| TopologyError::EntityNotFound(format!("{face:?}")).into())
}

fn edge_span(
    store: &TopologyStore,
    adjacency: &Adjacency,
    edge: EdgeId,
    slot: LoopSlot,
) -> Result<EdgeSpan> {
    let data = store.edge(edge)?;
    let (start_vertex, end_vertex) = if slot.forward {
        (data.start, data.end)
    } else {
        (data.end, data.start)
    };
    let other = adjacency
        .faces_of_edge(edge)
        .iter()
        .copied()
        .find(|&f| f != slot.face)
        .ok_or_else(|| TopologyError::InvalidTopology(format!("{edge:?} has one face")))?;
    let normal = face_normal(adjacency, slot.face)?;
    let other_normal = face_normal(adjacency, other)?;
    let start = store.vertex(start_vertex)?.point;
    let end = store.vertex(end_vertex)?.point;
    let convex = normal.cross(&other_normal).dot(&(end - start)) > 0.0;
    Ok(EdgeSpan {
        slot,
        other,
        start_vertex,
        end_vertex,
        start,
        end,
        normal,
        other_normal,
        convex,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::operations::creation::{MakeBox, MakeFace, MakeWire};
    use crate::operations::query::{Axis, IsValid, SelectEdges, SelectFaces, Selector, Volume};
    use crate::operations::shaping::Extrude;
    use crate::tessellation::TessellateFace;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    /// Area lost per unit length when a right-angled edge is rounded.
    fn spandrel_area(radius: f64) -> f64 {
        radius * radius * (1.0 - 6.0 * (PI / 24.0).sin())
    }

    fn prism(store: &mut TopologyStore, outline: Vec<Point3>, height: f64) -> SolidId {
        let wire = MakeWire::new(outline, true).execute(store).unwrap();
        let face = MakeFace::new(wire, vec![]).execute(store).unwrap();
        Extrude::new(face, Vector3::new(0.0, 0.0, height))
            .execute(store)
            .unwrap()
    }

    #[test]
    fn convex_vertical_edges_are_cut() {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(p(0.0, 0.0, 0.0), p(10.0, 10.0, 10.0))
            .execute(&mut store)
            .unwrap();
        let edges = SelectEdges::new(solid, "|Z".parse().unwrap())
            .execute(&store)
            .unwrap();
        let rounded = Fillet::new(solid, edges, 2.0).execute(&mut store).unwrap();

        assert!(IsValid::new(rounded).execute(&store));
        let volume = Volume::new(rounded).execute(&store).unwrap();
        assert_relative_eq!(volume, 1000.0 - 40.0 * spandrel_area(2.0), epsilon = 1e-6);
        assert_eq!(store.solid_faces(rounded).unwrap().len(), 6 + 4 * 12);
    }

    #[test]
    fn concave_edge_is_filled() {
        let mut store = TopologyStore::new();
        let solid = prism(
            &mut store,
            vec![
                p(0.0, 0.0, 0.0),
                p(4.0, 0.0, 0.0),
                p(4.0, 2.0, 0.0),
                p(2.0, 2.0, 0.0),
                p(2.0, 4.0, 0.0),
                p(0.0, 4.0, 0.0),
            ],
            3.0,
        );
        let inner_corner: Vec<EdgeId> = SelectEdges::new(solid, "|Z".parse().unwrap())
            .execute(&store)
            .unwrap()
            .into_iter()
            .filter(|&e| {
                let start = store.edge(e).unwrap().start;
                let point = store.vertex(start).unwrap().point;
                (point.x - 2.0).abs() < 1e-9 && (point.y - 2.0).abs() < 1e-9
            })
            .collect();
        assert_eq!(inner_corner.len(), 1);

        let filled = Fillet::new(solid, inner_corner, 1.0)
            .execute(&mut store)
            .unwrap();
        assert!(IsValid::new(filled).execute(&store));
        let volume = Volume::new(filled).execute(&store).unwrap();
        assert_relative_eq!(volume, 36.0 + 3.0 * spandrel_area(1.0), epsilon = 1e-6);
    }

    #[test]
    fn bottom_loop_is_one_closed_chain() {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(p(0.0, 0.0, 0.0), p(10.0, 10.0, 10.0))
            .execute(&mut store)
            .unwrap();
        let edges = SelectEdges::new(solid, "<Z".parse().unwrap())
            .execute(&store)
            .unwrap();
        assert_eq!(edges.len(), 4);
        let rounded = Fillet::new(solid, edges, 1.0).execute(&mut store).unwrap();

        assert!(IsValid::new(rounded).execute(&store));
        let volume = Volume::new(rounded).execute(&store).unwrap();
        assert!(volume < 1000.0 - 30.0 * spandrel_area(1.0));
        assert!(volume > 1000.0 - 40.0 * spandrel_area(1.0));

        let bottom = SelectFaces::new(rounded, Selector::Min(Axis::Z))
            .execute(&store)
            .unwrap();
        assert_eq!(bottom.len(), 1);
        let area = TessellateFace::new(bottom[0]).execute(&store).unwrap().area();
        assert_relative_eq!(area, 64.0, epsilon = 1e-6);
    }

    #[test]
    fn zero_radius_returns_input() {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let edges = SelectEdges::new(solid, "|Z".parse().unwrap())
            .execute(&store)
            .unwrap();
        assert_eq!(Fillet::new(solid, edges, 0.0).execute(&mut store).unwrap(), solid);
    }

    #[test]
    fn nearly_flat_edge_is_skipped() {
        let mut store = TopologyStore::new();
        // The outline bends by about 4 degrees at (4, 0).
        let solid = prism(
            &mut store,
            vec![
                p(0.0, 0.0, 0.0),
                p(4.0, 0.0, 0.0),
                p(8.0, 0.3, 0.0),
                p(8.0, 4.0, 0.0),
                p(0.0, 4.0, 0.0),
            ],
            2.0,
        );
        let bend: Vec<EdgeId> = SelectEdges::new(solid, "|Z".parse().unwrap())
            .execute(&store)
            .unwrap()
            .into_iter()
            .filter(|&e| {
                let start = store.edge(e).unwrap().start;
                (store.vertex(start).unwrap().point.x - 4.0).abs() < 1e-9
            })
            .collect();
        assert_eq!(bend.len(), 1);
        assert_eq!(Fillet::new(solid, bend, 0.5).execute(&mut store).unwrap(), solid);
    }

    #[test]
    fn oversized_radius_on_short_chain_fails() {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 10.0))
            .execute(&mut store)
            .unwrap();
        let edges = SelectEdges::new(solid, "<Z".parse().unwrap())
            .execute(&store)
            .unwrap();
        assert!(Fillet::new(solid, edges, 5.0).execute(&mut store).is_err());
    }
}
