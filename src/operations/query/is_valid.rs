use std::collections::HashMap;

use crate::math::Point3;
use crate::topology::{EdgeId, SolidId, TopologyStore};

/// Distance a face vertex may sit off its face plane.
const PLANE_TOLERANCE: f64 = 1e-5;

/// Validates the topological and geometric consistency of a solid.
///
/// A valid solid has closed, connected wires, planar faces, edges whose
/// vertices sit on their lines, and every edge used by exactly two faces,
/// once in each direction.
pub struct IsValid {
    solid: SolidId,
}

impl IsValid {
    /// Creates a new `IsValid` query.
    #[must_use]
    pub fn new(solid: SolidId) -> Self {
        Self { solid }
    }

    /// Executes the validation, returning `true` if the solid is valid.
    #[must_use]
    pub fn execute(&self, store: &TopologyStore) -> bool {
        self.check(store).is_some()
    }

    fn check(&self, store: &TopologyStore) -> Option<()> {
        let shells: Vec<_> = store.solid(self.solid).ok()?.shells().collect();

        // edge -> (forward uses, reverse uses)
        let mut uses: HashMap<EdgeId, (u32, u32)> = HashMap::new();
        for shell in shells {
            let shell = store.shell(shell).ok()?;
            if !shell.is_closed || shell.faces.is_empty() {
                return None;
            }
            for &face in &shell.faces {
                let data = store.face(face).ok()?;
                for wire in data.wires() {
                    let wire_data = store.wire(wire).ok()?;
                    if !wire_data.is_closed || wire_data.edges.len() < 3 {
                        return None;
                    }
                    let n = wire_data.edges.len();
                    for (i, oe) in wire_data.edges.iter().enumerate() {
                        let edge = store.edge(oe.edge).ok()?;
                        let end = if oe.forward { edge.end } else { edge.start };
                        let next = store.oriented_start(wire_data.edges[(i + 1) % n]).ok()?;
                        if end != next || !edge_on_curve(store, oe.edge)? {
                            return None;
                        }
                        let entry = uses.entry(oe.edge).or_insert((0, 0));
                        if oe.forward {
                            entry.0 += 1;
                        } else {
                            entry.1 += 1;
                        }
                    }
                    let points: Vec<Point3> = store.wire_points(wire).ok()?;
                    if points
                        .iter()
                        .any(|p| data.surface.signed_distance(p).abs() > PLANE_TOLERANCE)
                    {
                        return None;
                    }
                }
            }
        }
        uses.values().all(|&u| u == (1, 1)).then_some(())
    }
}

/// Whether the edge's vertices sit on its line at the stored parameters.
fn edge_on_curve(store: &TopologyStore, edge: EdgeId) -> Option<bool> {
    let data = store.edge(edge).ok()?;
    let start = store.vertex(data.start).ok()?.point;
    let end = store.vertex(data.end).ok()?.point;
    let line = &data.curve;
    Some(
        line.distance_to(&start) < PLANE_TOLERANCE
            && line.distance_to(&end) < PLANE_TOLERANCE
            && (line.parameter_of(&start) - data.t_start).abs() < PLANE_TOLERANCE
            && (line.parameter_of(&end) - data.t_end).abs() < PLANE_TOLERANCE,
    )
}
