use crate::error::{OperationError, Result};
use crate::geometry::curve::Line;
use crate::math::{Point3, LINEAR_TOLERANCE};
use crate::topology::{
    EdgeData, EdgeId, OrientedEdge, TopologyStore, VertexData, VertexId, WireData, WireId,
};

/// Creates a wire of line edges from a sequence of 3D points.
pub struct MakeWire {
    points: Vec<Point3>,
    close: bool,
}

impl MakeWire {
    /// Creates a new `MakeWire` operation.
    ///
    /// When `close` is set, an edge from the last point back to the first
    /// is added.
    #[must_use]
    pub fn new(points: Vec<Point3>, close: bool) -> Self {
        Self { points, close }
    }

    /// Executes the operation, creating the wire in the topology store.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] for fewer than two points
    /// (three for a closed wire) or for coincident consecutive points.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<WireId> {
        let n = self.points.len();
        let min_points = if self.close { 3 } else { 2 };
        if n < min_points {
            return Err(OperationError::InvalidInput(format!(
                "wire needs at least {min_points} points, got {n}"
            ))
            .into());
        }

        let segment_count = if self.close { n } else { n - 1 };
        for i in 0..segment_count {
            let (a, b) = (self.points[i], self.points[(i + 1) % n]);
            if (b - a).norm() < LINEAR_TOLERANCE {
                return Err(OperationError::InvalidInput(format!(
                    "wire points {i} and {} coincide",
                    (i + 1) % n
                ))
                .into());
            }
        }

        let vertices: Vec<VertexId> = self
            .points
            .iter()
            .map(|&p| store.add_vertex(VertexData::new(p)))
            .collect();

        let mut edges = Vec::with_capacity(segment_count);
        for i in 0..segment_count {
            let edge = add_line_edge(store, vertices[i], vertices[(i + 1) % n])?;
            edges.push(OrientedEdge::new(edge, true));
        }

        Ok(store.add_wire(WireData {
            edges,
            is_closed: self.close,
        }))
    }
}

/// Creates a line edge between two existing vertices.
pub(crate) fn add_line_edge(
    store: &mut TopologyStore,
    start: VertexId,
    end: VertexId,
) -> Result<EdgeId> {
    let start_point = store.vertex(start)?.point;
    let end_point = store.vertex(end)?.point;
    let line = Line::through(start_point, end_point)?;
    Ok(store.add_edge(EdgeData {
        start,
        end,
        curve: line,
        t_start: 0.0,
        t_end: (end_point - start_point).norm(),
    }))
}

/// Adds a copy of `wire` traversed in the opposite direction.
///
/// The copy shares edges and vertices with the original.
pub(crate) fn reverse_wire(store: &mut TopologyStore, wire: WireId) -> Result<WireId> {
    let reversed = store.wire(wire)?.reversed();
    Ok(store.add_wire(reversed))
}
