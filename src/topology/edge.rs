use crate::geometry::curve::Line;

use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for an edge in the topology store.
    pub struct EdgeId;
}

/// Data associated with a topological edge.
///
/// An edge connects two vertices along a straight line. Curved boundaries
/// are represented as chains of short edges.
#[derive(Debug, Clone)]
pub struct EdgeData {
    /// Start vertex of the edge.
    pub start: VertexId,
    /// End vertex of the edge.
    pub end: VertexId,
    /// The line carrying this edge, directed from start to end.
    pub curve: Line,
    /// Parameter on the line corresponding to the start vertex.
    pub t_start: f64,
    /// Parameter on the line corresponding to the end vertex.
    pub t_end: f64,
}

impl EdgeData {
    /// Length of the edge.
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.t_end - self.t_start).abs()
    }
}
