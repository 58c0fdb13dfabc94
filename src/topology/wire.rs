use super::edge::EdgeId;

slotmap::new_key_type! {
    pub struct WireId;
}

/// An edge together with the direction a loop walks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientedEdge {
    pub edge: EdgeId,
    /// `true` walks start to end.
    pub forward: bool,
}

impl OrientedEdge {
    #[must_use]
    pub fn new(edge: EdgeId, forward: bool) -> Self {
        Self { edge, forward }
    }

    /// The same edge walked the other way.
    #[must_use]
    pub fn reversed(self) -> Self {
        Self::new(self.edge, !self.forward)
    }
}

/// A chain of line edges. Face boundaries are always closed loops.
#[derive(Debug, Clone)]
pub struct WireData {
    pub edges: Vec<OrientedEdge>,
    pub is_closed: bool,
}

impl WireData {
    /// The loop walked backwards over the same edges.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            edges: self.edges.iter().rev().map(|oe| oe.reversed()).collect(),
            is_closed: self.is_closed,
        }
    }
}
