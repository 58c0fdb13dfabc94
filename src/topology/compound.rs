use super::solid::SolidId;

slotmap::new_key_type! {
    /// Unique identifier for a compound in the topology store.
    pub struct CompoundId;
}

/// A loose collection of solids that share no topology.
#[derive(Debug, Clone, Default)]
pub struct CompoundData {
    /// Member solids, in insertion order.
    pub solids: Vec<SolidId>,
}
