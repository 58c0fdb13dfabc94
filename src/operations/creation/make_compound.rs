use crate::error::Result;
use crate::topology::{CompoundData, CompoundId, SolidId, TopologyStore};

/// Groups solids into a compound without merging them.
pub struct MakeCompound {
    solids: Vec<SolidId>,
}

impl MakeCompound {
    /// Creates a new `MakeCompound` operation.
    #[must_use]
    pub fn new(solids: Vec<SolidId>) -> Self {
        Self { solids }
    }

    /// Executes the operation, creating the compound in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if any member solid is missing.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<CompoundId> {
        for &solid in &self.solids {
            store.solid(solid)?;
        }
        Ok(store.add_compound(CompoundData {
            solids: self.solids.clone(),
        }))
    }
}
