use super::shell::ShellId;

slotmap::new_key_type! {
    pub struct SolidId;
}

/// A closed polyhedral volume: one outer boundary plus optional cavities.
#[derive(Debug, Clone)]
pub struct SolidData {
    pub outer_shell: ShellId,
    /// Cavity boundaries, oriented inward.
    pub inner_shells: Vec<ShellId>,
}

impl SolidData {
    /// Every shell of the solid, outer boundary first.
    pub fn shells(&self) -> impl Iterator<Item = ShellId> + '_ {
        std::iter::once(self.outer_shell).chain(self.inner_shells.iter().copied())
    }
}
