use super::face::FaceId;

slotmap::new_key_type! {
    pub struct ShellId;
}

/// A face set bounding (part of) a solid.
#[derive(Debug, Clone)]
pub struct ShellData {
    pub faces: Vec<FaceId>,
    /// Set when every edge is shared by exactly two faces of the shell.
    pub is_closed: bool,
}
