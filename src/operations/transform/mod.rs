mod copy_face;
mod general;
mod rotate;
mod translate;

pub use copy_face::CopyFace;
pub use general::GeneralTransform;
pub use rotate::Rotate;
pub use translate::Translate;
