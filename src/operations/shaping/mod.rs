mod extrude;
mod loft;

pub use extrude::Extrude;
pub use loft::Loft;
pub(crate) use loft::ruled_polygons;
