mod adjacency;
mod bounding_box;
mod centroid;
mod is_valid;
mod select;
mod volume;

pub use adjacency::{Adjacency, SolidAdjacency};
pub use bounding_box::{Aabb, BoundingBox};
pub use centroid::FaceCentroid;
pub use is_valid::IsValid;
pub use select::{Axis, SelectEdges, SelectFaces, Selector, SELECTOR_TOLERANCE};
pub use volume::Volume;
