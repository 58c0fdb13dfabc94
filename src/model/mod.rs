//! The two-part container: a hollow box with a sloped step joint and a
//! matching lid, built from kernel operations.

mod assembly;
mod container;
mod loft;

pub use assembly::{
    build_container_with_lid, container_with_lid, container_with_lid_in, LidParams, OUTPUT_FILE,
};
pub use container::{BuildContainer, ContainerParams, LedgeKind};
pub use loft::loft_faces;
