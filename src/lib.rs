pub mod error;
pub mod geometry;
pub mod io;
pub mod math;
pub mod model;
pub mod operations;
pub mod tessellation;
pub mod topology;

pub use error::{BoxlidError, Result};
pub use model::{
    build_container_with_lid, container_with_lid, container_with_lid_in, LidParams, OUTPUT_FILE,
};
