mod stl;

pub use stl::{ExportStl, InspectStl, StlReport};
