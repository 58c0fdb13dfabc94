pub mod boolean;
pub mod creation;
pub mod modification;
pub mod offset;
pub mod query;
pub mod shaping;
pub mod transform;
