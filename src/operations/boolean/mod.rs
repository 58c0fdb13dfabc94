mod assemble;
mod bsp;
mod engine;
mod select;
mod subtract;
mod union;

pub(crate) use assemble::{assemble_solid, UnionFind};
pub use select::BooleanOp;
pub use subtract::Subtract;
pub use union::Union;
