mod fillet;

pub use fillet::Fillet;
