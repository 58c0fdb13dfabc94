mod wire_offset_2d;

pub use wire_offset_2d::WireOffset2D;
