pub mod color;
pub mod geodesy;
