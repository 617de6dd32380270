pub mod screen;
pub mod surface;
pub mod theme;
