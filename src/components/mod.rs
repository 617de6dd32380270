pub mod help;
pub mod pad;
pub mod status_bar;
pub mod window;
