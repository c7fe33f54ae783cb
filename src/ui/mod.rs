pub mod dialog;
pub mod render;
