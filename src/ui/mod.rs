pub mod app;
pub mod style;
