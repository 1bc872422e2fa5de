pub mod app;
pub mod config;
pub mod math;
pub mod paths;
