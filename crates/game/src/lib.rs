//! Game library crate - wgpu grid backend and the interactive window

pub mod app;
pub mod gpu;
