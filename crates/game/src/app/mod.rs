//! Interactive front end: a winit window showing the grid, driven by the
//! pointer.

pub mod blit;
pub mod context;
pub mod input;
pub mod runner;

pub use context::SurfaceContext;
pub use input::InputState;
pub use runner::run;
