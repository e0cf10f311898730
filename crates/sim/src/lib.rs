//! Cellular grid simulation - core library
//!
//! A fixed-size 2D grid of two-byte cells (material tag + intensity),
//! double-buffered and stepped several times per displayed frame:
//! - bounds-checked grid indexing and the initial wall/seed layout
//! - pointer brush that adds substance, adds walls or erases
//! - deterministic radius-1 diffusion step
//! - cell to pixel renderer with arbitrary row pitch
//! - frame driver sequencing inject -> step/swap -> render
//!
//! This crate is device-agnostic. `HostBackend` runs the whole pipeline in
//! host memory and is the reference for the GPU backend in the `game` crate.

pub mod backend;
pub mod brush;
pub mod cell;
pub mod config;
pub mod driver;
pub mod error;
pub mod grid;
pub mod material;
pub mod render;
pub mod update;

pub use backend::{GridBackend, HostBackend};
pub use brush::{BrushAction, BrushConfig, BrushPolicy, ButtonMask, Pointer, DEFAULT_BRUSH_RADIUS};
pub use cell::Cell;
pub use config::{SimConfig, DEFAULT_STEPS_PER_FRAME};
pub use driver::{DriverState, FrameDriver, FrameSink, FrameStats, InputEvent, InputSource};
pub use error::{
    AllocationError, AllocationFailure, BoundsError, ConfigurationError, SimError, SimResult,
};
pub use grid::{GridDims, HostGrid, BOUNDARY_MARGIN, SEED_EXTENT};
pub use material::Material;
pub use render::{PixelBuffer, PixelFormat, PixelLayout};
