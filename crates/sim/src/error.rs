//! Error taxonomy for grid setup, device allocation and the frame loop.
//!
//! Configuration problems are reported before anything is allocated.
//! Allocation and device failures end the session; there are no retries.
//! Out-of-range addressing is a [`BoundsError`], which interactive callers
//! drop per cell instead of propagating.

use thiserror::Error;

/// Invalid grid or frame configuration. Raised before any allocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("grid dimensions must be positive (got {width}x{height})")]
    NonPositive { width: u32, height: u32 },

    #[error("grid dimensions must be even (got {width}x{height})")]
    Odd { width: u32, height: u32 },

    #[error("grid {width}x{height} is too large to address")]
    TooLarge { width: u32, height: u32 },

    #[error("window for a {width}x{height} grid at scale {scale} is too large")]
    WindowTooLarge { width: u32, height: u32, scale: u32 },

    #[error("pixel pitch {pitch} is smaller than a {width}-pixel row ({min} bytes)")]
    PitchTooSmall { width: u32, pitch: u32, min: u32 },

    #[error("pixel pitch {pitch} must be a multiple of 4")]
    PitchUnaligned { pitch: u32 },

    #[error("pixel layout {layout_width}x{layout_height} does not match the {width}x{height} grid")]
    LayoutMismatch {
        layout_width: u32,
        layout_height: u32,
        width: u32,
        height: u32,
    },

    #[error("steps per frame must be at least 1")]
    ZeroSteps,

    #[error("brush radius must be at least 1")]
    ZeroBrushRadius,
}

/// Why a device allocation could not be satisfied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationFailure {
    #[error("zero-sized allocation")]
    ZeroSize,

    #[error("exceeds device limit of {limit} bytes")]
    ExceedsDeviceLimit { limit: u64 },

    #[error("exceeds arena budget ({in_use} of {budget} bytes in use)")]
    ExceedsBudget { in_use: u64, budget: u64 },

    #[error("device error: {0}")]
    Device(String),
}

/// A device buffer could not be allocated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to allocate {requested} bytes for '{label}': {reason}")]
pub struct AllocationError {
    pub label: String,
    pub requested: u64,
    pub reason: AllocationFailure,
}

/// A 2D coordinate fell outside the grid.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
pub struct BoundsError {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Top-level error for a simulation session.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error("device error: {0}")]
    Device(String),

    #[error("config file error: {0}")]
    Config(String),

    #[error("frame driver is stopped")]
    Stopped,
}

pub type SimResult<T> = Result<T, SimError>;

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        SimError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        SimError::Config(e.to_string())
    }
}
