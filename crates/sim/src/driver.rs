//! Frame driver - sequences input, injection, stepping and rendering.
//!
//! One frame is: inject the pointer stroke, run `steps_per_frame` step + swap
//! pairs, render, hand the pixels to the display. The driver owns its backend
//! and is the only caller of it, so every stage completes (in program order)
//! before the next one reads its output.

use crate::backend::GridBackend;
use crate::brush::{BrushConfig, Pointer};
use crate::config::SimConfig;
use crate::error::{ConfigurationError, SimError, SimResult};

/// Lifecycle of the driver. `Stopped` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    Running,
    Stopped,
}

/// What the input collaborator reports for one iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Frame(Pointer),
    Quit,
}

/// Source of pointer state and the shutdown signal.
pub trait InputSource {
    fn poll(&mut self) -> InputEvent;
}

/// Display collaborator receiving the rendered frame.
pub trait FrameSink<B: GridBackend> {
    fn present(&mut self, backend: &B) -> SimResult<()>;
}

/// Summary of one completed frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: u64,
    pub steps: u32,
    pub injected: bool,
}

pub struct FrameDriver<B: GridBackend> {
    backend: B,
    brush: BrushConfig,
    steps_per_frame: u32,
    state: DriverState,
    frames: u64,
    total_steps: u64,
}

impl<B: GridBackend> FrameDriver<B> {
    pub fn new(backend: B, brush: BrushConfig, steps_per_frame: u32) -> Result<Self, ConfigurationError> {
        if steps_per_frame == 0 {
            return Err(ConfigurationError::ZeroSteps);
        }
        if brush.radius == 0 {
            return Err(ConfigurationError::ZeroBrushRadius);
        }
        Ok(Self {
            backend,
            brush,
            steps_per_frame,
            state: DriverState::Running,
            frames: 0,
            total_steps: 0,
        })
    }

    pub fn from_config(backend: B, config: &SimConfig) -> Result<Self, ConfigurationError> {
        Self::new(backend, config.brush, config.steps_per_frame)
    }

    #[inline]
    pub fn state(&self) -> DriverState {
        self.state
    }

    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[inline]
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    #[inline]
    pub fn steps_per_frame(&self) -> u32 {
        self.steps_per_frame
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Enter the terminal state. Further frames are refused.
    pub fn stop(&mut self) {
        if self.state == DriverState::Running {
            log::info!(
                "Frame driver stopped after {} frames ({} steps)",
                self.frames,
                self.total_steps
            );
        }
        self.state = DriverState::Stopped;
    }

    /// Run one frame: inject, step + swap `steps_per_frame` times, render.
    ///
    /// Any backend failure stops the driver; the error is returned as is.
    pub fn frame(&mut self, pointer: &Pointer) -> SimResult<FrameStats> {
        if self.state == DriverState::Stopped {
            return Err(SimError::Stopped);
        }
        match self.advance(pointer) {
            Ok(stats) => Ok(stats),
            Err(e) => {
                log::error!("Frame {} failed: {}", self.frames, e);
                self.stop();
                Err(e)
            }
        }
    }

    fn advance(&mut self, pointer: &Pointer) -> SimResult<FrameStats> {
        let injected = pointer.buttons.any();
        if injected {
            self.backend.inject(pointer, &self.brush)?;
        }

        for _ in 0..self.steps_per_frame {
            self.backend.step()?;
            self.backend.swap();
        }
        self.total_steps += self.steps_per_frame as u64;

        self.backend.render()?;

        let stats = FrameStats {
            frame: self.frames,
            steps: self.steps_per_frame,
            injected,
        };
        self.frames += 1;
        log::trace!("{:?}", stats);
        Ok(stats)
    }

    /// Run frames until the input source reports `Quit`.
    ///
    /// Returns the number of frames presented by this call.
    pub fn run<I, S>(&mut self, input: &mut I, sink: &mut S) -> SimResult<u64>
    where
        I: InputSource,
        S: FrameSink<B>,
    {
        let start = self.frames;
        while self.state == DriverState::Running {
            let pointer = match input.poll() {
                InputEvent::Frame(pointer) => pointer,
                InputEvent::Quit => {
                    self.stop();
                    break;
                }
            };
            self.frame(&pointer)?;
            if let Err(e) = sink.present(&self.backend) {
                self.stop();
                return Err(e);
            }
        }
        self.backend.finish()?;
        Ok(self.frames - start)
    }
}
