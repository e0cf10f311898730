//! Grid backend running every stage as a compute pass.
//!
//! Steps are recorded into a pending command encoder and submitted together
//! when the frame renders, so a frame costs one or two queue submissions
//! however many steps it runs. Queue order keeps every pass after the ones
//! recorded before it.

use cellsim::{BrushConfig, Cell, GridBackend, GridDims, PixelFormat, PixelLayout, Pointer, SimResult};

use super::inject::GpuInjector;
use super::render::GpuRenderer;
use super::step::GpuStepper;
use super::{DeviceArena, DeviceBuffer, GpuContext, GpuGridState};

pub struct GpuBackend {
    stepper: GpuStepper,
    injector: GpuInjector,
    renderer: GpuRenderer,
    grid: GpuGridState,
    pending: Option<wgpu::CommandEncoder>,
    arena: DeviceArena,
    ctx: GpuContext,
}

fn pending_encoder<'a>(
    pending: &'a mut Option<wgpu::CommandEncoder>,
    device: &wgpu::Device,
) -> &'a mut wgpu::CommandEncoder {
    pending.get_or_insert_with(|| {
        device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        })
    })
}

impl GpuBackend {
    pub fn new(ctx: GpuContext, dims: GridDims, format: PixelFormat) -> SimResult<Self> {
        let arena = DeviceArena::new(ctx.device.clone());
        Self::with_arena(ctx, arena, dims, format)
    }

    /// Build the backend with all device memory taken from `arena`.
    ///
    /// The grid is initialized before this returns.
    pub fn with_arena(
        ctx: GpuContext,
        arena: DeviceArena,
        dims: GridDims,
        format: PixelFormat,
    ) -> SimResult<Self> {
        let mut grid = GpuGridState::create(&arena, &ctx.queue, dims)?;
        grid.initialize(&ctx.queue);
        let stepper = GpuStepper::new(&ctx.device, &grid);
        let injector = GpuInjector::new(&ctx.device, &arena, &grid)?;
        let renderer = GpuRenderer::new(&ctx.device, &ctx.queue, &arena, &grid, format)?;

        log::debug!(
            "GPU backend ready: {} buffers, {} bytes live",
            arena.live_allocations(),
            arena.live_bytes()
        );
        Ok(Self {
            stepper,
            injector,
            renderer,
            grid,
            pending: None,
            arena,
            ctx,
        })
    }

    #[inline]
    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    #[inline]
    pub fn arena(&self) -> &DeviceArena {
        &self.arena
    }

    #[inline]
    pub fn grid(&self) -> &GpuGridState {
        &self.grid
    }

    /// The rendered frame, laid out as [`GridBackend::pixel_layout`].
    #[inline]
    pub fn pixel_buffer(&self) -> &DeviceBuffer {
        self.renderer.pixel_buffer()
    }

    fn flush(&mut self) {
        if let Some(encoder) = self.pending.take() {
            self.ctx.queue.submit(std::iter::once(encoder.finish()));
        }
    }

    /// Submit everything recorded or staged so far and wait for it.
    fn drain(&mut self) {
        self.flush();
        // Queued buffer writes only reach the device with a submission
        self.ctx.queue.submit(std::iter::empty());
        self.ctx.wait_idle();
    }

    /// Re-run grid initialization on the current buffer.
    pub fn reset(&mut self) {
        self.flush();
        self.grid.initialize(&self.ctx.queue);
    }

    /// Overwrite the current buffer with host cells.
    pub fn upload(&mut self, cells: &[Cell]) {
        self.flush();
        self.grid.upload(&self.ctx.queue, cells);
    }

    /// Current buffer contents after all recorded work.
    pub fn read_cells(&mut self) -> SimResult<Vec<Cell>> {
        self.flush();
        self.grid.read_current(&self.ctx, &self.arena)
    }

    /// Pixel target contents after all recorded work.
    pub fn read_pixels(&mut self) -> SimResult<Vec<u8>> {
        self.flush();
        self.renderer.read_pixels(&self.ctx, &self.arena)
    }
}

impl GridBackend for GpuBackend {
    fn dims(&self) -> GridDims {
        self.grid.dims()
    }

    fn pixel_layout(&self) -> PixelLayout {
        *self.renderer.layout()
    }

    fn inject(&mut self, pointer: &Pointer, brush: &BrushConfig) -> SimResult<()> {
        self.ctx.ensure_alive()?;
        let encoder = pending_encoder(&mut self.pending, &self.ctx.device);
        if self
            .injector
            .encode(&self.ctx.queue, encoder, &self.grid, pointer, brush)
        {
            // The stroke parameters live in one uniform; submit before it is rewritten
            self.flush();
        }
        Ok(())
    }

    fn step(&mut self) -> SimResult<()> {
        self.ctx.ensure_alive()?;
        let encoder = pending_encoder(&mut self.pending, &self.ctx.device);
        self.stepper.encode(encoder, &self.grid);
        Ok(())
    }

    fn swap(&mut self) {
        self.grid.swap();
    }

    fn render(&mut self) -> SimResult<()> {
        self.ctx.ensure_alive()?;
        let encoder = pending_encoder(&mut self.pending, &self.ctx.device);
        self.renderer.encode(encoder, &self.grid);
        self.flush();
        // Fails the frame whose submission raised a device error
        self.ctx.ensure_alive()?;
        Ok(())
    }

    fn finish(&mut self) -> SimResult<()> {
        self.drain();
        self.ctx.ensure_alive()?;
        Ok(())
    }
}

impl Drop for GpuBackend {
    fn drop(&mut self) {
        // Buffers are destroyed as the fields drop; nothing may still be in flight
        self.drain();
    }
}
