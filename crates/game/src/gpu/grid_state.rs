//! Double-buffered grid state in device memory.
//!
//! Two cell buffers of `width * height` two-byte cells plus a uniform
//! dimensions record. Swapping flips which buffer is current; nothing is
//! copied.

use cellsim::{AllocationError, Cell, GridDims, SimResult};

use super::params::GridParams;
use super::{readback, DeviceArena, DeviceBuffer, GpuContext};

const CELL_USAGE: wgpu::BufferUsages = wgpu::BufferUsages::STORAGE
    .union(wgpu::BufferUsages::COPY_DST)
    .union(wgpu::BufferUsages::COPY_SRC);

pub struct GpuGridState {
    dims: GridDims,
    cells: [DeviceBuffer; 2],
    current: usize,
    params: DeviceBuffer,
}

impl GpuGridState {
    /// Allocate both cell buffers and the dimensions record.
    ///
    /// If any allocation fails the ones already made are dropped (and so
    /// released) before the error is returned. Cell contents are undefined
    /// until [`initialize`](Self::initialize).
    pub fn create(
        arena: &DeviceArena,
        queue: &wgpu::Queue,
        dims: GridDims,
    ) -> Result<Self, AllocationError> {
        let size = dims.byte_size();
        let a = arena.allocate(size, CELL_USAGE, "Grid Cells A")?;
        let b = arena.allocate(size, CELL_USAGE, "Grid Cells B")?;
        let params = arena.allocate(
            std::mem::size_of::<GridParams>() as u64,
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            "Grid Dims",
        )?;
        queue.write_buffer(&params, 0, bytemuck::bytes_of(&GridParams::new(dims)));

        log::info!(
            "Created {}x{} device grid ({} bytes per buffer)",
            dims.width(),
            dims.height(),
            size
        );
        Ok(Self {
            dims,
            cells: [a, b],
            current: 0,
            params,
        })
    }

    /// Write the initial layout into current and clear next.
    pub fn initialize(&mut self, queue: &wgpu::Queue) {
        let initial = self.dims.initial_cells();
        queue.write_buffer(self.current_buffer(), 0, bytemuck::cast_slice(&initial));
        let cleared = vec![Cell::EMPTY; self.dims.cell_count()];
        queue.write_buffer(self.next_buffer(), 0, bytemuck::cast_slice(&cleared));
    }

    /// Replace the current buffer's contents.
    pub fn upload(&self, queue: &wgpu::Queue, cells: &[Cell]) {
        assert_eq!(cells.len(), self.dims.cell_count(), "cell buffer size mismatch");
        queue.write_buffer(self.current_buffer(), 0, bytemuck::cast_slice(cells));
    }

    #[inline]
    pub fn swap(&mut self) {
        self.current ^= 1;
    }

    #[inline]
    pub fn dims(&self) -> GridDims {
        self.dims
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.dims.cell_count()
    }

    #[inline]
    pub fn byte_size(&self) -> u64 {
        self.dims.byte_size()
    }

    /// Index (0 or 1) of the buffer currently holding the live grid.
    #[inline]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[inline]
    pub fn buffer(&self, index: usize) -> &DeviceBuffer {
        &self.cells[index]
    }

    #[inline]
    pub fn current_buffer(&self) -> &DeviceBuffer {
        &self.cells[self.current]
    }

    #[inline]
    pub fn next_buffer(&self) -> &DeviceBuffer {
        &self.cells[self.current ^ 1]
    }

    #[inline]
    pub fn params_buffer(&self) -> &DeviceBuffer {
        &self.params
    }

    /// Copy the current buffer back to the host.
    ///
    /// Everything already submitted completes first.
    pub fn read_current(&self, ctx: &GpuContext, arena: &DeviceArena) -> SimResult<Vec<Cell>> {
        let bytes = readback::read_bytes(
            ctx,
            arena,
            self.current_buffer(),
            self.byte_size(),
            "Grid Readback Staging",
        )?;
        Ok(bytemuck::cast_slice::<u8, Cell>(&bytes).to_vec())
    }
}
