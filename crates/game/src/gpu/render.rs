//! Cell to pixel pass.
//!
//! Output goes to a pitched storage buffer that doubles as the source of
//! the front end's `copy_buffer_to_texture`, so the pitch is a multiple of
//! `COPY_BYTES_PER_ROW_ALIGNMENT`.

use cellsim::{AllocationError, PixelFormat, PixelLayout, SimResult};

use super::params::RenderParams;
use super::{
    compute_pipeline, readback, storage_entry, uniform_entry, workgroups, DeviceArena,
    DeviceBuffer, GpuContext, GpuGridState,
};

pub struct GpuRenderer {
    pipeline: wgpu::ComputePipeline,
    layout: PixelLayout,
    _params: DeviceBuffer,
    pixels: DeviceBuffer,
    /// `bind_groups[i]` reads cells[i].
    bind_groups: [wgpu::BindGroup; 2],
}

impl GpuRenderer {
    /// Pixel layout used for a grid on the device.
    pub fn device_layout(grid: &GpuGridState, format: PixelFormat) -> PixelLayout {
        PixelLayout::aligned(grid.dims(), wgpu::COPY_BYTES_PER_ROW_ALIGNMENT, format)
    }

    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        arena: &DeviceArena,
        grid: &GpuGridState,
        format: PixelFormat,
    ) -> Result<Self, AllocationError> {
        let layout = Self::device_layout(grid, format);
        let params = arena.allocate(
            std::mem::size_of::<RenderParams>() as u64,
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            "Render Params",
        )?;
        queue.write_buffer(&params, 0, bytemuck::bytes_of(&RenderParams::new(&layout)));
        let pixels = arena.allocate(
            layout.byte_size() as u64,
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            "Pixel Buffer",
        )?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Render Bind Group Layout"),
            entries: &[
                uniform_entry(0),
                uniform_entry(1),
                storage_entry(2, true),
                storage_entry(3, false),
            ],
        });
        let pipeline = compute_pipeline(
            device,
            "Render Pipeline",
            include_str!("shaders/render.wgsl"),
            "render_main",
            &bind_group_layout,
        );

        let bind_group = |index: usize| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Render Bind Group"),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: grid.params_buffer().as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: params.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: grid.buffer(index).as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: pixels.as_entire_binding(),
                    },
                ],
            })
        };
        let bind_groups = [bind_group(0), bind_group(1)];

        Ok(Self {
            pipeline,
            layout,
            _params: params,
            pixels,
            bind_groups,
        })
    }

    #[inline]
    pub fn layout(&self) -> &PixelLayout {
        &self.layout
    }

    /// The pixel target, `height * pitch` bytes.
    #[inline]
    pub fn pixel_buffer(&self) -> &DeviceBuffer {
        &self.pixels
    }

    /// Record a full overwrite of the pixel target from the current buffer.
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, grid: &GpuGridState) {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Render Pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_groups[grid.current_index()], &[]);
        pass.dispatch_workgroups(
            workgroups(self.layout.pitch / 4),
            workgroups(self.layout.height),
            1,
        );
    }

    /// Copy the pixel target back to the host.
    pub fn read_pixels(&self, ctx: &GpuContext, arena: &DeviceArena) -> SimResult<Vec<u8>> {
        readback::read_bytes(
            ctx,
            arena,
            &self.pixels,
            self.layout.byte_size() as u64,
            "Pixel Readback Staging",
        )
    }
}
