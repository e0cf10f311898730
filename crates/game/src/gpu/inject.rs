//! Brush stroke pass, applied in place to the current buffer.

use cellsim::{AllocationError, BrushConfig, Pointer};

use super::params::InjectParams;
use super::{
    compute_pipeline, storage_entry, uniform_entry, workgroups, DeviceArena, DeviceBuffer,
    GpuGridState,
};

pub struct GpuInjector {
    pipeline: wgpu::ComputePipeline,
    params: DeviceBuffer,
    /// `bind_groups[i]` edits cells[i].
    bind_groups: [wgpu::BindGroup; 2],
}

impl GpuInjector {
    pub fn new(
        device: &wgpu::Device,
        arena: &DeviceArena,
        grid: &GpuGridState,
    ) -> Result<Self, AllocationError> {
        let params = arena.allocate(
            std::mem::size_of::<InjectParams>() as u64,
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            "Inject Params",
        )?;

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Inject Bind Group Layout"),
            entries: &[uniform_entry(0), uniform_entry(1), storage_entry(2, false)],
        });
        let pipeline = compute_pipeline(
            device,
            "Inject Pipeline",
            include_str!("shaders/inject.wgsl"),
            "inject_main",
            &layout,
        );

        let bind_group = |index: usize| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Inject Bind Group"),
                layout: &layout,
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
                ],
            })
        };
        let bind_groups = [bind_group(0), bind_group(1)];

        Ok(Self {
            pipeline,
            params,
            bind_groups,
        })
    }

    /// Stage the stroke parameters and record the pass.
    ///
    /// The parameters are written through the queue, so the encoder must be
    /// submitted before this is called again. Returns false (recording
    /// nothing) when the stroke misses the grid or no button is held.
    pub fn encode(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        grid: &GpuGridState,
        pointer: &Pointer,
        brush: &BrushConfig,
    ) -> bool {
        let Some(stroke) = InjectParams::clip(pointer, brush, grid.dims()) else {
            return false;
        };
        queue.write_buffer(&self.params, 0, bytemuck::bytes_of(&stroke));

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Inject Pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_groups[grid.current_index()], &[]);
        pass.dispatch_workgroups(workgroups(stroke.words()), workgroups(stroke.rows()), 1);
        true
    }
}
