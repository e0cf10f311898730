//! Diffusion step pass.
//!
//! Both bind groups are built up front, one per buffer role assignment, so a
//! swap is just a different index at encode time.

use super::{compute_pipeline, storage_entry, uniform_entry, workgroups, GpuGridState};

pub struct GpuStepper {
    pipeline: wgpu::ComputePipeline,
    /// `bind_groups[i]` reads cells[i] and writes cells[i ^ 1].
    bind_groups: [wgpu::BindGroup; 2],
    dispatch: (u32, u32),
}

impl GpuStepper {
    pub fn new(device: &wgpu::Device, grid: &GpuGridState) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Step Bind Group Layout"),
            entries: &[
                uniform_entry(0),
                storage_entry(1, true),
                storage_entry(2, false),
            ],
        });
        let pipeline = compute_pipeline(
            device,
            "Step Pipeline",
            include_str!("shaders/step.wgsl"),
            "step_main",
            &layout,
        );

        let bind_group = |src: usize| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(if src == 0 { "Step A->B" } else { "Step B->A" }),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: grid.params_buffer().as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: grid.buffer(src).as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: grid.buffer(src ^ 1).as_entire_binding(),
                    },
                ],
            })
        };

        let dims = grid.dims();
        Self {
            pipeline,
            bind_groups: [bind_group(0), bind_group(1)],
            dispatch: (workgroups(dims.width() / 2), workgroups(dims.height())),
        }
    }

    /// Record one step from the grid's current buffer into its next buffer.
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, grid: &GpuGridState) {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Step Pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_groups[grid.current_index()], &[]);
        pass.dispatch_workgroups(self.dispatch.0, self.dispatch.1, 1);
    }
}
