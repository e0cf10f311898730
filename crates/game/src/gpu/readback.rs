//! Blocking readback of device buffers into host memory.
//!
//! A staging buffer is taken from the arena, filled with a buffer copy,
//! mapped, and released when the copy has been taken.

use std::sync::mpsc;

use cellsim::SimResult;

use super::{await_buffer_map, DeviceArena, GpuContext};

/// Copy the first `size` bytes of `src` to the host.
///
/// Work already submitted to the queue completes first, so the result
/// reflects every prior operation on `src`.
pub fn read_bytes(
    ctx: &GpuContext,
    arena: &DeviceArena,
    src: &wgpu::Buffer,
    size: u64,
    label: &str,
) -> SimResult<Vec<u8>> {
    ctx.ensure_alive()?;
    let staging = arena.allocate(
        size,
        wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        label,
    )?;

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Readback Copy Encoder"),
        });
    encoder.copy_buffer_to_buffer(src, 0, &staging, 0, size);
    ctx.queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    ctx.device.poll(wgpu::Maintain::Wait);
    await_buffer_map(ctx.lost_flag(), rx)?;

    let bytes = slice.get_mapped_range().to_vec();
    staging.unmap();
    Ok(bytes)
}
