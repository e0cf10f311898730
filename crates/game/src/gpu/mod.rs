pub mod arena;
pub mod backend;
pub mod grid_state;
pub mod inject;
pub mod params;
pub mod readback;
pub mod render;
pub mod step;

pub use arena::{DeviceArena, DeviceBuffer};
pub use backend::GpuBackend;
pub use grid_state::GpuGridState;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cellsim::SimError;
use thiserror::Error;

/// Workgroup edge used by every 2D compute pass.
pub const WORKGROUP_SIZE: u32 = 8;

/// GPU error type for device setup and buffer operations
#[derive(Error, Debug)]
pub enum GpuError {
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    #[error("device request failed: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("surface error: {0}")]
    Surface(String),

    #[error("GPU device lost")]
    DeviceLost,

    #[error("buffer map failed: {0:?}")]
    BufferMapFailed(wgpu::BufferAsyncError),

    #[error("buffer map channel disconnected")]
    ChannelDisconnected,
}

impl From<GpuError> for SimError {
    fn from(e: GpuError) -> Self {
        SimError::Device(e.to_string())
    }
}

/// Shared flag raised when the device reports a fatal error.
#[derive(Clone, Debug, Default)]
pub struct DeviceLostFlag(Arc<AtomicBool>);

impl DeviceLostFlag {
    pub fn is_lost(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn mark_lost(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Wait for a buffer map operation to complete, returning Result instead of panicking.
pub fn await_buffer_map(
    lost: &DeviceLostFlag,
    rx: std::sync::mpsc::Receiver<Result<(), wgpu::BufferAsyncError>>,
) -> Result<(), GpuError> {
    if lost.is_lost() {
        return Err(GpuError::DeviceLost);
    }
    match rx.recv() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            log::error!("Buffer map failed: {:?}", e);
            Err(GpuError::BufferMapFailed(e))
        }
        Err(_) => {
            log::error!("Buffer map channel disconnected - possible device lost");
            lost.mark_lost();
            Err(GpuError::ChannelDisconnected)
        }
    }
}

/// Any error the device reports outside an error scope ends the session.
fn report_uncaptured(lost: &DeviceLostFlag, error: &wgpu::Error) {
    match error {
        wgpu::Error::OutOfMemory { .. } => log::error!("GPU out of memory: {}", error),
        _ => log::error!("GPU uncaptured error: {}", error),
    }
    lost.mark_lost();
}

/// Device and queue shared by the grid components.
///
/// Cloning is cheap; every clone refers to the same device.
#[derive(Clone)]
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_info: wgpu::AdapterInfo,
    lost: DeviceLostFlag,
}

impl GpuContext {
    /// Request an adapter (compatible with `surface` when given) and a device.
    pub async fn request(
        instance: &wgpu::Instance,
        surface: Option<&wgpu::Surface<'_>>,
    ) -> Result<(Self, wgpu::Adapter), GpuError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: surface,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let adapter_info = adapter.get_info();
        log::info!("Using GPU: {} ({:?})", adapter_info.name, adapter_info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Grid Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: Self::required_limits().using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        let lost = DeviceLostFlag::default();
        let flag = lost.clone();
        device.on_uncaptured_error(Box::new(move |error| report_uncaptured(&flag, &error)));
        let flag = lost.clone();
        device.set_device_lost_callback(move |reason, message| {
            log::warn!("GPU device lost ({:?}): {}", reason, message);
            flag.mark_lost();
        });

        Ok((
            Self {
                device: Arc::new(device),
                queue: Arc::new(queue),
                adapter_info,
                lost,
            },
            adapter,
        ))
    }

    /// Blocking device request without a surface, for tests and offline runs.
    pub fn new_headless() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        pollster::block_on(Self::request(&instance, None)).map(|(ctx, _)| ctx)
    }

    pub fn required_limits() -> wgpu::Limits {
        wgpu::Limits {
            max_storage_buffers_per_shader_stage: 4,
            ..wgpu::Limits::downlevel_defaults()
        }
    }

    #[inline]
    pub fn lost_flag(&self) -> &DeviceLostFlag {
        &self.lost
    }

    pub fn is_device_lost(&self) -> bool {
        self.lost.is_lost()
    }

    /// Block until all submitted work has completed.
    pub fn wait_idle(&self) {
        self.device.poll(wgpu::Maintain::Wait);
    }

    pub(crate) fn ensure_alive(&self) -> Result<(), GpuError> {
        if self.lost.is_lost() {
            return Err(GpuError::DeviceLost);
        }
        Ok(())
    }
}

/// Dispatch count covering `n` invocations with `WORKGROUP_SIZE` per group.
#[inline]
pub fn workgroups(n: u32) -> u32 {
    n.div_ceil(WORKGROUP_SIZE)
}

pub(crate) fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub(crate) fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub(crate) fn compute_pipeline(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    entry_point: &str,
    layout: &wgpu::BindGroupLayout,
) -> wgpu::ComputePipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });
    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        module: &shader,
        entry_point: Some(entry_point),
        compilation_options: Default::default(),
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workgroup_counts_round_up() {
        assert_eq!(workgroups(0), 0);
        assert_eq!(workgroups(1), 1);
        assert_eq!(workgroups(8), 1);
        assert_eq!(workgroups(9), 2);
        assert_eq!(workgroups(128), 16);
    }

    #[test]
    fn required_limits_allow_three_storage_bindings() {
        assert!(GpuContext::required_limits().max_storage_buffers_per_shader_stage >= 3);
    }

    #[test]
    fn lost_flag_is_shared_between_clones() {
        let flag = DeviceLostFlag::default();
        let other = flag.clone();
        assert!(!flag.is_lost());
        other.mark_lost();
        assert!(flag.is_lost());
    }

    #[test]
    fn map_on_lost_device_fails_fast() {
        let flag = DeviceLostFlag::default();
        flag.mark_lost();
        let (_tx, rx) = std::sync::mpsc::channel();
        assert!(matches!(await_buffer_map(&flag, rx), Err(GpuError::DeviceLost)));
    }

    #[test]
    fn validation_error_marks_device_lost() {
        let flag = DeviceLostFlag::default();
        let error = wgpu::Error::Validation {
            source: Box::new(std::fmt::Error),
            description: "invalid dispatch".into(),
        };
        report_uncaptured(&flag, &error);
        assert!(flag.is_lost());
    }

    #[test]
    fn dropped_sender_marks_device_lost() {
        let flag = DeviceLostFlag::default();
        let (tx, rx) = std::sync::mpsc::channel();
        drop(tx);
        assert!(matches!(
            await_buffer_map(&flag, rx),
            Err(GpuError::ChannelDisconnected)
        ));
        assert!(flag.is_lost());
    }
}
