//! Device memory arena.
//!
//! The arena is a factory for [`DeviceBuffer`]s: owning handles that destroy
//! their `wgpu::Buffer` and return the bytes to the arena accounting on drop.
//! Accounting is shared between the arena and its handles, so a handle may
//! outlive the arena that made it. Each buffer is released exactly once, when
//! its handle drops.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use cellsim::{AllocationError, AllocationFailure};

#[derive(Debug, Default)]
struct ArenaStats {
    live_allocations: AtomicUsize,
    live_bytes: AtomicU64,
}

impl ArenaStats {
    /// Reserve `size` bytes, failing if that would cross `budget`.
    fn reserve(&self, size: u64, budget: Option<u64>) -> Result<(), AllocationFailure> {
        self.live_bytes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |in_use| match budget {
                Some(budget) if in_use.saturating_add(size) > budget => None,
                _ => Some(in_use + size),
            })
            .map_err(|in_use| AllocationFailure::ExceedsBudget {
                in_use,
                budget: budget.unwrap_or(u64::MAX),
            })?;
        self.live_allocations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&self, size: u64) {
        self.live_bytes.fetch_sub(size, Ordering::SeqCst);
        self.live_allocations.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct DeviceArena {
    device: Arc<wgpu::Device>,
    budget: Option<u64>,
    stats: Arc<ArenaStats>,
}

impl DeviceArena {
    /// Arena limited only by the device.
    pub fn new(device: Arc<wgpu::Device>) -> Self {
        Self {
            device,
            budget: None,
            stats: Arc::default(),
        }
    }

    /// Arena that refuses allocations once `budget` bytes are live.
    pub fn with_budget(device: Arc<wgpu::Device>, budget: u64) -> Self {
        Self {
            budget: Some(budget),
            ..Self::new(device)
        }
    }

    #[inline]
    pub fn budget(&self) -> Option<u64> {
        self.budget
    }

    pub fn live_allocations(&self) -> usize {
        self.stats.live_allocations.load(Ordering::SeqCst)
    }

    pub fn live_bytes(&self) -> u64 {
        self.stats.live_bytes.load(Ordering::SeqCst)
    }

    /// Allocate `byte_size` bytes of device memory.
    ///
    /// Device-side failures are caught with error scopes so they come back
    /// as an [`AllocationError`] instead of reaching the uncaptured handler.
    pub fn allocate(
        &self,
        byte_size: u64,
        usage: wgpu::BufferUsages,
        label: &str,
    ) -> Result<DeviceBuffer, AllocationError> {
        let fail = |reason| {
            log::error!("Allocation of {} bytes for '{}' failed: {}", byte_size, label, reason);
            AllocationError {
                label: label.to_string(),
                requested: byte_size,
                reason,
            }
        };

        if byte_size == 0 {
            return Err(fail(AllocationFailure::ZeroSize));
        }
        let limits = self.device.limits();
        if byte_size > limits.max_buffer_size {
            return Err(fail(AllocationFailure::ExceedsDeviceLimit {
                limit: limits.max_buffer_size,
            }));
        }
        if usage.contains(wgpu::BufferUsages::STORAGE)
            && byte_size > limits.max_storage_buffer_binding_size as u64
        {
            return Err(fail(AllocationFailure::ExceedsDeviceLimit {
                limit: limits.max_storage_buffer_binding_size as u64,
            }));
        }

        self.stats.reserve(byte_size, self.budget).map_err(fail)?;

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: byte_size,
            usage,
            mapped_at_creation: false,
        });
        let validation = pollster::block_on(self.device.pop_error_scope());
        let oom = pollster::block_on(self.device.pop_error_scope());

        if let Some(error) = validation.or(oom) {
            buffer.destroy();
            self.stats.release(byte_size);
            return Err(fail(AllocationFailure::Device(error.to_string())));
        }

        log::debug!("Allocated {} bytes for '{}'", byte_size, label);
        Ok(DeviceBuffer {
            buffer,
            size: byte_size,
            stats: self.stats.clone(),
        })
    }
}

/// Owning handle to an arena allocation.
#[derive(Debug)]
pub struct DeviceBuffer {
    buffer: wgpu::Buffer,
    size: u64,
    stats: Arc<ArenaStats>,
}

impl DeviceBuffer {
    #[inline]
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn as_entire_binding(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }
}

impl std::ops::Deref for DeviceBuffer {
    type Target = wgpu::Buffer;

    fn deref(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

impl Drop for DeviceBuffer {
    fn drop(&mut self) {
        self.buffer.destroy();
        self.stats.release(self.size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_tracks_bytes_and_count() {
        let stats = ArenaStats::default();
        stats.reserve(100, None).unwrap();
        stats.reserve(28, None).unwrap();
        assert_eq!(stats.live_bytes.load(Ordering::SeqCst), 128);
        assert_eq!(stats.live_allocations.load(Ordering::SeqCst), 2);
        stats.release(100);
        assert_eq!(stats.live_bytes.load(Ordering::SeqCst), 28);
        assert_eq!(stats.live_allocations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reserve_respects_budget() {
        let stats = ArenaStats::default();
        stats.reserve(60, Some(100)).unwrap();
        let err = stats.reserve(41, Some(100)).unwrap_err();
        assert_eq!(
            err,
            AllocationFailure::ExceedsBudget {
                in_use: 60,
                budget: 100
            }
        );
        // A refused reservation leaves the accounting untouched
        assert_eq!(stats.live_bytes.load(Ordering::SeqCst), 60);
        assert_eq!(stats.live_allocations.load(Ordering::SeqCst), 1);
        stats.reserve(40, Some(100)).unwrap();
    }
}
