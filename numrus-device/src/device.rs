//! Device identity and memory accounting.

use crate::error::{DeviceError, Result};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

/// Default capacity of an emulated device: 1 GiB.
pub const DEFAULT_CAPACITY_BYTES: usize = 1 << 30;

static NEXT_DEVICE_ID: AtomicU32 = AtomicU32::new(0);

struct DeviceInner {
    id: u32,
    capacity: usize,
    allocated: AtomicUsize,
}

/// Handle to one accelerator. Cheap to clone; clones share accounting.
#[derive(Clone)]
pub struct Device {
    inner: Arc<DeviceInner>,
}

impl Device {
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            inner: Arc::new(DeviceInner {
                id: NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed),
                capacity: capacity_bytes,
                allocated: AtomicUsize::new(0),
            }),
        }
    }

    pub fn id(&self) -> u32 {
        self.inner.id
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Bytes currently held by live allocations.
    pub fn allocated(&self) -> usize {
        self.inner.allocated.load(Ordering::Acquire)
    }

    pub fn available(&self) -> usize {
        self.capacity().saturating_sub(self.allocated())
    }

    /// Charge `bytes` against the capacity, failing without side effects.
    pub(crate) fn reserve(&self, bytes: usize) -> Result<()> {
        let mut current = self.inner.allocated.load(Ordering::Acquire);
        loop {
            let available = self.inner.capacity.saturating_sub(current);
            if bytes > available {
                return Err(DeviceError::OutOfMemory {
                    requested: bytes,
                    available,
                });
            }
            match self.inner.allocated.compare_exchange_weak(
                current,
                current + bytes,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }

    pub(crate) fn release(&self, bytes: usize) {
        self.inner.allocated.fetch_sub(bytes, Ordering::AcqRel);
    }
}

impl Default for Device {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY_BYTES)
    }
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Device {}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id())
            .field("capacity", &self.capacity())
            .field("allocated", &self.allocated())
            .finish()
    }
}
