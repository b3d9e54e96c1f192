//! Device allocations.
//!
//! A [`DeviceVec`] is a 64-byte aligned region charged to a [`Device`] and
//! released on drop, on every exit path. Construction never panics on
//! exhaustion: the vector comes back unallocated and [`DeviceVec::memcheck`]
//! reports why.
//!
//! Host code moves data through [`crate::transfer`]. The `device_slice*`
//! accessors exist for kernel code executing on a stream.

use crate::device::Device;
use crate::error::{DeviceError, Result};
use std::alloc;
use std::marker::PhantomData;
use std::ptr::NonNull;

/// Alignment of every device allocation.
pub const ALIGNMENT: usize = 64;

pub struct DeviceVec<T: Copy + Default> {
    ptr: Option<NonNull<T>>,
    len: usize,
    layout: alloc::Layout,
    device: Device,
    alloc_error: Option<DeviceError>,
    _owns: PhantomData<T>,
}

// Safety: DeviceVec uniquely owns its allocation, like Vec<T>.
unsafe impl<T: Copy + Default + Send> Send for DeviceVec<T> {}
unsafe impl<T: Copy + Default + Sync> Sync for DeviceVec<T> {}

impl<T: Copy + Default> DeviceVec<T> {
    /// Allocate `len` default-initialised elements on `device`.
    ///
    /// On failure the vector is unallocated; check with [`Self::memcheck`].
    pub fn new(device: &Device, len: usize) -> Self {
        let layout = match Self::layout_for(len) {
            Some(layout) => layout,
            None => {
                return Self::unallocated(
                    device,
                    len,
                    DeviceError::OutOfMemory {
                        requested: usize::MAX,
                        available: device.available(),
                    },
                )
            }
        };
        let bytes = layout.size();
        if len == 0 {
            return Self {
                ptr: None,
                len,
                layout,
                device: device.clone(),
                alloc_error: None,
                _owns: PhantomData,
            };
        }
        if let Err(e) = device.reserve(bytes) {
            tracing::debug!(device = device.id(), bytes, "device allocation refused");
            return Self::unallocated(device, len, e);
        }
        // Safety: layout_for never yields a zero-sized layout.
        let raw = unsafe { alloc::alloc(layout) } as *mut T;
        let Some(ptr) = NonNull::new(raw) else {
            device.release(bytes);
            return Self::unallocated(
                device,
                len,
                DeviceError::OutOfMemory {
                    requested: bytes,
                    available: device.available(),
                },
            );
        };
        for i in 0..len {
            // Safety: i < len and the allocation holds len elements.
            unsafe { ptr.as_ptr().add(i).write(T::default()) };
        }
        Self {
            ptr: Some(ptr),
            len,
            layout,
            device: device.clone(),
            alloc_error: None,
            _owns: PhantomData,
        }
    }

    /// Allocate or return the allocation error directly.
    pub fn try_new(device: &Device, len: usize) -> Result<Self> {
        let v = Self::new(device, len);
        v.memcheck()?;
        Ok(v)
    }

    fn unallocated(device: &Device, len: usize, error: DeviceError) -> Self {
        Self {
            ptr: None,
            len,
            layout: alloc::Layout::new::<u8>(),
            device: device.clone(),
            alloc_error: Some(error),
            _owns: PhantomData,
        }
    }

    fn layout_for(len: usize) -> Option<alloc::Layout> {
        let bytes = std::mem::size_of::<T>().checked_mul(len)?;
        let align = ALIGNMENT.max(std::mem::align_of::<T>());
        alloc::Layout::from_size_align(bytes.max(1), align).ok()
    }

    /// Number of elements requested at construction.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `true` when backing memory exists.
    pub fn is_allocated(&self) -> bool {
        self.ptr.is_some()
    }

    /// Ok when the requested memory is present (or nothing was requested).
    pub fn memcheck(&self) -> Result<()> {
        match &self.alloc_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Kernel-side read view. Empty when unallocated.
    pub fn device_slice(&self) -> &[T] {
        match self.ptr {
            // Safety: ptr covers len initialised elements owned by self.
            Some(p) => unsafe { std::slice::from_raw_parts(p.as_ptr(), self.len) },
            None => &[],
        }
    }

    /// Kernel-side write view. Empty when unallocated.
    pub fn device_slice_mut(&mut self) -> &mut [T] {
        match self.ptr {
            // Safety: &mut self gives exclusive access to the allocation.
            Some(p) => unsafe { std::slice::from_raw_parts_mut(p.as_ptr(), self.len) },
            None => &mut [],
        }
    }
}

impl<T: Copy + Default> Drop for DeviceVec<T> {
    fn drop(&mut self) {
        if let Some(p) = self.ptr.take() {
            // Safety: allocated in new() with this exact layout.
            unsafe { alloc::dealloc(p.as_ptr() as *mut u8, self.layout) };
            self.device.release(self.layout.size());
        }
    }
}

impl<T: Copy + Default> std::fmt::Debug for DeviceVec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceVec")
            .field("len", &self.len)
            .field("allocated", &self.is_allocated())
            .field("device", &self.device.id())
            .finish()
    }
}
