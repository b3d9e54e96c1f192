//! Strided batch containers.
//!
//! One contiguous buffer holds `batch_count` matrices or vectors, each a
//! fixed `stride` elements from the next. A container is a composed value:
//! a [`BatchLayout`] descriptor plus the allocation (host `Vec` or
//! [`DeviceVec`]).
//!
//! Addressing of instance `b`:
//!
//! ```text
//! stride >= 0:  base + b * stride
//! stride <  0:  base + (b + 1 - batch_count) * stride
//! ```
//!
//! With a negative stride the instances are laid out in reverse, so the
//! same single allocation serves both signs. Reversing the batch order of
//! a positive-stride buffer and negating the stride addresses identical
//! elements.

use numrus_device::{transfer, Device, DeviceError, DeviceVec};
use thiserror::Error;

/// Element offset of batch `batch_index` from the start of the allocation.
///
/// No bounds check: callers validate `batch_index < batch_count`.
#[inline(always)]
pub fn batch_offset(batch_index: i64, stride: i64, batch_count: i64) -> i64 {
    if stride >= 0 {
        batch_index * stride
    } else {
        (batch_index + 1 - batch_count) * stride
    }
}

/// Offset of logical element `i` inside one vector of length `n`.
///
/// Negative increments start from the far end (BLAS convention).
#[inline(always)]
pub fn vector_offset(i: usize, n: usize, inc: i64) -> usize {
    let step = inc.unsigned_abs() as usize;
    if inc >= 0 {
        i * step
    } else {
        (n - 1 - i) * step
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
    #[error("strided batch layout covers no elements")]
    EmptyLayout,
    #[error("host allocation of {0} elements failed")]
    Host(usize),
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Shape and addressing descriptor shared by matrix and vector batches.
///
/// Vectors are the `rows == 1` case with the increment as leading dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLayout {
    pub rows: usize,
    pub cols: usize,
    pub leading_dim: i64,
    pub stride: i64,
    pub batch_count: i64,
}

impl BatchLayout {
    pub fn matrix(rows: usize, cols: usize, lda: usize, stride: i64, batch_count: i64) -> Self {
        Self {
            rows,
            cols,
            leading_dim: lda as i64,
            stride,
            batch_count,
        }
    }

    pub fn vector(n: usize, inc: i64, stride: i64, batch_count: i64) -> Self {
        Self {
            rows: 1,
            cols: n,
            leading_dim: inc,
            stride,
            batch_count,
        }
    }

    /// `|leading_dim| * cols + (batch_count - 1) * |stride|`.
    ///
    /// Zero when the layout is degenerate or the count overflows.
    pub fn nmemb(&self) -> usize {
        if self.batch_count < 1 {
            return 0;
        }
        let one = (self.leading_dim.unsigned_abs() as usize).checked_mul(self.cols);
        let rest = ((self.batch_count - 1) as usize).checked_mul(self.stride.unsigned_abs() as usize);
        match (one, rest) {
            (Some(a), Some(b)) => a.checked_add(b).unwrap_or(0),
            _ => 0,
        }
    }

    #[inline]
    pub fn batch_offset(&self, batch_index: usize) -> usize {
        batch_offset(batch_index as i64, self.stride, self.batch_count) as usize
    }

    /// Offset of vector element `i` of batch `b` (vector layouts).
    #[inline]
    pub fn element_offset(&self, batch_index: usize, i: usize) -> usize {
        self.batch_offset(batch_index) + vector_offset(i, self.cols, self.leading_dim)
    }
}

/// Host-resident strided batch.
#[derive(Debug, Clone)]
pub struct HostStridedBatch<T: Copy + Default> {
    layout: BatchLayout,
    data: Vec<T>,
    alloc_error: Option<AllocError>,
}

impl<T: Copy + Default> HostStridedBatch<T> {
    pub fn new(layout: BatchLayout) -> Self {
        let nmemb = layout.nmemb();
        if nmemb == 0 {
            return Self {
                layout,
                data: Vec::new(),
                alloc_error: Some(AllocError::EmptyLayout),
            };
        }
        let mut data = Vec::new();
        if data.try_reserve_exact(nmemb).is_err() {
            return Self {
                layout,
                data,
                alloc_error: Some(AllocError::Host(nmemb)),
            };
        }
        data.resize(nmemb, T::default());
        Self {
            layout,
            data,
            alloc_error: None,
        }
    }

    pub fn matrix(rows: usize, cols: usize, lda: usize, stride: i64, batch_count: i64) -> Self {
        Self::new(BatchLayout::matrix(rows, cols, lda, stride, batch_count))
    }

    pub fn vector(n: usize, inc: i64, stride: i64, batch_count: i64) -> Self {
        Self::new(BatchLayout::vector(n, inc, stride, batch_count))
    }

    pub fn layout(&self) -> &BatchLayout {
        &self.layout
    }

    pub fn memcheck(&self) -> Result<(), AllocError> {
        match &self.alloc_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Elements starting at batch `b`.
    pub fn batch(&self, batch_index: usize) -> &[T] {
        &self.data[self.layout.batch_offset(batch_index)..]
    }

    pub fn batch_mut(&mut self, batch_index: usize) -> &mut [T] {
        let off = self.layout.batch_offset(batch_index);
        &mut self.data[off..]
    }

    /// Copy another host batch with the same footprint.
    pub fn copy_from(&mut self, other: &HostStridedBatch<T>) {
        debug_assert_eq!(self.data.len(), other.data.len());
        self.data.copy_from_slice(&other.data);
    }

    /// Blocking device-to-host transfer of the whole footprint.
    pub fn transfer_from(&mut self, device: &DeviceStridedBatch<T>) -> Result<(), DeviceError> {
        transfer::copy_device_to_host(&mut self.data, &device.data)
    }
}

/// Device-resident strided batch.
#[derive(Debug)]
pub struct DeviceStridedBatch<T: Copy + Default> {
    layout: BatchLayout,
    data: DeviceVec<T>,
}

impl<T: Copy + Default> DeviceStridedBatch<T> {
    pub fn new(device: &Device, layout: BatchLayout) -> Self {
        Self {
            layout,
            data: DeviceVec::new(device, layout.nmemb()),
        }
    }

    pub fn matrix(
        device: &Device,
        rows: usize,
        cols: usize,
        lda: usize,
        stride: i64,
        batch_count: i64,
    ) -> Self {
        Self::new(device, BatchLayout::matrix(rows, cols, lda, stride, batch_count))
    }

    pub fn vector(device: &Device, n: usize, inc: i64, stride: i64, batch_count: i64) -> Self {
        Self::new(device, BatchLayout::vector(n, inc, stride, batch_count))
    }

    pub fn layout(&self) -> &BatchLayout {
        &self.layout
    }

    /// Ok when the whole footprint is backed by device memory.
    pub fn memcheck(&self) -> Result<(), AllocError> {
        if self.layout.nmemb() == 0 {
            return Err(AllocError::EmptyLayout);
        }
        self.data.memcheck()?;
        Ok(())
    }

    pub fn device_data(&self) -> &DeviceVec<T> {
        &self.data
    }

    pub fn device_data_mut(&mut self) -> &mut DeviceVec<T> {
        &mut self.data
    }

    /// Blocking host-to-device transfer of the whole footprint.
    pub fn transfer_from(&mut self, host: &HostStridedBatch<T>) -> Result<(), DeviceError> {
        transfer::copy_host_to_device(&mut self.data, &host.data)
    }
}
