//! Blocking host/device transfers.

use crate::buffer::DeviceVec;
use crate::error::{DeviceError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    HostToDevice,
    DeviceToHost,
    DeviceToDevice,
}

fn check_extents(kind: TransferKind, dst: usize, src: usize) -> Result<()> {
    if dst != src {
        return Err(DeviceError::InvalidCopy {
            kind,
            reason: format!("destination holds {dst} elements, source {src}"),
        });
    }
    Ok(())
}

fn check_allocated<T: Copy + Default>(kind: TransferKind, buf: &DeviceVec<T>) -> Result<()> {
    if !buf.is_allocated() && !buf.is_empty() {
        return Err(DeviceError::InvalidCopy {
            kind,
            reason: "device buffer is not allocated".into(),
        });
    }
    Ok(())
}

/// Copy `src` into the whole of `dst`.
pub fn copy_host_to_device<T: Copy + Default>(dst: &mut DeviceVec<T>, src: &[T]) -> Result<()> {
    let kind = TransferKind::HostToDevice;
    check_allocated(kind, dst)?;
    check_extents(kind, dst.len(), src.len())?;
    dst.device_slice_mut().copy_from_slice(src);
    Ok(())
}

/// Copy the whole of `src` into `dst`.
pub fn copy_device_to_host<T: Copy + Default>(dst: &mut [T], src: &DeviceVec<T>) -> Result<()> {
    let kind = TransferKind::DeviceToHost;
    check_allocated(kind, src)?;
    check_extents(kind, dst.len(), src.len())?;
    dst.copy_from_slice(src.device_slice());
    Ok(())
}

/// Copy between two allocations of the same device.
pub fn copy_device_to_device<T: Copy + Default>(
    dst: &mut DeviceVec<T>,
    src: &DeviceVec<T>,
) -> Result<()> {
    let kind = TransferKind::DeviceToDevice;
    if dst.device() != src.device() {
        return Err(DeviceError::InvalidCopy {
            kind,
            reason: format!(
                "buffers live on devices {} and {}",
                dst.device().id(),
                src.device().id()
            ),
        });
    }
    check_allocated(kind, dst)?;
    check_allocated(kind, src)?;
    check_extents(kind, dst.len(), src.len())?;
    dst.device_slice_mut().copy_from_slice(src.device_slice());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device;

    #[test]
    fn test_round_trip_is_exact() {
        let dev = Device::default();
        let host: Vec<f64> = (0..257).map(|i| (i as f64).sqrt() * -1.5).collect();
        let mut d = DeviceVec::new(&dev, host.len());
        copy_host_to_device(&mut d, &host).unwrap();
        let mut back = vec![0.0; host.len()];
        copy_device_to_host(&mut back, &d).unwrap();
        assert_eq!(
            back.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            host.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_extent_mismatch() {
        let dev = Device::default();
        let mut d: DeviceVec<f32> = DeviceVec::new(&dev, 4);
        let err = copy_host_to_device(&mut d, &[1.0; 3]).unwrap_err();
        assert!(matches!(
            err,
            DeviceError::InvalidCopy {
                kind: TransferKind::HostToDevice,
                ..
            }
        ));
    }

    #[test]
    fn test_unallocated_buffer_is_rejected() {
        let dev = Device::new(8);
        let d: DeviceVec<f64> = DeviceVec::new(&dev, 16);
        let mut host = vec![0.0; 16];
        assert!(copy_device_to_host(&mut host, &d).is_err());
    }

    #[test]
    fn test_device_to_device_requires_same_device() {
        let a = Device::default();
        let b = Device::default();
        let src: DeviceVec<i64> = DeviceVec::new(&a, 2);
        let mut same: DeviceVec<i64> = DeviceVec::new(&a, 2);
        let mut other: DeviceVec<i64> = DeviceVec::new(&b, 2);
        assert!(copy_device_to_device(&mut same, &src).is_ok());
        assert!(copy_device_to_device(&mut other, &src).is_err());
    }
}
