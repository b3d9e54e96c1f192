//! Dual-mode scalar operands.
//!
//! `alpha` and `beta` are either host values or one-element device cells.
//! Host values may be inspected before launch; device cells are opaque to
//! the host and only read by the kernel, so value-dependent shortcuts are
//! restricted to [`PointerMode::Host`].

use numrus_core::{BlasComplex, PointerMode};
use numrus_device::DeviceVec;

/// A scalar argument as passed by the caller.
#[derive(Debug, Clone, Copy)]
pub enum ScalarArg<'a, T: Copy + Default> {
    Host(&'a T),
    Device(&'a DeviceVec<T>),
}

impl<'a, T: Copy + Default> ScalarArg<'a, T> {
    /// Address space the operand lives in.
    pub fn residency(&self) -> PointerMode {
        match self {
            ScalarArg::Host(_) => PointerMode::Host,
            ScalarArg::Device(_) => PointerMode::Device,
        }
    }

    /// Value of a host-resident scalar; `None` for device cells.
    pub fn host_value(&self) -> Option<T> {
        match self {
            ScalarArg::Host(v) => Some(**v),
            ScalarArg::Device(_) => None,
        }
    }

    /// Resolve for launch: host values are copied, device cells stay cells.
    pub fn resolve(self) -> ResolvedScalar<'a, T> {
        match self {
            ScalarArg::Host(v) => ResolvedScalar::Value(*v),
            ScalarArg::Device(cell) => ResolvedScalar::Device(cell),
        }
    }
}

/// A scalar as carried into a kernel launch. Immutable for the call.
#[derive(Debug, Clone, Copy)]
pub enum ResolvedScalar<'a, T: Copy + Default> {
    Value(T),
    Device(&'a DeviceVec<T>),
}

impl<T: BlasComplex> ResolvedScalar<'_, T> {
    /// Device-side load. Fails when the cell has no backing memory.
    pub fn load(&self) -> Result<T, String> {
        match self {
            ResolvedScalar::Value(v) => Ok(*v),
            ResolvedScalar::Device(cell) => cell
                .device_slice()
                .first()
                .copied()
                .ok_or_else(|| "scalar cell has no device memory".to_string()),
        }
    }
}
