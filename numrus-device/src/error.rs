//! Device runtime errors.

use crate::transfer::TransferKind;
use numrus_core::BlasError;
use thiserror::Error;

/// Result type alias for device operations.
pub type Result<T> = std::result::Result<T, DeviceError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// Allocation exceeds the device's remaining capacity.
    #[error("out of device memory: requested {requested} bytes, {available} available")]
    OutOfMemory { requested: usize, available: usize },

    /// Transfer between buffers of different extents, devices or states.
    #[error("invalid {kind:?} copy: {reason}")]
    InvalidCopy { kind: TransferKind, reason: String },

    /// Fault raised by work executing on a stream.
    #[error("device fault on stream {stream}: {message}")]
    Fault { stream: u64, message: String },
}

impl From<DeviceError> for BlasError {
    fn from(e: DeviceError) -> Self {
        BlasError::Internal(e.to_string())
    }
}
