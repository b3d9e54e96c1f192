//! Status codes and the error taxonomy of the BLAS call surface.
//!
//! Routines return [`BlasResult`]; callers that need the flat C-style code
//! take it with [`Status::of`].

use thiserror::Error;

/// Result type alias for BLAS routines.
pub type BlasResult<T> = std::result::Result<T, BlasError>;

/// Errors reported by BLAS routines.
///
/// The four `Invalid*` kinds are detected before any work is enqueued.
/// `Internal` comes from the device runtime and is fatal to the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlasError {
    /// No execution context was supplied.
    #[error("invalid handle: no execution context")]
    InvalidHandle,

    /// An enumerated argument is outside its valid set.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Negative or structurally inconsistent dimensions.
    #[error("invalid size: {0}")]
    InvalidSize(String),

    /// A required buffer or scalar is missing.
    #[error("invalid pointer: {0}")]
    InvalidPointer(&'static str),

    /// Device or runtime fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BlasError {
    pub fn status(&self) -> Status {
        match self {
            BlasError::InvalidHandle => Status::InvalidHandle,
            BlasError::InvalidValue(_) => Status::InvalidValue,
            BlasError::InvalidSize(_) => Status::InvalidSize,
            BlasError::InvalidPointer(_) => Status::InvalidPointer,
            BlasError::Internal(_) => Status::InternalError,
        }
    }
}

/// Flat status code, as returned by the C API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Status {
    Success = 0,
    InvalidHandle = 1,
    InvalidPointer = 3,
    InvalidSize = 4,
    InternalError = 6,
    InvalidValue = 11,
}

impl Status {
    /// Status code of a routine result.
    pub fn of<T>(result: &BlasResult<T>) -> Status {
        match result {
            Ok(_) => Status::Success,
            Err(e) => e.status(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::InvalidHandle => "invalid_handle",
            Status::InvalidPointer => "invalid_pointer",
            Status::InvalidSize => "invalid_size",
            Status::InternalError => "internal_error",
            Status::InvalidValue => "invalid_value",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
