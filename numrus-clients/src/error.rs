use crate::check::CheckError;
use numrus_blas::{AllocError, BlasError, Status};
use numrus_device::DeviceError;
use thiserror::Error;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{context}: expected status {expected}, got {actual}")]
    UnexpectedStatus {
        context: &'static str,
        expected: Status,
        actual: Status,
    },

    #[error(transparent)]
    Blas(#[from] BlasError),

    #[error("allocation failed: {0}")]
    Alloc(#[from] AllocError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Check(#[from] CheckError),

    #[error("malformed arguments: {0}")]
    Arguments(#[from] serde_json::Error),
}

/// Fail unless `result` carries `expected`.
pub fn expect_status(
    context: &'static str,
    expected: Status,
    result: &numrus_blas::BlasResult<()>,
) -> ClientResult<()> {
    let actual = Status::of(result);
    if actual == expected {
        Ok(())
    } else {
        Err(ClientError::UnexpectedStatus {
            context,
            expected,
            actual,
        })
    }
}
