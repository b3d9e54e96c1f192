//! Argument validation for the batched banded Hermitian product.
//!
//! Runs once per call, before anything but the scalar arguments is read.
//! Order matters and is fixed:
//!
//! 1. missing handle                                  -> `invalid_handle`
//! 2. fill not upper/lower                            -> `invalid_value`
//! 3. `n<0 | k<0 | lda<=k | incx==0 | incy==0 | batch_count<0`, or a size
//!    that does not fit a 32-bit surface                -> `invalid_size`
//! 4. `n==0 | batch_count==0`                         -> short-circuit success
//! 5. `alpha`/`beta` missing or in the wrong address space -> `invalid_pointer`
//! 6. host mode, `alpha==0 && beta==1`                -> short-circuit success
//! 7. host mode: `y` required; `A`, `x` required unless `alpha==0`
//!
//! Step 3 runs before step 4, so a malformed shape is reported even when it
//! is also empty. Device-resident scalars are never read here, and device
//! buffers are not checked in device mode: the kernel faults if it needs
//! one that is absent.

use crate::handle::Handle;
use crate::scalar::ScalarArg;
use numrus_core::{BlasComplex, BlasError, Fill, IndexWidth, PointerMode};

/// Outcome of validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Reject(BlasError),
    /// The result is known (`y` unchanged); nothing may be touched.
    ShortCircuit,
    Proceed,
}

/// Which buffer arguments were supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPresence {
    pub a: bool,
    pub x: bool,
    pub y: bool,
}

/// Shape arguments, widened to 64 bits, and the surface they arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HbmvShape {
    pub n: i64,
    pub k: i64,
    pub lda: i64,
    pub incx: i64,
    pub incy: i64,
    pub batch_count: i64,
    pub width: IndexWidth,
}

impl HbmvShape {
    /// First size parameter outside the `i32` range of a 32-bit surface.
    fn narrowing_error(&self) -> Option<String> {
        if self.width != IndexWidth::Int32 {
            return None;
        }
        [
            ("n", self.n),
            ("k", self.k),
            ("lda", self.lda),
            ("incx", self.incx),
            ("incy", self.incy),
            ("batch_count", self.batch_count),
        ]
        .into_iter()
        .find(|(_, value)| i32::try_from(*value).is_err())
        .map(|(name, value)| format!("{name} = {value} does not fit the 32-bit interface"))
    }

    /// First violated size constraint, if any.
    pub fn size_error(&self) -> Option<String> {
        if let Some(reason) = self.narrowing_error() {
            Some(reason)
        } else if self.n < 0 {
            Some(format!("n = {} is negative", self.n))
        } else if self.k < 0 {
            Some(format!("k = {} is negative", self.k))
        } else if self.lda <= self.k {
            Some(format!("lda = {} must exceed k = {}", self.lda, self.k))
        } else if self.incx == 0 {
            Some("incx is zero".to_string())
        } else if self.incy == 0 {
            Some("incy is zero".to_string())
        } else if self.batch_count < 0 {
            Some(format!("batch_count = {} is negative", self.batch_count))
        } else {
            None
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0 || self.batch_count == 0
    }
}

pub fn hbmv_arg_check<T: BlasComplex>(
    handle: Option<&Handle>,
    uplo: Fill,
    shape: &HbmvShape,
    alpha: Option<&ScalarArg<'_, T>>,
    beta: Option<&ScalarArg<'_, T>>,
    buffers: BufferPresence,
) -> Validation {
    let Some(handle) = handle else {
        return Validation::Reject(BlasError::InvalidHandle);
    };

    if !uplo.is_triangle() {
        return Validation::Reject(BlasError::InvalidValue(format!(
            "fill mode {uplo:?} is not upper or lower"
        )));
    }

    if let Some(reason) = shape.size_error() {
        return Validation::Reject(BlasError::InvalidSize(reason));
    }

    if shape.is_empty() {
        return Validation::ShortCircuit;
    }

    let mode = handle.pointer_mode();
    let Some(alpha) = alpha else {
        return Validation::Reject(BlasError::InvalidPointer("alpha"));
    };
    let Some(beta) = beta else {
        return Validation::Reject(BlasError::InvalidPointer("beta"));
    };
    if alpha.residency() != mode {
        return Validation::Reject(BlasError::InvalidPointer(
            "alpha is not resident in the active pointer mode",
        ));
    }
    if beta.residency() != mode {
        return Validation::Reject(BlasError::InvalidPointer(
            "beta is not resident in the active pointer mode",
        ));
    }

    match (mode, alpha.host_value(), beta.host_value()) {
        (PointerMode::Host, Some(a), Some(b)) => {
            if a.is_zero() && b.is_one() {
                return Validation::ShortCircuit;
            }
            if !buffers.y {
                return Validation::Reject(BlasError::InvalidPointer("y"));
            }
            if !a.is_zero() {
                if !buffers.a {
                    return Validation::Reject(BlasError::InvalidPointer("A"));
                }
                if !buffers.x {
                    return Validation::Reject(BlasError::InvalidPointer("x"));
                }
            }
        }
        // Device scalars are opaque and device buffers are taken as given.
        _ => {}
    }

    Validation::Proceed
}
