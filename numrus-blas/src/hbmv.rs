//! Batched banded Hermitian matrix-vector product:
//! `y_b := alpha * A_b * x_b + beta * y_b` for every batch `b`.
//!
//! Two call surfaces share one path: [`hbmv_strided_batched`] takes `i32`
//! sizes, increments and batch count, [`hbmv_strided_batched_64`] takes
//! `i64`. Strides are `i64` on both. [`dispatch`] picks the surface from an
//! [`IndexWidth`] flag at run time, narrowing to 32 bits when asked to.
//!
//! Every call: observer `pre_validate`, argument check, scalar resolution,
//! observer `pre_dispatch`, one kernel launch, observer `post_dispatch`.
//! A short-circuited call launches nothing.

use crate::arg_check::{hbmv_arg_check, BufferPresence, HbmvShape, Validation};
use crate::batch::DeviceStridedBatch;
use crate::handle::Handle;
use crate::kernel::{EmulatedHbmvKernel, HbmvKernel, HbmvLaunch};
use crate::observer::{HbmvCall, ScalarLog};
use crate::scalar::ScalarArg;
use numrus_core::{BlasComplex, BlasError, BlasInt, BlasResult, Fill, IndexWidth, PointerMode, Status};

const DEFAULT_KERNEL: EmulatedHbmvKernel = EmulatedHbmvKernel::new();

/// Arguments of one call, widened to 64 bits.
///
/// Absent operands are `None`; the validator decides whether that is legal.
#[derive(Debug)]
pub struct HbmvStridedBatched<'a, T: Copy + Default> {
    pub uplo: Fill,
    pub n: i64,
    pub k: i64,
    pub alpha: Option<ScalarArg<'a, T>>,
    pub a: Option<&'a DeviceStridedBatch<T>>,
    pub lda: i64,
    pub stride_a: i64,
    pub x: Option<&'a DeviceStridedBatch<T>>,
    pub incx: i64,
    pub stride_x: i64,
    pub beta: Option<ScalarArg<'a, T>>,
    pub y: Option<&'a mut DeviceStridedBatch<T>>,
    pub incy: i64,
    pub stride_y: i64,
    pub batch_count: i64,
}

impl<T: BlasComplex> HbmvStridedBatched<'_, T> {
    fn shape(&self, width: IndexWidth) -> HbmvShape {
        HbmvShape {
            n: self.n,
            k: self.k,
            lda: self.lda,
            incx: self.incx,
            incy: self.incy,
            batch_count: self.batch_count,
            width,
        }
    }

    fn buffers(&self) -> BufferPresence {
        BufferPresence {
            a: self.a.is_some(),
            x: self.x.is_some(),
            y: self.y.is_some(),
        }
    }

    fn record(&self, width: IndexWidth, pointer_mode: PointerMode) -> HbmvCall {
        HbmvCall {
            routine: HbmvCall::routine_name::<T>(width),
            precision: T::PRECISION,
            width,
            pointer_mode,
            uplo: self.uplo,
            n: self.n,
            k: self.k,
            alpha: ScalarLog::of(self.alpha.as_ref()),
            lda: self.lda,
            stride_a: self.stride_a,
            incx: self.incx,
            stride_x: self.stride_x,
            beta: ScalarLog::of(self.beta.as_ref()),
            incy: self.incy,
            stride_y: self.stride_y,
            batch_count: self.batch_count,
        }
    }
}

/// 32-bit call surface.
pub fn hbmv_strided_batched<'a, T: BlasComplex>(
    handle: Option<&Handle>,
    uplo: Fill,
    n: i32,
    k: i32,
    alpha: Option<ScalarArg<'a, T>>,
    a: Option<&'a DeviceStridedBatch<T>>,
    lda: i32,
    stride_a: i64,
    x: Option<&'a DeviceStridedBatch<T>>,
    incx: i32,
    stride_x: i64,
    beta: Option<ScalarArg<'a, T>>,
    y: Option<&'a mut DeviceStridedBatch<T>>,
    incy: i32,
    stride_y: i64,
    batch_count: i32,
) -> BlasResult<()> {
    surface(
        handle, uplo, n, k, alpha, a, lda, stride_a, x, incx, stride_x, beta, y, incy, stride_y,
        batch_count,
    )
}

/// 64-bit call surface.
pub fn hbmv_strided_batched_64<'a, T: BlasComplex>(
    handle: Option<&Handle>,
    uplo: Fill,
    n: i64,
    k: i64,
    alpha: Option<ScalarArg<'a, T>>,
    a: Option<&'a DeviceStridedBatch<T>>,
    lda: i64,
    stride_a: i64,
    x: Option<&'a DeviceStridedBatch<T>>,
    incx: i64,
    stride_x: i64,
    beta: Option<ScalarArg<'a, T>>,
    y: Option<&'a mut DeviceStridedBatch<T>>,
    incy: i64,
    stride_y: i64,
    batch_count: i64,
) -> BlasResult<()> {
    surface(
        handle, uplo, n, k, alpha, a, lda, stride_a, x, incx, stride_x, beta, y, incy, stride_y,
        batch_count,
    )
}

fn surface<'a, I: BlasInt, T: BlasComplex>(
    handle: Option<&Handle>,
    uplo: Fill,
    n: I,
    k: I,
    alpha: Option<ScalarArg<'a, T>>,
    a: Option<&'a DeviceStridedBatch<T>>,
    lda: I,
    stride_a: i64,
    x: Option<&'a DeviceStridedBatch<T>>,
    incx: I,
    stride_x: i64,
    beta: Option<ScalarArg<'a, T>>,
    y: Option<&'a mut DeviceStridedBatch<T>>,
    incy: I,
    stride_y: i64,
    batch_count: I,
) -> BlasResult<()> {
    let args = HbmvStridedBatched {
        uplo,
        n: n.into(),
        k: k.into(),
        alpha,
        a,
        lda: lda.into(),
        stride_a,
        x,
        incx: incx.into(),
        stride_x,
        beta,
        y,
        incy: incy.into(),
        stride_y,
        batch_count: batch_count.into(),
    };
    dispatch_with_kernel(handle, I::WIDTH, args, &DEFAULT_KERNEL)
}

/// Run a call through the surface selected by `width`.
pub fn dispatch<T: BlasComplex>(
    handle: Option<&Handle>,
    width: IndexWidth,
    args: HbmvStridedBatched<'_, T>,
) -> BlasResult<()> {
    dispatch_with_kernel(handle, width, args, &DEFAULT_KERNEL)
}

/// [`dispatch`] with a caller-supplied kernel.
///
/// With [`IndexWidth::Int32`], sizes that do not fit `i32` are
/// `invalid_size`, reported after the handle and fill checks.
pub fn dispatch_with_kernel<T: BlasComplex>(
    handle: Option<&Handle>,
    width: IndexWidth,
    args: HbmvStridedBatched<'_, T>,
    kernel: &dyn HbmvKernel<T>,
) -> BlasResult<()> {
    let pointer_mode = handle.map_or(PointerMode::Host, Handle::pointer_mode);
    let call = args.record(width, pointer_mode);
    if let Some(h) = handle {
        h.observer().pre_validate(&call);
    }

    let validation = hbmv_arg_check(
        handle,
        args.uplo,
        &args.shape(width),
        args.alpha.as_ref(),
        args.beta.as_ref(),
        args.buffers(),
    );
    let result = match (validation, handle) {
        (Validation::Reject(e), _) => Err(e),
        (Validation::ShortCircuit, _) => {
            tracing::debug!(routine = %call.routine, "quick return");
            Ok(())
        }
        (Validation::Proceed, None) => Err(BlasError::InvalidHandle),
        (Validation::Proceed, Some(h)) => launch(h, &call, args, kernel),
    };

    if let Some(h) = handle {
        h.observer().post_dispatch(&call, Status::of(&result));
    }
    result
}

fn launch<T: BlasComplex>(
    handle: &Handle,
    call: &HbmvCall,
    args: HbmvStridedBatched<'_, T>,
    kernel: &dyn HbmvKernel<T>,
) -> BlasResult<()> {
    let HbmvStridedBatched {
        uplo,
        n,
        k,
        alpha,
        a,
        lda,
        stride_a,
        x,
        incx,
        stride_x,
        beta,
        y,
        incy,
        stride_y,
        batch_count,
    } = args;
    let Some(alpha) = alpha else {
        return Err(BlasError::InvalidPointer("alpha"));
    };
    let Some(beta) = beta else {
        return Err(BlasError::InvalidPointer("beta"));
    };

    let launch = HbmvLaunch {
        uplo,
        n: n as usize,
        k: k as usize,
        alpha: alpha.resolve(),
        a: a.map(|m| m.device_data().device_slice()),
        lda: lda as usize,
        stride_a,
        x: x.map(|v| v.device_data().device_slice()),
        incx,
        stride_x,
        beta: beta.resolve(),
        y: y.map(|v| v.device_data_mut().device_slice_mut()),
        incy,
        stride_y,
        batch_count: batch_count as usize,
    };

    handle.observer().pre_dispatch(call);
    kernel.launch(handle.stream(), launch)
}
