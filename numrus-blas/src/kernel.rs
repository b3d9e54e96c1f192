//! Kernel launch contract and the emulated kernel.
//!
//! A call is one launch covering all `batch_count` instances. The launch
//! carries resolved scalars and raw element slices; addressing follows
//! [`crate::batch`]. Failures found while the work runs (an index past the
//! end of a buffer, an unbacked scalar cell) are device faults: they are
//! recorded on the stream and surface from the next synchronisation.

use crate::batch::{batch_offset, vector_offset};
use crate::scalar::ResolvedScalar;
use numrus_core::{parallel_for_chunks, BlasComplex, BlasError, BlasResult, Fill};
use numrus_device::Stream;

/// Everything one launch needs. Sizes are already validated.
#[derive(Debug)]
pub struct HbmvLaunch<'a, T: Copy + Default> {
    pub uplo: Fill,
    pub n: usize,
    pub k: usize,
    pub alpha: ResolvedScalar<'a, T>,
    /// `None` is only legal when `alpha == 0`.
    pub a: Option<&'a [T]>,
    pub lda: usize,
    pub stride_a: i64,
    pub x: Option<&'a [T]>,
    pub incx: i64,
    pub stride_x: i64,
    pub beta: ResolvedScalar<'a, T>,
    /// `None` is only legal when `alpha == 0 && beta == 1`.
    pub y: Option<&'a mut [T]>,
    pub incy: i64,
    pub stride_y: i64,
    pub batch_count: usize,
}

/// Launch-time contract. Called exactly once per validated call.
pub trait HbmvKernel<T: BlasComplex>: Send + Sync {
    fn launch(&self, stream: &Stream, args: HbmvLaunch<'_, T>) -> BlasResult<()>;
}

/// Scalar implementation executing on the emulated stream.
#[derive(Debug, Clone, Copy)]
pub struct EmulatedHbmvKernel {
    /// Minimum batches per worker thread.
    pub min_batches_per_thread: usize,
}

impl EmulatedHbmvKernel {
    pub const fn new() -> Self {
        Self {
            min_batches_per_thread: 1,
        }
    }
}

impl Default for EmulatedHbmvKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: BlasComplex> HbmvKernel<T> for EmulatedHbmvKernel {
    fn launch(&self, stream: &Stream, args: HbmvLaunch<'_, T>) -> BlasResult<()> {
        if !args.uplo.is_triangle() {
            return Err(BlasError::InvalidValue(format!(
                "kernel launched with fill mode {:?}",
                args.uplo
            )));
        }
        if args.lda <= args.k {
            return Err(BlasError::InvalidSize(format!(
                "kernel launched with lda = {} <= k = {}",
                args.lda, args.k
            )));
        }
        let min_chunk = self.min_batches_per_thread.max(1);
        stream.enqueue("hbmv_strided_batched", move || run(args, min_chunk));
        Ok(())
    }
}

// ============================================================================
// Execution
// ============================================================================

/// Wrapper to send a raw mutable pointer across thread boundaries.
/// Safety: callers only share it between threads touching disjoint elements.
#[derive(Clone, Copy)]
struct SendMutPtr<T> {
    ptr: *mut T,
    len: usize,
}
unsafe impl<T> Send for SendMutPtr<T> {}
unsafe impl<T> Sync for SendMutPtr<T> {}

impl<T: Copy> SendMutPtr<T> {
    fn new(slice: &mut [T]) -> Self {
        Self {
            ptr: slice.as_mut_ptr(),
            len: slice.len(),
        }
    }

    /// Safety: `idx < len` and no other thread accesses `idx` concurrently.
    #[inline(always)]
    unsafe fn read(&self, idx: usize) -> T {
        debug_assert!(idx < self.len);
        self.ptr.add(idx).read()
    }

    /// Safety: as for [`Self::read`].
    #[inline(always)]
    unsafe fn write(&self, idx: usize, value: T) {
        debug_assert!(idx < self.len);
        self.ptr.add(idx).write(value)
    }
}

/// Per-launch constants shared by every batch.
#[derive(Clone, Copy)]
struct BatchPlan<'a, T> {
    uplo: Fill,
    n: usize,
    k: usize,
    alpha: T,
    beta: T,
    a: &'a [T],
    lda: usize,
    stride_a: i64,
    x: &'a [T],
    incx: i64,
    stride_x: i64,
    incy: i64,
    stride_y: i64,
    batch_count: i64,
}

/// Elements needed to address every batch of a vector operand.
fn vector_extent(n: usize, inc: i64, stride: i64, batch_count: usize) -> Option<usize> {
    let last = (n - 1).checked_mul(inc.unsigned_abs() as usize)?;
    let span = (batch_count - 1).checked_mul(stride.unsigned_abs() as usize)?;
    last.checked_add(span)?.checked_add(1)
}

/// Elements needed to address every band of the matrix operand.
fn band_extent(uplo: Fill, n: usize, k: usize, lda: usize, stride: i64, batch_count: usize) -> Option<usize> {
    let top = if uplo == Fill::Upper { k } else { 0 };
    let last = (n - 1).checked_mul(lda)?.checked_add(top)?;
    let span = (batch_count - 1).checked_mul(stride.unsigned_abs() as usize)?;
    last.checked_add(span)?.checked_add(1)
}

fn check_extent(name: &str, len: usize, needed: Option<usize>) -> Result<(), String> {
    match needed {
        Some(needed) if needed <= len => Ok(()),
        Some(needed) => Err(format!(
            "{name}: access to element {} of a {len}-element buffer",
            needed - 1
        )),
        None => Err(format!("{name}: address computation overflows")),
    }
}

fn run<T: BlasComplex>(args: HbmvLaunch<'_, T>, min_chunk: usize) -> Result<(), String> {
    let HbmvLaunch {
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
    if n == 0 || batch_count == 0 {
        return Ok(());
    }

    let alpha = alpha.load()?;
    let beta = beta.load()?;
    if alpha.is_zero() && beta.is_one() {
        return Ok(());
    }

    let y = y.ok_or("y: null device pointer")?;
    check_extent("y", y.len(), vector_extent(n, incy, stride_y, batch_count))?;
    let (a, x): (&[T], &[T]) = if alpha.is_zero() {
        (&[], &[])
    } else {
        let a = a.ok_or("A: null device pointer")?;
        let x = x.ok_or("x: null device pointer")?;
        check_extent("A", a.len(), band_extent(uplo, n, k, lda, stride_a, batch_count))?;
        check_extent("x", x.len(), vector_extent(n, incx, stride_x, batch_count))?;
        (a, x)
    };

    let plan = BatchPlan {
        uplo,
        n,
        k,
        alpha,
        beta,
        a,
        lda,
        stride_a,
        x,
        incx,
        stride_x,
        incy,
        stride_y,
        batch_count: batch_count as i64,
    };
    let y_ptr = SendMutPtr::new(y);

    // Output batches are disjoint iff consecutive ones start past the last
    // element of the previous one.
    let disjoint =
        batch_count > 1 && stride_y.unsigned_abs() as usize > (n - 1) * incy.unsigned_abs() as usize;
    tracing::trace!(n, k, batch_count, disjoint, "hbmv batches");

    if disjoint {
        parallel_for_chunks(batch_count, min_chunk, |start, end| {
            for b in start..end {
                // Safety: disjoint output batches, extent checked above.
                unsafe { hbmv_batch(&plan, y_ptr, b) };
            }
        });
    } else {
        for b in 0..batch_count {
            // Safety: single thread, extent checked above.
            unsafe { hbmv_batch(&plan, y_ptr, b) };
        }
    }
    Ok(())
}

/// Element `A(i, j)` of the Hermitian matrix held in band storage.
///
/// Only the stored triangle is read; the other one is its conjugate
/// mirror, and the diagonal's imaginary part is ignored.
#[inline(always)]
fn band_element<T: BlasComplex>(uplo: Fill, a: &[T], lda: usize, k: usize, i: usize, j: usize) -> T {
    match uplo {
        Fill::Upper => {
            if i == j {
                a[k + j * lda].real_part()
            } else if i < j {
                a[k - (j - i) + j * lda]
            } else {
                a[k - (i - j) + i * lda].conj()
            }
        }
        _ => {
            if i == j {
                a[j * lda].real_part()
            } else if i > j {
                a[(i - j) + j * lda]
            } else {
                a[(j - i) + i * lda].conj()
            }
        }
    }
}

/// Row-oriented product for batch `b`.
///
/// Safety: elements of batch `b` in `y` are within bounds and not touched
/// by any other thread for the duration of the call.
unsafe fn hbmv_batch<T: BlasComplex>(plan: &BatchPlan<'_, T>, y: SendMutPtr<T>, b: usize) {
    let bi = b as i64;
    let n = plan.n;
    let y_base = batch_offset(bi, plan.stride_y, plan.batch_count) as usize;

    if plan.alpha.is_zero() {
        for i in 0..n {
            let yi = y_base + vector_offset(i, n, plan.incy);
            let v = if plan.beta.is_zero() {
                T::zero()
            } else {
                plan.beta * y.read(yi)
            };
            y.write(yi, v);
        }
        return;
    }

    let a = &plan.a[batch_offset(bi, plan.stride_a, plan.batch_count) as usize..];
    let x = &plan.x[batch_offset(bi, plan.stride_x, plan.batch_count) as usize..];

    for i in 0..n {
        let lo = i.saturating_sub(plan.k);
        let hi = (i + plan.k).min(n - 1);
        let mut acc = T::zero();
        for j in lo..=hi {
            acc += band_element(plan.uplo, a, plan.lda, plan.k, i, j) * x[vector_offset(j, n, plan.incx)];
        }
        let yi = y_base + vector_offset(i, n, plan.incy);
        let v = if plan.beta.is_zero() {
            plan.alpha * acc
        } else {
            plan.alpha * acc + plan.beta * y.read(yi)
        };
        y.write(yi, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::{Complex32, Complex64};
    use numrus_core::Status;
    use numrus_device::{transfer, Device, DeviceVec};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn launch<'a>(
        uplo: Fill,
        n: usize,
        k: usize,
        alpha: Complex64,
        a: Option<&'a [Complex64]>,
        lda: usize,
        x: Option<&'a [Complex64]>,
        beta: Complex64,
        y: &'a mut [Complex64],
    ) -> HbmvLaunch<'a, Complex64> {
        HbmvLaunch {
            uplo,
            n,
            k,
            alpha: ResolvedScalar::Value(alpha),
            a,
            lda,
            stride_a: 0,
            x,
            incx: 1,
            stride_x: 0,
            beta: ResolvedScalar::Value(beta),
            y: Some(y),
            incy: 1,
            stride_y: 0,
            batch_count: 1,
        }
    }

    fn execute(args: HbmvLaunch<'_, Complex64>) -> BlasResult<()> {
        let stream = Stream::new(&Device::default());
        EmulatedHbmvKernel::new().launch(&stream, args)?;
        stream.synchronize()?;
        Ok(())
    }

    // A = [[2, 1+i], [1-i, 3]], x = [1, i]  =>  A x = [1+i, 1+2i]
    #[test]
    fn test_two_by_two_upper() {
        let ab = [c(9.0, 9.0), c(2.0, 5.0), c(1.0, 1.0), c(3.0, 0.0)];
        let x = [c(1.0, 0.0), c(0.0, 1.0)];
        let mut y = [c(7.0, 7.0); 2];
        execute(launch(Fill::Upper, 2, 1, c(1.0, 0.0), Some(&ab), 2, Some(&x), c(0.0, 0.0), &mut y)).unwrap();
        assert_eq!(y, [c(1.0, 1.0), c(1.0, 2.0)]);
    }

    #[test]
    fn test_two_by_two_lower() {
        let ab = [c(2.0, -4.0), c(1.0, -1.0), c(3.0, 0.0), c(9.0, 9.0)];
        let x = [c(1.0, 0.0), c(0.0, 1.0)];
        let mut y = [c(1.0, 0.0), c(0.0, 0.0)];
        execute(launch(Fill::Lower, 2, 1, c(2.0, 0.0), Some(&ab), 2, Some(&x), c(1.0, 0.0), &mut y)).unwrap();
        assert_eq!(y, [c(3.0, 2.0), c(2.0, 4.0)]);
    }

    #[test]
    fn test_beta_zero_never_reads_y() {
        let ab = [c(0.0, 0.0), c(1.0, 0.0)];
        let x = [c(4.0, 0.0)];
        let mut y = [c(f64::NAN, f64::NAN)];
        execute(launch(Fill::Upper, 1, 1, c(1.0, 0.0), Some(&ab), 2, Some(&x), c(0.0, 0.0), &mut y)).unwrap();
        assert_eq!(y, [c(4.0, 0.0)]);
    }

    #[test]
    fn test_alpha_zero_ignores_absent_matrix() {
        let mut y = [c(1.0, 1.0), c(2.0, 0.0)];
        execute(launch(Fill::Upper, 2, 1, c(0.0, 0.0), None, 2, None, c(0.0, 2.0), &mut y)).unwrap();
        assert_eq!(y, [c(-2.0, 2.0), c(0.0, 4.0)]);
    }

    #[test]
    fn test_quick_return_leaves_y_bit_identical() {
        let mut y = [c(f64::NAN, 1.0)];
        execute(launch(Fill::Lower, 1, 0, c(0.0, 0.0), None, 1, None, c(1.0, 0.0), &mut y)).unwrap();
        assert!(y[0].re.is_nan());
        assert_eq!(y[0].im, 1.0);
    }

    #[test]
    fn test_absent_y_only_legal_on_quick_return() {
        let mut y = [c(0.0, 0.0)];
        let mut args = launch(Fill::Lower, 1, 0, c(0.0, 0.0), None, 1, None, c(1.0, 0.0), &mut y);
        args.y = None;
        assert!(execute(args).is_ok());

        let mut y = [c(0.0, 0.0)];
        let mut args = launch(Fill::Lower, 1, 0, c(0.0, 0.0), None, 1, None, c(3.0, 0.0), &mut y);
        args.y = None;
        assert_eq!(Status::of(&execute(args)), Status::InternalError);
    }

    #[test]
    fn test_overlapping_outputs_run_in_batch_order() {
        let mut y = [c(1.0, 0.0), c(1.0, 1.0)];
        let mut args = launch(Fill::Upper, 2, 0, c(0.0, 0.0), None, 1, None, c(2.0, 0.0), &mut y);
        args.batch_count = 3;
        execute(args).unwrap();
        assert_eq!(y, [c(8.0, 0.0), c(8.0, 8.0)]);
    }

    #[test]
    fn test_negative_increment_and_stride() {
        // Two batches of diag(1, 2), x batches [1, 1] and [3, 3].
        let ab = [c(1.0, 0.0), c(2.0, 0.0)];
        let x = [c(3.0, 0.0), c(3.0, 0.0), c(1.0, 0.0), c(1.0, 0.0)];
        let mut y = [c(0.0, 0.0); 4];
        let mut args = launch(Fill::Lower, 2, 0, c(1.0, 0.0), Some(&ab), 1, Some(&x), c(0.0, 0.0), &mut y);
        args.batch_count = 2;
        args.stride_x = -2;
        args.incy = -1;
        args.stride_y = 2;
        execute(args).unwrap();
        // y batch 0 reversed: [A x]_1 first.
        assert_eq!(y, [c(2.0, 0.0), c(1.0, 0.0), c(6.0, 0.0), c(3.0, 0.0)]);
    }

    #[test]
    fn test_out_of_bounds_is_deferred_fault() {
        let stream = Stream::new(&Device::default());
        let ab = [c(1.0, 0.0); 3];
        let x = [c(1.0, 0.0); 3];
        let mut y = [c(0.0, 0.0); 2];
        let args = launch(Fill::Upper, 3, 0, c(1.0, 0.0), Some(&ab), 1, Some(&x), c(0.0, 0.0), &mut y);
        assert!(EmulatedHbmvKernel::new().launch(&stream, args).is_ok());
        let err = BlasError::from(stream.synchronize().unwrap_err());
        assert_eq!(err.status(), Status::InternalError);
    }

    #[test]
    fn test_device_scalars_loaded_on_stream() {
        let dev = Device::default();
        let mut alpha = DeviceVec::new(&dev, 1);
        let mut beta = DeviceVec::new(&dev, 1);
        transfer::copy_host_to_device(&mut alpha, &[Complex32::new(0.0, 1.0)]).unwrap();
        transfer::copy_host_to_device(&mut beta, &[Complex32::new(1.0, 0.0)]).unwrap();
        let ab = [Complex32::new(3.0, 0.0)];
        let x = [Complex32::new(2.0, 0.0)];
        let mut y = [Complex32::new(1.0, 0.0)];
        let stream = Stream::new(&dev);
        let args = HbmvLaunch {
            uplo: Fill::Upper,
            n: 1,
            k: 0,
            alpha: ResolvedScalar::Device(&alpha),
            a: Some(&ab),
            lda: 1,
            stride_a: 0,
            x: Some(&x),
            incx: 1,
            stride_x: 0,
            beta: ResolvedScalar::Device(&beta),
            y: Some(&mut y),
            incy: 1,
            stride_y: 0,
            batch_count: 1,
        };
        EmulatedHbmvKernel::new().launch(&stream, args).unwrap();
        stream.synchronize().unwrap();
        assert_eq!(y, [Complex32::new(1.0, 6.0)]);
    }

    #[test]
    fn test_full_fill_rejected_at_launch() {
        let mut y = [c(0.0, 0.0)];
        let args = launch(Fill::Full, 1, 0, c(1.0, 0.0), None, 1, None, c(0.0, 0.0), &mut y);
        assert_eq!(Status::of(&execute(args)), Status::InvalidValue);
    }

    fn dense_hermitian(rng: &mut StdRng, n: usize, k: usize) -> Vec<Vec<Complex64>> {
        let mut m = vec![vec![c(0.0, 0.0); n]; n];
        for j in 0..n {
            m[j][j] = c(rng.gen_range(-4..=4) as f64, 0.0);
            for i in j.saturating_sub(k)..j {
                let v = c(rng.gen_range(-4..=4) as f64, rng.gen_range(-4..=4) as f64);
                m[i][j] = v;
                m[j][i] = v.conj();
            }
        }
        m
    }

    fn pack(m: &[Vec<Complex64>], uplo: Fill, k: usize, lda: usize) -> Vec<Complex64> {
        let n = m.len();
        let mut ab = vec![c(0.0, 0.0); lda * n];
        for j in 0..n {
            for i in 0..n {
                let stored = match uplo {
                    Fill::Upper => i <= j && j - i <= k,
                    _ => i >= j && i - j <= k,
                };
                if stored {
                    let row = if uplo == Fill::Upper { k + i - j } else { i - j };
                    ab[row + j * lda] = m[i][j];
                }
            }
        }
        ab
    }

    #[test]
    fn test_matches_dense_product() {
        let mut rng = StdRng::seed_from_u64(42);
        for &(n, k) in &[(1, 0), (5, 0), (7, 2), (9, 8), (12, 20)] {
            let m = dense_hermitian(&mut rng, n, k);
            let x: Vec<Complex64> = (0..n).map(|_| c(rng.gen_range(-3..=3) as f64, rng.gen_range(-3..=3) as f64)).collect();
            let expected: Vec<Complex64> = (0..n)
                .map(|i| (0..n).fold(c(0.0, 0.0), |acc, j| acc + m[i][j] * x[j]))
                .collect();
            for uplo in [Fill::Upper, Fill::Lower] {
                let lda = k + 2;
                let ab = pack(&m, uplo, k, lda);
                let mut y = vec![c(0.0, 0.0); n];
                execute(launch(uplo, n, k, c(1.0, 0.0), Some(&ab), lda, Some(&x), c(0.0, 0.0), &mut y)).unwrap();
                assert_eq!(y, expected, "n={n} k={k} {uplo:?}");
            }
        }
    }

    #[test]
    fn test_parallel_batches_match_sequential() {
        let mut rng = StdRng::seed_from_u64(7);
        let (n, k, lda, bc) = (16usize, 3usize, 5usize, 9usize);
        let ab: Vec<Complex64> = (0..lda * n * bc).map(|_| c(rng.gen_range(-2..=2) as f64, rng.gen_range(-2..=2) as f64)).collect();
        let x: Vec<Complex64> = (0..n * bc).map(|_| c(rng.gen_range(-2..=2) as f64, 0.0)).collect();
        let y0: Vec<Complex64> = (0..n * bc).map(|_| c(1.0, -1.0)).collect();

        let mut outputs = Vec::new();
        for min_batches_per_thread in [1, bc] {
            let mut y = y0.clone();
            let mut args = launch(Fill::Lower, n, k, c(0.5, 1.0), Some(&ab), lda, Some(&x), c(2.0, 0.0), &mut y);
            args.batch_count = bc;
            args.stride_a = (lda * n) as i64;
            args.stride_x = n as i64;
            args.stride_y = n as i64;
            let stream = Stream::new(&Device::default());
            EmulatedHbmvKernel { min_batches_per_thread }.launch(&stream, args).unwrap();
            stream.synchronize().unwrap();
            outputs.push(y);
        }
        assert_eq!(outputs[0], outputs[1]);
    }
}
