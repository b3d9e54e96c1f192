//! Client drivers for the batched banded Hermitian product.

use crate::arguments::Arguments;
use crate::check::{bitwise_check_general, norm_check_general, norm_tolerance, unit_check_general};
use crate::error::{expect_status, ClientResult};
use crate::init::{init_band_matrix, init_vector};
use crate::reference::ref_hbmv_strided_batched;
use numrus_blas::{
    dispatch, hbmv_gbyte_count, hbmv_gflop_count, time_calls, BlasComplex, BlasResult,
    DeviceStridedBatch, Fill, Handle, HbmvCall, HbmvStridedBatched, HostStridedBatch, IndexWidth,
    PointerMode, ScalarArg, Status,
};
use numrus_core::SplitMix64;
use numrus_device::{transfer, DeviceVec};
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingReport {
    pub gpu_time_us: f64,
    pub gflops: f64,
    pub gbytes_per_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestReport {
    pub routine: String,
    /// The problem ended at validation; nothing was allocated.
    pub quick_return: bool,
    pub host_error: Option<f64>,
    pub device_error: Option<f64>,
    pub cpu_time_us: Option<f64>,
    pub timing: Option<TimingReport>,
}

// ============================================================================
// Bad arguments
// ============================================================================

const N: i64 = 100;
const K: i64 = 5;
const LDA: i64 = 100;
const STRIDE_A: i64 = 10_000;
const STRIDE_V: i64 = 100;
const BATCH_COUNT: i64 = 2;

fn call<'a, T: BlasComplex>(
    handle: Option<&Handle>,
    api: IndexWidth,
    uplo: Fill,
    n: i64,
    alpha: Option<ScalarArg<'a, T>>,
    a: Option<&'a DeviceStridedBatch<T>>,
    x: Option<&'a DeviceStridedBatch<T>>,
    beta: Option<ScalarArg<'a, T>>,
    y: Option<&'a mut DeviceStridedBatch<T>>,
    batch_count: i64,
) -> BlasResult<()> {
    let args = HbmvStridedBatched {
        uplo,
        n,
        k: K,
        alpha,
        a,
        lda: LDA,
        stride_a: STRIDE_A,
        x,
        incx: 1,
        stride_x: STRIDE_V,
        beta,
        y,
        incy: 1,
        stride_y: STRIDE_V,
        batch_count,
    };
    dispatch(handle, api, args)
}

/// Device cell holding `value`.
fn device_scalar<T: BlasComplex>(handle: &Handle, value: T) -> ClientResult<DeviceVec<T>> {
    let mut cell = DeviceVec::new(handle.device(), 1);
    cell.memcheck()?;
    transfer::copy_host_to_device(&mut cell, &[value])?;
    Ok(cell)
}

fn pick<'a, T: BlasComplex>(mode: PointerMode, host: &'a T, dev: &'a DeviceVec<T>) -> ScalarArg<'a, T> {
    match mode {
        PointerMode::Host => ScalarArg::Host(host),
        PointerMode::Device => ScalarArg::Device(dev),
    }
}

/// Invalid and degenerate argument combinations, in both pointer modes.
///
/// Missing A, x or y is only diagnosed in host mode; device buffers are taken
/// as given. The `alpha == 0` relaxations succeed in both modes.
pub fn testing_hbmv_strided_batched_bad_arg<T: BlasComplex>(api: IndexWidth) -> ClientResult<()> {
    for pointer_mode in [PointerMode::Host, PointerMode::Device] {
        let mut handle = Handle::from_env();
        handle.set_pointer_mode(pointer_mode);
        let h = Some(&handle);
        let uplo = Fill::Upper;

        let (alpha_h, beta_h, one_h, zero_h) =
            (T::one(), T::from_f64_parts(2.0, 0.0), T::one(), T::zero());
        let alpha_d = device_scalar(&handle, alpha_h)?;
        let beta_d = device_scalar(&handle, beta_h)?;
        let one_d = device_scalar(&handle, one_h)?;
        let zero_d = device_scalar(&handle, zero_h)?;
        let (alpha, beta) = (
            pick(pointer_mode, &alpha_h, &alpha_d),
            pick(pointer_mode, &beta_h, &beta_d),
        );
        let (one, zero) = (
            pick(pointer_mode, &one_h, &one_d),
            pick(pointer_mode, &zero_h, &zero_d),
        );

        let dev = handle.device();
        let da = DeviceStridedBatch::<T>::matrix(dev, (K + 1) as usize, N as usize, LDA as usize, STRIDE_A, BATCH_COUNT);
        let dx = DeviceStridedBatch::<T>::vector(dev, N as usize, 1, STRIDE_V, BATCH_COUNT);
        let mut dy = DeviceStridedBatch::<T>::vector(dev, N as usize, 1, STRIDE_V, BATCH_COUNT);
        da.memcheck()?;
        dx.memcheck()?;
        dy.memcheck()?;

        let r = call(None, api, uplo, N, Some(alpha), Some(&da), Some(&dx), Some(beta), Some(&mut dy), BATCH_COUNT);
        expect_status("null handle", Status::InvalidHandle, &r)?;

        let r = call(h, api, Fill::Full, N, Some(alpha), Some(&da), Some(&dx), Some(beta), Some(&mut dy), BATCH_COUNT);
        expect_status("full fill", Status::InvalidValue, &r)?;

        let r = call(h, api, uplo, N, None, Some(&da), Some(&dx), Some(beta), Some(&mut dy), BATCH_COUNT);
        expect_status("null alpha", Status::InvalidPointer, &r)?;

        let r = call(h, api, uplo, N, Some(alpha), Some(&da), Some(&dx), None, Some(&mut dy), BATCH_COUNT);
        expect_status("null beta", Status::InvalidPointer, &r)?;

        if pointer_mode == PointerMode::Host {
            let r = call(h, api, uplo, N, Some(alpha), None, Some(&dx), Some(beta), Some(&mut dy), BATCH_COUNT);
            expect_status("null A", Status::InvalidPointer, &r)?;

            let r = call(h, api, uplo, N, Some(alpha), Some(&da), None, Some(beta), Some(&mut dy), BATCH_COUNT);
            expect_status("null x", Status::InvalidPointer, &r)?;

            let r = call(h, api, uplo, N, Some(alpha), Some(&da), Some(&dx), Some(beta), None, BATCH_COUNT);
            expect_status("null y", Status::InvalidPointer, &r)?;
        }

        let r = call::<T>(h, api, uplo, 0, None, None, None, None, None, BATCH_COUNT);
        expect_status("n == 0", Status::Success, &r)?;

        let r = call::<T>(h, api, uplo, N, None, None, None, None, None, 0);
        expect_status("batch_count == 0", Status::Success, &r)?;

        let r = call(h, api, uplo, N, Some(zero), None, None, Some(beta), Some(&mut dy), BATCH_COUNT);
        expect_status("alpha == 0 without A, x", Status::Success, &r)?;

        let r = call(h, api, uplo, N, Some(zero), None, None, Some(one), None, BATCH_COUNT);
        expect_status("alpha == 0, beta == 1 without buffers", Status::Success, &r)?;

        handle.synchronize()?;
    }
    Ok(())
}

// ============================================================================
// Correctness and timing
// ============================================================================

/// One call with the operands of `arg`.
fn run_hbmv<'a, T: BlasComplex>(
    handle: &Handle,
    arg: &Arguments,
    alpha: ScalarArg<'a, T>,
    a: &'a DeviceStridedBatch<T>,
    x: &'a DeviceStridedBatch<T>,
    beta: ScalarArg<'a, T>,
    y: &'a mut DeviceStridedBatch<T>,
) -> BlasResult<()> {
    let args = HbmvStridedBatched {
        uplo: arg.uplo,
        n: arg.n,
        k: arg.k,
        alpha: Some(alpha),
        a: Some(a),
        lda: arg.lda,
        stride_a: arg.stride_a,
        x: Some(x),
        incx: arg.incx,
        stride_x: arg.stride_x,
        beta: Some(beta),
        y: Some(y),
        incy: arg.incy,
        stride_y: arg.stride_y,
        batch_count: arg.batch_count,
    };
    dispatch(Some(handle), arg.api, args)
}

/// Full client run for one argument set.
pub fn testing_hbmv_strided_batched<T: BlasComplex>(arg: &Arguments) -> ClientResult<TestReport> {
    let mut handle = Handle::from_env();
    let routine = HbmvCall::routine_name::<T>(arg.api);

    // Early exits are exercised with every operand absent.
    if arg.quick_return() {
        let expected = if arg.invalid_size() {
            Status::InvalidSize
        } else {
            Status::Success
        };
        let args = HbmvStridedBatched::<T> {
            uplo: arg.uplo,
            n: arg.n,
            k: arg.k,
            alpha: None,
            a: None,
            lda: arg.lda,
            stride_a: arg.stride_a,
            x: None,
            incx: arg.incx,
            stride_x: arg.stride_x,
            beta: None,
            y: None,
            incy: arg.incy,
            stride_y: arg.stride_y,
            batch_count: arg.batch_count,
        };
        expect_status("quick return", expected, &dispatch(Some(&handle), arg.api, args))?;
        return Ok(TestReport {
            routine,
            quick_return: true,
            host_error: None,
            device_error: None,
            cpu_time_us: None,
            timing: None,
        });
    }

    let (n, k, lda, bc) = (arg.n as usize, arg.k as usize, arg.lda as usize, arg.batch_count);
    let (h_alpha, h_beta) = (arg.get_alpha::<T>(), arg.get_beta::<T>());

    let mut ha = HostStridedBatch::<T>::matrix(k + 1, n, lda, arg.stride_a, bc);
    let mut hx = HostStridedBatch::<T>::vector(n, arg.incx, arg.stride_x, bc);
    let mut hy = HostStridedBatch::<T>::vector(n, arg.incy, arg.stride_y, bc);
    ha.memcheck()?;
    hx.memcheck()?;
    hy.memcheck()?;

    let dev = handle.device().clone();
    let mut da = DeviceStridedBatch::new(&dev, *ha.layout());
    let mut dx = DeviceStridedBatch::new(&dev, *hx.layout());
    let mut dy = DeviceStridedBatch::new(&dev, *hy.layout());
    let mut d_alpha = DeviceVec::new(&dev, 1);
    let mut d_beta = DeviceVec::new(&dev, 1);
    da.memcheck()?;
    dx.memcheck()?;
    dy.memcheck()?;
    d_alpha.memcheck()?;
    d_beta.memcheck()?;

    let mut rng = SplitMix64::new(arg.seed);
    init_band_matrix(ha.data_mut(), &mut rng, h_alpha.is_zero());
    init_vector(hx.data_mut(), &mut rng, h_alpha.is_zero());
    init_vector(hy.data_mut(), &mut rng, h_beta.is_zero());
    let mut hy_gold = hy.clone();

    da.transfer_from(&ha)?;
    dx.transfer_from(&hx)?;
    dy.transfer_from(&hy)?;

    let mut report = TestReport {
        routine,
        quick_return: false,
        host_error: None,
        device_error: None,
        cpu_time_us: None,
        timing: None,
    };

    if arg.unit_check || arg.norm_check {
        let mut host_result = None;
        if arg.pointer_mode_host {
            handle.set_pointer_mode(PointerMode::Host);
            run_hbmv(&handle, arg, ScalarArg::Host(&h_alpha), &da, &dx, ScalarArg::Host(&h_beta), &mut dy)?;
            handle.synchronize()?;
            hy.transfer_from(&dy)?;
            host_result = Some(hy.clone());
        }

        let mut device_result = None;
        if arg.pointer_mode_device {
            handle.set_pointer_mode(PointerMode::Device);
            transfer::copy_host_to_device(&mut d_alpha, &[h_alpha])?;
            transfer::copy_host_to_device(&mut d_beta, &[h_beta])?;
            dy.transfer_from(&hy_gold)?;
            run_hbmv(&handle, arg, ScalarArg::Device(&d_alpha), &da, &dx, ScalarArg::Device(&d_beta), &mut dy)?;
            handle.synchronize()?;
            hy.transfer_from(&dy)?;
            device_result = Some(hy.clone());
        }

        // Both pointer modes run the same kernel on the same data.
        if let (Some(host), Some(device)) = (&host_result, &device_result) {
            bitwise_check_general(n, bc as usize, host, device)?;
        }

        let start = Instant::now();
        ref_hbmv_strided_batched(
            arg.uplo,
            n,
            k,
            h_alpha,
            ha.data(),
            lda,
            arg.stride_a,
            hx.data(),
            arg.incx,
            arg.stride_x,
            h_beta,
            hy_gold.data_mut(),
            arg.incy,
            arg.stride_y,
            bc as usize,
        );
        report.cpu_time_us = Some(start.elapsed().as_secs_f64() * 1e6);

        for (result, slot) in [
            (host_result, &mut report.host_error),
            (device_result, &mut report.device_error),
        ] {
            let Some(result) = result else { continue };
            if arg.unit_check {
                unit_check_general(n, bc as usize, &hy_gold, &result)?;
            }
            if arg.norm_check {
                let err = norm_check_general(n, bc as usize, &hy_gold, &result);
                if err.is_nan() || err > norm_tolerance::<T>() {
                    tracing::warn!(err, tolerance = norm_tolerance::<T>(), "norm check above tolerance");
                }
                *slot = Some(err);
            }
        }
    }

    if arg.timing {
        handle.set_pointer_mode(PointerMode::Host);
        let timing = time_calls(&handle, arg.cold_iters, arg.iters, || {
            run_hbmv(&handle, arg, ScalarArg::Host(&h_alpha), &da, &dx, ScalarArg::Host(&h_beta), &mut dy)
        })?;
        let bcf = bc as f64;
        report.timing = Some(TimingReport {
            gpu_time_us: timing.per_call_us(),
            gflops: timing.rate(hbmv_gflop_count::<T>(arg.n, arg.k) * bcf),
            gbytes_per_s: timing.rate(hbmv_gbyte_count::<T>(arg.n, arg.k) * bcf),
        });
    }

    tracing::info!(
        routine = %report.routine,
        uplo = %arg.uplo.letter(),
        n = arg.n,
        k = arg.k,
        batch_count = arg.batch_count,
        host_error = ?report.host_error,
        device_error = ?report.device_error,
        gpu_time_us = ?report.timing.as_ref().map(|t| t.gpu_time_us),
        "hbmv_strided_batched"
    );
    Ok(report)
}
