//! Timing loop and throughput counts.
//!
//! Warm-up calls run untimed. The timed window opens after a stream
//! synchronisation and closes after another, so it brackets exactly the
//! timed iterations. Argument marshalling (including any transfer of
//! device scalars) belongs before the call to [`time_calls`].

use crate::handle::Handle;
use numrus_core::{BlasComplex, BlasResult};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub iters: usize,
    pub elapsed: Duration,
}

impl Timing {
    /// Mean wall time per timed call in microseconds.
    pub fn per_call_us(&self) -> f64 {
        if self.iters == 0 {
            return 0.0;
        }
        self.elapsed.as_secs_f64() * 1e6 / self.iters as f64
    }

    /// Rate given a per-call count in units of 1e9 (GFLOP or GB).
    pub fn rate(&self, giga_per_call: f64) -> f64 {
        let us = self.per_call_us();
        if us == 0.0 {
            return 0.0;
        }
        giga_per_call / (us * 1e-6)
    }
}

/// Call `f` `cold_iters` times untimed, then `iters` times timed.
///
/// The first failure aborts the loop and is returned.
pub fn time_calls<F>(handle: &Handle, cold_iters: usize, iters: usize, mut f: F) -> BlasResult<Timing>
where
    F: FnMut() -> BlasResult<()>,
{
    for _ in 0..cold_iters {
        f()?;
    }
    handle.synchronize()?;

    let start = Instant::now();
    for _ in 0..iters {
        f()?;
    }
    handle.synchronize()?;
    let elapsed = start.elapsed();

    tracing::debug!(cold_iters, iters, elapsed_us = elapsed.as_micros() as u64, "timed loop");
    Ok(Timing { iters, elapsed })
}

/// Effective band width: `min(k, n - 1)`.
fn band(n: i64, k: i64) -> f64 {
    k.min(n - 1).max(0) as f64
}

/// Floating point work of one product, in GFLOP.
///
/// Complex multiply-add is 8 real flops; the `alpha`/`beta` scaling adds 14
/// per output element.
pub fn hbmv_gflop_count<T: BlasComplex>(n: i64, k: i64) -> f64 {
    let nf = n as f64;
    let k1 = band(n, k);
    let stored = (2.0 * k1 + 1.0) * nf - k1 * (k1 + 1.0);
    (8.0 * stored + 14.0 * nf) / 1e9
}

/// Memory traffic of one product, in GB: the stored band, `x`, and `y`
/// read and written.
pub fn hbmv_gbyte_count<T: BlasComplex>(n: i64, k: i64) -> f64 {
    let nf = n as f64;
    let k1 = band(n, k);
    let band_elems = (k1 + 1.0) * nf - k1 * (k1 + 1.0) / 2.0;
    std::mem::size_of::<T>() as f64 * (band_elems + 3.0 * nf) / 1e9
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::{Complex32, Complex64};
    use numrus_core::{BlasError, Status};

    #[test]
    fn test_cold_and_timed_iterations_counted() {
        let handle = Handle::new();
        let mut calls = 0;
        let t = time_calls(&handle, 2, 5, || {
            calls += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(calls, 7);
        assert_eq!(t.iters, 5);
    }

    #[test]
    fn test_failure_stops_loop() {
        let handle = Handle::new();
        let mut calls = 0;
        let r = time_calls(&handle, 1, 10, || {
            calls += 1;
            if calls == 3 {
                Err(BlasError::Internal("boom".into()))
            } else {
                Ok(())
            }
        });
        assert_eq!(Status::of(&r), Status::InternalError);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_deferred_fault_fails_timing() {
        let handle = Handle::new();
        let r = time_calls(&handle, 0, 1, || {
            handle.stream().inject_fault("ecc");
            Ok(())
        });
        assert_eq!(Status::of(&r), Status::InternalError);
    }

    #[test]
    fn test_counts() {
        // Diagonal matrix: n stored elements.
        assert!((hbmv_gflop_count::<Complex32>(10, 0) - 22.0 * 10.0 / 1e9).abs() < 1e-18);
        // k beyond n clamps to a dense Hermitian matrix.
        assert_eq!(hbmv_gflop_count::<Complex64>(4, 9), hbmv_gflop_count::<Complex64>(4, 3));
        let gb32 = hbmv_gbyte_count::<Complex32>(100, 5);
        let gb64 = hbmv_gbyte_count::<Complex64>(100, 5);
        assert!((gb64 - 2.0 * gb32).abs() < 1e-15);
        assert_eq!(hbmv_gbyte_count::<Complex64>(0, 3), 0.0);
    }

    #[test]
    fn test_rates() {
        let t = Timing {
            iters: 4,
            elapsed: Duration::from_millis(2),
        };
        assert!((t.per_call_us() - 500.0).abs() < 1e-9);
        assert!((t.rate(1e-3) - 2.0).abs() < 1e-9);
    }
}
