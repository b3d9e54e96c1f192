//! Call observers.
//!
//! The dispatcher reports every call at three points: before validation,
//! before the kernel launch and after the call settles. [`NoopObserver`] is
//! the default. [`LayerObserver`] emits trace, bench-replay and profile
//! records through `tracing`, selected by a [`LayerMode`] bitmask.

use crate::scalar::ScalarArg;
use numrus_core::{BlasComplex, Fill, IndexWidth, PointerMode, Status};

/// Scalar as it appears in logs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarLog {
    Value { re: f64, im: f64 },
    Device,
    Absent,
}

impl ScalarLog {
    pub fn of<T: BlasComplex>(arg: Option<&ScalarArg<'_, T>>) -> Self {
        match arg {
            None => ScalarLog::Absent,
            Some(ScalarArg::Host(v)) => ScalarLog::Value {
                re: v.re_f64(),
                im: v.im_f64(),
            },
            Some(ScalarArg::Device(_)) => ScalarLog::Device,
        }
    }
}

impl std::fmt::Display for ScalarLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarLog::Value { re, im } => write!(f, "({re},{im})"),
            ScalarLog::Device => f.write_str("device"),
            ScalarLog::Absent => f.write_str("null"),
        }
    }
}

/// Everything an observer may record about one call.
#[derive(Debug, Clone, PartialEq)]
pub struct HbmvCall {
    pub routine: String,
    pub precision: &'static str,
    pub width: IndexWidth,
    pub pointer_mode: PointerMode,
    pub uplo: Fill,
    pub n: i64,
    pub k: i64,
    pub alpha: ScalarLog,
    pub lda: i64,
    pub stride_a: i64,
    pub incx: i64,
    pub stride_x: i64,
    pub beta: ScalarLog,
    pub incy: i64,
    pub stride_y: i64,
    pub batch_count: i64,
}

impl HbmvCall {
    /// `numrus_chbmv_strided_batched` / `numrus_zhbmv_strided_batched_64`.
    pub fn routine_name<T: BlasComplex>(width: IndexWidth) -> String {
        let suffix = match width {
            IndexWidth::Int32 => "",
            IndexWidth::Int64 => "_64",
        };
        format!("numrus_{}hbmv_strided_batched{}", T::PREFIX, suffix)
    }

    /// Comma-separated argument record.
    pub fn trace_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            self.routine,
            self.uplo.letter(),
            self.n,
            self.k,
            self.alpha,
            self.lda,
            self.stride_a,
            self.incx,
            self.stride_x,
            self.beta,
            self.incy,
            self.stride_y,
            self.batch_count,
            match self.pointer_mode {
                PointerMode::Host => "host",
                PointerMode::Device => "device",
            },
        )
    }

    /// Replayable bench command line. `None` unless both scalars are host values.
    pub fn bench_command(&self) -> Option<String> {
        let (
            ScalarLog::Value { re: ar, im: ai },
            ScalarLog::Value { re: br, im: bi },
        ) = (self.alpha, self.beta)
        else {
            return None;
        };
        let api = match self.width {
            IndexWidth::Int32 => "",
            IndexWidth::Int64 => " --api C64",
        };
        Some(format!(
            "numrus-bench -f hbmv_strided_batched -r {} --uplo {} -n {} -k {} --alpha {} --alphai {} \
             --lda {} --stride_a {} --incx {} --stride_x {} --beta {} --betai {} --incy {} \
             --stride_y {} --batch_count {}{}",
            self.precision,
            self.uplo.letter(),
            self.n,
            self.k,
            ar,
            ai,
            self.lda,
            self.stride_a,
            self.incx,
            self.stride_x,
            br,
            bi,
            self.incy,
            self.stride_y,
            self.batch_count,
            api,
        ))
    }
}

/// Hooks invoked by the dispatcher. All default to no-ops.
pub trait CallObserver: Send + Sync {
    fn pre_validate(&self, _call: &HbmvCall) {}
    fn pre_dispatch(&self, _call: &HbmvCall) {}
    fn post_dispatch(&self, _call: &HbmvCall, _status: Status) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl CallObserver for NoopObserver {}

/// Bitmask selecting log records: 1 = trace, 2 = bench, 4 = profile.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LayerMode(pub u32);

impl LayerMode {
    pub const NONE: LayerMode = LayerMode(0);
    pub const TRACE: LayerMode = LayerMode(1);
    pub const BENCH: LayerMode = LayerMode(2);
    pub const PROFILE: LayerMode = LayerMode(4);

    #[inline]
    pub fn contains(self, other: LayerMode) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for LayerMode {
    type Output = LayerMode;
    fn bitor(self, rhs: LayerMode) -> LayerMode {
        LayerMode(self.0 | rhs.0)
    }
}

/// Emits layer-mode records through `tracing` under target `numrus::layer`.
#[derive(Debug, Clone, Copy)]
pub struct LayerObserver {
    mode: LayerMode,
}

impl LayerObserver {
    pub fn new(mode: LayerMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> LayerMode {
        self.mode
    }
}

impl CallObserver for LayerObserver {
    fn pre_validate(&self, call: &HbmvCall) {
        if self.mode.contains(LayerMode::TRACE) {
            tracing::info!(target: "numrus::layer", kind = "trace", "{}", call.trace_line());
        }
        if self.mode.contains(LayerMode::BENCH) {
            if let Some(cmd) = call.bench_command() {
                tracing::info!(target: "numrus::layer", kind = "bench", "{}", cmd);
            }
        }
        if self.mode.contains(LayerMode::PROFILE) {
            tracing::info!(
                target: "numrus::layer",
                kind = "profile",
                routine = %call.routine,
                uplo = %call.uplo.letter(),
                n = call.n,
                k = call.k,
                lda = call.lda,
                stride_a = call.stride_a,
                incx = call.incx,
                stride_x = call.stride_x,
                incy = call.incy,
                stride_y = call.stride_y,
                batch_count = call.batch_count,
            );
        }
    }

    fn pre_dispatch(&self, call: &HbmvCall) {
        tracing::trace!(target: "numrus::layer", routine = %call.routine, "launching");
    }

    fn post_dispatch(&self, call: &HbmvCall, status: Status) {
        tracing::debug!(target: "numrus::layer", routine = %call.routine, %status, "settled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::{Complex32, Complex64};

    fn sample(alpha: ScalarLog, width: IndexWidth) -> HbmvCall {
        HbmvCall {
            routine: HbmvCall::routine_name::<Complex32>(width),
            precision: "f32_c",
            width,
            pointer_mode: PointerMode::Host,
            uplo: Fill::Upper,
            n: 100,
            k: 5,
            alpha,
            lda: 100,
            stride_a: 10_000,
            incx: 1,
            stride_x: 100,
            beta: ScalarLog::Value { re: 2.0, im: 0.0 },
            incy: 1,
            stride_y: 100,
            batch_count: 2,
        }
    }

    #[test]
    fn test_routine_names() {
        assert_eq!(
            HbmvCall::routine_name::<Complex32>(IndexWidth::Int32),
            "numrus_chbmv_strided_batched"
        );
        assert_eq!(
            HbmvCall::routine_name::<Complex64>(IndexWidth::Int64),
            "numrus_zhbmv_strided_batched_64"
        );
    }

    #[test]
    fn test_bench_command_for_host_scalars() {
        let call = sample(ScalarLog::Value { re: 1.0, im: 0.5 }, IndexWidth::Int64);
        let cmd = call.bench_command().unwrap();
        assert!(cmd.starts_with("numrus-bench -f hbmv_strided_batched -r f32_c --uplo U -n 100 -k 5"));
        assert!(cmd.contains("--alpha 1 --alphai 0.5"));
        assert!(cmd.contains("--stride_a 10000"));
        assert!(cmd.ends_with("--batch_count 2 --api C64"));
    }

    #[test]
    fn test_no_bench_command_for_device_scalars() {
        let call = sample(ScalarLog::Device, IndexWidth::Int32);
        assert!(call.bench_command().is_none());
        assert!(call.trace_line().contains(",device,"));
    }

    #[test]
    fn test_layer_mode_bits() {
        let mode = LayerMode::TRACE | LayerMode::PROFILE;
        assert!(mode.contains(LayerMode::TRACE));
        assert!(!mode.contains(LayerMode::BENCH));
        assert!(!mode.contains(LayerMode::NONE));
        assert!(LayerMode::default().is_empty());
    }

    #[test]
    fn test_scalar_log_of() {
        let v = Complex64::new(-1.0, 2.0);
        assert_eq!(
            ScalarLog::of(Some(&ScalarArg::Host(&v))),
            ScalarLog::Value { re: -1.0, im: 2.0 }
        );
        assert_eq!(ScalarLog::of::<Complex64>(None), ScalarLog::Absent);
        assert_eq!(ScalarLog::Absent.to_string(), "null");
    }
}
