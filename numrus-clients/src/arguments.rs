//! Problem description for one client run.

use crate::error::ClientResult;
use numrus_blas::{BlasComplex, Fill, IndexWidth};
use serde::Deserialize;

/// Sizes, scalars and run options. Missing JSON fields take the defaults
/// of [`Arguments::default`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Arguments {
    pub uplo: Fill,
    pub n: i64,
    pub k: i64,
    pub lda: i64,
    pub incx: i64,
    pub incy: i64,
    pub stride_a: i64,
    pub stride_x: i64,
    pub stride_y: i64,
    pub batch_count: i64,
    pub alpha: f64,
    pub alphai: f64,
    pub beta: f64,
    pub betai: f64,
    pub api: IndexWidth,
    pub unit_check: bool,
    pub norm_check: bool,
    pub timing: bool,
    pub cold_iters: usize,
    pub iters: usize,
    pub pointer_mode_host: bool,
    pub pointer_mode_device: bool,
    pub seed: u64,
}

impl Default for Arguments {
    fn default() -> Self {
        Self {
            uplo: Fill::Upper,
            n: 100,
            k: 5,
            lda: 100,
            incx: 1,
            incy: 1,
            stride_a: 10_000,
            stride_x: 100,
            stride_y: 100,
            batch_count: 2,
            alpha: 1.0,
            alphai: 0.0,
            beta: 2.0,
            betai: 0.0,
            api: IndexWidth::Int32,
            unit_check: true,
            norm_check: true,
            timing: false,
            cold_iters: 2,
            iters: 10,
            pointer_mode_host: true,
            pointer_mode_device: true,
            seed: 0x5eed,
        }
    }
}

impl Arguments {
    pub fn from_json(json: &str) -> ClientResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn get_alpha<T: BlasComplex>(&self) -> T {
        T::from_f64_parts(self.alpha, self.alphai)
    }

    pub fn get_beta<T: BlasComplex>(&self) -> T {
        T::from_f64_parts(self.beta, self.betai)
    }

    /// Mirrors the size check of the routine itself.
    pub fn invalid_size(&self) -> bool {
        self.n < 0
            || self.k < 0
            || self.lda <= self.k
            || self.incx == 0
            || self.incy == 0
            || self.batch_count < 0
    }

    /// Problems whose only possible outcome is an early status.
    pub fn quick_return(&self) -> bool {
        self.invalid_size() || self.n == 0 || self.batch_count == 0
    }
}
