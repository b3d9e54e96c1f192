//! Complex element types for the Hermitian routines.
//!
//! Hermitian kernels only make sense over complex numbers, so the generic
//! routines are parameterised over [`BlasComplex`], implemented for
//! `Complex32` (`c` routines) and `Complex64` (`z` routines).

use num_complex::{Complex32, Complex64};
use std::fmt::Debug;
use std::ops::{Add, AddAssign, Mul, Sub};

/// Element trait for complex BLAS routines.
pub trait BlasComplex:
    Copy
    + Debug
    + Default
    + PartialEq
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + AddAssign
    + 'static
{
    /// Precision tag used in bench command lines (`f32_c`, `f64_c`).
    const PRECISION: &'static str;
    /// Routine name prefix (`c`, `z`).
    const PREFIX: char;
    /// Machine epsilon of the underlying real type.
    const EPSILON: f64;

    fn zero() -> Self;
    fn one() -> Self;
    fn conj(self) -> Self;
    /// Same value with the imaginary part dropped.
    fn real_part(self) -> Self;
    fn from_f64_parts(re: f64, im: f64) -> Self;
    fn re_f64(self) -> f64;
    fn im_f64(self) -> f64;

    #[inline]
    fn abs_f64(self) -> f64 {
        self.re_f64().hypot(self.im_f64())
    }

    #[inline]
    fn is_zero(self) -> bool {
        self == Self::zero()
    }

    #[inline]
    fn is_one(self) -> bool {
        self == Self::one()
    }
}

macro_rules! impl_blas_complex {
    ($ty:ty, $real:ty, $precision:literal, $prefix:literal) => {
        impl BlasComplex for $ty {
            const PRECISION: &'static str = $precision;
            const PREFIX: char = $prefix;
            const EPSILON: f64 = <$real>::EPSILON as f64;

            #[inline(always)]
            fn zero() -> Self {
                <$ty>::new(0.0, 0.0)
            }

            #[inline(always)]
            fn one() -> Self {
                <$ty>::new(1.0, 0.0)
            }

            #[inline(always)]
            fn conj(self) -> Self {
                <$ty>::conj(&self)
            }

            #[inline(always)]
            fn real_part(self) -> Self {
                <$ty>::new(self.re, 0.0)
            }

            #[inline(always)]
            fn from_f64_parts(re: f64, im: f64) -> Self {
                <$ty>::new(re as $real, im as $real)
            }

            #[inline(always)]
            fn re_f64(self) -> f64 {
                self.re as f64
            }

            #[inline(always)]
            fn im_f64(self) -> f64 {
                self.im as f64
            }
        }
    };
}

impl_blas_complex!(Complex32, f32, "f32_c", 'c');
impl_blas_complex!(Complex64, f64, "f64_c", 'z');
