//! Test data.
//!
//! Values are small integers so every product in the routine and in the
//! oracle is exact in single precision. Operands that a zero scalar must
//! annihilate are filled with NaN instead, so an implementation that reads
//! them anyway is caught.

use numrus_blas::BlasComplex;
use numrus_core::SplitMix64;

/// Random integer in `[lo, hi]` for both parts.
pub fn random_int<T: BlasComplex>(rng: &mut SplitMix64, lo: i64, hi: i64) -> T {
    let re = rng.gen_range_i64(lo, hi) as f64;
    let im = rng.gen_range_i64(lo, hi) as f64;
    T::from_f64_parts(re, im)
}

pub fn nan<T: BlasComplex>() -> T {
    T::from_f64_parts(f64::NAN, f64::NAN)
}

/// Fill every element, padding included.
pub fn fill_random<T: BlasComplex>(data: &mut [T], rng: &mut SplitMix64) {
    for v in data.iter_mut() {
        *v = random_int(rng, -4, 4);
    }
}

/// Band storage for `A` (or NaN when `alpha == 0`).
///
/// The whole buffer is random, so the diagonal carries a nonzero imaginary
/// part that the routine must ignore.
pub fn init_band_matrix<T: BlasComplex>(data: &mut [T], rng: &mut SplitMix64, alpha_sets_nan: bool) {
    if alpha_sets_nan {
        data.fill(nan());
    } else {
        fill_random(data, rng);
    }
}

/// `x` (NaN when `alpha == 0`) or `y` (NaN when `beta == 0`).
pub fn init_vector<T: BlasComplex>(data: &mut [T], rng: &mut SplitMix64, sets_nan: bool) {
    if sets_nan {
        data.fill(nan());
    } else {
        fill_random(data, rng);
    }
}
