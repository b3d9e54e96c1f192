//! Result comparisons over the logical elements of strided vector batches.
//! Padding between elements is never compared.

use numrus_blas::{BlasComplex, HostStridedBatch};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckError {
    #[error("batch {batch}, element {index}: expected {expected}, got {actual}")]
    Mismatch {
        batch: usize,
        index: usize,
        expected: String,
        actual: String,
    },
}

/// Per-element tolerance: a few ulps of the magnitude.
fn close<T: BlasComplex>(expected: T, actual: T) -> bool {
    let diff = (expected - actual).abs_f64();
    diff <= 4.0 * T::EPSILON * expected.abs_f64().max(1.0)
}

/// Elementwise comparison of `n` logical elements per batch.
pub fn unit_check_general<T: BlasComplex>(
    n: usize,
    batch_count: usize,
    expected: &HostStridedBatch<T>,
    actual: &HostStridedBatch<T>,
) -> Result<(), CheckError> {
    let layout = expected.layout();
    for b in 0..batch_count {
        for i in 0..n {
            let off = layout.element_offset(b, i);
            let (e, a) = (expected.data()[off], actual.data()[off]);
            if !close(e, a) {
                return Err(CheckError::Mismatch {
                    batch: b,
                    index: i,
                    expected: format!("{e:?}"),
                    actual: format!("{a:?}"),
                });
            }
        }
    }
    Ok(())
}

/// Exact comparison: real and imaginary parts must match bit for bit.
pub fn bitwise_check_general<T: BlasComplex>(
    n: usize,
    batch_count: usize,
    expected: &HostStridedBatch<T>,
    actual: &HostStridedBatch<T>,
) -> Result<(), CheckError> {
    let layout = expected.layout();
    let bits = |v: T| (v.re_f64().to_bits(), v.im_f64().to_bits());
    for b in 0..batch_count {
        for i in 0..n {
            let off = layout.element_offset(b, i);
            let (e, a) = (expected.data()[off], actual.data()[off]);
            if bits(e) != bits(a) {
                return Err(CheckError::Mismatch {
                    batch: b,
                    index: i,
                    expected: format!("{e:?}"),
                    actual: format!("{a:?}"),
                });
            }
        }
    }
    Ok(())
}

/// Relative Frobenius error `|E - A|_F / |E|_F`, maximum over batches.
///
/// A zero reference norm falls back to the absolute error.
pub fn norm_check_general<T: BlasComplex>(
    n: usize,
    batch_count: usize,
    expected: &HostStridedBatch<T>,
    actual: &HostStridedBatch<T>,
) -> f64 {
    let layout = expected.layout();
    let mut worst = 0.0f64;
    for b in 0..batch_count {
        let (mut diff2, mut ref2) = (0.0f64, 0.0f64);
        for i in 0..n {
            let off = layout.element_offset(b, i);
            let (e, a) = (expected.data()[off], actual.data()[off]);
            diff2 += (e - a).abs_f64().powi(2);
            ref2 += e.abs_f64().powi(2);
        }
        let err = if ref2 > 0.0 {
            (diff2 / ref2).sqrt()
        } else {
            diff2.sqrt()
        };
        // NaN must not compare away.
        if err.is_nan() {
            return f64::NAN;
        }
        worst = worst.max(err);
    }
    worst
}

/// Acceptable [`norm_check_general`] result for element type `T`.
pub fn norm_tolerance<T: BlasComplex>() -> f64 {
    T::EPSILON * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn batch(values: &[Complex64], inc: i64, stride: i64, bc: i64) -> HostStridedBatch<Complex64> {
        let n = values.len();
        let mut h = HostStridedBatch::vector(n, inc, stride, bc);
        let layout = *h.layout();
        for b in 0..bc as usize {
            for (i, v) in values.iter().enumerate() {
                h.data_mut()[layout.element_offset(b, i)] = *v;
            }
        }
        h
    }

    #[test]
    fn test_unit_check_reports_first_mismatch() {
        let vals = [Complex64::new(1.0, 0.0), Complex64::new(2.0, 2.0)];
        let e = batch(&vals, 2, 4, 2);
        let mut a = e.clone();
        assert!(unit_check_general(2, 2, &e, &a).is_ok());
        let off = a.layout().element_offset(1, 1);
        a.data_mut()[off] = Complex64::new(2.0, 2.5);
        match unit_check_general(2, 2, &e, &a) {
            Err(CheckError::Mismatch { batch, index, .. }) => assert_eq!((batch, index), (1, 1)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_padding_is_ignored() {
        let vals = [Complex64::new(1.0, 0.0); 3];
        let e = batch(&vals, -2, 8, 2);
        let mut a = e.clone();
        a.data_mut()[1] = Complex64::new(f64::NAN, 0.0);
        assert!(unit_check_general(3, 2, &e, &a).is_ok());
        assert_eq!(norm_check_general(3, 2, &e, &a), 0.0);
    }

    #[test]
    fn test_bitwise_check_is_exact() {
        let vals = [Complex64::new(1.0, 0.0), Complex64::new(0.0, -2.0)];
        let e = batch(&vals, 1, 2, 2);
        let mut a = e.clone();
        assert!(bitwise_check_general(2, 2, &e, &a).is_ok());
        // Within the unit-check tolerance, but not identical.
        a.data_mut()[3] = Complex64::new(0.0, f64::from_bits((-2.0f64).to_bits() + 1));
        assert!(unit_check_general(2, 2, &e, &a).is_ok());
        match bitwise_check_general(2, 2, &e, &a) {
            Err(CheckError::Mismatch { batch, index, .. }) => assert_eq!((batch, index), (1, 1)),
            other => panic!("unexpected {other:?}"),
        }
        // Signed zeros differ bitwise.
        let mut z = e.clone();
        z.data_mut()[0] = Complex64::new(1.0, -0.0);
        assert!(bitwise_check_general(2, 2, &e, &z).is_err());
    }

    #[test]
    fn test_norm_error_is_relative_and_nan_aware() {
        let e = batch(&[Complex64::new(3.0, 4.0)], 1, 1, 1);
        let a = batch(&[Complex64::new(3.0, 4.5)], 1, 1, 1);
        assert!((norm_check_general(1, 1, &e, &a) - 0.1).abs() < 1e-12);
        let bad = batch(&[Complex64::new(f64::NAN, 0.0)], 1, 1, 1);
        assert!(norm_check_general(1, 1, &e, &bad).is_nan());
        assert!(unit_check_general(1, 1, &e, &bad).is_err());
    }
}
