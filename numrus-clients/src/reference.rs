//! CPU oracle.
//!
//! Column-oriented evaluation in the classic reference-BLAS order: each
//! stored column updates a slice of `y` and accumulates its conjugate
//! contribution. The routine under test evaluates row by row. Offsets are
//! computed here with reference-BLAS start indices (`kx`, `ky`) and signed
//! steps, independently of the library's addressing helpers.

use numrus_blas::{BlasComplex, Fill};

/// Start index of a vector of length `n` with increment `inc`.
fn start(n: usize, inc: i64) -> i64 {
    if inc > 0 {
        0
    } else {
        -((n as i64) - 1) * inc
    }
}

/// `y := alpha * A * x + beta * y` for one instance.
///
/// Slices start at the instance's base; negative increments address from
/// the far end.
pub fn ref_hbmv<T: BlasComplex>(
    uplo: Fill,
    n: usize,
    k: usize,
    alpha: T,
    a: &[T],
    lda: usize,
    x: &[T],
    incx: i64,
    beta: T,
    y: &mut [T],
    incy: i64,
) {
    if n == 0 || (alpha.is_zero() && beta.is_one()) {
        return;
    }
    let (kx, ky) = (start(n, incx), start(n, incy));
    let xi = |i: usize| (kx + i as i64 * incx) as usize;
    let yi = |i: usize| (ky + i as i64 * incy) as usize;

    if !beta.is_one() {
        for i in 0..n {
            y[yi(i)] = if beta.is_zero() { T::zero() } else { beta * y[yi(i)] };
        }
    }
    if alpha.is_zero() {
        return;
    }

    if uplo == Fill::Upper {
        for j in 0..n {
            let temp1 = alpha * x[xi(j)];
            let mut temp2 = T::zero();
            let col = &a[j * lda..];
            for i in j.saturating_sub(k)..j {
                let aij = col[k + i - j];
                y[yi(i)] += temp1 * aij;
                temp2 += aij.conj() * x[xi(i)];
            }
            y[yi(j)] += temp1 * col[k].real_part() + alpha * temp2;
        }
    } else {
        for j in 0..n {
            let temp1 = alpha * x[xi(j)];
            let mut temp2 = T::zero();
            let col = &a[j * lda..];
            y[yi(j)] += temp1 * col[0].real_part();
            for i in j + 1..n.min(j + k + 1) {
                let aij = col[i - j];
                y[yi(i)] += temp1 * aij;
                temp2 += aij.conj() * x[xi(i)];
            }
            y[yi(j)] += alpha * temp2;
        }
    }
}

/// [`ref_hbmv`] over every instance of whole strided buffers, in batch order.
///
/// With a negative stride the last instance sits at the start of the buffer.
pub fn ref_hbmv_strided_batched<T: BlasComplex>(
    uplo: Fill,
    n: usize,
    k: usize,
    alpha: T,
    a: &[T],
    lda: usize,
    stride_a: i64,
    x: &[T],
    incx: i64,
    stride_x: i64,
    beta: T,
    y: &mut [T],
    incy: i64,
    stride_y: i64,
    batch_count: usize,
) {
    let last = batch_count as i64 - 1;
    let base = |b: usize, stride: i64| {
        let b = b as i64;
        (if stride < 0 { (b - last) * stride } else { b * stride }) as usize
    };
    for b in 0..batch_count {
        ref_hbmv(
            uplo,
            n,
            k,
            alpha,
            &a[base(b, stride_a)..],
            lda,
            &x[base(b, stride_x)..],
            incx,
            beta,
            &mut y[base(b, stride_y)..],
            incy,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    // A = [[2, 1+i, 0], [1-i, 3, -i], [0, i, 1]], x = [1, 1, 1]
    const EXPECTED: [(f64, f64); 3] = [(3.0, 1.0), (4.0, -2.0), (1.0, 1.0)];

    #[test]
    fn test_upper_and_lower_agree() {
        let x = [c(1.0, 0.0); 3];
        let upper = [
            c(0.0, 0.0),
            c(2.0, 7.0),
            c(1.0, 1.0),
            c(3.0, 0.0),
            c(0.0, -1.0),
            c(1.0, 0.0),
        ];
        let lower = [
            c(2.0, 0.0),
            c(1.0, -1.0),
            c(3.0, -2.0),
            c(0.0, 1.0),
            c(1.0, 0.0),
            c(0.0, 0.0),
        ];
        for (uplo, ab) in [(Fill::Upper, upper), (Fill::Lower, lower)] {
            let mut y = [c(0.0, 0.0); 3];
            ref_hbmv(uplo, 3, 1, c(1.0, 0.0), &ab, 2, &x, 1, c(0.0, 0.0), &mut y, 1);
            let expected: Vec<Complex64> = EXPECTED.iter().map(|&(re, im)| c(re, im)).collect();
            assert_eq!(y.to_vec(), expected, "{uplo:?}");
        }
    }

    #[test]
    fn test_alpha_zero_scales_only() {
        let mut y = [c(1.0, 2.0), c(3.0, 0.0)];
        ref_hbmv(Fill::Lower, 2, 0, c(0.0, 0.0), &[], 1, &[], 1, c(0.0, 1.0), &mut y, 1);
        assert_eq!(y, [c(-2.0, 1.0), c(0.0, 3.0)]);
    }

    #[test]
    fn test_negative_stride_puts_last_batch_first() {
        // Two 1x1 batches: A = [2], [3]; x = [1], [1]; stride -1.
        let ab = [c(3.0, 0.0), c(2.0, 0.0)];
        let x = [c(1.0, 0.0), c(1.0, 0.0)];
        let mut y = [c(0.0, 0.0); 2];
        ref_hbmv_strided_batched(
            Fill::Lower, 1, 0, c(1.0, 0.0), &ab, 1, -1, &x, 1, 1, c(0.0, 0.0), &mut y, 1, -1, 2,
        );
        // Batch 0 sits at offset 1 of A and y.
        assert_eq!(y, [c(3.0, 0.0), c(2.0, 0.0)]);
        let mut y = [c(0.0, 0.0); 2];
        ref_hbmv_strided_batched(
            Fill::Lower, 1, 0, c(1.0, 0.0), &ab, 1, -1, &x, 1, 1, c(0.0, 0.0), &mut y, 1, 1, 2,
        );
        // y positive stride: batch 0 (A = 2) written first.
        assert_eq!(y, [c(2.0, 0.0), c(3.0, 0.0)]);
    }

    #[test]
    fn test_negative_increment() {
        // diag(1, 2), x stored reversed.
        let ab = [c(1.0, 0.0), c(2.0, 0.0)];
        let x = [c(5.0, 0.0), c(7.0, 0.0)];
        let mut y = [c(0.0, 0.0); 2];
        ref_hbmv(Fill::Upper, 2, 0, c(1.0, 0.0), &ab, 1, &x, -1, c(0.0, 0.0), &mut y, 1);
        assert_eq!(y, [c(7.0, 0.0), c(10.0, 0.0)]);
    }
}
