// BLAS call surfaces carry the full C argument list.
// Band kernels index packed arrays directly where iterators hurt readability.
#![allow(clippy::too_many_arguments, clippy::needless_range_loop)]

//! # numrus-blas
//!
//! Strided-batched Hermitian banded matrix-vector product
//! `y_b := alpha * A_b * x_b + beta * y_b`, `b = 0..batch_count`.
//!
//! - [`batch`]: strided batch containers and their addressing.
//! - [`scalar`]: `alpha`/`beta` as host values or device cells.
//! - [`arg_check`]: the validation gate, including the empty-problem and
//!   `alpha == 0` shortcuts.
//! - [`hbmv`]: 32-bit and 64-bit call surfaces and the run-time dispatcher.
//! - [`kernel`]: launch contract and the emulated kernel.
//! - [`observer`], [`handle`]: call observers, layer logging, configuration.
//! - [`bench`]: timing loop and throughput counts.
//!
//! ## Example
//!
//! ```
//! use num_complex::Complex64;
//! use numrus_blas::{hbmv_strided_batched, DeviceStridedBatch, Handle, HostStridedBatch, ScalarArg};
//! use numrus_core::Fill;
//!
//! let handle = Handle::new();
//! let dev = handle.device().clone();
//! let (n, k, lda, bc) = (3usize, 1usize, 2usize, 2i64);
//!
//! // Identity band, upper storage: the diagonal sits in row k.
//! let mut ha = HostStridedBatch::<Complex64>::matrix(lda, n, lda, (lda * n) as i64, bc);
//! for b in 0..bc as usize {
//!     for j in 0..n {
//!         ha.batch_mut(b)[k + j * lda] = Complex64::new(1.0, 0.0);
//!     }
//! }
//! let mut hx = HostStridedBatch::<Complex64>::vector(n, 1, n as i64, bc);
//! hx.data_mut().fill(Complex64::new(2.0, 1.0));
//!
//! let mut a = DeviceStridedBatch::new(&dev, *ha.layout());
//! let mut x = DeviceStridedBatch::new(&dev, *hx.layout());
//! let mut y = DeviceStridedBatch::<Complex64>::vector(&dev, n, 1, n as i64, bc);
//! a.transfer_from(&ha).unwrap();
//! x.transfer_from(&hx).unwrap();
//!
//! let (alpha, beta) = (Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0));
//! hbmv_strided_batched(
//!     Some(&handle), Fill::Upper, n as i32, k as i32,
//!     Some(ScalarArg::Host(&alpha)), Some(&a), lda as i32, (lda * n) as i64,
//!     Some(&x), 1, n as i64,
//!     Some(ScalarArg::Host(&beta)), Some(&mut y), 1, n as i64, bc as i32,
//! ).unwrap();
//! handle.synchronize().unwrap();
//!
//! let mut hy = HostStridedBatch::<Complex64>::vector(n, 1, n as i64, bc);
//! hy.transfer_from(&y).unwrap();
//! assert!(hy.data().iter().all(|v| *v == Complex64::new(2.0, 1.0)));
//! ```

pub mod arg_check;
pub mod batch;
pub mod bench;
pub mod handle;
pub mod hbmv;
pub mod kernel;
pub mod observer;
pub mod scalar;

pub use arg_check::{hbmv_arg_check, BufferPresence, HbmvShape, Validation};
pub use batch::{AllocError, BatchLayout, DeviceStridedBatch, HostStridedBatch};
pub use bench::{hbmv_gbyte_count, hbmv_gflop_count, time_calls, Timing};
pub use handle::{Handle, HandleConfig};
pub use hbmv::{dispatch, dispatch_with_kernel, hbmv_strided_batched, hbmv_strided_batched_64, HbmvStridedBatched};
pub use kernel::{EmulatedHbmvKernel, HbmvKernel, HbmvLaunch};
pub use observer::{CallObserver, HbmvCall, LayerMode, LayerObserver, NoopObserver, ScalarLog};
pub use scalar::{ResolvedScalar, ScalarArg};

// Re-export shared enums and status for convenience
pub use numrus_core::{BlasComplex, BlasError, BlasResult, Fill, IndexWidth, PointerMode, Status};
