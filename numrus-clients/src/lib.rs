//! # numrus-clients
//!
//! Test and benchmark client for `numrus-blas`.
//!
//! - [`Arguments`]: one problem description, loadable from JSON.
//! - [`init`]: reproducible integer-valued test data.
//! - [`reference`]: CPU oracle.
//! - [`check`]: elementwise and Frobenius-norm comparisons.
//! - [`testing`]: the bad-argument matrix and the correctness/timing run.

pub mod arguments;
pub mod check;
pub mod error;
pub mod init;
pub mod reference;
pub mod testing;

pub use arguments::Arguments;
pub use check::{bitwise_check_general, norm_check_general, unit_check_general, CheckError};
pub use error::{ClientError, ClientResult};
pub use reference::{ref_hbmv, ref_hbmv_strided_batched};
pub use testing::{testing_hbmv_strided_batched, testing_hbmv_strided_batched_bad_arg, TestReport, TimingReport};

/// Route `tracing` output to the test harness. `RUST_LOG` filters; safe to
/// call from every test.
pub fn init_test_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
