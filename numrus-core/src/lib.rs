//! # Numrus Core
//!
//! Shared building blocks for the numrus batched BLAS crates:
//! - **Layout enums**: fill mode, pointer mode and call-surface index width.
//! - **Element trait**: [`BlasComplex`] over `Complex32` / `Complex64`.
//! - **Status**: [`BlasError`] taxonomy and the flat [`Status`] code.
//! - **Parallel execution**: scoped-thread helper for independent batches.
//! - **RNG**: [`SplitMix64`] for reproducible test data.

pub mod element;
pub mod layout;
pub mod parallel;
pub mod rng;
pub mod status;

pub use element::BlasComplex;
pub use layout::{BlasInt, Fill, IndexWidth, PointerMode};
pub use parallel::parallel_for_chunks;
pub use rng::SplitMix64;
pub use status::{BlasError, BlasResult, Status};
