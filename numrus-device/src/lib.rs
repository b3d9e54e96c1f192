//! # numrus-device
//!
//! In-process accelerator used by the numrus batched BLAS.
//!
//! - [`Device`]: fixed capacity, atomic allocation accounting.
//! - [`DeviceVec`]: 64-byte aligned allocation released on drop; exhaustion
//!   is reported by `memcheck`, never by a panic.
//! - [`Stream`]: ordered execution, faults deferred to `synchronize`.
//! - [`transfer`]: blocking host/device copies.
//!
//! ```
//! use numrus_device::{transfer, Device, DeviceVec};
//!
//! let dev = Device::new(1 << 20);
//! let mut d = DeviceVec::new(&dev, 3);
//! transfer::copy_host_to_device(&mut d, &[1.0f64, 2.0, 3.0]).unwrap();
//! let mut h = [0.0; 3];
//! transfer::copy_device_to_host(&mut h, &d).unwrap();
//! assert_eq!(h, [1.0, 2.0, 3.0]);
//! ```

pub mod buffer;
pub mod device;
pub mod error;
pub mod stream;
pub mod transfer;

pub use buffer::DeviceVec;
pub use device::Device;
pub use error::DeviceError;
pub use stream::Stream;
pub use transfer::TransferKind;
