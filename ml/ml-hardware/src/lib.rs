//! Accelerator discovery for training pipelines.
//!
//! Lists the GPUs a training run could use, from the wgpu adapter
//! inventory. Probing has no side effects: no device is opened.
//!
//! - [`list_available_accelerators`] - Names of usable GPUs
//! - [`list_devices`] - Every device with its kind and backend
//! - [`require_accelerators`] - Fails with [`HardwareError::NoAccelerators`]
//!   when nothing is found
//!
//! The `list-accelerators` binary prints the list and exits with status 1
//! when it is empty.
//!
//! # Example
//!
//! ```
//! use ml_hardware::{DeviceInfo, DeviceKind, ProbeConfig, accelerator_names};
//!
//! let devices = vec![DeviceInfo {
//!     name: "RTX 4090".to_string(),
//!     kind: DeviceKind::DiscreteGpu,
//!     vendor: 0x10de,
//!     device: 0,
//!     backend: "Vulkan".to_string(),
//!     driver: String::new(),
//! }];
//! assert_eq!(accelerator_names(&devices, &ProbeConfig::default()), vec!["RTX 4090"]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod device;
mod error;
mod probe;

pub use device::{DeviceInfo, DeviceKind};
pub use error::{HardwareError, Result};
pub use probe::{
    BackendSet, ProbeConfig, accelerator_names, list_available_accelerators, list_devices,
    require_accelerators,
};
