//! Error types for ml-hardware crate.

use thiserror::Error;

/// Errors that can occur while probing hardware.
///
/// # Example
///
/// ```
/// use ml_hardware::HardwareError;
///
/// let err = HardwareError::NoAccelerators { probed: 2 };
/// assert!(err.to_string().contains("no accelerator"));
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HardwareError {
    /// No device of an accelerator type was found.
    ///
    /// This can happen when:
    /// - No GPU is present
    /// - GPU drivers are not installed
    /// - The probed backends do not cover the installed GPU
    #[error("no accelerator found ({probed} devices probed)")]
    NoAccelerators {
        /// Number of devices the probe saw.
        probed: usize,
    },
}

/// Result type for ml-hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;
