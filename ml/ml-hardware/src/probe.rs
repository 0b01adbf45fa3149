//! Accelerator probing over the wgpu adapter inventory.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use wgpu::{Instance, InstanceDescriptor};

use crate::device::DeviceInfo;
use crate::error::{HardwareError, Result};

/// Graphics APIs to enumerate adapters through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendSet {
    /// Vulkan, Metal, DX12 and browser WebGPU.
    #[default]
    Primary,

    /// OpenGL and GLES only.
    Secondary,

    /// Every backend; one GPU may be listed once per API.
    All,
}

impl BackendSet {
    /// Returns the wgpu backend mask.
    #[must_use]
    pub const fn backends(&self) -> wgpu::Backends {
        match self {
            Self::Primary => wgpu::Backends::PRIMARY,
            Self::Secondary => wgpu::Backends::SECONDARY,
            Self::All => wgpu::Backends::all(),
        }
    }
}

/// Probe settings.
///
/// # Example
///
/// ```
/// use ml_hardware::{BackendSet, ProbeConfig};
///
/// let config = ProbeConfig::default()
///     .with_backends(BackendSet::All)
///     .with_include_virtual(true);
/// assert!(config.is_valid());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Backends to enumerate.
    pub backends: BackendSet,

    /// Count hypervisor-exposed GPUs as accelerators.
    pub include_virtual: bool,
}

impl ProbeConfig {
    /// Sets the backends to enumerate.
    #[must_use]
    pub const fn with_backends(mut self, backends: BackendSet) -> Self {
        self.backends = backends;
        self
    }

    /// Sets whether virtual GPUs count as accelerators.
    #[must_use]
    pub const fn with_include_virtual(mut self, include_virtual: bool) -> Self {
        self.include_virtual = include_virtual;
        self
    }

    /// Validates the configuration.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        !self.backends.backends().is_empty()
    }
}

/// Lists every device visible through the configured backends.
///
/// Never fails: a backend that cannot be loaded contributes no devices.
#[must_use]
pub fn list_devices(config: &ProbeConfig) -> Vec<DeviceInfo> {
    let instance = Instance::new(&InstanceDescriptor {
        backends: config.backends.backends(),
        ..Default::default()
    });

    let devices: Vec<DeviceInfo> = instance
        .enumerate_adapters(config.backends.backends())
        .into_iter()
        .map(|adapter| DeviceInfo::from(adapter.get_info()))
        .collect();

    for device in &devices {
        debug!(
            name = %device.name,
            kind = ?device.kind,
            backend = %device.backend,
            vendor = device.vendor,
            "device found"
        );
    }
    info!(devices = devices.len(), backends = ?config.backends, "hardware probe complete");
    devices
}

/// Returns the names of the accelerators among `devices`, in order.
#[must_use]
pub fn accelerator_names(devices: &[DeviceInfo], config: &ProbeConfig) -> Vec<String> {
    devices
        .iter()
        .filter(|d| d.is_accelerator(config.include_virtual))
        .map(|d| d.name.clone())
        .collect()
}

/// Returns the names of all available accelerators.
///
/// An empty list means none were found.
///
/// # Example
///
/// ```no_run
/// let gpus = ml_hardware::list_available_accelerators();
/// println!("GPU: {gpus:?}");
/// ```
#[must_use]
pub fn list_available_accelerators() -> Vec<String> {
    let config = ProbeConfig::default();
    accelerator_names(&list_devices(&config), &config)
}

/// Like [`list_available_accelerators`], but an empty result is an error.
///
/// # Errors
///
/// Returns [`HardwareError::NoAccelerators`] if no accelerator is found.
pub fn require_accelerators(config: &ProbeConfig) -> Result<Vec<String>> {
    let devices = list_devices(config);
    let names = accelerator_names(&devices, config);
    if names.is_empty() {
        return Err(HardwareError::NoAccelerators {
            probed: devices.len(),
        });
    }
    Ok(names)
}
