//! Device records built from adapter inventory.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of compute device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    /// Dedicated GPU.
    DiscreteGpu,

    /// GPU sharing the CPU package.
    IntegratedGpu,

    /// GPU exposed by a hypervisor.
    VirtualGpu,

    /// Software rasterizer running on the CPU.
    Cpu,

    /// Unknown device type.
    Other,
}

impl DeviceKind {
    /// Returns `true` for GPU kinds; virtual GPUs count only if
    /// `include_virtual` is set.
    #[must_use]
    pub const fn is_accelerator(&self, include_virtual: bool) -> bool {
        match self {
            Self::DiscreteGpu | Self::IntegratedGpu => true,
            Self::VirtualGpu => include_virtual,
            Self::Cpu | Self::Other => false,
        }
    }

    /// Returns the short type label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::DiscreteGpu | Self::IntegratedGpu | Self::VirtualGpu => "GPU",
            Self::Cpu => "CPU",
            Self::Other => "OTHER",
        }
    }
}

impl From<wgpu::DeviceType> for DeviceKind {
    fn from(device_type: wgpu::DeviceType) -> Self {
        match device_type {
            wgpu::DeviceType::DiscreteGpu => Self::DiscreteGpu,
            wgpu::DeviceType::IntegratedGpu => Self::IntegratedGpu,
            wgpu::DeviceType::VirtualGpu => Self::VirtualGpu,
            wgpu::DeviceType::Cpu => Self::Cpu,
            wgpu::DeviceType::Other => Self::Other,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A compute device visible to the probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "NVIDIA GeForce RTX 3080").
    pub name: String,

    /// Device kind.
    pub kind: DeviceKind,

    /// PCI vendor id, or 0 if unknown.
    pub vendor: u32,

    /// PCI device id, or 0 if unknown.
    pub device: u32,

    /// Graphics API the device was found through (e.g., Vulkan, Metal).
    pub backend: String,

    /// Driver name, if reported.
    pub driver: String,
}

impl DeviceInfo {
    /// Returns `true` if the device is an accelerator.
    #[must_use]
    pub const fn is_accelerator(&self, include_virtual: bool) -> bool {
        self.kind.is_accelerator(include_virtual)
    }
}

impl From<wgpu::AdapterInfo> for DeviceInfo {
    fn from(info: wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name,
            kind: info.device_type.into(),
            vendor: info.vendor,
            device: info.device,
            backend: format!("{:?}", info.backend),
            driver: info.driver,
        }
    }
}
