// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
//! Vulkan bootstrap: picks a device, display, plane, queue family and format,
//! then builds the swapchain that presents to it.
//!
//! Everything above [`Driver`] is pure selection logic over value snapshots;
//! [`VulkanInstance`] is the `ash`-backed driver and [`Context`] owns the
//! logical device and swapchain it yields.

mod catalog;
mod context;
mod display;
mod driver;
mod error;
mod format;
mod instance;
mod negotiate;
mod queue;
mod surface;
mod swapchain;

#[cfg(test)]
pub(crate) mod fake;

pub use ash::vk;

pub use catalog::{
    enumerate_displays, enumerate_physical_devices, enumerate_surface_properties,
    planes_for_display, InstanceCatalog, LayerInfo, PhysicalDeviceInfo, PlaneRecord,
    SurfaceProperties,
};
pub use context::Context;
pub use display::{
    choose_display, choose_mode, choose_plane, select as select_display, DisplayChoice,
    DisplayInfo, DisplayMode, DisplayPlane, DisplayPolicy,
};
pub use driver::{DeviceSummary, DisplayRecord, DisplaySurfaceRequest, Driver, DriverInfo};
pub use error::{BootstrapError, ErrorKind, Result};
pub use format::{choose_format, score as format_score};
pub use instance::{InstanceOptions, SurfaceKind, VulkanInstance};
pub use negotiate::{negotiate, Negotiated, PresentTarget};
pub use queue::{resolve as resolve_queue_family, QueueFamilySelection};
pub use surface::{
    create_surface, DisplaySurfaceParams, PresentSurface, SurfaceParams, WindowedSurfaceParams,
};
pub use swapchain::SwapchainDescriptor;
