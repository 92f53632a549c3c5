// SPDX-License-Identifier: CEPL-1.0
use ash::prelude::VkResult;
use ash::vk;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

/// Identity and version data for one physical device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceSummary {
    pub name: String,
    pub device_type: vk::PhysicalDeviceType,
    pub vendor_id: u32,
    pub device_id: u32,
    pub api_version: u32,
    pub driver_version: u32,
    /// Only when the device exposes `VkPhysicalDeviceDriverProperties`.
    pub driver: Option<DriverInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriverInfo {
    pub id: vk::DriverId,
    pub name: String,
    pub info: String,
    /// major, minor, subminor, patch
    pub conformance: [u8; 4],
}

/// A display as reported by `vkGetPhysicalDeviceDisplayPropertiesKHR`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayRecord {
    pub handle: vk::DisplayKHR,
    pub name: String,
    pub physical_resolution: vk::Extent2D,
}

/// Inputs for `vkCreateDisplayPlaneSurfaceKHR`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplaySurfaceRequest {
    pub mode: vk::DisplayModeKHR,
    pub plane_index: u32,
    pub plane_stack_index: u32,
    pub transform: vk::SurfaceTransformFlagsKHR,
    pub global_alpha: f32,
    pub alpha_mode: vk::DisplayPlaneAlphaFlagsKHR,
    pub extent: vk::Extent2D,
}

/// Every blocking driver round-trip the negotiation needs.
///
/// Handles passed in must come from the same driver instance.
pub trait Driver {
    fn physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>>;
    fn device_summary(&self, device: vk::PhysicalDevice) -> DeviceSummary;
    fn device_extensions(&self, device: vk::PhysicalDevice) -> VkResult<Vec<String>>;
    fn queue_families(&self, device: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties>;
    fn memory_heaps(&self, device: vk::PhysicalDevice) -> Vec<vk::MemoryHeap>;

    // Display WSI only
    fn displays(&self, device: vk::PhysicalDevice) -> VkResult<Vec<DisplayRecord>>;
    fn display_modes(
        &self,
        device: vk::PhysicalDevice,
        display: vk::DisplayKHR,
    ) -> VkResult<Vec<vk::DisplayModePropertiesKHR>>;
    fn display_planes(
        &self,
        device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::DisplayPlanePropertiesKHR>>;
    fn plane_supported_displays(
        &self,
        device: vk::PhysicalDevice,
        plane_index: u32,
    ) -> VkResult<Vec<vk::DisplayKHR>>;
    fn plane_capabilities(
        &self,
        device: vk::PhysicalDevice,
        mode: vk::DisplayModeKHR,
        plane_index: u32,
    ) -> VkResult<vk::DisplayPlaneCapabilitiesKHR>;
    fn create_display_surface(&self, request: &DisplaySurfaceRequest) -> VkResult<vk::SurfaceKHR>;

    fn create_window_surface(
        &self,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> VkResult<vk::SurfaceKHR>;
    fn destroy_surface(&self, surface: vk::SurfaceKHR);

    fn surface_support(
        &self,
        device: vk::PhysicalDevice,
        queue_family: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool>;
    fn surface_capabilities(
        &self,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR>;
    fn surface_formats(
        &self,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>>;
    fn surface_present_modes(
        &self,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>>;
}
