// SPDX-License-Identifier: CEPL-1.0
//! Scripted in-memory driver for exercising negotiation without a GPU.

use std::cell::{Cell, RefCell};

use ash::prelude::VkResult;
use ash::vk::{self, Handle};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

use crate::driver::{DeviceSummary, DisplayRecord, DisplaySurfaceRequest, Driver, DriverInfo};

pub(crate) struct FakeDisplay {
    pub handle: vk::DisplayKHR,
    pub name: String,
    /// (handle, width, height, refresh in mHz)
    pub modes: Vec<(vk::DisplayModeKHR, u32, u32, u32)>,
}

pub(crate) struct FakePlane {
    pub current_display: vk::DisplayKHR,
    pub supported_displays: Vec<vk::DisplayKHR>,
}

pub(crate) struct FakeDriver {
    pub devices: Vec<vk::PhysicalDevice>,
    pub extensions: Vec<String>,
    pub queue_families: Vec<vk::QueueFamilyProperties>,
    /// Indexed by queue family; missing entries read as `true`.
    pub present_support: Vec<bool>,
    pub displays: Vec<FakeDisplay>,
    pub planes: Vec<FakePlane>,
    pub plane_extent: vk::Extent2D,
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,

    pub display_queries: Cell<u32>,
    pub surface_queries: Cell<u32>,
    pub window_surfaces: Cell<u32>,
    pub last_display_request: Cell<Option<DisplaySurfaceRequest>>,
    pub created_surfaces: RefCell<Vec<vk::SurfaceKHR>>,
    pub destroyed_surfaces: RefCell<Vec<vk::SurfaceKHR>>,
}

impl FakeDriver {
    /// One GPU driving one lit 1920x1080 display through plane 0.
    pub fn single_display() -> Self {
        let display = vk::DisplayKHR::from_raw(1);
        let extent = vk::Extent2D {
            width: 1920,
            height: 1080,
        };
        Self {
            devices: vec![vk::PhysicalDevice::from_raw(0x1000)],
            extensions: vec!["VK_KHR_swapchain".into(), "VK_KHR_maintenance1".into()],
            queue_families: vec![vk::QueueFamilyProperties {
                queue_flags: vk::QueueFlags::GRAPHICS
                    | vk::QueueFlags::COMPUTE
                    | vk::QueueFlags::TRANSFER,
                queue_count: 1,
                ..Default::default()
            }],
            present_support: vec![true],
            displays: vec![FakeDisplay {
                handle: display,
                name: "DP-1".into(),
                modes: vec![(vk::DisplayModeKHR::from_raw(10), 1920, 1080, 60_000)],
            }],
            planes: vec![FakePlane {
                current_display: display,
                supported_displays: vec![display],
            }],
            plane_extent: extent,
            capabilities: vk::SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 3,
                current_extent: extent,
                min_image_extent: extent,
                max_image_extent: extent,
                max_image_array_layers: 1,
                supported_transforms: vk::SurfaceTransformFlagsKHR::IDENTITY,
                current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
                supported_composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
                supported_usage_flags: vk::ImageUsageFlags::COLOR_ATTACHMENT
                    | vk::ImageUsageFlags::TRANSFER_DST,
            },
            formats: vec![
                vk::SurfaceFormatKHR {
                    format: vk::Format::R8G8B8A8_UNORM,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
                vk::SurfaceFormatKHR {
                    format: vk::Format::R16G16B16A16_SFLOAT,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
            ],
            present_modes: vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX],

            display_queries: Cell::new(0),
            surface_queries: Cell::new(0),
            window_surfaces: Cell::new(0),
            last_display_request: Cell::new(None),
            created_surfaces: RefCell::new(Vec::new()),
            destroyed_surfaces: RefCell::new(Vec::new()),
        }
    }

    fn next_surface(&self) -> vk::SurfaceKHR {
        let mut created = self.created_surfaces.borrow_mut();
        let surface = vk::SurfaceKHR::from_raw(0x5000 + created.len() as u64);
        created.push(surface);
        surface
    }

    fn bump(counter: &Cell<u32>) {
        counter.set(counter.get() + 1);
    }
}

impl Driver for FakeDriver {
    fn physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>> {
        Ok(self.devices.clone())
    }

    fn device_summary(&self, _device: vk::PhysicalDevice) -> DeviceSummary {
        DeviceSummary {
            name: "Fake GPU".into(),
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            vendor_id: 0x1234,
            device_id: 0x5678,
            api_version: vk::make_api_version(0, 1, 3, 0),
            driver_version: vk::make_api_version(0, 24, 1, 0),
            driver: Some(DriverInfo {
                id: vk::DriverId::MESA_RADV,
                name: "radv".into(),
                info: "Mesa 24.1.0".into(),
                conformance: [1, 3, 8, 0],
            }),
        }
    }

    fn device_extensions(&self, _device: vk::PhysicalDevice) -> VkResult<Vec<String>> {
        Ok(self.extensions.clone())
    }

    fn queue_families(&self, _device: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties> {
        self.queue_families.clone()
    }

    fn memory_heaps(&self, _device: vk::PhysicalDevice) -> Vec<vk::MemoryHeap> {
        vec![vk::MemoryHeap {
            size: 8 << 30,
            flags: vk::MemoryHeapFlags::DEVICE_LOCAL,
        }]
    }

    fn displays(&self, _device: vk::PhysicalDevice) -> VkResult<Vec<DisplayRecord>> {
        Self::bump(&self.display_queries);
        Ok(self
            .displays
            .iter()
            .map(|d| DisplayRecord {
                handle: d.handle,
                name: d.name.clone(),
                physical_resolution: vk::Extent2D {
                    width: 600,
                    height: 340,
                },
            })
            .collect())
    }

    fn display_modes(
        &self,
        _device: vk::PhysicalDevice,
        display: vk::DisplayKHR,
    ) -> VkResult<Vec<vk::DisplayModePropertiesKHR>> {
        let Some(d) = self.displays.iter().find(|d| d.handle == display) else {
            return Err(vk::Result::ERROR_UNKNOWN);
        };
        Ok(d.modes
            .iter()
            .map(|&(handle, width, height, refresh_rate)| vk::DisplayModePropertiesKHR {
                display_mode: handle,
                parameters: vk::DisplayModeParametersKHR {
                    visible_region: vk::Extent2D { width, height },
                    refresh_rate,
                },
                ..Default::default()
            })
            .collect())
    }

    fn display_planes(
        &self,
        _device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::DisplayPlanePropertiesKHR>> {
        Ok(self
            .planes
            .iter()
            .map(|p| vk::DisplayPlanePropertiesKHR {
                current_display: p.current_display,
                current_stack_index: 0,
                ..Default::default()
            })
            .collect())
    }

    fn plane_supported_displays(
        &self,
        _device: vk::PhysicalDevice,
        plane_index: u32,
    ) -> VkResult<Vec<vk::DisplayKHR>> {
        self.planes
            .get(plane_index as usize)
            .map(|p| p.supported_displays.clone())
            .ok_or(vk::Result::ERROR_UNKNOWN)
    }

    fn plane_capabilities(
        &self,
        _device: vk::PhysicalDevice,
        _mode: vk::DisplayModeKHR,
        _plane_index: u32,
    ) -> VkResult<vk::DisplayPlaneCapabilitiesKHR> {
        Ok(vk::DisplayPlaneCapabilitiesKHR {
            supported_alpha: vk::DisplayPlaneAlphaFlagsKHR::OPAQUE,
            max_dst_extent: self.plane_extent,
            ..Default::default()
        })
    }

    fn create_display_surface(&self, request: &DisplaySurfaceRequest) -> VkResult<vk::SurfaceKHR> {
        self.last_display_request.set(Some(*request));
        Ok(self.next_surface())
    }

    fn create_window_surface(
        &self,
        _display: RawDisplayHandle,
        _window: RawWindowHandle,
    ) -> VkResult<vk::SurfaceKHR> {
        Self::bump(&self.window_surfaces);
        Ok(self.next_surface())
    }

    fn destroy_surface(&self, surface: vk::SurfaceKHR) {
        self.destroyed_surfaces.borrow_mut().push(surface);
    }

    fn surface_support(
        &self,
        _device: vk::PhysicalDevice,
        queue_family: u32,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        Self::bump(&self.surface_queries);
        Ok(self
            .present_support
            .get(queue_family as usize)
            .copied()
            .unwrap_or(true))
    }

    fn surface_capabilities(
        &self,
        _device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        Self::bump(&self.surface_queries);
        Ok(self.capabilities)
    }

    fn surface_formats(
        &self,
        _device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        Self::bump(&self.surface_queries);
        Ok(self.formats.clone())
    }

    fn surface_present_modes(
        &self,
        _device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        Self::bump(&self.surface_queries);
        Ok(self.present_modes.clone())
    }
}
