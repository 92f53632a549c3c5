// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{c_char, CStr, CString};

use ash::vk;
use scanout_core::LogSink;

use crate::display::{DisplayInfo, DisplayMode, DisplayPlane};
use crate::driver::{DeviceSummary, Driver};
use crate::error::{BootstrapError, Result, VkResultExt};

/// Text of a fixed-size driver string, up to its NUL or the end of the array.
pub(crate) fn fixed_name(raw: &[c_char]) -> String {
    let bytes: Vec<u8> = raw
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayerInfo {
    pub name: String,
    pub extensions: Vec<String>,
}

/// Layers and extensions the loader offers before any instance exists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstanceCatalog {
    pub layers: Vec<LayerInfo>,
    pub extensions: Vec<String>,
}

impl InstanceCatalog {
    pub fn scan(entry: &ash::Entry, log: &dyn LogSink) -> Result<Self> {
        let layer_props = unsafe { entry.enumerate_instance_layer_properties() }
            .rejected("vkEnumerateInstanceLayerProperties")?;

        let mut layers = Vec::with_capacity(layer_props.len());
        for props in &layer_props {
            let name = fixed_name(&props.layer_name);
            log.trace(format_args!("Instance layer {name}"));
            let layer_c = CString::new(name.as_str()).unwrap_or_default();
            let extensions: Vec<String> =
                unsafe { entry.enumerate_instance_extension_properties(Some(layer_c.as_c_str())) }
                    .rejected("vkEnumerateInstanceExtensionProperties")?
                    .iter()
                    .map(|e| fixed_name(&e.extension_name))
                    .collect();
            for ext in &extensions {
                log.trace(format_args!("\tInstance layer extension {ext}"));
            }
            layers.push(LayerInfo { name, extensions });
        }

        let extensions: Vec<String> = unsafe { entry.enumerate_instance_extension_properties(None) }
            .rejected("vkEnumerateInstanceExtensionProperties")?
            .iter()
            .map(|e| fixed_name(&e.extension_name))
            .collect();
        for ext in &extensions {
            log.trace(format_args!("Global extension {ext}"));
        }

        Ok(Self { layers, extensions })
    }

    pub fn has_layer(&self, name: &CStr) -> bool {
        let name = name.to_string_lossy();
        self.layers.iter().any(|l| l.name == name)
    }

    pub fn has_extension(&self, name: &CStr) -> bool {
        let name = name.to_string_lossy();
        self.extensions.iter().any(|e| *e == name)
    }
}

/// Immutable snapshot of one GPU, captured once at enumeration.
#[derive(Clone, Debug)]
pub struct PhysicalDeviceInfo {
    pub handle: vk::PhysicalDevice,
    pub summary: DeviceSummary,
    pub extensions: Vec<String>,
    pub queue_families: Vec<vk::QueueFamilyProperties>,
    pub memory_heaps: Vec<vk::MemoryHeap>,
    /// Only populated for the display-direct path.
    pub displays: Vec<DisplayInfo>,
}

impl PhysicalDeviceInfo {
    pub fn name(&self) -> &str {
        &self.summary.name
    }

    pub fn supports_extension(&self, name: &CStr) -> bool {
        let name = name.to_string_lossy();
        self.extensions.iter().any(|e| *e == name)
    }
}

pub(crate) fn version(v: u32) -> String {
    format!(
        "{}.{}.{}",
        vk::api_version_major(v),
        vk::api_version_minor(v),
        vk::api_version_patch(v)
    )
}

pub fn enumerate_physical_devices(
    driver: &dyn Driver,
    with_displays: bool,
    log: &dyn LogSink,
) -> Result<Vec<PhysicalDeviceInfo>> {
    let handles = driver
        .physical_devices()
        .rejected("vkEnumeratePhysicalDevices")?;
    log.trace(format_args!("Found {} physical devices", handles.len()));
    if handles.is_empty() {
        return Err(BootstrapError::NoPhysicalDevices);
    }

    let mut devices = Vec::with_capacity(handles.len());
    for handle in handles {
        let summary = driver.device_summary(handle);
        log.trace(format_args!(
            "Device name = {}, type = {:?}, vendorID = {:x}, deviceID = {:x}, apiVersion = {}, driverVersion = {}",
            summary.name,
            summary.device_type,
            summary.vendor_id,
            summary.device_id,
            version(summary.api_version),
            version(summary.driver_version),
        ));
        if let Some(d) = &summary.driver {
            let [major, minor, subminor, patch] = d.conformance;
            log.trace(format_args!(
                "Driver: id = {:?}, name = {}, info = {}, conformanceVersion = {major}.{minor}.{subminor}.{patch}",
                d.id, d.name, d.info
            ));
        }

        let extensions = driver
            .device_extensions(handle)
            .rejected("vkEnumerateDeviceExtensionProperties")?;
        log.trace(format_args!("\tFound {} device extensions", extensions.len()));
        for ext in &extensions {
            log.trace(format_args!("\tFound extension {ext}"));
        }

        let queue_families = driver.queue_families(handle);
        if queue_families.is_empty() {
            return Err(BootstrapError::NoQueueFamilies {
                device: summary.name,
            });
        }

        let memory_heaps = driver.memory_heaps(handle);
        for (i, heap) in memory_heaps.iter().enumerate() {
            log.trace(format_args!(
                "\tMemory heap {i}: {} bytes, flags {:?}",
                heap.size, heap.flags
            ));
        }

        let displays = if with_displays {
            enumerate_displays(driver, handle, log)?
        } else {
            Vec::new()
        };

        devices.push(PhysicalDeviceInfo {
            handle,
            summary,
            extensions,
            queue_families,
            memory_heaps,
            displays,
        });
    }
    Ok(devices)
}

/// Device-wide plane record, before it is related to any display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaneRecord {
    pub current_display: vk::DisplayKHR,
    pub current_stack_index: u32,
    pub supported_displays: Vec<vk::DisplayKHR>,
}

/// Relates every device plane to one display.
pub fn planes_for_display(display: vk::DisplayKHR, planes: &[PlaneRecord]) -> Vec<DisplayPlane> {
    (0u32..)
        .zip(planes)
        .map(|(index, p)| DisplayPlane {
            index,
            current: p.current_display == display,
            supported: p.supported_displays.contains(&display),
            has_current_display: p.current_display != vk::DisplayKHR::null(),
            current_stack_index: p.current_stack_index,
            supported_display_count: p.supported_displays.len(),
        })
        .collect()
}

pub fn enumerate_displays(
    driver: &dyn Driver,
    device: vk::PhysicalDevice,
    log: &dyn LogSink,
) -> Result<Vec<DisplayInfo>> {
    let records = driver
        .displays(device)
        .rejected("vkGetPhysicalDeviceDisplayPropertiesKHR")?;
    log.trace(format_args!("Found {} displays", records.len()));

    // Planes are per device; query once and cross-reference per display.
    let plane_props = driver
        .display_planes(device)
        .rejected("vkGetPhysicalDeviceDisplayPlanePropertiesKHR")?;
    let mut planes = Vec::with_capacity(plane_props.len());
    for (index, props) in (0u32..).zip(&plane_props) {
        let supported_displays = driver
            .plane_supported_displays(device, index)
            .rejected("vkGetDisplayPlaneSupportedDisplaysKHR")?;
        planes.push(PlaneRecord {
            current_display: props.current_display,
            current_stack_index: props.current_stack_index,
            supported_displays,
        });
    }

    let mut displays = Vec::with_capacity(records.len());
    for (display_index, record) in records.into_iter().enumerate() {
        log.trace(format_args!("Display {display_index}: {}", record.name));

        let modes: Vec<DisplayMode> = driver
            .display_modes(device, record.handle)
            .rejected("vkGetDisplayModePropertiesKHR")?
            .iter()
            .map(|m| DisplayMode {
                handle: m.display_mode,
                visible_region: m.parameters.visible_region,
                refresh_rate: m.parameters.refresh_rate,
            })
            .collect();
        log.trace(format_args!("\tModes: {}", modes.len()));
        for (mode_index, m) in modes.iter().enumerate() {
            log.trace(format_args!(
                "\t\tMode {mode_index}: {} x {} @ {} mHz",
                m.visible_region.width, m.visible_region.height, m.refresh_rate
            ));
        }

        let display_planes = planes_for_display(record.handle, &planes);
        log.trace(format_args!("\tPlanes: {}", display_planes.len()));
        for p in &display_planes {
            log.trace(format_args!(
                "\t\tPlane {}: current display: {}, display supported: {}, has display: {}, current stack index: {}, supported displays: {}",
                p.index,
                yes_no(p.current),
                yes_no(p.supported),
                yes_no(p.has_current_display),
                p.current_stack_index,
                p.supported_display_count
            ));
        }

        displays.push(DisplayInfo {
            handle: record.handle,
            name: record.name,
            physical_resolution: record.physical_resolution,
            modes,
            planes: display_planes,
        });
    }
    Ok(displays)
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

/// What a surface can do, fetched right after the surface is created.
#[derive(Clone, Debug)]
pub struct SurfaceProperties {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub present_modes: Vec<vk::PresentModeKHR>,
    pub formats: Vec<vk::SurfaceFormatKHR>,
}

pub fn enumerate_surface_properties(
    driver: &dyn Driver,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    log: &dyn LogSink,
) -> Result<SurfaceProperties> {
    log.trace(format_args!("Surface properties:"));

    let present_modes = driver
        .surface_present_modes(device, surface)
        .rejected("vkGetPhysicalDeviceSurfacePresentModesKHR")?;
    for mode in &present_modes {
        log.trace(format_args!("    present mode : {mode:?}"));
    }

    let c = driver
        .surface_capabilities(device, surface)
        .rejected("vkGetPhysicalDeviceSurfaceCapabilitiesKHR")?;
    log.trace(format_args!("    minImageCount           : {}", c.min_image_count));
    log.trace(format_args!("    maxImageCount           : {}", c.max_image_count));
    log.trace(format_args!(
        "    currentExtent           : {} x {}",
        c.current_extent.width, c.current_extent.height
    ));
    log.trace(format_args!(
        "    minExtent               : {} x {}",
        c.min_image_extent.width, c.min_image_extent.height
    ));
    log.trace(format_args!(
        "    maxExtent               : {} x {}",
        c.max_image_extent.width, c.max_image_extent.height
    ));
    log.trace(format_args!("    maxImageArrayLayers     : {}", c.max_image_array_layers));
    log.trace(format_args!("    supportedTransforms     : {:?}", c.supported_transforms));
    log.trace(format_args!("    currentTransform        : {:?}", c.current_transform));
    log.trace(format_args!("    supportedCompositeAlpha : {:?}", c.supported_composite_alpha));
    log.trace(format_args!("    supportedUsageFlags     : {:?}", c.supported_usage_flags));

    let formats = driver
        .surface_formats(device, surface)
        .rejected("vkGetPhysicalDeviceSurfaceFormatsKHR")?;
    if formats.is_empty() {
        return Err(BootstrapError::NoSurfaceFormats);
    }

    Ok(SurfaceProperties {
        capabilities: c,
        present_modes,
        formats,
    })
}
