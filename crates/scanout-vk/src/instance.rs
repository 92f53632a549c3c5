// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{c_char, c_void, CStr, CString};

use ash::ext::{debug_utils, direct_mode_display, display_surface_counter, validation_features};
use ash::khr::{
    display, driver_properties, get_display_properties2, get_surface_capabilities2, surface,
};
use ash::prelude::VkResult;
use ash::vk;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use scanout_core::LogSink;

use crate::catalog::{fixed_name, version, InstanceCatalog};
use crate::driver::{DeviceSummary, DisplayRecord, DisplaySurfaceRequest, Driver, DriverInfo};
use crate::error::{BootstrapError, Result, VkResultExt};

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Extra checks turned on through `VK_EXT_validation_features`.
const VALIDATION_FEATURES: [vk::ValidationFeatureEnableEXT; 3] = [
    vk::ValidationFeatureEnableEXT::GPU_ASSISTED,
    vk::ValidationFeatureEnableEXT::GPU_ASSISTED_RESERVE_BINDING_SLOT,
    vk::ValidationFeatureEnableEXT::BEST_PRACTICES,
];

/// Which WSI path the instance is created for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SurfaceKind {
    Windowed,
    #[default]
    Display,
}

#[derive(Clone, Debug)]
pub struct InstanceOptions {
    pub application_name: String,
    pub surface: SurfaceKind,
    pub validation: bool,
    /// Required for `SurfaceKind::Windowed`; picks the platform extensions.
    pub display_handle: Option<RawDisplayHandle>,
}

impl Default for InstanceOptions {
    fn default() -> Self {
        Self {
            application_name: "scanout".into(),
            surface: SurfaceKind::default(),
            validation: false,
            display_handle: None,
        }
    }
}

// --- Debug messenger ---

unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _types: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user: *mut c_void,
) -> vk::Bool32 {
    if data.is_null() {
        return vk::FALSE;
    }
    let p_message = unsafe { (*data).p_message };
    if p_message.is_null() {
        return vk::FALSE;
    }
    let msg = unsafe { CStr::from_ptr(p_message) }.to_string_lossy();
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        tracing::error!(target: "vulkan", "{msg}");
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        tracing::warn!(target: "vulkan", "{msg}");
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        tracing::debug!(target: "vulkan", "{msg}");
    } else {
        tracing::trace!(target: "vulkan", "{msg}");
    }
    vk::FALSE
}

struct DebugMessenger {
    loader: debug_utils::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
}

unsafe fn create_debug_messenger(
    entry: &ash::Entry,
    instance: &ash::Instance,
) -> Result<DebugMessenger> {
    let loader = debug_utils::Instance::new(entry, instance);
    let ci = vk::DebugUtilsMessengerCreateInfoEXT {
        message_severity: vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
            | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
            | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        message_type: vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        pfn_user_callback: Some(debug_callback),
        ..Default::default()
    };
    let messenger = unsafe { loader.create_debug_utils_messenger(&ci, None) }
        .rejected("vkCreateDebugUtilsMessengerEXT")?;
    Ok(DebugMessenger { loader, messenger })
}

// --- Extension selection ---

/// Instance extensions and layers to enable, chosen against the catalog.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct InstanceRequest {
    pub extensions: Vec<&'static CStr>,
    pub layers: Vec<&'static CStr>,
    pub debug_utils: bool,
    pub validation_features: bool,
}

pub(crate) fn instance_request(
    catalog: &InstanceCatalog,
    kind: SurfaceKind,
    platform: &[&'static CStr],
    validation: bool,
) -> InstanceRequest {
    let mut req = InstanceRequest::default();
    match kind {
        SurfaceKind::Display => {
            req.extensions.push(surface::NAME);
            req.extensions.push(display::NAME);
            for optional in [
                get_display_properties2::NAME,
                get_surface_capabilities2::NAME,
                direct_mode_display::NAME,
                display_surface_counter::NAME,
            ] {
                if catalog.has_extension(optional) {
                    req.extensions.push(optional);
                }
            }
        }
        SurfaceKind::Windowed => {
            req.extensions.extend_from_slice(platform);
            if catalog.has_extension(get_surface_capabilities2::NAME) {
                req.extensions.push(get_surface_capabilities2::NAME);
            }
        }
    }

    if validation {
        if catalog.has_layer(VALIDATION_LAYER) {
            req.layers.push(VALIDATION_LAYER);
        }
        if catalog.has_extension(debug_utils::NAME) {
            req.extensions.push(debug_utils::NAME);
            req.debug_utils = true;
        }
        if catalog.has_extension(validation_features::NAME) {
            req.extensions.push(validation_features::NAME);
            req.validation_features = true;
        }
    }
    req
}

// --- Instance ---

/// Owns the loader, the instance and the WSI function tables.
///
/// Surfaces handed out through [`Driver`] belong to the caller and must be
/// destroyed before this value is dropped.
pub struct VulkanInstance {
    entry: ash::Entry,
    instance: ash::Instance,
    surface_fn: surface::Instance,
    display_fn: Option<display::Instance>,
    debug: Option<DebugMessenger>,
}

impl VulkanInstance {
    pub fn new(options: &InstanceOptions, log: &dyn LogSink) -> Result<Self> {
        let entry = unsafe { ash::Entry::load() }
            .map_err(|e| BootstrapError::LoaderUnavailable(e.to_string()))?;
        let loader_version = unsafe { entry.try_enumerate_instance_version() }
            .rejected("vkEnumerateInstanceVersion")?
            .unwrap_or(vk::API_VERSION_1_0);
        log.info(format_args!("Vulkan loader {}", version(loader_version)));
        let catalog = InstanceCatalog::scan(&entry, log)?;

        let platform: Vec<&'static CStr> = match options.surface {
            SurfaceKind::Display => Vec::new(),
            SurfaceKind::Windowed => {
                let handle = options
                    .display_handle
                    .ok_or(BootstrapError::MissingWindowHandles)?;
                ash_window::enumerate_required_extensions(handle)
                    .rejected("enumerate_required_extensions")?
                    .iter()
                    .map(|&p| unsafe { CStr::from_ptr(p) })
                    .collect()
            }
        };
        let req = instance_request(&catalog, options.surface, &platform, options.validation);
        for ext in &req.extensions {
            log.info(format_args!("Enabling instance extension {}", ext.to_string_lossy()));
        }
        for layer in &req.layers {
            log.info(format_args!("Enabling layer {}", layer.to_string_lossy()));
        }

        let instance = unsafe { create_instance(&entry, &options.application_name, &req) }?;

        let debug = if req.debug_utils {
            match unsafe { create_debug_messenger(&entry, &instance) } {
                Ok(d) => Some(d),
                Err(e) => {
                    unsafe { instance.destroy_instance(None) };
                    return Err(e);
                }
            }
        } else {
            None
        };

        let surface_fn = surface::Instance::new(&entry, &instance);
        let display_fn = match options.surface {
            SurfaceKind::Display => Some(display::Instance::new(&entry, &instance)),
            SurfaceKind::Windowed => None,
        };
        tracing::info!("Vulkan instance ready ({:?} surfaces)", options.surface);

        Ok(Self {
            entry,
            instance,
            surface_fn,
            display_fn,
            debug,
        })
    }

    pub fn raw(&self) -> &ash::Instance {
        &self.instance
    }

    fn driver_info(&self, device: vk::PhysicalDevice, api_version: u32) -> Option<DriverInfo> {
        let core = (
            vk::api_version_major(api_version),
            vk::api_version_minor(api_version),
        ) >= (1, 2);
        let has_ext = unsafe { self.instance.enumerate_device_extension_properties(device) }
            .map(|exts| {
                let name = driver_properties::NAME.to_string_lossy();
                exts.iter().any(|e| fixed_name(&e.extension_name) == name)
            })
            .unwrap_or(false);
        if !core && !has_ext {
            return None;
        }

        let mut driver = vk::PhysicalDeviceDriverProperties::default();
        {
            let mut props2 = vk::PhysicalDeviceProperties2::default().push_next(&mut driver);
            unsafe { self.instance.get_physical_device_properties2(device, &mut props2) };
        }
        let cv = driver.conformance_version;
        Some(DriverInfo {
            id: driver.driver_id,
            name: fixed_name(&driver.driver_name),
            info: fixed_name(&driver.driver_info),
            conformance: [cv.major, cv.minor, cv.subminor, cv.patch],
        })
    }

    fn display_fn(&self) -> VkResult<&display::Instance> {
        self.display_fn
            .as_ref()
            .ok_or(vk::Result::ERROR_EXTENSION_NOT_PRESENT)
    }
}

unsafe fn create_instance(
    entry: &ash::Entry,
    application_name: &str,
    req: &InstanceRequest,
) -> Result<ash::Instance> {
    let app = CString::new(application_name).unwrap_or_default();

    let app_info = vk::ApplicationInfo {
        p_application_name: app.as_ptr(),
        application_version: 0,
        p_engine_name: app.as_ptr(),
        engine_version: 0,
        api_version: vk::API_VERSION_1_1,
        ..Default::default()
    };

    let ext_ptrs: Vec<*const c_char> = req.extensions.iter().map(|e| e.as_ptr()).collect();
    let layer_ptrs: Vec<*const c_char> = req.layers.iter().map(|l| l.as_ptr()).collect();

    let mut features =
        vk::ValidationFeaturesEXT::default().enabled_validation_features(&VALIDATION_FEATURES);

    let mut create_info = vk::InstanceCreateInfo {
        p_application_info: &app_info,
        enabled_extension_count: ext_ptrs.len() as u32,
        pp_enabled_extension_names: ext_ptrs.as_ptr(),
        enabled_layer_count: layer_ptrs.len() as u32,
        pp_enabled_layer_names: layer_ptrs.as_ptr(),
        ..Default::default()
    };
    if req.validation_features {
        create_info = create_info.push_next(&mut features);
    }

    unsafe { entry.create_instance(&create_info, None) }.rejected("vkCreateInstance")
}

impl Driver for VulkanInstance {
    fn physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>> {
        unsafe { self.instance.enumerate_physical_devices() }
    }

    fn device_summary(&self, device: vk::PhysicalDevice) -> DeviceSummary {
        let props = unsafe { self.instance.get_physical_device_properties(device) };
        DeviceSummary {
            name: fixed_name(&props.device_name),
            device_type: props.device_type,
            vendor_id: props.vendor_id,
            device_id: props.device_id,
            api_version: props.api_version,
            driver_version: props.driver_version,
            driver: self.driver_info(device, props.api_version),
        }
    }

    fn device_extensions(&self, device: vk::PhysicalDevice) -> VkResult<Vec<String>> {
        let props = unsafe { self.instance.enumerate_device_extension_properties(device) }?;
        Ok(props.iter().map(|e| fixed_name(&e.extension_name)).collect())
    }

    fn queue_families(&self, device: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties> {
        unsafe {
            self.instance
                .get_physical_device_queue_family_properties(device)
        }
    }

    fn memory_heaps(&self, device: vk::PhysicalDevice) -> Vec<vk::MemoryHeap> {
        let props = unsafe { self.instance.get_physical_device_memory_properties(device) };
        let count = (props.memory_heap_count as usize).min(props.memory_heaps.len());
        props.memory_heaps[..count].to_vec()
    }

    fn displays(&self, device: vk::PhysicalDevice) -> VkResult<Vec<DisplayRecord>> {
        let props = unsafe {
            self.display_fn()?
                .get_physical_device_display_properties(device)
        }?;
        Ok(props
            .iter()
            .map(|p| DisplayRecord {
                handle: p.display,
                name: if p.display_name.is_null() {
                    String::from("(unnamed)")
                } else {
                    unsafe { CStr::from_ptr(p.display_name) }
                        .to_string_lossy()
                        .into_owned()
                },
                physical_resolution: p.physical_resolution,
            })
            .collect())
    }

    fn display_modes(
        &self,
        device: vk::PhysicalDevice,
        display: vk::DisplayKHR,
    ) -> VkResult<Vec<vk::DisplayModePropertiesKHR>> {
        unsafe {
            self.display_fn()?
                .get_display_mode_properties(device, display)
        }
    }

    fn display_planes(
        &self,
        device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::DisplayPlanePropertiesKHR>> {
        unsafe {
            self.display_fn()?
                .get_physical_device_display_plane_properties(device)
        }
    }

    fn plane_supported_displays(
        &self,
        device: vk::PhysicalDevice,
        plane_index: u32,
    ) -> VkResult<Vec<vk::DisplayKHR>> {
        unsafe {
            self.display_fn()?
                .get_display_plane_supported_displays(device, plane_index)
        }
    }

    fn plane_capabilities(
        &self,
        device: vk::PhysicalDevice,
        mode: vk::DisplayModeKHR,
        plane_index: u32,
    ) -> VkResult<vk::DisplayPlaneCapabilitiesKHR> {
        unsafe {
            self.display_fn()?
                .get_display_plane_capabilities(device, mode, plane_index)
        }
    }

    fn create_display_surface(&self, request: &DisplaySurfaceRequest) -> VkResult<vk::SurfaceKHR> {
        let ci = vk::DisplaySurfaceCreateInfoKHR {
            display_mode: request.mode,
            plane_index: request.plane_index,
            plane_stack_index: request.plane_stack_index,
            transform: request.transform,
            global_alpha: request.global_alpha,
            alpha_mode: request.alpha_mode,
            image_extent: request.extent,
            ..Default::default()
        };
        unsafe { self.display_fn()?.create_display_plane_surface(&ci, None) }
    }

    fn create_window_surface(
        &self,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> VkResult<vk::SurfaceKHR> {
        unsafe { ash_window::create_surface(&self.entry, &self.instance, display, window, None) }
    }

    fn destroy_surface(&self, surface: vk::SurfaceKHR) {
        unsafe { self.surface_fn.destroy_surface(surface, None) };
    }

    fn surface_support(
        &self,
        device: vk::PhysicalDevice,
        queue_family: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        unsafe {
            self.surface_fn
                .get_physical_device_surface_support(device, queue_family, surface)
        }
    }

    fn surface_capabilities(
        &self,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.surface_fn
                .get_physical_device_surface_capabilities(device, surface)
        }
    }

    fn surface_formats(
        &self,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        unsafe {
            self.surface_fn
                .get_physical_device_surface_formats(device, surface)
        }
    }

    fn surface_present_modes(
        &self,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        unsafe {
            self.surface_fn
                .get_physical_device_surface_present_modes(device, surface)
        }
    }
}

// Messenger before instance; every surface and device is already gone.
impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            if let Some(debug) = self.debug.take() {
                debug
                    .loader
                    .destroy_debug_utils_messenger(debug.messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}
