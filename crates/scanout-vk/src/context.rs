// SPDX-License-Identifier: CEPL-1.0
use std::ffi::c_char;

use ash::khr::swapchain;
use ash::vk;
use scanout_core::LogSink;

use crate::driver::Driver;
use crate::error::{BootstrapError, Result, VkResultExt};
use crate::instance::VulkanInstance;
use crate::negotiate::Negotiated;

const QUEUE_PRIORITY: f32 = 1.0;

/// Logical device, its single queue and the swapchain built from a
/// negotiation. Borrows the instance so it cannot outlive it.
pub struct Context<'i> {
    instance: &'i VulkanInstance,
    surface: vk::SurfaceKHR,

    device: ash::Device,
    queue: vk::Queue,
    queue_family: u32,

    swapchain_fn: swapchain::Device,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    format: vk::SurfaceFormatKHR,
    extent: vk::Extent2D,
}

impl<'i> Context<'i> {
    /// Takes ownership of the negotiated surface. On failure every object
    /// created so far, the surface included, is destroyed.
    pub fn new(
        instance: &'i VulkanInstance,
        negotiated: Negotiated,
        log: &dyn LogSink,
    ) -> Result<Self> {
        let surface = negotiated.surface.handle;
        let queue_family = negotiated.queues.family();

        let device = match unsafe { create_device(instance, &negotiated, queue_family) } {
            Ok(d) => d,
            Err(e) => {
                instance.destroy_surface(surface);
                return Err(e);
            }
        };
        log.info(format_args!(
            "Created logical device on {} (queue family {queue_family})",
            negotiated.device.name()
        ));

        let queue = unsafe { device.get_device_queue(queue_family, 0) };
        let swapchain_fn = swapchain::Device::new(instance.raw(), &device);

        let created = unsafe {
            let info = negotiated.swapchain.create_info(surface);
            swapchain_fn
                .create_swapchain(&info, None)
                .rejected("vkCreateSwapchainKHR")
                .and_then(|sc| match swapchain_fn.get_swapchain_images(sc) {
                    Ok(images) => Ok((sc, images)),
                    Err(e) => {
                        swapchain_fn.destroy_swapchain(sc, None);
                        Err(BootstrapError::driver("vkGetSwapchainImagesKHR", e))
                    }
                })
        };
        let (swapchain, images) = match created {
            Ok(v) => v,
            Err(e) => {
                unsafe { device.destroy_device(None) };
                instance.destroy_surface(surface);
                return Err(e);
            }
        };
        log.info(format_args!(
            "Created swapchain with {} images ({} x {})",
            images.len(),
            negotiated.swapchain.extent.width,
            negotiated.swapchain.extent.height
        ));

        Ok(Self {
            instance,
            surface,
            device,
            queue,
            queue_family,
            swapchain_fn,
            swapchain,
            images,
            format: negotiated.format,
            extent: negotiated.swapchain.extent,
        })
    }

    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    pub fn queue(&self) -> vk::Queue {
        self.queue
    }

    pub fn queue_family(&self) -> u32 {
        self.queue_family
    }

    pub fn swapchain(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    pub fn swapchain_images(&self) -> &[vk::Image] {
        &self.images
    }

    pub fn format(&self) -> vk::SurfaceFormatKHR {
        self.format
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    pub fn surface(&self) -> vk::SurfaceKHR {
        self.surface
    }
}

unsafe fn create_device(
    instance: &VulkanInstance,
    negotiated: &Negotiated,
    queue_family: u32,
) -> Result<ash::Device> {
    let priorities = [QUEUE_PRIORITY];
    let qinfo = vk::DeviceQueueCreateInfo {
        queue_family_index: queue_family,
        queue_count: 1,
        p_queue_priorities: priorities.as_ptr(),
        ..Default::default()
    };

    let device_exts: [*const c_char; 1] = [swapchain::NAME.as_ptr()];
    let dinfo = vk::DeviceCreateInfo {
        queue_create_info_count: 1,
        p_queue_create_infos: &qinfo,
        enabled_extension_count: device_exts.len() as u32,
        pp_enabled_extension_names: device_exts.as_ptr(),
        ..Default::default()
    };

    unsafe {
        instance
            .raw()
            .create_device(negotiated.device.handle, &dinfo, None)
    }
    .rejected("vkCreateDevice")
}

// STRICT TEARDOWN ORDER:
// - device_wait_idle()
// - swapchain BEFORE device
// - device BEFORE surface
// - the instance outlives all of it
impl Drop for Context<'_> {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();
            self.swapchain_fn.destroy_swapchain(self.swapchain, None);
            self.device.destroy_device(None);
        }
        self.instance.destroy_surface(self.surface);
    }
}
