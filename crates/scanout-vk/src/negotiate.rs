// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use scanout_core::LogSink;

use crate::catalog::{enumerate_physical_devices, PhysicalDeviceInfo};
use crate::display::{self, DisplayChoice, DisplayPolicy};
use crate::driver::Driver;
use crate::error::{BootstrapError, Result, VkResultExt};
use crate::format::choose_format;
use crate::queue::{resolve, QueueFamilySelection};
use crate::surface::{
    create_surface, DisplaySurfaceParams, PresentSurface, SurfaceParams, WindowedSurfaceParams,
};
use crate::swapchain::SwapchainDescriptor;

/// Where the frames should end up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentTarget {
    Display { policy: DisplayPolicy },
    Window {
        display: RawDisplayHandle,
        window: RawWindowHandle,
    },
}

impl PresentTarget {
    pub fn is_display(&self) -> bool {
        matches!(self, Self::Display { .. })
    }
}

/// Every decision the bootstrap makes, before a logical device exists.
#[derive(Clone, Debug)]
pub struct Negotiated {
    pub device: PhysicalDeviceInfo,
    pub display: Option<DisplayChoice>,
    pub surface: PresentSurface,
    pub queues: QueueFamilySelection,
    pub format: vk::SurfaceFormatKHR,
    pub swapchain: SwapchainDescriptor,
}

/// Enumerate → choose → create surface → resolve → build.
///
/// On failure after the surface exists, the surface is destroyed before the
/// error is returned.
pub fn negotiate(
    driver: &dyn Driver,
    target: PresentTarget,
    log: &dyn LogSink,
) -> Result<Negotiated> {
    let mut devices = enumerate_physical_devices(driver, target.is_display(), log)?;

    // Always the first device.
    let device_index = 0;
    let device = devices.swap_remove(device_index);
    log.info(format_args!(
        "Chose physical device {device_index} ({})",
        device.name()
    ));

    let (params, display) = match target {
        PresentTarget::Display { policy } => {
            if device.displays.is_empty() {
                return Err(BootstrapError::NoDisplays {
                    device: device.summary.name.clone(),
                });
            }
            let choice = display::select(&device.displays, policy, log)?;
            (
                SurfaceParams::Display(DisplaySurfaceParams { choice }),
                Some(choice),
            )
        }
        PresentTarget::Window { display, window } => (
            SurfaceParams::Windowed(WindowedSurfaceParams { display, window }),
            None,
        ),
    };

    let surface = create_surface(driver, &device, &params, log)?;

    match decide(driver, &device, &surface, log) {
        Ok((queues, format, swapchain)) => Ok(Negotiated {
            device,
            display,
            surface,
            queues,
            format,
            swapchain,
        }),
        Err(e) => {
            driver.destroy_surface(surface.handle);
            Err(e)
        }
    }
}

fn decide(
    driver: &dyn Driver,
    device: &PhysicalDeviceInfo,
    surface: &PresentSurface,
    log: &dyn LogSink,
) -> Result<(QueueFamilySelection, vk::SurfaceFormatKHR, SwapchainDescriptor)> {
    let queues = resolve(
        &device.queue_families,
        |index| {
            driver
                .surface_support(device.handle, index, surface.handle)
                .rejected("vkGetPhysicalDeviceSurfaceSupportKHR")
        },
        log,
    )?;
    let format = choose_format(&surface.properties.formats, log)?;
    let swapchain = SwapchainDescriptor::build(
        &surface.properties.capabilities,
        format,
        queues.family(),
        surface.clipped,
    );
    log.info(format_args!(
        "Swapchain: {} images, {} x {}, {:?}, clipped {}",
        swapchain.min_image_count,
        swapchain.extent.width,
        swapchain.extent.height,
        swapchain.present_mode,
        swapchain.clipped
    ));
    Ok((queues, format, swapchain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeDisplay, FakeDriver, FakePlane};
    use ash::vk::Handle;
    use raw_window_handle::{XcbDisplayHandle, XcbWindowHandle};
    use scanout_core::{NullSink, RecordingSink};
    use std::num::NonZeroU32;

    const ACTIVE: PresentTarget = PresentTarget::Display {
        policy: DisplayPolicy::Active,
    };

    #[test]
    fn end_to_end_display_direct() {
        let driver = FakeDriver::single_display();
        let log = RecordingSink::new();

        let n = negotiate(&driver, ACTIVE, &log).unwrap();

        let choice = n.display.unwrap();
        assert_eq!(choice.display, 0);
        assert_eq!(choice.plane, 0);
        assert_eq!(choice.mode, 0);
        let mode = n.device.displays[choice.display].modes[choice.mode];
        assert_eq!(
            mode.visible_region,
            vk::Extent2D {
                width: 1920,
                height: 1080
            }
        );

        assert_eq!(n.format.format, vk::Format::R16G16B16A16_SFLOAT);
        assert_eq!(n.queues.family(), 0);
        assert_eq!(
            n.swapchain.extent,
            vk::Extent2D {
                width: 1920,
                height: 1080
            }
        );
        assert_eq!(n.swapchain.present_mode, vk::PresentModeKHR::FIFO);
        assert!(!n.swapchain.clipped);
        assert!(log.contains("Chose display plane 0"));
        assert!(driver.destroyed_surfaces.borrow().is_empty());
    }

    #[test]
    fn zero_extent_stops_before_swapchain() {
        let mut driver = FakeDriver::single_display();
        driver.plane_extent = vk::Extent2D {
            width: 0,
            height: 0,
        };
        let res = negotiate(&driver, ACTIVE, &NullSink);
        assert!(matches!(res, Err(BootstrapError::ZeroExtent { .. })));
        assert!(driver.created_surfaces.borrow().is_empty());
        assert_eq!(driver.surface_queries.get(), 0);
    }

    #[test]
    fn missing_displays() {
        let mut driver = FakeDriver::single_display();
        driver.displays.clear();
        assert!(matches!(
            negotiate(&driver, ACTIVE, &NullSink),
            Err(BootstrapError::NoDisplays { .. })
        ));
    }

    #[test]
    fn inactive_policy_skips_lit_display() {
        let mut driver = FakeDriver::single_display();
        driver.displays.push(FakeDisplay {
            handle: vk::DisplayKHR::from_raw(2),
            name: "DP-2".into(),
            modes: vec![(vk::DisplayModeKHR::from_raw(20), 1280, 1024, 75_000)],
        });
        let target = PresentTarget::Display {
            policy: DisplayPolicy::Inactive,
        };
        // DP-2 is inactive but no plane currently drives it
        assert!(matches!(
            negotiate(&driver, target, &NullSink),
            Err(BootstrapError::NoUsablePlane { .. })
        ));

        // a second plane already scanning out DP-2 makes it active
        driver.planes.push(FakePlane {
            current_display: vk::DisplayKHR::from_raw(2),
            supported_displays: vec![vk::DisplayKHR::from_raw(2)],
        });
        assert!(matches!(
            negotiate(&driver, target, &NullSink),
            Err(BootstrapError::NoDisplay { .. })
        ));
        let n = negotiate(&driver, ACTIVE, &NullSink).unwrap();
        assert_eq!(n.display.unwrap().display, 0);
    }

    #[test]
    fn split_queue_families_release_the_surface() {
        let mut driver = FakeDriver::single_display();
        driver.queue_families = vec![
            vk::QueueFamilyProperties {
                queue_flags: vk::QueueFlags::GRAPHICS,
                queue_count: 1,
                ..Default::default()
            },
            vk::QueueFamilyProperties {
                queue_flags: vk::QueueFlags::TRANSFER,
                queue_count: 1,
                ..Default::default()
            },
        ];
        driver.present_support = vec![false, true];

        let res = negotiate(&driver, ACTIVE, &NullSink);
        assert!(matches!(
            res,
            Err(BootstrapError::MismatchedQueueFamilies {
                graphics: 0,
                present: 1
            })
        ));
        assert_eq!(driver.destroyed_surfaces.borrow().len(), 1);
    }

    #[test]
    fn unusable_formats_release_the_surface() {
        let mut driver = FakeDriver::single_display();
        driver.formats = vec![vk::SurfaceFormatKHR {
            format: vk::Format::R8G8B8_UNORM,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }];
        assert!(matches!(
            negotiate(&driver, ACTIVE, &NullSink),
            Err(BootstrapError::FormatUnavailable)
        ));
        assert_eq!(driver.destroyed_surfaces.borrow().len(), 1);
    }

    #[test]
    fn windowed_target_skips_display_scan() {
        let driver = FakeDriver::single_display();
        let target = PresentTarget::Window {
            display: XcbDisplayHandle::new(None, 0).into(),
            window: XcbWindowHandle::new(NonZeroU32::new(3).unwrap()).into(),
        };
        let n = negotiate(&driver, target, &NullSink).unwrap();
        assert!(n.display.is_none());
        assert!(n.device.displays.is_empty());
        assert!(n.swapchain.clipped);
        assert_eq!(driver.display_queries.get(), 0);
    }

    #[test]
    fn first_device_is_chosen() {
        let mut driver = FakeDriver::single_display();
        driver.devices.push(vk::PhysicalDevice::from_raw(0x2000));
        let n = negotiate(&driver, ACTIVE, &NullSink).unwrap();
        assert_eq!(n.device.handle, driver.devices[0]);
    }
}
