// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use scanout_core::LogSink;

use crate::catalog::{enumerate_surface_properties, PhysicalDeviceInfo, SurfaceProperties};
use crate::display::DisplayChoice;
use crate::driver::{DisplaySurfaceRequest, Driver};
use crate::error::{BootstrapError, Result, VkResultExt};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplaySurfaceParams {
    pub choice: DisplayChoice,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowedSurfaceParams {
    pub display: RawDisplayHandle,
    pub window: RawWindowHandle,
}

/// Which inputs a surface is built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceParams {
    Display(DisplaySurfaceParams),
    Windowed(WindowedSurfaceParams),
}

/// A created surface together with its freshly queried properties.
#[derive(Clone, Debug)]
pub struct PresentSurface {
    pub handle: vk::SurfaceKHR,
    pub properties: SurfaceProperties,
    /// Windows may be occluded; direct-to-display scanout never is.
    pub clipped: bool,
}

/// Fixed plane setup for direct-to-display surfaces.
const PLANE_STACK_INDEX: u32 = 0;
const PLANE_GLOBAL_ALPHA: f32 = 1.0;

pub fn create_surface(
    driver: &dyn Driver,
    device: &PhysicalDeviceInfo,
    params: &SurfaceParams,
    log: &dyn LogSink,
) -> Result<PresentSurface> {
    let (handle, clipped) = match params {
        SurfaceParams::Display(p) => (create_display_surface(driver, device, p, log)?, false),
        SurfaceParams::Windowed(p) => {
            let handle = driver
                .create_window_surface(p.display, p.window)
                .rejected("vkCreate*SurfaceKHR")?;
            log.trace(format_args!("Created window surface"));
            (handle, true)
        }
    };

    // Not usable until its properties are cached.
    match enumerate_surface_properties(driver, device.handle, handle, log) {
        Ok(properties) => Ok(PresentSurface {
            handle,
            properties,
            clipped,
        }),
        Err(e) => {
            driver.destroy_surface(handle);
            Err(e)
        }
    }
}

fn create_display_surface(
    driver: &dyn Driver,
    device: &PhysicalDeviceInfo,
    params: &DisplaySurfaceParams,
    log: &dyn LogSink,
) -> Result<vk::SurfaceKHR> {
    let choice = params.choice;
    let display = device
        .displays
        .get(choice.display)
        .ok_or_else(|| BootstrapError::NoDisplays {
            device: device.summary.name.clone(),
        })?;
    let mode = display
        .modes
        .get(choice.mode)
        .ok_or_else(|| BootstrapError::NoDisplayModes {
            display: display.name.clone(),
        })?
        .handle;
    if choice.plane as usize >= display.planes.len() {
        return Err(BootstrapError::NoUsablePlane {
            display: display.name.clone(),
        });
    }

    let caps = driver
        .plane_capabilities(device.handle, mode, choice.plane)
        .rejected("vkGetDisplayPlaneCapabilitiesKHR")?;
    let extent = caps.max_dst_extent;
    if extent.width == 0 || extent.height == 0 {
        return Err(BootstrapError::ZeroExtent {
            plane: choice.plane,
            width: extent.width,
            height: extent.height,
        });
    }

    let request = DisplaySurfaceRequest {
        mode,
        plane_index: choice.plane,
        plane_stack_index: PLANE_STACK_INDEX,
        transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
        global_alpha: PLANE_GLOBAL_ALPHA,
        alpha_mode: vk::DisplayPlaneAlphaFlagsKHR::OPAQUE,
        extent,
    };
    let surface = driver
        .create_display_surface(&request)
        .rejected("vkCreateDisplayPlaneSurfaceKHR")?;

    log.trace(format_args!(
        "Created surface {} x {} on plane index {}",
        extent.width, extent.height, choice.plane
    ));
    Ok(surface)
}
