// SPDX-License-Identifier: CEPL-1.0
use std::fmt;

use ash::vk;
use scanout_core::LogSink;

use crate::error::{BootstrapError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayMode {
    pub handle: vk::DisplayModeKHR,
    pub visible_region: vk::Extent2D,
    /// Millihertz, as the driver reports it.
    pub refresh_rate: u32,
}

/// One device plane seen from a particular display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayPlane {
    pub index: u32,
    /// The plane is scanning out this display right now.
    pub current: bool,
    /// This display is in the plane's supported-displays set.
    pub supported: bool,
    pub has_current_display: bool,
    pub current_stack_index: u32,
    pub supported_display_count: usize,
}

/// A display and everything the picker needs to know about it.
///
/// `planes` always has one entry per device plane, indexed by plane index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayInfo {
    pub handle: vk::DisplayKHR,
    pub name: String,
    pub physical_resolution: vk::Extent2D,
    pub modes: Vec<DisplayMode>,
    pub planes: Vec<DisplayPlane>,
}

impl DisplayInfo {
    pub fn is_any_current(&self) -> bool {
        self.planes.iter().any(|p| p.current)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayPolicy {
    /// First display in enumeration order, no questions asked.
    First,
    /// First display whose "any plane current" flag equals `active`.
    #[default]
    Active,
    Inactive,
}

impl fmt::Display for DisplayPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::First => "first",
            Self::Active => "active",
            Self::Inactive => "inactive",
        })
    }
}

/// Indices into the owning device's display arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayChoice {
    pub display: usize,
    pub mode: usize,
    pub plane: u32,
}

pub fn choose_display(displays: &[DisplayInfo], policy: DisplayPolicy) -> Option<usize> {
    let prefer_active = match policy {
        DisplayPolicy::First => return if displays.is_empty() { None } else { Some(0) },
        DisplayPolicy::Active => true,
        DisplayPolicy::Inactive => false,
    };
    displays
        .iter()
        .position(|d| d.is_any_current() == prefer_active)
}

/// Last plane that is both driving this display and allowed to drive it.
pub fn choose_plane(display: &DisplayInfo) -> Result<u32> {
    let mut chosen = None;
    for plane in &display.planes {
        if plane.current && plane.supported {
            chosen = Some(plane.index);
        }
    }
    chosen.ok_or_else(|| BootstrapError::NoUsablePlane {
        display: display.name.clone(),
    })
}

// First fit. Resolution and refresh rate are not compared.
pub fn choose_mode(display: &DisplayInfo) -> Result<usize> {
    if display.modes.is_empty() {
        return Err(BootstrapError::NoDisplayModes {
            display: display.name.clone(),
        });
    }
    Ok(0)
}

/// Display, plane and mode in one go. `displays` must not be empty.
pub fn select(
    displays: &[DisplayInfo],
    policy: DisplayPolicy,
    log: &dyn LogSink,
) -> Result<DisplayChoice> {
    let index = choose_display(displays, policy).ok_or(BootstrapError::NoDisplay {
        policy: policy.to_string(),
    })?;
    let display = &displays[index];
    log.info(format_args!("Chose display {} ({})", index, display.name));

    let plane = choose_plane(display)?;
    log.info(format_args!("Chose display plane {plane}"));

    let mode = choose_mode(display)?;
    let m = &display.modes[mode];
    log.info(format_args!(
        "Chose display mode {}: {} x {} @ {} mHz",
        mode, m.visible_region.width, m.visible_region.height, m.refresh_rate
    ));

    Ok(DisplayChoice {
        display: index,
        mode,
        plane,
    })
}
