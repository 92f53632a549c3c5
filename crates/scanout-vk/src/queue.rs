// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use scanout_core::LogSink;

use crate::error::{BootstrapError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueFamilySelection {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilySelection {
    /// The single family both roles share; `resolve` guarantees they match.
    pub fn family(&self) -> u32 {
        self.graphics
    }
}

/// Finds the queue family used for both graphics submission and presentation.
///
/// Families are scanned from index 0. The last graphics-capable and the last
/// present-capable index are tracked independently, and the scan stops at the
/// first family that does both. Anything other than one shared family is an
/// error: there is no multi-family path.
pub fn resolve<F>(
    families: &[vk::QueueFamilyProperties],
    mut present_support: F,
    log: &dyn LogSink,
) -> Result<QueueFamilySelection>
where
    F: FnMut(u32) -> Result<bool>,
{
    let mut graphics = None;
    let mut present = None;
    for (index, family) in (0u32..).zip(families) {
        let graphics_supported = family.queue_flags.contains(vk::QueueFlags::GRAPHICS);
        let present_supported = present_support(index)?;
        log.trace(format_args!(
            "\tqueue family {index}: flags {:?}, count {}, present {}",
            family.queue_flags, family.queue_count, present_supported
        ));

        if graphics_supported {
            graphics = Some(index);
        }
        if present_supported {
            present = Some(index);
        }
        if graphics_supported && present_supported {
            break;
        }
    }

    let graphics = graphics.ok_or(BootstrapError::QueueFamilyMissing {
        capability: "graphics",
    })?;
    let present = present.ok_or(BootstrapError::QueueFamilyMissing {
        capability: "presentation",
    })?;
    if graphics != present {
        return Err(BootstrapError::MismatchedQueueFamilies { graphics, present });
    }

    log.info(format_args!("Chose graphics queue family {graphics}"));
    log.info(format_args!("Chose present queue family {present}"));
    Ok(QueueFamilySelection { graphics, present })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanout_core::NullSink;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    fn run(families: &[vk::QueueFamilyProperties], present: &[bool]) -> Result<QueueFamilySelection> {
        resolve(families, |i| Ok(present[i as usize]), &NullSink)
    }

    #[test]
    fn early_exit_on_first_combined_family() {
        let families = [
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
        ];
        let sel = run(&families, &[false, true, true]).unwrap();
        assert_eq!(
            sel,
            QueueFamilySelection {
                graphics: 2,
                present: 2
            }
        );
        assert_eq!(sel.family(), 2);
    }

    #[test]
    fn stops_querying_after_first_match() {
        let families = [
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::GRAPHICS),
        ];
        let mut queried = Vec::new();
        let sel = resolve(
            &families,
            |i| {
                queried.push(i);
                Ok(true)
            },
            &NullSink,
        )
        .unwrap();
        assert_eq!(sel.family(), 0);
        assert_eq!(queried, vec![0]);
    }

    #[test]
    fn split_families_are_rejected() {
        let families = [
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::TRANSFER),
        ];
        assert!(matches!(
            run(&families, &[false, true]),
            Err(BootstrapError::MismatchedQueueFamilies {
                graphics: 0,
                present: 1
            })
        ));
    }

    #[test]
    fn last_single_purpose_indices_are_reported() {
        let families = [
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::TRANSFER),
        ];
        assert!(matches!(
            run(&families, &[false, true, false, true]),
            Err(BootstrapError::MismatchedQueueFamilies {
                graphics: 2,
                present: 3
            })
        ));
    }

    #[test]
    fn missing_capabilities() {
        let compute_only = [family(vk::QueueFlags::COMPUTE)];
        assert!(matches!(
            run(&compute_only, &[true]),
            Err(BootstrapError::QueueFamilyMissing {
                capability: "graphics"
            })
        ));

        let no_present = [family(vk::QueueFlags::GRAPHICS)];
        assert!(matches!(
            run(&no_present, &[false]),
            Err(BootstrapError::QueueFamilyMissing {
                capability: "presentation"
            })
        ));
    }

    #[test]
    fn empty_family_list() {
        assert!(matches!(
            run(&[], &[]),
            Err(BootstrapError::QueueFamilyMissing { .. })
        ));
    }

    #[test]
    fn driver_failure_propagates() {
        let families = [family(vk::QueueFlags::GRAPHICS)];
        let res = resolve(
            &families,
            |_| {
                Err(BootstrapError::driver(
                    "vkGetPhysicalDeviceSurfaceSupportKHR",
                    vk::Result::ERROR_SURFACE_LOST_KHR,
                ))
            },
            &NullSink,
        );
        assert!(matches!(res, Err(BootstrapError::DriverRejected { .. })));
    }
}
