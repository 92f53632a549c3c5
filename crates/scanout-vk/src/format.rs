// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use scanout_core::LogSink;

use crate::error::{BootstrapError, Result};

/// Quality rank of a swapchain color format. Zero means unusable.
pub fn score(format: vk::Format) -> u32 {
    match format {
        vk::Format::R16G16B16A16_SFLOAT => 10,
        vk::Format::A2B10G10R10_UNORM_PACK32 | vk::Format::A2R10G10B10_UNORM_PACK32 => 9,
        vk::Format::A8B8G8R8_UNORM_PACK32
        | vk::Format::R8G8B8A8_UNORM
        | vk::Format::B8G8R8A8_UNORM => 8,
        vk::Format::A8B8G8R8_SRGB_PACK32 | vk::Format::R8G8B8A8_SRGB | vk::Format::B8G8R8A8_SRGB => 7,
        vk::Format::A1R5G5B5_UNORM_PACK16
        | vk::Format::R5G5B5A1_UNORM_PACK16
        | vk::Format::B5G5R5A1_UNORM_PACK16 => 6,
        _ => 0,
    }
}

/// Highest scoring (format, colorspace) pair; the first one wins a tie.
pub fn choose_format(
    candidates: &[vk::SurfaceFormatKHR],
    log: &dyn LogSink,
) -> Result<vk::SurfaceFormatKHR> {
    let mut best: Option<(vk::SurfaceFormatKHR, u32)> = None;
    for &candidate in candidates {
        let s = score(candidate.format);
        log.trace(format_args!(
            "\tformat {:?} colorspace {:?} - score {}",
            candidate.format, candidate.color_space, s
        ));
        // strictly greater: equal scores keep the earlier candidate
        if s > best.map_or(0, |(_, b)| b) {
            best = Some((candidate, s));
        }
    }

    let (chosen, _) = best.ok_or(BootstrapError::FormatUnavailable)?;
    log.info(format_args!(
        "Chose format {:?} colorspace {:?}",
        chosen.format, chosen.color_space
    ));
    Ok(chosen)
}
