// SPDX-License-Identifier: CEPL-1.0
use ash::vk;

/// The negotiated swapchain contract, before any driver call.
#[derive(Clone, Copy, Debug)]
pub struct SwapchainDescriptor {
    pub min_image_count: u32,
    pub format: vk::SurfaceFormatKHR,
    pub extent: vk::Extent2D,
    pub array_layers: u32,
    pub usage: vk::ImageUsageFlags,
    pub sharing_mode: vk::SharingMode,
    pub queue_family_indices: [u32; 1],
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
    pub composite_alpha: vk::CompositeAlphaFlagsKHR,
    pub present_mode: vk::PresentModeKHR,
    pub clipped: bool,
}

impl SwapchainDescriptor {
    /// Derives every field straight from the surface; nothing is clamped
    /// or padded.
    pub fn build(
        capabilities: &vk::SurfaceCapabilitiesKHR,
        format: vk::SurfaceFormatKHR,
        queue_family: u32,
        clipped: bool,
    ) -> Self {
        Self {
            min_image_count: capabilities.min_image_count,
            format,
            extent: capabilities.current_extent,
            array_layers: 1,
            usage: vk::ImageUsageFlags::COLOR_ATTACHMENT,
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            queue_family_indices: [queue_family],
            pre_transform: capabilities.current_transform,
            composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
            present_mode: vk::PresentModeKHR::FIFO,
            clipped,
        }
    }

    pub fn create_info(&self, surface: vk::SurfaceKHR) -> vk::SwapchainCreateInfoKHR<'_> {
        vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(self.min_image_count)
            .image_format(self.format.format)
            .image_color_space(self.format.color_space)
            .image_extent(self.extent)
            .image_array_layers(self.array_layers)
            .image_usage(self.usage)
            .image_sharing_mode(self.sharing_mode)
            .queue_family_indices(&self.queue_family_indices)
            .pre_transform(self.pre_transform)
            .composite_alpha(self.composite_alpha)
            .present_mode(self.present_mode)
            .clipped(self.clipped)
    }
}
