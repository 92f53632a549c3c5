// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use thiserror::Error;

/// Every way the bootstrap can fail. None of these are retried.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Vulkan loader unavailable: {0}")]
    LoaderUnavailable(String),
    #[error("no physical devices found")]
    NoPhysicalDevices,
    #[error("physical device {device} reports no queue families")]
    NoQueueFamilies { device: String },
    #[error("physical device {device} reports no displays")]
    NoDisplays { device: String },
    #[error("display {display} reports no display modes")]
    NoDisplayModes { display: String },
    #[error("surface reports no formats")]
    NoSurfaceFormats,
    #[error("windowed surface requested without window handles")]
    MissingWindowHandles,

    #[error("graphics queue family {graphics} differs from present queue family {present}")]
    MismatchedQueueFamilies { graphics: u32, present: u32 },
    #[error("no queue family supports {capability}")]
    QueueFamilyMissing { capability: &'static str },
    #[error("display plane {plane} has zero max extent ({width}x{height})")]
    ZeroExtent { plane: u32, width: u32, height: u32 },
    #[error("display {display} has no plane that is both current and supported")]
    NoUsablePlane { display: String },
    #[error("no display matches the {policy} selection policy")]
    NoDisplay { policy: String },
    #[error("no surface format scores above zero")]
    FormatUnavailable,

    #[error("{call} failed: {result}")]
    DriverRejected {
        call: &'static str,
        #[source]
        result: vk::Result,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    ConfigurationAbsent,
    ConstraintViolated,
    DriverRejected,
}

impl BootstrapError {
    pub fn driver(call: &'static str, result: vk::Result) -> Self {
        Self::DriverRejected { call, result }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LoaderUnavailable(_)
            | Self::NoPhysicalDevices
            | Self::NoQueueFamilies { .. }
            | Self::NoDisplays { .. }
            | Self::NoDisplayModes { .. }
            | Self::NoSurfaceFormats
            | Self::MissingWindowHandles => ErrorKind::ConfigurationAbsent,
            Self::MismatchedQueueFamilies { .. }
            | Self::QueueFamilyMissing { .. }
            | Self::ZeroExtent { .. }
            | Self::NoUsablePlane { .. }
            | Self::NoDisplay { .. }
            | Self::FormatUnavailable => ErrorKind::ConstraintViolated,
            Self::DriverRejected { .. } => ErrorKind::DriverRejected,
        }
    }
}

pub type Result<T, E = BootstrapError> = std::result::Result<T, E>;

/// Tags a raw `VkResult` with the entry point that produced it.
pub(crate) trait VkResultExt<T> {
    fn rejected(self, call: &'static str) -> Result<T>;
}

impl<T> VkResultExt<T> for ash::prelude::VkResult<T> {
    fn rejected(self, call: &'static str) -> Result<T> {
        self.map_err(|result| BootstrapError::driver(call, result))
    }
}
