// SPDX-License-Identifier: CEPL-1.0
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use clap::ValueEnum;
use scanout_vk::{DisplayPolicy, SurfaceKind};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceCfg {
    Windowed,
    #[default]
    Display,
}

impl From<SurfaceCfg> for SurfaceKind {
    fn from(cfg: SurfaceCfg) -> Self {
        match cfg {
            SurfaceCfg::Windowed => SurfaceKind::Windowed,
            SurfaceCfg::Display => SurfaceKind::Display,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PolicyCfg {
    First,
    #[default]
    Active,
    Inactive,
}

impl From<PolicyCfg> for DisplayPolicy {
    fn from(cfg: PolicyCfg) -> Self {
        match cfg {
            PolicyCfg::First => DisplayPolicy::First,
            PolicyCfg::Active => DisplayPolicy::Active,
            PolicyCfg::Inactive => DisplayPolicy::Inactive,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BootstrapCfg {
    pub surface: SurfaceCfg,
    pub display_policy: PolicyCfg,
    pub application_name: String,
    pub validation: bool,
}

impl Default for BootstrapCfg {
    fn default() -> Self {
        Self {
            surface: SurfaceCfg::default(),
            display_policy: PolicyCfg::default(),
            application_name: "scanout".into(),
            validation: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WindowCfg {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowCfg {
    fn default() -> Self {
        Self {
            title: "scanout".into(),
            width: 512,
            height: 512,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppCfg {
    pub bootstrap: BootstrapCfg,
    pub window: WindowCfg,
}

impl AppCfg {
    /// CLI flags win over file values.
    pub fn with_overrides(
        mut self,
        surface: Option<SurfaceCfg>,
        display_policy: Option<PolicyCfg>,
        no_validation: bool,
    ) -> Self {
        if let Some(surface) = surface {
            self.bootstrap.surface = surface;
        }
        if let Some(policy) = display_policy {
            self.bootstrap.display_policy = policy;
        }
        if no_validation {
            self.bootstrap.validation = false;
        }
        self
    }
}

pub fn parse_cfg(text: &str) -> Result<AppCfg, toml::de::Error> {
    toml::from_str(text)
}

/// A missing file is silent, a broken one is a warning; both give defaults.
pub fn load_cfg(path: &Path) -> AppCfg {
    match fs::read_to_string(path) {
        Ok(s) => parse_cfg(&s).unwrap_or_else(|e| {
            warn!("ignoring {}: {e}", path.display());
            AppCfg::default()
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("no config at {}, using defaults", path.display());
            AppCfg::default()
        }
        Err(e) => {
            warn!("cannot read {}: {e}", path.display());
            AppCfg::default()
        }
    }
}
