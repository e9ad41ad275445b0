//! Control configuration
//!
//! Keys keep the names used by existing control files, so most of them are
//! quoted in TOML (`"control objects"`, `"velocity scaling"`, ...). Every
//! section is optional and falls back to the device defaults.

use std::path::{Path, PathBuf};

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::device::AXIS_COUNT;
use crate::dispatch::SelectionMode;
use crate::filter::{FilterSettings, IdleReset};

const CONFIG_DIR: &str = "spacenav-control";
const CONFIG_FILE: &str = "control.toml";

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct ControlConfig {
    /// Ordered `KIND NAME` entries; absent means every registry object
    /// except joints
    #[serde(rename = "control objects", skip_serializing_if = "Option::is_none")]
    pub control_objects: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaling: Option<Vec<f64>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadbound: Option<Deadbound>,

    #[serde(rename = "static count threshold", skip_serializing_if = "Option::is_none")]
    pub static_count_threshold: Option<u32>,

    #[serde(rename = "velocity scaling")]
    pub velocity_scaling: VelocityScaling,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stereo_camera: Option<Vec<String>>,

    #[serde(rename = "slice volume", skip_serializing_if = "Option::is_none")]
    pub slice_volume: Option<SliceVolume>,

    #[serde(rename = "publish state", skip_serializing_if = "Option::is_none")]
    pub publish_state: Option<PublishState>,

    pub selection: SelectionMode,
    pub idle_reset: IdleReset,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct Deadbound {
    pub translation: f64,
    pub rotation: f64,
}

impl Default for Deadbound {
    fn default() -> Self {
        Self {
            translation: 0.1,
            rotation: 0.1,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct VelocityScaling {
    pub linear: f64,
    pub angular: f64,
}

impl Default for VelocityScaling {
    fn default() -> Self {
        Self {
            linear: 100.0,
            angular: 2.0,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct SliceVolume {
    #[serde(rename = "volume name")]
    pub volume_name: String,
    #[serde(rename = "matcap path")]
    pub matcap_path: PathBuf,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct PublishState {
    pub object: String,
}

impl ControlConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| eyre!("Failed to parse control config: {}", e))
    }

    pub async fn load(path: &Path) -> Result<Self> {
        info!("Loading control config {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read control config {}: {}", path.display(), e))?;
        let config = Self::from_toml_str(&content)?;
        debug!("Control config: {:?}", config);
        Ok(config)
    }

    /// Loads the file at `path`, or the per-user default when present
    ///
    /// Returns the default config when neither exists.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path).await;
        }
        let fallback = Self::default_path();
        let exists = tokio::fs::try_exists(&fallback)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?;
        if exists {
            Self::load(&fallback).await
        } else {
            debug!("No control config at {}, using defaults", fallback.display());
            Ok(Self::default())
        }
    }

    /// `<config dir>/spacenav-control/control.toml`
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| {
                warn!("Could not determine config directory, using current directory");
                PathBuf::from(".")
            });
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    }

    /// Filter settings with this config's overrides applied
    pub fn filter_settings(&self) -> FilterSettings {
        let mut settings = FilterSettings::default();

        match &self.scaling {
            Some(scaling) if scaling.len() == AXIS_COUNT => {
                settings.axis_scale.copy_from_slice(scaling);
            }
            Some(scaling) => warn!(
                "Ignoring scaling with {} entries, expected {}; keeping defaults",
                scaling.len(),
                AXIS_COUNT
            ),
            None => {}
        }

        let deadbound = self.deadbound.unwrap_or_default();
        settings.deadbound[..3].fill(deadbound.translation);
        settings.deadbound[3..].fill(deadbound.rotation);

        if let Some(threshold) = self.static_count_threshold {
            settings.idle_threshold = threshold;
        }
        settings.idle_reset = self.idle_reset;
        settings
    }
}
