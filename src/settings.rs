//! Strip settings
//!
//! Read from an optional JSON file by the binary; every field falls back to
//! its default when missing.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_PIXEL_COUNT, DEFAULT_TICKS_PER_SECOND};
use crate::controller::MergeMode;
use crate::error::Result;

/// Strip and render loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripSettings {
    /// Number of addressable pixels on the strip
    pub pixel_count: usize,
    /// Render loop cadence
    pub ticks_per_second: f64,
    /// How layers above the base combine
    pub merge: MergeMode,
    /// Global output brightness (0.0 - 1.0)
    pub brightness: f32,
}

impl Default for StripSettings {
    fn default() -> Self {
        Self {
            pixel_count: DEFAULT_PIXEL_COUNT,
            ticks_per_second: DEFAULT_TICKS_PER_SECOND,
            merge: MergeMode::Overwrite,
            brightness: 0.5,
        }
    }
}

impl StripSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}
