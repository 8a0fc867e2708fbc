//! Calibration tunables and their JSON form.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::feeder::{select_feeders, Feeder};

#[derive(thiserror::Error, Debug)]
pub enum ParamsIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Part used to locate slot fiducials when the params name none.
pub const DEFAULT_REFERENCE_PART: &str = "Fiducial-1mm";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationParams {
    /// Pause after moving the camera, before capturing.
    pub camera_settle_ms: u64,
    /// Extra pause after a hardware exposure override.
    pub exposure_settle_ms: u64,
    /// Motion speed as a fraction of the machine maximum.
    pub move_speed: f64,
    /// Part id or name handed to the fiducial locator.
    pub reference_part: String,
    /// Only feeders whose name contains this are selected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feeder_filter: Option<String>,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            camera_settle_ms: 500,
            exposure_settle_ms: 200,
            move_speed: 1.0,
            reference_part: DEFAULT_REFERENCE_PART.to_owned(),
            feeder_filter: None,
        }
    }
}

impl CalibrationParams {
    /// Defaults with every settle delay removed, for simulated hardware.
    pub fn without_delays() -> Self {
        Self {
            camera_settle_ms: 0,
            exposure_settle_ms: 0,
            ..Self::default()
        }
    }

    pub fn camera_settle(&self) -> Duration {
        Duration::from_millis(self.camera_settle_ms)
    }

    pub fn exposure_settle(&self) -> Duration {
        Duration::from_millis(self.exposure_settle_ms)
    }

    /// Enabled feeders matching [`Self::feeder_filter`].
    pub fn select(&self, feeders: &[Feeder]) -> Vec<Feeder> {
        select_feeders(feeders, self.feeder_filter.as_deref())
    }

    /// Load params from a JSON file; missing fields take their defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ParamsIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write params as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ParamsIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
