//! Capability traits the calibrators drive.
//!
//! The machine owns its hardware; calibrators only ever borrow it through
//! these traits, so a simulated machine can stand in for tests.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use image::RgbImage;
use nalgebra::Vector2;
use pocket_align_core::Location;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, HardwareError, LocateError};

/// Body outline the fiducial locator matches against.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub body_width: f64,
    pub body_height: f64,
}

/// Component definition from the machine's part library.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footprint: Option<Footprint>,
}

impl Part {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            footprint: None,
        }
    }

    pub fn with_footprint(mut self, footprint: Footprint) -> Self {
        self.footprint = Some(footprint);
        self
    }
}

pub trait Motion {
    /// Raise the head to its safe travel height.
    fn move_to_safe(&mut self) -> Result<(), HardwareError>;

    /// Move to `location` at `speed` (fraction of the machine maximum).
    fn move_to(&mut self, location: &Location, speed: f64) -> Result<(), HardwareError>;
}

/// Hardware exposure property of a camera.
pub trait ExposureControl {
    fn value(&self) -> Result<i32, HardwareError>;
    fn set_value(&mut self, value: i32) -> Result<(), HardwareError>;
    fn is_auto(&self) -> Result<bool, HardwareError>;
    fn set_auto(&mut self, auto: bool) -> Result<(), HardwareError>;
}

/// Exposure handle shared between a camera and the guards that override it.
pub type SharedExposure = Arc<Mutex<dyn ExposureControl + Send>>;

/// Lock an exposure handle, recovering from a poisoned lock.
///
/// A guard dropped during a panic must still be able to restore state.
pub fn lock_exposure(handle: &SharedExposure) -> MutexGuard<'_, dyn ExposureControl + Send + 'static> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

pub trait Camera: Motion {
    fn capture(&mut self) -> Result<RgbImage, HardwareError>;

    /// Millimetres per pixel along image X and Y.
    fn units_per_pixel(&self) -> Vector2<f64>;

    /// Current camera position in machine coordinates.
    fn location(&self) -> Location;

    /// `None` when the device exposes no exposure property.
    fn exposure(&self) -> Option<SharedExposure>;
}

pub trait FiducialLocator {
    /// Search for `part` around `nominal`. `Ok(None)` is a clean miss.
    fn locate(&mut self, nominal: &Location, part: &Part) -> Result<Option<Location>, LocateError>;
}

/// The machine as seen by the calibrators.
pub trait Machine {
    fn camera(&mut self) -> Option<&mut dyn Camera>;

    fn fiducial_locator(&mut self) -> Option<&mut dyn FiducialLocator>;

    /// Part lookup by id.
    fn part(&self, id: &str) -> Option<Part>;

    fn parts(&self) -> Vec<Part>;

    fn add_part(&mut self, part: Part);

    /// Persist feeder and part configuration.
    fn save_config(&mut self) -> Result<(), ConfigError>;

    /// Part lookup by id, then by display name.
    fn find_part(&self, key: &str) -> Option<Part> {
        self.part(key)
            .or_else(|| self.parts().into_iter().find(|p| p.name == key))
    }
}
