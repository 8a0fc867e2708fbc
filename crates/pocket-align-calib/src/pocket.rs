//! Per-feeder pocket refinement.

use std::fmt;
use std::thread;

use log::warn;
use nalgebra::Vector2;
use pocket_align_core::{DetectionProfile, Location, ProfileStore};
use pocket_align_vision::DetectionEngine;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::HardwareError;
use crate::exposure::ExposureGuard;
use crate::feeder::Feeder;
use crate::machine::{Camera, Machine};
use crate::mapper::CoordinateMapper;
use crate::params::CalibrationParams;
use crate::sink::{emit, CalibrationSink};

/// Distance between commanded and reported camera position worth reporting.
pub const LANDING_TOLERANCE_MM: f64 = 0.05;

/// Configuration or hardware gap that stops a feeder before any motion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PocketSkip {
    NoPart,
    NoProfileMapping { part: String },
    ProfileMissing { profile: String },
    NoCamera,
}

impl fmt::Display for PocketSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PocketSkip::NoPart => write!(f, "Skipping: no part assigned."),
            PocketSkip::NoProfileMapping { part } => {
                write!(f, "No vision mapping found for part: {part}")
            }
            PocketSkip::ProfileMissing { profile } => write!(f, "Profile '{profile}' not found!"),
            PocketSkip::NoCamera => write!(f, "Error: no camera found."),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PocketOutcome {
    /// Offset written to the feeder and the feeder enabled.
    Calibrated { offset: Location },
    Skipped(PocketSkip),
    /// The image was analysed but no candidate survived the filters.
    NotFound,
    Failed(HardwareError),
}

impl PocketOutcome {
    pub fn is_calibrated(&self) -> bool {
        matches!(self, PocketOutcome::Calibrated { .. })
    }
}

/// Finds the pocket under the camera and stores its offset on the feeder.
pub struct PocketCalibrator<'a> {
    store: &'a ProfileStore,
    params: &'a CalibrationParams,
    engine: DetectionEngine,
}

impl<'a> PocketCalibrator<'a> {
    pub fn new(store: &'a ProfileStore, params: &'a CalibrationParams) -> Self {
        Self {
            store,
            params,
            engine: DetectionEngine::new(),
        }
    }

    /// Resolve the feeder's profile, look at `base + offset`, and rewrite the
    /// offset from the detected pocket.
    ///
    /// Never fails outright: hardware errors come back as
    /// [`PocketOutcome::Failed`] after being reported to `sink`.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, machine, feeder, sink), fields(feeder = %feeder.name))
    )]
    pub fn calibrate_feeder(
        &self,
        machine: &mut dyn Machine,
        feeder: &mut Feeder,
        sink: &mut dyn CalibrationSink,
    ) -> PocketOutcome {
        emit(sink, format!("Calibrating pocket for {}", feeder.display_name()));

        let profile = match self.resolve_profile(feeder) {
            Ok(profile) => profile,
            Err(skip) => return skipped(sink, skip),
        };
        emit(sink, format!("Using profile: {}", profile.name));

        let Some(camera) = machine.camera() else {
            return skipped(sink, PocketSkip::NoCamera);
        };

        let base = feeder.base_location();
        let search = feeder.search_location();
        let pixel = match self.measure(camera, profile, &search, sink) {
            Ok(Some(pixel)) => pixel,
            Ok(None) => {
                emit(sink, "Vision failed: pocket not found.");
                return PocketOutcome::NotFound;
            }
            Err(err) => {
                warn!("pocket calibration of '{}' failed: {err}", feeder.name);
                emit(sink, format!("Pocket calibration error: {err}"));
                return PocketOutcome::Failed(err);
            }
        };

        let mapper = CoordinateMapper::new(camera.units_per_pixel());
        let delta = mapper.world_delta(pixel);
        let offset = mapper.pocket_offset(&search, &base, pixel, feeder.offset.as_ref());
        emit(sink, format!("Found! Delta: X={:.3}, Y={:.3}", delta.x, delta.y));

        feeder.offset = Some(offset);
        feeder.enabled = true;
        PocketOutcome::Calibrated { offset }
    }

    fn resolve_profile(&self, feeder: &Feeder) -> Result<&'a DetectionProfile, PocketSkip> {
        let part = feeder.part.as_ref().ok_or(PocketSkip::NoPart)?;
        let name = self.store.resolve_for_part(&part.id, &part.name).ok_or_else(|| {
            PocketSkip::NoProfileMapping {
                part: part.name.clone(),
            }
        })?;
        self.store
            .profile(name)
            .ok_or_else(|| PocketSkip::ProfileMissing {
                profile: name.to_owned(),
            })
    }

    /// Move, settle, capture under the profile's exposure, detect.
    ///
    /// Returns the winner's pixel delta from the image center.
    fn measure(
        &self,
        camera: &mut dyn Camera,
        profile: &DetectionProfile,
        search: &Location,
        sink: &mut dyn CalibrationSink,
    ) -> Result<Option<Vector2<f64>>, HardwareError> {
        emit(sink, "Moving to search location...");
        camera.move_to_safe()?;
        camera.move_to(search, self.params.move_speed)?;
        thread::sleep(self.params.camera_settle());

        let landed = camera.location();
        let miss = Vector2::new(landed.x - search.x, landed.y - search.y).norm();
        if miss > LANDING_TOLERANCE_MM {
            emit(
                sink,
                format!(
                    "Warning: camera settled at X={:.3}, Y={:.3}, {miss:.3} mm from the search location.",
                    landed.x, landed.y
                ),
            );
        }

        let _exposure = match profile.exposure_override() {
            Some(value) => {
                emit(sink, format!("Applying profile exposure: {value}"));
                let guard = ExposureGuard::acquire(camera.exposure(), value)?;
                thread::sleep(self.params.exposure_settle());
                Some(guard)
            }
            None => None,
        };

        emit(sink, "Analysing image...");
        let image = camera.capture()?;
        let result = self.engine.process(&image, profile);
        Ok(result.pixel_offset())
    }
}

fn skipped(sink: &mut dyn CalibrationSink, skip: PocketSkip) -> PocketOutcome {
    emit(sink, skip.to_string());
    PocketOutcome::Skipped(skip)
}
