//! Detection on image files, with overlay and JSON report output.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use nalgebra::Vector2;
use serde::Serialize;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::calib::CoordinateMapper;
use crate::core::{DetectionProfile, ProfileStore, StoreError};
use crate::vision::{Candidate, DetectionEngine, DetectionResult};

#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("unknown detection profile '{0}'")]
    UnknownProfile(String),
}

/// Decode `path` and run `profile` on it.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(path, profile), fields(profile = %profile.name))
)]
pub fn detect_image(
    path: impl AsRef<Path>,
    profile: &DetectionProfile,
) -> Result<DetectionResult, DetectError> {
    let img = image::open(path.as_ref())?;
    Ok(DetectionEngine::new().process_dynamic(&img, profile))
}

/// Like [`detect_image`], looking the profile up by name.
pub fn detect_with_store(
    path: impl AsRef<Path>,
    store: &ProfileStore,
    profile_name: &str,
) -> Result<DetectionResult, DetectError> {
    let profile = store
        .profile(profile_name)
        .ok_or_else(|| DetectError::UnknownProfile(profile_name.to_owned()))?;
    detect_image(path, profile)
}

/// Serializable summary of one detection run.
#[derive(Clone, Debug, Serialize)]
pub struct DetectionReport {
    pub image: String,
    pub profile: String,
    pub width: u32,
    pub height: u32,
    pub found: bool,
    /// Winner center in pixels.
    pub center: Option<[f64; 2]>,
    /// Winner offset from the image center in pixels (+y down).
    pub offset_px: Option<[f64; 2]>,
    /// Machine-space offset, when a camera scale was supplied (+y up).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_mm: Option<[f64; 2]>,
    pub accepted: usize,
    pub candidates: Vec<Candidate>,
}

impl DetectionReport {
    pub fn new(image: impl Into<String>, profile: &DetectionProfile, result: &DetectionResult) -> Self {
        Self {
            image: image.into(),
            profile: profile.name.clone(),
            width: result.image_width,
            height: result.image_height,
            found: result.found,
            center: result.center.map(|c| [c.x, c.y]),
            offset_px: result.pixel_offset().map(|d| [d.x, d.y]),
            offset_mm: None,
            accepted: result.accepted_count(),
            candidates: result.candidates.clone(),
        }
    }

    /// Fill `offset_mm` using the camera's millimetres per pixel.
    pub fn with_units_per_pixel(mut self, units_per_pixel: Vector2<f64>) -> Self {
        let mapper = CoordinateMapper::new(units_per_pixel);
        self.offset_mm = self.offset_px.map(|[dx, dy]| {
            let d = mapper.world_delta(Vector2::new(dx, dy));
            [d.x, d.y]
        });
        self
    }

    /// Write this report as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DetectError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Where [`save_overlays`] put its images.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlayPaths {
    pub overlay: PathBuf,
    pub binary: PathBuf,
}

/// Save both debug overlays as `<stem>_overlay.png` and `<stem>_binary.png`
/// in `dir`, creating it if needed.
pub fn save_overlays(
    result: &DetectionResult,
    dir: impl AsRef<Path>,
    stem: &str,
) -> Result<OverlayPaths, DetectError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let paths = OverlayPaths {
        overlay: dir.join(format!("{stem}_overlay.png")),
        binary: dir.join(format!("{stem}_binary.png")),
    };
    result.overlay.save(&paths.overlay)?;
    result.binary_overlay.save(&paths.binary)?;
    info!(
        "overlays written to {} and {}",
        paths.overlay.display(),
        paths.binary.display()
    );
    Ok(paths)
}
