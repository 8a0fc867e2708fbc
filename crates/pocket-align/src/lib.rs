//! Visual alignment of feeder pockets and slots on a pick-and-place machine.
//!
//! This crate re-exports the workspace crates under short names and adds
//! file-level helpers used by the `pocket-align` binary.
//!
//! ## Quickstart
//!
//! ```no_run
//! use pocket_align::core::ProfileStore;
//! use pocket_align::detect::{detect_image, DetectionReport};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ProfileStore::open("profiles.toml")?;
//! let profile = store.profile("Default Rect").ok_or("no profile")?;
//! let result = detect_image("pocket.png", profile)?;
//! let report = DetectionReport::new("pocket.png", profile, &result);
//! println!("found: {} at {:?}", report.found, report.center);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `pocket_align::core`: locations, detection profiles, the profile store, logging.
//! - `pocket_align::vision`: the threshold/contour detection engine.
//! - `pocket_align::calib`: machine capability traits and the pocket/slot calibrators.
//! - `pocket_align::detect`: image-file detection, overlays and JSON reports.

pub use pocket_align_calib as calib;
pub use pocket_align_core as core;
pub use pocket_align_vision as vision;

pub use pocket_align_calib::{
    spawn_calibration, CalibrationParams, CalibrationSummary, PocketCalibrator, SlotCalibrator,
};
pub use pocket_align_core::{DetectionProfile, Location, ProfileStore};
pub use pocket_align_vision::{DetectionEngine, DetectionResult};

pub mod detect;
