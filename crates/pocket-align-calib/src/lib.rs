//! Feeder calibration on a pick-and-place machine.
//!
//! [`SlotCalibrator`] walks a batch of feeders in slot order, refines each
//! slot from its fiducial and then hands the feeder to [`PocketCalibrator`],
//! which images the tape pocket and stores its offset. Hardware is only seen
//! through the capability traits in [`machine`], so everything here runs
//! against simulated hardware as well.
//!
//! Long batches belong on [`spawn_calibration`], which reports through a
//! channel and can be cancelled between feeders.

mod cancel;
mod error;
mod exposure;
mod feeder;
pub mod machine;
mod mapper;
mod params;
mod pocket;
mod sink;
mod slot;
mod slot_order;
mod summary;
mod worker;

pub use cancel::CancelToken;
pub use error::{CalibrationError, ConfigError, HardwareError, LocateError};
pub use exposure::{ExposureGuard, ExposureSnapshot};
pub use feeder::{select_feeders, BaseTarget, Feeder, Slot};
pub use machine::{
    Camera, ExposureControl, FiducialLocator, Footprint, Machine, Motion, Part, SharedExposure,
};
pub use mapper::CoordinateMapper;
pub use params::{CalibrationParams, ParamsIoError, DEFAULT_REFERENCE_PART};
pub use pocket::{PocketCalibrator, PocketOutcome, PocketSkip, LANDING_TOLERANCE_MM};
pub use sink::{CalibrationSink, LogSink, RecordingSink};
pub use slot::SlotCalibrator;
pub use slot_order::{slot_number, sort_by_slot, UNORDERED_SLOT};
pub use summary::CalibrationSummary;
pub use worker::{spawn_calibration, CalibrationEvent, CalibrationRun, CalibrationTask};
