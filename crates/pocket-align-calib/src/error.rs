/// Failure reported by a motion, camera or exposure capability.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HardwareError {
    #[error("motion failed: {0}")]
    Motion(String),
    #[error("image capture failed: {0}")]
    Capture(String),
    #[error("exposure control failed: {0}")]
    Exposure(String),
}

/// Failure inside the external fiducial locator.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LocateError {
    #[error(transparent)]
    Hardware(#[from] HardwareError),
    #[error("fiducial vision failed: {0}")]
    Vision(String),
}

/// Failure while persisting machine configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("configuration save rejected: {0}")]
    Rejected(String),
}

/// Batch-level failures of a slot calibration run.
#[derive(thiserror::Error, Debug)]
pub enum CalibrationError {
    #[error("reference part '{part}' has no footprint; fiducial vision cannot run without one")]
    MissingFootprint { part: String },
    #[error("calibration worker panicked")]
    WorkerPanicked,
}
