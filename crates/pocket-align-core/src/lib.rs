//! Core types for visual feeder alignment.
//!
//! This crate is intentionally small and hardware-free. It holds:
//! - machine-space [`Location`] values (millimetres),
//! - [`DetectionProfile`], the named bundle of image-processing parameters,
//! - [`ProfileStore`], the persistent profile and part-mapping collection,
//! - the stderr logger used by the binaries.

mod geometry;
mod logger;
mod profile;
mod store;

pub use geometry::Location;
pub use profile::{
    DetectionProfile, MaskKind, MaskSpec, ProfileError, ShapeMethod, SizeFilter, ThresholdSpec,
    MAX_BLUR_SIZE, MAX_MASK_SIZE,
};
pub use store::{PartMapping, ProfileStore, StoreError, DEFAULT_PROFILE_NAME};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init, init_from_env, init_with_level, LogFilter, LOG_ENV_VAR};
