//! Save and restore of the camera exposure property.
//!
//! Two levels: [`ExposureGuard`] brackets a single profile override and
//! restores on drop; [`ExposureSnapshot`] is captured and restored by hand
//! around a whole batch.

use log::{debug, warn};

use crate::error::HardwareError;
use crate::machine::{lock_exposure, ExposureControl, SharedExposure};

/// Exposure state captured before an override.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExposureSnapshot {
    pub value: i32,
    pub auto: bool,
}

impl ExposureSnapshot {
    pub fn capture(control: &dyn ExposureControl) -> Result<Self, HardwareError> {
        Ok(Self {
            value: control.value()?,
            auto: control.is_auto()?,
        })
    }

    /// Mode first; the value is only written back when restoring manual mode.
    pub fn restore(&self, control: &mut dyn ExposureControl) -> Result<(), HardwareError> {
        control.set_auto(self.auto)?;
        if !self.auto {
            control.set_value(self.value)?;
        }
        Ok(())
    }

    /// Capture through a shared handle. Failures are logged and yield `None`.
    pub fn capture_shared(handle: &SharedExposure) -> Option<Self> {
        let control = lock_exposure(handle);
        match Self::capture(&*control) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!("could not read camera exposure: {err}");
                None
            }
        }
    }

    /// Restore through a shared handle, logging failures.
    pub fn restore_shared(&self, handle: &SharedExposure) -> bool {
        let mut control = lock_exposure(handle);
        match self.restore(&mut *control) {
            Ok(()) => true,
            Err(err) => {
                warn!("could not restore camera exposure {self:?}: {err}");
                false
            }
        }
    }
}

/// Scoped exposure override. Dropping the guard restores the snapshot taken
/// on acquisition, on every exit path.
#[must_use = "the override is undone as soon as the guard is dropped"]
pub struct ExposureGuard {
    handle: Option<SharedExposure>,
    snapshot: Option<ExposureSnapshot>,
}

impl ExposureGuard {
    /// Snapshot the current state, then switch to manual mode at `value`.
    ///
    /// Without an exposure capability this is a no-op guard. When applying
    /// the override fails the partially applied state is restored before the
    /// error is returned.
    pub fn acquire(handle: Option<SharedExposure>, value: i32) -> Result<Self, HardwareError> {
        let Some(handle) = handle else {
            debug!("camera has no exposure control; ignoring override {value}");
            return Ok(Self::inert());
        };
        let snapshot = ExposureSnapshot::capture_shared(&handle);
        let guard = Self {
            handle: Some(handle),
            snapshot,
        };
        guard.apply(value)?;
        Ok(guard)
    }

    fn inert() -> Self {
        Self {
            handle: None,
            snapshot: None,
        }
    }

    fn apply(&self, value: i32) -> Result<(), HardwareError> {
        if let Some(handle) = &self.handle {
            let mut control = lock_exposure(handle);
            control.set_auto(false)?;
            control.set_value(value)?;
        }
        Ok(())
    }

    /// State that will be restored on drop, if any.
    pub fn snapshot(&self) -> Option<ExposureSnapshot> {
        self.snapshot
    }
}

impl Drop for ExposureGuard {
    fn drop(&mut self) {
        if let (Some(handle), Some(snapshot)) = (&self.handle, &self.snapshot) {
            snapshot.restore_shared(handle);
        }
    }
}
