use std::fmt;

use serde::Serialize;

/// Counters for one slot calibration batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CalibrationSummary {
    pub total: usize,
    /// Feeders the loop reached before finishing or being cancelled.
    pub processed: usize,
    /// Unset location or no fiducial locator.
    pub skipped: usize,
    pub slots_updated: usize,
    pub pockets_updated: usize,
    /// Fiducial not found or locator error.
    pub failed: usize,
    pub cancelled: bool,
    /// Machine configuration was saved successfully.
    pub persisted: bool,
}

impl CalibrationSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Slot and pocket updates together.
    pub fn updated(&self) -> usize {
        self.slots_updated + self.pockets_updated
    }
}

impl fmt::Display for CalibrationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} processed, {} slot(s) and {} pocket(s) updated, {} skipped, {} failed",
            self.processed,
            self.total,
            self.slots_updated,
            self.pockets_updated,
            self.skipped,
            self.failed
        )?;
        if self.cancelled {
            write!(f, ", cancelled")?;
        }
        Ok(())
    }
}
