//! Batch slot calibration.

use log::{info, warn};
use pocket_align_core::ProfileStore;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::cancel::CancelToken;
use crate::error::CalibrationError;
use crate::exposure::ExposureSnapshot;
use crate::feeder::{BaseTarget, Feeder};
use crate::machine::{Machine, Part};
use crate::params::CalibrationParams;
use crate::pocket::PocketCalibrator;
use crate::sink::{emit, CalibrationSink, Prefixed};
use crate::slot_order::sort_by_slot;
use crate::summary::CalibrationSummary;

/// Refines slot positions from fiducials, then pockets, feeder by feeder.
pub struct SlotCalibrator<'a> {
    params: &'a CalibrationParams,
    pocket: PocketCalibrator<'a>,
}

impl<'a> SlotCalibrator<'a> {
    pub fn new(store: &'a ProfileStore, params: &'a CalibrationParams) -> Self {
        Self {
            params,
            pocket: PocketCalibrator::new(store, params),
        }
    }

    /// Calibrate `feeders` in slot order.
    ///
    /// Only a reference part without a footprint aborts the batch, and that
    /// check happens before any motion. Per-feeder problems are reported to
    /// `sink` and counted. `cancel` is polled before each feeder.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, machine, feeders, sink, cancel), fields(feeders = feeders.len()))
    )]
    pub fn run_calibration(
        &self,
        machine: &mut dyn Machine,
        feeders: &mut [Feeder],
        sink: &mut dyn CalibrationSink,
        cancel: &CancelToken,
    ) -> Result<CalibrationSummary, CalibrationError> {
        emit(sink, "--- Starting slot calibration ---");

        let reference = self.reference_part(machine, sink);
        if reference.footprint.is_none() {
            emit(
                sink,
                format!(
                    "STOPPING: the part '{}' has no footprint. Configure its vision footprint first.",
                    reference.name
                ),
            );
            return Err(CalibrationError::MissingFootprint {
                part: reference.name,
            });
        }

        let exposure = machine.camera().and_then(|camera| camera.exposure());
        let snapshot = exposure.as_ref().and_then(ExposureSnapshot::capture_shared);

        sort_by_slot(feeders);
        emit(sink, "Sorted feeders by slot number.");

        let total = feeders.len();
        emit(sink, format!("Calibrating {total} feeders..."));
        let mut summary = CalibrationSummary::new(total);

        for (i, feeder) in feeders.iter_mut().enumerate() {
            if cancel.is_set() {
                emit(sink, "Calibration STOPPED by user.");
                summary.cancelled = true;
                break;
            }
            sink.progress(i, total);
            emit(
                sink,
                format!(">>> [{}/{}] Calibrating: {}", i + 1, total, feeder.display_name()),
            );
            summary.processed += 1;
            self.calibrate_slot(machine, feeder, &reference, sink, &mut summary);
        }

        sink.progress(total, total);
        emit(sink, "--- Calibration complete ---");
        emit(sink, format!("Updated {} / {} feeders.", summary.updated(), total));

        if summary.updated() > 0 {
            emit(sink, "Saving configuration...");
            match machine.save_config() {
                Ok(()) => {
                    summary.persisted = true;
                    emit(sink, "Configuration saved.");
                }
                Err(err) => {
                    warn!("saving machine configuration failed: {err}");
                    emit(sink, format!("Error saving config: {err}"));
                }
            }
        }

        if let (Some(handle), Some(snapshot)) = (&exposure, snapshot) {
            if snapshot.restore_shared(handle) {
                emit(sink, "Restored camera state.");
            }
        }

        info!("slot calibration finished: {summary}");
        Ok(summary)
    }

    /// Reference part by id, then by name; created (without a footprint)
    /// when the library has neither.
    fn reference_part(&self, machine: &mut dyn Machine, sink: &mut dyn CalibrationSink) -> Part {
        let key = &self.params.reference_part;
        if let Some(part) = machine.find_part(key) {
            return part;
        }
        warn!("reference part '{key}' missing from the part library; creating it");
        emit(sink, format!("Creating new fiducial part: {key}"));
        let part = Part::new(key.as_str(), key.as_str());
        machine.add_part(part.clone());
        part
    }

    fn calibrate_slot(
        &self,
        machine: &mut dyn Machine,
        feeder: &mut Feeder,
        reference: &Part,
        sink: &mut dyn CalibrationSink,
        summary: &mut CalibrationSummary,
    ) {
        let target = feeder.base_location();
        if target.is_unset() {
            emit(sink, "  SKIP: location is 0,0");
            summary.skipped += 1;
            return;
        }

        let Some(locator) = machine.fiducial_locator() else {
            emit(sink, "  ERROR: no fiducial locator on machine.");
            summary.skipped += 1;
            return;
        };
        let found = match locator.locate(&target, reference) {
            Ok(Some(found)) => found,
            Ok(None) => {
                emit(sink, "  FAILED to locate fiducial.");
                summary.failed += 1;
                return;
            }
            Err(err) => {
                warn!("fiducial search for '{}' failed: {err}", feeder.name);
                emit(sink, format!("  Vision error: {err}"));
                summary.failed += 1;
                return;
            }
        };
        emit(
            sink,
            format!("  Fiducial FOUND at: X={:.3}, Y={:.3}", found.x, found.y),
        );

        match feeder.set_base_xy(&found) {
            BaseTarget::Slot => emit(sink, "  UPDATED slot location."),
            BaseTarget::Feeder => emit(sink, "  UPDATED feeder location."),
        }
        summary.slots_updated += 1;

        emit(sink, "  > Attempting pocket calibration...");
        let outcome =
            self.pocket
                .calibrate_feeder(machine, feeder, &mut Prefixed::new(sink, "    [Pocket] "));
        if outcome.is_calibrated() {
            summary.pockets_updated += 1;
            emit(sink, "  > Pocket calibrated.");
        } else {
            emit(sink, "  > Pocket calibration skipped/failed (see details above).");
        }
    }
}
