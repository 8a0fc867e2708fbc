//! Background execution of a slot calibration batch.
//!
//! The worker thread owns the machine and the feeders for the whole run, so
//! a second batch cannot start on the same hardware until the first one has
//! been joined and handed them back.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use pocket_align_core::ProfileStore;

use crate::cancel::CancelToken;
use crate::error::CalibrationError;
use crate::feeder::Feeder;
use crate::machine::Machine;
use crate::params::CalibrationParams;
use crate::sink::CalibrationSink;
use crate::slot::SlotCalibrator;
use crate::summary::CalibrationSummary;

#[derive(Clone, Debug, PartialEq)]
pub enum CalibrationEvent {
    Log(String),
    Progress { current: usize, total: usize },
}

struct ChannelSink {
    tx: Sender<CalibrationEvent>,
}

impl CalibrationSink for ChannelSink {
    // A dropped receiver only means nobody is watching.
    fn log(&mut self, message: &str) {
        let _ = self.tx.send(CalibrationEvent::Log(message.to_owned()));
    }

    fn progress(&mut self, current: usize, total: usize) {
        let _ = self.tx.send(CalibrationEvent::Progress { current, total });
    }
}

/// Everything the worker hands back on join.
pub struct CalibrationRun<M> {
    pub machine: M,
    /// Feeders in the order they were processed, with updated locations.
    pub feeders: Vec<Feeder>,
    pub result: Result<CalibrationSummary, CalibrationError>,
}

/// Handle on a running batch.
pub struct CalibrationTask<M> {
    events: Receiver<CalibrationEvent>,
    cancel: CancelToken,
    handle: JoinHandle<CalibrationRun<M>>,
}

impl<M> CalibrationTask<M> {
    /// Log and progress events, in emission order.
    pub fn events(&self) -> &Receiver<CalibrationEvent> {
        &self.events
    }

    /// Ask the batch to stop before its next feeder.
    pub fn cancel(&self) {
        self.cancel.set();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the batch and take back the machine and feeders.
    pub fn join(self) -> Result<CalibrationRun<M>, CalibrationError> {
        self.handle
            .join()
            .map_err(|_| CalibrationError::WorkerPanicked)
    }
}

/// Run [`SlotCalibrator::run_calibration`] on a dedicated thread.
pub fn spawn_calibration<M>(
    mut machine: M,
    mut feeders: Vec<Feeder>,
    store: Arc<ProfileStore>,
    params: CalibrationParams,
) -> CalibrationTask<M>
where
    M: Machine + Send + 'static,
{
    let (tx, events) = mpsc::channel();
    let cancel = CancelToken::new();
    let token = cancel.clone();

    let handle = thread::spawn(move || {
        let mut sink = ChannelSink { tx };
        let calibrator = SlotCalibrator::new(&store, &params);
        let result = calibrator.run_calibration(&mut machine, &mut feeders, &mut sink, &token);
        CalibrationRun {
            machine,
            feeders,
            result,
        }
    });

    CalibrationTask {
        events,
        cancel,
        handle,
    }
}
