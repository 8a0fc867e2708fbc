//! Progress reporting seam between the calibrators and whatever shows it.

use log::info;

/// Receives operator-facing messages and batch progress.
pub trait CalibrationSink {
    fn log(&mut self, message: &str);

    /// `current` of `total` feeders started; `(total, total)` marks the end.
    fn progress(&mut self, current: usize, total: usize);
}

/// Sink that only mirrors to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl CalibrationSink for LogSink {
    // already mirrored by the caller
    fn log(&mut self, _message: &str) {}

    fn progress(&mut self, current: usize, total: usize) {
        log::debug!("progress {current}/{total}");
    }
}

/// Collects everything in memory.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub messages: Vec<String>,
    pub progress: Vec<(usize, usize)>,
}

impl RecordingSink {
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.contains(needle))
    }
}

impl CalibrationSink for RecordingSink {
    fn log(&mut self, message: &str) {
        self.messages.push(message.to_owned());
    }

    fn progress(&mut self, current: usize, total: usize) {
        self.progress.push((current, total));
    }
}

/// Forwards to another sink with every message prefixed.
pub(crate) struct Prefixed<'a> {
    inner: &'a mut dyn CalibrationSink,
    prefix: &'static str,
}

impl<'a> Prefixed<'a> {
    pub(crate) fn new(inner: &'a mut dyn CalibrationSink, prefix: &'static str) -> Self {
        Self { inner, prefix }
    }
}

impl CalibrationSink for Prefixed<'_> {
    fn log(&mut self, message: &str) {
        self.inner.log(&format!("{}{message}", self.prefix));
    }

    fn progress(&mut self, current: usize, total: usize) {
        self.inner.progress(current, total);
    }
}

/// Send `message` to the sink and mirror it to `log`.
pub(crate) fn emit(sink: &mut dyn CalibrationSink, message: impl AsRef<str>) {
    let message = message.as_ref();
    info!("{}", message.trim_start());
    sink.log(message);
}
