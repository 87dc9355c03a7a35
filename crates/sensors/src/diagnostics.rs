//! Side-channel reporting for sensor acquisition failures.
//!
//! Sources never let a failure escape `get_value()`; they hand it to a
//! [`DiagnosticSink`] and return `None` instead. The sink is injected so
//! embedders can route diagnostics wherever they like and tests can capture
//! them without scraping process output.

use std::sync::{Mutex, MutexGuard};

use crate::error::AcquisitionError;

/// One recorded acquisition problem.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Short name of the reporting sensor (`"temperature"`, `"battery"`, ...).
    pub sensor: &'static str,
    pub error: AcquisitionError,
}

/// Where sensor sources report acquisition problems.
pub trait DiagnosticSink: Send + Sync {
    /// Records one problem for the named sensor.
    fn report(&self, sensor: &'static str, error: &AcquisitionError);

    /// Collapses an acquisition result to the optional-reading contract,
    /// reporting the error exactly once on the way.
    fn absorb(&self, sensor: &'static str, result: Result<f64, AcquisitionError>) -> Option<f64> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.report(sensor, &error);
                None
            }
        }
    }
}

/// Default sink: forwards diagnostics to `tracing`.
///
/// A capability the host lacks logs at `info`; a present-but-broken sensor
/// logs at `error`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, sensor: &'static str, error: &AcquisitionError) {
        match error {
            AcquisitionError::Unavailable(_) => {
                tracing::info!(sensor, error = %error, "sensor capability not present");
            }
            AcquisitionError::Failed(_) | AcquisitionError::Parse(_) => {
                tracing::error!(sensor, error = %error, "sensor acquisition failed");
            }
        }
    }
}

/// In-memory sink that keeps every diagnostic it receives, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl RecordingSink {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        // Poisoning only means a writer panicked; the entries are still valid.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, sensor: &'static str, error: &AcquisitionError) {
        self.lock().push(Diagnostic {
            sensor,
            error: error.clone(),
        });
    }
}
