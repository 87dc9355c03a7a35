//! Host sensor sources behind one uniform read contract.
//!
//! Four acquisition mechanisms, one shape: each source reads a single
//! numeric value from its corner of the host (an external temperature
//! utility, the power-supply tree, `/proc/stat`, the default audio input
//! device). Every failure is absorbed at the source boundary as one
//! diagnostic plus an absent reading, so a host missing half its sensors
//! still reports the other half.
//!
//! Layered bottom-up:
//!
//! 1. [`SensorSource`] implementations wrap the mechanisms.
//! 2. [`Sensor`] owns one source and forwards reads.
//! 3. [`SensorSuite`] reads the standard four in a fixed order and yields
//!    labelled [`Reading`]s.

pub mod battery;
pub mod cpu;
pub mod diagnostics;
pub mod error;
pub mod microphone;
pub mod report;
pub mod sensor;
pub mod temperature;

pub use battery::BatterySource;
pub use cpu::{CpuStats, CpuTimes, CpuUsageSource, ProcStat};
pub use diagnostics::{Diagnostic, DiagnosticSink, RecordingSink, TracingSink};
pub use error::AcquisitionError;
pub use microphone::{AudioCapture, CpalCapture, MicrophoneNoiseSource};
pub use report::{Reading, SensorKind, SensorSuite};
pub use sensor::{Sensor, SensorSource};
pub use temperature::TemperatureSource;
