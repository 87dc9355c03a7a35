//! Labelled readings and the fixed-order report over the standard sensors.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::battery::BatterySource;
use crate::cpu::CpuUsageSource;
use crate::diagnostics::DiagnosticSink;
use crate::microphone::MicrophoneNoiseSource;
use crate::sensor::Sensor;
use crate::temperature::TemperatureSource;

/// Which quantity a reading measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SensorKind {
    Temperature,
    BatteryLevel,
    CpuUsage,
    MicrophoneNoise,
}

impl SensorKind {
    /// Human-readable label for report lines.
    pub fn label(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "CPU Temperature",
            SensorKind::BatteryLevel => "Battery Level",
            SensorKind::CpuUsage => "CPU Usage",
            SensorKind::MicrophoneNoise => "Microphone Noise Level",
        }
    }

    /// Unit suffix for report lines.
    pub fn unit(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "\u{b0}C",
            SensorKind::BatteryLevel | SensorKind::CpuUsage => "%",
            SensorKind::MicrophoneNoise => "dB",
        }
    }

    /// Decimal places used when rendering a value of this kind.
    fn precision(&self) -> usize {
        match self {
            SensorKind::MicrophoneNoise => 2,
            _ => 1,
        }
    }
}

/// One labelled measurement. `value` is absent when acquisition failed; the
/// failure itself went to the diagnostic sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub kind: SensorKind,
    #[serde(default)]
    pub value: Option<f64>,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(value) => write!(
                f,
                "{}: {:.*} {}",
                self.kind.label(),
                self.kind.precision(),
                value,
                self.kind.unit()
            ),
            None => write!(f, "{}: n/a {}", self.kind.label(), self.kind.unit()),
        }
    }
}

/// An ordered set of labelled sensors read as one report.
pub struct SensorSuite {
    entries: Vec<(SensorKind, Sensor)>,
}

impl SensorSuite {
    /// Builds a suite from explicit entries (custom mechanisms, mock
    /// sources in tests).
    pub fn new(entries: Vec<(SensorKind, Sensor)>) -> Self {
        Self { entries }
    }

    /// Builds the standard host suite: temperature, battery, CPU usage,
    /// microphone noise, in reporting order.
    pub fn standard(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self::new(vec![
            (
                SensorKind::Temperature,
                Sensor::new(Box::new(TemperatureSource::new(Arc::clone(&sink)))),
            ),
            (
                SensorKind::BatteryLevel,
                Sensor::new(Box::new(BatterySource::new(Arc::clone(&sink)))),
            ),
            (
                SensorKind::CpuUsage,
                Sensor::new(Box::new(CpuUsageSource::new(Arc::clone(&sink)))),
            ),
            (
                SensorKind::MicrophoneNoise,
                Sensor::new(Box::new(MicrophoneNoiseSource::new(sink))),
            ),
        ])
    }

    /// Reads every sensor once, in order. A failing sensor contributes an
    /// absent reading without disturbing the others.
    pub fn read_all(&self) -> Vec<Reading> {
        self.entries
            .iter()
            .map(|(kind, sensor)| Reading {
                kind: *kind,
                value: sensor.read(),
            })
            .collect()
    }
}
