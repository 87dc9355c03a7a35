//! Battery charge level from the power-supply interface.
//!
//! Linux exposes batteries under `/sys/class/power_supply/BAT*`. The charge
//! pairs (`energy_now`/`energy_full`, then `charge_now`/`charge_full`) give
//! a fractional percentage; the integer `capacity` file is the fallback.
//! Hosts without a battery report it as not available rather than broken.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::diagnostics::DiagnosticSink;
use crate::error::AcquisitionError;
use crate::sensor::SensorSource;

const SENSOR: &str = "battery";

/// Default power-supply class directory.
const SUPPLY_ROOT: &str = "/sys/class/power_supply";

/// Reads the battery charge percentage, clamped to `[0, 100]`.
pub struct BatterySource {
    supply_root: PathBuf,
    sink: Arc<dyn DiagnosticSink>,
}

impl BatterySource {
    /// Reads from the host's power-supply directory.
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self::with_supply_root(SUPPLY_ROOT, sink)
    }

    /// Reads from a specific supply root (synthetic trees in tests).
    pub fn with_supply_root(root: impl Into<PathBuf>, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            supply_root: root.into(),
            sink,
        }
    }

    fn acquire(&self) -> Result<f64, AcquisitionError> {
        let battery = find_battery(&self.supply_root)?;
        read_percent(&battery)
    }
}

impl SensorSource for BatterySource {
    fn get_value(&self) -> Option<f64> {
        self.sink.absorb(SENSOR, self.acquire())
    }
}

/// Locates the first `BAT*` entry under the supply root.
fn find_battery(root: &Path) -> Result<PathBuf, AcquisitionError> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        // A missing tree means no battery on this host, not a failure.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AcquisitionError::Unavailable("battery information"));
        }
        Err(e) => {
            return Err(AcquisitionError::Failed(format!(
                "failed to read {}: {e}",
                root.display()
            )));
        }
    };

    let mut batteries: Vec<PathBuf> = entries
        .flatten()
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|name| name.starts_with("BAT"))
        })
        .map(|e| e.path())
        .collect();
    batteries.sort();

    batteries
        .into_iter()
        .next()
        .ok_or(AcquisitionError::Unavailable("battery information"))
}

/// Computes the charge percentage from one battery directory.
fn read_percent(battery: &Path) -> Result<f64, AcquisitionError> {
    for (now, full) in [("energy_now", "energy_full"), ("charge_now", "charge_full")] {
        if let (Some(now), Some(full)) =
            (read_f64(&battery.join(now)), read_f64(&battery.join(full)))
            && full > 0.0
        {
            return Ok((now / full * 100.0).clamp(0.0, 100.0));
        }
    }

    // Integer percentage reported directly by the kernel.
    read_f64(&battery.join("capacity"))
        .map(|v| v.clamp(0.0, 100.0))
        .ok_or_else(|| {
            AcquisitionError::Failed(format!(
                "no readable charge figures under {}",
                battery.display()
            ))
        })
}

fn read_f64(path: &Path) -> Option<f64> {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
}
