//! CPU utilization sampled over a fixed blocking interval.
//!
//! Utilization is a delta measurement: cumulative `(idle, total)` counters
//! are read, the interval elapses, they are read again, and usage is
//! `(1 - d_idle / d_total) * 100`. The default counter source is the
//! aggregate `cpu ` line of `/proc/stat`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::diagnostics::DiagnosticSink;
use crate::error::AcquisitionError;
use crate::sensor::SensorSource;

const SENSOR: &str = "cpu_usage";

/// The standard blocking sampling window.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// One snapshot of cumulative CPU time counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    /// Time spent idle.
    pub idle: u64,
    /// Total time across all states.
    pub total: u64,
}

/// Source of cumulative CPU time counters.
///
/// A trait so tests can script the two samples taken around the interval.
pub trait CpuStats: Send + Sync {
    /// Reads idle and total CPU time since boot.
    fn cpu_times(&self) -> Result<CpuTimes, AcquisitionError>;
}

/// `/proc/stat`-backed counter source.
pub struct ProcStat {
    path: PathBuf,
}

impl ProcStat {
    /// Reads the host's `/proc/stat`.
    pub fn new() -> Self {
        Self {
            path: PathBuf::from("/proc/stat"),
        }
    }

    /// Reads a specific stat file (fixtures in tests).
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for ProcStat {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuStats for ProcStat {
    fn cpu_times(&self) -> Result<CpuTimes, AcquisitionError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            AcquisitionError::Failed(format!("failed to read {}: {e}", self.path.display()))
        })?;

        parse_cpu_line(&content).ok_or_else(|| {
            AcquisitionError::Parse(content.lines().next().unwrap_or_default().to_string())
        })
    }
}

/// Parses the aggregate line: `cpu  user nice system idle iowait irq ...`.
/// The 4th field is idle; total is the sum of all fields.
fn parse_cpu_line(content: &str) -> Option<CpuTimes> {
    let line = content.lines().next().filter(|l| l.starts_with("cpu "))?;

    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|f| f.parse().ok())
        .collect();

    if fields.len() < 4 {
        return None;
    }

    Some(CpuTimes {
        idle: fields[3],
        total: fields.iter().sum(),
    })
}

/// Reads CPU utilization as a percentage in `[0, 100]` with one decimal
/// place.
///
/// `get_value` blocks for the full sampling window.
pub struct CpuUsageSource {
    stats: Box<dyn CpuStats>,
    interval: Duration,
    sink: Arc<dyn DiagnosticSink>,
}

impl CpuUsageSource {
    /// Samples the host over the standard one-second window.
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self::with_stats(Box::new(ProcStat::new()), SAMPLE_INTERVAL, sink)
    }

    /// Samples a specific counter source over a specific window.
    pub fn with_stats(
        stats: Box<dyn CpuStats>,
        interval: Duration,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            stats,
            interval,
            sink,
        }
    }

    fn acquire(&self) -> Result<f64, AcquisitionError> {
        let before = self.stats.cpu_times()?;
        std::thread::sleep(self.interval);
        let after = self.stats.cpu_times()?;

        let d_total = after.total.saturating_sub(before.total);
        if d_total == 0 {
            return Err(AcquisitionError::Failed(
                "CPU counters did not advance over the sampling window".into(),
            ));
        }
        let d_idle = after.idle.saturating_sub(before.idle);

        let pct = (1.0 - d_idle as f64 / d_total as f64) * 100.0;
        // Truncate to one decimal place.
        Ok((pct.clamp(0.0, 100.0) * 10.0).floor() / 10.0)
    }
}

impl SensorSource for CpuUsageSource {
    fn get_value(&self) -> Option<f64> {
        self.sink.absorb(SENSOR, self.acquire())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::diagnostics::RecordingSink;

    /// Hands out pre-scripted samples in order; errors once they run out.
    struct ScriptedStats {
        samples: Mutex<VecDeque<CpuTimes>>,
    }

    impl ScriptedStats {
        fn new(samples: &[CpuTimes]) -> Self {
            Self {
                samples: Mutex::new(samples.iter().copied().collect()),
            }
        }
    }

    impl CpuStats for ScriptedStats {
        fn cpu_times(&self) -> Result<CpuTimes, AcquisitionError> {
            self.samples
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| AcquisitionError::Failed("script exhausted".into()))
        }
    }

    fn scripted_source(samples: &[CpuTimes]) -> (CpuUsageSource, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let source = CpuUsageSource::with_stats(
            Box::new(ScriptedStats::new(samples)),
            Duration::ZERO,
            sink.clone(),
        );
        (source, sink)
    }

    #[test]
    fn parses_the_aggregate_cpu_line() {
        let content = "cpu  4705 150 1120 16250 520 30 45 0 0 0\ncpu0 1000 30 280 4060 130 7 11 0 0 0\n";
        let times = parse_cpu_line(content).unwrap();
        assert_eq!(times.idle, 16250);
        assert_eq!(times.total, 22820);
    }

    #[test]
    fn rejects_files_without_an_aggregate_line() {
        assert_eq!(parse_cpu_line("cpu0 1 2 3 4 5\n"), None);
        assert_eq!(parse_cpu_line("intr 12345\n"), None);
        assert_eq!(parse_cpu_line(""), None);
    }

    #[test]
    fn rejects_truncated_aggregate_lines() {
        assert_eq!(parse_cpu_line("cpu  1 2 3\n"), None);
    }

    #[test]
    fn proc_stat_reads_a_fixture_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("stat");
        std::fs::write(&path, "cpu  100 0 50 800 50 0 0 0 0 0\n").unwrap();

        let times = ProcStat::with_path(&path).cpu_times().unwrap();
        assert_eq!(
            times,
            CpuTimes {
                idle: 800,
                total: 1000
            }
        );
    }

    #[test]
    fn proc_stat_reports_missing_files_as_failures() {
        let tmp = tempfile::tempdir().unwrap();
        let result = ProcStat::with_path(tmp.path().join("stat")).cpu_times();
        assert!(matches!(result, Err(AcquisitionError::Failed(_))));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn proc_stat_reads_the_live_host() {
        let times = ProcStat::new().cpu_times().unwrap();
        assert!(times.total > 0, "total CPU jiffies should be > 0");
        assert!(times.idle <= times.total, "idle should be <= total");
    }

    #[test]
    fn usage_is_computed_from_the_counter_deltas() {
        let (source, sink) = scripted_source(&[
            CpuTimes {
                idle: 100,
                total: 1000,
            },
            CpuTimes {
                idle: 158,
                total: 1100,
            },
        ]);

        // d_idle = 58, d_total = 100.
        assert_eq!(source.get_value(), Some(42.0));
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn usage_renders_with_one_decimal_place() {
        let (source, _) = scripted_source(&[
            CpuTimes {
                idle: 100,
                total: 1000,
            },
            CpuTimes {
                idle: 158,
                total: 1100,
            },
        ]);

        let value = source.get_value().unwrap();
        assert_eq!(format!("{value:.1}"), "42.0");
    }

    #[test]
    fn usage_is_truncated_not_rounded() {
        // d_idle = 1, d_total = 3: 66.66..% truncates to 66.6.
        let (source, _) = scripted_source(&[
            CpuTimes { idle: 0, total: 0 },
            CpuTimes { idle: 1, total: 3 },
        ]);

        assert_eq!(source.get_value(), Some(66.6));
    }

    #[test]
    fn stalled_counters_report_a_failure() {
        let same = CpuTimes {
            idle: 500,
            total: 2000,
        };
        let (source, sink) = scripted_source(&[same, same]);

        assert_eq!(source.get_value(), None);
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sensor, "cpu_usage");
        assert!(matches!(entries[0].error, AcquisitionError::Failed(_)));
    }

    #[test]
    fn counter_wraparound_is_treated_as_stalled() {
        let (source, sink) = scripted_source(&[
            CpuTimes {
                idle: 500,
                total: 2000,
            },
            CpuTimes {
                idle: 10,
                total: 100,
            },
        ]);

        assert_eq!(source.get_value(), None);
        assert!(matches!(
            sink.entries()[0].error,
            AcquisitionError::Failed(_)
        ));
    }

    #[test]
    fn failing_stats_surface_through_the_sink() {
        // Empty script: the very first sample fails.
        let (source, sink) = scripted_source(&[]);

        assert_eq!(source.get_value(), None);
        assert_eq!(sink.entries().len(), 1);
    }
}
