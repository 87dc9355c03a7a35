//! CPU temperature via an external reporting utility.
//!
//! The utility is spawned with no arguments and its stdout is treated as
//! free-form text; the first `<digits>.<digits>` substring is taken as the
//! Celsius value. `osx-cpu-temp` prints `61.2°C`, lm-sensors prints lines
//! like `Package id 0:  +45.3°C`, and both carry such a substring.

use std::process::Command;
use std::sync::Arc;

use crate::diagnostics::DiagnosticSink;
use crate::error::AcquisitionError;
use crate::sensor::SensorSource;

const SENSOR: &str = "temperature";

/// Reads CPU temperature by running an external utility and scanning its
/// output for the first decimal number.
pub struct TemperatureSource {
    command: String,
    sink: Arc<dyn DiagnosticSink>,
}

impl TemperatureSource {
    /// Uses the platform's default temperature utility.
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self::with_command(default_command(), sink)
    }

    /// Uses a specific utility, spawned with no arguments.
    pub fn with_command(command: impl Into<String>, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            command: command.into(),
            sink,
        }
    }

    fn acquire(&self) -> Result<f64, AcquisitionError> {
        let output = Command::new(&self.command).output().map_err(|e| {
            AcquisitionError::Failed(format!("failed to run {}: {e}", self.command))
        })?;

        if !output.status.success() {
            return Err(AcquisitionError::Failed(format!(
                "{} exited with {}",
                self.command, output.status
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        first_decimal(&text).ok_or_else(|| AcquisitionError::Parse(text.trim().to_string()))
    }
}

impl SensorSource for TemperatureSource {
    fn get_value(&self) -> Option<f64> {
        self.sink.absorb(SENSOR, self.acquire())
    }
}

#[cfg(target_os = "macos")]
fn default_command() -> &'static str {
    "osx-cpu-temp"
}

#[cfg(not(target_os = "macos"))]
fn default_command() -> &'static str {
    "sensors"
}

/// Extracts the first `<digits>.<digits>` substring as a float.
///
/// Same selection a `\d+\.\d+` scan would make: a digit run immediately
/// followed by a dot and at least one more digit. Signs are not part of the
/// match and lone integers are skipped.
fn first_decimal(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            // Digit and dot bytes only, so the slice is valid UTF-8 bounds.
            return text[start..i].parse().ok();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingSink;

    #[test]
    fn extracts_a_plain_decimal() {
        assert_eq!(first_decimal("Current temp: 45.3 degrees"), Some(45.3));
    }

    #[test]
    fn takes_the_first_of_several_decimals() {
        assert_eq!(first_decimal("45.3 and 50.1"), Some(45.3));
    }

    #[test]
    fn skips_lone_integers() {
        assert_eq!(first_decimal("45 then 50.1"), Some(50.1));
    }

    #[test]
    fn requires_digits_on_both_sides_of_the_dot() {
        assert_eq!(first_decimal("N/A"), None);
        assert_eq!(first_decimal("45 degrees"), None);
        assert_eq!(first_decimal("45."), None);
        assert_eq!(first_decimal(".5"), None);
        assert_eq!(first_decimal(""), None);
    }

    #[test]
    fn handles_lm_sensors_output() {
        let out = "coretemp-isa-0000\nAdapter: ISA adapter\nPackage id 0:  +45.3\u{b0}C  (high = +80.0\u{b0}C)\n";
        assert_eq!(first_decimal(out), Some(45.3));
    }

    #[test]
    fn handles_osx_cpu_temp_output() {
        assert_eq!(first_decimal("61.2\u{b0}C\n"), Some(61.2));
    }

    #[cfg(unix)]
    mod with_fixture_scripts {
        use std::os::unix::fs::PermissionsExt;
        use std::path::{Path, PathBuf};

        use super::*;

        fn fixture_script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("fake-temp-tool");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn get_value_parses_utility_output() {
            let dir = tempfile::tempdir().unwrap();
            let script = fixture_script(dir.path(), "echo 'Current temp: 45.3 degrees'");

            let sink = Arc::new(RecordingSink::new());
            let source =
                TemperatureSource::with_command(script.to_string_lossy(), sink.clone());

            assert_eq!(source.get_value(), Some(45.3));
            assert!(sink.entries().is_empty());
        }

        #[test]
        fn unparseable_output_reports_a_parse_error() {
            let dir = tempfile::tempdir().unwrap();
            let script = fixture_script(dir.path(), "echo 'N/A'");

            let sink = Arc::new(RecordingSink::new());
            let source =
                TemperatureSource::with_command(script.to_string_lossy(), sink.clone());

            assert_eq!(source.get_value(), None);
            let entries = sink.entries();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].sensor, "temperature");
            assert_eq!(entries[0].error, AcquisitionError::Parse("N/A".into()));
        }

        #[test]
        fn nonzero_exit_reports_a_failure() {
            let dir = tempfile::tempdir().unwrap();
            let script = fixture_script(dir.path(), "echo '45.3'; exit 3");

            let sink = Arc::new(RecordingSink::new());
            let source =
                TemperatureSource::with_command(script.to_string_lossy(), sink.clone());

            assert_eq!(source.get_value(), None);
            let entries = sink.entries();
            assert_eq!(entries.len(), 1);
            assert!(matches!(entries[0].error, AcquisitionError::Failed(_)));
        }
    }

    #[test]
    fn missing_utility_reports_a_failure() {
        let sink = Arc::new(RecordingSink::new());
        let source = TemperatureSource::with_command(
            "/nonexistent/capysense-no-such-tool",
            sink.clone(),
        );

        assert_eq!(source.get_value(), None);
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sensor, "temperature");
        assert!(matches!(entries[0].error, AcquisitionError::Failed(_)));
    }
}
