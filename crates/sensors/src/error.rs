//! Acquisition error types shared by every sensor source.

/// Why a sensor failed to produce a value.
///
/// Failures never escape a source's `get_value()`; they are reported to the
/// diagnostic sink and collapse to an absent reading. The kinds exist so the
/// sink can tell a capability the host simply lacks apart from one that is
/// present but broken.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AcquisitionError {
    /// The capability does not exist on this host (no battery, no audio
    /// input device).
    #[error("{0} not available")]
    Unavailable(&'static str),

    /// The underlying query, subprocess, or device call failed.
    #[error("acquisition failed: {0}")]
    Failed(String),

    /// Output was captured but carried no recognizable value.
    #[error("no numeric value in output: {0:?}")]
    Parse(String),
}
