//! The uniform sensor contract and its delegation wrapper.

/// A single acquisition mechanism that can produce one value on demand.
///
/// Implementations wrap very different machinery (a subprocess, the
/// power-supply tree, an audio device) behind the same call. The contract:
/// `get_value` never fails outward. Any acquisition problem is reported to
/// the source's diagnostic sink and collapses to `None`, so one broken
/// sensor never prevents reading the others.
pub trait SensorSource: Send + Sync {
    /// Reads one value from the underlying mechanism.
    ///
    /// May block while the mechanism samples (CPU usage and microphone
    /// capture both take on the order of seconds).
    fn get_value(&self) -> Option<f64>;
}

/// Owns one [`SensorSource`] and forwards reads to it.
///
/// Call sites stay uniform regardless of the concrete source; nothing is
/// added on the way through.
pub struct Sensor {
    source: Box<dyn SensorSource>,
}

impl Sensor {
    /// Wraps a source.
    pub fn new(source: Box<dyn SensorSource>) -> Self {
        Self { source }
    }

    /// Reads one value from the held source.
    pub fn read(&self) -> Option<f64> {
        self.source.get_value()
    }
}
