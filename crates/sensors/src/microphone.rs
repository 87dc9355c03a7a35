//! Ambient noise level from the default audio input device.
//!
//! Captures a fixed two-second mono window at 44.1 kHz as `i16` samples and
//! reduces it to one scalar: the root-mean-square amplitude, rounded to two
//! decimals. The figure is reported as a dB-like level; no reference value
//! is applied.

use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::diagnostics::DiagnosticSink;
use crate::error::AcquisitionError;
use crate::sensor::SensorSource;

const SENSOR: &str = "microphone_noise";

/// Capture sample rate in Hz.
pub const SAMPLE_RATE: u32 = 44_100;
/// Capture channel count (mono).
pub const CHANNELS: u16 = 1;
/// Capture length in seconds.
pub const CAPTURE_SECONDS: u32 = 2;
/// Samples per capture window.
pub const SAMPLE_COUNT: usize = (SAMPLE_RATE * CAPTURE_SECONDS) as usize;

/// Grace period past the nominal capture time before a stalled device is
/// reported as failed.
const STALL_GRACE: Duration = Duration::from_secs(3);

/// Blocking audio capture capability.
///
/// A trait so tests can feed synthetic buffers instead of opening a device.
pub trait AudioCapture: Send + Sync {
    /// Records `samples` samples at `sample_rate`/`channels`, blocking until
    /// the buffer is full.
    fn record(
        &self,
        samples: usize,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Vec<i16>, AcquisitionError>;
}

/// Captures from the default input device via cpal.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalCapture;

impl AudioCapture for CpalCapture {
    fn record(
        &self,
        samples: usize,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Vec<i16>, AcquisitionError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(AcquisitionError::Unavailable("audio input device"))?;

        let config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        // Stream callbacks run on cpal's thread; chunks flow back over a
        // channel while this thread blocks until the buffer is full.
        let (tx, rx) = mpsc::channel::<Result<Vec<i16>, AcquisitionError>>();
        let data_tx = tx.clone();
        let err_tx = tx;

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let _ = data_tx.send(Ok(data.to_vec()));
                },
                move |err| {
                    let _ = err_tx.send(Err(AcquisitionError::Failed(format!(
                        "audio stream error: {err}"
                    ))));
                },
                None,
            )
            .map_err(|e| AcquisitionError::Failed(format!("failed to open input stream: {e}")))?;

        stream
            .play()
            .map_err(|e| AcquisitionError::Failed(format!("failed to start capture: {e}")))?;

        let nominal = Duration::from_secs_f64(samples as f64 / sample_rate.max(1) as f64);
        let deadline = Instant::now() + nominal + STALL_GRACE;

        let mut collected: Vec<i16> = Vec::with_capacity(samples);
        while collected.len() < samples {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(AcquisitionError::Failed("audio capture stalled".into()));
            }
            match rx.recv_timeout(remaining) {
                Ok(Ok(chunk)) => collected.extend_from_slice(&chunk),
                Ok(Err(e)) => return Err(e),
                Err(_) => return Err(AcquisitionError::Failed("audio capture stalled".into())),
            }
        }

        drop(stream);
        collected.truncate(samples);
        Ok(collected)
    }
}

/// Reads the ambient noise level as an RMS amplitude figure.
///
/// `get_value` blocks for the full capture window, about two seconds.
pub struct MicrophoneNoiseSource {
    capture: Box<dyn AudioCapture>,
    sink: Arc<dyn DiagnosticSink>,
}

impl MicrophoneNoiseSource {
    /// Captures from the default input device.
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self::with_capture(Box::new(CpalCapture), sink)
    }

    /// Captures through a specific implementation.
    pub fn with_capture(capture: Box<dyn AudioCapture>, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { capture, sink }
    }

    fn acquire(&self) -> Result<f64, AcquisitionError> {
        let samples = self.capture.record(SAMPLE_COUNT, SAMPLE_RATE, CHANNELS)?;
        if samples.is_empty() {
            return Err(AcquisitionError::Failed("capture produced no samples".into()));
        }
        Ok(rms(&samples))
    }
}

impl SensorSource for MicrophoneNoiseSource {
    fn get_value(&self) -> Option<f64> {
        self.sink.absorb(SENSOR, self.acquire())
    }
}

/// Root-mean-square amplitude, rounded to two decimals.
fn rms(samples: &[i16]) -> f64 {
    let sum_squares: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    let rms = (sum_squares / samples.len() as f64).sqrt();
    (rms * 100.0).round() / 100.0
}
