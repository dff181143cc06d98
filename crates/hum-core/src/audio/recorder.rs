//! Microphone capture behind the session's capture seam.
//!
//! cpal streams are not `Send`, so each live capture runs on a dedicated
//! thread that owns the stream; the handle held by the session only talks to
//! that thread over channels. Finalizing resamples the accumulated samples to
//! the 16 kHz mono contract, encodes them, and writes the clip to disk.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender, bounded};

use crate::audio::encoder::create_encoder;
use crate::error::SessionError;
use crate::resample::{CONTRACT_SAMPLE_RATE, resample_to_contract};
use crate::session::{CaptureBackend, CaptureHandle};

/// Stream errors from the current capture (reset per recording, reported
/// rate-limited: they are common on Linux and non-fatal).
static STREAM_ERROR_COUNT: AtomicU64 = AtomicU64::new(0);

/// Capture backend using the system microphone via cpal.
pub struct CpalCapture {
    device_name: Option<String>,
}

impl CpalCapture {
    /// Capture from the system default input device.
    pub fn new() -> Self {
        Self { device_name: None }
    }

    /// Capture from a named input device.
    pub fn with_device(device_name: impl Into<String>) -> Self {
        Self {
            device_name: Some(device_name.into()),
        }
    }

    fn input_device(&self) -> Result<cpal::Device, SessionError> {
        let host = cpal::default_host();
        match &self.device_name {
            Some(wanted) => {
                let mut devices = host.input_devices().map_err(|e| {
                    SessionError::CaptureFailed(format!("failed to enumerate devices: {e}"))
                })?;
                devices
                    .find(|d| {
                        d.description()
                            .map(|desc| desc.to_string() == *wanted)
                            .unwrap_or(false)
                    })
                    .ok_or_else(|| {
                        SessionError::CaptureFailed(format!("input device '{wanted}' not found"))
                    })
            }
            None => host
                .default_input_device()
                .ok_or(SessionError::PermissionDenied),
        }
    }
}

impl Default for CpalCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureBackend for CpalCapture {
    async fn request_permission(&mut self) -> Result<(), SessionError> {
        // Desktop platforms have no modal permission prompt; access is
        // granted iff an input device is actually usable.
        let device = self.input_device()?;
        device
            .default_input_config()
            .map_err(|_| SessionError::PermissionDenied)?;
        Ok(())
    }

    async fn start(&mut self) -> Result<Box<dyn CaptureHandle>, SessionError> {
        let device = self.input_device()?;
        let handle = spawn_capture_thread(device)?;
        Ok(Box::new(handle))
    }
}

/// Build an input stream that accumulates converted f32 samples.
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sink: Arc<Mutex<Vec<f32>>>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::Sample + cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    let err_fn = |err: cpal::StreamError| {
        let count = STREAM_ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
        if count == 0 {
            crate::verbose!("Audio stream error (non-fatal): {err}");
        }
    };

    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let mut sink = sink.lock().unwrap();
            sink.extend(data.iter().map(|&s| <f32 as cpal::Sample>::from_sample(s)));
        },
        err_fn,
        None,
    )
}

/// Startup report from the capture thread: device rate and channel count.
type CaptureReady = Result<(u32, u16), String>;

fn spawn_capture_thread(device: cpal::Device) -> Result<ThreadCapture, SessionError> {
    let samples: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::new()));
    let (ready_tx, ready_rx) = bounded::<CaptureReady>(1);
    let (stop_tx, stop_rx) = bounded::<()>(1);
    STREAM_ERROR_COUNT.store(0, Ordering::Relaxed);

    let sink = samples.clone();
    let thread = std::thread::Builder::new()
        .name("hum-capture".to_string())
        .spawn(move || capture_thread(device, sink, ready_tx, stop_rx))
        .map_err(|e| SessionError::CaptureFailed(format!("failed to spawn capture thread: {e}")))?;

    match ready_rx.recv() {
        Ok(Ok((sample_rate, channels))) => Ok(ThreadCapture {
            stop_tx,
            thread: Some(thread),
            samples,
            sample_rate,
            channels,
        }),
        Ok(Err(message)) => {
            let _ = thread.join();
            Err(SessionError::CaptureFailed(message))
        }
        Err(_) => {
            let _ = thread.join();
            Err(SessionError::CaptureFailed(
                "capture thread died during startup".to_string(),
            ))
        }
    }
}

/// Owns the cpal stream for the lifetime of one capture.
fn capture_thread(
    device: cpal::Device,
    sink: Arc<Mutex<Vec<f32>>>,
    ready_tx: Sender<CaptureReady>,
    stop_rx: Receiver<()>,
) {
    let config = match device.default_input_config() {
        Ok(config) => config,
        Err(e) => {
            let _ = ready_tx.send(Err(format!("no usable input config: {e}")));
            return;
        }
    };

    let sample_rate = config.sample_rate();
    let channels = config.channels();
    let stream_config: cpal::StreamConfig = config.clone().into();

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, sink),
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, sink),
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, sink),
        other => {
            let _ = ready_tx.send(Err(format!("unsupported sample format {other:?}")));
            return;
        }
    };

    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(format!("failed to open input stream: {e}")));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(format!("failed to start input stream: {e}")));
        return;
    }

    let _ = ready_tx.send(Ok((sample_rate, channels)));

    // Hold the stream open until the session releases the handle.
    let _ = stop_rx.recv();
    drop(stream);
}

/// Live capture handle: the session's side of the capture thread.
struct ThreadCapture {
    stop_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
    samples: Arc<Mutex<Vec<f32>>>,
    sample_rate: u32,
    channels: u16,
}

impl ThreadCapture {
    fn release(&mut self) {
        let _ = self.stop_tx.try_send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[async_trait]
impl CaptureHandle for ThreadCapture {
    async fn finalize(mut self: Box<Self>) -> Result<PathBuf, SessionError> {
        tokio::task::spawn_blocking(move || {
            self.release();

            let raw = std::mem::take(&mut *self.samples.lock().unwrap());
            if raw.is_empty() {
                return Err(SessionError::CaptureFailed(
                    "no audio captured from the microphone".to_string(),
                ));
            }

            let contract = resample_to_contract(&raw, self.sample_rate, self.channels)
                .map_err(|e| SessionError::CaptureFailed(e.to_string()))?;

            let encoder = create_encoder();
            let encoded = encoder.encode_samples(&contract, CONTRACT_SAMPLE_RATE)?;

            let path = recording_path(encoder.file_extension());
            std::fs::write(&path, &encoded).map_err(|e| {
                SessionError::CaptureFailed(format!("failed to write {}: {e}", path.display()))
            })?;

            let errors = STREAM_ERROR_COUNT.load(Ordering::Relaxed);
            if errors > 0 {
                crate::verbose!("capture finished with {errors} non-fatal stream errors");
            }
            crate::verbose!(
                "captured {:.1}s clip to {}",
                contract.len() as f64 / CONTRACT_SAMPLE_RATE as f64,
                path.display()
            );

            Ok(path)
        })
        .await
        .map_err(|e| SessionError::CaptureFailed(format!("finalize task panicked: {e}")))?
    }

    fn abort(mut self: Box<Self>) {
        self.release();
    }
}

impl Drop for ThreadCapture {
    fn drop(&mut self) {
        // Covers a handle dropped without finalize or abort; release() is
        // idempotent once the thread has been joined.
        self.release();
    }
}

/// Unique per-capture path in the system temp dir; the previous clip is
/// removed when a new recording starts.
fn recording_path(extension: &str) -> PathBuf {
    let unique = format!(
        "{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default(),
    );
    std::env::temp_dir().join(format!("hum_recording_{unique}.{extension}"))
}
