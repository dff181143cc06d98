//! Clip playback behind the session's playback seam.
//!
//! Like capture, the platform resources (rodio output stream and sink) are
//! not `Send`, so each live sound runs on a dedicated thread told to stop
//! over a channel. Natural completion is reported exactly once through the
//! session's completion notifier.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::thread::JoinHandle;
use std::time::Duration;

use async_trait::async_trait;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use rodio::{Decoder, OutputStream, Sink};

use crate::error::SessionError;
use crate::session::{CompletionNotifier, PlaybackBackend, PlaybackHandle};

/// How often the playback thread checks whether the sink has drained.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Playback backend using the system default output via rodio.
pub struct RodioPlayback;

impl RodioPlayback {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RodioPlayback {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaybackBackend for RodioPlayback {
    async fn play(
        &mut self,
        source: &Path,
        done: CompletionNotifier,
    ) -> Result<Box<dyn PlaybackHandle>, SessionError> {
        let source = source.to_path_buf();
        let (ready_tx, ready_rx) = bounded::<Result<(), String>>(1);
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let thread = std::thread::Builder::new()
            .name("hum-playback".to_string())
            .spawn(move || playback_thread(&source, ready_tx, stop_rx, done))
            .map_err(|e| {
                SessionError::PlaybackFailed(format!("failed to spawn playback thread: {e}"))
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Box::new(ThreadPlayback {
                stop_tx,
                thread: Some(thread),
            })),
            Ok(Err(message)) => {
                let _ = thread.join();
                Err(SessionError::PlaybackFailed(message))
            }
            Err(_) => {
                let _ = thread.join();
                Err(SessionError::PlaybackFailed(
                    "playback thread died during startup".to_string(),
                ))
            }
        }
    }
}

/// Owns the output stream and sink for the lifetime of one sound.
fn playback_thread(
    source: &Path,
    ready_tx: Sender<Result<(), String>>,
    stop_rx: Receiver<()>,
    done: CompletionNotifier,
) {
    // The stream must outlive the sink, so both live on this thread.
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = ready_tx.send(Err(format!("no audio output available: {e}")));
            return;
        }
    };

    let sink = match Sink::try_new(&handle) {
        Ok(sink) => sink,
        Err(e) => {
            let _ = ready_tx.send(Err(format!("failed to create sink: {e}")));
            return;
        }
    };

    let file = match File::open(source) {
        Ok(file) => file,
        Err(e) => {
            let _ = ready_tx.send(Err(format!("failed to open {}: {e}", source.display())));
            return;
        }
    };

    let decoder = match Decoder::new(BufReader::new(file)) {
        Ok(decoder) => decoder,
        Err(e) => {
            let _ = ready_tx.send(Err(format!("failed to decode {}: {e}", source.display())));
            return;
        }
    };

    sink.append(decoder);
    sink.play();
    let _ = ready_tx.send(Ok(()));

    loop {
        match stop_rx.recv_timeout(DRAIN_POLL_INTERVAL) {
            // The session released the handle; tear down without notifying.
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
            Err(RecvTimeoutError::Timeout) => {
                if sink.empty() {
                    done();
                    return;
                }
            }
        }
    }
}

/// Live sound handle: the session's side of the playback thread.
struct ThreadPlayback {
    stop_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl PlaybackHandle for ThreadPlayback {
    fn stop(mut self: Box<Self>) {
        let _ = self.stop_tx.try_send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for ThreadPlayback {
    fn drop(&mut self) {
        // Covers a handle dropped without stop(); harmless after it.
        let _ = self.stop_tx.try_send(());
    }
}
