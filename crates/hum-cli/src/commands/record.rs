//! Interactive recording session.
//!
//! One keypress loop drives the session state machine: `r` toggles
//! record/stop (stop hands the clip straight to the analysis pipeline), `p`
//! toggles playback, `u` resubmits the current clip.

use anyhow::{Context, Result};
use hum_core::{
    AnalysisConfig, ArtifactStore, CpalCapture, HttpAnalysisClient, RecordingSession,
    RodioPlayback, SessionEvent, SessionState,
};
use tokio::sync::mpsc::unbounded_channel;

use crate::app::{self, Key};

pub async fn run(device: Option<String>) -> Result<()> {
    let config = AnalysisConfig::from_env();
    let client = HttpAnalysisClient::new(&config).context("Invalid analysis service URL")?;

    let capture = match device {
        Some(name) => CpalCapture::with_device(name),
        None => CpalCapture::new(),
    };

    let (events_tx, mut events_rx) = unbounded_channel();
    let mut session = RecordingSession::new(
        Box::new(capture),
        Box::new(RodioPlayback::new()),
        Box::new(client),
        ArtifactStore::in_documents(),
        events_tx,
    );

    println!("hum — record a melody, get MIDI back (service: {})", config.base_url);
    let (_guard, mut keys) = app::key_events()?;
    prompt(&session);

    loop {
        tokio::select! {
            key = keys.recv() => {
                let Some(key) = key else { break };
                match key {
                    Key::Record => toggle_record(&mut session).await,
                    Key::Play => toggle_play(&mut session).await,
                    Key::Submit => submit(&mut session).await,
                    Key::Quit => break,
                }
                prompt(&session);
            }
            event = events_rx.recv() => {
                if let Some(SessionEvent::PlaybackFinished { generation }) = event {
                    session.notify_playback_finished(generation);
                    if session.state() == SessionState::Stopped {
                        app::say("  playback finished");
                        prompt(&session);
                    }
                }
            }
        }
    }

    session.dispose();
    Ok(())
}

async fn toggle_record(session: &mut RecordingSession) {
    if session.state() == SessionState::Recording {
        match session.stop_recording().await {
            Ok(path) => {
                app::say(format!("  clip saved to {}", path.display()));
                // Stopping hands the clip straight to the pipeline.
                submit(session).await;
            }
            Err(err) => app::say(format!("  {err}")),
        }
        return;
    }

    if !session.can_record() {
        app::say("  busy uploading, try again in a moment");
        return;
    }

    match session.start_recording().await {
        Ok(()) => app::say("  recording... press r to stop"),
        Err(err) => app::say(format!("  {err}")),
    }
}

async fn toggle_play(session: &mut RecordingSession) {
    if session.state() == SessionState::Playing {
        if let Err(err) = session.stop_playback() {
            app::say(format!("  {err}"));
        }
        return;
    }

    match session.start_playback().await {
        Ok(()) => app::say("  playing... press p to stop"),
        Err(err) => app::say(format!("  {err}")),
    }
}

async fn submit(session: &mut RecordingSession) {
    app::say("  analyzing...");
    match session.submit().await {
        Ok(outcome) => {
            let pitch = &outcome.pitch;
            if pitch.frames() > 0 {
                app::say(format!(
                    "  {} frames over {:.1}s, {} voiced",
                    pitch.frames(),
                    pitch.duration_secs(),
                    pitch.voiced_frames()
                ));
            }
            match &outcome.artifact {
                Some(path) => app::say(format!("  MIDI saved to {}", path.display())),
                None => app::say("  analysis returned no MIDI"),
            }
        }
        Err(err) => app::say(format!("  {err}")),
    }
}

/// One-line status prompt showing the state and the controls that apply.
fn prompt(session: &RecordingSession) {
    let mut controls = Vec::new();

    if session.state() == SessionState::Recording {
        controls.push("[r] stop");
    } else if session.can_record() {
        controls.push("[r] record");
    }

    if session.source_uri().is_some() && session.can_play() {
        if session.state() == SessionState::Playing {
            controls.push("[p] stop playback");
        } else {
            controls.push("[p] play");
        }
        controls.push("[u] analyze again");
    }

    controls.push("[q] quit");
    app::say(format!("({}) {}", session.state(), controls.join("  ")));
}
