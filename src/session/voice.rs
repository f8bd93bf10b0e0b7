use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::processor::SalesProcessor;

/// Where the recognition loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Idle,
    Listening,
    /// Recognition ended on its own; the driver should start it again
    Restarting,
}

/// Errors reported by the external recognition engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceError {
    /// Microphone permission denied; do not retry
    NotAllowed,
    Network,
    Audio,
    /// Silence timeouts are routine and recoverable
    NoSpeech,
    Other(String),
}

/// Events fed in by whatever drives the actual recognition engine.
#[derive(Debug, Clone)]
pub enum VoiceEvent {
    Started,
    Transcript(String),
    Ended,
    Error(VoiceError),
    StopRequested,
}

/// Keeps continuous listening alive across the engine's own session
/// limits. The engine itself is external; this loop owns the intent:
/// once started, every non-manual end transitions to `Restarting` so the
/// driver brings recognition back up. Only an explicit stop or a
/// permission error parks it in `Idle`.
pub struct VoiceControl {
    events: mpsc::Sender<VoiceEvent>,
    state: watch::Receiver<VoiceState>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl VoiceControl {
    pub fn new(processor: Arc<SalesProcessor>) -> Self {
        let (event_tx, event_rx) = mpsc::channel(64);
        let (state_tx, state_rx) = watch::channel(VoiceState::Idle);

        let worker = tokio::spawn(run(processor, event_rx, state_tx));

        Self {
            events: event_tx,
            state: state_rx,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Handle for the recognition driver to report engine events.
    pub fn events(&self) -> mpsc::Sender<VoiceEvent> {
        self.events.clone()
    }

    pub fn state(&self) -> VoiceState {
        *self.state.borrow()
    }

    /// Watch handle for drivers that need to react to state transitions
    /// (e.g. restart the engine when the state becomes `Restarting`).
    pub fn subscribe(&self) -> watch::Receiver<VoiceState> {
        self.state.clone()
    }

    pub async fn stop(&self) {
        let _ = self.events.send(VoiceEvent::StopRequested).await;
    }

    pub async fn shutdown(&self) {
        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
        }
    }
}

async fn run(
    processor: Arc<SalesProcessor>,
    mut events: mpsc::Receiver<VoiceEvent>,
    state: watch::Sender<VoiceState>,
) {
    // Set once the operator stops listening or permission is denied;
    // suppresses the automatic restart on Ended
    let mut stopped = true;

    while let Some(event) = events.recv().await {
        match event {
            VoiceEvent::Started => {
                stopped = false;
                info!("voice recognition started");
                let _ = state.send(VoiceState::Listening);
            }
            VoiceEvent::Transcript(text) => {
                if *state.borrow() != VoiceState::Listening {
                    continue;
                }
                match processor.process_voice_command(&text).await {
                    Ok(outcome) => info!(text = %text, ?outcome, "voice command resolved"),
                    Err(err) => error!(text = %text, error = %err, "voice command failed"),
                }
            }
            VoiceEvent::Ended => {
                if stopped {
                    let _ = state.send(VoiceState::Idle);
                } else {
                    // Engines cap session length; come straight back up
                    info!("voice recognition ended, restarting");
                    let _ = state.send(VoiceState::Restarting);
                }
            }
            VoiceEvent::Error(VoiceError::NotAllowed) => {
                warn!("microphone permission denied, voice control disabled");
                stopped = true;
                let _ = state.send(VoiceState::Idle);
            }
            VoiceEvent::Error(err) => {
                // Recoverable: stay up, the following Ended restarts us
                warn!(?err, "voice recognition error");
            }
            VoiceEvent::StopRequested => {
                info!("voice recognition stopped by operator");
                stopped = true;
                let _ = state.send(VoiceState::Idle);
            }
        }
    }
}
