use anyhow::{Context, Result};
use serde_json::json;
use std::time::Duration;
use tokio::process::Child;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::SfxKind;

/// Speech synthesis seam. `speak` resolves when playback has finished;
/// `stop` cancels whatever is currently playing.
#[async_trait::async_trait]
pub trait SpeechEngine: Send + Sync {
    async fn speak(&self, text: &str) -> Result<()>;

    async fn stop(&self);

    /// Engine name for logging
    fn name(&self) -> &str;
}

/// Sound-effect playback seam, same contract as speech.
#[async_trait::async_trait]
pub trait SfxPlayer: Send + Sync {
    async fn play(&self, kind: SfxKind) -> Result<()>;

    async fn stop(&self);
}

/// Remote high-quality voice provider, reached over HTTP. The endpoint
/// performs synthesis and playback and replies when the clip finished;
/// any non-success status or transport failure triggers local fallback.
pub struct RemoteSpeechEngine {
    client: reqwest::Client,
    endpoint: String,
    voice: String,
}

impl RemoteSpeechEngine {
    pub fn new(endpoint: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            voice: voice.into(),
        }
    }
}

#[async_trait::async_trait]
impl SpeechEngine for RemoteSpeechEngine {
    async fn speak(&self, text: &str) -> Result<()> {
        debug!(engine = "remote", %text, "speaking");

        self.client
            .post(&self.endpoint)
            .json(&json!({ "text": text, "voice": self.voice }))
            .send()
            .await
            .context("remote speech request failed")?
            .error_for_status()
            .context("remote speech provider rejected the request")?;

        Ok(())
    }

    async fn stop(&self) {
        // Best effort: the provider exposes a stop endpoint next to speak
        let url = format!("{}/stop", self.endpoint.trim_end_matches('/'));
        if let Err(e) = self.client.post(&url).send().await {
            debug!("remote speech stop failed (ignored): {e}");
        }
    }

    fn name(&self) -> &str {
        "remote"
    }
}

/// Local/native synthesis via an external speech command (`espeak-ng`,
/// `say`, ...). Always available as the deterministic fallback path.
pub struct LocalSpeechEngine {
    program: String,
    args: Vec<String>,
    current: Mutex<Option<Child>>,
}

impl LocalSpeechEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            current: Mutex::new(None),
        }
    }
}

#[async_trait::async_trait]
impl SpeechEngine for LocalSpeechEngine {
    async fn speak(&self, text: &str) -> Result<()> {
        debug!(engine = "local", %text, "speaking");

        let child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn speech command {}", self.program))?;

        {
            let mut current = self.current.lock().await;
            *current = Some(child);
        }

        // Wait for playback to finish, unless stop() takes the child first
        loop {
            let mut current = self.current.lock().await;
            match current.as_mut() {
                Some(child) => match child.try_wait().context("speech command wait failed")? {
                    Some(status) => {
                        *current = None;
                        if !status.success() {
                            warn!(engine = "local", %status, "speech command exited abnormally");
                        }
                        return Ok(());
                    }
                    None => drop(current),
                },
                None => return Ok(()), // cancelled by stop()
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    async fn stop(&self) {
        let mut current = self.current.lock().await;
        if let Some(mut child) = current.take() {
            if let Err(e) = child.kill().await {
                debug!("local speech kill failed (ignored): {e}");
            }
        }
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// Fixed-duration SFX playback. Each effect kind blocks the queue for its
/// configured duration, which is how the provider-side clip lengths are
/// modeled when the actual sink plays fire-and-forget.
pub struct TimedSfxPlayer {
    success: Duration,
    error: Duration,
    cancel: Duration,
}

impl TimedSfxPlayer {
    pub fn new(success: Duration, error: Duration, cancel: Duration) -> Self {
        Self {
            success,
            error,
            cancel,
        }
    }
}

impl Default for TimedSfxPlayer {
    fn default() -> Self {
        // The ding is a 300 ms chirp; error/cancel cues run a touch longer
        Self::new(
            Duration::from_millis(300),
            Duration::from_millis(500),
            Duration::from_millis(400),
        )
    }
}

#[async_trait::async_trait]
impl SfxPlayer for TimedSfxPlayer {
    async fn play(&self, kind: SfxKind) -> Result<()> {
        let duration = match kind {
            SfxKind::Success => self.success,
            SfxKind::Error => self.error,
            SfxKind::Cancel => self.cancel,
        };
        tokio::time::sleep(duration).await;
        Ok(())
    }

    async fn stop(&self) {}
}
