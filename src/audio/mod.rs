//! Sequential audio output
//!
//! Ordered, non-overlapping SFX + speech feedback for a hands-busy
//! operator. The serializer owns the queue; speech engines and the SFX
//! player are injected seams so the actual sinks stay external.

mod serializer;
mod speech;

pub use serializer::AudioSerializer;
pub use speech::{LocalSpeechEngine, RemoteSpeechEngine, SfxPlayer, SpeechEngine, TimedSfxPlayer};

use serde::Serialize;

/// Which cue to play ahead of an announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SfxKind {
    Success,
    Error,
    Cancel,
}

/// One unit of audible feedback. Consumed strictly FIFO.
#[derive(Debug, Clone, Default)]
pub struct AudioTask {
    pub sfx: Option<SfxKind>,
    pub announce: Option<String>,
}

impl AudioTask {
    pub fn sfx(kind: SfxKind) -> Self {
        Self {
            sfx: Some(kind),
            announce: None,
        }
    }

    pub fn announce(text: impl Into<String>) -> Self {
        Self {
            sfx: None,
            announce: Some(text.into()),
        }
    }

    pub fn with_announce(kind: SfxKind, text: impl Into<String>) -> Self {
        Self {
            sfx: Some(kind),
            announce: Some(text.into()),
        }
    }
}
