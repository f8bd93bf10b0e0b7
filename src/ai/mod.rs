//! AI fallback extraction
//!
//! Last-resort field extraction for utterances the deterministic pipeline
//! could not resolve. The remote call is debounced (rapid partial speech
//! results replace each other instead of stacking requests), hard-limited
//! by a timeout, and every outcome is logged. Failure is never an error to
//! the user: the utterance simply resolves to nothing.

mod gemini;

pub use gemini::GeminiExtractor;

use anyhow::Result;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fields the remote extractor managed to pull out of the text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AiExtraction {
    pub item_id: Option<u32>,
    pub price: Option<u32>,
    pub size: Option<String>,
}

/// Remote field extraction seam. Implementations must be cancel-safe:
/// dropping the future aborts the request.
#[async_trait::async_trait]
pub trait AiExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<Option<AiExtraction>>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Debounce + timeout wrapper around an [`AiExtractor`].
///
/// Each call bumps a generation counter and then sleeps for the debounce
/// window; if a newer call arrived in the meantime the stale one gives up
/// before ever touching the network.
pub struct AiFallback {
    extractor: Arc<dyn AiExtractor>,
    debounce: Duration,
    timeout: Duration,
    min_text_len: usize,
    generation: AtomicU64,
}

impl AiFallback {
    pub fn new(
        extractor: Arc<dyn AiExtractor>,
        debounce: Duration,
        timeout: Duration,
        min_text_len: usize,
    ) -> Self {
        Self {
            extractor,
            debounce,
            timeout,
            min_text_len,
            generation: AtomicU64::new(0),
        }
    }

    /// Whether this text is worth a remote call at all.
    pub fn wants(&self, text: &str) -> bool {
        text.chars().count() >= self.min_text_len
    }

    pub async fn extract_debounced(&self, text: &str) -> Option<AiExtraction> {
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::time::sleep(self.debounce).await;

        // A newer utterance superseded this one while we were waiting
        if self.generation.load(Ordering::SeqCst) != my_generation {
            debug!("AI fallback call superseded before dispatch, dropping");
            return None;
        }

        match tokio::time::timeout(self.timeout, self.extractor.extract(text)).await {
            Ok(Ok(Some(extraction))) => {
                info!(
                    provider = self.extractor.name(),
                    id = ?extraction.item_id,
                    price = ?extraction.price,
                    "AI fallback resolved fields"
                );
                Some(extraction)
            }
            Ok(Ok(None)) => {
                info!(provider = self.extractor.name(), "AI fallback found nothing");
                None
            }
            Ok(Err(e)) => {
                warn!(provider = self.extractor.name(), "AI fallback error: {e:#}");
                None
            }
            Err(_) => {
                warn!(provider = self.extractor.name(), "AI fallback timed out");
                None
            }
        }
    }
}
