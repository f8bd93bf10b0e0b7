use anyhow::Result;
use serde::Deserialize;

use crate::pipeline::{IdPolicy, PricePolicy};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub pipeline: PipelineConfig,
    pub ai: AiConfig,
    pub audio: AudioConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "livesale".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3030,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub id: IdPolicy,
    pub price: PricePolicy,
    /// Item ids presented at session start; grows as the seller
    /// introduces higher ids
    pub initial_stock_size: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            id: IdPolicy::default(),
            price: PricePolicy::default(),
            initial_stock_size: 70,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub api_key: String,
    pub debounce_ms: u64,
    pub timeout_secs: u64,
    /// Shorter texts never reach the remote extractor
    pub min_text_len: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            api_key: String::new(),
            debounce_ms: 1500,
            timeout_secs: 8,
            min_text_len: 6,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub remote_enabled: bool,
    pub remote_endpoint: String,
    pub voice: String,
    /// Local fallback speech command and its fixed arguments
    pub local_command: String,
    pub local_args: Vec<String>,
    pub speak_timeout_secs: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            remote_enabled: false,
            remote_endpoint: String::new(),
            voice: "th-TH-female".to_string(),
            local_command: "espeak-ng".to_string(),
            local_args: vec!["-v".to_string(), "th".to_string()],
            speak_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Load from a config file if present; every field has a working
    /// default so a missing file just runs the stock setup.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("LIVESALE").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
