use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use livesale::ai::{AiFallback, GeminiExtractor};
use livesale::audio::{AudioSerializer, LocalSpeechEngine, RemoteSpeechEngine, TimedSfxPlayer};
use livesale::http::{create_router, AppState};
use livesale::ledger::{MemoryStockStore, ReservationLedger};
use livesale::pipeline::IntentRouter;
use livesale::session::{NicknameCache, ResolutionLog, SalesProcessor};
use livesale::Config;

#[derive(Debug, Parser)]
#[command(name = "livesale", about = "Live-commerce control panel core")]
struct Args {
    /// Config file (no extension), defaults apply when missing
    #[arg(short, long, default_value = "config/livesale")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Livesale v0.1.0");
    info!("Loaded config: {}", cfg.service.name);

    // Audio: remote engine when configured, local command always as fallback
    let primary = cfg.audio.remote_enabled.then(|| {
        Arc::new(RemoteSpeechEngine::new(
            cfg.audio.remote_endpoint.clone(),
            cfg.audio.voice.clone(),
        )) as Arc<dyn livesale::audio::SpeechEngine>
    });
    let fallback = Arc::new(LocalSpeechEngine::new(
        cfg.audio.local_command.clone(),
        cfg.audio.local_args.clone(),
    ));
    let audio = AudioSerializer::new(
        primary,
        fallback,
        Arc::new(TimedSfxPlayer::default()),
        Duration::from_secs(cfg.audio.speak_timeout_secs),
    );

    // AI fallback extraction, optional
    let ai = cfg.ai.enabled.then(|| {
        Arc::new(AiFallback::new(
            Arc::new(GeminiExtractor::new(
                cfg.ai.endpoint.clone(),
                cfg.ai.api_key.clone(),
            )),
            Duration::from_millis(cfg.ai.debounce_ms),
            Duration::from_secs(cfg.ai.timeout_secs),
            cfg.ai.min_text_len,
        ))
    });

    let store = Arc::new(MemoryStockStore::new(cfg.pipeline.initial_stock_size));
    let ledger = Arc::new(ReservationLedger::new(store));

    let log = Arc::new(ResolutionLog::default());
    let nicknames = Arc::new(NicknameCache::new());
    let router = IntentRouter::new(cfg.pipeline.id.clone(), cfg.pipeline.price.clone(), ai);
    let processor = Arc::new(SalesProcessor::new(
        router,
        cfg.pipeline.id.clone(),
        cfg.pipeline.price.clone(),
        Arc::clone(&ledger),
        Arc::clone(&audio),
        Arc::clone(&nicknames),
        Arc::clone(&log),
    ));

    let state = AppState {
        processor,
        ledger,
        audio: Arc::clone(&audio),
        nicknames,
        log,
    };

    let app = create_router(state);
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
