use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelpush_core::{
    load_config, validate_config, EncoderSettings, FfmpegTranscoder, HttpAssetClient,
    RequestProcessor, ScratchDir, Transcoder,
};

use reelpush_server::api::create_router;
use reelpush_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_tracing();

    // Config file is optional; environment variables alone are enough
    let config_path = std::env::var("REELPUSH_CONFIG")
        .map(PathBuf::from)
        .ok()
        .or_else(|| Some(PathBuf::from("config.toml")).filter(|p| p.exists()));

    match &config_path {
        Some(path) => info!("Loading configuration from {:?}", path),
        None => info!("No config file, using defaults and environment"),
    }
    let config = load_config(config_path.as_deref())
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!(version = VERSION, "Configuration loaded successfully");
    info!("Scratch directory: {:?}", config.scratch.dir);
    info!("Max upload size: {} bytes", config.server.max_upload_bytes);

    // Transcoder
    let transcoder = Arc::new(FfmpegTranscoder::new(config.transcoder.clone()));
    match transcoder.validate().await {
        Ok(()) => info!("Transcoder ready ({})", transcoder.name()),
        Err(e) => warn!(
            "Transcoder not usable yet, requests needing ffmpeg will fail: {}",
            e
        ),
    }

    // Music download and result upload share one client
    let http = Arc::new(
        HttpAssetClient::new(&config.http).context("Failed to create HTTP client")?,
    );

    let scratch = ScratchDir::new(&config.scratch.dir)
        .with_context(|| format!("Failed to create scratch dir {:?}", config.scratch.dir))?;

    let processor = RequestProcessor::new(transcoder, http.clone(), http, scratch)
        .with_encoder(EncoderSettings::from(&config.transcoder));

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, processor));

    // Create router
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Human-readable logs by default, JSON lines when `REELPUSH_LOG_FORMAT=json`.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());

    let json = std::env::var("REELPUSH_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
