use anyhow::{Context, Result};
use clap::Parser;
use loqa_transcribe::jobs::{Dispatcher, JobRegistry, StreamSettings};
use loqa_transcribe::nats::{NatsNotifier, NoopNotifier, Notifier};
use loqa_transcribe::pipeline::PipelineContext;
use loqa_transcribe::storage::{LocalBlobStore, TranscriptKeys};
use loqa_transcribe::{create_router, stt, AppState, Config};
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "loqa-transcribe")]
#[command(about = "Asynchronous long-recording transcription service", long_about = None)]
struct Args {
    /// Settings file (extension optional); LOQA_* environment variables override it
    #[arg(long, default_value = "config/loqa-transcribe")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Loqa Transcribe v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let store = Arc::new(LocalBlobStore::new(
        &cfg.storage.root,
        cfg.storage.public_base_url.clone(),
    )?);
    let recognizer = stt::create_recognizer(&cfg.stt)?;

    let notifier: Arc<dyn Notifier> = match &cfg.nats.url {
        Some(url) => Arc::new(NatsNotifier::connect(url, cfg.nats.subject.clone()).await?),
        None => {
            warn!("nats.url not set; transcript notifications are disabled");
            Arc::new(NoopNotifier)
        }
    };

    let pipeline = PipelineContext {
        registry: Arc::new(JobRegistry::with_cancel_policy(cfg.pipeline.cancel_terminal)),
        store: store.clone(),
        recognizer,
        notifier,
        keys: TranscriptKeys::new(cfg.storage.transcripts_prefix.clone()),
        chunk_window: cfg.pipeline.chunk_window(),
        chunk_order: cfg.pipeline.chunk_order,
    };

    let dispatcher = Arc::new(Dispatcher::start(cfg.pipeline.workers));
    let stream = StreamSettings {
        interval: cfg.pipeline.stream_interval(),
        timeout: cfg.pipeline.job_timeout(),
    };

    let shutdown = CancellationToken::new();
    let state = AppState::new(pipeline, Arc::clone(&dispatcher), stream)
        .with_shutdown(shutdown.clone());
    let router = create_router(state, Some(store.root()), &cfg.service.http.cors_origins);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            // End open status streams so the server can drain
            shutdown.cancel();
        })
        .await
        .context("HTTP server failed")?;

    dispatcher.shutdown().await;
    info!("Shutdown complete");

    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to listen for SIGTERM: {}", e);
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
