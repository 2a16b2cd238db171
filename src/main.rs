use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use sprint_namer::config::{Config, LogFormat};
use sprint_namer::jobs::JobDispatcher;
use sprint_namer::notion::NotionClient;
use sprint_namer::pipeline::{PageJobs, UpdatePipeline};
use sprint_namer::server::{AppState, build_router};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    init_tracing(config.log_format);

    info!(config = ?config, "Starting sprint namer");
    if config.ingress.verification_secret.is_none() {
        warn!("Webhook verification token not set; signatures are not checked");
    }
    if config.ingress.target.is_unrestricted() {
        warn!("No target collection configured; every created page will be named");
    }

    let generator = Arc::new(config.name_generator()?);
    let client = Arc::new(NotionClient::new(&config.notion).context("building Notion client")?);
    let pipeline = UpdatePipeline::new(Arc::clone(&generator), client, config.mapping.clone());
    let jobs = PageJobs::new(pipeline, config.seed_property.clone());
    let dispatcher = JobDispatcher::new(config.max_pending);

    let state = AppState::new(
        generator,
        dispatcher.clone(),
        jobs,
        config.ingress.clone(),
        config.automations_token.clone(),
    );
    let app = build_router(state);

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("server failure")?;

    let abandoned = dispatcher.shutdown(config.shutdown_grace).await;
    if abandoned > 0 {
        warn!(abandoned, "Exiting with background jobs still running");
    }
    info!("Shut down");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sprint_namer=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Cancels `shutdown` on Ctrl-C or SIGTERM.
async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGTERM");
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
    shutdown.cancel();
}
