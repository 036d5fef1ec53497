/*
 * Responsibility
 * - Config読み込み → tracing 初期化 → project id 解決 → credentials 探索 → identity client 生成
 * - Router 組み立て + Middleware の適用
 * - axum::serve() で起動、SIGTERM で graceful shutdown
 * - 起動時の失敗はすべて致命的 (listen する前にプロセスを終了)
 */
use std::{panic, process};

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::{Config, LogFormat},
    logging, middleware,
    services::{
        credentials,
        identity::build_identity_client,
        project_id::{self, ProjectIdSource},
    },
    state::AppState,
};

fn init_tracing(format: LogFormat) {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,cloudrun_user_auth=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        // Cloud Logging: 1 行 1 JSON (severity / trace キー付き)
        LogFormat::Json => registry
            .with(logging::cloud_logging_layer(std::io::stdout))
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panic via tracing so they don't get "lost"
        // (stderr can be hidden depending on how the process is launched.)
        tracing::error!(?info, "panic");

        // In development, fail fast: crash the whole process so we notice immediately.
        // In production, prefer the default behavior (stderr) and let the server keep running.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;

    init_tracing(config.log_format);
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = match build_state(&config).await {
        Ok(state) => state,
        Err(err) => {
            tracing::error!(error = ?err, "startup failed");
            return Err(err);
        }
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    tracing::info!(addr = %config.addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

/// Build process-level services and inject them into the shared application state.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let resolved = project_id::resolve(config.project_id.as_deref(), &config.metadata)
        .await
        .context("unable to retrieve project id")?;

    tracing::info!(
        project_id = %resolved.project_id,
        source = ?resolved.source,
        "project id resolved"
    );

    let metadata_reachable = resolved.source == ProjectIdSource::MetadataServer;
    let credentials = credentials::discover(&config.credentials, metadata_reachable)
        .context("unable to obtain default credentials")?;

    let verifier = build_identity_client(&resolved.project_id, credentials, &config.identity)
        .context("unable to initialize identity client")?;

    Ok(AppState::new(verifier, resolved.project_id))
}

pub fn build_router(state: AppState) -> Router {
    let project_id = state.project_id.clone();
    let router = Router::new().merge(api::routes()).with_state(state);
    middleware::http::apply(router, project_id)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
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

    tracing::info!("received shutdown signal (SIGTERM/ctrl-c)");
}

