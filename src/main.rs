use std::sync::Arc;

use tracing::{error, info, warn};

use chat_relay::agent::OpenRouterClient;
use chat_relay::build_router;
use chat_relay::config::Config;
use chat_relay::db::history_file::{load_history, save_history};
use chat_relay::db::memory_store::InMemoryChatStore;
use chat_relay::db::ChatStore;
use chat_relay::service::chat_service::ChatService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_relay=debug,tower_http=debug".into()),
        )
        .init();

    // ── Configuration (fails fast without a provider key) ─────────────────────
    let config = Config::from_env()?;
    info!("Using model {} via {}", config.model, config.base_url);

    // ── Chat store ────────────────────────────────────────────────────────────
    let store = if config.persist_history {
        let records = load_history(&config.history_file).await?;
        info!("Loaded {} chats from {}", records.len(), config.history_file.display());
        InMemoryChatStore::from_records(records)
    } else {
        InMemoryChatStore::new()
    };
    let store = Arc::new(store);

    // ── Dependency wiring ─────────────────────────────────────────────────────
    let provider = Arc::new(OpenRouterClient::new(&config)?);
    let chat_service = ChatService::new(Arc::clone(&store), provider);
    let app = build_router(chat_service, config.cors_permissive);

    // ── Listen ────────────────────────────────────────────────────────────────
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}/");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // ── Snapshot on the way out ───────────────────────────────────────────────
    if config.persist_history {
        let records = store.snapshot().await?;
        match save_history(&config.history_file, &records).await {
            Ok(()) => info!("Saved {} chats to {}", records.len(), config.history_file.display()),
            Err(e) => error!("Failed to save chat history: {e}"),
        }
    }

    info!("chat_relay stopped");
    Ok(())
}

/// Resolves on SIGINT (Ctrl-C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!("Failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received; draining connections");
}
