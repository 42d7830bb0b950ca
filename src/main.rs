use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures::StreamExt;

use remont_bot::admin::admin_routes;
use remont_bot::bot::{BotApi, Dispatcher, TelegramClient, menu_commands};
use remont_bot::config::BotConfig;
use remont_bot::store::{ContentStore, Database, LibSqlBackend, UserStore};
use remont_bot::wizard::{InMemorySessionStore, SessionStore, spawn_idle_sweeper};

/// How often idle wizard sessions are checked for eviction.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export TELEGRAM_BOT_TOKEN=123456:ABC...");
        std::process::exit(1);
    });

    eprintln!("🛠  Remont bot v{}", env!("CARGO_PKG_VERSION"));

    // ── Database ─────────────────────────────────────────────────────────
    let backend = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .unwrap_or_else(|e| {
                eprintln!(
                    "Error: Failed to open database at {}: {}",
                    config.db_path.display(),
                    e
                );
                std::process::exit(1);
            }),
    );
    let db: Arc<dyn Database> = backend.clone();
    let content: Arc<dyn ContentStore> = backend.clone();
    let users: Arc<dyn UserStore> = backend;
    eprintln!("   Database: {}", config.db_path.display());

    // ── Admin API ────────────────────────────────────────────────────────
    match config.admin.clone() {
        Some(auth) => {
            let app = admin_routes(Arc::clone(&db), auth);
            let port = config.http_port;
            let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
                .await
                .with_context(|| format!("failed to bind admin port {port}"))?;
            tokio::spawn(async move {
                tracing::info!(port, "Admin API started");
                if let Err(e) = axum::serve(listener, app).await {
                    tracing::error!(error = %e, "Admin API stopped");
                }
            });
            eprintln!("   Admin API: http://0.0.0.0:{port}");
        }
        None => eprintln!("   Admin API: disabled (AUTH_LOGIN/AUTH_PASSWORD/AUTH_TOKEN not set)"),
    }

    // ── Wizard sessions ──────────────────────────────────────────────────
    let sessions: Arc<dyn SessionStore> = InMemorySessionStore::new();
    match config.session_idle_timeout {
        Some(max_idle) => {
            let _sweeper = spawn_idle_sweeper(Arc::clone(&sessions), max_idle, SWEEP_INTERVAL);
            eprintln!("   Sessions: expire after {}s idle", max_idle.as_secs());
        }
        None => eprintln!("   Sessions: no expiry"),
    }

    // ── Telegram ─────────────────────────────────────────────────────────
    let client = TelegramClient::new(config.telegram_token.clone());
    if let Err(e) = client.set_commands(&menu_commands()).await {
        tracing::warn!(error = %e, "Failed to register bot commands");
    }

    let api: Arc<dyn BotApi> = Arc::new(client.clone());
    let dispatcher = Arc::new(Dispatcher::new(api, content, users, sessions));

    eprintln!(
        "   Polling: getUpdates every {}s\n",
        config.poll_timeout.as_secs()
    );

    let mut events = client.updates(config.poll_timeout);
    while let Some(event) = events.next().await {
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            dispatcher.dispatch(event).await;
        });
    }

    tracing::info!("Update stream ended, shutting down");
    Ok(())
}
