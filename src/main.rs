mod agent;
mod catalog;
mod config;
mod db;
mod errors;
mod intent;
mod models;
mod routes;
mod service;
mod state;

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, error, info, warn};

use crate::agent::{GeminiBackend, ShoppingAgent};
use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::db::{ConversationRepository, ConversationStore, LocalConversationStore};
use crate::intent::IntentResolver;
use crate::routes::build_router;
use crate::service::chat_service::ChatService;
use crate::service::session_service::SessionService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shopping_assistant=debug,tower_http=debug".into()),
        )
        .init();

    let config = AppConfig::from_env();

    // ── Catalog ───────────────────────────────────────────────────────────────
    let catalog = match &config.catalog_path {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("loading catalog from {}", path.display()))?,
        None => Catalog::builtin().context("loading built-in catalog")?,
    };
    info!("Catalog ready with {} products", catalog.products().len());

    // ── Conversation store ────────────────────────────────────────────────────
    let store: Arc<dyn ConversationStore> = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
                .context("connecting to PostgreSQL")?;

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("running database migrations")?;

            info!("Database connection established and migrations applied");
            Arc::new(ConversationRepository::new(pool))
        }
        None => {
            info!("DATABASE_URL not set, keeping conversations in memory");
            Arc::new(LocalConversationStore::new())
        }
    };

    // ── Dependency wiring ─────────────────────────────────────────────────────
    if config.gemini.is_none() {
        warn!("GEMINI_API_URL or GEMINI_API_KEY missing; model fallback will fail");
    }
    let agent = ShoppingAgent::new(Arc::new(GeminiBackend::new(config.gemini.clone())));
    let chat = ChatService::new(Arc::new(catalog), IntentResolver::standard(), agent);
    let session = SessionService::new(store, chat);
    session.load().await;

    spawn_title_refresh(session.clone(), config.title_refresh_interval);

    // ── Listen ────────────────────────────────────────────────────────────────
    let app = build_router(session);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Listening on http://{addr}/");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Retitles the selected conversation on a fixed period while the server runs.
fn spawn_title_refresh(session: SessionService, period: std::time::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick fires immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match session.refresh_current_title().await {
                Ok(Some(title)) => debug!("Refreshed conversation title: {title}"),
                Ok(None) => {}
                Err(e) => error!("Title refresh failed: {e}"),
            }
        }
    });
}
