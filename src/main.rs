//! Helpfulat server binary

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use helpfulat::arcade::Arcade;
use helpfulat::config::Config;
use helpfulat::core::{MemoryStore, SessionManager, SqliteKvStore};
use helpfulat::providers::{GeminiConfig, GeminiProvider};
use helpfulat::{routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "helpfulat=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    // Durable memory
    let kv = SqliteKvStore::new(&config.data_dir.join("helpfulat.db")).await?;
    let memory = Arc::new(MemoryStore::open(Arc::new(kv)).await);
    let profile = memory.get_or_create_profile().await;
    tracing::info!("🧠 Memory loaded for {} ({})", profile.name, profile.id);

    if config.gemini_api_key.is_none() {
        tracing::warn!(
            "{} is not set; chat replies will report the missing key",
            config.settings.llm.api_key_env
        );
    }
    let gateway = GeminiProvider::new(GeminiConfig::from_settings(
        &config.settings.llm,
        config.gemini_api_key.clone(),
    ))?;

    let sessions = Arc::new(SessionManager::new(memory.clone(), Arc::new(gateway)));
    let arcade = Arc::new(Arcade::new(&config.settings.arcade));

    let state = AppState {
        config,
        sessions: sessions.clone(),
        memory,
        arcade: arcade.clone(),
    };

    let app = Router::new()
        .merge(routes::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("🔥 Helpfulat API running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The active session counts as finished when the server stops
    sessions.end_active_session().await;
    arcade.exit().await;
    tracing::info!("Shut down cleanly");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
