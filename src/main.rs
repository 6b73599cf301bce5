use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use guildpulse::api::{
    create_admin_router, create_economy_router, create_quest_router, AdminApiState,
    EconomyApiState, QuestApiState,
};
use guildpulse::{
    AntiNukeDetector, Clock, CoreConfig, LedgerEngine, MemoryStore, QuestEngine, ShopEngine,
    SystemClock,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = CoreConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        e
    })?;

    init_logging(&config)?;

    info!("Starting GuildPulse engagement core");
    info!(
        "Anti-nuke settings: window={}s, threshold={}, dangerous_actions={}",
        config.antinuke.time_window_secs,
        config.antinuke.max_actions,
        config.antinuke.dangerous_actions.len()
    );

    // Shared collaborators
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(SystemClock) as Arc<dyn Clock>;

    // Engines
    let ledger = Arc::new(LedgerEngine::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        config.economy.clone(),
    ));
    let shop = Arc::new(ShopEngine::new(Arc::clone(&store), Arc::clone(&clock)));
    let quests = Arc::new(QuestEngine::new(Arc::clone(&store), Arc::clone(&clock)));
    let detector = Arc::new(AntiNukeDetector::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        config.antinuke.clone(),
    ));

    let app = Router::new()
        .merge(create_economy_router(EconomyApiState {
            ledger: Arc::clone(&ledger),
            shop: Arc::clone(&shop),
        }))
        .merge(create_quest_router(QuestApiState {
            quests: Arc::clone(&quests),
        }))
        .merge(create_admin_router(AdminApiState {
            detector: Arc::clone(&detector),
            quests: Arc::clone(&quests),
            store: Arc::clone(&store),
        }))
        .layer(TraceLayer::new_for_http());

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    info!("GuildPulse listening on {}", bind_addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

fn init_logging(config: &CoreConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    Ok(())
}
