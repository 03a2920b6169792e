mod applications;
mod config;
mod dashboard;
mod db;
mod engagement;
mod errors;
mod feed;
mod listings;
mod models;
mod notifications;
mod onboarding;
mod profile;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::engagement::store::PgEngagementStore;
use crate::engagement::views::ViewGate;
use crate::feed::snapshots::FeedSnapshots;
use crate::notifications::bus::{LocalBus, NotificationBus, RedisBus};
use crate::notifications::hub::NotificationHub;
use crate::onboarding::sessions::{OnboardingSessions, SESSION_IDLE_TIMEOUT};
use crate::profile::store::PgProfileStore;
use crate::routes::build_router;
use crate::state::AppState;

/// Per-recipient buffer; slow SSE clients past this many messages skip ahead.
const NOTIFICATION_BUFFER: usize = 64;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Job Board API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Notification transport: Redis pub/sub across instances, else in-process
    let bus: Arc<dyn NotificationBus> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str()).context("Invalid REDIS_URL")?;
            Arc::new(RedisBus::connect(client).await?)
        }
        None => {
            warn!("REDIS_URL not set; notifications are delivered within this instance only");
            Arc::new(LocalBus::new(NOTIFICATION_BUFFER))
        }
    };
    let notifications = NotificationHub::new(bus, NOTIFICATION_BUFFER);

    let engagement = Arc::new(PgEngagementStore::new(db.clone()));
    let views = ViewGate::new(engagement.clone(), config.view_day_offset_minutes);
    info!(
        "Feed page size {}, view day offset {}min",
        config.feed_page_size, config.view_day_offset_minutes
    );

    // Build app state
    let state = AppState {
        profiles: Arc::new(PgProfileStore::new(db.clone())),
        onboarding: Arc::new(OnboardingSessions::new(
            config.onboarding_redirect.clone(),
            SESSION_IDLE_TIMEOUT,
        )),
        feed_snapshots: Arc::new(FeedSnapshots::default()),
        db,
        config: config.clone(),
        engagement,
        views,
        notifications,
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
