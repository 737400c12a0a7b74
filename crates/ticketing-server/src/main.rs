//! Binary entry point: loads configuration, connects Postgres and Redis,
//! builds the reservation engine and read-path service, spawns the expiry
//! reaper, and serves the HTTP surface.

use std::sync::Arc;

use anyhow::Context;
use ticketing_cache::{Cache, LockManager, RedisCache, RedisLockManager};
use ticketing_common::AppConfig;
use ticketing_engine::{ExpiryReaper, ReadPathService, ReservationEngine};
use ticketing_store::{connect_pool, EventRepository, PgEventRepository, PgTicketRepository, TicketRepository};
use ticketing_web::{build_router, AppState};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ticketing=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config: AppConfig =
        ticketing_common::load_app_config(None).context("failed to load configuration")?;

    tracing::info!(bind_addr = %config.server.bind_addr, "starting ticket reservation service");

    let pool = connect_pool(&config.database)
        .await
        .context("failed to connect to the durable store")?;
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    let cache: Arc<dyn Cache> = Arc::new(
        RedisCache::connect(&config.redis.url)
            .await
            .context("failed to connect to the cache")?,
    );
    let locks: Arc<dyn LockManager> = Arc::new(
        RedisLockManager::connect(&config.redis.url)
            .await
            .map_err(|e| anyhow::anyhow!("failed to connect to the lock manager: {e}"))?,
    );

    let events: Arc<dyn EventRepository> = Arc::new(PgEventRepository::new(pool.clone()));
    let tickets: Arc<dyn TicketRepository> = Arc::new(PgTicketRepository::new(pool.clone()));

    let reservations = Arc::new(ReservationEngine::new(
        events.clone(),
        tickets.clone(),
        cache.clone(),
        locks,
        config.reservation,
        config.lock,
    ));
    let read_path = Arc::new(ReadPathService::new(
        events,
        tickets.clone(),
        cache.clone(),
        config.cache,
    ));

    let shutdown = CancellationToken::new();
    let reaper = Arc::new(ExpiryReaper::new(tickets, cache, config.reaper));
    let reaper_handle = reaper.spawn(shutdown.clone());

    let state = AppState::new(reservations, read_path);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;

    tracing::info!(addr = %config.server.bind_addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .context("HTTP server error")?;

    shutdown.cancel();
    reaper_handle.await.ok();

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    tracing::info!("shutdown signal received");
    shutdown.cancel();
}
