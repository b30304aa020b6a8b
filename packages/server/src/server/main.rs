// Main entry point for the chat API server

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dealroom_core::domains::auth::JwtService;
use dealroom_core::domains::chatrooms::broker::{spawn_nats_relay, LoopbackPublisher};
use dealroom_core::kernel::{
    ChatStores, NatsClientPublisher, NatsPublisher, PgChatStore, ServerDeps, StreamHub,
};
use dealroom_core::{server::build_app, Config};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dealroom_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Dealroom chat API");

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let stream_hub = StreamHub::new();

    // Broker transport: NATS across instances, loopback for a single instance
    let publisher: Arc<dyn NatsPublisher> = match &config.nats_url {
        Some(url) => {
            let nats = NatsClientPublisher::connect(url).await?;
            spawn_nats_relay(
                nats.client().clone(),
                config.chat_subject.clone(),
                stream_hub.clone(),
            )
            .await?;
            tracing::info!(url = %url, subject = %config.chat_subject, "Chat fan-out via NATS");
            Arc::new(nats)
        }
        None => {
            tracing::info!("NATS_URL not set, chat fan-out stays in-process");
            Arc::new(LoopbackPublisher::new(stream_hub.clone()))
        }
    };

    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()));

    let deps = Arc::new(ServerDeps::new(
        Some(pool.clone()),
        ChatStores::from_backend(Arc::new(PgChatStore::new(pool))),
        publisher,
        &config.chat_subject,
        config.purge_abandoned_rooms,
        stream_hub.clone(),
        jwt_service,
    ));

    // Drop hub topics nobody listens to anymore
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let removed = stream_hub.cleanup().await;
            if removed > 0 {
                tracing::debug!(removed, "Cleaned up idle stream topics");
            }
        }
    });

    let app = build_app(deps);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
