//! stump-events - relays Stump media server changes
//!
//! Connects to the configured Stump server, keeps the event session running
//! and logs every notification until interrupted.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stump_mediaserver::config::Config;
use stump_mediaserver::mediaserver::{
    BookEvent, MediaServerClient, MediaServerEventListener, SeriesEvent,
};
use stump_mediaserver::services::{
    ApiKeyAuthProvider, ServicesManager, StumpClient, StumpEventHandler,
    StumpMediaServerClientAdapter,
};

/// Writes every notification to the log
struct LoggingListener;

#[async_trait]
impl MediaServerEventListener for LoggingListener {
    async fn on_books_added(&self, events: Vec<BookEvent>) -> anyhow::Result<()> {
        for event in events {
            tracing::info!(
                library_id = %event.library_id,
                series_id = %event.series_id,
                book_id = %event.book_id,
                "Book added"
            );
        }
        Ok(())
    }

    async fn on_series_deleted(&self, events: Vec<SeriesEvent>) -> anyhow::Result<()> {
        for event in events {
            tracing::info!(
                library_id = %event.library_id,
                series_id = %event.series_id,
                "Series deleted"
            );
        }
        Ok(())
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stump_mediaserver=debug,stump_events=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    init_tracing(config.log_json);

    tracing::info!(url = %config.stump_url, mode = %config.event_mode, "Starting stump-events");

    let auth = Arc::new(ApiKeyAuthProvider::new(&config.stump_api_key)?);
    let client = Arc::new(
        StumpClient::new(&config.stump_url, auth, config.request_timeout)
            .context("Failed to create Stump client")?,
    );

    let adapter = StumpMediaServerClientAdapter::new(client.clone());
    match adapter.get_libraries().await {
        Ok(libraries) => {
            for library in &libraries {
                tracing::info!(library_id = %library.id, name = %library.name, "Found library");
            }
        }
        Err(e) => tracing::warn!(error = %e, "Failed to list Stump libraries"),
    }

    let listeners: Vec<Arc<dyn MediaServerEventListener>> = vec![Arc::new(LoggingListener)];
    let handler = StumpEventHandler::new(client, listeners, config.event_handler_config())
        .context("Failed to create Stump event handler")?;

    let services = ServicesManager::new();
    services.register(Arc::new(handler)).await;
    services.start_all().await?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received");

    services.stop_all().await?;
    for (name, health) in services.health_all().await {
        tracing::debug!(service = %name, status = ?health.status, "Final service health");
    }
    Ok(())
}
