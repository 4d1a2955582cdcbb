//! followup-pulse server entry point.
//!
//! Wires configuration, the selected store, the page-view notification
//! worker and the Axum HTTP server.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use followup_pulse::api;
use followup_pulse::app_state::AppState;
use followup_pulse::config::{LogFormat, PulseConfig, StorageBackend};
use followup_pulse::domain::{FollowupRef, PageViewDispatcher, PageViewHandler};
use followup_pulse::persistence::{MemoryStore, PostgresStore, Stores};
use followup_pulse::service::{
    AnalyticsService, ConfirmationService, LogChannel, NotificationService, TrackingService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = PulseConfig::from_env()?;
    init_tracing(config.log_format);
    tracing::info!(
        addr = %config.listen_addr,
        backend = ?config.storage_backend,
        "starting followup-pulse"
    );

    // Build persistence layer
    let stores = build_stores(&config).await?;

    // Build service layer
    let notifications = Arc::new(NotificationService::new(
        &stores,
        Arc::new(LogChannel),
        config.notification_settings(),
    ));
    let (page_views, worker) = PageViewDispatcher::spawn(
        config.page_view_queue_capacity,
        Arc::clone(&notifications) as Arc<dyn PageViewHandler>,
    );

    // Build application state
    let app_state = AppState {
        tracking: Arc::new(TrackingService::new(&stores, page_views)),
        analytics: Arc::new(AnalyticsService::new(&stores)),
        confirmations: Arc::new(ConfirmationService::new(&stores)),
        notifications,
    };

    // Build router
    let app = api::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    #[cfg(feature = "swagger-ui")]
    let app = {
        use utoipa::OpenApi;
        app.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-doc/openapi.json", api::openapi::ApiDoc::openapi()),
        )
    };

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The router owned the last dispatcher; let the worker drain.
    if let Err(err) = worker.await {
        tracing::warn!(error = %err, "page view worker ended abnormally");
    }
    tracing::info!("server stopped");

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn build_stores(config: &PulseConfig) -> anyhow::Result<Stores> {
    match config.storage_backend {
        StorageBackend::Memory => {
            let memory = Arc::new(MemoryStore::new());
            if let Some(path) = &config.memory_seed_file {
                let loaded = memory.seed_followups(read_seed_file(path).await?).await;
                tracing::info!(path = %path.display(), loaded, "follow-ups seeded");
            }
            Ok(Stores::from_backend(&memory))
        }
        StorageBackend::Postgres => {
            let postgres = PostgresStore::connect(config)
                .await
                .context("connecting to PostgreSQL")?;
            if config.database_run_migrations {
                postgres
                    .run_migrations()
                    .await
                    .context("running migrations")?;
                tracing::info!("database migrations applied");
            }
            Ok(Stores::from_backend(&Arc::new(postgres)))
        }
    }
}

async fn read_seed_file(path: &Path) -> anyhow::Result<Vec<FollowupRef>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading seed file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing seed file {}", path.display()))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
