use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rust_broker_api::config::{Config, MEMORY_DATABASE_URL};
use rust_broker_api::db::{Database, DocumentStore, UnconfiguredStore};
use rust_broker_api::db_storage::DocumentStorage;
use rust_broker_api::handlers::AppState;
use rust_broker_api::memory_store::InMemoryStore;
use rust_broker_api::server::build_router;

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration, builds the store handle once and
/// serves the router until the process exits.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_broker_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize the document store handle (shared by every request)
    let store: Arc<dyn DocumentStore> = match config.database_url.as_deref() {
        Some(MEMORY_DATABASE_URL) => Arc::new(InMemoryStore::new()),
        Some(url) => {
            let db = Database::new(
                url,
                &config.database_name,
                config.server_selection_timeout(),
            )
            .await?;
            match db.ping().await {
                Ok(()) => tracing::info!("✓ Database reachable: {}", config.database_name),
                Err(e) => tracing::warn!("Database not reachable at startup: {}", e),
            }
            Arc::new(db)
        }
        None => Arc::new(UnconfiguredStore),
    };

    // Build application state
    let app_state = Arc::new(AppState {
        storage: DocumentStorage::new(store),
        config: config.clone(),
    });

    let app = build_router(app_state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
