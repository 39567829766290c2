use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use file_sharer::{
    api,
    config::{Config, StorageBackend},
    links::{LinkTable, SupabaseLinks},
    object_store::{self as obj, ObjectStore},
    storage::Database,
    AppState,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "gcp" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_stackdriver::layer())
                .init();
        }
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    info!(version = env!("CARGO_PKG_VERSION"), "file-sharer starting");

    // Load configuration
    let config = Config::load()?;
    info!(
        "Short links will be served from: {}",
        config.node.public_origin
    );

    // Initialize storage collaborators
    let (object_store, link_table, local_store): (
        Arc<dyn ObjectStore>,
        Arc<dyn LinkTable>,
        Option<Arc<obj::LocalStore>>,
    ) = match config.storage.backend {
        StorageBackend::Local => {
            let db = Database::open(&config.storage.data_dir)?;
            info!("Link table opened at: {}", config.storage.data_dir);

            let store = Arc::new(obj::LocalStore::new(
                &config.storage.local_storage_path,
                &config.storage.bucket,
                config.node.public_origin.clone(),
            )?);
            info!(
                "Using local storage backend at: {}",
                config.storage.local_storage_path
            );
            (
                store.clone() as Arc<dyn ObjectStore>,
                Arc::new(db) as Arc<dyn LinkTable>,
                Some(store),
            )
        }
        StorageBackend::Supabase => {
            let base_url = config
                .storage
                .supabase_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("SUPABASE_URL is not set"))?;
            let api_key = config
                .storage
                .supabase_anon_key
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("SUPABASE_ANON_KEY is not set"))?;

            let client = reqwest::Client::builder().build()?;
            let store = obj::SupabaseStore::new(
                client.clone(),
                base_url.clone(),
                &config.storage.bucket,
                api_key,
            );
            let links = SupabaseLinks::new(client, &base_url, &config.links.table, api_key)?;
            info!(
                "Using Supabase backend at {}, bucket: {}",
                base_url, config.storage.bucket
            );
            (
                Arc::new(store) as Arc<dyn ObjectStore>,
                Arc::new(links) as Arc<dyn LinkTable>,
                None,
            )
        }
    };

    // Create shared state
    let state = Arc::new(AppState::new(
        config.clone(),
        object_store,
        link_table,
        local_store,
    ));

    // Build and start the HTTP server
    let app = api::create_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(&config.node.bind_address).await?;
    info!("Listening on: {}", config.node.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
