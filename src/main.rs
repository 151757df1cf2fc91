use anyhow::Context;
use buildit::{
    config::Config,
    orchestrator::Generator,
    provider::GenerationClient,
    routes::{router, AppState},
    store::{seed_kits, KitStore, MongoKitStore},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = Config::from_env().context("loading configuration")?;

    let store: Arc<dyn KitStore> = Arc::new(
        MongoKitStore::connect(&config.mongodb_uri, &config.database)
            .await
            .context("connecting to MongoDB")?,
    );
    seed_kits(store.as_ref()).await.context("seeding kits")?;

    let client = GenerationClient::from_config(&config).context("building provider clients")?;
    if client.is_empty() {
        tracing::warn!("No LLM API keys configured; /api/generate will answer 503");
    } else {
        tracing::info!("Providers (in fallback order): {}", client.provider_ids().join(", "));
    }

    let state = AppState {
        store: store.clone(),
        generator: Generator::new(store.clone(), client),
    };
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await.with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    store.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => { sig.recv().await; }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
