use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use htsget_tickets::{
    Config,
    handlers::{AppState, create_router},
    resolver,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tokio::fs::create_dir_all(&config.temporary_files_path).await?;

    let resolver = resolver::from_config(&config).await?;
    let state = AppState::new(resolver, &config)?;
    let base_path = config.normalized_base_path();
    let app = create_router(state, &base_path, config.cors);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting htsget-tickets on {}{}", addr, base_path);
    tracing::info!("File retrieval: {:?}", config.file_retrieval);
    tracing::info!("Data directory: {:?}", config.local_files_path);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
