use std::sync::Arc;

use drillworld_api::config::AppConfig;
use drillworld_api::gateway::StripeGateway;
use drillworld_api::state::AppState;
use drillworld_api::{app, store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and the
    // signing/gateway secrets.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drillworld_api=info,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::from_env()?;

    // Persistence handle: opened here, injected into AppState, closed on
    // process exit.
    let pool = store::connect(&config.database_url, config.database_max_connections).await?;
    store::init_schema(&pool).await?;

    let gateway = Arc::new(StripeGateway::new(config.stripe_secret_key.clone())?);
    let port = config.port;
    let state = AppState::new(config, pool, gateway);

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Drill World API listening on http://{bind_addr}");

    axum::serve(listener, app(state)).await?;
    Ok(())
}
