//! Storefront - Self-hosted E-commerce Backend

use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront::config::Config;
use storefront::gateway::StripeGateway;
use storefront::notify::{NatsNotifier, Notifier, NullNotifier};
use storefront::{app, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let notifier: Arc<dyn Notifier> = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Arc::new(NatsNotifier::new(client)),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, events disabled");
                Arc::new(NullNotifier)
            }
        },
        None => Arc::new(NullNotifier),
    };

    let state = AppState {
        db,
        gateway: Arc::new(StripeGateway::new(
            config.stripe_api_base.clone(),
            config.stripe_secret_key.clone(),
        )),
        notifier,
        currency: config.currency.clone(),
        low_stock_threshold: config.low_stock_threshold,
    };

    let router = app(state);
    tracing::info!("🚀 storefront listening on 0.0.0.0:{}", config.port);
    axum::serve(
        tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?,
        router,
    )
    .await?;
    Ok(())
}
