//! Storefront backend
//!
//! Self-hosted e-commerce service: product catalog, inventory ledger, carts
//! and wishlists, orders and payments.
//!
//! ## Features
//! - Product catalog with categories, tags and attributes
//! - Append-only stock movement ledger with atomic level updates
//! - Order lifecycle from creation through payment confirmation
//! - Stripe-backed authorization behind an injected gateway adapter
//! - Low-stock and order events published on NATS

pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod notify;
pub mod routes;

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::gateway::PaymentGateway;
use crate::notify::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub gateway: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn Notifier>,
    pub currency: String,
    pub low_stock_threshold: i32,
}

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront"})) }),
        )
        .nest("/api/v1", routes::api_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
