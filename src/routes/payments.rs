//! Payment confirmation and the gateway boundary.
//!
//! The gateway is called outside any transaction; no lock is held while
//! waiting on it. The PENDING check runs twice: a cheap pre-check so an
//! already-paid order never reaches the gateway, and again under a row lock
//! before the status flips, so racing confirmations cannot both win.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::events::DomainEvent;
use crate::domain::money;
use crate::domain::order::OrderStatus;
use crate::error::ApiError;
use crate::routes::orders::Order;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payments", post(confirm_payment))
        .route("/payments/:order_id", get(get_payment))
        .route("/stripe-payment", post(stripe_payment))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: Decimal,
    pub success: bool,
    pub payment_gateway: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmPaymentRequest {
    pub order_id: Uuid,
    pub amount: Decimal,
    #[validate(length(min = 1, message = "payment_gateway must not be empty"))]
    pub payment_gateway: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    #[serde(flatten)]
    pub payment: Payment,
    pub order_status: OrderStatus,
    pub client_secret: Option<String>,
}

/// Upserts the order's single payment row. Returns `None` when the existing
/// row is a successful payment, which must never be overwritten.
async fn record_payment<'e>(
    ex: impl sqlx::PgExecutor<'e>,
    order_id: Uuid,
    amount: Decimal,
    success: bool,
    gateway: &str,
) -> Result<Option<Payment>, ApiError> {
    let payment = sqlx::query_as::<_, Payment>(
        "INSERT INTO payments (id, order_id, amount, success, payment_gateway, created_at) \
         VALUES ($1, $2, $3, $4, $5, NOW()) \
         ON CONFLICT (order_id) DO UPDATE \
         SET amount = EXCLUDED.amount, success = EXCLUDED.success, \
             payment_gateway = EXCLUDED.payment_gateway, created_at = EXCLUDED.created_at \
         WHERE NOT payments.success \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(order_id)
    .bind(amount)
    .bind(success)
    .bind(gateway)
    .fetch_optional(ex)
    .await?;
    Ok(payment)
}

async fn confirm_payment(
    State(s): State<AppState>,
    Json(r): Json<ConfirmPaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    r.validate()?;
    let amount_minor = money::to_minor_units(r.amount)?;

    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(r.order_id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(ApiError::NotFound("order"))?;
    order.status.ensure_payable()?;

    // outside any transaction; on transport failure the order stays PENDING
    // and the client may retry
    let auth = s.gateway.authorize(amount_minor, &s.currency).await?;

    if !auth.approved {
        let payment = record_payment(&s.db, r.order_id, r.amount, false, &r.payment_gateway)
            .await?
            .ok_or(ApiError::OrderAlreadyPaid)?;
        tracing::info!(order_id = %r.order_id, "payment declined");
        return Ok((
            StatusCode::CREATED,
            Json(PaymentResponse {
                payment,
                order_status: order.status,
                client_secret: None,
            }),
        ));
    }

    let mut tx = s.db.begin().await?;
    let locked = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(r.order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::NotFound("order"))?;
    let next = locked.status.paid()?;
    let payment = record_payment(&mut *tx, r.order_id, r.amount, true, &r.payment_gateway)
        .await?
        .ok_or(ApiError::OrderAlreadyPaid)?;
    sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(r.order_id)
        .bind(next)
        .execute(&mut *tx)
        .await?;
    let email: Option<(String,)> = sqlx::query_as("SELECT email FROM users WHERE id = $1")
        .bind(locked.user_id)
        .fetch_optional(&mut *tx)
        .await?;
    tx.commit().await?;

    s.notifier
        .notify(DomainEvent::OrderConfirmed {
            order_id: locked.id,
            user_id: locked.user_id,
            email: email.map(|(e,)| e).unwrap_or_default(),
            total: locked.total,
        })
        .await;
    tracing::info!(order_id = %r.order_id, "order paid, now processing");

    Ok((
        StatusCode::CREATED,
        Json(PaymentResponse { payment, order_status: next, client_secret: auth.client_secret }),
    ))
}

async fn get_payment(
    State(s): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Payment>, ApiError> {
    sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE order_id = $1")
        .bind(order_id)
        .fetch_optional(&s.db)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("payment"))
}

#[derive(Debug, Deserialize)]
pub struct StripePaymentRequest {
    pub amount: Decimal,
}

/// Bare adapter boundary: relays the client secret for a client-side
/// confirmation flow. Persists nothing.
async fn stripe_payment(
    State(s): State<AppState>,
    Json(r): Json<StripePaymentRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let amount_minor = money::to_minor_units(r.amount)?;
    let auth = s.gateway.authorize(amount_minor, &s.currency).await?;
    match auth.client_secret {
        Some(secret) if auth.approved => {
            Ok((StatusCode::CREATED, Json(serde_json::json!({ "clientSecret": secret }))))
        }
        _ => Err(ApiError::Gateway(
            auth.message.unwrap_or_else(|| "authorization declined".to_string()),
        )),
    }
}
