//! Order lifecycle handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{page_bounds, PaginatedResponse};
use crate::domain::order::{self, OrderStatus};
use crate::error::ApiError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/status", post(update_status))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub user_id: Uuid,
    #[validate]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
}

async fn create_order(
    State(s): State<AppState>,
    Json(r): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    order::ensure_has_items(&r.items)?;
    r.validate()?;

    let mut tx = s.db.begin().await?;

    // capture unit prices from the live products; the order keeps them even
    // if the catalog price changes later
    let mut captured = Vec::with_capacity(r.items.len());
    for item in &r.items {
        let price: Option<(Decimal,)> = sqlx::query_as("SELECT price FROM products WHERE id = $1")
            .bind(item.product_id)
            .fetch_optional(&mut *tx)
            .await?;
        let (unit_price,) = price.ok_or(ApiError::NotFound("product"))?;
        captured.push(order::NewItem { quantity: item.quantity, unit_price });
    }
    let total = order::compute_total(&captured);

    let order_number = format!("ORD-{:08}", rand::random::<u32>());
    let order_id = Uuid::now_v7();
    let created = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (id, order_number, user_id, status, total, created_at, updated_at) \
         VALUES ($1, $2, $3, 'PENDING', $4, NOW(), NOW()) RETURNING *",
    )
    .bind(order_id)
    .bind(&order_number)
    .bind(r.user_id)
    .bind(total)
    .fetch_one(&mut *tx)
    .await?;

    let mut items = Vec::with_capacity(captured.len());
    for (req, line) in r.items.iter().zip(&captured) {
        let item = sqlx::query_as::<_, OrderItem>(
            "INSERT INTO order_items (id, order_id, product_id, quantity, unit_price) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(order_id)
        .bind(req.product_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .fetch_one(&mut *tx)
        .await?;
        items.push(item);
    }
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(OrderResponse { order: created, items })))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub user_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

async fn list_orders(
    State(s): State<AppState>,
    Query(p): Query<ListParams>,
) -> Result<Json<PaginatedResponse<Order>>, ApiError> {
    let (page, per_page) = page_bounds(p.page, p.per_page);
    let (orders, total) = match p.user_id {
        Some(user_id) => {
            let orders = sqlx::query_as::<_, Order>(
                "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            )
            .bind(user_id)
            .bind(per_page as i64)
            .bind(((page - 1) * per_page) as i64)
            .fetch_all(&s.db)
            .await?;
            let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&s.db)
                .await?;
            (orders, total)
        }
        None => {
            let orders = sqlx::query_as::<_, Order>(
                "SELECT * FROM orders ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            )
            .bind(per_page as i64)
            .bind(((page - 1) * per_page) as i64)
            .fetch_all(&s.db)
            .await?;
            let (total,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM orders").fetch_one(&s.db).await?;
            (orders, total)
        }
    };
    Ok(Json(PaginatedResponse { data: orders, total, page }))
}

async fn get_order(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(ApiError::NotFound("order"))?;
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = $1 ORDER BY id",
    )
    .bind(id)
    .fetch_all(&s.db)
    .await?;
    Ok(Json(OrderResponse { order, items }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Administrative transition (cancellation, fulfillment). Payment is the
/// only path into PROCESSING and is handled by the payments resource.
async fn update_status(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let mut tx = s.db.begin().await?;
    let current = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::NotFound("order"))?;
    let next = current.status.transition(r.status)?;
    let updated = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(next)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(Json(updated))
}
