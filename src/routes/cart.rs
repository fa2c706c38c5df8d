//! Per-user shopping cart.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/cart/:user_id", get(get_cart).post(add_to_cart).delete(clear_cart))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

async fn get_cart(
    State(s): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<CartItem>>, ApiError> {
    let items = sqlx::query_as::<_, CartItem>(
        "SELECT * FROM cart_items WHERE user_id = $1 ORDER BY created_at",
    )
    .bind(user_id)
    .fetch_all(&s.db)
    .await?;
    Ok(Json(items))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
}

async fn add_to_cart(
    State(s): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(r): Json<AddToCartRequest>,
) -> Result<(StatusCode, Json<CartItem>), ApiError> {
    r.validate()?;
    let item = sqlx::query_as::<_, CartItem>(
        "INSERT INTO cart_items (id, user_id, product_id, quantity, created_at) \
         VALUES ($1, $2, $3, $4, NOW()) \
         ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = cart_items.quantity + $4 \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(user_id)
    .bind(r.product_id)
    .bind(r.quantity)
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn clear_cart(
    State(s): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .execute(&s.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
