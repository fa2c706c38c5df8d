//! Per-user wishlist.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/wishlist/:user_id", get(get_wishlist).post(add_to_wishlist))
        .route("/wishlist/:user_id/:product_id", delete(remove_from_wishlist))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct WishlistItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub created_at: DateTime<Utc>,
}

async fn get_wishlist(
    State(s): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<WishlistItem>>, ApiError> {
    let items = sqlx::query_as::<_, WishlistItem>(
        "SELECT * FROM wishlist_items WHERE user_id = $1 ORDER BY created_at",
    )
    .bind(user_id)
    .fetch_all(&s.db)
    .await?;
    Ok(Json(items))
}

#[derive(Debug, Deserialize)]
pub struct AddToWishlistRequest {
    pub product_id: Uuid,
}

async fn add_to_wishlist(
    State(s): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(r): Json<AddToWishlistRequest>,
) -> Result<(StatusCode, Json<WishlistItem>), ApiError> {
    let item = sqlx::query_as::<_, WishlistItem>(
        "INSERT INTO wishlist_items (id, user_id, product_id, created_at) \
         VALUES ($1, $2, $3, NOW()) \
         ON CONFLICT (user_id, product_id) DO UPDATE SET product_id = EXCLUDED.product_id \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(user_id)
    .bind(r.product_id)
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn remove_from_wishlist(
    State(s): State<AppState>,
    Path((user_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(&s.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("wishlist item"));
    }
    Ok(StatusCode::NO_CONTENT)
}
