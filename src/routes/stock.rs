//! Inventory ledger handlers.
//!
//! A movement and the stock level it produces commit together or not at all.
//! The product row is locked for the duration of the check-then-write so two
//! concurrent subtractions cannot both validate against a stale level.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{page_bounds, PaginatedResponse};
use crate::domain::events::DomainEvent;
use crate::domain::stock::{self, MovementKind};
use crate::error::ApiError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/stock-movements", get(list_movements).post(create_movement))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct StockMovement {
    pub id: Uuid,
    pub product_id: Uuid,
    pub movement_type: MovementKind,
    pub quantity: i32,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMovementRequest {
    pub product_id: Uuid,
    pub movement_type: MovementKind,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct MovementResponse {
    #[serde(flatten)]
    pub movement: StockMovement,
    pub stock_level: i32,
}

async fn create_movement(
    State(s): State<AppState>,
    Json(r): Json<CreateMovementRequest>,
) -> Result<(StatusCode, Json<MovementResponse>), ApiError> {
    r.validate()?;

    let mut tx = s.db.begin().await?;
    let row: Option<(i32, String)> =
        sqlx::query_as("SELECT stock_level, name FROM products WHERE id = $1 FOR UPDATE")
            .bind(r.product_id)
            .fetch_optional(&mut *tx)
            .await?;
    let (level, name) = row.ok_or(ApiError::NotFound("product"))?;

    let new_level = stock::apply(level, r.movement_type, r.quantity)?;

    let movement = sqlx::query_as::<_, StockMovement>(
        "INSERT INTO stock_movements (id, product_id, movement_type, quantity, user_id, created_at) \
         VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(r.product_id)
    .bind(r.movement_type)
    .bind(r.quantity)
    .bind(r.user_id)
    .fetch_one(&mut *tx)
    .await?;
    sqlx::query("UPDATE products SET stock_level = $2, updated_at = NOW() WHERE id = $1")
        .bind(r.product_id)
        .bind(new_level)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    s.notifier
        .notify(DomainEvent::StockAdjusted {
            product_id: r.product_id,
            movement_type: r.movement_type,
            quantity: r.quantity,
            stock_level: new_level,
        })
        .await;
    if stock::is_low(new_level, s.low_stock_threshold) {
        s.notifier
            .notify(DomainEvent::LowStock {
                product_id: r.product_id,
                name,
                stock_level: new_level,
            })
            .await;
    }

    Ok((StatusCode::CREATED, Json(MovementResponse { movement, stock_level: new_level })))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub product_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

async fn list_movements(
    State(s): State<AppState>,
    Query(p): Query<ListParams>,
) -> Result<Json<PaginatedResponse<StockMovement>>, ApiError> {
    let (page, per_page) = page_bounds(p.page, p.per_page);
    let (movements, total) = match p.product_id {
        Some(product_id) => {
            let movements = sqlx::query_as::<_, StockMovement>(
                "SELECT * FROM stock_movements WHERE product_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            )
            .bind(product_id)
            .bind(per_page as i64)
            .bind(((page - 1) * per_page) as i64)
            .fetch_all(&s.db)
            .await?;
            let (total,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM stock_movements WHERE product_id = $1")
                    .bind(product_id)
                    .fetch_one(&s.db)
                    .await?;
            (movements, total)
        }
        None => {
            let movements = sqlx::query_as::<_, StockMovement>(
                "SELECT * FROM stock_movements ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            )
            .bind(per_page as i64)
            .bind(((page - 1) * per_page) as i64)
            .fetch_all(&s.db)
            .await?;
            let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stock_movements")
                .fetch_one(&s.db)
                .await?;
            (movements, total)
        }
    };
    Ok(Json(PaginatedResponse { data: movements, total, page }))
}
