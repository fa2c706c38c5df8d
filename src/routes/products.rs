//! Product catalog handlers.
//!
//! Categories, tags and attributes have no endpoints of their own; they are
//! created on demand while writing products. Stock levels are read-only here;
//! they change only through the stock movement ledger.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use super::{page_bounds, PaginatedResponse};
use crate::domain::money;
use crate::error::ApiError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ProductRecord {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub attribute: String,
    pub tags: Vec<String>,
    pub stock_level: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const PRODUCT_SELECT: &str = "\
SELECT p.id, p.name, p.description, p.price, c.name AS category, a.name AS attribute, \
       COALESCE(array_agg(t.name ORDER BY t.name) FILTER (WHERE t.name IS NOT NULL), '{}') AS tags, \
       p.stock_level, p.created_at, p.updated_at \
FROM products p \
JOIN categories c ON c.id = p.category_id \
JOIN product_attributes a ON a.id = p.attribute_id \
LEFT JOIN product_tags pt ON pt.product_id = p.id \
LEFT JOIN tags t ON t.id = pt.tag_id";

const SEARCH_FILTER: &str = "\
p.id IN (SELECT p2.id FROM products p2 \
  JOIN categories c2 ON c2.id = p2.category_id \
  LEFT JOIN product_tags pt2 ON pt2.product_id = p2.id \
  LEFT JOIN tags t2 ON t2.id = pt2.tag_id \
  WHERE p2.name ILIKE $3 OR p2.description ILIKE $3 OR c2.name ILIKE $3 OR t2.name ILIKE $3)";

async fn fetch_product(db: &PgPool, id: Uuid) -> Result<ProductRecord, ApiError> {
    let sql = format!("{PRODUCT_SELECT} WHERE p.id = $1 GROUP BY p.id, c.name, a.name");
    sqlx::query_as::<_, ProductRecord>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(ApiError::NotFound("product"))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

async fn list_products(
    State(s): State<AppState>,
    Query(p): Query<ListParams>,
) -> Result<Json<PaginatedResponse<ProductRecord>>, ApiError> {
    let (page, per_page) = page_bounds(p.page, p.per_page);
    let order_by = match p.ordering.as_deref() {
        None => "p.created_at DESC",
        Some("name") => "p.name ASC",
        Some("-name") => "p.name DESC",
        Some("price") => "p.price ASC",
        Some("-price") => "p.price DESC",
        Some(other) => {
            return Err(ApiError::Validation(format!("unknown ordering field: {other}")))
        }
    };
    let pattern = p.search.map(|s| format!("%{s}%"));

    let (filter, count_sql) = if pattern.is_some() {
        (
            format!("WHERE {SEARCH_FILTER}"),
            "SELECT COUNT(DISTINCT p2.id) FROM products p2 \
             JOIN categories c2 ON c2.id = p2.category_id \
             LEFT JOIN product_tags pt2 ON pt2.product_id = p2.id \
             LEFT JOIN tags t2 ON t2.id = pt2.tag_id \
             WHERE p2.name ILIKE $1 OR p2.description ILIKE $1 OR c2.name ILIKE $1 OR t2.name ILIKE $1",
        )
    } else {
        (String::new(), "SELECT COUNT(*) FROM products")
    };

    let sql = format!(
        "{PRODUCT_SELECT} {filter} GROUP BY p.id, c.name, a.name ORDER BY {order_by} LIMIT $1 OFFSET $2"
    );
    let mut query = sqlx::query_as::<_, ProductRecord>(&sql)
        .bind(per_page as i64)
        .bind(((page - 1) * per_page) as i64);
    if let Some(ref pat) = pattern {
        query = query.bind(pat);
    }
    let products = query.fetch_all(&s.db).await?;

    let mut count = sqlx::query_as::<_, (i64,)>(count_sql);
    if let Some(ref pat) = pattern {
        count = count.bind(pat);
    }
    let (total,) = count.fetch_one(&s.db).await?;

    Ok(Json(PaginatedResponse { data: products, total, page }))
}

async fn get_product(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductRecord>, ApiError> {
    Ok(Json(fetch_product(&s.db, id).await?))
}

/// Inserts the named row if absent and returns its id either way.
async fn get_or_create(
    tx: &mut Transaction<'_, Postgres>,
    table: &'static str,
    name: &str,
) -> Result<Uuid, ApiError> {
    let sql = format!(
        "INSERT INTO {table} (id, name) VALUES ($1, $2) \
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING id"
    );
    let (id,): (Uuid,) = sqlx::query_as(&sql)
        .bind(Uuid::now_v7())
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
    Ok(id)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: String,
    pub price: Decimal,
    #[validate(length(min = 1, message = "category must not be empty"))]
    pub category: String,
    #[validate(length(min = 1, message = "attribute must not be empty"))]
    pub attribute: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock_level: i32,
}

async fn create_product(
    State(s): State<AppState>,
    Json(r): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductRecord>), ApiError> {
    r.validate()?;
    money::validate_amount(r.price)?;
    if r.tags.iter().any(|t| t.trim().is_empty()) {
        return Err(ApiError::Validation("tag names must not be empty".into()));
    }

    let mut tx = s.db.begin().await?;
    let category_id = get_or_create(&mut tx, "categories", &r.category).await?;
    let attribute_id = get_or_create(&mut tx, "product_attributes", &r.attribute).await?;
    let product_id = Uuid::now_v7();
    sqlx::query(
        "INSERT INTO products (id, name, description, price, category_id, attribute_id, stock_level, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())",
    )
    .bind(product_id)
    .bind(&r.name)
    .bind(&r.description)
    .bind(r.price)
    .bind(category_id)
    .bind(attribute_id)
    .bind(r.stock_level)
    .execute(&mut *tx)
    .await?;
    for tag in &r.tags {
        let tag_id = get_or_create(&mut tx, "tags", tag).await?;
        sqlx::query("INSERT INTO product_tags (product_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(product_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    let product = fetch_product(&s.db, product_id).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Explicit patch: only the listed fields are updatable. Stock level is
/// absent on purpose; it changes through stock movements alone.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub attribute: Option<String>,
    pub tags: Option<Vec<String>>,
}

async fn update_product(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<UpdateProductRequest>,
) -> Result<Json<ProductRecord>, ApiError> {
    r.validate()?;
    if let Some(price) = r.price {
        money::validate_amount(price)?;
    }

    let mut tx = s.db.begin().await?;
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    exists.ok_or(ApiError::NotFound("product"))?;

    let category_id = match &r.category {
        Some(name) => Some(get_or_create(&mut tx, "categories", name).await?),
        None => None,
    };
    let attribute_id = match &r.attribute {
        Some(name) => Some(get_or_create(&mut tx, "product_attributes", name).await?),
        None => None,
    };

    sqlx::query(
        "UPDATE products SET \
           name = COALESCE($2, name), \
           description = COALESCE($3, description), \
           price = COALESCE($4, price), \
           category_id = COALESCE($5, category_id), \
           attribute_id = COALESCE($6, attribute_id), \
           updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(&r.name)
    .bind(&r.description)
    .bind(r.price)
    .bind(category_id)
    .bind(attribute_id)
    .execute(&mut *tx)
    .await?;

    if let Some(tags) = &r.tags {
        sqlx::query("DELETE FROM product_tags WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for tag in tags {
            let tag_id = get_or_create(&mut tx, "tags", tag).await?;
            sqlx::query("INSERT INTO product_tags (product_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }
    }
    tx.commit().await?;

    Ok(Json(fetch_product(&s.db, id).await?))
}

async fn delete_product(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&s.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("product"));
    }
    Ok(StatusCode::NO_CONTENT)
}
