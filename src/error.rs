//! Request-boundary error taxonomy.
//!
//! Every failure is translated into a structured `{"error": ...}` body at
//! the boundary; none are fatal to the process. Retries are the caller's
//! responsibility.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::domain::money::MoneyError;
use crate::domain::order::OrderError;
use crate::domain::stock::StockError;
use crate::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Order must have at least one item.")]
    InvalidOrder,
    #[error("Insufficient stock for this operation.")]
    InsufficientStock,
    #[error("Order has already been paid.")]
    OrderAlreadyPaid,
    #[error("{0}")]
    Gateway(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Database(sqlx::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::InvalidOrder
            | ApiError::InsufficientStock
            | ApiError::Gateway(_) => StatusCode::BAD_REQUEST,
            ApiError::OrderAlreadyPaid => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            return (status, Json(json!({"error": "internal server error"}))).into_response();
        }
        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        // constraint violations are caller mistakes, not server faults
        if let sqlx::Error::Database(ref db) = e {
            match db.code().as_deref() {
                Some("23503") => return ApiError::Validation("referenced record does not exist".into()),
                Some("23505") => return ApiError::Validation("record already exists".into()),
                Some("23514") => return ApiError::Validation("value violates a constraint".into()),
                _ => {}
            }
        }
        ApiError::Database(e)
    }
}

impl From<StockError> for ApiError {
    fn from(e: StockError) -> Self {
        match e {
            StockError::Insufficient => ApiError::InsufficientStock,
            StockError::Overflow => ApiError::Validation("stock level overflow".into()),
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NoItems => ApiError::InvalidOrder,
            OrderError::AlreadyPaid => ApiError::OrderAlreadyPaid,
            other => ApiError::Validation(other.to_string()),
        }
    }
}

impl From<MoneyError> for ApiError {
    fn from(e: MoneyError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        ApiError::Gateway(e.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        ApiError::Validation(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_empty_order_envelope() {
        let resp = ApiError::InvalidOrder.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "Order must have at least one item.");
    }

    #[tokio::test]
    async fn test_insufficient_stock_envelope() {
        let resp = ApiError::InsufficientStock.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "Insufficient stock for this operation.");
    }

    #[tokio::test]
    async fn test_status_codes() {
        assert_eq!(
            ApiError::OrderAlreadyPaid.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::NotFound("order").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Gateway("card declined".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_database_errors_are_opaque() {
        let resp = ApiError::Database(sqlx::Error::RowNotFound).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "internal server error");
    }
}
