//! HTTP handlers, grouped by resource.

mod cart;
mod orders;
mod payments;
mod products;
mod stock;
mod wishlist;

use axum::Router;
use serde::Serialize;

use crate::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(products::router())
        .merge(stock::router())
        .merge(orders::router())
        .merge(payments::router())
        .merge(cart::router())
        .merge(wishlist::router())
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}

pub(crate) fn page_bounds(page: Option<u32>, per_page: Option<u32>) -> (u32, u32) {
    (page.unwrap_or(1).max(1), per_page.unwrap_or(20).min(100))
}
