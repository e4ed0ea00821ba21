pub mod handlers;

pub use handlers::*;

use crate::PgCompareService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;

/// 构建路由
pub fn create_router(service: Arc<PgCompareService>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/compare/run", post(run_compare))
        .route("/api/compare/stats", get(compare_stats))
        .with_state(service)
        .layer(ServiceBuilder::new())
}
