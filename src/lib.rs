pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;
pub mod store;

pub use catalog::CsvCatalogSource;
pub use config::AppConfig;
pub use db::{create_pool, ensure_schema, PgInventory, PgResultStore};
pub use error::CompareError;
pub use service::{CompareService, RunOptions};

/// 生产环境组合: Postgres 库存 + CSV 目录 + Postgres 结果存储
pub type PgCompareService = CompareService<PgInventory, CsvCatalogSource, PgResultStore>;
