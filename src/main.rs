use parts_compare_rust::{
    api, create_pool, ensure_schema, AppConfig, CompareService, CsvCatalogSource, PgInventory,
    PgResultStore, RunOptions,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::from_env()?;
    info!("Starting server with config: {:?}", config);
    let defaults = RunOptions::from_config(&config.compare)?;

    // 创建数据库连接池
    let pool = create_pool(&config.database.url).await?;
    info!("Database pool created");
    ensure_schema(&pool).await?;

    // 组装比对服务
    let service = Arc::new(CompareService::new(
        PgInventory::new(pool.clone()),
        CsvCatalogSource::new(&config.compare.catalog_dir, config.compare.catalogs.clone()),
        PgResultStore::new(pool),
        config.compare.catalogs.clone(),
        defaults,
    ));

    // 构建路由
    let app = api::create_router(service);

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/compare/run    - 全量比对 (目录: {:?})", config.compare.catalogs);
    info!("  GET  /api/compare/stats  - 比对统计");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
