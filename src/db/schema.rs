use sqlx::PgPool;

/// 比对结果表结构 (不存在时创建)
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS compare_groups (
        id BIGSERIAL PRIMARY KEY,
        catalog VARCHAR(32) NOT NULL,
        article TEXT NOT NULL,
        brand TEXT NOT NULL,
        oes_numbers TEXT NOT NULL,
        catalog_price_eur NUMERIC(12, 2),
        catalog_segments_names TEXT,
        catalog_data JSONB NOT NULL,
        matched_products JSONB NOT NULL,
        matched_products_count BIGINT NOT NULL,
        price_match_ok_count BIGINT NOT NULL,
        price_match_high_count BIGINT NOT NULL,
        avg_price NUMERIC(12, 2),
        min_price NUMERIC(12, 2),
        max_price NUMERIC(12, 2),
        UNIQUE (catalog, article, brand)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS compare_unmatched (
        id BIGSERIAL PRIMARY KEY,
        catalog VARCHAR(32) NOT NULL,
        part_id VARCHAR(50) NOT NULL,
        code VARCHAR(50) NOT NULL,
        price NUMERIC(10, 2),
        searched_codes JSONB NOT NULL,
        item JSONB NOT NULL,
        UNIQUE (catalog, part_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_compare_groups_catalog ON compare_groups (catalog)",
    "CREATE INDEX IF NOT EXISTS idx_compare_unmatched_catalog ON compare_unmatched (catalog)",
];

/// 创建/检查比对结果表
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("比对结果表已创建/检查");
    Ok(())
}
