use crate::error::{CompareError, Result};
use crate::models::{CatalogMatchGroup, CatalogStats, CompareStats, UnmatchedItem};
use crate::store::{ResultStore, SavedCounts};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// 单条 INSERT 的最大行数
const INSERT_CHUNK: usize = 1000;
/// 单个目录整体写入的超时
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// 比对结果存储 (compare_groups / compare_unmatched)
#[derive(Debug, Clone)]
pub struct PgResultStore {
    pool: PgPool,
}

impl PgResultStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn write_catalog(
        &self,
        catalog: &str,
        groups: &[CatalogMatchGroup],
        unmatched: &[UnmatchedItem],
        clear: bool,
    ) -> std::result::Result<SavedCounts, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        if clear {
            let deleted_groups = sqlx::query("DELETE FROM compare_groups WHERE catalog = $1")
                .bind(catalog)
                .execute(&mut *tx)
                .await?;
            let deleted_unmatched = sqlx::query("DELETE FROM compare_unmatched WHERE catalog = $1")
                .bind(catalog)
                .execute(&mut *tx)
                .await?;
            tracing::debug!(
                "[{}] 清除旧结果: {} 个分组, {} 个未匹配商品",
                catalog,
                deleted_groups.rows_affected(),
                deleted_unmatched.rows_affected()
            );
        }

        for chunk in groups.chunks(INSERT_CHUNK) {
            insert_groups(&mut tx, catalog, chunk).await?;
        }
        for chunk in unmatched.chunks(INSERT_CHUNK) {
            insert_unmatched(&mut tx, catalog, chunk).await?;
        }

        tx.commit().await?;

        Ok(SavedCounts {
            groups: groups.len(),
            unmatched: unmatched.len(),
        })
    }
}

/// JSONB 列的序列化错误按编码错误处理, 事务随之回滚
fn encode_error(e: serde_json::Error) -> sqlx::Error {
    sqlx::Error::Encode(Box::new(e))
}

/// 批量插入分组 (冲突时覆盖)
async fn insert_groups(
    tx: &mut Transaction<'_, Postgres>,
    catalog: &str,
    groups: &[CatalogMatchGroup],
) -> std::result::Result<(), sqlx::Error> {
    let products_json = groups
        .iter()
        .map(CatalogMatchGroup::matched_products_json)
        .collect::<serde_json::Result<Vec<_>>>()
        .map_err(encode_error)?;

    let mut query_builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO compare_groups (
            catalog, article, brand, oes_numbers,
            catalog_price_eur, catalog_segments_names, catalog_data,
            matched_products, matched_products_count,
            price_match_ok_count, price_match_high_count,
            avg_price, min_price, max_price
        ) ",
    );

    query_builder.push_values(groups.iter().zip(products_json), |mut b, (group, products)| {
        b.push_bind(catalog)
            .push_bind(&group.article)
            .push_bind(&group.brand)
            .push_bind(group.oes_numbers())
            .push_bind(group.catalog_price_eur.clone())
            .push_bind(&group.catalog_segments_names)
            .push_bind(group.catalog_data.clone())
            .push_bind(products)
            .push_bind(group.stats.count as i64)
            .push_bind(group.stats.ok_count as i64)
            .push_bind(group.stats.high_count as i64)
            .push_bind(group.stats.avg_price.clone())
            .push_bind(group.stats.min_price.clone())
            .push_bind(group.stats.max_price.clone());
    });

    query_builder.push(
        " ON CONFLICT (catalog, article, brand) DO UPDATE SET
            oes_numbers = EXCLUDED.oes_numbers,
            catalog_price_eur = EXCLUDED.catalog_price_eur,
            catalog_segments_names = EXCLUDED.catalog_segments_names,
            catalog_data = EXCLUDED.catalog_data,
            matched_products = EXCLUDED.matched_products,
            matched_products_count = EXCLUDED.matched_products_count,
            price_match_ok_count = EXCLUDED.price_match_ok_count,
            price_match_high_count = EXCLUDED.price_match_high_count,
            avg_price = EXCLUDED.avg_price,
            min_price = EXCLUDED.min_price,
            max_price = EXCLUDED.max_price",
    );

    let result = query_builder.build().execute(&mut **tx).await?;
    tracing::debug!("[{}] 插入分组 {} 行", catalog, result.rows_affected());
    Ok(())
}

/// 批量插入未匹配商品 (冲突时覆盖)
async fn insert_unmatched(
    tx: &mut Transaction<'_, Postgres>,
    catalog: &str,
    unmatched: &[UnmatchedItem],
) -> std::result::Result<(), sqlx::Error> {
    let payloads = unmatched
        .iter()
        .map(|u| -> serde_json::Result<(serde_json::Value, serde_json::Value)> {
            Ok((serde_json::to_value(&u.searched_codes)?, serde_json::to_value(&u.item)?))
        })
        .collect::<serde_json::Result<Vec<_>>>()
        .map_err(encode_error)?;

    let mut query_builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO compare_unmatched (catalog, part_id, code, price, searched_codes, item) ",
    );

    query_builder.push_values(unmatched.iter().zip(payloads), |mut b, (u, (searched, item))| {
        b.push_bind(catalog)
            .push_bind(&u.part_id)
            .push_bind(&u.code)
            .push_bind(u.price.clone())
            .push_bind(searched)
            .push_bind(item);
    });

    query_builder.push(
        " ON CONFLICT (catalog, part_id) DO UPDATE SET
            code = EXCLUDED.code,
            price = EXCLUDED.price,
            searched_codes = EXCLUDED.searched_codes,
            item = EXCLUDED.item",
    );

    let result = query_builder.build().execute(&mut **tx).await?;
    tracing::debug!("[{}] 插入未匹配商品 {} 行", catalog, result.rows_affected());
    Ok(())
}

#[derive(Debug, FromRow)]
struct GroupStatRow {
    catalog: String,
    group_count: i64,
    matched_products: i64,
    ok_count: i64,
    high_count: i64,
}

#[derive(Debug, FromRow)]
struct UnmatchedStatRow {
    catalog: String,
    unmatched_count: i64,
}

impl ResultStore for PgResultStore {
    async fn save_catalog(
        &self,
        catalog: &str,
        groups: &[CatalogMatchGroup],
        unmatched: &[UnmatchedItem],
        clear: bool,
    ) -> Result<SavedCounts> {
        tracing::debug!(
            "[{}] 开始写入 {} 个分组, {} 个未匹配商品 (clear={})",
            catalog,
            groups.len(),
            unmatched.len(),
            clear
        );
        let execute_start = Instant::now();

        // 超时会丢弃事务, 未提交的写入整体回滚
        let execute_result = tokio::time::timeout(
            WRITE_TIMEOUT,
            self.write_catalog(catalog, groups, unmatched, clear),
        )
        .await;

        match execute_result {
            Ok(Ok(counts)) => {
                tracing::info!("✓ [{}] 写入成功, 耗时: {:?}", catalog, execute_start.elapsed());
                Ok(counts)
            }
            Ok(Err(e)) => {
                tracing::error!(
                    "✗ [{}] 写入失败, 耗时: {:?}, 错误: {:?}",
                    catalog,
                    execute_start.elapsed(),
                    e
                );
                Err(CompareError::persistence(catalog, e))
            }
            Err(_) => {
                tracing::error!("✗ [{}] 写入超时 (>30秒)!", catalog);
                Err(CompareError::persistence(catalog, "write timed out after 30s"))
            }
        }
    }

    async fn fetch_stats(&self) -> Result<CompareStats> {
        let group_rows = sqlx::query_as::<_, GroupStatRow>(
            r#"
            SELECT catalog,
                   COUNT(*) AS group_count,
                   COALESCE(SUM(matched_products_count), 0)::BIGINT AS matched_products,
                   COALESCE(SUM(price_match_ok_count), 0)::BIGINT AS ok_count,
                   COALESCE(SUM(price_match_high_count), 0)::BIGINT AS high_count
            FROM compare_groups
            GROUP BY catalog
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CompareError::Stats(e.to_string()))?;

        let unmatched_rows = sqlx::query_as::<_, UnmatchedStatRow>(
            r#"
            SELECT catalog, COUNT(*) AS unmatched_count
            FROM compare_unmatched
            GROUP BY catalog
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CompareError::Stats(e.to_string()))?;

        let mut catalogs: BTreeMap<String, CatalogStats> = BTreeMap::new();
        for row in group_rows {
            let entry = catalogs.entry(row.catalog).or_default();
            entry.groups = row.group_count;
            entry.matched_products = row.matched_products;
            entry.ok = row.ok_count;
            entry.high = row.high_count;
            entry.na = row.matched_products - row.ok_count - row.high_count;
        }
        for row in unmatched_rows {
            catalogs.entry(row.catalog).or_default().unmatched = row.unmatched_count;
        }

        Ok(CompareStats::from_catalogs(catalogs))
    }
}
