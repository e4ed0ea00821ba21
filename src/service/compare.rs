use super::grouping::{aggregate_groups, Grouping};
use super::rows::build_row_matches;
use super::unmatched::collect_unmatched;
use crate::config::CompareConfig;
use crate::error::{CompareError, Result};
use crate::models::{
    CatalogMatchGroup, CatalogOutcome, CatalogRow, CompareStats, InventoryItem, RunReport,
    UnmatchedItem,
};
use crate::store::{CatalogProvider, InventoryProvider, ResultStore};
use bigdecimal::BigDecimal;
use chrono::Utc;
use futures::future::join_all;
use indexmap::IndexMap;
use std::time::Instant;

/// 单次运行参数
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// TOP 段价格容差倍数
    pub price_delta: BigDecimal,
    /// 写入前清空该目录旧结果
    pub clear_before: bool,
}

impl RunOptions {
    pub fn from_config(config: &CompareConfig) -> Result<Self> {
        Ok(Self {
            price_delta: config.price_delta()?,
            clear_before: config.clear_before,
        })
    }
}

/// 单个目录的计算结果 (尚未持久化)
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogComparison {
    pub groups: Vec<CatalogMatchGroup>,
    pub unmatched: Vec<UnmatchedItem>,
    pub catalog_rows: usize,
    pub skipped_rows: usize,
    pub keyless_rows: usize,
}

/// 对一份目录快照与库存快照执行 行匹配 -> 分组聚合 -> 未匹配补集
pub fn compare_snapshot(
    catalog: &str,
    rows: &[CatalogRow],
    items: &[InventoryItem],
    multiplier: &BigDecimal,
) -> CatalogComparison {
    let scan = build_row_matches(rows, items, multiplier);
    let matched_rows = scan.matches.len();
    let Grouping {
        groups,
        keyless_rows,
    } = aggregate_groups(catalog, scan.matches);
    let unmatched = collect_unmatched(catalog, items, &groups);

    tracing::info!(
        "[{}] 目录 {} 行, 命中 {} 行, 跳过 {} 行, 无分组键 {} 行 -> {} 个分组, {} 个未匹配商品",
        catalog,
        rows.len(),
        matched_rows,
        scan.skipped_rows,
        keyless_rows,
        groups.len(),
        unmatched.len()
    );

    CatalogComparison {
        groups,
        unmatched,
        catalog_rows: rows.len(),
        skipped_rows: scan.skipped_rows,
        keyless_rows,
    }
}

/// 比对服务: 依次处理每个目录, 单个目录失败不影响其它目录
pub struct CompareService<I, C, S> {
    inventory: I,
    catalogs: C,
    store: S,
    catalog_tags: Vec<String>,
    defaults: RunOptions,
}

impl<I, C, S> CompareService<I, C, S>
where
    I: InventoryProvider,
    C: CatalogProvider,
    S: ResultStore,
{
    pub fn new(
        inventory: I,
        catalogs: C,
        store: S,
        catalog_tags: Vec<String>,
        defaults: RunOptions,
    ) -> Self {
        Self {
            inventory,
            catalogs,
            store,
            catalog_tags,
            defaults,
        }
    }

    pub fn default_options(&self) -> &RunOptions {
        &self.defaults
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 使用默认参数运行
    pub async fn run(&self) -> RunReport {
        self.run_with(&self.defaults).await
    }

    /// 运行全部目录; 总是返回报告, 错误记录在对应目录的 outcome 中
    pub async fn run_with(&self, options: &RunOptions) -> RunReport {
        let started_at = Utc::now();
        tracing::info!(
            "开始比对: 目录 {:?}, price_delta={}, clear_before={}",
            self.catalog_tags,
            options.price_delta,
            options.clear_before
        );

        let outcomes = join_all(self.catalog_tags.iter().map(|tag| async move {
            let outcome = match self.compare_catalog(tag, options).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!("[{}] 目录处理失败: {}", tag, e);
                    CatalogOutcome::failed(e)
                }
            };
            (tag.clone(), outcome)
        }))
        .await;
        let catalogs: IndexMap<String, CatalogOutcome> = outcomes.into_iter().collect();

        let (stats, stats_error) = match self.store.fetch_stats().await {
            Ok(stats) => (Some(stats), None),
            Err(e) => {
                tracing::error!("获取比对统计失败: {}", e);
                (None, Some(e.to_string()))
            }
        };

        let summary: Vec<String> = catalogs
            .iter()
            .map(|(tag, o)| match &o.error {
                None => format!("{}={} groups/{} unmatched", tag, o.groups_saved, o.unmatched_saved),
                Some(_) => format!("{}=error", tag),
            })
            .collect();
        tracing::info!("比对完成: {}", summary.join(", "));

        RunReport {
            started_at,
            finished_at: Utc::now(),
            catalogs,
            stats,
            stats_error,
        }
    }

    /// 处理单个目录: 加载快照 -> 匹配 -> 原子替换写入
    pub async fn compare_catalog(&self, catalog: &str, options: &RunOptions) -> Result<CatalogOutcome> {
        let start = Instant::now();

        let rows = self.catalogs.load_catalog(catalog).await?;
        tracing::info!("[{}] 加载目录 {} 行", catalog, rows.len());

        let items = self.inventory.load_inventory().await?;
        tracing::info!("[{}] 加载库存 {} 个商品", catalog, items.len());
        if items.is_empty() {
            tracing::warn!("[{}] 库存为空, 将写入空结果", catalog);
        }

        // CPU 密集的全量扫描放到阻塞线程池
        let tag = catalog.to_string();
        let multiplier = options.price_delta.clone();
        let comparison = tokio::task::spawn_blocking(move || {
            compare_snapshot(&tag, &rows, &items, &multiplier)
        })
        .await
        .map_err(|e| CompareError::Matching(e.to_string()))?;

        let saved = self
            .store
            .save_catalog(
                catalog,
                &comparison.groups,
                &comparison.unmatched,
                options.clear_before,
            )
            .await?;

        tracing::info!(
            "[{}] 写入 {} 个分组, {} 个未匹配商品, 耗时: {:?}",
            catalog,
            saved.groups,
            saved.unmatched,
            start.elapsed()
        );

        Ok(CatalogOutcome {
            groups_saved: saved.groups,
            unmatched_saved: saved.unmatched,
            catalog_rows: comparison.catalog_rows,
            skipped_rows: comparison.skipped_rows,
            keyless_rows: comparison.keyless_rows,
            error: None,
        })
    }

    /// 当前已持久化的统计
    pub async fn stats(&self) -> Result<CompareStats> {
        self.store.fetch_stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceClass;
    use std::collections::HashSet;
    use std::str::FromStr;

    #[test]
    fn snapshot_partitions_inventory_between_groups_and_unmatched() {
        let mut items = Vec::new();
        for i in 0..20 {
            let mut item = InventoryItem::new(format!("p{i}"), format!("SKU-{i}"));
            item.oem_code = format!("OEM{}", i % 7);
            item.price = Some(BigDecimal::from(90 + i));
            items.push(item);
        }
        let rows: Vec<CatalogRow> = (0..4)
            .map(|i| CatalogRow {
                oes_numbers: Some(format!("oem{} | OEM{}", i, i + 1)),
                price_eur: Some(BigDecimal::from(100)),
                segments_names: Some("TOP".into()),
                article: Some(format!("SR{}", i % 2)),
                brand: Some("TRW".into()),
                ..Default::default()
            })
            .collect();

        let result = compare_snapshot("eur", &rows, &items, &BigDecimal::from_str("1.1").unwrap());

        let grouped: HashSet<&str> = result
            .groups
            .iter()
            .flat_map(|g| g.matched_products.keys().map(String::as_str))
            .collect();
        let unmatched: HashSet<&str> = result.unmatched.iter().map(|u| u.part_id.as_str()).collect();
        let all: HashSet<&str> = items.iter().map(|i| i.part_id.as_str()).collect();

        assert!(grouped.is_disjoint(&unmatched));
        assert_eq!(&grouped | &unmatched, all);
        assert_eq!(result.groups.len(), 2);
        assert_eq!(result.catalog_rows, 4);
        assert!(result
            .groups
            .iter()
            .flat_map(|g| g.matched_products.values())
            .all(|p| p.price_classification == PriceClass::Ok
                || p.price.as_ref().is_some_and(|x| *x > BigDecimal::from(110))));
    }

    #[test]
    fn keyless_rows_leave_their_items_unmatched() {
        let mut item = InventoryItem::new("p1", "SKU-1");
        item.oem_code = "7852501".into();
        let rows = vec![
            CatalogRow {
                oes_numbers: Some("7852501".into()),
                article: Some("SR-1".into()),
                ..Default::default()
            },
            CatalogRow {
                oes_numbers: Some("7852501 | 4B1".into()),
                ..Default::default()
            },
        ];

        let result = compare_snapshot("eur", &rows, &[item], &BigDecimal::from_str("1.1").unwrap());

        assert!(result.groups.is_empty());
        assert_eq!(result.keyless_rows, 2);
        assert_eq!(result.skipped_rows, 0);
        let ids: Vec<&str> = result.unmatched.iter().map(|u| u.part_id.as_str()).collect();
        assert_eq!(ids, vec!["p1"]);
    }
}
