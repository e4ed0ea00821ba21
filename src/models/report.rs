use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 单个目录的处理结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogOutcome {
    pub groups_saved: usize,
    pub unmatched_saved: usize,
    /// 目录总行数
    pub catalog_rows: usize,
    /// 缺少 oes_numbers 被跳过的行数
    pub skipped_rows: usize,
    /// 有匹配但缺少 article/brand 未参与分组的行数
    pub keyless_rows: usize,
    pub error: Option<String>,
}

impl CatalogOutcome {
    pub fn failed(error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// 单个目录的持久化统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub groups: i64,
    pub matched_products: i64,
    pub ok: i64,
    pub high: i64,
    pub na: i64,
    pub unmatched: i64,
}

/// 全局持久化统计 (来自存储)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareStats {
    pub catalogs: BTreeMap<String, CatalogStats>,
    pub totals: CatalogStats,
}

impl CompareStats {
    /// 由各目录统计汇总 totals
    pub fn from_catalogs(catalogs: BTreeMap<String, CatalogStats>) -> Self {
        let mut totals = CatalogStats::default();
        for stats in catalogs.values() {
            totals.groups += stats.groups;
            totals.matched_products += stats.matched_products;
            totals.ok += stats.ok;
            totals.high += stats.high;
            totals.na += stats.na;
            totals.unmatched += stats.unmatched;
        }
        Self { catalogs, totals }
    }
}

/// 一次比对运行的报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// 按配置顺序排列
    pub catalogs: IndexMap<String, CatalogOutcome>,
    pub stats: Option<CompareStats>,
    pub stats_error: Option<String>,
}

impl RunReport {
    pub fn outcome(&self, catalog: &str) -> Option<&CatalogOutcome> {
        self.catalogs.get(catalog)
    }

    pub fn all_ok(&self) -> bool {
        self.catalogs.values().all(CatalogOutcome::is_ok) && self.stats_error.is_none()
    }
}
