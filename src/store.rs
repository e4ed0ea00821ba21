//! 外部协作方接口: 库存来源, 目录来源, 结果存储

use crate::error::Result;
use crate::models::{CatalogMatchGroup, CatalogRow, CompareStats, InventoryItem, UnmatchedItem};
use std::future::Future;

/// 库存来源: 返回完整的当前库存快照
pub trait InventoryProvider: Send + Sync {
    fn load_inventory(&self) -> impl Future<Output = Result<Vec<InventoryItem>>> + Send;
}

/// 目录来源: 按标签返回有序的目录行
///
/// 数据源缺失或不可读时返回 `CompareError::CatalogUnavailable`。
pub trait CatalogProvider: Send + Sync {
    fn load_catalog(&self, catalog: &str) -> impl Future<Output = Result<Vec<CatalogRow>>> + Send;
}

/// 写入结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SavedCounts {
    pub groups: usize,
    pub unmatched: usize,
}

/// 结果存储
pub trait ResultStore: Send + Sync {
    /// 在单个事务中写入某目录的分组与未匹配商品。
    /// `clear` 为 true 时先删除该目录的旧结果 (整体替换), 否则按键 upsert。
    /// 事务提交前被中断时, 该目录原有数据保持不变。
    fn save_catalog(
        &self,
        catalog: &str,
        groups: &[CatalogMatchGroup],
        unmatched: &[UnmatchedItem],
        clear: bool,
    ) -> impl Future<Output = Result<SavedCounts>> + Send;

    fn fetch_stats(&self) -> impl Future<Output = Result<CompareStats>> + Send;
}
