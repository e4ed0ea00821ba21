use crate::error::{CompareError, Result};
use crate::models::{InventoryItem, ProductRow};
use crate::store::InventoryProvider;
use futures::TryStreamExt;
use sqlx::PgPool;

/// products 表作为库存来源
#[derive(Debug, Clone)]
pub struct PgInventory {
    pool: PgPool,
}

impl PgInventory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl InventoryProvider for PgInventory {
    /// 流式读取全部商品, 按 part_id 排序保证快照顺序稳定
    async fn load_inventory(&self) -> Result<Vec<InventoryItem>> {
        let start = std::time::Instant::now();
        let mut stream = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT part_id, code, price, url, source_site, category, item_description
            FROM products
            ORDER BY part_id
            "#,
        )
        .fetch(&self.pool);

        let mut items = Vec::new();
        while let Some(row) = stream
            .try_next()
            .await
            .map_err(|e| CompareError::Inventory(e.to_string()))?
        {
            items.push(InventoryItem::from(row));
        }

        tracing::debug!("读取库存 {} 条, 耗时: {:?}", items.len(), start.elapsed());
        Ok(items)
    }
}
