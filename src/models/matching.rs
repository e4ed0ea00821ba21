use super::{CatalogRow, InventoryItem};
use bigdecimal::{BigDecimal, Zero};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 命中的编码来源, 按优先级排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedBy {
    OemCode,
    ManufacturerCode,
    OtherCodes,
}

/// 匹配证据 (未命中时不存在)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEvidence {
    pub matched_by: MatchedBy,
    /// 命中的具体编码 (商品上的原始写法, 已去空白)
    pub matched_value: String,
}

/// 价格分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriceClass {
    Ok,
    High,
    Na,
}

/// 匹配到某目录行的库存商品
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedProduct {
    pub part_id: String,
    pub code: String,
    pub price: Option<BigDecimal>,
    pub evidence: MatchEvidence,
    pub price_classification: PriceClass,
    pub item: InventoryItem,
}

/// 匹配商品的价格统计, 始终由商品集合整体计算得出
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    pub count: usize,
    pub ok_count: usize,
    pub high_count: usize,
    pub avg_price: Option<BigDecimal>,
    pub min_price: Option<BigDecimal>,
    pub max_price: Option<BigDecimal>,
}

impl PriceStats {
    /// 无价格的商品计入 count, 不参与 avg/min/max
    pub fn from_products<'a>(products: impl IntoIterator<Item = &'a MatchedProduct>) -> Self {
        let mut stats = PriceStats::default();
        let mut sum = BigDecimal::zero();
        let mut priced = 0i64;

        for product in products {
            stats.count += 1;
            match product.price_classification {
                PriceClass::Ok => stats.ok_count += 1,
                PriceClass::High => stats.high_count += 1,
                PriceClass::Na => {}
            }

            let Some(price) = &product.price else {
                continue;
            };
            sum += price;
            priced += 1;
            if stats.min_price.as_ref().map_or(true, |min| price < min) {
                stats.min_price = Some(price.clone());
            }
            if stats.max_price.as_ref().map_or(true, |max| price > max) {
                stats.max_price = Some(price.clone());
            }
        }

        if priced > 0 {
            stats.avg_price = Some((sum / BigDecimal::from(priced)).round(2));
        }

        stats
    }

    pub fn na_count(&self) -> usize {
        self.count - self.ok_count - self.high_count
    }
}

/// 单个目录行的中间匹配结果
#[derive(Debug, Clone, PartialEq)]
pub struct RowMatch {
    /// 目录中的行号 (0 起)
    pub row_index: usize,
    pub row: CatalogRow,
    pub matched: Vec<MatchedProduct>,
    pub stats: PriceStats,
}

/// 按 (article, brand) 聚合的目录匹配组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogMatchGroup {
    pub catalog: String,
    pub article: String,
    pub brand: String,
    /// 出现过的 oes_numbers 变体, 按首次出现顺序
    pub oes_variants: IndexSet<String>,
    /// 首行目录数据
    pub catalog_data: Value,
    pub catalog_price_eur: Option<BigDecimal>,
    pub catalog_segments_names: Option<String>,
    /// part_id -> 商品, 同一 part_id 只出现一次
    pub matched_products: IndexMap<String, MatchedProduct>,
    pub stats: PriceStats,
}

impl CatalogMatchGroup {
    pub const VARIANT_SEPARATOR: &'static str = " || ";

    /// 展示用的 oes_numbers
    pub fn oes_numbers(&self) -> String {
        self.oes_variants
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(Self::VARIANT_SEPARATOR)
    }

    /// 依据当前商品集合重算统计
    pub fn recompute_stats(&mut self) {
        self.stats = PriceStats::from_products(self.matched_products.values());
    }

    /// 按首次出现顺序序列化的商品数组
    pub fn matched_products_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self.matched_products.values().collect::<Vec<_>>())
    }
}

/// 尝试过的编码, 用于诊断目录覆盖缺口
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchedCodes {
    pub oem_code: String,
    pub manufacturer_code: String,
    pub other_codes: Vec<String>,
}

/// 未被任何目录组引用的库存商品
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedItem {
    pub catalog: String,
    pub part_id: String,
    pub code: String,
    pub price: Option<BigDecimal>,
    pub searched_codes: SearchedCodes,
    pub item: InventoryItem,
}
