use super::code_matcher::ItemCodes;
use super::price::classify_price;
use crate::models::{CatalogRow, InventoryItem, MatchedProduct, PriceStats, RowMatch};
use bigdecimal::BigDecimal;
use rayon::prelude::*;

/// 目录扫描结果
#[derive(Debug, Default)]
pub struct RowScan {
    /// 有命中的行, 保持目录顺序
    pub matches: Vec<RowMatch>,
    /// 缺少 oes_numbers 被跳过的行数
    pub skipped_rows: usize,
}

/// 库存快照 + 预处理后的编码
pub struct PreparedInventory<'a> {
    entries: Vec<(&'a InventoryItem, ItemCodes)>,
}

impl<'a> PreparedInventory<'a> {
    pub fn new(items: &'a [InventoryItem]) -> Self {
        Self {
            entries: items.iter().map(|i| (i, ItemCodes::from_item(i))).collect(),
        }
    }

    /// 对单个目录行做全量扫描
    pub fn match_row(
        &self,
        row_index: usize,
        row: &CatalogRow,
        multiplier: &BigDecimal,
    ) -> RowOutcome {
        // 每行只解析一次编码集合
        let codes = row.code_set();
        if codes.is_empty() {
            return RowOutcome::Skipped;
        }

        let matched: Vec<MatchedProduct> = self
            .entries
            .iter()
            .filter_map(|(item, item_codes)| {
                let evidence = item_codes.match_against(&codes)?;
                let price_classification = classify_price(
                    item.price.as_ref(),
                    row.price_eur.as_ref(),
                    row.segments_names.as_deref(),
                    multiplier,
                );
                Some(MatchedProduct {
                    part_id: item.part_id.clone(),
                    code: item.code.clone(),
                    price: item.price.clone(),
                    evidence,
                    price_classification,
                    item: (*item).clone(),
                })
            })
            .collect();

        if matched.is_empty() {
            return RowOutcome::NoMatch;
        }

        tracing::debug!(
            "目录行 {} (article={:?}) 命中 {} 个商品",
            row_index,
            row.article,
            matched.len()
        );

        let stats = PriceStats::from_products(&matched);
        RowOutcome::Matched(RowMatch {
            row_index,
            row: row.clone(),
            matched,
            stats,
        })
    }
}

/// 单行扫描结果
#[derive(Debug)]
pub enum RowOutcome {
    /// 缺少 oes_numbers, 不参与匹配
    Skipped,
    NoMatch,
    Matched(RowMatch),
}

/// 行匹配构建: 每行 × 每个商品全量比对, 行间并行, 结果保持目录顺序
pub fn build_row_matches(
    rows: &[CatalogRow],
    items: &[InventoryItem],
    multiplier: &BigDecimal,
) -> RowScan {
    let inventory = PreparedInventory::new(items);

    let outcomes: Vec<RowOutcome> = rows
        .par_iter()
        .enumerate()
        .map(|(idx, row)| inventory.match_row(idx, row, multiplier))
        .collect();

    let mut scan = RowScan::default();
    for outcome in outcomes {
        match outcome {
            RowOutcome::Skipped => scan.skipped_rows += 1,
            RowOutcome::NoMatch => {}
            RowOutcome::Matched(rm) => scan.matches.push(rm),
        }
    }

    if scan.skipped_rows > 0 {
        tracing::debug!("跳过 {} 行缺少 oes_numbers 的目录行", scan.skipped_rows);
    }

    scan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchedBy, PriceClass};
    use std::str::FromStr;

    fn d(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn item(part_id: &str, oem: &str, price: Option<&str>) -> InventoryItem {
        let mut item = InventoryItem::new(part_id, format!("SKU-{part_id}"));
        item.oem_code = oem.into();
        item.price = price.map(d);
        item
    }

    fn row(oes: Option<&str>, eur: Option<&str>, segment: &str) -> CatalogRow {
        CatalogRow {
            oes_numbers: oes.map(String::from),
            price_eur: eur.map(d),
            segments_names: Some(segment.into()),
            article: Some("A1".into()),
            brand: Some("B1".into()),
            ..Default::default()
        }
    }

    #[test]
    fn builds_record_with_evidence_classification_and_stats() {
        let items = vec![
            item("p1", "X1", Some("90")),
            item("p2", "x1", Some("120")),
            item("p3", "X1", None),
            item("p4", "Y9", Some("10")),
        ];
        let rows = vec![row(Some("X1 | X2"), Some("100"), "Assortment")];

        let scan = build_row_matches(&rows, &items, &d("1.1"));
        assert_eq!(scan.matches.len(), 1);

        let rm = &scan.matches[0];
        assert_eq!(rm.matched.len(), 3);
        assert!(rm.matched.iter().all(|m| m.evidence.matched_by == MatchedBy::OemCode));
        assert_eq!(rm.stats.ok_count, 1);
        assert_eq!(rm.stats.high_count, 1);
        assert_eq!(rm.stats.na_count(), 1);
        assert_eq!(rm.stats.avg_price, Some(d("105")));
        assert_eq!(rm.stats.min_price, Some(d("90")));
        assert_eq!(rm.matched[1].price_classification, PriceClass::High);
    }

    #[test]
    fn drops_rows_without_matches_and_counts_malformed_rows() {
        let items = vec![item("p1", "X1", Some("1"))];
        let rows = vec![
            row(None, Some("100"), "TOP"),
            row(Some("Z9"), Some("100"), "TOP"),
            row(Some(" | "), Some("100"), "TOP"),
            row(Some("X1"), Some("100"), "TOP"),
        ];

        let scan = build_row_matches(&rows, &items, &d("1.1"));
        assert_eq!(scan.skipped_rows, 2);
        assert_eq!(scan.matches.len(), 1);
        assert_eq!(scan.matches[0].row_index, 3);
    }

    #[test]
    fn keeps_catalog_order_across_parallel_scan() {
        let items = vec![item("p1", "X1", Some("1"))];
        let rows: Vec<CatalogRow> = (0..200).map(|_| row(Some("X1"), None, "")).collect();

        let scan = build_row_matches(&rows, &items, &d("1.1"));
        let indexes: Vec<usize> = scan.matches.iter().map(|m| m.row_index).collect();
        assert_eq!(indexes, (0..200).collect::<Vec<_>>());
    }
}
