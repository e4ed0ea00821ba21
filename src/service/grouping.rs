use crate::models::{CatalogMatchGroup, GroupKey, RowMatch};
use indexmap::map::Entry;
use indexmap::{IndexMap, IndexSet};

/// 分组聚合器: 按 (article, brand) 合并目录行的匹配结果
///
/// 必须按目录顺序依次 `absorb`。同一 part_id 在组内只保留首次出现时的
/// 证据与价格分类, 统计值每次合并后由商品集合整体重算。
/// 缺少 article 或 brand 的行不参与分组, 只计数。
#[derive(Debug)]
pub struct GroupAggregator {
    catalog: String,
    groups: IndexMap<GroupKey, CatalogMatchGroup>,
    keyless_rows: usize,
}

/// 聚合结果
#[derive(Debug, Clone, PartialEq)]
pub struct Grouping {
    pub groups: Vec<CatalogMatchGroup>,
    /// 有匹配但缺少分组键而被丢弃的行数
    pub keyless_rows: usize,
}

impl GroupAggregator {
    pub fn new(catalog: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
            groups: IndexMap::new(),
            keyless_rows: 0,
        }
    }

    pub fn absorb(&mut self, record: RowMatch) {
        let Some(key) = record.row.group_key() else {
            tracing::warn!(
                "[{}] 目录行 {} 缺少 article/brand, 其 {} 个匹配商品不参与分组",
                self.catalog,
                record.row_index,
                record.matched.len()
            );
            self.keyless_rows += 1;
            return;
        };

        match self.groups.entry(key) {
            Entry::Vacant(slot) => {
                let group = seed_group(&self.catalog, slot.key(), record);
                slot.insert(group);
            }
            Entry::Occupied(mut slot) => {
                let group = slot.get_mut();
                let before = group.matched_products.len();

                for product in record.matched {
                    group
                        .matched_products
                        .entry(product.part_id.clone())
                        .or_insert(product);
                }
                if let Some(oes) = non_empty(record.row.oes_numbers.as_deref()) {
                    group.oes_variants.insert(oes.to_string());
                }
                group.recompute_stats();

                tracing::debug!(
                    "合并目录行 {} 到组 ({}, {}): 新增 {} 个商品",
                    record.row_index,
                    group.article,
                    group.brand,
                    group.matched_products.len() - before
                );
            }
        }
    }

    /// 按首次出现顺序输出全部分组
    pub fn finish(self) -> Grouping {
        Grouping {
            groups: self.groups.into_values().collect(),
            keyless_rows: self.keyless_rows,
        }
    }
}

fn seed_group(catalog: &str, key: &GroupKey, record: RowMatch) -> CatalogMatchGroup {
    let mut oes_variants = IndexSet::new();
    if let Some(oes) = non_empty(record.row.oes_numbers.as_deref()) {
        oes_variants.insert(oes.to_string());
    }

    let mut matched_products = IndexMap::with_capacity(record.matched.len());
    for product in record.matched {
        matched_products.entry(product.part_id.clone()).or_insert(product);
    }

    let mut group = CatalogMatchGroup {
        catalog: catalog.to_string(),
        article: key.article.clone(),
        brand: key.brand.clone(),
        oes_variants,
        catalog_data: record.row.catalog_data(),
        catalog_price_eur: record.row.price_eur.clone(),
        catalog_segments_names: record.row.segments_names.clone(),
        matched_products,
        stats: Default::default(),
    };
    group.recompute_stats();
    group
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// 将行匹配结果按目录顺序聚合为分组
pub fn aggregate_groups(
    catalog: &str,
    records: impl IntoIterator<Item = RowMatch>,
) -> Grouping {
    let mut aggregator = GroupAggregator::new(catalog);
    for record in records {
        aggregator.absorb(record);
    }
    aggregator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CatalogRow, InventoryItem, MatchEvidence, MatchedBy, MatchedProduct, PriceClass,
        PriceStats,
    };
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn d(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn product(part_id: &str, price: &str, class: PriceClass, by: MatchedBy) -> MatchedProduct {
        let mut item = InventoryItem::new(part_id, format!("SKU-{part_id}"));
        item.price = Some(d(price));
        MatchedProduct {
            part_id: part_id.into(),
            code: item.code.clone(),
            price: item.price.clone(),
            evidence: MatchEvidence {
                matched_by: by,
                matched_value: format!("code-{part_id}"),
            },
            price_classification: class,
            item,
        }
    }

    fn record(idx: usize, article: &str, oes: &str, products: Vec<MatchedProduct>) -> RowMatch {
        branded(idx, article, "TRW", oes, products)
    }

    fn branded(
        idx: usize,
        article: &str,
        brand: &str,
        oes: &str,
        products: Vec<MatchedProduct>,
    ) -> RowMatch {
        let stats = PriceStats::from_products(&products);
        RowMatch {
            row_index: idx,
            row: CatalogRow {
                oes_numbers: Some(oes.into()),
                price_eur: Some(d("100")),
                article: Some(article.into()),
                brand: Some(brand.into()),
                ..Default::default()
            },
            matched: products,
            stats,
        }
    }

    #[test]
    fn merges_rows_sharing_article_and_brand() {
        let groups = aggregate_groups(
            "eur",
            vec![
                record(0, "SR1", "A | B", vec![product("p1", "90", PriceClass::Ok, MatchedBy::OemCode)]),
                record(1, "SR2", "C", vec![product("p2", "50", PriceClass::Ok, MatchedBy::OemCode)]),
                record(2, "SR1", "A | D", vec![
                    product("p1", "90", PriceClass::Ok, MatchedBy::OemCode),
                    product("p3", "130", PriceClass::High, MatchedBy::OtherCodes),
                ]),
                record(3, "SR1", "A | B", vec![product("p4", "100", PriceClass::Ok, MatchedBy::OemCode)]),
            ],
        )
        .groups;

        assert_eq!(groups.len(), 2);
        let sr1 = &groups[0];
        assert_eq!(sr1.article, "SR1");
        assert_eq!(sr1.oes_numbers(), "A | B || A | D");
        let ids: Vec<&str> = sr1.matched_products.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["p1", "p3", "p4"]);
        assert_eq!(sr1.stats.count, 3);
        assert_eq!(sr1.stats.ok_count, 2);
        assert_eq!(sr1.stats.high_count, 1);
        assert_eq!(sr1.stats.min_price, Some(d("90")));
        assert_eq!(sr1.stats.max_price, Some(d("130")));
        assert_eq!(sr1.stats.avg_price, Some(d("106.67")));
    }

    #[test]
    fn first_occurrence_keeps_its_classification() {
        let groups = aggregate_groups(
            "gur",
            vec![
                record(0, "SR1", "A", vec![product("p1", "105", PriceClass::Ok, MatchedBy::OemCode)]),
                record(1, "SR1", "A", vec![product("p1", "105", PriceClass::High, MatchedBy::OtherCodes)]),
            ],
        )
        .groups;

        let kept = &groups[0].matched_products["p1"];
        assert_eq!(kept.price_classification, PriceClass::Ok);
        assert_eq!(kept.evidence.matched_by, MatchedBy::OemCode);
        assert_eq!(groups[0].stats.ok_count, 1);
        assert_eq!(groups[0].stats.high_count, 0);
    }

    #[test]
    fn permuted_rows_give_same_members_and_aggregates() {
        let rows = || {
            vec![
                record(0, "SR1", "A", vec![product("p1", "10", PriceClass::Ok, MatchedBy::OemCode)]),
                record(1, "SR1", "B", vec![
                    product("p2", "20", PriceClass::High, MatchedBy::OemCode),
                    product("p1", "10", PriceClass::Ok, MatchedBy::OemCode),
                ]),
                record(2, "SR1", "C", vec![product("p3", "33", PriceClass::Ok, MatchedBy::OemCode)]),
            ]
        };

        let forward = aggregate_groups("eur", rows()).groups;
        let mut reversed_rows = rows();
        reversed_rows.reverse();
        let reversed = aggregate_groups("eur", reversed_rows).groups;

        let mut a: Vec<&String> = forward[0].matched_products.keys().collect();
        let mut b: Vec<&String> = reversed[0].matched_products.keys().collect();
        a.sort();
        b.sort();
        assert_eq!(a, b);
        assert_eq!(forward[0].stats, reversed[0].stats);
    }

    #[test]
    fn rows_without_article_or_brand_are_not_grouped() {
        let grouping = aggregate_groups(
            "eur",
            vec![
                branded(0, "", "TRW", "A", vec![product("p1", "10", PriceClass::Ok, MatchedBy::OemCode)]),
                branded(1, "SR1", " ", "B", vec![product("p2", "20", PriceClass::Ok, MatchedBy::OemCode)]),
                branded(2, "", "", "C", vec![product("p3", "30", PriceClass::Ok, MatchedBy::OemCode)]),
                record(3, "SR1", "D", vec![product("p4", "40", PriceClass::Ok, MatchedBy::OemCode)]),
            ],
        );

        assert_eq!(grouping.keyless_rows, 3);
        assert_eq!(grouping.groups.len(), 1);
        let ids: Vec<&str> = grouping.groups[0].matched_products.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["p4"]);
        assert!(grouping.groups.iter().all(|g| !g.article.is_empty() && !g.brand.is_empty()));
    }
}
