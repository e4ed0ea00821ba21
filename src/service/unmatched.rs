use crate::models::{CatalogMatchGroup, InventoryItem, SearchedCodes, UnmatchedItem};
use std::collections::HashSet;

/// 计算补集: 未被任何分组引用的库存商品
pub fn collect_unmatched(
    catalog: &str,
    items: &[InventoryItem],
    groups: &[CatalogMatchGroup],
) -> Vec<UnmatchedItem> {
    let matched: HashSet<&str> = groups
        .iter()
        .flat_map(|g| g.matched_products.keys().map(String::as_str))
        .collect();

    items
        .iter()
        .filter(|item| !matched.contains(item.part_id.as_str()))
        .map(|item| UnmatchedItem {
            catalog: catalog.to_string(),
            part_id: item.part_id.clone(),
            code: item.code.clone(),
            price: item.price.clone(),
            searched_codes: SearchedCodes {
                oem_code: item.oem_code.clone(),
                manufacturer_code: item.manufacturer_code.clone(),
                other_codes: item.other_codes.clone(),
            },
            item: item.clone(),
        })
        .collect()
}
