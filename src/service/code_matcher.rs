use crate::models::{CodeSet, InventoryItem, MatchEvidence, MatchedBy};

/// 商品编码预处理结果: (原始写法, 大写形式), 每个商品只计算一次
#[derive(Debug, Clone)]
pub struct ItemCodes {
    oem: Option<(String, String)>,
    manufacturer: Option<(String, String)>,
    other: Vec<(String, String)>,
}

impl ItemCodes {
    pub fn from_item(item: &InventoryItem) -> Self {
        Self {
            oem: normalize(&item.oem_code),
            manufacturer: normalize(&item.manufacturer_code),
            other: item.other_codes.iter().filter_map(|c| normalize(c)).collect(),
        }
    }

    /// 按 oem_code -> manufacturer_code -> other_codes 顺序查找, 首个命中即返回
    pub fn match_against(&self, codes: &CodeSet) -> Option<MatchEvidence> {
        if codes.is_empty() {
            return None;
        }

        let hit = |entry: &Option<(String, String)>, by: MatchedBy| {
            entry
                .as_ref()
                .filter(|(_, upper)| codes.contains_normalized(upper))
                .map(|(raw, _)| MatchEvidence {
                    matched_by: by,
                    matched_value: raw.clone(),
                })
        };

        hit(&self.oem, MatchedBy::OemCode)
            .or_else(|| hit(&self.manufacturer, MatchedBy::ManufacturerCode))
            .or_else(|| {
                self.other
                    .iter()
                    .find(|(_, upper)| codes.contains_normalized(upper))
                    .map(|(raw, _)| MatchEvidence {
                        matched_by: MatchedBy::OtherCodes,
                        matched_value: raw.clone(),
                    })
            })
    }
}

fn normalize(code: &str) -> Option<(String, String)> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some((trimmed.to_string(), trimmed.to_uppercase()))
}

/// 判断单个商品与单个目录行是否可互换
pub fn match_item(item: &InventoryItem, codes: &CodeSet) -> Option<MatchEvidence> {
    ItemCodes::from_item(item).match_against(codes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(oem: &str, manufacturer: &str, other: &[&str]) -> InventoryItem {
        let mut item = InventoryItem::new("p1", "SKU-1");
        item.oem_code = oem.into();
        item.manufacturer_code = manufacturer.into();
        item.other_codes = other.iter().map(|s| s.to_string()).collect();
        item
    }

    #[test]
    fn oem_code_wins_when_every_code_matches() {
        let codes = CodeSet::parse("OEM1 | MAN1 | OTH1");
        let ev = match_item(&item("OEM1", "MAN1", &["OTH1"]), &codes).unwrap();
        assert_eq!(ev.matched_by, MatchedBy::OemCode);
        assert_eq!(ev.matched_value, "OEM1");
    }

    #[test]
    fn falls_through_to_manufacturer_then_other_codes() {
        let codes = CodeSet::parse("MAN1 | OTH2");
        let ev = match_item(&item("OEM1", "MAN1", &["OTH2"]), &codes).unwrap();
        assert_eq!(ev.matched_by, MatchedBy::ManufacturerCode);

        let codes = CodeSet::parse("OTH2");
        let ev = match_item(&item("OEM1", "MAN1", &["OTH1", "oth2", "OTH2"]), &codes).unwrap();
        assert_eq!(ev.matched_by, MatchedBy::OtherCodes);
        assert_eq!(ev.matched_value, "oth2");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let codes = CodeSet::parse("xx | ab123");
        let ev = match_item(&item("AB123", "", &[]), &codes).unwrap();
        assert_eq!(ev.matched_value, "AB123");
    }

    #[test]
    fn no_partial_or_substring_matching() {
        let item = item("AB123", "", &[]);
        assert!(match_item(&item, &CodeSet::parse("AB1234")).is_none());
        assert!(match_item(&item, &CodeSet::parse("AB12")).is_none());
        assert!(match_item(&item, &CodeSet::parse("AB123 X")).is_none());
    }

    #[test]
    fn empty_codes_never_match() {
        let blank = item("  ", "", &["", " "]);
        assert!(match_item(&blank, &CodeSet::parse("A | B")).is_none());
        assert!(match_item(&item("A", "", &[]), &CodeSet::default()).is_none());
    }
}
