use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// 目录行 (外部参考目录的一行)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogRow {
    /// 以 `|` 分隔的可互换编码集合
    pub oes_numbers: Option<String>,
    pub price_eur: Option<BigDecimal>,
    pub price_usd: Option<BigDecimal>,
    pub segments_names: Option<String>,
    pub article: Option<String>,
    pub brand: Option<String>,
    /// 其余描述字段, 按列顺序原样保留
    pub extra: IndexMap<String, String>,
}

impl CatalogRow {
    /// 解析编码集合; 缺少 oes_numbers 的行返回空集合, 永远不会匹配
    pub fn code_set(&self) -> CodeSet {
        self.oes_numbers
            .as_deref()
            .map(CodeSet::parse)
            .unwrap_or_default()
    }

    /// 分组键 (article, brand); 任一为空的行没有分组键
    pub fn group_key(&self) -> Option<GroupKey> {
        Some(GroupKey {
            article: trimmed(&self.article)?,
            brand: trimmed(&self.brand)?,
        })
    }

    /// 目录数据快照: 已知字段 + 额外字段
    pub fn catalog_data(&self) -> Value {
        let mut data = Map::new();
        let mut put = |key: &str, value: Option<String>| {
            data.insert(key.to_string(), value.map(Value::String).unwrap_or(Value::Null));
        };
        put("oes_numbers", self.oes_numbers.clone());
        put("price_eur", self.price_eur.as_ref().map(|p| p.to_string()));
        put("price_usd", self.price_usd.as_ref().map(|p| p.to_string()));
        put("segments_names", self.segments_names.clone());
        put("article", self.article.clone());
        put("brand", self.brand.clone());
        for (key, value) in &self.extra {
            data.entry(key.clone())
                .or_insert_with(|| Value::String(value.clone()));
        }
        Value::Object(data)
    }
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// 分组键
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey {
    pub article: String,
    pub brand: String,
}

/// 目录行的编码集合 (大写, 去空白, 去重)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeSet(HashSet<String>);

impl CodeSet {
    pub fn parse(oes_numbers: &str) -> Self {
        Self(
            oes_numbers
                .split('|')
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(str::to_uppercase)
                .collect(),
        )
    }

    /// `normalized` 须已经 trim + 大写
    pub fn contains_normalized(&self, normalized: &str) -> bool {
        self.0.contains(normalized)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_set_trims_uppercases_and_dedupes() {
        let set = CodeSet::parse(" ab123 | AB123|7852501 || ");
        assert_eq!(set.len(), 2);
        assert!(set.contains_normalized("AB123"));
        assert!(set.contains_normalized("7852501"));
    }

    #[test]
    fn missing_oes_numbers_gives_empty_set() {
        let row = CatalogRow::default();
        assert!(row.code_set().is_empty());
    }

    #[test]
    fn group_key_needs_both_article_and_brand() {
        let row = |article: Option<&str>, brand: Option<&str>| CatalogRow {
            article: article.map(Into::into),
            brand: brand.map(Into::into),
            ..Default::default()
        };

        let key = row(Some(" SR-1 "), Some("TRW")).group_key().unwrap();
        assert_eq!((key.article.as_str(), key.brand.as_str()), ("SR-1", "TRW"));
        assert!(row(None, Some("TRW")).group_key().is_none());
        assert!(row(Some("SR-1"), Some("  ")).group_key().is_none());
        assert!(row(None, None).group_key().is_none());
    }

    #[test]
    fn catalog_data_keeps_extra_columns() {
        let mut row = CatalogRow {
            oes_numbers: Some("A | B".into()),
            article: Some("SR-100".into()),
            ..Default::default()
        };
        row.extra.insert("car_model".into(), "Golf IV".into());

        let data = row.catalog_data();
        assert_eq!(data["car_model"], "Golf IV");
        assert_eq!(data["article"], "SR-100");
        assert!(data["brand"].is_null());
    }
}
