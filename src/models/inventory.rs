use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;

/// 库存商品 (运行期间只读快照)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub part_id: String,
    pub code: String,
    pub price: Option<BigDecimal>,
    pub oem_code: String,
    pub manufacturer_code: String,
    pub other_codes: Vec<String>,
    pub url: Option<String>,
    pub source_site: Option<String>,
    pub category: Option<String>,
}

impl InventoryItem {
    pub fn new(part_id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            part_id: part_id.into(),
            code: code.into(),
            price: None,
            oem_code: String::new(),
            manufacturer_code: String::new(),
            other_codes: Vec::new(),
            url: None,
            source_site: None,
            category: None,
        }
    }
}

/// products 表原始行
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub part_id: String,
    pub code: String,
    pub price: Option<BigDecimal>,
    pub url: Option<String>,
    pub source_site: Option<String>,
    pub category: Option<String>,
    pub item_description: Option<Json<Value>>,
}

impl From<ProductRow> for InventoryItem {
    fn from(row: ProductRow) -> Self {
        let desc = row.item_description.map(|j| j.0).unwrap_or(Value::Null);

        Self {
            part_id: row.part_id,
            code: row.code,
            price: row.price,
            oem_code: text_field(&desc, "oem_code"),
            manufacturer_code: text_field(&desc, "manufacturer_code"),
            other_codes: other_codes(&desc),
            url: row.url,
            source_site: row.source_site,
            category: row.category,
        }
    }
}

fn text_field(desc: &Value, key: &str) -> String {
    desc.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// other_codes 可能是数组或单个字符串, 其它形态视为空
fn other_codes(desc: &Value) -> Vec<String> {
    match desc.get("other_codes") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}
