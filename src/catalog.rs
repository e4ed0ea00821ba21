use crate::error::{CompareError, Result};
use crate::models::CatalogRow;
use crate::store::CatalogProvider;
use bigdecimal::BigDecimal;
use csv::StringRecord;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// 目录 CSV 来源: `<dir>/<tag>.csv`
#[derive(Debug, Clone)]
pub struct CsvCatalogSource {
    dir: PathBuf,
    allowed: Vec<String>,
}

impl CsvCatalogSource {
    pub fn new(dir: impl Into<PathBuf>, allowed: Vec<String>) -> Self {
        Self {
            dir: dir.into(),
            allowed,
        }
    }

    fn path_for(&self, catalog: &str) -> Result<PathBuf> {
        if !self.allowed.iter().any(|t| t == catalog) {
            return Err(CompareError::catalog_unavailable(
                catalog,
                format!("catalog must be one of {:?}", self.allowed),
            ));
        }
        if catalog.is_empty() || catalog.contains(['/', '\\', '.']) {
            return Err(CompareError::catalog_unavailable(catalog, "invalid catalog tag"));
        }
        Ok(self.dir.join(format!("{catalog}.csv")))
    }
}

impl CatalogProvider for CsvCatalogSource {
    async fn load_catalog(&self, catalog: &str) -> Result<Vec<CatalogRow>> {
        let path = self.path_for(catalog)?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            CompareError::catalog_unavailable(
                catalog,
                format!("catalog file not found or unreadable: {}: {}", path.display(), e),
            )
        })?;

        let rows = parse_catalog(&bytes)
            .map_err(|e| CompareError::catalog_unavailable(catalog, format!("{}: {}", path.display(), e)))?;
        tracing::info!("Loaded catalog {}: {} rows", display_name(&path), rows.len());
        Ok(rows)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// 已知列在表头中的位置
#[derive(Debug, Default)]
struct Columns {
    oes_numbers: Option<usize>,
    price_eur: Option<usize>,
    price_usd: Option<usize>,
    segments_names: Option<usize>,
    article: Option<usize>,
    brand: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        let mut cols = Columns::default();
        for (idx, name) in headers.iter().enumerate() {
            let slot = match name.trim() {
                "oes_numbers" => &mut cols.oes_numbers,
                "price_eur" => &mut cols.price_eur,
                "price_usd" => &mut cols.price_usd,
                "segments_names" | "segment_name" => &mut cols.segments_names,
                "article" => &mut cols.article,
                "brand" => &mut cols.brand,
                _ => continue,
            };
            slot.get_or_insert(idx);
        }
        cols
    }

    fn is_known(&self, idx: usize) -> bool {
        [
            self.oes_numbers,
            self.price_eur,
            self.price_usd,
            self.segments_names,
            self.article,
            self.brand,
        ]
        .contains(&Some(idx))
    }
}

/// 解析目录 CSV (带表头)
pub fn parse_catalog(bytes: &[u8]) -> std::result::Result<Vec<CatalogRow>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let cols = Columns::from_headers(&headers);
    if cols.oes_numbers.is_none() {
        tracing::warn!("目录缺少 oes_numbers 列, 所有行都不会匹配");
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let text = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        let price = |idx: Option<usize>| text(idx).and_then(|s| BigDecimal::from_str(&s).ok());

        let mut row = CatalogRow {
            oes_numbers: text(cols.oes_numbers),
            price_eur: price(cols.price_eur),
            price_usd: price(cols.price_usd),
            segments_names: text(cols.segments_names),
            article: text(cols.article),
            brand: text(cols.brand),
            ..Default::default()
        };
        for (idx, name) in headers.iter().enumerate() {
            if cols.is_known(idx) {
                continue;
            }
            let value = record.get(idx).unwrap_or_default();
            row.extra.insert(name.to_string(), value.to_string());
        }
        rows.push(row);
    }

    Ok(rows)
}
