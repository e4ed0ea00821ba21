use crate::error::CompareError;
use bigdecimal::{BigDecimal, Zero};
use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub compare: CompareConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// 比对参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareConfig {
    /// TOP 段价格容差倍数, 保留为十进制字符串 (如 "1.1"), 避免浮点误差
    pub price_delta_perc: String,
    /// 运行前是否清空该目录的旧结果
    pub clear_before: bool,
    /// 目录 CSV 所在目录
    pub catalog_dir: String,
    /// 需要处理的目录标签
    pub catalogs: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/parts_compare".to_string(),
            },
            compare: CompareConfig::default(),
        }
    }
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            price_delta_perc: "1.1".to_string(),
            clear_before: true,
            catalog_dir: "data/stocklists".to_string(),
            catalogs: vec!["eur".to_string(), "gur".to_string()],
        }
    }
}

impl AppConfig {
    /// 加载配置: 默认值 -> compare.toml (可选) -> 环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let catalogs = std::env::var("CATALOGS").ok().map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        });

        let settings = Config::builder()
            .add_source(Config::try_from(&defaults)?)
            .add_source(File::with_name("compare").required(false))
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option(
                "compare.price_delta_perc",
                std::env::var("PRICE_DELTA_PERC").ok(),
            )?
            .set_override_option("compare.clear_before", std::env::var("CLEAR_BEFORE").ok())?
            .set_override_option("compare.catalog_dir", std::env::var("CATALOG_DIR").ok())?
            .set_override_option("compare.catalogs", catalogs)?
            .build()?;

        settings.try_deserialize()
    }
}

impl CompareConfig {
    pub fn price_delta(&self) -> Result<BigDecimal, CompareError> {
        parse_price_delta(&self.price_delta_perc)
    }
}

/// 解析价格容差倍数, 必须为正数
pub fn parse_price_delta(raw: &str) -> Result<BigDecimal, CompareError> {
    let value = BigDecimal::from_str(raw.trim())
        .map_err(|_| CompareError::InvalidTolerance(raw.to_string()))?;
    if value <= BigDecimal::zero() {
        return Err(CompareError::InvalidTolerance(raw.to_string()));
    }
    Ok(value)
}
