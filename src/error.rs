use thiserror::Error;

/// 比对流程错误
///
/// 除 `InvalidTolerance` 外, 所有错误都在单个目录 (catalog tag) 范围内被捕获,
/// 记录到 `CatalogOutcome.error`, 不会中断其它目录或整次运行。
#[derive(Error, Debug)]
pub enum CompareError {
    /// 目录文件缺失、不可读或标签未配置
    #[error("catalog '{catalog}' unavailable: {reason}")]
    CatalogUnavailable { catalog: String, reason: String },

    /// 库存加载失败
    #[error("inventory load failed: {0}")]
    Inventory(String),

    /// 存储拒绝写入 (含超时)
    #[error("persistence failed for catalog '{catalog}': {reason}")]
    Persistence { catalog: String, reason: String },

    /// 全局统计查询失败
    #[error("stats query failed: {0}")]
    Stats(String),

    /// 价格容差不是正的十进制数
    #[error("invalid price tolerance '{0}'")]
    InvalidTolerance(String),

    /// 阻塞匹配任务 panic 或被取消
    #[error("matching task failed: {0}")]
    Matching(String),
}

impl CompareError {
    pub fn catalog_unavailable(catalog: &str, reason: impl ToString) -> Self {
        Self::CatalogUnavailable {
            catalog: catalog.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn persistence(catalog: &str, reason: impl ToString) -> Self {
        Self::Persistence {
            catalog: catalog.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CompareError>;
