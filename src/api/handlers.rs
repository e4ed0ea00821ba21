use crate::config::parse_price_delta;
use crate::service::RunOptions;
use crate::PgCompareService;
use axum::{
    body::Bytes,
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 请求体: 可选覆盖本次运行参数
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunCompareRequest {
    pub price_delta_perc: Option<String>,
    pub clear_before: Option<bool>,
}

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl RunCompareRequest {
    /// 解析请求体; 空请求体表示全部使用默认参数
    pub fn from_body(body: &[u8]) -> Result<Self, String> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| format!("invalid request body: {}", e))
    }

    /// 合并默认参数与请求覆盖项
    pub fn resolve(&self, defaults: &RunOptions) -> Result<RunOptions, String> {
        let price_delta = match &self.price_delta_perc {
            Some(raw) => parse_price_delta(raw).map_err(|e| e.to_string())?,
            None => defaults.price_delta.clone(),
        };
        Ok(RunOptions {
            price_delta,
            clear_before: self.clear_before.unwrap_or(defaults.clear_before),
        })
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    let response = ErrorResponse {
        success: false,
        message,
    };
    (status, Json(response)).into_response()
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 触发一次完整比对 (两个目录), 单个目录的失败体现在报告中
pub async fn run_compare(
    State(service): State<Arc<PgCompareService>>,
    body: Bytes,
) -> Response {
    let options = match RunCompareRequest::from_body(&body)
        .and_then(|request| request.resolve(service.default_options()))
    {
        Ok(options) => options,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let report = service.run_with(&options).await;
    (StatusCode::OK, Json(report)).into_response()
}

/// 查询已持久化的比对统计
pub async fn compare_stats(State(service): State<Arc<PgCompareService>>) -> Response {
    match service.stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)),
    }
}
