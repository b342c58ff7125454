//! Web 模块的数据类型定义

use serde::Serialize;

use super::config::GatewayConfig;

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub client: reqwest::Client,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

/// 翻译响应
#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub translations: Vec<String>,
}

/// 错误响应
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}
