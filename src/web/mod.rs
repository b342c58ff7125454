//! Web 服务器模块
//!
//! 翻译网关：接收界面发来的批量翻译请求，转交给大模型并整理回复

pub mod config;
pub mod gateway;
#[cfg(feature = "web")]
pub mod handlers;
#[cfg(feature = "web")]
pub mod routes;
#[cfg(feature = "web")]
pub mod types;

pub use config::GatewayConfig;
pub use gateway::{build_system_prompt, clean_texts, extract_translations, parse_request, GatewayRequest};

#[cfg(feature = "web")]
use std::sync::Arc;

#[cfg(feature = "web")]
use axum::Router;
#[cfg(feature = "web")]
use tower_http::cors::CorsLayer;

use crate::translation::error::{TranslationError, TranslationResult};

/// 翻译网关服务器
pub struct GatewayServer {
    config: GatewayConfig,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// 启动服务器
    #[cfg(feature = "web")]
    pub async fn start(&self) -> TranslationResult<()> {
        if self.config.api_key.is_none() {
            tracing::warn!("未配置上游模型密钥，翻译请求将返回 500");
        }

        let app = create_router(Arc::new(types::AppState::new(self.config.clone())));

        let listener = tokio::net::TcpListener::bind(self.config.socket_addr())
            .await
            .map_err(|e| TranslationError::Config(format!("Failed to bind server: {}", e)))?;

        tracing::info!("Translate gateway starting at http://{}", self.config.socket_addr());

        axum::serve(listener, app)
            .await
            .map_err(|e| TranslationError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// 启动服务器（非 web feature 版本）
    #[cfg(not(feature = "web"))]
    pub async fn start(&self) -> TranslationResult<()> {
        Err(TranslationError::Config("Web feature not enabled".to_string()))
    }
}

/// 创建路由器
#[cfg(feature = "web")]
pub fn create_router(app_state: Arc<types::AppState>) -> Router {
    routes::create_routes()
        .with_state(app_state)
        // 浏览器直接调用函数，需要预检
        .layer(CorsLayer::permissive())
}
