//! 翻译网关配置
//!
//! 使用类型安全的环境变量系统进行配置管理

use crate::env::{gateway, web, EnvError, EnvResult, EnvVar};

/// 网关配置
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// 绑定地址
    pub bind_addr: String,
    /// 端口
    pub port: u16,
    /// OpenAI 兼容的 chat completions 地址
    pub upstream_url: String,
    /// 上游密钥；缺失时每个有效请求都返回 500
    pub api_key: Option<String>,
    /// 模型名称
    pub model: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 7080,
            upstream_url: "https://ai.gateway.lovable.dev/v1/chat/completions".to_string(),
            api_key: None,
            model: "google/gemini-2.5-flash".to_string(),
        }
    }
}

impl GatewayConfig {
    /// 从环境变量创建配置；格式错误的变量直接报错，未设置的使用默认值
    pub fn from_env() -> EnvResult<Self> {
        let api_key = match gateway::Key::get() {
            Ok(key) => Some(key),
            Err(e) if std::env::var(gateway::Key::NAME).is_err() => {
                tracing::debug!("{}", e);
                None
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            bind_addr: web::BindAddress::get()?,
            port: web::Port::get()?,
            upstream_url: gateway::Url::get()?,
            api_key,
            model: gateway::Model::get()?,
        })
    }

    /// 验证配置
    pub fn validate(&self) -> EnvResult<()> {
        if self.model.trim().is_empty() {
            return Err(EnvError {
                variable: gateway::Model::NAME.to_string(),
                message: "Model name cannot be empty".to_string(),
            });
        }

        if url::Url::parse(&self.upstream_url).is_err() {
            return Err(EnvError {
                variable: gateway::Url::NAME.to_string(),
                message: format!("Invalid upstream URL '{}'", self.upstream_url),
            });
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.socket_addr(), "127.0.0.1:7080");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_invalid_upstream_is_rejected() {
        let config = GatewayConfig {
            upstream_url: "not a url".to_string(),
            ..GatewayConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
