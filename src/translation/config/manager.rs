//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::constants;
use crate::translation::error::{helpers::config_error, TranslationError, TranslationResult};

/// 客户端翻译配置
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TranslationConfig {
    // 远程翻译函数
    pub endpoint: String,
    pub access_token: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,

    // 语言
    pub source_language: String,

    // 批次与观察
    pub batch_size: usize,
    pub debounce_ms: u64,

    // 缓存
    pub max_cache_keys: usize,
    pub cache_retain_ratio: f64,
    /// redb 文件路径；`None` 表示只在内存中缓存
    pub cache_path: Option<String>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: constants::DEFAULT_ENDPOINT.to_string(),
            access_token: None,
            api_key: None,
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),

            source_language: constants::DEFAULT_SOURCE_LANGUAGE.to_string(),

            batch_size: constants::MAX_BATCH,
            debounce_ms: constants::DEBOUNCE.as_millis() as u64,

            max_cache_keys: constants::MAX_CACHE_KEYS,
            cache_retain_ratio: constants::CACHE_RETAIN_RATIO,
            cache_path: Some(constants::DEFAULT_CACHE_PATH.to_string()),
        }
    }
}

impl TranslationConfig {
    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.batch_size == 0 {
            return Err(config_error("批次大小不能为0"));
        }

        if self.max_cache_keys == 0 {
            return Err(config_error("缓存键上限不能为0"));
        }

        if !(self.cache_retain_ratio > 0.0 && self.cache_retain_ratio <= 1.0) {
            return Err(config_error("缓存保留比例必须在 (0, 1] 之间"));
        }

        if self.source_language.trim().is_empty() {
            return Err(config_error("源语言不能为空"));
        }

        let url = Url::parse(&self.endpoint)
            .map_err(|e| config_error(format!("翻译端点无效 '{}': {}", self.endpoint, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(config_error(format!(
                "翻译端点必须使用 http 或 https: {}",
                self.endpoint
            )));
        }

        Ok(())
    }

    /// 应用环境变量覆盖（使用类型安全环境变量系统）
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{cache, translation, EnvVar};

        if let Ok(endpoint) = translation::Endpoint::get() {
            self.endpoint = endpoint;
            tracing::info!("环境变量覆盖翻译端点: {}", self.endpoint);
        }

        if let Ok(token) = translation::AccessToken::get() {
            self.access_token = Some(token);
        }

        if let Ok(api_key) = translation::ApiKey::get() {
            self.api_key = Some(api_key);
        }

        if let Ok(timeout) = translation::RequestTimeout::get() {
            self.request_timeout_secs = timeout.as_secs();
        }

        if let Ok(source) = translation::SourceLanguage::get() {
            self.source_language = source;
        }

        if let Ok(batch_size) = translation::BatchSize::get() {
            self.batch_size = batch_size;
        }

        if let Ok(debounce) = translation::Debounce::get() {
            self.debounce_ms = debounce.as_millis() as u64;
        }

        if let Ok(max_keys) = cache::MaxKeys::get() {
            self.max_cache_keys = max_keys;
        }

        if let Ok(path) = cache::Path::get() {
            self.cache_path = if path.is_empty() { None } else { Some(path) };
        }

        if cache::Disabled::get_or_default(false) {
            self.cache_path = None;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// 展开 `~` 后的缓存路径
    pub fn expanded_cache_path(&self) -> Option<String> {
        self.cache_path
            .as_deref()
            .map(|path| shellexpand::tilde(path).into_owned())
    }
}

/// 简化的配置管理器
pub struct ConfigManager {
    config: TranslationConfig,
}

impl ConfigManager {
    /// 创建新的配置管理器：.env → 配置文件 → 环境变量 → 校验
    pub fn new() -> TranslationResult<Self> {
        Self::load_dotenv();

        let mut config = Self::load_config()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 从指定文件创建（不读取环境变量）
    pub fn from_file(path: &str) -> TranslationResult<Self> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn into_config(self) -> TranslationConfig {
        self.config
    }

    /// 从搜索路径加载配置
    fn load_config() -> TranslationResult<TranslationConfig> {
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::debug!("未找到配置文件，使用默认配置");
        Ok(TranslationConfig::default())
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &str) -> TranslationResult<TranslationConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::Config(format!("读取配置文件失败: {}", e)))?;

        if path.ends_with(".toml") {
            Ok(toml::from_str(&content)?)
        } else {
            serde_json::from_str(&content)
                .map_err(|e| TranslationError::Config(format!("解析JSON配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = TranslationConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::Config(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::Config(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TranslationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 40);
        assert_eq!(config.max_cache_keys, 800);
        assert_eq!(config.debounce(), Duration::from_millis(250));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = TranslationConfig::default();
        config.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = TranslationConfig::default();
        config.cache_retain_ratio = 1.5;
        assert!(config.validate().is_err());

        let mut config = TranslationConfig::default();
        config.endpoint = "ftp://example.com/translate".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: TranslationConfig = toml::from_str(
            r#"
            endpoint = "https://example.supabase.co/functions/v1/translate"
            source_language = "ru"
            "#,
        )
        .unwrap();

        assert_eq!(config.source_language, "ru");
        assert_eq!(config.batch_size, 40);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_example_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mindweaver.toml");
        let path = path.to_str().unwrap();

        ConfigManager::generate_example_config(path).unwrap();
        let manager = ConfigManager::from_file(path).unwrap();
        assert_eq!(manager.get_config(), &TranslationConfig::default());
    }
}
