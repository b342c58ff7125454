//! 翻译配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, TranslationConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 批次处理相关
    pub const MAX_BATCH: usize = 40;

    // 文本过滤相关
    pub const MAX_TEXT_CHARS: usize = 240;

    // 缓存设置
    pub const CACHE_KEY: &str = "mw_ui_translate_cache_v1";
    pub const MAX_CACHE_KEYS: usize = 800;
    pub const CACHE_RETAIN_RATIO: f64 = 0.7;

    // 实时观察
    pub const DEBOUNCE: Duration = Duration::from_millis(250);
    pub const SETTINGS_CHANGED_EVENT: &str = "mw-settings-changed";

    // 语言偏好
    pub const LANGUAGE_STORAGE_KEY: &str = "mw_language";
    pub const DEFAULT_SOURCE_LANGUAGE: &str = "en";
    pub const FALLBACK_LANGUAGE: &str = "en";

    // 默认API设置
    pub const DEFAULT_ENDPOINT: &str = "http://localhost:54321/functions/v1/translate";
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_CACHE_PATH: &str = "~/.cache/mindweaver/ui-translate.redb";

    // 可翻译属性
    pub const TRANSLATABLE_ATTRS: &[&str] = &["placeholder", "title", "aria-label"];

    // 退出翻译的标记属性
    pub const NO_TRANSLATE_ATTR: &str = "data-no-translate";

    // 文本节点：可执行、原样显示或可编辑的内容
    pub const TEXT_BLOCKING_TAGS: &[&str] = &[
        "script", "style", "noscript", "code", "pre", "textarea", "input", "select", "option",
    ];

    // 属性：表单控件上的提示语仍然需要翻译
    pub const ATTR_BLOCKING_TAGS: &[&str] = &["script", "style", "noscript", "code", "pre"];

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "mindweaver.toml",
        ".mindweaver.toml",
        "~/.config/mindweaver/translate.toml",
    ];
}

/// 加载配置，失败时回退到默认值
pub fn load_translation_config() -> TranslationConfig {
    match ConfigManager::new() {
        Ok(manager) => manager.into_config(),
        Err(e) => {
            tracing::warn!("配置加载失败，使用默认配置: {}", e);
            TranslationConfig::default()
        }
    }
}
