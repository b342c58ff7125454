//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "MINDWEAVER_LOG_LEVEL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }
}

/// 翻译客户端相关环境变量
pub mod translation {
    use super::*;

    /// 远程翻译函数地址
    pub struct Endpoint;
    impl EnvVar<String> for Endpoint {
        const NAME: &'static str = "MINDWEAVER_TRANSLATE_ENDPOINT";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "URL of the batched translate function";

        fn parse(value: &str) -> EnvResult<String> {
            parse_http_url(value, Self::NAME)
        }
    }

    /// 调用翻译函数时使用的 Bearer 令牌
    pub struct AccessToken;
    impl EnvVar<String> for AccessToken {
        const NAME: &'static str = "MINDWEAVER_TRANSLATE_TOKEN";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Bearer token sent to the translate function";

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }

    /// 函数网关的 apikey 头
    pub struct ApiKey;
    impl EnvVar<String> for ApiKey {
        const NAME: &'static str = "MINDWEAVER_TRANSLATE_API_KEY";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Value of the apikey header for the function gateway";

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }

    /// 界面的原生语言
    pub struct SourceLanguage;
    impl EnvVar<String> for SourceLanguage {
        const NAME: &'static str = "MINDWEAVER_SOURCE_LANGUAGE";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Native UI language; requesting it restores originals";

        fn parse(value: &str) -> EnvResult<String> {
            let lang = value.trim().to_lowercase();
            if lang.is_empty() || !lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Invalid language tag '{}'", value),
                });
            }
            Ok(lang)
        }
    }

    /// 每批最多发送的字符串数
    pub struct BatchSize;
    impl EnvVar<usize> for BatchSize {
        const NAME: &'static str = "MINDWEAVER_BATCH_SIZE";
        const DEFAULT: Option<usize> = None;
        const DESCRIPTION: &'static str = "Maximum strings per remote translate call";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 500)
        }
    }

    /// 变更合并窗口
    pub struct Debounce;
    impl EnvVar<Duration> for Debounce {
        const NAME: &'static str = "MINDWEAVER_DEBOUNCE_MS";
        const DEFAULT: Option<Duration> = None;
        const DESCRIPTION: &'static str = "Debounce window for DOM/settings changes in milliseconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_positive_usize(value, Self::NAME, 1, 60_000).map(|ms| Duration::from_millis(ms as u64))
        }
    }

    /// 单次请求超时
    pub struct RequestTimeout;
    impl EnvVar<Duration> for RequestTimeout {
        const NAME: &'static str = "MINDWEAVER_REQUEST_TIMEOUT";
        const DEFAULT: Option<Duration> = None;
        const DESCRIPTION: &'static str = "Translate request timeout in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_positive_usize(value, Self::NAME, 1, 600).map(|s| Duration::from_secs(s as u64))
        }
    }
}

/// 缓存相关环境变量
pub mod cache {
    use super::*;

    /// 持久化缓存的键上限
    pub struct MaxKeys;
    impl EnvVar<usize> for MaxKeys {
        const NAME: &'static str = "MINDWEAVER_CACHE_MAX_KEYS";
        const DEFAULT: Option<usize> = None;
        const DESCRIPTION: &'static str = "Maximum persisted translation cache keys";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 1_000_000)
        }
    }

    /// redb 缓存文件；空字符串表示只用内存
    pub struct Path;
    impl EnvVar<String> for Path {
        const NAME: &'static str = "MINDWEAVER_CACHE_PATH";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Path of the durable cache file (empty = in-memory)";

        fn parse(value: &str) -> EnvResult<String> {
            Ok(value.trim().to_string())
        }
    }

    /// 关闭持久化缓存
    pub struct Disabled;
    impl EnvVar<bool> for Disabled {
        const NAME: &'static str = "MINDWEAVER_CACHE_DISABLED";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Keep the translation cache in memory only (true/false)";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }
}

/// 翻译网关（服务端）相关环境变量
pub mod gateway {
    use super::*;

    /// OpenAI 兼容的 chat completions 地址
    pub struct Url;
    impl EnvVar<String> for Url {
        const NAME: &'static str = "MINDWEAVER_GATEWAY_URL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("https://ai.gateway.lovable.dev/v1/chat/completions".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Chat completions endpoint used by the translate gateway";

        fn parse(value: &str) -> EnvResult<String> {
            parse_http_url(value, Self::NAME)
        }
    }

    /// 上游模型密钥
    pub struct Key;
    impl EnvVar<String> for Key {
        const NAME: &'static str = "MINDWEAVER_GATEWAY_KEY";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "API key for the chat completions endpoint";

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }

    /// 模型名称
    pub struct Model;
    impl EnvVar<String> for Model {
        const NAME: &'static str = "MINDWEAVER_GATEWAY_MODEL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("google/gemini-2.5-flash".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Model name sent to the chat completions endpoint";

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }
}

/// Web服务器相关环境变量
pub mod web {
    use super::*;

    /// 绑定地址
    pub struct BindAddress;
    impl EnvVar<String> for BindAddress {
        const NAME: &'static str = "MINDWEAVER_WEB_BIND";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("127.0.0.1".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Web server bind address";

        fn parse(value: &str) -> EnvResult<String> {
            let addr = value.trim();
            if addr.parse::<std::net::IpAddr>().is_err() && addr != "localhost" {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Invalid IP address '{}'", value),
                });
            }
            Ok(addr.to_string())
        }
    }

    /// 端口
    pub struct Port;
    impl EnvVar<u16> for Port {
        const NAME: &'static str = "MINDWEAVER_WEB_PORT";
        const DEFAULT: Option<u16> = Some(7080);
        const DESCRIPTION: &'static str = "Web server port";

        fn parse(value: &str) -> EnvResult<u16> {
            value.trim().parse::<u16>().ok().filter(|p| *p > 0).ok_or_else(|| EnvError {
                variable: Self::NAME.to_string(),
                message: format!("Invalid port '{}'", value),
            })
        }
    }
}

fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Invalid boolean '{}'", value),
        }),
    }
}

fn parse_non_empty(value: &str, var_name: &str) -> EnvResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: "Value must not be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn parse_http_url(value: &str, var_name: &str) -> EnvResult<String> {
    let trimmed = value.trim();
    match url::Url::parse(trimmed) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(trimmed.to_string()),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Invalid http(s) URL '{}'", value),
        }),
    }
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let parsed = value.trim().parse::<usize>().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: format!("Invalid number '{}'", value),
    })?;
    if parsed < min || parsed > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} out of range [{}, {}]", parsed, min, max),
        });
    }
    Ok(parsed)
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables\n\n");

    let mut entry = |name: &str, description: &str| {
        docs.push_str(&format!("- `{}`: {}\n", name, description));
    };

    entry(core::LogLevel::NAME, core::LogLevel::DESCRIPTION);
    entry(translation::Endpoint::NAME, translation::Endpoint::DESCRIPTION);
    entry(translation::AccessToken::NAME, translation::AccessToken::DESCRIPTION);
    entry(translation::ApiKey::NAME, translation::ApiKey::DESCRIPTION);
    entry(translation::SourceLanguage::NAME, translation::SourceLanguage::DESCRIPTION);
    entry(translation::BatchSize::NAME, translation::BatchSize::DESCRIPTION);
    entry(translation::Debounce::NAME, translation::Debounce::DESCRIPTION);
    entry(translation::RequestTimeout::NAME, translation::RequestTimeout::DESCRIPTION);
    entry(cache::MaxKeys::NAME, cache::MaxKeys::DESCRIPTION);
    entry(cache::Path::NAME, cache::Path::DESCRIPTION);
    entry(cache::Disabled::NAME, cache::Disabled::DESCRIPTION);
    entry(gateway::Url::NAME, gateway::Url::DESCRIPTION);
    entry(gateway::Key::NAME, gateway::Key::DESCRIPTION);
    entry(gateway::Model::NAME, gateway::Model::DESCRIPTION);
    entry(web::BindAddress::NAME, web::BindAddress::DESCRIPTION);
    entry(web::Port::NAME, web::Port::DESCRIPTION);

    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(core::LogLevel::parse("DEBUG").unwrap(), "debug");
        assert!(core::LogLevel::parse("verbose").is_err());
    }

    #[test]
    fn test_boolean_parsing() {
        assert!(parse_bool("YES", "X").unwrap());
        assert!(parse_bool("on", "X").unwrap());
        assert!(!parse_bool("0", "X").unwrap());
        assert!(parse_bool("maybe", "X").is_err());
    }

    #[test]
    fn test_url_validation() {
        assert!(translation::Endpoint::parse("http://localhost:54321/functions/v1/translate").is_ok());
        assert!(translation::Endpoint::parse("ftp://example.com").is_err());
        assert!(translation::Endpoint::parse("not-a-url").is_err());
    }

    #[test]
    fn test_numeric_validation() {
        assert_eq!(translation::BatchSize::parse("40").unwrap(), 40);
        assert!(translation::BatchSize::parse("0").is_err());
        assert_eq!(
            translation::Debounce::parse("250").unwrap(),
            Duration::from_millis(250)
        );
        assert!(web::Port::parse("0").is_err());
    }

    #[test]
    fn test_source_language_normalized() {
        assert_eq!(translation::SourceLanguage::parse(" RU ").unwrap(), "ru");
        assert!(translation::SourceLanguage::parse("ru_RU").is_err());
    }

    #[test]
    fn test_docs_list_every_variable() {
        let docs = generate_env_docs();
        assert!(docs.contains("MINDWEAVER_TRANSLATE_ENDPOINT"));
        assert!(docs.contains("MINDWEAVER_GATEWAY_KEY"));
    }
}
