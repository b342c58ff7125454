//! 翻译模块统一错误处理
//!
//! 本子系统的错误都不是致命的：调用方最多看到未翻译或部分翻译的界面。
//! 错误类型主要用于日志分级和诊断。

use std::fmt;

use thiserror::Error;

/// 翻译错误类型
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 网络错误
    #[error("网络错误: {0}")]
    Network(String),

    /// 远程翻译服务返回非成功状态
    #[error("翻译服务错误 (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(String),

    /// 持久化存储错误
    #[error("存储错误: {0}")]
    Storage(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

impl TranslationError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::Network(_) => true,
            TranslationError::Service { status, .. } => *status >= 500 || *status == 429,
            TranslationError::Storage(_) => true,
            TranslationError::Config(_)
            | TranslationError::Parse(_)
            | TranslationError::Serialization(_)
            | TranslationError::Internal(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::Config(_) => ErrorSeverity::Critical,
            TranslationError::Network(_) => ErrorSeverity::Warning,
            TranslationError::Service { .. } => ErrorSeverity::Error,
            TranslationError::Parse(_) => ErrorSeverity::Error,
            TranslationError::Serialization(_) => ErrorSeverity::Error,
            TranslationError::Storage(_) => ErrorSeverity::Info,
            TranslationError::Internal(_) => ErrorSeverity::Critical,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::Config(_) => ErrorCategory::Configuration,
            TranslationError::Network(_) => ErrorCategory::Network,
            TranslationError::Service { .. } => ErrorCategory::Service,
            TranslationError::Parse(_) => ErrorCategory::Parsing,
            TranslationError::Serialization(_) => ErrorCategory::Serialization,
            TranslationError::Storage(_) => ErrorCategory::Storage,
            TranslationError::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// 针对常见失败原因给出排查提示
    pub fn hint(&self) -> &'static str {
        match self {
            TranslationError::Service { status: 401, .. } | TranslationError::Service { status: 403, .. } => {
                "未登录或翻译函数要求 JWT：检查访问令牌"
            }
            TranslationError::Service { status: 404, .. } => "翻译函数 'translate' 未部署",
            TranslationError::Service { .. } => "网关密钥缺失或上游模型不可用：检查函数日志",
            TranslationError::Network(_) => "网络不可达或被 CORS 拦截",
            TranslationError::Parse(_) => "翻译函数返回了无法解析的响应",
            _ => "检查翻译配置",
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(self, context: T) -> Self {
        let new_msg = |msg: String| format!("{} (上下文: {})", msg, context);

        match self {
            TranslationError::Config(msg) => TranslationError::Config(new_msg(msg)),
            TranslationError::Network(msg) => TranslationError::Network(new_msg(msg)),
            TranslationError::Service { status, message } => TranslationError::Service {
                status,
                message: new_msg(message),
            },
            TranslationError::Parse(msg) => TranslationError::Parse(new_msg(msg)),
            TranslationError::Serialization(msg) => TranslationError::Serialization(new_msg(msg)),
            TranslationError::Storage(msg) => TranslationError::Storage(new_msg(msg)),
            TranslationError::Internal(msg) => TranslationError::Internal(new_msg(msg)),
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Service,
    Parsing,
    Serialization,
    Storage,
    Internal,
}

impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::Storage(format!("IO错误: {}", error))
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::Serialization(format!("JSON序列化错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::Config(format!("TOML解析错误: {}", error))
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            TranslationError::Parse(format!("响应解码失败: {}", error))
        } else if let Some(status) = error.status() {
            TranslationError::Service {
                status: status.as_u16(),
                message: error.to_string(),
            }
        } else {
            TranslationError::Network(error.to_string())
        }
    }
}

impl From<redb::Error> for TranslationError {
    fn from(error: redb::Error) -> Self {
        TranslationError::Storage(format!("redb错误: {}", error))
    }
}

impl From<redb::DatabaseError> for TranslationError {
    fn from(error: redb::DatabaseError) -> Self {
        TranslationError::Storage(format!("redb数据库错误: {}", error))
    }
}

impl From<redb::TransactionError> for TranslationError {
    fn from(error: redb::TransactionError) -> Self {
        TranslationError::Storage(format!("redb事务错误: {}", error))
    }
}

impl From<redb::TableError> for TranslationError {
    fn from(error: redb::TableError) -> Self {
        TranslationError::Storage(format!("redb表错误: {}", error))
    }
}

impl From<redb::StorageError> for TranslationError {
    fn from(error: redb::StorageError) -> Self {
        TranslationError::Storage(format!("redb存储错误: {}", error))
    }
}

impl From<redb::CommitError> for TranslationError {
    fn from(error: redb::CommitError) -> Self {
        TranslationError::Storage(format!("redb提交错误: {}", error))
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::Config(msg.to_string())
    }
}
