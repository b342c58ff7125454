//! # MindWeaver UI 翻译库
//!
//! 为 MindWeaver 聊天界面提供实时 DOM 本地化：扫描页面中可翻译的文本与属性，
//! 批量调用远程翻译函数，缓存结果并写回 DOM；切回原生语言时恢复原文。
//!
//! ## 模块组织
//!
//! - `parsers` - HTML 解析、可观察文档、序列化
//! - `translation` - 翻译引擎、扫描管道、缓存存储、配置
//! - `settings` - 用户语言偏好与“设置已变更”信号
//! - `env` - 类型安全的环境变量
//! - `web` - 翻译网关（服务端，`web` 特性）

pub mod env;
pub mod parsers;
pub mod settings;
pub mod translation;
pub mod web;

// Re-export commonly used items for convenience
pub use parsers::html::{html_to_dom, serialize_document, ObservedDocument};
pub use settings::{SettingsEvents, UserSettings};
pub use translation::{
    start_auto_translate_ui, stop_auto_translate_ui, TranslationEngine, TranslationError,
    TranslationResult,
};
