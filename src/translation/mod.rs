//! 翻译模块
//!
//! 采用清晰的模块化架构：
//! - **core**: 远程翻译客户端、翻译引擎、实时观察器
//! - **pipeline**: 目标扫描、原始值账本、去重与批次
//! - **storage**: 翻译缓存和键值存储
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use mindweaver::translation::{EngineConfig, HttpBatchTranslator, MemoryStore, TranslationEngine};
//! use mindweaver::ObservedDocument;
//!
//! # async fn example() {
//! let document = ObservedDocument::from_html("<p>Hello world</p>");
//! let engine = TranslationEngine::new(
//!     document,
//!     Rc::new(MemoryStore::new()),
//!     Rc::new(HttpBatchTranslator::new("http://localhost:54321/functions/v1/translate")),
//!     EngineConfig::default(),
//! );
//! engine.translate_ui("es").await;
//! # }
//! ```

// ============================================================================
// 子模块声明
// ============================================================================

/// 配置管理模块
///
/// 提供翻译端点、批次、缓存上限等配置，支持配置文件和环境变量
pub mod config;

/// 核心模块 - 引擎、客户端、观察器
pub mod core;

/// 错误处理模块 - 统一的错误类型和处理机制
pub mod error;

/// 文本处理管道模块
///
/// 负责从DOM中扫描翻译目标、记录原始值、按内容去重并切分批次
pub mod pipeline;

/// 存储管理模块 - 翻译缓存和持久化存储
pub mod storage;

// ============================================================================
// 重新导出
// ============================================================================

pub use config::{load_translation_config, ConfigManager, TranslationConfig};
pub use core::{
    auto_translate_running, reconcile_translations, start_auto_translate_ui, stop_auto_translate_ui,
    BatchTranslator, EngineConfig, EngineStatsSnapshot, HttpBatchTranslator, LiveWatcher,
    TranslationEngine,
};
pub use error::{TranslationError, TranslationResult};
pub use pipeline::{OriginalLedger, TargetScanner, TranslationTarget};
pub use storage::{CacheKey, CacheMap, KeyValueStore, MemoryStore, RedbStore, TranslationCache};
