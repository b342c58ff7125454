//! 翻译系统核心模块
//!
//! - **客户端** (`client.rs`): 远程批量翻译接口及其 HTTP 实现
//! - **引擎** (`engine.rs`): 扫描 → 去重 → 批量翻译 → 写缓存 → 写回 DOM，以及恢复原文
//! - **观察器** (`watcher.rs`): 监听文档和设置变更，合并后重新运行引擎
//!
//! ```text
//! LiveWatcher (watcher.rs)
//!     └── TranslationEngine (engine.rs)
//!             ├── TargetScanner + OriginalLedger (pipeline/)
//!             ├── TranslationCache (storage/cache.rs)
//!             └── BatchTranslator (client.rs)
//! ```

pub mod client;
pub mod engine;
pub mod watcher;

pub use client::{reconcile_translations, report_failure, BatchTranslator, HttpBatchTranslator};
pub use engine::{EngineConfig, EngineStats, EngineStatsSnapshot, TranslationEngine};
pub use watcher::{auto_translate_running, start_auto_translate_ui, stop_auto_translate_ui, LiveWatcher};
