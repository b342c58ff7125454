//! 翻译管道模块
//!
//! 扫描 DOM 得到翻译目标，记录原始值，按内容去重并切分批次

pub mod batch;
pub mod collector;
pub mod filters;
pub mod ledger;

// 重新导出主要类型
pub use batch::{batches, TargetGroups};
pub use collector::{TargetScanner, TranslationTarget};
pub use filters::{is_attr_blocked, is_text_blocked, should_skip_text};
pub use ledger::OriginalLedger;
