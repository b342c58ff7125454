//! 存储模块
//!
//! 提供翻译缓存和底层键值存储。

pub mod cache;
pub mod store;

pub use cache::{CacheKey, CacheMap, TranslationCache};
pub use store::{KeyValueStore, MemoryStore, RedbStore};
