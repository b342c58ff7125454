//! 持久化键值存储
//!
//! 对应浏览器 `localStorage` 的 `getItem` / `setItem` 接口。

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use redb::{Database, TableDefinition};

use crate::translation::error::{TranslationError, TranslationResult};

const KV_TABLE: TableDefinition<&str, &str> = TableDefinition::new("kv");

/// 字符串键值存储
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> TranslationResult<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> TranslationResult<()>;
}

/// 进程内存储，用于测试和不需要持久化的会话
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> TranslationResult<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> TranslationResult<()> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// 基于 redb 的磁盘存储
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// 打开（或创建）数据库文件，父目录不存在时一并创建
    pub fn open<P: AsRef<Path>>(path: P) -> TranslationResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::create(path)
            .map_err(|e| TranslationError::from(e).with_context(path.display()))?;

        let txn = db.begin_write()?;
        {
            txn.open_table(KV_TABLE)?;
        }
        txn.commit()?;

        tracing::debug!("打开缓存数据库: {}", path.display());
        Ok(Self { db })
    }
}

impl KeyValueStore for RedbStore {
    fn get_item(&self, key: &str) -> TranslationResult<Option<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(KV_TABLE)?;
        let value = table.get(key)?.map(|guard| guard.value().to_string());
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> TranslationResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(KV_TABLE)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(store.get_item("k").unwrap().is_none());

        store.set_item("k", "v1").unwrap();
        store.set_item("k", "v2").unwrap();
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_redb_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.redb");

        {
            let store = RedbStore::open(&path).unwrap();
            assert!(store.get_item("mw_language").unwrap().is_none());
            store.set_item("mw_language", "es").unwrap();
        }

        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.get_item("mw_language").unwrap().as_deref(), Some("es"));
    }
}
