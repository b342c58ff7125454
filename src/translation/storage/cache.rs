//! 翻译缓存模块
//!
//! 按内容（而非 DOM 节点）寻址的持久化缓存：键为 `"{语言}|{原文}"`，值为译文。
//! 整个映射以一个 JSON 对象保存在固定的存储键下，对象中键的顺序即插入顺序。

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::store::KeyValueStore;
use crate::translation::config::constants;

// ============================================================================
// 缓存键
// ============================================================================

/// 缓存键：规范化的目标语言 + 原文
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    rendered: String,
    language_len: usize,
}

impl CacheKey {
    pub fn new(language: &str, text: &str) -> Self {
        Self {
            rendered: format!("{}|{}", language, text),
            language_len: language.len(),
        }
    }

    pub fn language(&self) -> &str {
        &self.rendered[..self.language_len]
    }

    /// 原文部分
    pub fn text(&self) -> &str {
        &self.rendered[self.language_len + 1..]
    }

    /// 存储中使用的字符串形式
    pub fn as_str(&self) -> &str {
        &self.rendered
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

// ============================================================================
// 有序映射
// ============================================================================

/// 保持插入顺序的字符串映射
///
/// 覆盖已有键只更新值，不改变其位置。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheMap {
    order: Vec<String>,
    values: HashMap<String, String>,
}

impl CacheMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn insert(&mut self, key: String, value: String) {
        if let Some(existing) = self.values.get_mut(&key) {
            *existing = value;
            return;
        }
        self.order.push(key.clone());
        self.values.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 按插入顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order
            .iter()
            .filter_map(|key| self.values.get(key).map(|value| (key.as_str(), value.as_str())))
    }

    /// 最近插入的 `count` 个条目组成的新映射
    pub fn newest(&self, count: usize) -> CacheMap {
        let skip = self.order.len().saturating_sub(count);
        let mut next = CacheMap::new();
        for key in &self.order[skip..] {
            if let Some(value) = self.values.get(key) {
                next.insert(key.clone(), value.clone());
            }
        }
        next
    }
}

impl Serialize for CacheMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct CacheMapVisitor;

impl<'de> Visitor<'de> for CacheMapVisitor {
    type Value = CacheMap;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON object of translations")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<CacheMap, A::Error> {
        let mut map = CacheMap::new();
        while let Some((key, value)) = access.next_entry::<String, serde_json::Value>()? {
            // 非字符串的值直接丢弃
            if let serde_json::Value::String(value) = value {
                map.insert(key, value);
            }
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for CacheMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CacheMapVisitor)
    }
}

// ============================================================================
// 持久化缓存
// ============================================================================

/// 翻译缓存
///
/// `load` / `save` 的任何失败都只记录 `debug` 日志：
/// 缓存失效时翻译仍可在本次会话内进行。
#[derive(Clone)]
pub struct TranslationCache {
    store: Rc<dyn KeyValueStore>,
    max_keys: usize,
    retain_ratio: f64,
}

impl TranslationCache {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self::with_limits(store, constants::MAX_CACHE_KEYS, constants::CACHE_RETAIN_RATIO)
    }

    pub fn with_limits(store: Rc<dyn KeyValueStore>, max_keys: usize, retain_ratio: f64) -> Self {
        Self {
            store,
            max_keys,
            retain_ratio,
        }
    }

    /// 超出上限时保留的条目数
    pub fn retained_len(&self) -> usize {
        (self.max_keys as f64 * self.retain_ratio).floor() as usize
    }

    /// 读取缓存；缺失或损坏时返回空映射
    pub fn load(&self) -> CacheMap {
        let raw = match self.store.get_item(constants::CACHE_KEY) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return CacheMap::new(),
            Err(e) => {
                tracing::debug!("读取翻译缓存失败: {}", e);
                return CacheMap::new();
            }
        };

        match serde_json::from_str::<CacheMap>(&raw) {
            Ok(map) => map,
            Err(e) => {
                tracing::debug!("翻译缓存内容无法解析，忽略: {}", e);
                CacheMap::new()
            }
        }
    }

    /// 保存缓存
    ///
    /// 键数超过上限时只持久化最近插入的一部分；传入的映射本身不被修改。
    pub fn save(&self, map: &CacheMap) {
        let result = if map.len() > self.max_keys {
            let trimmed = map.newest(self.retained_len());
            tracing::debug!("翻译缓存超过 {} 个键，保留最近 {} 个", self.max_keys, trimmed.len());
            self.persist(&trimmed)
        } else {
            self.persist(map)
        };

        if let Err(e) = result {
            tracing::debug!("保存翻译缓存失败: {}", e);
        }
    }

    fn persist(&self, map: &CacheMap) -> crate::translation::error::TranslationResult<()> {
        let raw = serde_json::to_string(map)?;
        self.store.set_item(constants::CACHE_KEY, &raw)
    }
}
