//! 翻译批次分组
//!
//! 相同 (语言, 原文) 的目标合并为一个翻译单元：无论在 DOM 中出现多少次，
//! 远程调用里只出现一次，译文也只写入缓存一次。
//!
//! ```text
//! targets ──group──▶ TargetGroups ──missing_keys(cache)──▶ [CacheKey]
//!                                                           │
//!                                                   batches(keys, 40)
//!                                                           ▼
//!                                                  [[CacheKey; ≤40], ...]
//! ```

use std::collections::HashMap;

use super::collector::TranslationTarget;
use crate::translation::storage::{CacheKey, CacheMap};

/// 按缓存键分组的翻译目标，组的顺序为键第一次出现的顺序
#[derive(Debug, Default)]
pub struct TargetGroups {
    order: Vec<CacheKey>,
    groups: HashMap<CacheKey, Vec<TranslationTarget>>,
}

impl TargetGroups {
    /// 以 `language`（已规范化）为前缀对目标分组
    pub fn group(language: &str, targets: Vec<TranslationTarget>) -> Self {
        let mut grouped = Self::default();

        for target in targets {
            let key = CacheKey::new(language, target.original());
            match grouped.groups.get_mut(&key) {
                Some(list) => list.push(target),
                None => {
                    grouped.order.push(key.clone());
                    grouped.groups.insert(key, vec![target]);
                }
            }
        }

        grouped
    }

    /// 去重后的缓存键
    pub fn keys(&self) -> &[CacheKey] {
        &self.order
    }

    /// 共享同一缓存键的全部目标
    pub fn targets(&self, key: &CacheKey) -> &[TranslationTarget] {
        self.groups.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 按顺序遍历 (键, 目标列表)
    pub fn iter(&self) -> impl Iterator<Item = (&CacheKey, &[TranslationTarget])> {
        self.order.iter().map(move |key| (key, self.targets(key)))
    }

    /// 缓存中尚不存在的键，保持分组顺序
    pub fn missing_keys(&self, cache: &CacheMap) -> Vec<CacheKey> {
        self.order
            .iter()
            .filter(|key| !cache.contains_key(key.as_str()))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 目标总数（含重复）
    pub fn target_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// 将键切分为不超过 `size` 的批次
pub fn batches(keys: &[CacheKey], size: usize) -> std::slice::Chunks<'_, CacheKey> {
    keys.chunks(size.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::{document_body, html_to_dom};
    use crate::translation::pipeline::{OriginalLedger, TargetScanner};

    fn groups_for(html: &str, language: &str) -> TargetGroups {
        let dom = html_to_dom(html.as_bytes(), "utf-8".to_string());
        let mut ledger = OriginalLedger::new();
        let targets = TargetScanner::new().scan(&document_body(&dom), &mut ledger);
        TargetGroups::group(language, targets)
    }

    #[test]
    fn test_identical_texts_share_one_key() {
        let groups = groups_for(
            r#"<p>Save</p><button>Save</button><input title="Save"><p>Cancel</p>"#,
            "es",
        );

        assert_eq!(groups.len(), 2);
        assert_eq!(groups.target_count(), 4);
        assert_eq!(groups.keys()[0].as_str(), "es|Save");
        assert_eq!(groups.targets(&groups.keys()[0]).len(), 3);
    }

    #[test]
    fn test_missing_keys_respects_cache() {
        let groups = groups_for("<p>One</p><p>Two</p><p>Three</p>", "fr");
        let mut cache = CacheMap::new();
        cache.insert("fr|Two".to_string(), "Deux".to_string());
        cache.insert("de|One".to_string(), "Eins".to_string());

        let missing = groups.missing_keys(&cache);
        let texts: Vec<&str> = missing.iter().map(CacheKey::text).collect();
        assert_eq!(texts, vec!["One", "Three"]);
    }

    #[test]
    fn test_batches_are_bounded() {
        let keys: Vec<CacheKey> = (0..95).map(|i| CacheKey::new("es", &format!("t{}", i))).collect();
        let sizes: Vec<usize> = batches(&keys, 40).map(<[CacheKey]>::len).collect();
        assert_eq!(sizes, vec![40, 40, 15]);
        assert_eq!(batches(&[], 40).count(), 0);
    }
}
