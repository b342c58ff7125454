//! 翻译引擎核心实现
//!
//! 负责把整个文档的界面文字翻译成目标语言，或恢复为原始文字。
//!
//! ## 工作流程
//! 1. 规范化目标语言（小写），记为“最近请求的语言”
//! 2. 目标语言以原生语言开头时执行恢复，不发起任何远程调用
//! 3. 读取缓存，扫描 `body` 得到翻译目标
//! 4. 按 (语言, 原文) 去重分组，计算缓存未命中的键
//! 5. 未命中的键按批次（默认 40 个）依次调用远程翻译；失败的批次以原文作为译文
//! 6. 每批结束后写入并持久化缓存
//! 7. 所有批次结束后，把缓存中的译文写回每个目标；值未变化时不写
//!
//! ## 取消
//! 每批开始前，以及最后一次等待结束后、写回 DOM 之前，都会比较“最近请求的语言”。
//! 被新调用取代的旧调用立即返回：已完成批次写入的缓存条目保留（按内容寻址，无害），
//! 但它不会再写 DOM。
//!
//! ## 使用示例
//! ```rust,ignore
//! let engine = TranslationEngine::new(document, store, translator, EngineConfig::default());
//! engine.translate_ui("es").await;
//! engine.translate_ui("en").await; // 原生语言：恢复
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use super::client::{report_failure, BatchTranslator};
use crate::parsers::html::ObservedDocument;
use crate::translation::config::{constants, TranslationConfig};
use crate::translation::pipeline::{batches, OriginalLedger, TargetGroups, TargetScanner, TranslationTarget};
use crate::translation::storage::{CacheMap, KeyValueStore, TranslationCache};

/// 引擎配置
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// 原生语言前缀（小写）；请求以它开头的语言时执行恢复
    pub source_language: String,
    /// 每次远程调用最多携带的键数
    pub batch_size: usize,
    /// 持久化缓存的键上限
    pub max_cache_keys: usize,
    /// 超过上限时保留的比例
    pub cache_retain_ratio: f64,
    /// 实时观察的合并窗口
    pub debounce: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            source_language: constants::DEFAULT_SOURCE_LANGUAGE.to_string(),
            batch_size: constants::MAX_BATCH,
            max_cache_keys: constants::MAX_CACHE_KEYS,
            cache_retain_ratio: constants::CACHE_RETAIN_RATIO,
            debounce: constants::DEBOUNCE,
        }
    }
}

impl From<&TranslationConfig> for EngineConfig {
    fn from(config: &TranslationConfig) -> Self {
        Self {
            source_language: config.source_language.trim().to_lowercase(),
            batch_size: config.batch_size,
            max_cache_keys: config.max_cache_keys,
            cache_retain_ratio: config.cache_retain_ratio,
            debounce: config.debounce(),
        }
    }
}

impl EngineConfig {
    pub fn with_source_language(mut self, language: &str) -> Self {
        self.source_language = language.trim().to_lowercase();
        self
    }
}

/// 引擎运行统计
#[derive(Debug, Default)]
pub struct EngineStats {
    passes: Cell<u64>,
    restores: Cell<u64>,
    remote_batches: Cell<u64>,
    failed_batches: Cell<u64>,
    cache_hits: Cell<u64>,
    cache_misses: Cell<u64>,
    dom_writes: Cell<u64>,
    cancelled_passes: Cell<u64>,
}

/// 统计快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStatsSnapshot {
    pub passes: u64,
    pub restores: u64,
    pub remote_batches: u64,
    pub failed_batches: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub dom_writes: u64,
    pub cancelled_passes: u64,
}

impl EngineStats {
    fn bump(counter: &Cell<u64>, by: u64) {
        counter.set(counter.get() + by);
    }

    pub fn snapshot(&self) -> EngineStatsSnapshot {
        EngineStatsSnapshot {
            passes: self.passes.get(),
            restores: self.restores.get(),
            remote_batches: self.remote_batches.get(),
            failed_batches: self.failed_batches.get(),
            cache_hits: self.cache_hits.get(),
            cache_misses: self.cache_misses.get(),
            dom_writes: self.dom_writes.get(),
            cancelled_passes: self.cancelled_passes.get(),
        }
    }
}

struct EngineInner {
    document: ObservedDocument,
    translator: Rc<dyn BatchTranslator>,
    cache: TranslationCache,
    ledger: RefCell<OriginalLedger>,
    scanner: TargetScanner,
    last_language: RefCell<String>,
    config: EngineConfig,
    stats: EngineStats,
}

/// 翻译引擎
///
/// 克隆代价很低，所有克隆共享同一份账本、缓存和“最近请求的语言”。
/// 引擎不是 `Send`，应在单线程运行时（`LocalSet`）中使用。
#[derive(Clone)]
pub struct TranslationEngine {
    inner: Rc<EngineInner>,
}

impl TranslationEngine {
    pub fn new(
        document: ObservedDocument,
        store: Rc<dyn KeyValueStore>,
        translator: Rc<dyn BatchTranslator>,
        config: EngineConfig,
    ) -> Self {
        let cache = TranslationCache::with_limits(store, config.max_cache_keys, config.cache_retain_ratio);

        Self {
            inner: Rc::new(EngineInner {
                document,
                translator,
                cache,
                ledger: RefCell::new(OriginalLedger::new()),
                scanner: TargetScanner::new(),
                last_language: RefCell::new(String::new()),
                config,
                stats: EngineStats::default(),
            }),
        }
    }

    pub fn document(&self) -> &ObservedDocument {
        &self.inner.document
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn stats(&self) -> EngineStatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// 最近一次请求的（规范化后的）语言
    pub fn last_requested_language(&self) -> String {
        self.inner.last_language.borrow().clone()
    }

    /// 账本中的条目数
    pub fn ledger_len(&self) -> usize {
        self.inner.ledger.borrow().len()
    }

    /// 将界面翻译为 `target_language`
    ///
    /// 空语言不做任何事。任何失败都不会向调用方传播，最坏结果是界面保持未翻译。
    pub async fn translate_ui(&self, target_language: &str) {
        if target_language.is_empty() {
            return;
        }

        let lang = target_language.to_lowercase();
        *self.inner.last_language.borrow_mut() = lang.clone();
        EngineStats::bump(&self.inner.stats.passes, 1);

        if lang.starts_with(&self.inner.config.source_language) {
            tracing::debug!("目标语言 {} 为原生语言，恢复原文", lang);
            self.restore_original_ui();
            return;
        }

        let mut cache = self.inner.cache.load();
        let targets = {
            let body = self.inner.document.body();
            let mut ledger = self.inner.ledger.borrow_mut();
            self.inner.scanner.scan(&body, &mut ledger)
        };

        if targets.is_empty() {
            tracing::debug!("没有可翻译的目标");
            return;
        }

        let groups = TargetGroups::group(&lang, targets);
        let missing = groups.missing_keys(&cache);
        EngineStats::bump(&self.inner.stats.cache_hits, (groups.len() - missing.len()) as u64);
        EngineStats::bump(&self.inner.stats.cache_misses, missing.len() as u64);

        tracing::debug!(
            "翻译 {}: {} 个目标，{} 个唯一文本，{} 个未命中缓存",
            lang,
            groups.target_count(),
            groups.len(),
            missing.len()
        );

        for batch in batches(&missing, self.inner.config.batch_size) {
            if self.is_superseded(&lang) {
                self.note_cancelled(&lang);
                return;
            }

            let originals: Vec<String> = batch.iter().map(|key| key.text().to_string()).collect();
            EngineStats::bump(&self.inner.stats.remote_batches, 1);

            let translated = match self.inner.translator.translate_batch(&lang, &originals).await {
                Ok(translated) => translated,
                Err(e) => {
                    report_failure(&e);
                    EngineStats::bump(&self.inner.stats.failed_batches, 1);
                    originals.clone()
                }
            };

            for (idx, key) in batch.iter().enumerate() {
                let value = translated
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(|| originals[idx].clone());
                cache.insert(key.as_str().to_string(), value);
            }

            self.inner.cache.save(&cache);
        }

        if !missing.is_empty() && self.is_superseded(&lang) {
            self.note_cancelled(&lang);
            return;
        }

        self.apply(&groups, &cache);
    }

    /// 把所有仍存活的被跟踪节点和属性恢复为原始值
    pub fn restore_original_ui(&self) {
        let (texts, attrs) = {
            let ledger = self.inner.ledger.borrow();
            (ledger.tracked_texts(), ledger.tracked_attrs())
        };

        let document = &self.inner.document;
        let mut writes = 0u64;

        for (node, original) in texts {
            if document.set_text(&node, &original) {
                writes += 1;
            }
        }
        for (element, name, original) in attrs {
            if document.set_attribute(&element, &name, &original) {
                writes += 1;
            }
        }

        EngineStats::bump(&self.inner.stats.restores, 1);
        EngineStats::bump(&self.inner.stats.dom_writes, writes);
        tracing::debug!("恢复原文，写入 {} 处", writes);
    }

    fn apply(&self, groups: &TargetGroups, cache: &CacheMap) {
        let document = &self.inner.document;
        let mut writes = 0u64;

        for (key, targets) in groups.iter() {
            let Some(translated) = cache.get(key.as_str()).filter(|value| !value.is_empty()) else {
                continue;
            };

            for target in targets {
                let written = match target {
                    TranslationTarget::Text { node, .. } => document.set_text(node, translated),
                    TranslationTarget::Attribute { element, name, .. } => {
                        document.set_attribute(element, name, translated)
                    }
                };
                if written {
                    writes += 1;
                }
            }
        }

        EngineStats::bump(&self.inner.stats.dom_writes, writes);
        tracing::debug!("写入 {} 处译文", writes);
    }

    fn is_superseded(&self, lang: &str) -> bool {
        *self.inner.last_language.borrow() != lang
    }

    fn note_cancelled(&self, lang: &str) {
        EngineStats::bump(&self.inner.stats.cancelled_passes, 1);
        tracing::info!(
            "翻译 {} 已被新的请求 {} 取代",
            lang,
            self.inner.last_language.borrow()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::{find_nodes, get_node_attr, get_text};
    use crate::translation::error::{TranslationError, TranslationResult};
    use crate::translation::storage::MemoryStore;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// 按词典翻译，记录每次请求
    struct DictionaryTranslator {
        words: HashMap<&'static str, &'static str>,
        calls: RefCell<Vec<Vec<String>>>,
    }

    #[async_trait(?Send)]
    impl BatchTranslator for DictionaryTranslator {
        async fn translate_batch(&self, _lang: &str, texts: &[String]) -> TranslationResult<Vec<String>> {
            self.calls.borrow_mut().push(texts.to_vec());
            Ok(texts
                .iter()
                .map(|t| self.words.get(t.as_str()).map(|w| w.to_string()).unwrap_or_else(|| t.clone()))
                .collect())
        }
    }

    struct FailingTranslator;

    #[async_trait(?Send)]
    impl BatchTranslator for FailingTranslator {
        async fn translate_batch(&self, _lang: &str, _texts: &[String]) -> TranslationResult<Vec<String>> {
            Err(TranslationError::Service {
                status: 404,
                message: "Not Found".to_string(),
            })
        }
    }

    fn engine_with(html: &str, translator: Rc<dyn BatchTranslator>) -> (TranslationEngine, Rc<MemoryStore>) {
        let store = Rc::new(MemoryStore::new());
        let engine = TranslationEngine::new(
            ObservedDocument::from_html(html),
            store.clone(),
            translator,
            EngineConfig::default(),
        );
        (engine, store)
    }

    fn dictionary() -> Rc<DictionaryTranslator> {
        Rc::new(DictionaryTranslator {
            words: HashMap::from([("Hello world", "Hola mundo"), ("Search...", "Buscar...")]),
            calls: RefCell::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_translate_and_restore() {
        let translator = dictionary();
        let (engine, _store) = engine_with(
            r#"<p>Hello world</p><input placeholder="Search...">"#,
            translator.clone(),
        );
        let doc = engine.document().clone();
        let p = find_nodes(&doc.document(), &["p"]).remove(0);
        let input = find_nodes(&doc.document(), &["input"]).remove(0);
        let text = p.children.borrow()[0].clone();

        engine.translate_ui("ES").await;
        assert_eq!(engine.last_requested_language(), "es");
        assert_eq!(get_text(&text).as_deref(), Some("Hola mundo"));
        assert_eq!(get_node_attr(&input, "placeholder").as_deref(), Some("Buscar..."));

        engine.translate_ui("en-US").await;
        assert_eq!(get_text(&text).as_deref(), Some("Hello world"));
        assert_eq!(get_node_attr(&input, "placeholder").as_deref(), Some("Search..."));
        assert_eq!(translator.calls.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_second_pass_uses_cache_and_writes_nothing() {
        let translator = dictionary();
        let (engine, _store) = engine_with("<p>Hello world</p>", translator.clone());

        engine.translate_ui("es").await;
        let first = engine.stats();
        engine.translate_ui("es").await;
        let second = engine.stats();

        assert_eq!(translator.calls.borrow().len(), 1);
        assert_eq!(second.dom_writes, first.dom_writes);
        assert_eq!(second.cache_hits, 1);
    }

    #[tokio::test]
    async fn test_failed_batch_keeps_originals() {
        let (engine, store) = engine_with("<p>Hello world</p>", Rc::new(FailingTranslator));

        engine.translate_ui("de").await;

        let stats = engine.stats();
        assert_eq!(stats.failed_batches, 1);
        assert_eq!(stats.dom_writes, 0);

        let cache = TranslationCache::new(store);
        assert_eq!(cache.load().get("de|Hello world"), Some("Hello world"));
    }

    #[tokio::test]
    async fn test_empty_language_is_ignored() {
        let translator = dictionary();
        let (engine, _store) = engine_with("<p>Hello world</p>", translator.clone());

        engine.translate_ui("").await;
        assert_eq!(engine.stats().passes, 0);
        assert_eq!(engine.ledger_len(), 0);
    }

    #[test]
    fn test_config_from_translation_config() {
        let mut config = TranslationConfig::default();
        config.source_language = " RU ".to_string();
        config.batch_size = 10;

        let engine_config = EngineConfig::from(&config);
        assert_eq!(engine_config.source_language, "ru");
        assert_eq!(engine_config.batch_size, 10);
        assert_eq!(engine_config.debounce, Duration::from_millis(250));
    }
}
