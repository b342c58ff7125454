// 集成测试公共模块
//
// 提供测试页面、桩翻译器和DOM辅助函数

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use markup5ever_rcdom::Handle;

use mindweaver::parsers::html::{find_nodes, get_node_attr, get_text};
use mindweaver::translation::{
    BatchTranslator, EngineConfig, KeyValueStore, MemoryStore, TranslationEngine, TranslationError,
    TranslationResult,
};
use mindweaver::ObservedDocument;

/// 端到端场景页面
pub const LANDING_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>MindWeaver</title></head>
<body>
  <header><h1>Welcome back</h1><nav aria-label="Main navigation"><a href="/chat">Open chat</a></nav></header>
  <main>
    <p>Hello world</p>
    <input placeholder="Search...">
    <button title="Send message">Send</button>
    <p>Hello world</p>
    <span>2024</span>
    <a href="https://example.com">https://example.com</a>
    <pre>cargo run --release</pre>
    <code>fn main() {}</code>
    <div data-no-translate><p>Private transcript line</p><input placeholder="Type here"></div>
  </main>
</body>
</html>"#;

/// 单次远程调用记录
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub language: String,
    pub texts: Vec<String>,
}

/// 按词典翻译的桩翻译器
///
/// 词典中没有的文本译为 `"[{lang}] {text}"`；可以为每种语言设置响应延迟。
#[derive(Default)]
pub struct StubTranslator {
    dictionary: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl StubTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, source: &str, translated: &str) -> Self {
        self.dictionary.insert(source.to_string(), translated.to_string());
        self
    }

    pub fn with_delay(mut self, language: &str, delay: Duration) -> Self {
        self.delays.insert(language.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// 所有调用里发送过的文本
    pub fn sent_texts(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .flat_map(|call| call.texts.clone())
            .collect()
    }
}

#[async_trait(?Send)]
impl BatchTranslator for StubTranslator {
    async fn translate_batch(&self, target_language: &str, texts: &[String]) -> TranslationResult<Vec<String>> {
        self.calls.borrow_mut().push(RecordedCall {
            language: target_language.to_string(),
            texts: texts.to_vec(),
        });

        if let Some(delay) = self.delays.get(target_language) {
            tokio::time::sleep(*delay).await;
        }

        Ok(texts
            .iter()
            .map(|text| {
                self.dictionary
                    .get(text)
                    .cloned()
                    .unwrap_or_else(|| format!("[{}] {}", target_language, text))
            })
            .collect())
    }
}

/// 总是失败的翻译器
#[derive(Default)]
pub struct FailingTranslator {
    pub attempts: RefCell<usize>,
}

#[async_trait(?Send)]
impl BatchTranslator for FailingTranslator {
    async fn translate_batch(&self, _target_language: &str, _texts: &[String]) -> TranslationResult<Vec<String>> {
        *self.attempts.borrow_mut() += 1;
        Err(TranslationError::Network("connection refused".to_string()))
    }
}

/// 读写都失败的存储，模拟配额耗尽或被禁用的本地存储
#[derive(Default)]
pub struct FailingStore {
    pub writes: RefCell<usize>,
}

impl KeyValueStore for FailingStore {
    fn get_item(&self, _key: &str) -> TranslationResult<Option<String>> {
        Err(TranslationError::Storage("storage unavailable".to_string()))
    }

    fn set_item(&self, _key: &str, _value: &str) -> TranslationResult<()> {
        *self.writes.borrow_mut() += 1;
        Err(TranslationError::Storage("quota exceeded".to_string()))
    }
}

/// 用内存存储创建引擎
pub fn engine_for(
    html: &str,
    translator: Rc<dyn BatchTranslator>,
    config: EngineConfig,
) -> (TranslationEngine, ObservedDocument, Rc<MemoryStore>) {
    let document = ObservedDocument::from_html(html);
    let store = Rc::new(MemoryStore::new());
    let engine = TranslationEngine::new(document.clone(), store.clone(), translator, config);
    (engine, document, store)
}

/// 第 `index` 个 `tag` 元素
pub fn element(document: &ObservedDocument, tag: &str, index: usize) -> Handle {
    find_nodes(&document.document(), &[tag])
        .into_iter()
        .nth(index)
        .unwrap_or_else(|| panic!("no <{}> #{}", tag, index))
}

/// 第 `index` 个 `tag` 元素的第一个文本子节点内容
pub fn text_of(document: &ObservedDocument, tag: &str, index: usize) -> String {
    let el = element(document, tag, index);
    let child = el.children.borrow()[0].clone();
    get_text(&child).unwrap_or_default()
}

pub fn attr_of(document: &ObservedDocument, tag: &str, index: usize, name: &str) -> Option<String> {
    get_node_attr(&element(document, tag, index), name)
}

/// 序列化为字符串，便于整体比较
pub fn html_of(document: &ObservedDocument) -> String {
    let bytes = mindweaver::serialize_document(document.dom(), "utf-8").expect("serialize");
    String::from_utf8(bytes).expect("utf-8 output")
}
