//! 翻译目标收集器
//!
//! 每次调用都对子树做一次完整扫描，产出文本目标和属性目标。
//! 是否可翻译总是按账本中的原始值判断，而不是当前（可能已被翻译的）值。

use markup5ever_rcdom::{Handle, NodeData};

use super::filters::{is_attr_blocked, is_text_blocked, should_skip_text};
use super::ledger::OriginalLedger;
use crate::parsers::html::dom::{get_node_attr, get_parent_node, get_text, is_element};
use crate::translation::config::constants;

/// 单个翻译目标
#[derive(Debug, Clone)]
pub enum TranslationTarget {
    /// 文本节点
    Text { node: Handle, original: String },
    /// 元素上的可翻译属性
    Attribute {
        element: Handle,
        name: String,
        original: String,
    },
}

impl TranslationTarget {
    /// 目标的原始（未翻译）值
    pub fn original(&self) -> &str {
        match self {
            TranslationTarget::Text { original, .. } | TranslationTarget::Attribute { original, .. } => original,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, TranslationTarget::Text { .. })
    }

    /// 当前写在 DOM 上的值
    pub fn current(&self) -> Option<String> {
        match self {
            TranslationTarget::Text { node, .. } => get_text(node),
            TranslationTarget::Attribute { element, name, .. } => get_node_attr(element, name),
        }
    }
}

/// 目标扫描器
pub struct TargetScanner {
    attributes: &'static [&'static str],
}

impl Default for TargetScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetScanner {
    pub fn new() -> Self {
        Self {
            attributes: constants::TRANSLATABLE_ATTRS,
        }
    }

    /// 扫描 `root` 子树
    ///
    /// 先按文档顺序输出文本目标，再按文档顺序、属性白名单顺序输出属性目标。
    pub fn scan(&self, root: &Handle, ledger: &mut OriginalLedger) -> Vec<TranslationTarget> {
        let mut targets = Vec::new();
        self.collect_texts(root, ledger, &mut targets);

        for child in root.children.borrow().iter() {
            self.collect_attrs(child, ledger, &mut targets);
        }

        tracing::trace!("扫描得到 {} 个翻译目标", targets.len());
        targets
    }

    fn collect_texts(&self, node: &Handle, ledger: &mut OriginalLedger, out: &mut Vec<TranslationTarget>) {
        for child in node.children.borrow().iter() {
            match &child.data {
                NodeData::Text { contents } => {
                    if let Some(target) = Self::accept_text(child, &contents.borrow(), ledger) {
                        out.push(target);
                    }
                }
                NodeData::Element { .. } => self.collect_texts(child, ledger, out),
                _ => {}
            }
        }
    }

    fn accept_text(node: &Handle, current: &str, ledger: &mut OriginalLedger) -> Option<TranslationTarget> {
        // 只接受父节点是元素的文本
        if !get_parent_node(node).is_some_and(|parent| is_element(&parent)) {
            return None;
        }
        if is_text_blocked(node) {
            return None;
        }

        let base = ledger.text(node).unwrap_or(current);
        if should_skip_text(base) {
            return None;
        }

        let original = ledger.record_text_if_absent(node, current);
        Some(TranslationTarget::Text {
            node: node.clone(),
            original,
        })
    }

    fn collect_attrs(&self, node: &Handle, ledger: &mut OriginalLedger, out: &mut Vec<TranslationTarget>) {
        if !is_element(node) {
            return;
        }

        let present: Vec<(&str, String)> = self
            .attributes
            .iter()
            .filter_map(|name| {
                get_node_attr(node, name)
                    .filter(|value| !value.is_empty())
                    .map(|value| (*name, value))
            })
            .collect();

        if !present.is_empty() && !is_attr_blocked(node) {
            for (name, current) in present {
                let original = ledger.record_attr_if_absent(node, name, &current);
                if should_skip_text(&original) {
                    continue;
                }
                out.push(TranslationTarget::Attribute {
                    element: node.clone(),
                    name: name.to_string(),
                    original,
                });
            }
        }

        for child in node.children.borrow().iter() {
            self.collect_attrs(child, ledger, out);
        }
    }
}
