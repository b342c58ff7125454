//! 原始值账本
//!
//! 以节点身份（而非内容）记录每个文本节点、每个 (元素, 属性名) 第一次被看到时的值。
//! 条目只持有 `Weak<Node>`，不会让已脱离文档的节点继续存活；
//! 节点释放后条目在下一次清理时被移除，不需要显式删除。

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use markup5ever_rcdom::{Handle, Node};

/// 每记录这么多新条目清理一次失效条目
const SWEEP_INTERVAL: usize = 256;

struct TextEntry {
    node: Weak<Node>,
    original: String,
}

struct AttrEntry {
    element: Weak<Node>,
    name: String,
    original: String,
}

// 指针做键：条目持有的 Weak 保住了这块分配，地址在条目存在期间不会被复用
type NodeKey = *const Node;

/// 原始值账本
#[derive(Default)]
pub struct OriginalLedger {
    texts: HashMap<NodeKey, TextEntry>,
    attrs: HashMap<(NodeKey, String), AttrEntry>,
    inserts_since_sweep: usize,
}

impl OriginalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录文本节点的原始值（已存在则不覆盖），返回原始值
    pub fn record_text_if_absent(&mut self, node: &Handle, current: &str) -> String {
        let key = Rc::as_ptr(node);
        if let Some(entry) = self.texts.get(&key) {
            return entry.original.clone();
        }

        self.texts.insert(
            key,
            TextEntry {
                node: Rc::downgrade(node),
                original: current.to_string(),
            },
        );
        self.after_insert();
        current.to_string()
    }

    /// 查询文本节点的原始值
    pub fn text(&self, node: &Handle) -> Option<&str> {
        self.texts
            .get(&Rc::as_ptr(node))
            .map(|entry| entry.original.as_str())
    }

    /// 记录属性的原始值（已存在则不覆盖），返回原始值
    pub fn record_attr_if_absent(&mut self, element: &Handle, name: &str, current: &str) -> String {
        let key = (Rc::as_ptr(element), name.to_string());
        if let Some(entry) = self.attrs.get(&key) {
            return entry.original.clone();
        }

        self.attrs.insert(
            key,
            AttrEntry {
                element: Rc::downgrade(element),
                name: name.to_string(),
                original: current.to_string(),
            },
        );
        self.after_insert();
        current.to_string()
    }

    /// 查询属性的原始值
    pub fn attr(&self, element: &Handle, name: &str) -> Option<&str> {
        self.attrs
            .get(&(Rc::as_ptr(element), name.to_string()))
            .map(|entry| entry.original.as_str())
    }

    /// 仍然存活的文本节点及其原始值
    pub fn tracked_texts(&self) -> Vec<(Handle, String)> {
        self.texts
            .values()
            .filter_map(|entry| entry.node.upgrade().map(|node| (node, entry.original.clone())))
            .collect()
    }

    /// 仍然存活的 (元素, 属性名, 原始值)
    pub fn tracked_attrs(&self) -> Vec<(Handle, String, String)> {
        self.attrs
            .values()
            .filter_map(|entry| {
                entry
                    .element
                    .upgrade()
                    .map(|element| (element, entry.name.clone(), entry.original.clone()))
            })
            .collect()
    }

    /// 条目总数（含尚未清理的失效条目）
    pub fn len(&self) -> usize {
        self.texts.len() + self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 移除节点已释放的条目，返回移除数量
    pub fn sweep(&mut self) -> usize {
        let before = self.len();
        self.texts.retain(|_, entry| entry.node.strong_count() > 0);
        self.attrs.retain(|_, entry| entry.element.strong_count() > 0);
        self.inserts_since_sweep = 0;

        let removed = before - self.len();
        if removed > 0 {
            tracing::trace!("账本清理了 {} 个失效条目", removed);
        }
        removed
    }

    fn after_insert(&mut self) {
        self.inserts_since_sweep += 1;
        if self.inserts_since_sweep >= SWEEP_INTERVAL {
            self.sweep();
        }
    }
}
