//! 可观察文档
//!
//! `markup5ever_rcdom` 本身没有变更通知。`ObservedDocument` 包装一棵 DOM，
//! 所有需要被观察的写操作（文本、属性、增删子节点）都经由它完成，
//! 并同步分发 [`MutationRecord`] 给匹配的观察者。

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use html5ever::interface::{Attribute, QualName};
use html5ever::tendril::format_tendril;
use html5ever::tree_builder::create_element;
use html5ever::{namespace_url, ns, LocalName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};

use super::dom::{
    document_body, get_node_attr, get_parent_node, get_text, html_to_dom,
    is_inclusive_descendant, set_node_attr, set_text,
};

/// 单条变更记录
#[derive(Debug, Clone)]
pub enum MutationRecord {
    /// 子节点被添加或移除，`target` 为父节点
    ChildList { target: Handle },
    /// 文本节点内容变化
    CharacterData { target: Handle },
    /// 元素属性变化
    Attributes { target: Handle, name: String },
}

impl MutationRecord {
    pub fn target(&self) -> &Handle {
        match self {
            MutationRecord::ChildList { target }
            | MutationRecord::CharacterData { target }
            | MutationRecord::Attributes { target, .. } => target,
        }
    }
}

/// 观察选项
#[derive(Debug, Clone, Default)]
pub struct ObserveOptions {
    pub subtree: bool,
    pub child_list: bool,
    pub character_data: bool,
    pub attributes: bool,
    /// 仅关心这些属性；`None` 表示全部
    pub attribute_filter: Option<Vec<String>>,
}

impl ObserveOptions {
    fn accepts(&self, record: &MutationRecord) -> bool {
        match record {
            MutationRecord::ChildList { .. } => self.child_list,
            MutationRecord::CharacterData { .. } => self.character_data,
            MutationRecord::Attributes { name, .. } => {
                self.attributes
                    && self
                        .attribute_filter
                        .as_ref()
                        .map_or(true, |filter| filter.iter().any(|f| f == name))
            }
        }
    }
}

type MutationCallback = Rc<dyn Fn(&MutationRecord)>;

struct Registration {
    id: u64,
    root: Handle,
    options: ObserveOptions,
    callback: MutationCallback,
}

struct DocumentInner {
    dom: RcDom,
    observers: RefCell<Vec<Registration>>,
    next_observer_id: Cell<u64>,
}

/// 带变更通知的文档句柄，克隆代价很低
#[derive(Clone)]
pub struct ObservedDocument {
    inner: Rc<DocumentInner>,
}

impl ObservedDocument {
    pub fn new(dom: RcDom) -> Self {
        Self {
            inner: Rc::new(DocumentInner {
                dom,
                observers: RefCell::new(Vec::new()),
                next_observer_id: Cell::new(1),
            }),
        }
    }

    /// 从 HTML 文本创建
    pub fn from_html(html: &str) -> Self {
        Self::new(html_to_dom(html.as_bytes(), "utf-8".to_string()))
    }

    pub fn dom(&self) -> &RcDom {
        &self.inner.dom
    }

    pub fn document(&self) -> Handle {
        self.inner.dom.document.clone()
    }

    pub fn body(&self) -> Handle {
        document_body(&self.inner.dom)
    }

    /// 注册观察者
    pub fn observe<F>(&self, root: &Handle, options: ObserveOptions, callback: F) -> ObserverHandle
    where
        F: Fn(&MutationRecord) + 'static,
    {
        let id = self.inner.next_observer_id.get();
        self.inner.next_observer_id.set(id + 1);

        self.inner.observers.borrow_mut().push(Registration {
            id,
            root: root.clone(),
            options,
            callback: Rc::new(callback),
        });

        ObserverHandle {
            id,
            document: Rc::downgrade(&self.inner),
        }
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    /// 写入文本节点；值未变化时不写、不通知
    pub fn set_text(&self, node: &Handle, value: &str) -> bool {
        match get_text(node) {
            Some(current) if current != value => {
                set_text(node, value);
                self.notify(MutationRecord::CharacterData {
                    target: node.clone(),
                });
                true
            }
            _ => false,
        }
    }

    /// 写入元素属性；值未变化时不写、不通知
    pub fn set_attribute(&self, node: &Handle, name: &str, value: &str) -> bool {
        if !matches!(node.data, NodeData::Element { .. }) {
            return false;
        }
        if get_node_attr(node, name).as_deref() == Some(value) {
            return false;
        }
        set_node_attr(node, name, Some(value.to_string()));
        self.notify(MutationRecord::Attributes {
            target: node.clone(),
            name: name.to_string(),
        });
        true
    }

    /// 追加子节点；已有父节点时先脱离
    pub fn append_child(&self, parent: &Handle, child: &Handle) {
        if let Some(old_parent) = get_parent_node(child) {
            self.remove_child(&old_parent, child);
        }
        parent.children.borrow_mut().push(child.clone());
        child.parent.set(Some(Rc::downgrade(parent)));
        self.notify(MutationRecord::ChildList {
            target: parent.clone(),
        });
    }

    /// 移除子节点，找不到时返回 `false`
    pub fn remove_child(&self, parent: &Handle, child: &Handle) -> bool {
        let removed = {
            let mut children = parent.children.borrow_mut();
            match children.iter().position(|c| Rc::ptr_eq(c, child)) {
                Some(index) => {
                    children.remove(index);
                    true
                }
                None => false,
            }
        };
        if removed {
            child.parent.set(None);
            self.notify(MutationRecord::ChildList {
                target: parent.clone(),
            });
        }
        removed
    }

    /// 创建一个尚未挂载的元素
    pub fn create_element(&self, tag: &str, attrs: &[(&str, &str)]) -> Handle {
        let attrs = attrs
            .iter()
            .map(|(name, value)| Attribute {
                name: QualName::new(None, ns!(), LocalName::from(*name)),
                value: format_tendril!("{}", value),
            })
            .collect();
        create_element(
            &self.inner.dom,
            QualName::new(None, ns!(html), LocalName::from(tag)),
            attrs,
        )
    }

    /// 创建一个尚未挂载的文本节点
    pub fn create_text(&self, value: &str) -> Handle {
        Node::new(NodeData::Text {
            contents: RefCell::new(value.into()),
        })
    }

    fn notify(&self, record: MutationRecord) {
        // 先收集回调再调用，回调内可以安全地增删观察者
        let callbacks: Vec<MutationCallback> = self
            .inner
            .observers
            .borrow()
            .iter()
            .filter(|reg| reg.options.accepts(&record))
            .filter(|reg| {
                if reg.options.subtree {
                    is_inclusive_descendant(record.target(), &reg.root)
                } else {
                    Rc::ptr_eq(record.target(), &reg.root)
                }
            })
            .map(|reg| reg.callback.clone())
            .collect();

        for callback in callbacks {
            callback(&record);
        }
    }
}

/// 观察者句柄；`disconnect` 或丢弃后不再收到通知
pub struct ObserverHandle {
    id: u64,
    document: Weak<DocumentInner>,
}

impl ObserverHandle {
    pub fn disconnect(&self) {
        if let Some(inner) = self.document.upgrade() {
            inner.observers.borrow_mut().retain(|reg| reg.id != self.id);
        }
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        self.disconnect();
    }
}
