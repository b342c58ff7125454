//! HTML解析和处理模块
//!
//! - `dom`: 基础DOM操作
//! - `observer`: 可观察文档与变更通知
//! - `serializer`: 序列化功能

pub mod dom;
pub mod observer;
pub mod serializer;

pub use dom::{
    document_body, find_nodes, get_child_node_by_name, get_node_attr, get_node_name,
    get_parent_node, get_text, html_to_dom, is_element, set_node_attr, set_text,
};
pub use observer::{MutationRecord, ObserveOptions, ObservedDocument, ObserverHandle};
pub use serializer::serialize_document;
