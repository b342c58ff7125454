//! # 解析器模块
//!
//! - `html` - HTML文档解析、DOM操作、变更观察、序列化

pub mod html;

// Re-export commonly used items for convenience
pub use html::{document_body, html_to_dom, serialize_document, ObservedDocument};
