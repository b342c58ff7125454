//! 文本过滤器模块
//!
//! 判断文本是否值得翻译，以及节点是否位于禁止改写的区域内

use std::sync::OnceLock;

use markup5ever_rcdom::Handle;
use regex::Regex;

use crate::parsers::html::dom::{get_node_attr, get_node_name, get_parent_node, is_element};
use crate::translation::config::constants;

fn symbols_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 纯数字、空白、标点
    RE.get_or_init(|| Regex::new(r"^[0-9\s\p{P}]+$").expect("symbols regex is valid"))
}

/// 判断文本是否不需要翻译
///
/// 以下情况跳过：去除首尾空白后为空、超过 240 个字符、
/// 只由数字/空白/标点组成、以 `http://`、`https://` 或 `www.` 开头（忽略大小写）。
pub fn should_skip_text(text: &str) -> bool {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return true;
    }

    if trimmed.chars().count() > constants::MAX_TEXT_CHARS {
        return true;
    }

    if symbols_regex().is_match(trimmed) {
        return true;
    }

    is_link_like(trimmed)
}

fn is_link_like(text: &str) -> bool {
    let head: String = text.chars().take(8).collect::<String>().to_ascii_lowercase();
    head.starts_with("http://") || head.starts_with("https://") || head.starts_with("www.")
}

/// 文本节点是否位于禁止翻译的区域
///
/// 从父元素开始向上查找：带 `data-no-translate` 的祖先，或脚本、样式、代码、
/// 预格式化、可编辑控件元素。
pub fn is_text_blocked(text_node: &Handle) -> bool {
    match get_parent_node(text_node) {
        Some(parent) => has_blocking_ancestor(&parent, constants::TEXT_BLOCKING_TAGS),
        None => true,
    }
}

/// 元素的属性是否位于禁止翻译的区域（包含元素自身）
pub fn is_attr_blocked(element: &Handle) -> bool {
    has_blocking_ancestor(element, constants::ATTR_BLOCKING_TAGS)
}

fn has_blocking_ancestor(start: &Handle, blocking_tags: &[&str]) -> bool {
    let mut current = Some(start.clone());

    while let Some(node) = current {
        if is_element(&node) {
            if get_node_attr(&node, constants::NO_TRANSLATE_ATTR).is_some() {
                return true;
            }
            if let Some(name) = get_node_name(&node) {
                if blocking_tags.contains(&name) {
                    return true;
                }
            }
        }
        current = get_parent_node(&node);
    }

    false
}
