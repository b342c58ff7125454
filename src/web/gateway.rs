//! 翻译网关的纯逻辑部分
//!
//! 请求校验、文本清洗、提示词构造、模型回复解析。不依赖 HTTP 框架，
//! 由 `handlers` 在 `web` 特性下调用。

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

use crate::translation::error::{TranslationError, TranslationResult};

/// 校验通过的网关请求
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRequest {
    pub target_language: String,
    pub source_language: Option<String>,
    /// 清洗后的文本：转为字符串、去除首尾空白、丢弃空串
    pub texts: Vec<String>,
}

/// 解析请求体；`targetLanguage` 缺失/为空或 `texts` 不是数组时返回 `None`
pub fn parse_request(body: &Value) -> Option<GatewayRequest> {
    let target_language = body
        .get("targetLanguage")
        .and_then(Value::as_str)
        .filter(|lang| !lang.is_empty())?;
    let texts = body.get("texts").and_then(Value::as_array)?;

    let source_language = body
        .get("sourceLanguage")
        .and_then(Value::as_str)
        .filter(|lang| !lang.is_empty())
        .map(str::to_string);

    Some(GatewayRequest {
        target_language: target_language.to_string(),
        source_language,
        texts: clean_texts(texts),
    })
}

/// 非字符串视为空串，去除首尾空白后丢弃空串
pub fn clean_texts(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.as_str().unwrap_or_default().trim())
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect()
}

/// 构造界面翻译用的系统提示词
pub fn build_system_prompt(target_language: &str, source_language: Option<&str>) -> String {
    let source_hint = source_language
        .map(|source| format!(" Source language hint: {}.", source))
        .unwrap_or_default();

    format!(
        "You are a precise UI translator.{} Translate each string into {}.\n\n\
         Rules:\n\
         - Preserve punctuation, emojis, and capitalization style when reasonable.\n\
         - Do NOT translate placeholders like {{name}}, {{{{name}}}}, %s, %d, :id.\n\
         - Do NOT translate URLs.\n\
         - Return ONLY valid JSON in the form: {{\"translations\":[\"...\",\"...\"]}} with the same number of items as input.",
        source_hint, target_language
    )
}

/// 构造 chat completions 请求体（非流式，temperature 0.2）
pub fn build_chat_request(model: &str, request: &GatewayRequest) -> Value {
    let system_prompt = build_system_prompt(&request.target_language, request.source_language.as_deref());
    let user_content = json!({ "texts": request.texts }).to_string();

    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": system_prompt },
            { "role": "user", "content": user_content },
        ],
        "stream": false,
        "temperature": 0.2,
    })
}

/// 取出 `choices[0].message.content`
pub fn reply_content(completion: &Value) -> Option<&str> {
    completion
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
}

fn json_object_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("json object regex is valid"))
}

/// 从模型回复中提取译文
///
/// 回复为空时原样返回清洗后的文本；回复中的 JSON 无法解析时返回错误；
/// `translations` 不是数组时返回清洗后的文本；单项为空或不是字符串时使用对应原文。
pub fn extract_translations(content: Option<&str>, cleaned: &[String]) -> TranslationResult<Vec<String>> {
    let Some(content) = content.filter(|c| !c.is_empty()) else {
        return Ok(cleaned.to_vec());
    };

    let candidate = json_object_regex()
        .find(content)
        .map(|m| m.as_str())
        .unwrap_or(content);
    let parsed: Value = serde_json::from_str(candidate)
        .map_err(|e| TranslationError::Parse(format!("模型回复不是有效JSON: {}", e)))?;

    let Some(items) = parsed.get("translations").and_then(Value::as_array) else {
        return Ok(cleaned.to_vec());
    };

    Ok(items
        .iter()
        .enumerate()
        .map(|(idx, item)| match item.as_str() {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ => cleaned.get(idx).cloned().unwrap_or_default(),
        })
        .collect())
}
