//! 远程批量翻译客户端
//!
//! 请求 `{"targetLanguage": ..., "texts": [...]}`，响应 `{"translations": [...]}`。
//! 响应按防御方式解析：形状不对时整批退回原文，单项不是字符串时退回该项原文。

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::translation::config::TranslationConfig;
use crate::translation::error::{TranslationError, TranslationResult};

/// 首次失败是否已经输出过诊断信息
static DID_LOG_FAILURE: AtomicBool = AtomicBool::new(false);

/// 批量翻译接口
///
/// 返回值与 `texts` 等长、同序。
#[async_trait(?Send)]
pub trait BatchTranslator {
    async fn translate_batch(&self, target_language: &str, texts: &[String]) -> TranslationResult<Vec<String>>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TranslateRequest<'a> {
    target_language: &'a str,
    texts: &'a [String],
}

/// 基于 HTTP 的批量翻译客户端（serverless 函数调用风格）
#[derive(Debug, Clone)]
pub struct HttpBatchTranslator {
    client: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
    api_key: Option<String>,
}

impl HttpBatchTranslator {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            access_token: None,
            api_key: None,
        }
    }

    /// 按配置创建，带请求超时和鉴权头
    pub fn from_config(config: &TranslationConfig) -> TranslationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TranslationError::Config(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            access_token: config.access_token.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait(?Send)]
impl BatchTranslator for HttpBatchTranslator {
    async fn translate_batch(&self, target_language: &str, texts: &[String]) -> TranslationResult<Vec<String>> {
        let mut request = self.client.post(&self.endpoint).json(&TranslateRequest {
            target_language,
            texts,
        });

        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }
        if let Some(api_key) = &self.api_key {
            request = request.header("apikey", api_key);
        }

        tracing::debug!("请求翻译 {} 条文本 → {}", texts.len(), target_language);
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TranslationError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let payload: Value = response.json().await?;
        Ok(reconcile_translations(texts, &payload))
    }
}

/// 将响应对齐到请求的文本
///
/// `translations` 不是数组时返回原文；缺失或非字符串的项使用对应原文。
pub fn reconcile_translations(texts: &[String], payload: &Value) -> Vec<String> {
    let Some(items) = payload.get("translations").and_then(Value::as_array) else {
        return texts.to_vec();
    };

    texts
        .iter()
        .enumerate()
        .map(|(idx, source)| {
            items
                .get(idx)
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| source.clone())
        })
        .collect()
}

/// 记录一次翻译失败
///
/// 进程内第一次失败以 `error` 级别输出，并附带常见原因；之后只输出 `debug`。
pub fn report_failure(error: &TranslationError) {
    if !first_failure() {
        tracing::debug!("翻译请求失败: {}", error);
        return;
    }

    tracing::error!(
        "[UI Translate] 翻译请求失败。常见原因: (1) 翻译函数未部署, (2) 网关缺少模型密钥, (3) 未登录或要求 JWT, (4) 网络/CORS。错误: {}",
        error
    );
    tracing::error!("[UI Translate] 提示: {}", error.hint());
}

/// 进程内只有第一次调用返回 `true`
fn first_failure() -> bool {
    !DID_LOG_FAILURE.swap(true, Ordering::Relaxed)
}
