//! 批量翻译处理器
//!
//! `POST /functions/v1/translate`，请求 `{targetLanguage, texts, sourceLanguage?}`，
//! 响应 `{translations}` 或 `{error}`。

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::Value;

use crate::web::gateway::{build_chat_request, extract_translations, parse_request, reply_content};
use crate::web::types::{AppState, ErrorResponse, TranslateResponse};

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

fn ok_response(translations: Vec<String>) -> Response {
    (StatusCode::OK, Json(TranslateResponse { translations })).into_response()
}

/// 翻译处理器
pub async fn translate_texts(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|body| parse_request(&body));

    let Some(request) = request else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid request");
    };

    if request.texts.is_empty() {
        return ok_response(Vec::new());
    }

    let Some(api_key) = state.config.api_key.as_deref() else {
        tracing::error!("翻译网关缺少上游密钥");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Gateway API key is not configured");
    };

    tracing::debug!(
        "网关翻译 {} 条文本 → {}",
        request.texts.len(),
        request.target_language
    );

    let upstream = state
        .client
        .post(&state.config.upstream_url)
        .bearer_auth(api_key)
        .json(&build_chat_request(&state.config.model, &request))
        .send()
        .await;

    let response = match upstream {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Translate error: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        tracing::error!("Translate gateway error: {} {}", status, text);
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Translate gateway error");
    }

    let completion: Value = match response.json().await {
        Ok(completion) => completion,
        Err(e) => {
            tracing::error!("Translate error: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    match extract_translations(reply_content(&completion), &request.texts) {
        Ok(translations) => ok_response(translations),
        Err(e) => {
            tracing::error!("Translate error: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
