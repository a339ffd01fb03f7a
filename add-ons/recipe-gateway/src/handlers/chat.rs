//! Chat handler: validates the request, asks the model for a recipe reply, records the
//! exchange in the session store, and appends a trace record.
//!
//! Model failures reach the caller only as a generic 500; the detail goes to the log.

use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use recipe_core::{build_prompt, new_session_id, Exchange, TraceRecord};
use recipe_llm::ProviderError;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

const MESSAGE_REQUIRED: &str = "Field 'message' is required and must be a non-empty string";
const GENERIC_FAILURE: &str = "Failed to process your request. Please try again.";

/// Malformed client input. The message names the violated constraint.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub(crate) struct ValidationError {
    message: String,
}

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ChatError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ChatError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ChatError::Provider(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string())
            }
        };
        (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, PartialEq)]
struct ChatRequest {
    message: String,
    session_id: Option<String>,
}

impl ChatRequest {
    /// Extracts `message` and the optional `sessionId` from an untyped body so that a
    /// wrong JSON type is reported as a validation error instead of a decoder rejection.
    fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let fields = body
            .as_object()
            .ok_or_else(|| ValidationError::new("Request body must be a JSON object"))?;

        let message = fields
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| ValidationError::new(MESSAGE_REQUIRED))?;

        let session_id = match fields.get("sessionId") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                return Err(ValidationError::new(
                    "Field 'sessionId' must be a string when provided",
                ))
            }
        };

        Ok(Self {
            message: message.to_string(),
            session_id,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChatResponse {
    response: String,
    session_id: String,
    timestamp: DateTime<Utc>,
}

/// POST /api/chat
pub(crate) async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<axum::Json<ChatResponse>, ChatError> {
    let received = Instant::now();
    let Json(body) = payload
        .map_err(|e| ValidationError::new(format!("Invalid JSON body: {}", e.body_text())))?;
    let req = ChatRequest::from_json(&body)?;
    let session_id = req.session_id.unwrap_or_else(new_session_id);

    tracing::info!(
        target: "recipe::chat",
        session_id = %session_id,
        "Chat request received: {} chars",
        req.message.len()
    );

    let prompt = build_prompt(&req.message);
    let reply = state.model.complete(&prompt).await.map_err(|e| {
        tracing::error!(
            target: "recipe::chat",
            session_id = %session_id,
            model = %state.model.label(),
            error = %e,
            "Model call failed"
        );
        e
    })?;
    let elapsed = received.elapsed();

    let exchange = Exchange::new(session_id.clone(), req.message, reply);
    state.sessions.append(exchange.clone());
    state
        .traces
        .record(&TraceRecord::from_exchange(&exchange, elapsed, state.model.label()))
        .await;

    tracing::info!(
        target: "recipe::chat",
        session_id = %session_id,
        elapsed_ms = elapsed.as_millis() as u64,
        "Chat response generated"
    );

    Ok(axum::Json(ChatResponse {
        response: exchange.ai_response,
        session_id,
        timestamp: exchange.timestamp,
    }))
}
