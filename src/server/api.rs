use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;

use crate::errors::GenAiError;
use crate::genai::{self, ChatMessage, TextModel, prompts};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub model: Arc<dyn TextModel>,
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct TemplateRequest {
    pub prompt: String,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    BadRequest(String),
    Forbidden(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<GenAiError> for ApiError {
    fn from(err: GenAiError) -> Self {
        tracing::error!(error = %err, "GenAI call failed");
        ApiError::Internal("Failed to generate content from AI.".to_string())
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/genai/template", post(resolve_template))
        .route("/genai/chat", post(chat))
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

/// Classify the prompt into a project kind and return its template
/// payload. An unrecognized classification is refused, matching the
/// contract the editor client expects.
async fn resolve_template(
    State(state): State<SharedState>,
    Json(req): Json<TemplateRequest>,
) -> Result<Json<genai::TemplateResponse>, ApiError> {
    if req.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("Prompt must not be empty.".to_string()));
    }

    match genai::resolve_template(state.model.as_ref(), &req.prompt).await? {
        Some(template) => Ok(Json(template)),
        None => Err(ApiError::Forbidden(
            "Prompt does not describe a supported project kind.".to_string(),
        )),
    }
}

/// Forward the conversation to the model under the fixed system prompt.
/// Retry-on-overload lives in the provider client.
async fn chat(
    State(state): State<SharedState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.messages.is_empty() {
        return Err(ApiError::BadRequest(
            "Invalid or empty 'messages' array.".to_string(),
        ));
    }

    let text = state
        .model
        .generate(prompts::SYSTEM_PROMPT, &req.messages, 0.2)
        .await?;

    Ok(Json(serde_json::json!({ "response": text })))
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genai::testing::{OverloadedModel, ScriptedModel};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn router_with(model: Arc<dyn TextModel>) -> Router {
        let state = Arc::new(AppState { model });
        api_router().with_state(state)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = router_with(Arc::new(ScriptedModel::new(vec![])));
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn chat_rejects_empty_messages() {
        let app = router_with(Arc::new(ScriptedModel::new(vec![])));
        let resp = app
            .oneshot(post_json("/genai/chat", serde_json::json!({"messages": []})))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "Invalid or empty 'messages' array.");
    }

    #[tokio::test]
    async fn chat_returns_model_reply() {
        let app = router_with(Arc::new(ScriptedModel::new(vec!["generated site"])));
        let resp = app
            .oneshot(post_json(
                "/genai/chat",
                serde_json::json!({"messages": [{"role": "user", "content": "build a site"}]}),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["response"], "generated site");
    }

    #[tokio::test]
    async fn chat_maps_provider_failure_to_500() {
        let app = router_with(Arc::new(OverloadedModel));
        let resp = app
            .oneshot(post_json(
                "/genai/chat",
                serde_json::json!({"messages": [{"role": "user", "content": "hi"}]}),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "Failed to generate content from AI.");
    }

    #[tokio::test]
    async fn template_react_payload_has_two_prompts() {
        let app = router_with(Arc::new(ScriptedModel::new(vec!["react"])));
        let resp = app
            .oneshot(post_json(
                "/genai/template",
                serde_json::json!({"prompt": "a todo app"}),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["prompts"].as_array().unwrap().len(), 2);
        assert_eq!(json["uiPrompts"].as_array().unwrap().len(), 1);
        assert!(json["uiPrompts"][0]
            .as_str()
            .unwrap()
            .contains("boltArtifact"));
    }

    #[tokio::test]
    async fn template_unknown_kind_is_forbidden() {
        let app = router_with(Arc::new(ScriptedModel::new(vec!["a django app"])));
        let resp = app
            .oneshot(post_json(
                "/genai/template",
                serde_json::json!({"prompt": "something"}),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn template_empty_prompt_is_bad_request() {
        let app = router_with(Arc::new(ScriptedModel::new(vec![])));
        let resp = app
            .oneshot(post_json(
                "/genai/template",
                serde_json::json!({"prompt": "  "}),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
