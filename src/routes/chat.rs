//! Session and chat endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PromptOptions;
use crate::conversation::{ChatMessage, ChatSession};
use crate::core::SessionList;
use crate::AppState;

use super::ApiError;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(flatten)]
    pub options: PromptOptions,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: Uuid,
    pub message: ChatMessage,
}

async fn list_sessions(State(state): State<AppState>) -> Json<SessionList> {
    Json(state.sessions.list().await)
}

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<ChatSession>) {
    (StatusCode::CREATED, Json(state.sessions.create_session().await))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ChatSession>, ApiError> {
    Ok(Json(state.sessions.get(id).await?))
}

async fn activate_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ChatSession>, ApiError> {
    Ok(Json(state.sessions.switch_to(id).await?))
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let (session_id, message) = state
        .sessions
        .send(&request.message, request.options)
        .await?;

    Ok(Json(ChatResponse {
        session_id,
        message,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions", get(list_sessions).post(create_session))
        .route("/v1/sessions/:id", get(get_session))
        .route("/v1/sessions/:id/activate", post(activate_session))
        .route("/v1/chat", post(chat))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, call};
    use axum::http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_chat_round_trip() {
        let app = app().await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/v1/chat",
            Some(json!({ "message": "hi", "personality": "chill", "deep_search": true })),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body["message"]["role"], "assistant");
        assert_eq!(body["message"]["content"], "You said 1 thing(s)");

        let id = body["session_id"].as_str().unwrap().to_string();
        let (status, body) = call(&app, Method::GET, &format!("/v1/sessions/{}", id), None).await;
        assert_eq!(status, 200);
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert_eq!(body["title"], "hi");
    }

    #[tokio::test]
    async fn test_blank_chat_is_bad_request() {
        let app = app().await;
        let (status, body) = call(&app, Method::POST, "/v1/chat", Some(json!({ "message": " " }))).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Message is empty");
    }

    #[tokio::test]
    async fn test_session_switching() {
        let app = app().await;

        call(&app, Method::POST, "/v1/chat", Some(json!({ "message": "how do I learn python" }))).await;

        let (status, created) = call(&app, Method::POST, "/v1/sessions", None).await;
        assert_eq!(status, 201);

        let (_, list) = call(&app, Method::GET, "/v1/sessions", None).await;
        assert_eq!(list["active"], created["id"]);
        assert_eq!(list["sessions"].as_array().unwrap().len(), 2);

        let (_, stats) = call(&app, Method::GET, "/v1/memory", None).await;
        assert_eq!(stats["session_count"], 1);

        let first = list["sessions"][1]["id"].as_str().unwrap().to_string();
        let (status, _) = call(&app, Method::POST, &format!("/v1/sessions/{}/activate", first), None).await;
        assert_eq!(status, 200);

        let missing = format!("/v1/sessions/{}/activate", uuid::Uuid::new_v4());
        let (status, _) = call(&app, Method::POST, &missing, None).await;
        assert_eq!(status, 404);
    }
}
