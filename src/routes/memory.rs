//! Profile and memory endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::core::{MemoryStats, SessionSummary, UserProfile};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct InterestRequest {
    pub interest: String,
}

#[derive(Debug, Serialize)]
pub struct ContextResponse {
    pub context: String,
}

async fn stats(State(state): State<AppState>) -> Json<MemoryStats> {
    Json(state.memory.get_stats().await)
}

async fn profile(State(state): State<AppState>) -> Json<UserProfile> {
    Json(state.memory.get_or_create_profile().await)
}

async fn summaries(State(state): State<AppState>) -> Json<Vec<SessionSummary>> {
    Json(state.memory.summaries().await)
}

async fn context(State(state): State<AppState>) -> Json<ContextResponse> {
    Json(ContextResponse {
        context: state.memory.context().await,
    })
}

async fn update_name(
    State(state): State<AppState>,
    Json(request): Json<NameRequest>,
) -> Json<UserProfile> {
    state.memory.update_name(&request.name).await;
    Json(state.memory.get_or_create_profile().await)
}

async fn add_interest(
    State(state): State<AppState>,
    Json(request): Json<InterestRequest>,
) -> Json<UserProfile> {
    state.memory.add_interest(&request.interest).await;
    Json(state.memory.get_or_create_profile().await)
}

async fn clear(State(state): State<AppState>) -> StatusCode {
    state.memory.clear_all().await;
    StatusCode::NO_CONTENT
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/memory", get(stats).delete(clear))
        .route("/v1/memory/profile", get(profile))
        .route("/v1/memory/summaries", get(summaries))
        .route("/v1/memory/context", get(context))
        .route("/v1/memory/name", put(update_name))
        .route("/v1/memory/interests", post(add_interest))
}
