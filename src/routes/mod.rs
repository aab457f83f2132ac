//! API routes

mod arcade;
mod chat;
mod memory;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::json;

use crate::arcade::MoveError;
use crate::core::SessionError;
use crate::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Errors rendered as `{"error": "..."}` with a matching status code
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Move(#[from] MoveError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Session(SessionError::Busy) => StatusCode::CONFLICT,
            ApiError::Session(SessionError::EmptyMessage) => StatusCode::BAD_REQUEST,
            ApiError::Session(SessionError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Move(MoveError::OutOfRange(_) | MoveError::InvalidChoice(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Move(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!("Request rejected ({}): {}", status, self);
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(chat::router())
        .merge(memory::router())
        .merge(arcade::router())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::arcade::Arcade;
    use crate::config::{Config, Settings};
    use crate::core::{InMemoryKvStore, MemoryStore, SessionManager};
    use crate::providers::{Gateway, GenerationRequest, GenerationResponse, ProviderError};
    use crate::AppState;

    struct CannedGateway;

    #[async_trait]
    impl Gateway for CannedGateway {
        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> Result<GenerationResponse, ProviderError> {
            Ok(GenerationResponse {
                text: format!("You said {} thing(s)", request.turns.len()),
                sources: Vec::new(),
            })
        }
    }

    pub async fn app() -> Router {
        let memory = Arc::new(MemoryStore::open(Arc::new(InMemoryKvStore::new())).await);
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            data_dir: "./data".into(),
            gemini_api_key: None,
            settings: Settings::default(),
        };
        let state = AppState {
            sessions: Arc::new(SessionManager::new(memory.clone(), Arc::new(CannedGateway))),
            memory,
            arcade: Arc::new(Arcade::with_seed(&config.settings.arcade, 5)),
            config,
        };
        super::router().with_state(state)
    }

    pub async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (u16, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status().as_u16();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}
