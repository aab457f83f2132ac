//! Arcade endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::arcade::{Choice, MathDuel, RpsView, Submission, TicTacToe};
use crate::AppState;

use super::ApiError;

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub cell: usize,
}

#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    pub choice: String,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub result: Submission,
    pub duel: MathDuel,
}

async fn tictactoe(State(state): State<AppState>) -> Json<TicTacToe> {
    Json(state.arcade.tictactoe().await)
}

async fn tictactoe_move(
    State(state): State<AppState>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<TicTacToe>, ApiError> {
    Ok(Json(state.arcade.tictactoe_move(request.cell).await?))
}

async fn tictactoe_reset(State(state): State<AppState>) -> Json<TicTacToe> {
    Json(state.arcade.tictactoe_reset().await)
}

async fn rps(State(state): State<AppState>) -> Json<RpsView> {
    Json(state.arcade.rps().await)
}

async fn rps_play(
    State(state): State<AppState>,
    Json(request): Json<PlayRequest>,
) -> Result<Json<RpsView>, ApiError> {
    let choice: Choice = request.choice.parse()?;
    Ok(Json(state.arcade.rps_play(choice).await))
}

async fn rps_next(State(state): State<AppState>) -> Json<RpsView> {
    Json(state.arcade.rps_next_round().await)
}

async fn rps_reset(State(state): State<AppState>) -> Json<RpsView> {
    Json(state.arcade.rps_reset().await)
}

async fn math(State(state): State<AppState>) -> Json<Option<MathDuel>> {
    Json(state.arcade.math().await)
}

async fn math_restart(State(state): State<AppState>) -> Json<MathDuel> {
    Json(state.arcade.math_restart().await)
}

async fn math_answer(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let (result, duel) = state.arcade.math_answer(&request.answer).await?;
    Ok(Json(AnswerResponse { result, duel }))
}

async fn exit(State(state): State<AppState>) -> StatusCode {
    state.arcade.exit().await;
    StatusCode::NO_CONTENT
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/arcade/tictactoe", get(tictactoe))
        .route("/v1/arcade/tictactoe/move", post(tictactoe_move))
        .route("/v1/arcade/tictactoe/reset", post(tictactoe_reset))
        .route("/v1/arcade/rps", get(rps))
        .route("/v1/arcade/rps/play", post(rps_play))
        .route("/v1/arcade/rps/next", post(rps_next))
        .route("/v1/arcade/rps/reset", post(rps_reset))
        .route("/v1/arcade/math", get(math))
        .route("/v1/arcade/math/restart", post(math_restart))
        .route("/v1/arcade/math/answer", post(math_answer))
        .route("/v1/arcade/exit", post(exit))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, call};
    use axum::http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_tictactoe_moves() {
        let app = app().await;

        let (status, game) =
            call(&app, Method::POST, "/v1/arcade/tictactoe/move", Some(json!({ "cell": 4 }))).await;
        assert_eq!(status, 200);
        assert_eq!(game["board"][4], "X");
        assert_eq!(game["status"]["state"], "in_progress");

        let (status, body) =
            call(&app, Method::POST, "/v1/arcade/tictactoe/move", Some(json!({ "cell": 4 }))).await;
        assert_eq!(status, 409);
        assert!(body["error"].is_string());

        let (_, game) = call(&app, Method::POST, "/v1/arcade/tictactoe/reset", None).await;
        assert_eq!(game["board"][4], serde_json::Value::Null);

        let (status, _) =
            call(&app, Method::POST, "/v1/arcade/tictactoe/move", Some(json!({ "cell": 12 }))).await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_rps_play() {
        let app = app().await;

        let (status, view) =
            call(&app, Method::POST, "/v1/arcade/rps/play", Some(json!({ "choice": "paper" }))).await;
        assert_eq!(status, 200);
        assert_eq!(view["last_round"]["player"], "paper");

        let (status, _) =
            call(&app, Method::POST, "/v1/arcade/rps/play", Some(json!({ "choice": "lizard" }))).await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_math_duel_flow() {
        let app = app().await;

        let (status, _) =
            call(&app, Method::POST, "/v1/arcade/math/answer", Some(json!({ "answer": "3" }))).await;
        assert_eq!(status, 409);

        let (_, duel) = call(&app, Method::POST, "/v1/arcade/math/restart", None).await;
        assert_eq!(duel["time_left"], 15);
        assert_eq!(duel["state"], "running");

        let (status, body) =
            call(&app, Method::POST, "/v1/arcade/math/answer", Some(json!({ "answer": "nope" }))).await;
        assert_eq!(status, 200);
        assert_eq!(body["result"], "incorrect");

        let (status, _) = call(&app, Method::POST, "/v1/arcade/exit", None).await;
        assert_eq!(status, 204);
        let (_, duel) = call(&app, Method::GET, "/v1/arcade/math", None).await;
        assert!(duel.is_null());
    }
}
