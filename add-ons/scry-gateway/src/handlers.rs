//! HTTP surface: the chat page plus `get_profile`, `update_profile` and `ask`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use scry_core::{ExchangeOutcome, Orchestrator, Profile, ScryError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub response: String,
    pub outcome: ExchangeOutcome,
}

type ApiError = (StatusCode, Json<Value>);

fn api_error(err: ScryError) -> ApiError {
    if err.is_invalid_input() {
        tracing::info!(error = %err, "rejected profile update");
        (StatusCode::BAD_REQUEST, Json(json!({ "status": "rejected", "error": err.to_string() })))
    } else {
        tracing::error!(error = %err, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "error", "error": err.to_string() })),
        )
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/health", get(health))
        .route("/get_profile", get(get_profile))
        .route("/update_profile", post(update_profile))
        .route("/ask", post(ask))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Chat page: profile sliders, depth/goal selectors and the transcript.
async fn serve_index() -> Html<&'static str> {
    const INDEX: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/index.html"));
    Html(INDEX)
}

async fn health() -> &'static str {
    "OK"
}

async fn get_profile(State(state): State<AppState>) -> Json<Profile> {
    Json(state.orchestrator.profile().await)
}

/// POST /update_profile: allow-listed merge. Unknown keys are ignored; a bad value rejects the whole body.
async fn update_profile(
    State(state): State<AppState>,
    Json(fields): Json<serde_json::Map<String, Value>>,
) -> Result<Json<Value>, ApiError> {
    let report = state.orchestrator.update_settings(&fields).await.map_err(api_error)?;
    Ok(Json(json!({
        "status": "updated",
        "updated": report.updated,
        "ignored": report.ignored,
    })))
}

/// POST /ask: blocks for the model run. If the client goes away the run is cancelled.
async fn ask(State(state): State<AppState>, Json(body): Json<AskRequest>) -> Result<Json<AskResponse>, ApiError> {
    let reply = state.orchestrator.ask(&body.question).await.map_err(api_error)?;
    Ok(Json(AskResponse {
        response: reply.text,
        outcome: reply.outcome,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use scry_core::{MockBackend, ModelReply, ProfileStore};
    use tower::ServiceExt;

    fn test_state(dir: &tempfile::TempDir, reply: ModelReply) -> AppState {
        let store = ProfileStore::new(dir.path().join("profile.json"));
        let orchestrator = Orchestrator::open(store, Arc::new(MockBackend::replying(reply))).unwrap();
        AppState {
            orchestrator: Arc::new(orchestrator),
        }
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(res: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_index_serves_page() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(&dir, ModelReply::answer("ok")));
        let res = app.oneshot(get_request("/")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Spirit Scry"));
        assert!(html.contains("/update_profile"));
    }

    #[tokio::test]
    async fn test_get_profile_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(&dir, ModelReply::answer("ok")));
        let res = app.oneshot(get_request("/get_profile")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["depth"], 2);
        assert_eq!(json["goal"], "understanding");
        assert_eq!(json["conversation_history"], json!([]));
    }

    #[tokio::test]
    async fn test_update_goal_leaves_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(&dir, ModelReply::answer("ok")));

        let res = app
            .clone()
            .oneshot(json_request("POST", "/update_profile", json!({ "goal": "practice" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["status"], "updated");
        assert_eq!(json["updated"], json!(["goal"]));

        let res = app.oneshot(get_request("/get_profile")).await.unwrap();
        let profile = body_json(res).await;
        assert_eq!(profile["goal"], "practice");
        assert_eq!(profile["scientific"], 3);
        assert_eq!(profile["mystical"], 3);
        assert_eq!(profile["philosophical"], 3);
        assert_eq!(profile["depth"], 2);
        assert_eq!(profile["conversation_history"], json!([]));
    }

    #[tokio::test]
    async fn test_update_rejects_bad_value_and_ignores_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, ModelReply::answer("ok"));
        let app = router(state.clone());

        let res = app
            .clone()
            .oneshot(json_request("POST", "/update_profile", json!({ "depth": "deep", "goal": "counsel" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res).await["status"], "rejected");
        assert_eq!(state.orchestrator.profile().await.goal, "understanding");

        let res = app
            .oneshot(json_request(
                "POST",
                "/update_profile",
                json!({ "mystical": 12, "conversation_history": "wiped" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["ignored"], json!(["conversation_history"]));
        assert_eq!(state.orchestrator.profile().await.mystical, 5);
    }

    #[tokio::test]
    async fn test_slider_update_keeps_hand_edited_goal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("profile.json"), r#"{"goal": "enlightenment"}"#).unwrap();
        let state = test_state(&dir, ModelReply::answer("ok"));
        let app = router(state.clone());

        let res = app.clone().oneshot(get_request("/")).await.unwrap();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("if (goal) {"), "page must not send an empty goal");

        let res = app
            .oneshot(json_request(
                "POST",
                "/update_profile",
                json!({ "scientific": 4, "mystical": 3, "philosophical": 3, "depth": 3 }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let profile = state.orchestrator.profile().await;
        assert_eq!(profile.depth, 3);
        assert_eq!(profile.goal, "enlightenment");
    }

    #[tokio::test]
    async fn test_ask_returns_and_records_response() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, ModelReply::answer("You are the witness."));
        let app = router(state.clone());

        let res = app
            .oneshot(json_request("POST", "/ask", json!({ "question": "What is the self?" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["response"], "You are the witness.");
        assert_eq!(json["outcome"], "answer");

        let history = state.orchestrator.store().load().unwrap().conversation_history;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].question, "What is the self?");
    }

    #[tokio::test]
    async fn test_ask_without_question_uses_empty_string() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, ModelReply::failed("Error: model not found"));
        let app = router(state.clone());

        let res = app.oneshot(json_request("POST", "/ask", json!({}))).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["response"], "Error: model not found");
        assert_eq!(json["outcome"], "error");
        assert_eq!(state.orchestrator.profile().await.conversation_history[0].question, "");
    }
}
