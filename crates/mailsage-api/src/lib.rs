//! HTTP surface for the mailsage ask pipeline.
//!
//! One substantive route: `POST /ask`. Session auth is checked before any
//! work begins (401); a missing generation-service credential is a request
//! failure (500); recoverable pipeline errors never change the response
//! shape.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{error, info};

use mailsage_core::{AskRequest, AskResponse, Question};
use mailsage_pipeline::AskPipeline;

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// `None` when the generation-service credential is not configured;
    /// `POST /ask` then answers 500.
    pub pipeline: Option<Arc<AskPipeline>>,
    /// The configured session bearer token. `None` means no session exists
    /// and every `/ask` request is rejected with 401.
    pub session_token: Option<String>,
    /// Identity attached to questions from this session.
    pub user_id: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Build the router. `/health` is unauthenticated; everything else sits
/// behind the session check.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/ask", post(ask))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ))
        .route("/health", get(health))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Session check, before any work begins.
async fn require_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let authorized = match (state.session_token.as_deref(), presented) {
        (Some(expected), Some(token)) => token == expected,
        _ => false,
    };

    if !authorized {
        return error_response(StatusCode::UNAUTHORIZED, "authentication required");
    }
    next.run(request).await
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

async fn ask(State(state): State<AppState>, Json(request): Json<AskRequest>) -> Response {
    let Some(pipeline) = state.pipeline.clone() else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "generation service credential not configured",
        );
    };

    let text = request.question.trim();
    if text.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "question must not be empty");
    }

    let question = Question::new(text, state.user_id.clone());
    info!(user_id = %question.user_id, "Handling ask request");

    match pipeline.ask(&question).await {
        Ok(outcome) => (StatusCode::OK, Json(AskResponse::from(outcome))).into_response(),
        Err(e) => {
            error!(error = %e, "Ask request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}
