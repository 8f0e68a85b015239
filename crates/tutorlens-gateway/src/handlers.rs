use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tutorlens_core::solver::SolveError;
use tutorlens_core::{Language, locale};
use tutorlens_llm::LlmError;

use super::server::AppState;

#[derive(serde::Deserialize)]
pub(crate) struct SolvePayload {
    /// Base64-encoded image bytes.
    pub image: String,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default)]
    pub lang: Option<Language>,
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
}

pub(crate) async fn solve_handler(
    State(state): State<AppState>,
    Json(payload): Json<SolvePayload>,
) -> Response {
    let lang = payload.lang.unwrap_or_default();

    let image = match BASE64.decode(payload.image.as_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("rejecting undecodable image payload: {e}");
            let message = match lang {
                Language::En => "Invalid image data.".to_owned(),
                Language::Zh => "图片数据无效。".to_owned(),
            };
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    error: "bad_request",
                    message,
                }),
            )
                .into_response();
        }
    };
    let mime = payload.mime.unwrap_or_else(|| "image/jpeg".to_owned());

    // Run the solve on its own task so a newer request can cancel it.
    let solver = Arc::clone(&state.solver);
    let task = tokio::spawn(async move { solver.solve(&image, &mime, lang).await });
    {
        let mut in_flight = state.in_flight.lock().await;
        if let Some(previous) = in_flight.replace(task.abort_handle()) {
            previous.abort();
        }
    }

    match task.await {
        Ok(Ok(analysis)) => Json(analysis).into_response(),
        Ok(Err(err)) => solve_error_response(&err, lang),
        Err(join_err) if join_err.is_cancelled() => {
            let message = match lang {
                Language::En => "Request superseded by a newer one.".to_owned(),
                Language::Zh => "该请求已被更新的请求取代。".to_owned(),
            };
            (
                StatusCode::CONFLICT,
                Json(ErrorBody {
                    error: "superseded",
                    message,
                }),
            )
                .into_response()
        }
        Err(join_err) => {
            tracing::error!("solve task failed: {join_err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn solve_error_response(err: &SolveError, lang: Language) -> Response {
    let (status, kind) = match err {
        SolveError::MissingApiKey => (StatusCode::INTERNAL_SERVER_ERROR, "config"),
        SolveError::Normalize(_) => (StatusCode::BAD_GATEWAY, "parse"),
        SolveError::Llm(llm) if llm.is_network() => (StatusCode::GATEWAY_TIMEOUT, "network"),
        SolveError::Llm(LlmError::Auth) => (StatusCode::BAD_GATEWAY, "auth"),
        SolveError::Llm(LlmError::QuotaExceeded) => (StatusCode::TOO_MANY_REQUESTS, "quota"),
        SolveError::Llm(LlmError::ModelNotFound { .. }) => {
            (StatusCode::BAD_GATEWAY, "model_not_found")
        }
        SolveError::Llm(LlmError::Json(_)) => (StatusCode::BAD_GATEWAY, "parse"),
        SolveError::Llm(_) => (StatusCode::BAD_GATEWAY, "api"),
    };
    tracing::warn!(kind, "solve request failed: {err}");
    (
        status,
        Json(ErrorBody {
            error: kind,
            message: locale::user_message(err, lang),
        }),
    )
        .into_response()
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}
