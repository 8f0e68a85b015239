use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use subtle::ConstantTimeEq;
use tower_http::limit::RequestBodyLimitLayer;

use super::handlers::{health_handler, solve_handler};
use super::server::AppState;

#[derive(Clone)]
struct AuthConfig {
    access_code: Option<String>,
}

pub(crate) fn build_router(
    state: AppState,
    access_code: Option<String>,
    max_body_size: usize,
) -> Router {
    let auth_cfg = AuthConfig { access_code };

    let protected = Router::new()
        .route("/api/solve", post(solve_handler))
        .layer(middleware::from_fn_with_state(auth_cfg, auth_middleware))
        .layer(RequestBodyLimitLayer::new(max_body_size));

    Router::new()
        .route("/health", get(health_handler))
        .merge(protected)
        .with_state(state)
}

async fn auth_middleware(
    axum::extract::State(cfg): axum::extract::State<AuthConfig>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(ref expected) = cfg.access_code {
        let auth_header = req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok());

        let code = auth_header
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap_or("");

        // Hash both values to fixed-length digests to avoid leaking code length
        let code_hash = blake3::hash(code.as_bytes());
        let expected_hash = blake3::hash(expected.as_bytes());
        if !bool::from(code_hash.as_bytes().ct_eq(expected_hash.as_bytes())) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use http_body_util::BodyExt;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use tower::ServiceExt;
    use tutorlens_core::Solver;
    use tutorlens_core::solver::SolverSettings;
    use tutorlens_llm::LlmError;
    use tutorlens_llm::any::AnyProvider;
    use tutorlens_llm::mock::MockProvider;

    use super::*;
    use crate::server::AppState;

    fn analysis_json() -> String {
        serde_json::json!({
            "answer": "x = 5",
            "explanation": "Subtract 3 from both sides.",
            "quiz": {
                "question": "Solve 2y + 1 = 7. What is y?",
                "options": ["1", "2", "3", "4"],
                "correctIndex": 2,
                "explanation": "2y = 6 so y = 3."
            }
        })
        .to_string()
    }

    fn make_router(mock: MockProvider, access_code: Option<String>) -> Router {
        let solver = Solver::new(AnyProvider::Mock(mock), SolverSettings::default());
        build_router(AppState::new(Arc::new(solver)), access_code, 1_048_576)
    }

    fn solve_request(auth: Option<&str>) -> Request<Body> {
        let body = serde_json::json!({
            "image": BASE64.encode(b"fake image bytes"),
            "lang": "en"
        });
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/solve")
            .header("content-type", "application/json");
        if let Some(code) = auth {
            builder = builder.header("authorization", format!("Bearer {code}"));
        }
        builder
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let app = make_router(MockProvider::default(), None);
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 200);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn solve_returns_analysis() {
        let mock = MockProvider::with_script(vec![Ok(analysis_json())]);
        let app = make_router(mock, None);

        let resp = app.oneshot(solve_request(None)).await.unwrap();
        assert_eq!(resp.status(), 200);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["answer"], "x = 5");
        assert_eq!(json["quiz"]["correctIndex"], 2);
    }

    #[tokio::test]
    async fn invalid_base64_is_bad_request() {
        let app = make_router(MockProvider::default(), None);
        let body = serde_json::json!({"image": "!!! not base64 !!!"});
        let req = Request::builder()
            .method("POST")
            .uri("/api/solve")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn quota_error_maps_to_429() {
        let mock = MockProvider::with_script(vec![Err(LlmError::QuotaExceeded)]);
        let app = make_router(mock, None);

        let resp = app.oneshot(solve_request(None)).await.unwrap();
        assert_eq!(resp.status(), 429);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "quota");
    }

    #[tokio::test]
    async fn auth_error_maps_to_502_with_localized_message() {
        let mock = MockProvider::with_script(vec![Err(LlmError::Auth)]);
        let app = make_router(mock, None);

        let body = serde_json::json!({
            "image": BASE64.encode(b"img"),
            "lang": "zh"
        });
        let req = Request::builder()
            .method("POST")
            .uri("/api/solve")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 502);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "auth");
        assert!(json["message"].as_str().unwrap().contains("无效"));
    }

    #[tokio::test]
    async fn garbled_model_output_maps_to_502_parse() {
        let mock = MockProvider::with_script(vec![Ok("```json not json".into())]);
        let app = make_router(mock, None);

        let resp = app.oneshot(solve_request(None)).await.unwrap();
        assert_eq!(resp.status(), 502);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "parse");
    }

    #[tokio::test]
    async fn auth_rejects_missing_code() {
        let app = make_router(MockProvider::default(), Some("secret".into()));
        let resp = app.oneshot(solve_request(None)).await.unwrap();
        assert_eq!(resp.status(), 401);
    }

    #[tokio::test]
    async fn auth_rejects_wrong_code() {
        let app = make_router(MockProvider::default(), Some("secret".into()));
        let resp = app.oneshot(solve_request(Some("wrong"))).await.unwrap();
        assert_eq!(resp.status(), 401);
    }

    #[tokio::test]
    async fn auth_accepts_valid_code() {
        let mock = MockProvider::with_script(vec![Ok(analysis_json())]);
        let app = make_router(mock, Some("secret".into()));
        let resp = app.oneshot(solve_request(Some("secret"))).await.unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn health_skips_auth() {
        let app = make_router(MockProvider::default(), Some("secret".into()));
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn new_solve_supersedes_pending_one() {
        let gate = Arc::new(tokio::sync::Notify::new());
        let mock = MockProvider::with_script(vec![Ok(analysis_json()), Ok(analysis_json())])
            .with_gates(vec![gate.clone()]);
        let app = make_router(mock.clone(), None);

        // First request parks inside the provider until the gate fires.
        let first = tokio::spawn({
            let app = app.clone();
            async move { app.oneshot(solve_request(None)).await.unwrap() }
        });
        while mock.calls().is_empty() {
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let second = app.oneshot(solve_request(None)).await.unwrap();
        assert_eq!(second.status(), 200);

        let first = first.await.unwrap();
        assert_eq!(first.status(), 409);
        let body = first.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "superseded");
        assert!(
            json["message"]
                .as_str()
                .unwrap()
                .contains("superseded")
        );
    }

    #[tokio::test]
    async fn body_size_limit() {
        let mock = MockProvider::default();
        let solver = Solver::new(AnyProvider::Mock(mock), SolverSettings::default());
        let app = build_router(AppState::new(Arc::new(solver)), None, 64);
        let oversized = vec![b'a'; 128];
        let req = Request::builder()
            .method("POST")
            .uri("/api/solve")
            .header("content-type", "application/json")
            .body(Body::from(oversized))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 413);
    }
}
