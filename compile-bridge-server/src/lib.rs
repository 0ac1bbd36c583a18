use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use compile_bridge::{BridgeConfig, CompileRequest, CompileRunResult, CompileService};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] compile_bridge::Error),
    #[error("Server error: {0}")]
    ServerError(String),
}

#[derive(Clone)]
pub struct AppState {
    service: CompileService,
}

/// Builds the service from `config` and returns the router
pub fn create_app(config: BridgeConfig) -> Result<Router, ServerError> {
    let service = CompileService::new(config)?;
    Ok(router(service))
}

pub fn router(service: CompileService) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/health", get(health_check))
        .route("/compile", post(compile))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), ServerError> {
    info!("Compiler server running at http://{}", addr);
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::ServerError(e.to_string()))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::ServerError(e.to_string()))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received shutdown signal");
    }
}

async fn health_check() -> &'static str {
    "OK"
}

/// Always answers 200; failures are reported through `ok` and `errors`
async fn compile(
    State(state): State<AppState>,
    payload: Result<Json<CompileRequest>, JsonRejection>,
) -> Json<CompileRunResult> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected request body: {}", rejection.body_text());
            let err = compile_bridge::Error::InvalidRequest(rejection.body_text());
            return Json(CompileRunResult::fatal(err.to_string()));
        }
    };

    Json(state.service.execute(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use compile_bridge::{Diagnostic, ToolchainConfig};
    use tempfile::tempdir;
    use tower::ServiceExt;

    fn test_app(base_dir: &std::path::Path) -> Router {
        let toolchain = ToolchainConfig::kotlin()
            .with_compiler("/nonexistent/bin/kotlinc")
            .with_runtime("/nonexistent/bin/java");
        create_app(BridgeConfig::new(base_dir).with_toolchain(toolchain))
            .expect("Failed to create app")
    }

    fn post_compile(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/compile")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn read_result(response: Response) -> CompileRunResult {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = tempdir().unwrap();
        let response = test_app(dir.path())
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let request = CompileRequest::new("Main.java", "class Main {}");

        let response = test_app(dir.path())
            .oneshot(post_compile(serde_json::to_string(&request).unwrap()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let result = read_result(response).await;
        assert!(!result.ok);
        assert_eq!(result.output, "");
        assert_eq!(
            result.errors,
            vec![Diagnostic::new(0, "Only .kt files are supported")]
        );
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let dir = tempdir().unwrap();

        for body in ["not json", r#"{"fileName": 42}"#, r#"{"code": "fun"#] {
            let response = test_app(dir.path())
                .oneshot(post_compile(body))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let result = read_result(response).await;
            assert!(!result.ok);
            assert_eq!(result.errors.len(), 1);
            assert_eq!(result.errors[0].line, 0);
            assert!(result.errors[0].message.starts_with("Invalid request body"));
        }
    }

    #[tokio::test]
    async fn test_missing_toolchain_is_reported() {
        let dir = tempdir().unwrap();

        let response = test_app(dir.path())
            .oneshot(post_compile(r#"{"fileName":"Main.kt","code":"fun main() {}"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let result = read_result(response).await;
        assert!(!result.ok);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].line, 0);
        assert!(result.errors[0].message.contains("/nonexistent/bin/kotlinc"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_defaults_apply_to_missing_fields() {
        let dir = tempdir().unwrap();

        // fileName defaults to Main.kt, so this reaches the (missing) compiler
        let response = test_app(dir.path())
            .oneshot(post_compile("{}"))
            .await
            .unwrap();

        let result = read_result(response).await;
        assert!(!result.ok);
        assert!(result.errors[0].message.contains("kotlinc"));
    }
}
