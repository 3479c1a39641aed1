use crate::config::ServiceConfig;
use crate::core::retriever::GitHubRetriever;
use crate::core::triage::TriageEngine;
use crate::core::{IssueSource, TriageVerdict};
use crate::utils::error::{ErrorCategory, Result, TriageError};
use crate::utils::validation::validate_socket_addr;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Deserialize)]
pub struct AnalyzeParams {
    pub repo_url: String,
    pub issue_number: u64,
}

pub struct AppState<S: IssueSource> {
    engine: Arc<TriageEngine<S>>,
    api_key: Arc<str>,
}

impl<S: IssueSource> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            api_key: Arc::clone(&self.api_key),
        }
    }
}

impl<S: IssueSource> AppState<S> {
    pub fn new(engine: TriageEngine<S>, api_key: impl Into<String>) -> Self {
        Self {
            engine: Arc::new(engine),
            api_key: Arc::from(api_key.into()),
        }
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<()> {
        let provided = headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok());

        match provided {
            Some(key) if bool::from(key.as_bytes().ct_eq(self.api_key.as_bytes())) => Ok(()),
            _ => Err(TriageError::Unauthorized),
        }
    }
}

pub fn router<S: IssueSource + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/analyze", get(analyze::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Authenticating → Processing → Responding. The credential is checked
/// before the query string is even looked at.
async fn analyze<S: IssueSource + 'static>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    query: std::result::Result<Query<AnalyzeParams>, QueryRejection>,
) -> std::result::Result<Json<TriageVerdict>, TriageError> {
    state.authorize(&headers)?;

    let Query(params) = query.map_err(|rejection| TriageError::InvalidQuery {
        message: rejection.body_text(),
    })?;

    let verdict = state
        .engine
        .run(&params.repo_url, params.issue_number)
        .await?;

    Ok(Json(verdict))
}

pub fn status_for(err: &TriageError) -> StatusCode {
    if err.is_timeout() {
        return StatusCode::GATEWAY_TIMEOUT;
    }
    match err.category() {
        ErrorCategory::Auth => StatusCode::UNAUTHORIZED,
        ErrorCategory::Input => StatusCode::BAD_REQUEST,
        ErrorCategory::Upstream => StatusCode::BAD_GATEWAY,
        ErrorCategory::Internal | ErrorCategory::Configuration => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for TriageError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            error!("Request failed with {}: {}", status, self);
        } else {
            warn!("Request rejected with {}: {}", status, self);
        }
        (status, self.to_string()).into_response()
    }
}

pub async fn serve(config: ServiceConfig) -> Result<()> {
    let addr = validate_socket_addr("bind_address", &config.bind_address)?;
    let retriever = GitHubRetriever::new(&config.github)?;
    let state = AppState::new(TriageEngine::new(retriever), config.api_key);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🚀 Listening on http://{}", addr);
    info!("GitHub API base: {}", config.github.api_base);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
