//! Health check and service metadata

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::http::server::AppState;

/// Health check response
///
/// Always served with 200; a failing store shows up as `"unhealthy"`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let response = match state.employees.ping().await {
        Ok(()) => HealthResponse {
            status: "healthy",
            database: Some("connected"),
            error: None,
        },
        Err(err) => {
            tracing::warn!(error = %err, "store ping failed");
            HealthResponse {
                status: "unhealthy",
                database: None,
                error: Some(err.to_string()),
            }
        }
    };

    Json(response)
}

/// GET /
async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Employee Management API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/", get(root))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn root_names_the_api() {
        let Json(body) = root().await;
        assert_eq!(body.message, "Employee Management API");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn unhealthy_body_omits_database() {
        let body = serde_json::to_value(HealthResponse {
            status: "unhealthy",
            database: None,
            error: Some("connection refused".into()),
        })
        .unwrap();

        assert_eq!(body, serde_json::json!({ "status": "unhealthy", "error": "connection refused" }));
    }
}
