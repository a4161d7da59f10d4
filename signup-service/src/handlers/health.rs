use axum::{Json, extract::State};
use service_core::error::AppError;

use crate::AppState;

/// Service health check: pings application storage.
///
/// GET /health
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.ping().await.map_err(|err| {
        tracing::error!(error = %err, "storage health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "postgres": "up"
        }
    })))
}
