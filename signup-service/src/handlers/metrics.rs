use axum::extract::State;

use crate::AppState;

/// Prometheus exposition of the counters and histograms recorded by the
/// metrics middleware.
///
/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}
