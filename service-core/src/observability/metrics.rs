pub use metrics_exporter_prometheus::PrometheusHandle;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the global Prometheus recorder and return the handle the
/// `/metrics` endpoint renders from.
///
/// When a global recorder is already installed (several apps in one
/// process, as in integration tests) a detached recorder is handed out
/// instead so callers still get a working handle.
pub fn install_metrics_recorder() -> PrometheusHandle {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(err) => {
            tracing::warn!(error = %err, "metrics recorder already installed; using detached recorder");
            PrometheusBuilder::new().build_recorder().handle()
        }
    }
}
