use signup_service::{
    AppState, build_router,
    config::SignupConfig,
    db,
    portals::PortalMap,
    services::{AdminApiClient, Database, IdentityProvider, SignupService, SignupStore},
};

use service_core::middleware::rate_limit::create_ip_rate_limiter;
use service_core::observability::{init_tracing, install_metrics_recorder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = SignupConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    let metrics = install_metrics_recorder();

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting signup service"
    );

    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;

    let store: Arc<dyn SignupStore> = Arc::new(Database::new(pool));
    let identity: Arc<dyn IdentityProvider> = Arc::new(AdminApiClient::new(&config.identity)?);
    let portals = PortalMap::from_config(&config.portals);
    if portals.is_empty() {
        tracing::warn!("no portal identifiers configured; portal/role binding is disabled");
    }

    let signup = SignupService::new(
        store.clone(),
        identity,
        portals,
        config.security.strict_portal_match,
    );

    let signup_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.signup_attempts,
        config.rate_limit.signup_window_seconds,
    );
    let ip_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.global_ip_limit,
        config.rate_limit.global_ip_window_seconds,
    );

    let state = AppState {
        config: config.clone(),
        store,
        signup,
        metrics,
        signup_rate_limiter,
        ip_rate_limiter,
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
