use crate::cli::ServeArgs;
use crate::infra::{seed_moderation_data, AppState, LogNotifier};
use crate::routes::with_moderation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use campus_moderation::config::AppConfig;
use campus_moderation::error::AppError;
use campus_moderation::moderation::{InMemoryModerationStore, ModerationOrchestrator};
use campus_moderation::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryModerationStore::new());
    let orchestrator = Arc::new(ModerationOrchestrator::new(
        store.clone(),
        Arc::new(LogNotifier),
        config.moderation,
    ));

    if args.seed {
        seed_moderation_data(&store, &orchestrator)?;
    }

    let app = with_moderation_routes(orchestrator)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        page_size = config.moderation.page_size,
        seeded = args.seed,
        "moderation service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
