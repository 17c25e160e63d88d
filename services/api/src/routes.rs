use crate::infra::AppState;
use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use campus_moderation::moderation::{
    compute_window, moderation_router, ModerationOrchestrator, ModerationStore, Notifier,
    PageToken,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct WindowQuery {
    pub(crate) current: u32,
    pub(crate) total: u32,
    #[serde(default)]
    pub(crate) max_visible: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WindowResponse {
    pub(crate) current_page: u32,
    pub(crate) total_pages: u32,
    pub(crate) max_visible: u32,
    pub(crate) window: Vec<PageToken>,
}

pub(crate) fn with_moderation_routes<S, N>(
    orchestrator: Arc<ModerationOrchestrator<S, N>>,
) -> axum::Router
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let max_visible = orchestrator.config().max_visible_pages;

    moderation_router(orchestrator)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/pagination/window",
            axum::routing::get(move |query: Query<WindowQuery>| {
                window_endpoint(query, max_visible)
            }),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Renders a page bar for arbitrary counts; the console uses it for client-side lists.
pub(crate) async fn window_endpoint(
    Query(query): Query<WindowQuery>,
    default_max_visible: u32,
) -> Json<WindowResponse> {
    let max_visible = query.max_visible.unwrap_or(default_max_visible).max(1);
    let current_page = query.current.clamp(1, query.total.max(1));

    Json(WindowResponse {
        current_page,
        total_pages: query.total,
        max_visible,
        window: compute_window(current_page, query.total, max_visible),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use campus_moderation::config::ModerationConfig;
    use campus_moderation::moderation::{InMemoryModerationStore, SilentNotifier};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app(ready: bool) -> axum::Router {
        let orchestrator = Arc::new(ModerationOrchestrator::new(
            Arc::new(InMemoryModerationStore::new()),
            Arc::new(SilentNotifier),
            ModerationConfig::default(),
        ));
        let recorder = PrometheusBuilder::new().build_recorder();
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(recorder.handle()),
        };
        state.readiness.store(ready, Ordering::Release);

        with_moderation_routes(orchestrator).layer(Extension(state))
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_follows_the_flag() {
        let response = app(false)
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["status"], "initializing");

        let response = app(true)
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_use_prometheus_text_format() {
        let response = app(true)
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }

    #[tokio::test]
    async fn window_endpoint_collapses_long_gaps() {
        let response = app(true)
            .oneshot(
                Request::get("/api/v1/pagination/window?current=7&total=20")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["maxVisible"], 5);
        assert_eq!(
            body["window"],
            json!([1, "…", 5, 6, 7, 8, 9, "…", 20])
        );
    }

    #[tokio::test]
    async fn window_endpoint_clamps_current_page() {
        let Json(body) = window_endpoint(
            Query(WindowQuery {
                current: 0,
                total: 3,
                max_visible: Some(5),
            }),
            5,
        )
        .await;
        assert_eq!(body.current_page, 1);
        assert_eq!(body.window.len(), 3);
    }

    #[tokio::test]
    async fn moderation_routes_are_mounted() {
        let response = app(true)
            .oneshot(
                Request::get("/api/v1/admin/statistics")
                    .header("x-actor-id", "mod-1")
                    .header("x-actor-role", "moderator")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["total_content"], 0);
    }
}
