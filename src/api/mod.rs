pub mod dto;
pub mod errors;
pub mod handlers;

use std::time::Instant;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tracing::info;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::{settings::SettingsService, telemetry::TelemetryService};
use handlers::ApiDoc;

/// Shared per-request state: the two services, each holding a clone of the
/// process-wide pool. No state survives between requests.
#[derive(Clone)]
pub struct AppState {
    pub settings: SettingsService,
    pub telemetry: TelemetryService,
}

pub fn router(pool: PgPool) -> Router {
    let state = AppState {
        settings: SettingsService::new(pool.clone()),
        telemetry: TelemetryService::new(pool),
    };

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route(
            "/settings",
            get(handlers::get_settings).post(handlers::update_settings),
        )
        .route("/data", post(handlers::record_reading))
        .route("/latest", get(handlers::get_latest))
        .route("/history", get(handlers::get_history))
        .route("/stats", get(handlers::get_stats))
        .with_state(state)
        .split_for_parts();

    router
        .route("/", get(handlers::alive))
        .route("/ping", get(handlers::ping))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
        .layer(middleware::from_fn(log_requests))
}

/// Logs every request once it completes: method, path, status, latency.
async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(req).await;

    info!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Request handled"
    );
    response
}
