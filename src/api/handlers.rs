use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::debug;
use utoipa::OpenApi;

use super::{
    dto::{
        NewReadingRequest, SensorReadingDto, SettingsDto, StatsResponse, UpdateSettingsRequest,
        UpdateSettingsResponse,
    },
    errors::ApiError,
    AppState,
};
use crate::db::models::MotorStatus;

// ---------------------------------------------------------------------------
// Liveness
// ---------------------------------------------------------------------------

/// Plain-text liveness probe used by the controller's connectivity check.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is up", body = String)),
    tag = "system"
)]
pub async fn alive() -> &'static str {
    "Server is ALIVE"
}

#[utoipa::path(
    get,
    path = "/ping",
    responses((status = 200, description = "Service is up", body = String)),
    tag = "system"
)]
pub async fn ping() -> &'static str {
    "pong"
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Apply a partial settings update from the companion app. Fields omitted
/// from the body keep their stored value; sending `cropType` re-derives the
/// moisture thresholds.
#[utoipa::path(
    post,
    path = "/settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Updated settings document", body = UpdateSettingsResponse),
        (status = 400, description = "Malformed request body"),
        (status = 500, description = "Persistence failure"),
    ),
    tag = "settings"
)]
pub async fn update_settings(
    State(state): State<AppState>,
    payload: Result<Json<UpdateSettingsRequest>, JsonRejection>,
) -> Result<Json<UpdateSettingsResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;

    let settings = state.settings.update(req.into()).await?;
    Ok(Json(UpdateSettingsResponse {
        message: "Settings Updated".to_owned(),
        settings: settings.into(),
    }))
}

/// Serve the configuration to the controller. Before anything was ever
/// configured this returns a hardcoded default object, which deliberately
/// has fewer fields than a stored document.
#[utoipa::path(
    get,
    path = "/settings",
    responses(
        (status = 200, description = "Stored settings, or defaults when none exist", body = SettingsDto),
        (status = 500, description = "Persistence failure"),
    ),
    tag = "settings"
)]
pub async fn get_settings(State(state): State<AppState>) -> Result<Response, ApiError> {
    let response = match state.settings.fetch().await? {
        Some(settings) => Json(SettingsDto::from(settings)).into_response(),
        None => {
            debug!("No settings stored; serving defaults");
            Json(json!({
                "latitude": 16.3,
                "longitude": 80.4,
                "minMoisture": 40,
                "maxMoisture": 70,
            }))
            .into_response()
        }
    };
    Ok(response)
}

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

/// Ingest one telemetry sample. The disease-risk flag is always derived
/// server-side; nothing is persisted when validation fails.
#[utoipa::path(
    post,
    path = "/data",
    request_body = NewReadingRequest,
    responses(
        (status = 201, description = "Reading persisted", body = String),
        (status = 400, description = "Malformed or unknown fields in payload"),
        (status = 500, description = "Persistence failure"),
    ),
    tag = "telemetry"
)]
pub async fn record_reading(
    State(state): State<AppState>,
    payload: Result<Json<NewReadingRequest>, JsonRejection>,
) -> Result<(StatusCode, &'static str), ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;

    if req.disease_risk.is_some() {
        debug!("Client-supplied diseaseRisk ignored; the flag is derived server-side");
    }

    state.telemetry.record(req.into()).await?;
    Ok((StatusCode::CREATED, "Saved"))
}

/// The most recent reading by sample time; `{}` when nothing was recorded yet.
#[utoipa::path(
    get,
    path = "/latest",
    responses(
        (status = 200, description = "Latest reading, or an empty object", body = SensorReadingDto),
        (status = 500, description = "Persistence failure"),
    ),
    tag = "telemetry"
)]
pub async fn get_latest(State(state): State<AppState>) -> Result<Response, ApiError> {
    let response = match state.telemetry.latest().await? {
        Some(reading) => Json(SensorReadingDto::from(reading)).into_response(),
        None => Json(json!({})).into_response(),
    };
    Ok(response)
}

/// All readings, time-ascending, for the companion app's charts.
#[utoipa::path(
    get,
    path = "/history",
    responses(
        (status = 200, description = "All readings, time-ascending", body = Vec<SensorReadingDto>),
        (status = 500, description = "Persistence failure"),
    ),
    tag = "telemetry"
)]
pub async fn get_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<SensorReadingDto>>, ApiError> {
    let readings = state.telemetry.history().await?;
    Ok(Json(readings.into_iter().map(Into::into).collect()))
}

/// Share of readings where irrigation was skipped because rain was likely.
#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Water-saving statistics", body = StatsResponse),
        (status = 500, description = "Persistence failure"),
    ),
    tag = "telemetry"
)]
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let water_saved_percent = state.telemetry.water_saved_percent().await?;
    Ok(Json(StatsResponse {
        water_saved_percent,
    }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        alive,
        ping,
        update_settings,
        get_settings,
        record_reading,
        get_latest,
        get_history,
        get_stats,
    ),
    components(schemas(
        NewReadingRequest,
        UpdateSettingsRequest,
        UpdateSettingsResponse,
        SensorReadingDto,
        SettingsDto,
        StatsResponse,
        MotorStatus,
    )),
    tags(
        (name = "settings", description = "Controller configuration"),
        (name = "telemetry", description = "Sensor readings and statistics"),
        (name = "system", description = "Liveness endpoints"),
    ),
    info(
        title = "Smart Irrigation API",
        version = "0.1.0",
        description = "REST API for the field irrigation controller and its companion app"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use sqlx::PgPool;

    use crate::api::router;

    fn test_server(pool: PgPool) -> TestServer {
        TestServer::new(router(pool)).unwrap()
    }

    async fn insert_reading(
        pool: &PgPool,
        motor_status: &str,
        precipitation: f64,
        moisture: f64,
        time: &str,
    ) {
        sqlx::query(
            "INSERT INTO sensor_readings (motor_status, precipitation, moisture, time) \
             VALUES ($1, $2, $3, $4::timestamptz)",
        )
        .bind(motor_status)
        .bind(precipitation)
        .bind(moisture)
        .bind(time)
        .execute(pool)
        .await
        .unwrap();
    }

    // -----------------------------------------------------------------------
    // Liveness
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn liveness_routes_respond_with_plain_text(pool: PgPool) {
        let server = test_server(pool);

        let resp = server.get("/").await;
        resp.assert_status_ok();
        resp.assert_text("Server is ALIVE");

        let resp = server.get("/ping").await;
        resp.assert_status_ok();
        resp.assert_text("pong");
    }

    // -----------------------------------------------------------------------
    // GET /settings
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn settings_defaults_when_nothing_stored(pool: PgPool) {
        let server = test_server(pool);
        let resp = server.get("/settings").await;
        resp.assert_status_ok();

        let body: Value = resp.json();
        assert_eq!(body["latitude"], 16.3);
        assert_eq!(body["longitude"], 80.4);
        assert_eq!(body["minMoisture"], 40);
        assert_eq!(body["maxMoisture"], 70);
        // The fallback shape carries no project metadata.
        assert!(body.get("projectName").is_none());
        assert!(body.get("cropType").is_none());
        assert!(body.get("lastUpdated").is_none());
    }

    // -----------------------------------------------------------------------
    // POST /settings
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn crop_type_sets_thresholds_from_table(pool: PgPool) {
        let server = test_server(pool);

        let resp = server
            .post("/settings")
            .json(&json!({ "cropType": "Tomato" }))
            .await;
        resp.assert_status_ok();

        let body: Value = resp.json();
        assert_eq!(body["message"], "Settings Updated");
        assert_eq!(body["settings"]["minMoisture"], 40.0);
        assert_eq!(body["settings"]["maxMoisture"], 60.0);

        let body: Value = server.get("/settings").await.json();
        assert_eq!(body["cropType"], "Tomato");
        assert_eq!(body["minMoisture"], 40.0);
        assert_eq!(body["maxMoisture"], 60.0);
        assert_eq!(body["projectName"], "Smart Irrigation");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn unknown_crop_gets_generic_bracket(pool: PgPool) {
        let server = test_server(pool);

        let resp = server
            .post("/settings")
            .json(&json!({ "cropType": "Maize" }))
            .await;
        resp.assert_status_ok();

        let body: Value = resp.json();
        assert_eq!(body["settings"]["minMoisture"], 40.0);
        assert_eq!(body["settings"]["maxMoisture"], 70.0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn partial_update_keeps_other_fields(pool: PgPool) {
        let server = test_server(pool);

        server
            .post("/settings")
            .json(&json!({ "latitude": 1.5, "longitude": 2.5 }))
            .await
            .assert_status_ok();
        server
            .post("/settings")
            .json(&json!({ "projectName": "Field 7" }))
            .await
            .assert_status_ok();

        let body: Value = server.get("/settings").await.json();
        assert_eq!(body["latitude"], 1.5);
        assert_eq!(body["longitude"], 2.5);
        assert_eq!(body["projectName"], "Field 7");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn thresholds_untouched_when_crop_type_omitted(pool: PgPool) {
        let server = test_server(pool);

        server
            .post("/settings")
            .json(&json!({ "cropType": "Rice" }))
            .await
            .assert_status_ok();
        // A later update without cropType must not disturb the bracket.
        server
            .post("/settings")
            .json(&json!({ "latitude": 9.0 }))
            .await
            .assert_status_ok();

        let body: Value = server.get("/settings").await.json();
        assert_eq!(body["cropType"], "Rice");
        assert_eq!(body["minMoisture"], 60.0);
        assert_eq!(body["maxMoisture"], 80.0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn settings_rejects_mistyped_body(pool: PgPool) {
        let server = test_server(pool);

        let resp = server
            .post("/settings")
            .json(&json!({ "latitude": "north" }))
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = resp.json();
        assert!(body["error"].is_string());
    }

    // -----------------------------------------------------------------------
    // POST /data
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn reading_is_saved_and_served_as_latest(pool: PgPool) {
        let server = test_server(pool);

        let resp = server
            .post("/data")
            .json(&json!({
                "temperature": 25.5,
                "humidity": 45.0,
                "moisture": 35.0,
                "precipitation": 0.0,
                "motorStatus": "ON",
                "batteryLevel": 99.0,
                "savedWater": 0.0
            }))
            .await;
        resp.assert_status(StatusCode::CREATED);
        resp.assert_text("Saved");

        let body: Value = server.get("/latest").await.json();
        assert_eq!(body["temperature"], 25.5);
        assert_eq!(body["motorStatus"], "ON");
        assert_eq!(body["batteryLevel"], 99.0);
        assert_eq!(body["diseaseRisk"], "LOW");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn hot_and_humid_reading_is_flagged_high_risk(pool: PgPool) {
        let server = test_server(pool);

        server
            .post("/data")
            .json(&json!({
                "temperature": 30.0,
                "humidity": 90.0,
                "motorStatus": "OFF",
                "precipitation": 85.0
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let body: Value = server.get("/latest").await.json();
        assert_eq!(body["diseaseRisk"], "HIGH");

        // The same reading lands in the motor-off-while-raining bucket.
        let stats: Value = server.get("/stats").await.json();
        assert_eq!(stats["waterSavedPercent"], "100.00");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn missing_humidity_defaults_to_low_risk(pool: PgPool) {
        let server = test_server(pool);

        server
            .post("/data")
            .json(&json!({ "temperature": 30.0 }))
            .await
            .assert_status(StatusCode::CREATED);

        let body: Value = server.get("/latest").await.json();
        assert_eq!(body["diseaseRisk"], "LOW");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn client_supplied_disease_risk_is_recomputed(pool: PgPool) {
        let server = test_server(pool);

        server
            .post("/data")
            .json(&json!({
                "temperature": 10.0,
                "humidity": 20.0,
                "diseaseRisk": "HIGH"
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let body: Value = server.get("/latest").await.json();
        assert_eq!(body["diseaseRisk"], "LOW");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn unknown_fields_are_rejected_without_persisting(pool: PgPool) {
        let server = test_server(pool);

        let resp = server
            .post("/data")
            .json(&json!({ "temperature": 20.0, "sprinklerMode": "turbo" }))
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);

        let history: Value = server.get("/history").await.json();
        assert_eq!(history, json!([]));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn mistyped_fields_are_rejected(pool: PgPool) {
        let server = test_server(pool);

        let resp = server
            .post("/data")
            .json(&json!({ "temperature": "hot" }))
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = resp.json();
        assert!(body["error"].is_string());
    }

    // -----------------------------------------------------------------------
    // GET /latest
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn latest_empty_returns_empty_object(pool: PgPool) {
        let server = test_server(pool);
        let resp = server.get("/latest").await;
        resp.assert_status_ok();

        let body: Value = resp.json();
        assert_eq!(body, json!({}));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn latest_is_picked_by_time_not_insertion_order(pool: PgPool) {
        // Newest sample inserted first.
        insert_reading(&pool, "ON", 0.0, 2.0, "2024-06-01T00:00:00Z").await;
        insert_reading(&pool, "ON", 0.0, 1.0, "2024-01-01T00:00:00Z").await;

        let server = test_server(pool);
        let body: Value = server.get("/latest").await.json();
        assert_eq!(body["moisture"], 2.0);
    }

    // -----------------------------------------------------------------------
    // GET /history
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn history_is_sorted_by_time_ascending(pool: PgPool) {
        insert_reading(&pool, "ON", 0.0, 1.0, "2020-01-01T00:00:00Z").await;
        insert_reading(&pool, "ON", 0.0, 3.0, "2022-01-01T00:00:00Z").await;
        insert_reading(&pool, "ON", 0.0, 2.0, "2021-01-01T00:00:00Z").await;

        let server = test_server(pool);
        let body: Vec<Value> = server.get("/history").await.json();
        let order: Vec<f64> = body.iter().map(|r| r["moisture"].as_f64().unwrap()).collect();
        assert_eq!(order, vec![1.0, 2.0, 3.0]);
    }

    // -----------------------------------------------------------------------
    // GET /stats
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn stats_empty_returns_zero(pool: PgPool) {
        let server = test_server(pool);
        let body: Value = server.get("/stats").await.json();
        assert_eq!(body["waterSavedPercent"], "0.00");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn stats_counts_motor_off_during_rain(pool: PgPool) {
        // 3 of 10 readings have the motor off while precipitation > 80.
        insert_reading(&pool, "OFF", 85.0, 0.0, "2024-01-01T00:00:00Z").await;
        insert_reading(&pool, "OFF", 90.0, 0.0, "2024-01-02T00:00:00Z").await;
        insert_reading(&pool, "OFF", 99.0, 0.0, "2024-01-03T00:00:00Z").await;
        insert_reading(&pool, "OFF", 50.0, 0.0, "2024-01-04T00:00:00Z").await;
        insert_reading(&pool, "OFF", 80.0, 0.0, "2024-01-05T00:00:00Z").await;
        insert_reading(&pool, "OFF", 0.0, 0.0, "2024-01-06T00:00:00Z").await;
        insert_reading(&pool, "ON", 90.0, 0.0, "2024-01-07T00:00:00Z").await;
        insert_reading(&pool, "ON", 85.0, 0.0, "2024-01-08T00:00:00Z").await;
        insert_reading(&pool, "ON", 10.0, 0.0, "2024-01-09T00:00:00Z").await;
        insert_reading(&pool, "ON", 0.0, 0.0, "2024-01-10T00:00:00Z").await;

        let server = test_server(pool);
        let body: Value = server.get("/stats").await.json();
        assert_eq!(body["waterSavedPercent"], "30.00");
    }

    // -----------------------------------------------------------------------
    // GET /api-docs/openapi.json
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn openapi_spec_is_served(pool: PgPool) {
        let server = test_server(pool);
        let resp = server.get("/api-docs/openapi.json").await;
        resp.assert_status_ok();

        let body: Value = resp.json();
        assert_eq!(body["info"]["title"], "Smart Irrigation API");
    }
}
