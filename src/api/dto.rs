use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::{MotorStatus, SensorReading, Settings};
use crate::settings::SettingsPatch;
use crate::telemetry::ReadingInput;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Telemetry payload POSTed by the field controller. Unknown or mistyped
/// fields fail the request instead of being spread into storage.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewReadingRequest {
    /// Degrees Celsius
    pub temperature: Option<f64>,
    /// Relative humidity percentage
    pub humidity: Option<f64>,
    pub moisture: Option<f64>,
    /// Rain probability percentage
    pub precipitation: Option<f64>,
    pub motor_status: Option<MotorStatus>,
    pub saved_water: Option<f64>,
    pub battery_level: Option<f64>,
    /// Accepted for wire compatibility with older controllers; the server
    /// recomputes the flag and discards this value.
    pub disease_risk: Option<String>,
    /// Sample timestamp; insertion time when omitted.
    pub time: Option<DateTime<Utc>>,
}

impl From<NewReadingRequest> for ReadingInput {
    fn from(req: NewReadingRequest) -> Self {
        Self {
            temperature: req.temperature,
            humidity: req.humidity,
            moisture: req.moisture,
            precipitation: req.precipitation,
            motor_status: req.motor_status,
            saved_water: req.saved_water,
            battery_level: req.battery_level,
            time: req.time,
        }
    }
}

/// Partial settings update from the companion app. Omitted fields keep
/// their stored value.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateSettingsRequest {
    pub project_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub crop_type: Option<String>,
}

impl From<UpdateSettingsRequest> for SettingsPatch {
    fn from(req: UpdateSettingsRequest) -> Self {
        Self {
            project_name: req.project_name,
            latitude: req.latitude,
            longitude: req.longitude,
            crop_type: req.crop_type,
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SensorReadingDto {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moisture: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motor_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_water: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<f64>,
    pub disease_risk: String,
    pub time: DateTime<Utc>,
}

impl From<SensorReading> for SensorReadingDto {
    fn from(r: SensorReading) -> Self {
        Self {
            id: r.id,
            temperature: r.temperature,
            humidity: r.humidity,
            moisture: r.moisture,
            precipitation: r.precipitation,
            motor_status: r.motor_status,
            saved_water: r.saved_water,
            battery_level: r.battery_level,
            disease_risk: r.disease_risk,
            time: r.time,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsDto {
    pub project_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_moisture: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_moisture: Option<f64>,
    pub last_updated: DateTime<Utc>,
}

impl From<Settings> for SettingsDto {
    fn from(s: Settings) -> Self {
        Self {
            project_name: s.project_name,
            latitude: s.latitude,
            longitude: s.longitude,
            crop_type: s.crop_type,
            min_moisture: s.min_moisture,
            max_moisture: s.max_moisture,
            last_updated: s.last_updated,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateSettingsResponse {
    pub message: String,
    pub settings: SettingsDto,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Percentage of readings where irrigation was skipped because rain was
    /// likely, as a fixed two-decimal string (e.g. `"30.00"`).
    pub water_saved_percent: String,
}
