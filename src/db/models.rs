use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Irrigation motor state as reported by the controller.
///
/// Stored as TEXT (`"ON"` / `"OFF"`), which keeps the runtime query API
/// free of custom Postgres types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum MotorStatus {
    On,
    Off,
}

impl MotorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotorStatus::On => "ON",
            MotorStatus::Off => "OFF",
        }
    }
}

impl fmt::Display for MotorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two-level crop disease classification, derived from temperature and
/// humidity at write time. Never taken from the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiseaseRisk {
    Low,
    High,
}

impl DiseaseRisk {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiseaseRisk::Low => "LOW",
            DiseaseRisk::High => "HIGH",
        }
    }
}

impl fmt::Display for DiseaseRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One telemetry sample from the field controller. Insert-only; `time`
/// defines the reading sequence, not insertion order.
#[derive(Debug, Clone, FromRow)]
pub struct SensorReading {
    pub id: Uuid,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub moisture: Option<f64>,
    pub precipitation: Option<f64>,
    pub motor_status: Option<String>,
    pub saved_water: Option<f64>,
    pub battery_level: Option<f64>,
    pub disease_risk: String,
    pub time: DateTime<Utc>,
}

/// The singleton configuration row (`id` is always 1).
#[derive(Debug, Clone, FromRow)]
pub struct Settings {
    pub id: i16,
    pub project_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub crop_type: Option<String>,
    pub min_moisture: Option<f64>,
    pub max_moisture: Option<f64>,
    pub last_updated: DateTime<Utc>,
}
