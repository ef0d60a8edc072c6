use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;

use crate::db::models::{DiseaseRisk, MotorStatus, SensorReading};

/// A validated telemetry sample, ready to persist. Every sensor field is
/// optional; `time` falls back to the insertion time.
#[derive(Debug, Default)]
pub struct ReadingInput {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub moisture: Option<f64>,
    pub precipitation: Option<f64>,
    pub motor_status: Option<MotorStatus>,
    pub saved_water: Option<f64>,
    pub battery_level: Option<f64>,
    pub time: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct TelemetryService {
    pool: PgPool,
}

impl TelemetryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist one reading. The disease-risk flag is derived here, never
    /// taken from the input.
    pub async fn record(&self, input: ReadingInput) -> Result<SensorReading, sqlx::Error> {
        let risk = disease_risk(input.temperature, input.humidity);

        let reading = sqlx::query_as::<_, SensorReading>(
            r#"
            INSERT INTO sensor_readings
                (temperature, humidity, moisture, precipitation, motor_status,
                 saved_water, battery_level, disease_risk, time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, now()))
            RETURNING id, temperature, humidity, moisture, precipitation,
                      motor_status, saved_water, battery_level, disease_risk, time
            "#,
        )
        .bind(input.temperature)
        .bind(input.humidity)
        .bind(input.moisture)
        .bind(input.precipitation)
        .bind(input.motor_status.map(|m| m.as_str()))
        .bind(input.saved_water)
        .bind(input.battery_level)
        .bind(risk.as_str())
        .bind(input.time)
        .fetch_one(&self.pool)
        .await?;

        info!(id = %reading.id, disease_risk = %reading.disease_risk, "Reading persisted");
        Ok(reading)
    }

    /// The reading with the maximum `time`, regardless of insertion order.
    pub async fn latest(&self) -> Result<Option<SensorReading>, sqlx::Error> {
        sqlx::query_as::<_, SensorReading>(
            r#"
            SELECT id, temperature, humidity, moisture, precipitation,
                   motor_status, saved_water, battery_level, disease_risk, time
            FROM sensor_readings
            ORDER BY time DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
    }

    /// Every reading, time-ascending. Full scan, no pagination; the
    /// companion app charts the whole series.
    pub async fn history(&self) -> Result<Vec<SensorReading>, sqlx::Error> {
        sqlx::query_as::<_, SensorReading>(
            r#"
            SELECT id, temperature, humidity, moisture, precipitation,
                   motor_status, saved_water, battery_level, disease_risk, time
            FROM sensor_readings
            ORDER BY time ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Share of readings where the motor was off while rain was likely,
    /// formatted to two decimals.
    pub async fn water_saved_percent(&self) -> Result<String, sqlx::Error> {
        let (total, rain_off) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE motor_status = 'OFF' AND precipitation > 80)
            FROM sensor_readings
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(format_saved_percent(rain_off, total))
    }
}

/// HIGH only when both values were reported and both exceed their
/// thresholds; a missing field always reads as LOW.
fn disease_risk(temperature: Option<f64>, humidity: Option<f64>) -> DiseaseRisk {
    match (temperature, humidity) {
        (Some(t), Some(h)) if t > 25.0 && h > 80.0 => DiseaseRisk::High,
        _ => DiseaseRisk::Low,
    }
}

fn format_saved_percent(rain_off: i64, total: i64) -> String {
    if total == 0 {
        return "0.00".to_owned();
    }
    format!("{:.2}", rain_off as f64 / total as f64 * 100.0)
}
