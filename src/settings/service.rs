use sqlx::PgPool;
use tracing::info;

use crate::db::models::Settings;

/// Partial update of the singleton configuration row. Absent fields keep
/// their stored value; they are never reset to null.
#[derive(Debug, Default)]
pub struct SettingsPatch {
    pub project_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub crop_type: Option<String>,
}

#[derive(Clone)]
pub struct SettingsService {
    pool: PgPool,
}

impl SettingsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply `patch` to the singleton row, creating it on first use.
    ///
    /// Runs as a single upsert keyed by the fixed singleton id, so two
    /// concurrent updates are last-write-wins per field set rather than a
    /// read-modify-write race. When `crop_type` is present the moisture
    /// thresholds are re-derived from it; otherwise they stay untouched.
    pub async fn update(&self, patch: SettingsPatch) -> Result<Settings, sqlx::Error> {
        let (min_moisture, max_moisture) = match patch.crop_type.as_deref() {
            Some(crop) => {
                let (min, max) = moisture_thresholds(crop);
                (Some(min), Some(max))
            }
            None => (None, None),
        };

        let settings = sqlx::query_as::<_, Settings>(
            r#"
            INSERT INTO settings
                (id, project_name, latitude, longitude, crop_type,
                 min_moisture, max_moisture, last_updated)
            VALUES
                (1, COALESCE($1, 'Smart Irrigation'), $2, $3, $4, $5, $6, now())
            ON CONFLICT (id) DO UPDATE SET
                project_name = COALESCE($1, settings.project_name),
                latitude     = COALESCE($2, settings.latitude),
                longitude    = COALESCE($3, settings.longitude),
                crop_type    = COALESCE($4, settings.crop_type),
                min_moisture = COALESCE($5, settings.min_moisture),
                max_moisture = COALESCE($6, settings.max_moisture),
                last_updated = now()
            RETURNING id, project_name, latitude, longitude, crop_type,
                      min_moisture, max_moisture, last_updated
            "#,
        )
        .bind(patch.project_name)
        .bind(patch.latitude)
        .bind(patch.longitude)
        .bind(patch.crop_type)
        .bind(min_moisture)
        .bind(max_moisture)
        .fetch_one(&self.pool)
        .await?;

        info!(crop_type = ?settings.crop_type, "Settings updated");
        Ok(settings)
    }

    /// Return the singleton row, or `None` when nothing was ever configured.
    pub async fn fetch(&self) -> Result<Option<Settings>, sqlx::Error> {
        sqlx::query_as::<_, Settings>(
            r#"
            SELECT id, project_name, latitude, longitude, crop_type,
                   min_moisture, max_moisture, last_updated
            FROM settings
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
    }
}

/// (min, max) soil moisture bracket for a crop. Unrecognised crops get the
/// generic bracket.
fn moisture_thresholds(crop_type: &str) -> (f64, f64) {
    match crop_type {
        "Rice" => (60.0, 80.0),
        "Tomato" => (40.0, 60.0),
        "Cotton" => (30.0, 50.0),
        _ => (40.0, 70.0),
    }
}
