//! Conversion settings repository
//!
//! One row of `image_conversion_settings` describes a job: the encoding of the derived image
//! and the ratios applied to the source width and height.

use crate::db::{DbError, DbResult};
use async_trait::async_trait;
use reframe_core::{ConversionSetting, OutputFormat, UnsupportedOutputFormat};
use sqlx::{FromRow, PgPool, Postgres};
use thiserror::Error;

/// Rows inserted by `seed_default_settings` into an empty table: `(output_format, width_ratio,
/// height_ratio)`.
pub const DEFAULT_SETTINGS: &[(&str, f64, f64)] = &[("jpg", 0.8, 0.8), ("png", 0.8, 0.8)];

/// A settings row exactly as stored
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ConversionSettingRow {
    pub id: i32,
    pub output_format: String,
    pub width_resize_ratio: f64,
    pub height_resize_ratio: f64,
}

impl TryFrom<ConversionSettingRow> for ConversionSetting {
    type Error = UnsupportedOutputFormat;

    fn try_from(row: ConversionSettingRow) -> Result<Self, Self::Error> {
        Ok(ConversionSetting {
            id: row.id,
            output_format: row.output_format.parse::<OutputFormat>()?,
            width_ratio: row.width_resize_ratio,
            height_ratio: row.height_resize_ratio,
        })
    }
}

/// Values for a new settings row; the id is assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewConversionSetting {
    pub output_format: String,
    pub width_ratio: f64,
    pub height_ratio: f64,
}

impl NewConversionSetting {
    pub fn new(output_format: impl Into<String>, width_ratio: f64, height_ratio: f64) -> Self {
        Self {
            output_format: output_format.into(),
            width_ratio,
            height_ratio,
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("No conversion settings with id {0}")]
    NotFound(i32),

    #[error(transparent)]
    UnsupportedOutputFormat(#[from] UnsupportedOutputFormat),

    #[error(transparent)]
    Store(#[from] DbError),
}

/// Read/write access to persisted conversion settings
#[async_trait]
pub trait ConversionSettingsStore: Send + Sync {
    /// Fetch the row with `id`, if any
    async fn find_by_id(&self, id: i32) -> DbResult<Option<ConversionSettingRow>>;

    /// Number of stored rows
    async fn count(&self) -> DbResult<i64>;

    /// Insert a row and return it with its assigned id
    async fn insert(&self, setting: &NewConversionSetting) -> DbResult<ConversionSettingRow>;
}

/// Resolve a job id to its conversion settings.
///
/// A missing row is `NotFound`; there is no fallback row. Ratios are returned as stored.
pub async fn lookup_settings(
    store: &dyn ConversionSettingsStore,
    id: i32,
) -> Result<ConversionSetting, SettingsError> {
    let row = store
        .find_by_id(id)
        .await?
        .ok_or(SettingsError::NotFound(id))?;

    let setting = ConversionSetting::try_from(row)?;

    tracing::debug!(
        setting_id = setting.id,
        output_format = %setting.output_format,
        width_ratio = setting.width_ratio,
        height_ratio = setting.height_ratio,
        "Resolved conversion settings"
    );

    Ok(setting)
}

/// Insert `DEFAULT_SETTINGS` when the table is empty. Returns the number of rows inserted.
pub async fn seed_default_settings(store: &dyn ConversionSettingsStore) -> DbResult<usize> {
    let existing = store.count().await?;
    if existing > 0 {
        tracing::debug!(existing, "Conversion settings already present, skipping seed");
        return Ok(0);
    }

    for (output_format, width_ratio, height_ratio) in DEFAULT_SETTINGS {
        let row = store
            .insert(&NewConversionSetting::new(
                *output_format,
                *width_ratio,
                *height_ratio,
            ))
            .await?;
        tracing::info!(
            setting_id = row.id,
            output_format = %row.output_format,
            "Seeded conversion setting"
        );
    }

    Ok(DEFAULT_SETTINGS.len())
}

/// PostgreSQL-backed settings store
#[derive(Clone)]
pub struct ConversionSettingsRepository {
    pool: PgPool,
}

impl ConversionSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversionSettingsStore for ConversionSettingsRepository {
    #[tracing::instrument(
        skip(self),
        fields(
            db.table = "image_conversion_settings",
            db.operation = "select",
            db.record_id = %id
        )
    )]
    async fn find_by_id(&self, id: i32) -> DbResult<Option<ConversionSettingRow>> {
        let row = sqlx::query_as::<Postgres, ConversionSettingRow>(
            r#"
            SELECT id, output_format, width_resize_ratio, height_resize_ratio
            FROM image_conversion_settings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(
        skip(self),
        fields(db.table = "image_conversion_settings", db.operation = "count")
    )]
    async fn count(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM image_conversion_settings",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    #[tracing::instrument(
        skip(self),
        fields(db.table = "image_conversion_settings", db.operation = "insert")
    )]
    async fn insert(&self, setting: &NewConversionSetting) -> DbResult<ConversionSettingRow> {
        let row = sqlx::query_as::<Postgres, ConversionSettingRow>(
            r#"
            INSERT INTO image_conversion_settings
                (output_format, width_resize_ratio, height_resize_ratio)
            VALUES ($1, $2, $3)
            RETURNING id, output_format, width_resize_ratio, height_resize_ratio
            "#,
        )
        .bind(&setting.output_format)
        .bind(setting.width_ratio)
        .bind(setting.height_ratio)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}
