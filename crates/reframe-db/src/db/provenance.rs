//! Provenance repository
//!
//! Every successful run appends the original object name to `original_images` and the derived
//! object name to `converted_images`. Rows are never read back by the pipeline.

use crate::db::DbResult;
use async_trait::async_trait;
use reframe_core::ProvenanceRecord;
use sqlx::PgPool;

/// Append-only sink for provenance records
#[async_trait]
pub trait ProvenanceStore: Send + Sync {
    /// Persist both names of `record`; either both rows are written or neither is.
    async fn record(&self, record: &ProvenanceRecord) -> DbResult<()>;
}

/// PostgreSQL-backed provenance store
#[derive(Clone)]
pub struct ProvenanceRepository {
    pool: PgPool,
}

impl ProvenanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProvenanceStore for ProvenanceRepository {
    #[tracing::instrument(
        skip(self, record),
        fields(
            db.table = "original_images,converted_images",
            db.operation = "insert",
            original = %record.original_object_name,
            converted = %record.converted_object_name
        )
    )]
    async fn record(&self, record: &ProvenanceRecord) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO original_images (object_name) VALUES ($1)")
            .bind(&record.original_object_name)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO converted_images (converted_object_name) VALUES ($1)")
            .bind(&record.converted_object_name)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!("Provenance recorded");
        Ok(())
    }
}
