use crate::db::{
    ConversionSettingRow, ConversionSettingsStore, DbError, DbResult, NewConversionSetting,
    ProvenanceStore,
};
use async_trait::async_trait;
use reframe_core::ProvenanceRecord;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Settings store backed by a vector; ids are assigned sequentially from 1.
#[derive(Clone, Default)]
pub struct InMemorySettingsStore {
    rows: Arc<Mutex<Vec<ConversionSettingRow>>>,
    fail: Arc<AtomicBool>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with one row per `(output_format, width_ratio, height_ratio)`
    pub fn with_rows(rows: &[(&str, f64, f64)]) -> Self {
        let store = Self::new();
        for (output_format, width_ratio, height_ratio) in rows {
            store.push(NewConversionSetting::new(
                *output_format,
                *width_ratio,
                *height_ratio,
            ));
        }
        store
    }

    /// Make every subsequent query fail
    pub fn fail_queries(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> DbResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable(
                "injected settings store failure".to_string(),
            ));
        }
        Ok(())
    }

    fn push(&self, setting: NewConversionSetting) -> ConversionSettingRow {
        let mut rows = self.rows.lock().unwrap();
        let row = ConversionSettingRow {
            id: rows.len() as i32 + 1,
            output_format: setting.output_format,
            width_resize_ratio: setting.width_ratio,
            height_resize_ratio: setting.height_ratio,
        };
        rows.push(row.clone());
        row
    }
}

#[async_trait]
impl ConversionSettingsStore for InMemorySettingsStore {
    async fn find_by_id(&self, id: i32) -> DbResult<Option<ConversionSettingRow>> {
        self.check()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.id == id)
            .cloned())
    }

    async fn count(&self) -> DbResult<i64> {
        self.check()?;
        Ok(self.rows.lock().unwrap().len() as i64)
    }

    async fn insert(&self, setting: &NewConversionSetting) -> DbResult<ConversionSettingRow> {
        self.check()?;
        Ok(self.push(setting.clone()))
    }
}

/// Provenance sink that keeps every record it was given
#[derive(Clone, Default)]
pub struct InMemoryProvenanceStore {
    records: Arc<Mutex<Vec<ProvenanceRecord>>>,
    fail: Arc<AtomicBool>,
}

impl InMemoryProvenanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail
    pub fn fail_writes(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Records written so far, oldest first
    pub fn records(&self) -> Vec<ProvenanceRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProvenanceStore for InMemoryProvenanceStore {
    async fn record(&self, record: &ProvenanceRecord) -> DbResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable(
                "injected provenance store failure".to_string(),
            ));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
