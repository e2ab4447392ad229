//! Test helpers: wire a `Pipeline` to in-memory storage and stores.

pub mod fixtures;

use chrono::{DateTime, Duration, TimeZone, Utc};
use reframe_db::test_helpers::{InMemoryProvenanceStore, InMemorySettingsStore};
use reframe_processing::{Pipeline, PipelineOptions};
use reframe_storage::test_helpers::MockStorage;
use std::sync::Arc;

pub struct TestHarness {
    pub storage: MockStorage,
    pub settings: InMemorySettingsStore,
    pub provenance: InMemoryProvenanceStore,
    pub pipeline: Pipeline,
}

impl TestHarness {
    /// Empty bucket `uploads`, settings rows as given (ids from 1)
    pub fn new(settings: &[(&str, f64, f64)]) -> Self {
        Self::with_options(settings, PipelineOptions::default())
    }

    pub fn with_options(settings: &[(&str, f64, f64)], options: PipelineOptions) -> Self {
        let storage = MockStorage::new("uploads");
        let settings = InMemorySettingsStore::with_rows(settings);
        let provenance = InMemoryProvenanceStore::new();

        let pipeline = Pipeline::new(
            Arc::new(storage.clone()),
            Arc::new(settings.clone()),
            Arc::new(provenance.clone()),
            options,
        );

        Self {
            storage,
            settings,
            provenance,
            pipeline,
        }
    }
}

/// Fixed timestamps so selection order is explicit
pub fn at(offset_secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() + Duration::seconds(offset_secs)
}
