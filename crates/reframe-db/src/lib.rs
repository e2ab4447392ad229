//! Reframe Database Library
//!
//! Persistence for the conversion pipeline: the conversion settings table, the provenance
//! tables and pool/migration setup. Each concern is reached through a trait so the pipeline
//! can run against PostgreSQL or the in-memory stores in `test_helpers`.

pub mod db;
pub mod test_helpers;

// Re-export commonly used types
pub use db::{
    lookup_settings, seed_default_settings, setup_database, ConversionSettingRow,
    ConversionSettingsRepository, ConversionSettingsStore, DbError, DbResult,
    NewConversionSetting, ProvenanceRepository, ProvenanceStore, SettingsError,
    DEFAULT_SETTINGS,
};
