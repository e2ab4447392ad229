//! Database repositories
//!
//! `settings` resolves job ids to conversion settings, `provenance` appends the
//! original/converted object names and `setup` owns the pool and migrations.

pub mod error;
pub mod provenance;
pub mod settings;
pub mod setup;

pub use error::{DbError, DbResult};
pub use provenance::{ProvenanceRepository, ProvenanceStore};
pub use settings::{
    lookup_settings, seed_default_settings, ConversionSettingRow, ConversionSettingsRepository,
    ConversionSettingsStore, NewConversionSetting, SettingsError, DEFAULT_SETTINGS,
};
pub use setup::setup_database;
