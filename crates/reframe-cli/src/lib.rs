//! Wiring and output helpers for the `reframe` binary.

use anyhow::Context;
use reframe_core::{Config, ErrorMetadata};
use reframe_db::{
    seed_default_settings, setup_database, ConversionSettingsRepository, ProvenanceRepository,
};
use reframe_processing::{Pipeline, PipelineFailure, PipelineOptions};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Exit status when the pipeline reports a failure
pub const EXIT_PIPELINE_FAILURE: u8 = 1;
/// Exit status when configuration, storage or database setup fails
pub const EXIT_SETUP_FAILURE: u8 = 2;

/// How long an interrupted run may keep its blocking resize thread before the process exits
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

const DEFAULT_LOG_FILTER: &str = "reframe=info";

/// Multi-threaded runtime for the binary. Shut it down with `shutdown_timeout(SHUTDOWN_GRACE)`
/// so a cancelled resize cannot hold the exit.
pub fn build_runtime() -> std::io::Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}

/// Initialize tracing for the CLI. Logs go to stderr so stdout carries only the result.
pub fn init_tracing(log_format: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Build the pipeline from configuration: bucket handle, pool, migrations and repositories.
pub async fn build_pipeline(config: &Config, seed_defaults: bool) -> anyhow::Result<Pipeline> {
    let storage = reframe_storage::create_storage(config)
        .await
        .context("クライアントの作成に失敗しました")?;

    let pool = setup_database(config)
        .await
        .context("データベースへの接続に失敗しました")?;

    let settings = Arc::new(ConversionSettingsRepository::new(pool.clone()));
    if seed_defaults {
        let inserted = seed_default_settings(settings.as_ref())
            .await
            .context("初期データの挿入に失敗しました")?;
        tracing::info!(inserted, "Default conversion settings seeded");
    }

    let provenance = Arc::new(ProvenanceRepository::new(pool));

    Ok(Pipeline::new(
        storage,
        settings,
        provenance,
        PipelineOptions::from(config),
    ))
}

/// Line printed after a successful run
pub fn success_message(original: &str) -> String {
    format!("画像の処理に成功しました。: {}", original)
}

/// Line printed to stderr after a failed run: stage message, cause, then the technical detail.
pub fn failure_message(failure: &PipelineFailure) -> String {
    format!("{} ({})", failure.client_message(), failure.cause)
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize run report")?;
    println!("{}", out);
    Ok(())
}
