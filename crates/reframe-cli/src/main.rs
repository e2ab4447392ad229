//! reframe: resize the newest image in a bucket using stored conversion settings.
//!
//! Reads BUCKET_NAME, storage and database settings from the environment (or `.env`).

use clap::Parser;
use reframe_cli::{
    build_pipeline, build_runtime, failure_message, init_tracing, print_json, success_message,
    EXIT_PIPELINE_FAILURE, EXIT_SETUP_FAILURE, SHUTDOWN_GRACE,
};
use reframe_core::Config;
use reframe_processing::RunContext;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(
    name = "reframe",
    about = "Resize the newest image in a bucket using stored conversion settings"
)]
struct Cli {
    /// Conversion settings id (row of image_conversion_settings)
    job_id: i32,

    /// Insert the default settings rows when the settings table is empty
    #[arg(long)]
    seed_defaults: bool,

    /// Print the run report as JSON instead of the success line
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let runtime = match build_runtime() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("ランタイムの起動に失敗しました: {}", e);
            return ExitCode::from(EXIT_SETUP_FAILURE);
        }
    };

    let code = runtime.block_on(run(cli));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    code
}

async fn run(cli: Cli) -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("設定の読み込みに失敗しました: {:#}", e);
            return ExitCode::from(EXIT_SETUP_FAILURE);
        }
    };

    init_tracing(&config.log_format);
    tracing::debug!(
        environment = %config.environment,
        production = config.is_production(),
        backend = %config.storage_backend,
        bucket = %config.bucket_name,
        "Configuration loaded"
    );

    let pipeline = match build_pipeline(&config, cli.seed_defaults).await {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!(error = %e, "Setup failed");
            eprintln!("{:#}", e);
            return ExitCode::from(EXIT_SETUP_FAILURE);
        }
    };

    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling run");
            ctrl_c_token.cancel();
        }
    });

    let mut ctx = RunContext::new().with_cancellation(token);
    if let Some(timeout) = config.run_timeout() {
        ctx = ctx.with_timeout(timeout);
    }

    match pipeline.run(cli.job_id, &ctx).await {
        Ok(report) => {
            if cli.json {
                if let Err(e) = print_json(&report) {
                    eprintln!("{:#}", e);
                    return ExitCode::from(EXIT_PIPELINE_FAILURE);
                }
            } else {
                println!("{}", success_message(&report.original.name));
            }
            ExitCode::SUCCESS
        }
        Err(failure) => {
            eprintln!("{}", failure_message(&failure));
            ExitCode::from(EXIT_PIPELINE_FAILURE)
        }
    }
}
