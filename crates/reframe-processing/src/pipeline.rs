//! Conversion pipeline
//!
//! One run takes the newest object in the bucket through
//! `SelectObject → Download → ValidateFormat → ResolveSettings → Resize → Upload → SaveProvenance`.
//! The first failing stage ends the run; nothing is retried.

use crate::image::{inspect, FormatError, ImageResizer, ResizeError, ResizeRatios, ResizedImage};
use crate::validator::{expected_format, validate_format, ValidationError};
use reframe_core::{
    converted_object_name, Config, ConversionSetting, ErrorMetadata, FormatTag, ImageBuffer,
    LogLevel, ObjectReference, ProvenanceRecord, DEFAULT_MAX_OUTPUT_PIXELS,
};
use reframe_db::{lookup_settings, ConversionSettingsStore, DbError, ProvenanceStore, SettingsError};
use reframe_storage::{select_latest, SelectError, Storage, StorageError};
use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Pipeline steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    SelectObject,
    Download,
    ValidateFormat,
    ResolveSettings,
    Resize,
    Upload,
    SaveProvenance,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::SelectObject => "select_object",
            Stage::Download => "download",
            Stage::ValidateFormat => "validate_format",
            Stage::ResolveSettings => "resolve_settings",
            Stage::Resize => "resize",
            Stage::Upload => "upload",
            Stage::SaveProvenance => "save_provenance",
        }
    }

    /// Operator-facing message printed when this stage fails
    pub fn failure_message(self) -> &'static str {
        match self {
            Stage::SelectObject => "画像の取得に失敗しました",
            Stage::Download => "画像のダウンロードに失敗しました",
            Stage::ValidateFormat => "画像形式の検証に失敗しました",
            Stage::ResolveSettings => "画像の変換設定の取得に失敗しました",
            Stage::Resize => "画像のリサイズに失敗しました",
            Stage::Upload => "画像のアップロードに失敗しました",
            Stage::SaveProvenance => "画像情報のデータベースへの保存に失敗しました",
        }
    }

    /// State reached once this stage completes
    pub fn completed_state(self) -> PipelineState {
        match self {
            Stage::SelectObject => PipelineState::ObjectSelected,
            Stage::Download => PipelineState::Downloaded,
            Stage::ValidateFormat => PipelineState::FormatValidated,
            Stage::ResolveSettings => PipelineState::SettingsResolved,
            Stage::Resize => PipelineState::Resized,
            Stage::Upload => PipelineState::Uploaded,
            Stage::SaveProvenance => PipelineState::ProvenanceSaved,
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Progress of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    ObjectSelected,
    Downloaded,
    FormatValidated,
    SettingsResolved,
    Resized,
    Uploaded,
    ProvenanceSaved,
    Done,
    Failed(Stage),
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("No {resource} found: {name}")]
    NotFound { resource: &'static str, name: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("{name} has extension .{extension} but contains {detected} data")]
    ExtensionMismatch {
        name: String,
        extension: String,
        detected: FormatTag,
    },

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Invalid resize ratios: width {width_ratio}, height {height_ratio}")]
    InvalidRatio { width_ratio: f64, height_ratio: f64 },

    #[error("Resize failed: {0}")]
    Resize(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedOutputFormat(String),

    #[error("Storage error: {0}")]
    StorageIo(#[from] StorageError),

    #[error("Store error: {0}")]
    StoreIo(#[from] DbError),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Run deadline exceeded")]
    DeadlineExceeded,
}

impl From<SelectError> for PipelineError {
    fn from(err: SelectError) -> Self {
        match err {
            SelectError::NotFound(bucket) => PipelineError::NotFound {
                resource: "object",
                name: bucket,
            },
            SelectError::Storage(e) => PipelineError::StorageIo(e),
        }
    }
}

impl From<ValidationError> for PipelineError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::UnsupportedExtension { .. } => {
                PipelineError::UnsupportedFormat(err.to_string())
            }
            ValidationError::ExtensionMismatch {
                name,
                extension,
                detected,
            } => PipelineError::ExtensionMismatch {
                name,
                extension,
                detected,
            },
        }
    }
}

impl From<FormatError> for PipelineError {
    fn from(err: FormatError) -> Self {
        match err {
            FormatError::UnsupportedFormat(msg) => PipelineError::UnsupportedFormat(msg),
        }
    }
}

impl From<SettingsError> for PipelineError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::NotFound(id) => PipelineError::NotFound {
                resource: "conversion setting",
                name: id.to_string(),
            },
            SettingsError::UnsupportedOutputFormat(e) => {
                PipelineError::UnsupportedOutputFormat(e.0)
            }
            SettingsError::Store(e) => PipelineError::StoreIo(e),
        }
    }
}

impl From<ResizeError> for PipelineError {
    fn from(err: ResizeError) -> Self {
        match err {
            ResizeError::Decode(msg) => PipelineError::Decode(msg),
            ResizeError::InvalidRatio {
                width_ratio,
                height_ratio,
            } => PipelineError::InvalidRatio {
                width_ratio,
                height_ratio,
            },
            other => PipelineError::Resize(other.to_string()),
        }
    }
}

impl ErrorMetadata for PipelineError {
    fn error_code(&self) -> &'static str {
        match self {
            PipelineError::NotFound { .. } => "NOT_FOUND",
            PipelineError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            PipelineError::ExtensionMismatch { .. } => "EXTENSION_MISMATCH",
            PipelineError::Decode(_) => "DECODE_FAILED",
            PipelineError::InvalidRatio { .. } => "INVALID_RATIO",
            PipelineError::Resize(_) => "RESIZE_FAILED",
            PipelineError::UnsupportedOutputFormat(_) => "UNSUPPORTED_OUTPUT_FORMAT",
            PipelineError::StorageIo(_) => "STORAGE_IO",
            PipelineError::StoreIo(_) => "STORE_IO",
            PipelineError::Cancelled => "CANCELLED",
            PipelineError::DeadlineExceeded => "DEADLINE_EXCEEDED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::StorageIo(_)
                | PipelineError::StoreIo(_)
                | PipelineError::Cancelled
                | PipelineError::DeadlineExceeded
        )
    }

    fn client_message(&self) -> String {
        match self {
            PipelineError::NotFound {
                resource: "object", ..
            } => "画像が存在しません。".to_string(),
            PipelineError::NotFound { name, .. } => {
                format!("画像の変換設定が存在しません。: {}", name)
            }
            PipelineError::UnsupportedFormat(_) => {
                "jpeg(jpg)、またはpng形式の画像を選択してください。".to_string()
            }
            PipelineError::ExtensionMismatch { .. } => {
                "ファイルの拡張子と実際の画像タイプが異なっています。".to_string()
            }
            PipelineError::Decode(_) => "画像をデコードできませんでした。".to_string(),
            PipelineError::InvalidRatio { .. } => "リサイズ比率が不正です。".to_string(),
            PipelineError::Resize(_) => "画像を変換できませんでした。".to_string(),
            PipelineError::UnsupportedOutputFormat(format) => {
                format!("変換後の画像タイプがうまく取得できませんでした。: {}", format)
            }
            PipelineError::StorageIo(_) => "ストレージへのアクセスに失敗しました。".to_string(),
            PipelineError::StoreIo(_) => "データベースへのアクセスに失敗しました。".to_string(),
            PipelineError::Cancelled => "処理が中断されました。".to_string(),
            PipelineError::DeadlineExceeded => "処理が時間内に完了しませんでした。".to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            PipelineError::NotFound { .. }
            | PipelineError::UnsupportedFormat(_)
            | PipelineError::ExtensionMismatch { .. }
            | PipelineError::InvalidRatio { .. }
            | PipelineError::UnsupportedOutputFormat(_)
            | PipelineError::Cancelled => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

/// A failed run: the stage that faulted and why
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {cause}")]
pub struct PipelineFailure {
    pub stage: Stage,
    #[source]
    pub cause: PipelineError,
}

impl ErrorMetadata for PipelineFailure {
    fn error_code(&self) -> &'static str {
        self.cause.error_code()
    }

    fn is_recoverable(&self) -> bool {
        self.cause.is_recoverable()
    }

    fn client_message(&self) -> String {
        format!(
            "{}: {}",
            self.stage.failure_message(),
            self.cause.client_message()
        )
    }

    fn log_level(&self) -> LogLevel {
        self.cause.log_level()
    }
}

/// Cancellation and deadline for one run
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Race `fut` against cancellation and the deadline. Cancellation wins ties.
    ///
    /// Losing the race drops `fut` but cannot stop work already handed to
    /// `spawn_blocking`: an interrupted resize keeps its blocking thread until the image is
    /// done, and a runtime that is dropped normally waits for it. Binaries should shut the
    /// runtime down with `Runtime::shutdown_timeout` to bound that wait.
    pub async fn guard<T, F>(&self, fut: F) -> Result<T, PipelineError>
    where
        F: Future<Output = Result<T, PipelineError>>,
    {
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(PipelineError::Cancelled),
            _ = deadline => Err(PipelineError::DeadlineExceeded),
            result = fut => result,
        }
    }
}

/// Tuning knobs for the resize step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Pixel bound for source and target images; `None` disables the check.
    pub max_output_pixels: Option<u64>,
    pub jpeg_quality: Option<u8>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_output_pixels: Some(DEFAULT_MAX_OUTPUT_PIXELS),
            jpeg_quality: None,
        }
    }
}

impl From<&Config> for PipelineOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_output_pixels: config.max_output_pixels,
            jpeg_quality: config.jpeg_quality,
        }
    }
}

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub job_id: i32,
    pub bucket: String,
    pub original: ObjectReference,
    pub converted_object_name: String,
    pub content_type: String,
    pub setting: ConversionSetting,
    pub source_width: u32,
    pub source_height: u32,
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
}

/// Tracks state transitions and tags failures with their stage
struct Progress {
    state: PipelineState,
}

impl Progress {
    fn new() -> Self {
        Self {
            state: PipelineState::Idle,
        }
    }

    async fn step<T, F>(&mut self, stage: Stage, fut: F) -> Result<T, PipelineFailure>
    where
        F: Future<Output = Result<T, PipelineError>>,
    {
        let start = std::time::Instant::now();
        match fut.await {
            Ok(value) => {
                let next = stage.completed_state();
                tracing::debug!(
                    stage = %stage,
                    from = ?self.state,
                    to = ?next,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Stage completed"
                );
                self.state = next;
                Ok(value)
            }
            Err(cause) => {
                let code = cause.error_code();
                match cause.log_level() {
                    LogLevel::Debug => {
                        tracing::debug!(
                            stage = %stage,
                            error = %cause,
                            error_code = code,
                            "Stage failed"
                        )
                    }
                    LogLevel::Warn => {
                        tracing::warn!(
                            stage = %stage,
                            error = %cause,
                            error_code = code,
                            "Stage failed"
                        )
                    }
                    LogLevel::Error => {
                        tracing::error!(
                            stage = %stage,
                            error = %cause,
                            error_code = code,
                            "Stage failed"
                        )
                    }
                }
                self.state = PipelineState::Failed(stage);
                Err(PipelineFailure { stage, cause })
            }
        }
    }
}

/// Runs one conversion job against injected storage and stores
#[derive(Clone)]
pub struct Pipeline {
    storage: Arc<dyn Storage>,
    settings: Arc<dyn ConversionSettingsStore>,
    provenance: Arc<dyn ProvenanceStore>,
    resizer: ImageResizer,
}

impl Pipeline {
    pub fn new(
        storage: Arc<dyn Storage>,
        settings: Arc<dyn ConversionSettingsStore>,
        provenance: Arc<dyn ProvenanceStore>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            storage,
            settings,
            provenance,
            resizer: ImageResizer::new(options.max_output_pixels, options.jpeg_quality),
        }
    }

    /// Convert the newest object in the bucket using the settings stored under `job_id`.
    #[tracing::instrument(skip(self, ctx), fields(bucket = %self.storage.bucket()))]
    pub async fn run(&self, job_id: i32, ctx: &RunContext) -> Result<RunReport, PipelineFailure> {
        let mut progress = Progress::new();

        let original = progress
            .step(
                Stage::SelectObject,
                ctx.guard(async { Ok(select_latest(self.storage.as_ref()).await?) }),
            )
            .await?;

        let downloaded = progress
            .step(Stage::Download, ctx.guard(self.download(&original)))
            .await?;

        let image = progress
            .step(
                Stage::ValidateFormat,
                ctx.guard(async { Self::validate(&original, downloaded) }),
            )
            .await?;

        let setting = progress
            .step(
                Stage::ResolveSettings,
                ctx.guard(async { Ok(lookup_settings(self.settings.as_ref(), job_id).await?) }),
            )
            .await?;

        let resized = progress
            .step(Stage::Resize, ctx.guard(self.resize(image, &setting)))
            .await?;

        let converted = converted_object_name(&original.name);
        let content_type = setting.output_format.to_mime_type();
        progress
            .step(
                Stage::Upload,
                ctx.guard(async {
                    Ok(self
                        .storage
                        .upload_with_key(&converted, resized.buffer.bytes.clone(), content_type)
                        .await?)
                }),
            )
            .await?;

        let record = ProvenanceRecord::for_original(original.name.clone());
        progress
            .step(
                Stage::SaveProvenance,
                ctx.guard(async { Ok(self.provenance.record(&record).await?) }),
            )
            .await?;

        progress.state = PipelineState::Done;

        tracing::info!(
            state = ?progress.state,
            original = %original.name,
            converted = %converted,
            job_id,
            width = resized.width,
            height = resized.height,
            "Image conversion completed"
        );

        Ok(RunReport {
            job_id,
            bucket: self.storage.bucket().to_string(),
            original,
            converted_object_name: converted,
            content_type: content_type.to_string(),
            setting,
            source_width: resized.source_width,
            source_height: resized.source_height,
            width: resized.width,
            height: resized.height,
            size_bytes: resized.buffer.len(),
        })
    }

    /// Fetch the object, refusing names that cannot hold a JPEG or PNG.
    async fn download(&self, object: &ObjectReference) -> Result<ImageBuffer, PipelineError> {
        expected_format(&object.name)?;
        let bytes = self.storage.download(&object.name).await?;
        Ok(ImageBuffer::unchecked(bytes))
    }

    fn validate(
        object: &ObjectReference,
        buffer: ImageBuffer,
    ) -> Result<ImageBuffer, PipelineError> {
        let detected = inspect(&buffer.bytes)?;
        validate_format(&object.name, detected)?;
        Ok(buffer.with_format(detected))
    }

    async fn resize(
        &self,
        image: ImageBuffer,
        setting: &ConversionSetting,
    ) -> Result<ResizedImage, PipelineError> {
        let resizer = self.resizer;
        let ratios = ResizeRatios::from(setting);
        let format = setting.output_format;

        let resized = tokio::task::spawn_blocking(move || resizer.resize(&image, ratios, format))
            .await
            .map_err(|e| PipelineError::Resize(format!("resize worker failed: {}", e)))??;

        Ok(resized)
    }
}
