use reframe_core::{file_extension, FormatTag};

/// Object name suffixes accepted for conversion, lowercase
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Object name and content validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Unsupported file extension for {name} (allowed: {allowed:?})")]
    UnsupportedExtension {
        name: String,
        allowed: Vec<String>,
    },

    #[error("{name} has extension .{extension} but contains {detected} data")]
    ExtensionMismatch {
        name: String,
        extension: String,
        detected: FormatTag,
    },
}

/// Format implied by an object name's suffix.
///
/// Checked before any bytes are fetched; names outside `ALLOWED_EXTENSIONS` are rejected.
pub fn expected_format(name: &str) -> Result<FormatTag, ValidationError> {
    match file_extension(name).as_deref() {
        Some("jpg") | Some("jpeg") => Ok(FormatTag::Jpeg),
        Some("png") => Ok(FormatTag::Png),
        _ => Err(ValidationError::UnsupportedExtension {
            name: name.to_string(),
            allowed: ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }),
    }
}

/// Cross-check the inspected format of an object against its name.
pub fn validate_format(name: &str, detected: FormatTag) -> Result<(), ValidationError> {
    let expected = expected_format(name)?;
    if expected != detected {
        return Err(ValidationError::ExtensionMismatch {
            name: name.to_string(),
            extension: file_extension(name).unwrap_or_default(),
            detected,
        });
    }
    Ok(())
}
