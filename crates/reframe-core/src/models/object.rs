//! Bucket object reference

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Handle to an object in the bucket: its name plus listing metadata.
///
/// Holds no content and no open connection; every access resolves the name again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectReference {
    pub name: String,
    pub last_modified: DateTime<Utc>,
    pub size: u64,
}

impl ObjectReference {
    pub fn new(name: impl Into<String>, last_modified: DateTime<Utc>, size: u64) -> Self {
        Self {
            name: name.into(),
            last_modified,
            size,
        }
    }
}

/// Lowercased extension of the last path segment of an object name, if any.
pub fn file_extension(name: &str) -> Option<String> {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    file_name
        .rsplit_once('.')
        .filter(|(_, ext)| !ext.is_empty())
        .map(|(_, ext)| ext.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(file_extension("uploads/2024/a.b.png").as_deref(), Some("png"));
        assert_eq!(file_extension("README"), None);
        assert_eq!(file_extension(".png").as_deref(), Some("png"));
        assert_eq!(file_extension("trailing."), None);
        assert_eq!(file_extension("dir.jpg/file"), None);
    }
}
