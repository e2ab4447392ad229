//! Provenance record model

use serde::{Deserialize, Serialize};

/// Prefix prepended to an original object name to name its derived image.
pub const CONVERTED_OBJECT_PREFIX: &str = "resized_";

/// Name of the derived object for `original`.
///
/// The whole object name is prefixed, so `uploads/a.png` becomes `resized_uploads/a.png`.
/// Running again against the same original overwrites the earlier derived object.
pub fn converted_object_name(original: &str) -> String {
    format!("{}{}", CONVERTED_OBJECT_PREFIX, original)
}

/// Links an original object to the image derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    pub original_object_name: String,
    pub converted_object_name: String,
}

impl ProvenanceRecord {
    pub fn for_original(original: impl Into<String>) -> Self {
        let original_object_name = original.into();
        let converted_object_name = converted_object_name(&original_object_name);
        Self {
            original_object_name,
            converted_object_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converted_object_name() {
        assert_eq!(converted_object_name("photo.jpg"), "resized_photo.jpg");
        assert_eq!(
            converted_object_name("uploads/photo.png"),
            "resized_uploads/photo.png"
        );
    }

    #[test]
    fn test_record_for_original() {
        let record = ProvenanceRecord::for_original("photo.jpg");
        assert_eq!(record.original_object_name, "photo.jpg");
        assert_eq!(record.converted_object_name, "resized_photo.jpg");
    }
}
