//! Multimedia items

use serde::{Deserialize, Serialize};

/// MIME type the repository assigns to External Content Library items
const ECL_MIME_TYPE: &str = "application/externalcontentlibrary";

const SIZE_UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];

/// Reference to a binary published alongside the content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub url: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub mime_type: String,
}

impl MediaItem {
    /// File size with a 1024-based unit, rounded up (e.g. "2 KB")
    pub fn friendly_file_size(&self) -> String {
        let mut len = self.file_size as f64;
        let mut order = 0;
        while len >= 1024.0 && order + 1 < SIZE_UNITS.len() {
            order += 1;
            len /= 1024.0;
        }
        format!("{} {}", len.ceil(), SIZE_UNITS[order])
    }

    /// ECL URI for External Content Library items (`ecl:<name>`), `None` otherwise
    pub fn ecl_uri(&self) -> Option<String> {
        if self.mime_type != ECL_MIME_TYPE || !self.file_name.ends_with(".ecl") {
            return None;
        }
        // Every ".ecl" goes, not only the trailing one
        Some(format!("ecl:{}", self.file_name.replace(".ecl", "")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(file_size: u64) -> MediaItem {
        MediaItem {
            file_size,
            ..Default::default()
        }
    }

    #[test]
    fn test_friendly_file_size() {
        assert_eq!(sized(0).friendly_file_size(), "0 B");
        assert_eq!(sized(1023).friendly_file_size(), "1023 B");
        assert_eq!(sized(1024).friendly_file_size(), "1 KB");
        assert_eq!(sized(1500).friendly_file_size(), "2 KB");
        assert_eq!(sized(5 * 1024 * 1024).friendly_file_size(), "5 MB");
    }

    #[test]
    fn test_ecl_uri() {
        let item = MediaItem {
            url: "/media/video.ecl".into(),
            file_name: "8-mm-204-dist-file.ecl".into(),
            file_size: 0,
            mime_type: ECL_MIME_TYPE.into(),
        };
        assert_eq!(item.ecl_uri().as_deref(), Some("ecl:8-mm-204-dist-file"));

        let image = MediaItem {
            mime_type: "image/png".into(),
            file_name: "logo.png".into(),
            ..Default::default()
        };
        assert!(image.ecl_uri().is_none());
    }

    #[test]
    fn test_ecl_uri_drops_every_extension() {
        let item = MediaItem {
            file_name: "a.ecl.b.ecl".into(),
            mime_type: ECL_MIME_TYPE.into(),
            ..Default::default()
        };
        assert_eq!(item.ecl_uri().as_deref(), Some("ecl:a.b"));

        let unsuffixed = MediaItem {
            file_name: "a.ecl.b".into(),
            mime_type: ECL_MIME_TYPE.into(),
            ..Default::default()
        };
        assert!(unsuffixed.ecl_uri().is_none());
    }
}
