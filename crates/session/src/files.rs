use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use printkiosk_printing::FileRef;
use serde::{Deserialize, Serialize};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// How a file can be printed: images go onto the canvas, PDFs into the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Pdf,
    Other,
}

impl MediaKind {
    /// Classifies by file extension, case-insensitively.
    pub fn from_name(name: &str) -> Self {
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("pdf") => MediaKind::Pdf,
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => MediaKind::Image,
            _ => MediaKind::Other,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Pdf => "pdf",
            MediaKind::Other => "other",
        }
    }

    pub fn is_printable(self) -> bool {
        !matches!(self, MediaKind::Other)
    }
}

/// A file uploaded by the customer for the current session.
/// 顧客在本次工作階段上傳的檔案。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    /// Key of the object in backing storage (`<session>/<name>`).
    pub storage_key: String,
    /// Local copy, once the file is present on this kiosk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    pub size_bytes: u64,
    pub kind: MediaKind,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

impl UploadedFile {
    pub fn file_ref(&self) -> FileRef {
        let location = match &self.local_path {
            Some(path) => path.display().to_string(),
            None => self.storage_key.clone(),
        };
        FileRef::new(self.name.clone(), location)
    }

    pub fn is_image(&self) -> bool {
        self.kind == MediaKind::Image
    }

    pub fn is_pdf(&self) -> bool {
        self.kind == MediaKind::Pdf
    }
}

/// Result of listing a session folder. `exists` is false when the folder has
/// never been created, which callers treat the same as "no uploads yet".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileListing {
    pub files: Vec<UploadedFile>,
    pub exists: bool,
}

impl FileListing {
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_extensions_case_insensitively() {
        assert_eq!(MediaKind::from_name("IMG_0042.JPG"), MediaKind::Image);
        assert_eq!(MediaKind::from_name("scan.webp"), MediaKind::Image);
        assert_eq!(MediaKind::from_name("Thesis.Final.PDF"), MediaKind::Pdf);
        assert_eq!(MediaKind::from_name("notes.docx"), MediaKind::Other);
        assert_eq!(MediaKind::from_name("README"), MediaKind::Other);
        assert!(!MediaKind::Other.is_printable());
    }

    #[test]
    fn file_ref_prefers_local_copy() {
        let mut file = UploadedFile {
            name: "cat.png".into(),
            storage_key: "SunnyOtter42/cat.png".into(),
            local_path: None,
            size_bytes: 10,
            kind: MediaKind::Image,
            created_at: None,
            modified_at: None,
        };
        assert_eq!(file.file_ref().location, "SunnyOtter42/cat.png");
        file.local_path = Some(PathBuf::from("/kiosk/uploads/SunnyOtter42/cat.png"));
        assert_eq!(
            file.file_ref().location,
            "/kiosk/uploads/SunnyOtter42/cat.png"
        );
    }
}
