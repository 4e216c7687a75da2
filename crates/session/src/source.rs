use std::io::{self, Cursor};
use std::path::PathBuf;

use printkiosk_printing::{FileRef, ItemSource, Size};
use tracing::debug;

use crate::files::{MediaKind, UploadedFile};

/// Something the kiosk can hand to the canvas or the page counter.
/// 可供畫布或頁數計算使用的檔案來源。
pub trait PrintableSource: Send + Sync {
    fn name(&self) -> &str;
    fn size_bytes(&self) -> u64;
    fn kind(&self) -> MediaKind;
    fn open_bytes(&self) -> io::Result<Vec<u8>>;
    fn file_ref(&self) -> FileRef;
}

impl PrintableSource for UploadedFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn open_bytes(&self) -> io::Result<Vec<u8>> {
        match &self.local_path {
            Some(path) => std::fs::read(path),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("'{}' has not been downloaded to this kiosk", self.name),
            )),
        }
    }

    fn file_ref(&self) -> FileRef {
        UploadedFile::file_ref(self)
    }
}

/// A file on local disk that did not come from a session listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    name: String,
    path: PathBuf,
    size_bytes: u64,
}

impl LocalFile {
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            path,
            size_bytes: metadata.len(),
        })
    }
}

impl PrintableSource for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    fn kind(&self) -> MediaKind {
        MediaKind::from_name(&self.name)
    }

    fn open_bytes(&self) -> io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }

    fn file_ref(&self) -> FileRef {
        FileRef::new(self.name.clone(), self.path.display().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemorySource {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InMemorySource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

impl PrintableSource for InMemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn kind(&self) -> MediaKind {
        MediaKind::from_name(&self.name)
    }

    fn open_bytes(&self) -> io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }

    fn file_ref(&self) -> FileRef {
        FileRef::new(self.name.clone(), format!("memory:{}", self.name))
    }
}

/// Natural pixel size of an image source, or `None` when the bytes cannot be
/// read or decoded. The canvas then falls back to a square placeholder.
pub fn probe_image_size(source: &dyn PrintableSource) -> Option<Size> {
    if source.kind() != MediaKind::Image {
        return None;
    }
    let bytes = source.open_bytes().ok()?;
    let reader = image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?;
    match reader.into_dimensions() {
        Ok((width, height)) => Some(Size::new(width as f32, height as f32)),
        Err(err) => {
            debug!(file = source.name(), error = %err, "could not read image dimensions");
            None
        }
    }
}

/// Builds the canvas drop payload for an image source.
pub fn item_source(source: &dyn PrintableSource) -> ItemSource {
    ItemSource {
        file: source.file_ref(),
        natural_size: probe_image_size(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        image::RgbImage::new(width, height)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn probes_png_dimensions() {
        let source = InMemorySource::new("photo.png", png(640, 480));
        assert_eq!(probe_image_size(&source), Some(Size::new(640.0, 480.0)));
        let drop = item_source(&source);
        assert_eq!(drop.file.name, "photo.png");
    }

    #[test]
    fn undecodable_or_non_image_sources_have_no_size() {
        let garbage = InMemorySource::new("broken.jpg", b"not an image".to_vec());
        assert_eq!(probe_image_size(&garbage), None);
        let pdf = InMemorySource::new("doc.pdf", png(10, 10));
        assert_eq!(probe_image_size(&pdf), None);
    }

    #[test]
    fn uploaded_file_without_local_copy_cannot_be_opened() {
        let file = UploadedFile {
            name: "cat.png".into(),
            storage_key: "S/cat.png".into(),
            local_path: None,
            size_bytes: 1,
            kind: MediaKind::Image,
            created_at: None,
            modified_at: None,
        };
        let err = file.open_bytes().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn local_file_reads_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Flyer.PNG");
        std::fs::write(&path, png(4, 2)).unwrap();
        let file = LocalFile::open(&path).unwrap();
        assert_eq!(file.name(), "Flyer.PNG");
        assert_eq!(file.kind(), MediaKind::Image);
        assert!(file.size_bytes() > 0);
        assert_eq!(probe_image_size(&file), Some(Size::new(4.0, 2.0)));
    }
}
