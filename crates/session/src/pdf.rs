use std::io;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::files::MediaKind;
use crate::source::PrintableSource;

#[derive(Debug, Error)]
pub enum PageCountError {
    #[error("'{0}' is not a PDF")]
    NotPdf(String),
    #[error("failed to read '{name}': {source}")]
    Read {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse PDF: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("PDF has no pages")]
    NoPages,
    #[error("page counting task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Determines how many pages a PDF has before it is queued.
/// 在加入佇列前取得 PDF 的頁數。
#[async_trait]
pub trait PageCounter: Send + Sync {
    async fn page_count(&self, source: &dyn PrintableSource) -> Result<u32, PageCountError>;
}

/// Counts pages by walking the document's page tree with `lopdf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfPageCounter;

#[async_trait]
impl PageCounter for LopdfPageCounter {
    async fn page_count(&self, source: &dyn PrintableSource) -> Result<u32, PageCountError> {
        if source.kind() != MediaKind::Pdf {
            return Err(PageCountError::NotPdf(source.name().to_string()));
        }
        let bytes = source.open_bytes().map_err(|err| PageCountError::Read {
            name: source.name().to_string(),
            source: err,
        })?;
        let pages = tokio::task::spawn_blocking(move || count_pdf_pages(&bytes)).await??;
        debug!(file = source.name(), pages, "counted PDF pages");
        Ok(pages)
    }
}

pub fn count_pdf_pages(bytes: &[u8]) -> Result<u32, PageCountError> {
    let document = lopdf::Document::load_mem(bytes)?;
    match document.get_pages().len() {
        0 => Err(PageCountError::NoPages),
        count => Ok(u32::try_from(count).unwrap_or(u32::MAX)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemorySource;
    use lopdf::{dictionary, Document, Object};

    fn pdf_with_pages(count: u32) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (0..count)
            .map(|_| {
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(595),
                        Object::Integer(842),
                    ],
                })
                .into()
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => i64::from(count),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[tokio::test]
    async fn counts_pages_of_generated_pdf() {
        let source = InMemorySource::new("thesis.pdf", pdf_with_pages(7));
        let pages = LopdfPageCounter.page_count(&source).await.unwrap();
        assert_eq!(pages, 7);
    }

    #[tokio::test]
    async fn rejects_non_pdf_and_garbage() {
        let image = InMemorySource::new("cat.png", vec![1, 2, 3]);
        assert!(matches!(
            LopdfPageCounter.page_count(&image).await,
            Err(PageCountError::NotPdf(_))
        ));
        let garbage = InMemorySource::new("broken.pdf", b"definitely not a pdf".to_vec());
        assert!(LopdfPageCounter.page_count(&garbage).await.is_err());
    }
}
