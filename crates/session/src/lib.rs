//! Customer sessions and their uploaded files: tokens, listing, remote
//! download fallback and PDF page counting.
//! 顧客工作階段與上傳檔案：代碼、清單、遠端下載與 PDF 頁數。

mod util;

pub mod cache;
pub mod files;
pub mod listing;
pub mod pdf;
pub mod remote;
pub mod source;
pub mod token;

pub use cache::{FileCache, RemoteFallback, SessionFiles};
pub use files::{FileListing, MediaKind, UploadedFile};
pub use listing::{FileLister, LocalDirectoryLister, StorageError};
pub use pdf::{count_pdf_pages, LopdfPageCounter, PageCountError, PageCounter};
pub use remote::{
    DownloadResult, FileDownloader, MirrorDirectoryStore, RemoteObject, RemoteStore,
    StoreDownloader,
};
pub use source::{item_source, probe_image_size, InMemorySource, LocalFile, PrintableSource};
pub use token::{InvalidSessionToken, SessionToken};
