//! Print-job composition and pricing engine shared by the kiosk front ends.
//! 自助列印機前端共用的列印工作組版與計價引擎。

pub mod canvas;
pub mod controller;
pub mod job;
pub mod page_range;
pub mod platform;
pub mod pricing;
pub mod progress;
pub mod queue;

pub use canvas::{
    CanvasBoard, CanvasError, CanvasGeometry, CanvasItem, CanvasItemId, CanvasPage, CropRect,
    ItemSource, Point, RotateDirection, Size, UNITS_PER_MM,
};
pub use controller::{run_print_batch, BatchOptions, BatchReport, BatchUnit, PrintFailure};
pub use job::{
    ColorMode, DuplexMode, FileRef, PageSelection, PaperId, PaperSize, PrintJobId, PrintSettings,
};
pub use page_range::{
    inspect_page_range, parse_page_range, validate_page_range, PageRangeError, PageRangeReport,
    RejectReason, RejectedToken,
};
pub use platform::{
    ComposedPageRequest, DispatchError, DispatchOutcome, DocumentPrintRequest, PrintDispatcher,
    SpoolDirectoryDispatcher, SpoolTicket,
};
pub use pricing::{cost, to_minor_units, Tariff};
pub use progress::{IgnoreProgress, PrintProgress, PrintStatus, ProgressSink};
pub use queue::{PrintQueue, PrintQueueItem, QueueError};
