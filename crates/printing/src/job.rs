use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Opaque, monotonic identifier for a queued print job.
/// 列印佇列項目的遞增識別碼。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrintJobId(u64);

impl PrintJobId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl Default for PrintJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PrintJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "print-job-{}", self.0)
    }
}

/// Colour mode for a canvas page or document job.
/// 畫布頁面或文件工作的色彩模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Color,
    Bw,
}

impl ColorMode {
    /// Returns the opposite mode.
    pub const fn toggled(self) -> Self {
        match self {
            ColorMode::Color => ColorMode::Bw,
            ColorMode::Bw => ColorMode::Color,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ColorMode::Color => "color",
            ColorMode::Bw => "bw",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Duplex (two-sided) printing mode.
/// 單面或雙面列印。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplexMode {
    OneSide,
    BothSides,
}

impl DuplexMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            DuplexMode::OneSide => "one-side",
            DuplexMode::BothSides => "both-sides",
        }
    }
}

impl fmt::Display for DuplexMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which pages of a document should be printed.
/// 文件中要列印的頁面範圍。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSelection {
    All,
    Odd,
    Even,
    /// Free-form ranges such as `"1-5, 8, 11-13"`.
    Custom(String),
}

impl PageSelection {
    /// Number of pages this selection prints from a document of `total_pages`.
    pub fn pages_to_print(&self, total_pages: u32) -> u32 {
        crate::page_range::pages_to_print(self, total_pages)
    }

    /// Ordered page numbers selected from a document of `total_pages`.
    pub fn expand(&self, total_pages: u32) -> Vec<u32> {
        crate::page_range::expand(self, total_pages)
    }
}

impl Default for PageSelection {
    fn default() -> Self {
        PageSelection::All
    }
}

impl fmt::Display for PageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSelection::All => f.write_str("all"),
            PageSelection::Odd => f.write_str("odd"),
            PageSelection::Even => f.write_str("even"),
            PageSelection::Custom(ranges) => write!(f, "custom({ranges})"),
        }
    }
}

/// Settings captured from the print dialog for a single document.
/// 列印對話框中針對單一文件所擷取的設定。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintSettings {
    #[serde(default = "default_copies")]
    pub copies: u32,
    #[serde(default)]
    pub page_range: PageSelection,
    #[serde(default = "default_duplex")]
    pub duplex: DuplexMode,
    #[serde(default = "default_color_mode")]
    pub color_mode: ColorMode,
}

fn default_copies() -> u32 {
    1
}

fn default_duplex() -> DuplexMode {
    DuplexMode::OneSide
}

fn default_color_mode() -> ColorMode {
    ColorMode::Bw
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            copies: default_copies(),
            page_range: PageSelection::All,
            duplex: default_duplex(),
            color_mode: default_color_mode(),
        }
    }
}

/// Reference to a file known to the kiosk: a display name plus the local
/// path or remote storage key that backs it.
/// 檔案參照：顯示名稱與其本機路徑或遠端儲存鍵值。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    pub location: String,
}

impl FileRef {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }
}

/// Supported paper identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaperId {
    A4,
    Custom,
}

/// Represents a paper size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaperSize {
    pub id: PaperId,
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PaperSize {
    pub const A4: PaperSize = PaperSize::new(PaperId::A4, 210.0, 297.0);

    pub const fn new(id: PaperId, width_mm: f32, height_mm: f32) -> Self {
        Self {
            id,
            width_mm,
            height_mm,
        }
    }

    /// Converts the sheet to canvas units at `units_per_mm`, rounded to whole units.
    pub fn to_units(&self, units_per_mm: f32) -> (f32, f32) {
        (
            (self.width_mm * units_per_mm).round(),
            (self.height_mm * units_per_mm).round(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_ids_are_monotonic() {
        let first = PrintJobId::new();
        let second = PrintJobId::new();
        assert!(second > first);
        assert!(first.to_string().starts_with("print-job-"));
    }

    #[test]
    fn a4_at_96_dpi_matches_screen_canvas() {
        let (width, height) = PaperSize::A4.to_units(96.0 / 25.4);
        assert_eq!(width, 794.0);
        assert_eq!(height, 1123.0);
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let settings: PrintSettings =
            serde_json::from_str(r#"{ "page_range": { "custom": "1-3" } }"#).unwrap();
        assert_eq!(settings.copies, 1);
        assert_eq!(settings.page_range, PageSelection::Custom("1-3".into()));
        assert_eq!(settings.duplex, DuplexMode::OneSide);
        assert_eq!(settings.color_mode, ColorMode::Bw);

        let settings: PrintSettings = serde_json::from_str(
            r#"{ "copies": 2, "page_range": "odd", "duplex": "both-sides", "color_mode": "color" }"#,
        )
        .unwrap();
        assert_eq!(settings.page_range, PageSelection::Odd);
        assert_eq!(settings.duplex, DuplexMode::BothSides);
        assert_eq!(settings.color_mode, ColorMode::Color);
    }

    #[test]
    fn color_mode_toggles() {
        assert_eq!(ColorMode::Color.toggled(), ColorMode::Bw);
        assert_eq!(ColorMode::Bw.toggled(), ColorMode::Color);
    }
}
