use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use printkiosk_checkout::KioskOrder;
use printkiosk_printing::{
    inspect_page_range, ColorMode, PageSelection, Point, PrintSettings, RotateDirection,
};
use printkiosk_session::{
    item_source, LocalFile, LopdfPageCounter, MediaKind, PageCounter, PrintableSource,
    SessionToken,
};
use printkiosk_settings::KioskConfig;
use serde::Deserialize;
use tracing::warn;

/// Order description accepted by `printkiosk checkout`.
/// 結帳指令所接受的訂單描述檔。
#[derive(Debug, Deserialize)]
pub struct OrderManifest {
    pub session: SessionToken,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub canvas: Vec<ManifestPage>,
    #[serde(default)]
    pub documents: Vec<ManifestDocument>,
    #[serde(default)]
    pub paper: Vec<ManifestPaper>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestPage {
    #[serde(default = "default_page_color")]
    pub color_mode: ColorMode,
    #[serde(default)]
    pub items: Vec<ManifestItem>,
}

fn default_page_color() -> ColorMode {
    ColorMode::Color
}

#[derive(Debug, Deserialize)]
pub struct ManifestItem {
    pub file: String,
    /// Drop point (item centre); defaults to the page centre.
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    /// Positive turns rotate clockwise.
    #[serde(default)]
    pub quarter_turns: i32,
}

#[derive(Debug, Deserialize)]
pub struct ManifestDocument {
    pub file: String,
    #[serde(default)]
    pub settings: PrintSettings,
    /// Skips PDF parsing when the page count is already known.
    #[serde(default)]
    pub total_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestPaper {
    pub product: String,
    pub quantity: u32,
}

impl OrderManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read order {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse order {}", path.display()))
    }

    /// Replays the manifest onto a fresh order, the way the kiosk UI would.
    pub async fn build(self, config: &KioskConfig) -> Result<KioskOrder> {
        let uploads = config.storage.uploads_dir.clone();
        let mut order = KioskOrder::new(self.session.clone(), config.canvas);
        order.mobile = self.mobile;

        for (index, page) in self.canvas.into_iter().enumerate() {
            let page_id = if index == 0 { 1 } else { order.canvas.add_page() };
            if page.color_mode == ColorMode::Bw {
                order.canvas.toggle_color_mode(page_id)?;
            }
            for item in page.items {
                let path = resolve_upload(&uploads, &self.session, &item.file);
                let source = LocalFile::open(&path)
                    .with_context(|| format!("failed to open image {}", path.display()))?;
                if source.kind() != MediaKind::Image {
                    bail!("'{}' is not an image and cannot go on a canvas page", item.file);
                }
                let geometry = *order.canvas.geometry();
                let drop = Point::new(
                    item.x.unwrap_or(geometry.page_width / 2.0),
                    item.y.unwrap_or(geometry.page_height / 2.0),
                );
                let item_id = order.canvas.add_item(page_id, item_source(&source), drop)?;
                let direction = if item.quarter_turns >= 0 {
                    RotateDirection::Clockwise
                } else {
                    RotateDirection::CounterClockwise
                };
                for _ in 0..item.quarter_turns.unsigned_abs() {
                    order.canvas.rotate_item(page_id, &item_id, direction)?;
                }
            }
        }

        for document in self.documents {
            let path = resolve_upload(&uploads, &self.session, &document.file);
            let source = LocalFile::open(&path)
                .with_context(|| format!("failed to open document {}", path.display()))?;
            let total_pages = match document.total_pages {
                Some(pages) => pages,
                None => LopdfPageCounter
                    .page_count(&source)
                    .await
                    .with_context(|| format!("failed to count pages of {}", path.display()))?,
            };
            if let PageSelection::Custom(ranges) = &document.settings.page_range {
                for rejected in inspect_page_range(ranges, total_pages).rejected {
                    warn!(
                        file = source.name(),
                        token = %rejected.token,
                        reason = %rejected.reason,
                        "ignoring page range entry"
                    );
                }
            }
            order
                .queue
                .enqueue(source.file_ref(), document.settings, total_pages, &config.tariff)
                .with_context(|| format!("cannot queue {}", document.file))?;
        }

        for line in self.paper {
            let product = config
                .product(&line.product)
                .with_context(|| format!("unknown paper product '{}'", line.product))?;
            order.cart.add(product, line.quantity)?;
        }

        Ok(order)
    }
}

pub fn resolve_upload(uploads: &Path, session: &SessionToken, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        uploads.join(session.as_str()).join(path)
    }
}
