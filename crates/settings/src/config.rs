use std::path::PathBuf;

use printkiosk_printing::{CanvasGeometry, Tariff};
use serde::{Deserialize, Serialize};
use tracing::warn;

const CONFIG_VERSION: u32 = 1;
const MAX_INTER_JOB_DELAY_MS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KioskConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub tariff: Tariff,
    #[serde(default)]
    pub canvas: CanvasGeometry,
    #[serde(default)]
    pub checkout: CheckoutSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default = "default_catalog")]
    pub catalog: Vec<SheetProduct>,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            tariff: Tariff::default(),
            canvas: CanvasGeometry::default(),
            checkout: CheckoutSettings::default(),
            storage: StorageSettings::default(),
            catalog: default_catalog(),
        }
    }
}

impl KioskConfig {
    pub fn sanitize(&mut self) {
        if self.version == 0 {
            self.version = CONFIG_VERSION;
        }
        sanitize_tariff(&mut self.tariff);
        sanitize_canvas(&mut self.canvas);
        self.checkout.sanitize();
        self.storage.sanitize();
        self.catalog
            .retain(|product| !product.id.trim().is_empty() && !product.name.trim().is_empty());
    }

    pub fn product(&self, id: &str) -> Option<&SheetProduct> {
        self.catalog.iter().find(|product| product.id == id)
    }
}

fn sanitize_tariff(tariff: &mut Tariff) {
    let defaults = Tariff::default();
    let rates = [
        (&mut tariff.color_per_side, defaults.color_per_side),
        (&mut tariff.bw_per_side, defaults.bw_per_side),
        (&mut tariff.bw_duplex_per_sheet, defaults.bw_duplex_per_sheet),
        (&mut tariff.canvas_color_page, defaults.canvas_color_page),
        (&mut tariff.canvas_bw_page, defaults.canvas_bw_page),
    ];
    for (rate, fallback) in rates {
        if *rate == 0 {
            *rate = fallback;
        }
    }
}

fn sanitize_canvas(canvas: &mut CanvasGeometry) {
    let defaults = CanvasGeometry::default();
    if !canvas.min_item_size.is_finite() || canvas.min_item_size <= 0.0 {
        canvas.min_item_size = defaults.min_item_size;
    }
    if !canvas.page_width.is_finite() || canvas.page_width < canvas.min_item_size {
        warn!(width = canvas.page_width, "canvas width below item floor, using A4");
        canvas.page_width = defaults.page_width;
    }
    if !canvas.page_height.is_finite() || canvas.page_height < canvas.min_item_size {
        warn!(height = canvas.page_height, "canvas height below item floor, using A4");
        canvas.page_height = defaults.page_height;
    }
    if !canvas.max_item_dimension.is_finite() {
        canvas.max_item_dimension = defaults.max_item_dimension;
    }
    let largest = canvas.page_width.min(canvas.page_height);
    if canvas.min_item_size > largest {
        warn!(floor = canvas.min_item_size, "item floor larger than the page, using default");
        canvas.min_item_size = defaults.min_item_size.min(largest);
    }
    canvas.max_item_dimension = canvas.max_item_dimension.clamp(canvas.min_item_size, largest);
}

/// Hosted-checkout presentation and print pacing.
/// 線上結帳顯示設定與列印節奏。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSettings {
    #[serde(default = "default_shop_name")]
    pub shop_name: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_theme_color")]
    pub theme_color: String,
    #[serde(default = "default_inter_job_delay_ms")]
    pub inter_job_delay_ms: u64,
}

fn default_shop_name() -> String {
    "PrintKiosk".to_string()
}

fn default_currency() -> String {
    "INR".to_string()
}

fn default_description() -> String {
    "Print order".to_string()
}

fn default_theme_color() -> String {
    "#3399cc".to_string()
}

fn default_inter_job_delay_ms() -> u64 {
    2000
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            shop_name: default_shop_name(),
            currency: default_currency(),
            description: default_description(),
            theme_color: default_theme_color(),
            inter_job_delay_ms: default_inter_job_delay_ms(),
        }
    }
}

impl CheckoutSettings {
    fn sanitize(&mut self) {
        if self.shop_name.trim().is_empty() {
            self.shop_name = default_shop_name();
        }
        let currency = self.currency.trim().to_ascii_uppercase();
        self.currency = if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_alphabetic())
        {
            currency
        } else {
            default_currency()
        };
        if self.description.trim().is_empty() {
            self.description = default_description();
        }
        if !is_hex_color(&self.theme_color) {
            self.theme_color = default_theme_color();
        }
        self.inter_job_delay_ms = self.inter_job_delay_ms.min(MAX_INTER_JOB_DELAY_MS);
    }
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .map(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,
    #[serde(default = "default_spool_dir")]
    pub spool_dir: PathBuf,
    /// Mounted copy of the cloud upload bucket, consulted when a session has
    /// nothing locally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_mirror_dir: Option<PathBuf>,
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_spool_dir() -> PathBuf {
    PathBuf::from("spool")
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            uploads_dir: default_uploads_dir(),
            spool_dir: default_spool_dir(),
            remote_mirror_dir: None,
        }
    }
}

impl StorageSettings {
    fn sanitize(&mut self) {
        if self.uploads_dir.as_os_str().is_empty() {
            self.uploads_dir = default_uploads_dir();
        }
        if self.spool_dir.as_os_str().is_empty() {
            self.spool_dir = default_spool_dir();
        }
        if self
            .remote_mirror_dir
            .as_ref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            self.remote_mirror_dir = None;
        }
    }
}

/// Blank paper sold over the counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetProduct {
    pub id: String,
    pub name: String,
    pub unit_price: u64,
}

fn default_catalog() -> Vec<SheetProduct> {
    vec![
        SheetProduct {
            id: "a4-plain".into(),
            name: "A4 plain sheet".into(),
            unit_price: 1,
        },
        SheetProduct {
            id: "a4-photo".into(),
            name: "A4 glossy photo sheet".into(),
            unit_price: 15,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rates_fall_back_to_defaults() {
        let mut config = KioskConfig::default();
        config.tariff.bw_per_side = 0;
        config.tariff.color_per_side = 12;
        config.sanitize();
        assert_eq!(config.tariff.bw_per_side, 2);
        assert_eq!(config.tariff.color_per_side, 12);
    }

    #[test]
    fn canvas_limits_are_kept_consistent() {
        let mut config = KioskConfig::default();
        config.canvas.min_item_size = -4.0;
        config.canvas.page_width = 5.0;
        config.canvas.max_item_dimension = 5000.0;
        config.sanitize();
        let defaults = CanvasGeometry::default();
        assert_eq!(config.canvas.min_item_size, defaults.min_item_size);
        assert_eq!(config.canvas.page_width, defaults.page_width);
        assert_eq!(config.canvas.max_item_dimension, defaults.page_width);

        config.canvas.min_item_size = 5000.0;
        config.sanitize();
        assert_eq!(config.canvas.min_item_size, defaults.min_item_size);
        assert_eq!(config.canvas.page_width, defaults.page_width);
        assert!(config.canvas.max_item_dimension <= config.canvas.page_width);
    }

    #[test]
    fn checkout_values_are_normalised() {
        let mut config = KioskConfig::default();
        config.checkout.currency = " usd ".into();
        config.checkout.theme_color = "blue".into();
        config.checkout.inter_job_delay_ms = 10 * 60_000;
        config.sanitize();
        assert_eq!(config.checkout.currency, "USD");
        assert_eq!(config.checkout.theme_color, "#3399cc");
        assert_eq!(config.checkout.inter_job_delay_ms, MAX_INTER_JOB_DELAY_MS);

        config.checkout.currency = "rupees".into();
        config.sanitize();
        assert_eq!(config.checkout.currency, "INR");
    }

    #[test]
    fn catalog_drops_unnamed_products() {
        let mut config = KioskConfig::default();
        config.catalog.push(SheetProduct {
            id: " ".into(),
            name: "Ghost".into(),
            unit_price: 3,
        });
        config.sanitize();
        assert_eq!(config.catalog.len(), 2);
        assert_eq!(config.product("a4-photo").map(|p| p.unit_price), Some(15));
    }
}
