use serde::{Deserialize, Serialize};

use crate::job::{ColorMode, DuplexMode, PrintSettings};

/// Per-unit rates in whole currency units.
/// 以整數貨幣單位表示的單價。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tariff {
    /// Colour, per printed side (single- or double-sided).
    #[serde(default = "default_color_per_side")]
    pub color_per_side: u64,
    /// Black and white, single-sided, per printed side.
    #[serde(default = "default_bw_per_side")]
    pub bw_per_side: u64,
    /// Black and white, double-sided, per physical sheet.
    #[serde(default = "default_bw_duplex_per_sheet")]
    pub bw_duplex_per_sheet: u64,
    /// Flat rate for a colour canvas page.
    #[serde(default = "default_color_per_side")]
    pub canvas_color_page: u64,
    /// Flat rate for a black and white canvas page.
    #[serde(default = "default_bw_per_side")]
    pub canvas_bw_page: u64,
}

fn default_color_per_side() -> u64 {
    10
}

fn default_bw_per_side() -> u64 {
    2
}

fn default_bw_duplex_per_sheet() -> u64 {
    3
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            color_per_side: default_color_per_side(),
            bw_per_side: default_bw_per_side(),
            bw_duplex_per_sheet: default_bw_duplex_per_sheet(),
            canvas_color_page: default_color_per_side(),
            canvas_bw_page: default_bw_per_side(),
        }
    }
}

impl Tariff {
    /// Cost of printing `pages_to_print` pages `copies` times.
    ///
    /// Double-sided black and white is billed per physical sheet, so an odd
    /// side count rounds up to a full sheet. Colour carries no duplex discount.
    pub fn document_cost(
        &self,
        pages_to_print: u32,
        copies: u32,
        color_mode: ColorMode,
        duplex: DuplexMode,
    ) -> u64 {
        let total_pages = u64::from(pages_to_print) * u64::from(copies);
        match (duplex, color_mode) {
            (_, ColorMode::Color) => total_pages.saturating_mul(self.color_per_side),
            (DuplexMode::OneSide, ColorMode::Bw) => total_pages.saturating_mul(self.bw_per_side),
            (DuplexMode::BothSides, ColorMode::Bw) => total_pages
                .div_ceil(2)
                .saturating_mul(self.bw_duplex_per_sheet),
        }
    }

    /// Cost for a document job using the captured `settings`.
    pub fn settings_cost(&self, pages_to_print: u32, settings: &PrintSettings) -> u64 {
        self.document_cost(
            pages_to_print,
            settings.copies,
            settings.color_mode,
            settings.duplex,
        )
    }

    /// Flat per-sheet tariff of a canvas page, independent of its content.
    pub fn canvas_page_cost(&self, color_mode: ColorMode) -> u64 {
        match color_mode {
            ColorMode::Color => self.canvas_color_page,
            ColorMode::Bw => self.canvas_bw_page,
        }
    }
}

/// Cost of a document job at the default tariff.
pub fn cost(pages_to_print: u32, copies: u32, color_mode: ColorMode, duplex: DuplexMode) -> u64 {
    Tariff::default().document_cost(pages_to_print, copies, color_mode, duplex)
}

/// Converts whole currency units to the minor units expected by payment gateways.
pub fn to_minor_units(amount: u64) -> u64 {
    amount.saturating_mul(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huge_rates_saturate_instead_of_overflowing() {
        let tariff = Tariff {
            color_per_side: u64::MAX / 2,
            bw_duplex_per_sheet: u64::MAX,
            ..Tariff::default()
        };
        assert_eq!(
            tariff.document_cost(4, 1, ColorMode::Color, DuplexMode::OneSide),
            u64::MAX
        );
        assert_eq!(
            tariff.document_cost(3, 1, ColorMode::Bw, DuplexMode::BothSides),
            u64::MAX
        );
        assert_eq!(to_minor_units(u64::MAX / 10), u64::MAX);
    }

    #[test]
    fn single_sided_rates() {
        assert_eq!(cost(10, 2, ColorMode::Bw, DuplexMode::OneSide), 40);
        assert_eq!(cost(10, 2, ColorMode::Color, DuplexMode::OneSide), 200);
    }

    #[test]
    fn duplex_black_and_white_is_billed_per_sheet() {
        assert_eq!(cost(10, 2, ColorMode::Bw, DuplexMode::BothSides), 30);
        assert_eq!(cost(3, 1, ColorMode::Bw, DuplexMode::BothSides), 6);
        assert_eq!(cost(1, 1, ColorMode::Bw, DuplexMode::BothSides), 3);
        assert_eq!(cost(0, 5, ColorMode::Bw, DuplexMode::BothSides), 0);
    }

    #[test]
    fn duplex_colour_has_no_discount() {
        assert_eq!(cost(10, 1, ColorMode::Color, DuplexMode::BothSides), 100);
    }

    #[test]
    fn canvas_pages_use_flat_rate() {
        let tariff = Tariff::default();
        assert_eq!(tariff.canvas_page_cost(ColorMode::Color), 10);
        assert_eq!(tariff.canvas_page_cost(ColorMode::Bw), 2);
    }

    #[test]
    fn custom_rates_keep_rounding_rule() {
        let tariff = Tariff {
            bw_duplex_per_sheet: 4,
            ..Tariff::default()
        };
        assert_eq!(tariff.document_cost(5, 1, ColorMode::Bw, DuplexMode::BothSides), 12);
    }

    #[test]
    fn missing_rates_deserialize_to_defaults() {
        let tariff: Tariff = serde_json::from_str(r#"{ "bw_per_side": 1 }"#).unwrap();
        assert_eq!(tariff.bw_per_side, 1);
        assert_eq!(tariff.color_per_side, 10);
        assert_eq!(tariff.bw_duplex_per_sheet, 3);
    }

    #[test]
    fn minor_units() {
        assert_eq!(to_minor_units(42), 4200);
    }
}
