//! Canvas page model: ordered A4 pages holding freely placed images.
//! 畫布頁面模型：依序排列、可自由擺放圖片的 A4 頁面。

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::job::{ColorMode, FileRef, PaperSize};
use crate::pricing::Tariff;

/// Canvas units per millimetre (A4 rendered at 96 DPI).
pub const UNITS_PER_MM: f32 = 96.0 / 25.4;

/// Fixed page rectangle and item sizing limits, in canvas units.
/// 頁面尺寸與項目大小限制（畫布單位）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasGeometry {
    #[serde(default = "default_page_width")]
    pub page_width: f32,
    #[serde(default = "default_page_height")]
    pub page_height: f32,
    #[serde(default = "default_max_item_dimension")]
    pub max_item_dimension: f32,
    #[serde(default = "default_min_item_size")]
    pub min_item_size: f32,
}

fn default_page_width() -> f32 {
    PaperSize::A4.to_units(UNITS_PER_MM).0
}

fn default_page_height() -> f32 {
    PaperSize::A4.to_units(UNITS_PER_MM).1
}

fn default_max_item_dimension() -> f32 {
    300.0
}

fn default_min_item_size() -> f32 {
    20.0
}

impl Default for CanvasGeometry {
    fn default() -> Self {
        Self {
            page_width: default_page_width(),
            page_height: default_page_height(),
            max_item_dimension: default_max_item_dimension(),
            min_item_size: default_min_item_size(),
        }
    }
}

impl CanvasGeometry {
    /// Geometry for an arbitrary sheet at `units_per_mm`.
    pub fn for_paper(paper: PaperSize, units_per_mm: f32) -> Self {
        let (page_width, page_height) = paper.to_units(units_per_mm);
        Self {
            page_width,
            page_height,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Crop rectangle in item-local units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Unique identifier of a placed item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanvasItemId(String);

static NEXT_ITEM_SEQUENCE: AtomicU64 = AtomicU64::new(1);

impl CanvasItemId {
    pub fn new() -> Self {
        let seq = NEXT_ITEM_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("item-{seq}"))
    }

    /// Fresh id for a copy of `original`.
    pub fn derived_from(original: &CanvasItemId) -> Self {
        let seq = NEXT_ITEM_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("{}-{seq}", original.0))
    }

    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CanvasItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CanvasItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An image placed on a canvas page.
/// 放置於畫布頁面上的圖片。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasItem {
    pub id: CanvasItemId,
    pub file: FileRef,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Degrees, always a multiple of 90; not normalised.
    pub rotation: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropRect>,
}

impl CanvasItem {
    fn clamp_to(&mut self, geometry: &CanvasGeometry) {
        self.width = clamp_span(self.width, geometry.min_item_size, geometry.page_width);
        self.height = clamp_span(self.height, geometry.min_item_size, geometry.page_height);
        self.x = clamp_span(self.x, 0.0, geometry.page_width - self.width);
        self.y = clamp_span(self.y, 0.0, geometry.page_height - self.height);
        if let Some(crop) = self.crop {
            self.crop = clamp_crop(crop, self.width, self.height);
        }
    }
}

/// One printable sheet of the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasPage {
    /// 1-based, dense within the board.
    pub id: u32,
    /// Insertion order is z-order.
    pub items: Vec<CanvasItem>,
    pub color_mode: ColorMode,
}

impl CanvasPage {
    fn blank(id: u32) -> Self {
        Self {
            id,
            items: Vec::new(),
            color_mode: ColorMode::Color,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, item_id: &CanvasItemId) -> Option<&CanvasItem> {
        self.items.iter().find(|item| &item.id == item_id)
    }
}

/// Image dropped onto a page, with its natural pixel size when known.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSource {
    pub file: FileRef,
    pub natural_size: Option<Size>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateDirection {
    Clockwise,
    CounterClockwise,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanvasError {
    #[error("canvas page {0} does not exist")]
    PageNotFound(u32),
    #[error("item {item} is not on canvas page {page}")]
    ItemNotFound { page: u32, item: CanvasItemId },
    #[error("crop rectangle does not overlap item {0}")]
    EmptyCrop(CanvasItemId),
}

/// Ordered collection of canvas pages plus the active page and selection.
/// 畫布頁面的有序集合，以及目前作用頁與選取項目。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasBoard {
    pages: Vec<CanvasPage>,
    active_page: Option<u32>,
    selected_item: Option<CanvasItemId>,
    geometry: CanvasGeometry,
}

impl Default for CanvasBoard {
    fn default() -> Self {
        Self::new(CanvasGeometry::default())
    }
}

impl CanvasBoard {
    /// Creates a board holding one blank colour page.
    pub fn new(geometry: CanvasGeometry) -> Self {
        Self {
            pages: vec![CanvasPage::blank(1)],
            active_page: Some(1),
            selected_item: None,
            geometry,
        }
    }

    /// Returns the board to its initial state: one blank page, no selection.
    pub fn reset(&mut self) {
        self.pages = vec![CanvasPage::blank(1)];
        self.active_page = Some(1);
        self.selected_item = None;
    }

    pub fn geometry(&self) -> &CanvasGeometry {
        &self.geometry
    }

    pub fn pages(&self) -> &[CanvasPage] {
        &self.pages
    }

    pub fn page(&self, id: u32) -> Option<&CanvasPage> {
        self.pages.iter().find(|page| page.id == id)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn active_page(&self) -> Option<u32> {
        self.active_page
    }

    pub fn selected_item(&self) -> Option<&CanvasItemId> {
        self.selected_item.as_ref()
    }

    pub fn set_active_page(&mut self, id: u32) -> Result<(), CanvasError> {
        self.index_of(id)?;
        self.active_page = Some(id);
        Ok(())
    }

    /// Appends a blank colour page and makes it active.
    pub fn add_page(&mut self) -> u32 {
        let id = self.next_page_id();
        self.pages.push(CanvasPage::blank(id));
        self.active_page = Some(id);
        id
    }

    /// Deep-copies page `id` (fresh item ids, same colour mode) to the end.
    pub fn duplicate_page(&mut self, id: u32) -> Result<u32, CanvasError> {
        let source = &self.pages[self.index_of(id)?];
        let items = source
            .items
            .iter()
            .map(|item| CanvasItem {
                id: CanvasItemId::derived_from(&item.id),
                ..item.clone()
            })
            .collect();
        let color_mode = source.color_mode;
        let new_id = self.next_page_id();
        self.pages.push(CanvasPage {
            id: new_id,
            items,
            color_mode,
        });
        self.active_page = Some(new_id);
        Ok(new_id)
    }

    /// Removes page `id` and renumbers the rest to `1..=N`.
    pub fn delete_page(&mut self, id: u32) -> Result<CanvasPage, CanvasError> {
        let index = self.index_of(id)?;
        let removed = self.pages.remove(index);
        for (position, page) in self.pages.iter_mut().enumerate() {
            page.id = position as u32 + 1;
        }

        self.active_page = match self.active_page {
            _ if self.pages.is_empty() => None,
            Some(active) if active == id => Some(index.min(self.pages.len() - 1) as u32 + 1),
            Some(active) if active > id => Some(active - 1),
            other => other,
        };

        if let Some(selected) = &self.selected_item {
            if removed.item(selected).is_some() {
                self.selected_item = None;
            }
        }
        Ok(removed)
    }

    /// Flips the colour mode of exactly one page.
    pub fn toggle_color_mode(&mut self, id: u32) -> Result<ColorMode, CanvasError> {
        let index = self.index_of(id)?;
        let page = &mut self.pages[index];
        page.color_mode = page.color_mode.toggled();
        Ok(page.color_mode)
    }

    /// Places `source` centred on `drop`, sized to keep its aspect ratio within
    /// the maximum dimension, then clamped inside the page.
    pub fn add_item(
        &mut self,
        page_id: u32,
        source: ItemSource,
        drop: Point,
    ) -> Result<CanvasItemId, CanvasError> {
        let index = self.index_of(page_id)?;
        let size = self.initial_size(source.natural_size);
        let mut item = CanvasItem {
            id: CanvasItemId::new(),
            file: source.file,
            x: drop.x - size.width / 2.0,
            y: drop.y - size.height / 2.0,
            width: size.width,
            height: size.height,
            rotation: 0,
            crop: None,
        };
        item.clamp_to(&self.geometry);
        let id = item.id.clone();
        self.pages[index].items.push(item);
        self.selected_item = Some(id.clone());
        Ok(id)
    }

    /// Moves the item's top-left corner to `to`, kept inside the page.
    pub fn move_item(
        &mut self,
        page_id: u32,
        item_id: &CanvasItemId,
        to: Point,
    ) -> Result<(), CanvasError> {
        self.update_item(page_id, item_id, |item| {
            item.x = to.x;
            item.y = to.y;
        })
    }

    pub fn resize_item(
        &mut self,
        page_id: u32,
        item_id: &CanvasItemId,
        size: Size,
    ) -> Result<(), CanvasError> {
        self.update_item(page_id, item_id, |item| {
            item.width = size.width;
            item.height = size.height;
        })
    }

    /// Rotates by exactly 90 degrees and returns the new rotation.
    pub fn rotate_item(
        &mut self,
        page_id: u32,
        item_id: &CanvasItemId,
        direction: RotateDirection,
    ) -> Result<i32, CanvasError> {
        let mut rotation = 0;
        self.update_item(page_id, item_id, |item| {
            item.rotation += match direction {
                RotateDirection::Clockwise => 90,
                RotateDirection::CounterClockwise => -90,
            };
            rotation = item.rotation;
        })?;
        Ok(rotation)
    }

    /// Sets (clamped to the item bounds) or clears the crop rectangle.
    pub fn crop_item(
        &mut self,
        page_id: u32,
        item_id: &CanvasItemId,
        crop: Option<CropRect>,
    ) -> Result<(), CanvasError> {
        let index = self.index_of(page_id)?;
        let item = find_item_mut(&mut self.pages[index], item_id)?;
        item.crop = match crop {
            None => None,
            Some(rect) => Some(
                clamp_crop(rect, item.width, item.height)
                    .ok_or_else(|| CanvasError::EmptyCrop(item_id.clone()))?,
            ),
        };
        Ok(())
    }

    pub fn delete_item(
        &mut self,
        page_id: u32,
        item_id: &CanvasItemId,
    ) -> Result<CanvasItem, CanvasError> {
        let index = self.index_of(page_id)?;
        let page = &mut self.pages[index];
        let position = page
            .items
            .iter()
            .position(|item| &item.id == item_id)
            .ok_or_else(|| CanvasError::ItemNotFound {
                page: page_id,
                item: item_id.clone(),
            })?;
        let removed = page.items.remove(position);
        if self.selected_item.as_ref() == Some(item_id) {
            self.selected_item = None;
        }
        Ok(removed)
    }

    pub fn select_item(&mut self, page_id: u32, item_id: &CanvasItemId) -> Result<(), CanvasError> {
        let index = self.index_of(page_id)?;
        find_item_mut(&mut self.pages[index], item_id)?;
        self.selected_item = Some(item_id.clone());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected_item = None;
    }

    /// Pages that carry content and are therefore printed and billed.
    pub fn billable_pages(&self) -> impl Iterator<Item = &CanvasPage> {
        self.pages.iter().filter(|page| !page.is_blank())
    }

    pub fn total_cost(&self, tariff: &Tariff) -> u64 {
        self.billable_pages()
            .map(|page| tariff.canvas_page_cost(page.color_mode))
            .fold(0, u64::saturating_add)
    }

    fn next_page_id(&self) -> u32 {
        self.pages.len() as u32 + 1
    }

    fn index_of(&self, id: u32) -> Result<usize, CanvasError> {
        self.pages
            .iter()
            .position(|page| page.id == id)
            .ok_or(CanvasError::PageNotFound(id))
    }

    fn update_item<F>(
        &mut self,
        page_id: u32,
        item_id: &CanvasItemId,
        op: F,
    ) -> Result<(), CanvasError>
    where
        F: FnOnce(&mut CanvasItem),
    {
        let index = self.index_of(page_id)?;
        let geometry = self.geometry;
        let item = find_item_mut(&mut self.pages[index], item_id)?;
        op(item);
        item.clamp_to(&geometry);
        Ok(())
    }

    fn initial_size(&self, natural: Option<Size>) -> Size {
        let max = self.geometry.max_item_dimension;
        match natural {
            Some(size) if size.width > 0.0 && size.height > 0.0 => {
                let longest = size.width.max(size.height);
                let scale = if longest > max { max / longest } else { 1.0 };
                Size::new(size.width * scale, size.height * scale)
            }
            _ => Size::new(max, max),
        }
    }
}

fn find_item_mut<'a>(
    page: &'a mut CanvasPage,
    item_id: &CanvasItemId,
) -> Result<&'a mut CanvasItem, CanvasError> {
    let page_id = page.id;
    page.items
        .iter_mut()
        .find(|item| &item.id == item_id)
        .ok_or_else(|| CanvasError::ItemNotFound {
            page: page_id,
            item: item_id.clone(),
        })
}

fn clamp_span(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max.max(min))
}

fn clamp_crop(rect: CropRect, width: f32, height: f32) -> Option<CropRect> {
    let x = clamp_span(rect.x, 0.0, width);
    let y = clamp_span(rect.y, 0.0, height);
    let crop = CropRect {
        x,
        y,
        width: clamp_span(rect.width, 0.0, width - x),
        height: clamp_span(rect.height, 0.0, height - y),
    };
    (crop.width > 0.0 && crop.height > 0.0).then_some(crop)
}
