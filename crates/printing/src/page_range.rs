//! Page-range parsing for document print jobs.
//! 文件列印的頁碼範圍解析。
//!
//! The lenient entry points never fail: tokens that cannot be parsed or fall
//! outside `1..=total_pages` contribute nothing, so a price preview can always
//! be rendered. [`inspect_page_range`] and [`validate_page_range`] report the
//! rejected tokens for inline validation.

use std::fmt;

use thiserror::Error;

use crate::job::PageSelection;

/// Why a custom range token was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Not an integer or `start-end` pair.
    Malformed,
    /// Parsed, but outside `1..=total_pages`.
    OutOfBounds,
    /// `start` is greater than `end`.
    Reversed,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Malformed => f.write_str("not a page number or range"),
            RejectReason::OutOfBounds => f.write_str("outside the document"),
            RejectReason::Reversed => f.write_str("range start is after its end"),
        }
    }
}

/// A token from a custom range string that contributed no pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedToken {
    pub token: String,
    pub reason: RejectReason,
}

/// Best-effort parse result together with every rejected token.
/// 盡力解析的結果，以及所有被忽略的片段。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageRangeReport {
    pub pages: u32,
    pub rejected: Vec<RejectedToken>,
}

impl PageRangeReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Errors raised by strict page-range validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageRangeError {
    #[error("page range is empty")]
    Empty,
    #[error("invalid page range entry '{token}': {reason}")]
    Rejected { token: String, reason: RejectReason },
    #[error("page range selects no pages of a {total_pages}-page document")]
    NothingSelected { total_pages: u32 },
}

/// Number of pages printed for `selection` from a document of `total_pages`.
pub fn pages_to_print(selection: &PageSelection, total_pages: u32) -> u32 {
    match selection {
        PageSelection::All => total_pages,
        PageSelection::Odd => total_pages.div_ceil(2),
        PageSelection::Even => total_pages / 2,
        PageSelection::Custom(input) => parse_page_range(input, total_pages),
    }
}

/// Ordered page numbers for `selection` from a document of `total_pages`.
pub fn expand(selection: &PageSelection, total_pages: u32) -> Vec<u32> {
    match selection {
        PageSelection::All => (1..=total_pages).collect(),
        PageSelection::Odd => (1..=total_pages).step_by(2).collect(),
        PageSelection::Even => (2..=total_pages).step_by(2).collect(),
        PageSelection::Custom(input) => merged_spans(input, total_pages)
            .0
            .into_iter()
            .flat_map(|(start, end)| start..=end)
            .collect(),
    }
}

/// Lenient custom-range count: `"1-5, 8, 11-13"` of a 20-page document is 9.
/// Pages named by more than one token are counted once.
pub fn parse_page_range(input: &str, total_pages: u32) -> u32 {
    inspect_page_range(input, total_pages).pages
}

/// Parses `input` and reports the selected page count plus rejected tokens.
pub fn inspect_page_range(input: &str, total_pages: u32) -> PageRangeReport {
    let (spans, rejected) = merged_spans(input, total_pages);
    let pages = spans.iter().map(|(start, end)| end - start + 1).sum();
    PageRangeReport { pages, rejected }
}

/// Strict variant: fails on the first rejected token or when nothing is selected.
pub fn validate_page_range(input: &str, total_pages: u32) -> Result<u32, PageRangeError> {
    if input.trim().is_empty() {
        return Err(PageRangeError::Empty);
    }
    let report = inspect_page_range(input, total_pages);
    if let Some(first) = report.rejected.into_iter().next() {
        return Err(PageRangeError::Rejected {
            token: first.token,
            reason: first.reason,
        });
    }
    if report.pages == 0 {
        return Err(PageRangeError::NothingSelected { total_pages });
    }
    Ok(report.pages)
}

fn merged_spans(input: &str, total_pages: u32) -> (Vec<(u32, u32)>, Vec<RejectedToken>) {
    let mut spans = Vec::new();
    let mut rejected = Vec::new();

    for token in input.split(',').map(str::trim) {
        if token.is_empty() {
            continue;
        }
        match parse_token(token, total_pages) {
            Ok(span) => spans.push(span),
            Err(reason) => rejected.push(RejectedToken {
                token: token.to_string(),
                reason,
            }),
        }
    }

    spans.sort_unstable();
    let mut merged: Vec<(u32, u32)> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match merged.last_mut() {
            Some(last) if start <= last.1.saturating_add(1) => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    (merged, rejected)
}

fn parse_token(token: &str, total_pages: u32) -> Result<(u32, u32), RejectReason> {
    let (start, end) = match token.split_once('-') {
        Some((start, end)) => (parse_page(start)?, parse_page(end)?),
        None => {
            let page = parse_page(token)?;
            (page, page)
        }
    };
    if start > end {
        return Err(RejectReason::Reversed);
    }
    if start < 1 || end > total_pages {
        return Err(RejectReason::OutOfBounds);
    }
    Ok((start, end))
}

fn parse_page(raw: &str) -> Result<u32, RejectReason> {
    raw.trim().parse::<u32>().map_err(|_| RejectReason::Malformed)
}
