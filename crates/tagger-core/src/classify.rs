//! The row classification seam and transaction numbering.
//!
//! Each bank layout implements `RowClassifier`; the engine walks rows in
//! reading order, collects candidates per page, and numbers them in a final
//! fold over the page-ordered list. No mutable counter threads through the
//! page loop, and indices are guaranteed gapless.

use crate::placement::{
    baseline_for, resolve_x, text_width, Color, HorizontalPlan, TagPlacement,
};
use crate::profile::{Bank, BankProfile};
use crate::token::{PageWords, Rect, Row, Token};

/// Per-document state shared across pages during classification.
#[derive(Debug, Clone)]
pub struct DocumentContext {
    /// BBVA layout: set once the movement-detail header page was seen;
    /// rows before that page are advertising and summary material.
    pub tagging_started: bool,
    /// Rows starting above this y on the current page are skipped
    /// (HSBC first-page column header, DB table top).
    pub min_y: f64,
    /// Rows starting below this y on the current page are skipped
    /// (DB summary footer).
    pub max_y: f64,
    /// Emit debug circle markers at anchor points.
    pub debug_markers: bool,
}

impl DocumentContext {
    pub fn new(debug_markers: bool) -> Self {
        Self {
            tagging_started: false,
            min_y: 0.0,
            max_y: f64::INFINITY,
            debug_markers,
        }
    }
}

/// A row that passed every filter: the anchor token plus everything needed
/// to place the tag once its final text is known.
#[derive(Debug, Clone)]
pub struct TransactionCandidate {
    pub anchor: Token,
    pub plan: HorizontalPlan,
    pub font_size: f64,
    /// Baseline y for the label, top-origin.
    pub baseline_y: f64,
    /// Filled white before the tag is written (zero-balance convention).
    pub mask: Option<Rect>,
    /// Debug marker position, when markers are enabled.
    pub marker: Option<(f64, f64)>,
}

impl TransactionCandidate {
    /// Candidate anchored on a token, with the shared baseline rule and the
    /// font size taken from the anchor's height (optionally floored).
    pub fn anchored(anchor: &Token, plan: HorizontalPlan, min_font_size: Option<f64>) -> Self {
        let mut font_size = anchor.bbox.height();
        if let Some(min) = min_font_size {
            font_size = font_size.max(min);
        }
        Self {
            anchor: anchor.clone(),
            plan,
            font_size,
            baseline_y: baseline_for(&anchor.bbox, font_size),
            mask: None,
            marker: None,
        }
    }
}

/// A classified transaction with its document-global sequence index and
/// fully resolved placement.
#[derive(Debug, Clone)]
pub struct DetectedTransaction {
    /// 1-based, strictly increasing over the whole document.
    pub index: usize,
    /// 0-based page the tag belongs to.
    pub page_index: usize,
    pub anchor: Token,
    pub placement: TagPlacement,
}

/// One implementation per bank layout. Classification is an ordered
/// short-circuit filter pipeline; a `None` outcome is the expected fate of
/// most rows, never an error.
pub trait RowClassifier: Send + Sync {
    fn bank(&self) -> Bank;

    fn profile(&self) -> &'static BankProfile;

    /// Runs once per page, before any of its rows are classified.
    fn begin_page(&self, _page: &PageWords, _ctx: &mut DocumentContext) {}

    /// Decide whether this row is a transaction and which token to anchor on.
    fn classify(
        &self,
        row: &Row<'_>,
        page: &PageWords,
        ctx: &DocumentContext,
    ) -> Option<TransactionCandidate>;

    /// Expected transaction count from a statement summary table, for
    /// layouts that publish one. Used for validation only.
    fn expected_total(&self, _pages_text: &[String]) -> Option<u32> {
        None
    }
}

/// Assign indices and resolve placements for candidates collected per page.
///
/// `pages` must be in document page order; candidates within a page must be
/// in row (top-to-bottom) order. The result carries indices 1..=N with no
/// gaps regardless of how many pages contributed zero candidates.
pub fn number_transactions(
    pages: Vec<(usize, f64, Vec<TransactionCandidate>)>,
    prefix: &str,
) -> Vec<DetectedTransaction> {
    let mut out = Vec::new();
    let mut index = 0usize;

    for (page_index, page_width, candidates) in pages {
        for candidate in candidates {
            index += 1;
            let text = format!("{}_{}", prefix, index);
            let width = text_width(&text, candidate.font_size);
            let x = resolve_x(candidate.plan, &candidate.anchor.bbox, width, page_width);
            out.push(DetectedTransaction {
                index,
                page_index,
                anchor: candidate.anchor,
                placement: TagPlacement {
                    text,
                    x,
                    y: candidate.baseline_y,
                    font_size: candidate.font_size,
                    color: Color::RED,
                    mask: candidate.mask,
                    marker: candidate.marker,
                },
            });
        }
    }
    log::debug!("numbered {} transactions for prefix {}", index, prefix);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::HorizontalPlan;
    use crate::token::Rect;

    fn candidate(left: f64) -> TransactionCandidate {
        let anchor = Token::new("1,500.00", Rect::new(left, 100.0, left + 50.0, 112.0));
        TransactionCandidate::anchored(
            &anchor,
            HorizontalPlan::BesideAnchor {
                padding: 10.0,
                flip_fraction: 0.7,
            },
            None,
        )
    }

    #[test]
    fn test_indices_strictly_increasing_and_gapless_across_pages() {
        let pages = vec![
            (0, 600.0, vec![candidate(100.0), candidate(100.0)]),
            (1, 600.0, vec![]),
            (2, 600.0, vec![candidate(100.0)]),
        ];
        let tagged = number_transactions(pages, "BMX_USD");
        let indices: Vec<usize> = tagged.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(tagged[2].page_index, 2);
        assert_eq!(tagged[0].placement.text, "BMX_USD_1");
        assert_eq!(tagged[2].placement.text, "BMX_USD_3");
    }

    #[test]
    fn test_font_size_equals_anchor_height() {
        let c = candidate(100.0);
        assert!((c.font_size - 12.0).abs() < 1e-9);
        let tagged = number_transactions(vec![(0, 600.0, vec![c])], "X");
        assert!((tagged[0].placement.font_size - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_min_font_size_floor() {
        let anchor = Token::new("0.00", Rect::new(10.0, 10.0, 30.0, 16.0));
        let c = TransactionCandidate::anchored(
            &anchor,
            HorizontalPlan::RightMargin { margin: 40.0 },
            Some(10.0),
        );
        assert!((c.font_size - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_pages_yield_no_transactions() {
        let tagged = number_transactions(vec![(0, 600.0, vec![]), (1, 600.0, vec![])], "P");
        assert!(tagged.is_empty());
    }
}
