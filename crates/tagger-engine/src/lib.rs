//! Document tagging orchestrator.
//!
//! Ties the pipeline together: OCR fallback decision, per-page word
//! extraction, line reconstruction, row classification, document-global
//! index assignment, and page composition. Banks differ only through the
//! classifier registry; everything here is layout-agnostic.

use std::path::{Path, PathBuf};

use tagger_core::{
    group_rows, number_transactions, Bank, Color, DetectedTransaction, DocumentContext, Result,
    RowClassifier, TransactionCandidate,
};
use tagger_ocr::{force_ocr, has_readable_text};
use tagger_pdf::PdfDocument;

/// Debug marker radius, points.
const MARKER_RADIUS: f64 = 3.0;

/// Knobs that apply to a whole run, not to one bank.
#[derive(Debug, Clone, Default)]
pub struct TagOptions {
    /// Draw a small blue circle at every resolved tag position.
    pub debug_markers: bool,
    /// Keep the intermediate `_OCR.pdf` instead of deleting it.
    pub keep_ocr: bool,
}

/// Outcome of tagging one document.
#[derive(Debug)]
pub struct TagReport {
    pub output: PathBuf,
    pub tag_count: usize,
    /// Transaction count the statement itself publishes, when the layout
    /// has a summary table. Mismatch against `tag_count` is a warning.
    pub expected_total: Option<u32>,
    pub ocr_applied: bool,
}

/// Detect transactions without writing anything.
///
/// Returns the detections plus the path actually analyzed, which differs
/// from `path` when the document needed OCR.
pub fn transaction_coordinates(
    path: &Path,
    bank: Bank,
    options: &TagOptions,
) -> Result<(Vec<DetectedTransaction>, PathBuf)> {
    let classifier = tagger_banks::classifier_for(bank);
    let (doc, work_path) = open_with_ocr(path)?;
    let prefix = bank.as_str().to_uppercase();
    let detected = detect(&doc, classifier.as_ref(), &prefix, options)?;
    Ok((detected, work_path))
}

/// Detect and stamp transactions, writing `<stem><suffix>` next to the
/// input file.
pub fn process_file(path: &Path, bank: Bank, prefix: &str, options: &TagOptions) -> Result<TagReport> {
    let classifier = tagger_banks::classifier_for(bank);
    let (mut doc, work_path) = open_with_ocr(path)?;
    let ocr_applied = work_path != path;

    let detected = detect(&doc, classifier.as_ref(), prefix, options)?;
    if detected.is_empty() {
        log::info!("no transactions detected in {}", path.display());
    }

    for txn in &detected {
        let placement = &txn.placement;
        if let Some(mask) = placement.mask {
            doc.fill_rect(txn.page_index, mask, Color::WHITE)?;
        }
        if let Some(center) = placement.marker {
            doc.draw_circle(txn.page_index, center, MARKER_RADIUS, Color::BLUE)?;
        }
        doc.insert_text(
            txn.page_index,
            placement.x,
            placement.y,
            &placement.text,
            placement.font_size,
            placement.color,
        )?;
        log::debug!(
            "[{}] page {} -> {} at ({:.1}, {:.1})",
            txn.index,
            txn.page_index + 1,
            placement.text,
            placement.x,
            placement.y
        );
    }

    let expected_total = classifier.expected_total(&doc.pages_text());
    if let Some(expected) = expected_total {
        let actual = detected.len() as u32;
        if expected == actual {
            log::info!("tag count matches statement summary ({})", expected);
        } else {
            log::warn!(
                "statement summary expects {} movements, tagged {} (difference {})",
                expected,
                actual,
                expected.abs_diff(actual)
            );
        }
    }

    let output = output_path(path, classifier.profile().output_suffix);
    doc.save(&output)?;
    log::info!(
        "tagged {} transactions -> {}",
        detected.len(),
        output.display()
    );

    if ocr_applied && !options.keep_ocr {
        if let Err(e) = std::fs::remove_file(&work_path) {
            log::warn!("could not remove {}: {}", work_path.display(), e);
        }
    }

    Ok(TagReport {
        output,
        tag_count: detected.len(),
        expected_total,
        ocr_applied,
    })
}

/// Open the document, swapping in the OCR rendition when the original has
/// no readable text layer.
fn open_with_ocr(path: &Path) -> Result<(PdfDocument, PathBuf)> {
    let doc = PdfDocument::open(path)?;
    if has_readable_text(&doc) {
        return Ok((doc, path.to_path_buf()));
    }

    log::info!("{}: no readable text layer, trying OCR", path.display());
    match force_ocr(path) {
        Some(ocr_path) => {
            let ocr_doc = PdfDocument::open(&ocr_path)?;
            Ok((ocr_doc, ocr_path))
        }
        None => Ok((doc, path.to_path_buf())),
    }
}

/// Run extraction and classification over every page, then assign the
/// document-global indices in one pass.
fn detect(
    doc: &PdfDocument,
    classifier: &dyn RowClassifier,
    prefix: &str,
    options: &TagOptions,
) -> Result<Vec<DetectedTransaction>> {
    let mut ctx = DocumentContext::new(options.debug_markers);
    let mut pages: Vec<(usize, f64, Vec<TransactionCandidate>)> = Vec::new();

    for page_index in 0..doc.page_count() {
        let page = doc.page_words(page_index)?;
        classifier.begin_page(&page, &mut ctx);

        let mut candidates = Vec::new();
        for row in group_rows(&page.tokens, classifier.profile().grouping) {
            if let Some(candidate) = classifier.classify(&row, &page, &ctx) {
                candidates.push(candidate);
            }
        }
        log::debug!(
            "page {}: {} candidate rows",
            page_index + 1,
            candidates.len()
        );
        pages.push((page_index, page.width, candidates));
    }

    Ok(number_transactions(pages, prefix))
}

/// `statement.pdf` with suffix `_BBVA_TAGGED.pdf` becomes
/// `statement_BBVA_TAGGED.pdf`, beside the input.
fn output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    input.with_file_name(format!("{}{}", stem, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagger_core::{
        BankProfile, HorizontalPlan, PageWords, Rect, Row, Token, TransactionCandidate,
    };

    /// Accepts every row whose first token has a digit, anchoring on it.
    struct EveryDigitRow;

    impl RowClassifier for EveryDigitRow {
        fn bank(&self) -> Bank {
            Bank::Bbva
        }

        fn profile(&self) -> &'static BankProfile {
            BankProfile::for_bank(Bank::Bbva)
        }

        fn classify(
            &self,
            row: &Row<'_>,
            _page: &PageWords,
            _ctx: &DocumentContext,
        ) -> Option<TransactionCandidate> {
            let first = row.first()?;
            if !first.text.chars().any(|c| c.is_ascii_digit()) {
                return None;
            }
            Some(TransactionCandidate::anchored(
                first,
                HorizontalPlan::RightMargin { margin: 40.0 },
                None,
            ))
        }
    }

    fn page_with_rows(index: usize, rows: &[&str]) -> PageWords {
        let tokens = rows
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let top = 100.0 + i as f64 * 30.0;
                Token::new(*text, Rect::new(40.0, top, 120.0, top + 10.0))
            })
            .collect();
        PageWords {
            index,
            width: 612.0,
            height: 792.0,
            tokens,
        }
    }

    fn detect_pages(pages: Vec<PageWords>) -> Vec<DetectedTransaction> {
        let classifier = EveryDigitRow;
        let mut ctx = DocumentContext::new(false);
        let mut collected = Vec::new();
        for page in pages {
            classifier.begin_page(&page, &mut ctx);
            let mut candidates = Vec::new();
            for row in group_rows(&page.tokens, classifier.profile().grouping) {
                if let Some(c) = classifier.classify(&row, &page, &ctx) {
                    candidates.push(c);
                }
            }
            collected.push((page.index, page.width, candidates));
        }
        number_transactions(collected, "T")
    }

    #[test]
    fn test_indices_monotonic_across_pages() {
        let detected = detect_pages(vec![
            page_with_rows(0, &["02/OCT", "header", "03/OCT"]),
            page_with_rows(1, &["no", "digits", "here"]),
            page_with_rows(2, &["04/OCT"]),
        ]);
        let indices: Vec<usize> = detected.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(detected[0].page_index, 0);
        assert_eq!(detected[2].page_index, 2);
        assert_eq!(detected[2].placement.text, "T_3");
    }

    #[test]
    fn test_rows_tagged_top_to_bottom_within_a_page() {
        let detected = detect_pages(vec![page_with_rows(0, &["01/OCT", "02/OCT"])]);
        assert!(detected[0].anchor.bbox.top < detected[1].anchor.bbox.top);
        assert_eq!(detected[0].anchor.text, "01/OCT");
    }

    #[test]
    fn test_output_path_appends_suffix() {
        assert_eq!(
            output_path(Path::new("/data/oct.pdf"), "_BBVA_TAGGED.pdf"),
            PathBuf::from("/data/oct_BBVA_TAGGED.pdf")
        );
        assert_eq!(
            output_path(Path::new("scan_OCR.pdf"), "_TAGGED.pdf"),
            PathBuf::from("scan_OCR_TAGGED.pdf")
        );
    }
}
