//! HSBC statement layout.
//!
//! Amounts live in a band between half page width and the running-balance
//! column; the last qualifying token in a row is the transaction amount.
//! The side of the 67% boundary it falls on decides the opposite fixed
//! column the tag lands in. Rows must open with a day-of-month number or
//! start far enough left, and the first page gates everything above the
//! "DETALLE ... MOVIMIENTOS" column header.

use tagger_core::{
    contains_any, group_rows, is_valid_day, Align, Bank, BankProfile, DocumentContext,
    HorizontalPlan, PageWords, Row, RowClassifier, RowGrouping, Token, TransactionCandidate,
};

/// Dot-bearing numeric token. Looser than the strict cents check on
/// purpose: OCR output drops trailing zeros often enough that `1234.5`
/// must still count here.
fn is_dotted_number(text: &str) -> bool {
    let clean: String = text
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    clean.contains('.') && clean.parse::<f64>().is_ok()
}

pub struct HsbcClassifier;

impl RowClassifier for HsbcClassifier {
    fn bank(&self) -> Bank {
        Bank::Hsbc
    }

    fn profile(&self) -> &'static BankProfile {
        BankProfile::for_bank(Bank::Hsbc)
    }

    fn begin_page(&self, page: &PageWords, ctx: &mut DocumentContext) {
        ctx.min_y = 0.0;
        if page.index != 0 {
            return;
        }
        // First-page column header; a coarse quantized grouping is enough
        // to find it even in noisy OCR output.
        for row in group_rows(&page.tokens, RowGrouping::Quantize { step: 5.0 }) {
            let text = row.joined_text_upper();
            if text.contains("DETALLE") && text.contains("MOVIMIENTOS") {
                let bottom = row
                    .tokens
                    .iter()
                    .map(|t| t.bbox.bottom)
                    .fold(f64::MIN, f64::max);
                ctx.min_y = bottom - 10.0;
                break;
            }
        }
    }

    fn classify(
        &self,
        row: &Row<'_>,
        page: &PageWords,
        ctx: &DocumentContext,
    ) -> Option<TransactionCandidate> {
        let first = row.first()?;
        if first.bbox.top < ctx.min_y {
            return None;
        }

        let text = row.joined_text_upper();
        let profile = self.profile();
        if contains_any(&text, profile.stoplist) {
            return None;
        }

        let (zone_start, zone_end) = profile.amount_zone?;
        let target: &Token = row
            .tokens
            .iter()
            .filter(|t| is_dotted_number(&t.text))
            .filter(|t| {
                t.bbox.left > page.width * zone_start && t.bbox.left < page.width * zone_end
            })
            .last()?;

        let valid_start = is_valid_day(&first.text)
            || first.bbox.left < page.width * profile.date_zone_fraction.unwrap_or(0.0);
        if !valid_start || text.contains("SALDO") || text.contains("TOTAL") {
            return None;
        }

        let split_x = page.width * profile.split_fraction?;
        let (withdrawal_col, deposit_col) = profile.tag_columns?;

        // Withdrawals sit left of the boundary and are tagged in the
        // deposit column; deposits get the withdrawal column, right-aligned
        // so the label ends where that column starts.
        let (column_x, align) = if target.bbox.left < split_x {
            (page.width * deposit_col, Align::Left)
        } else {
            (page.width * withdrawal_col, Align::Right)
        };

        let mut candidate = TransactionCandidate::anchored(
            target,
            HorizontalPlan::FixedColumn { x: column_x, align },
            profile.min_font_size,
        );
        if ctx.debug_markers {
            candidate.marker = Some((column_x, target.bbox.mid_y()));
        }
        Some(candidate)
    }
}
