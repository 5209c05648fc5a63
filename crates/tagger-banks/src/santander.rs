//! Santander statement layout.
//!
//! Transaction rows open with a date in the left 18% of the page. The
//! amount is searched in a fixed horizontal band between the description
//! and the running balance; its side of the debit/credit boundary decides
//! which fixed column receives the tag (always the opposite column, so the
//! tag never covers the amount itself).

use once_cell::sync::Lazy;
use regex::Regex;

use tagger_core::{
    parse_amount, Align, Bank, BankProfile, DocumentContext, HorizontalPlan, PageWords, Row,
    RowClassifier, Token, TransactionCandidate,
};

/// `01-ENE`, `01 ENE`, `12/12`, `1.DIC` at the start of the assembled
/// date text.
static DATE_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}[\s\.\-/]+(?:[A-Z]{3}|\d{2})").unwrap());

pub struct SantanderClassifier;

impl SantanderClassifier {
    fn row_starts_with_date(&self, row: &Row<'_>, page_width: f64) -> bool {
        let profile = self.profile();
        let limit = page_width * profile.date_zone_fraction.unwrap_or(1.0);

        // Up to the first three tokens in the date zone form "12 DIC" etc.
        let start_text = row
            .tokens
            .iter()
            .filter(|t| t.bbox.left < limit)
            .take(3)
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();

        DATE_START.is_match(&start_text)
    }

    fn find_amount<'a>(&self, row: &Row<'a>, page_width: f64) -> Option<(&'a Token, f64)> {
        let (zone_start, zone_end) = self.profile().amount_zone?;
        let x_start = page_width * zone_start;
        let x_end = page_width * zone_end;

        for token in &row.tokens {
            let mid = token.bbox.mid_x();
            if mid < x_start || mid > x_end {
                continue;
            }
            if !token.text.chars().any(|c| c.is_ascii_digit()) {
                continue;
            }
            if let Some(val) = parse_amount(&token.text) {
                return Some((*token, val));
            }
        }
        None
    }
}

impl RowClassifier for SantanderClassifier {
    fn bank(&self) -> Bank {
        Bank::Santander
    }

    fn profile(&self) -> &'static BankProfile {
        BankProfile::for_bank(Bank::Santander)
    }

    fn classify(
        &self,
        row: &Row<'_>,
        page: &PageWords,
        _ctx: &DocumentContext,
    ) -> Option<TransactionCandidate> {
        if !self.row_starts_with_date(row, page.width) {
            return None;
        }

        let (amount, value) = self.find_amount(row, page.width)?;
        let profile = self.profile();
        let split_x = page.width * profile.split_fraction?;
        let (deposit_col, withdrawal_col) = profile.tag_columns?;

        // Deposits sit left of the boundary; their tag goes to the
        // withdrawal column and vice versa, keeping the amount visible.
        let column_x = if amount.bbox.mid_x() < split_x {
            log::debug!("deposit {:.2} at row {:.0}", value, row.key);
            page.width * withdrawal_col
        } else {
            log::debug!("withdrawal {:.2} at row {:.0}", value, row.key);
            page.width * deposit_col
        };

        Some(TransactionCandidate::anchored(
            amount,
            HorizontalPlan::FixedColumn {
                x: column_x,
                align: Align::Left,
            },
            profile.min_font_size,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{page, row_of, tok};

    fn ctx() -> DocumentContext {
        DocumentContext::new(false)
    }

    // 612pt page: date zone ends at 110, amount band 367..520, split 465
    fn transaction_page(amount_left: f64) -> tagger_core::PageWords {
        page(
            0,
            612.0,
            792.0,
            vec![
                tok("12", 30.0, 400.0, 45.0, 410.0),
                tok("DIC", 48.0, 400.0, 70.0, 410.0),
                tok("TRANSFERENCIA", 120.0, 400.0, 250.0, 410.0),
                tok("1,500.00", amount_left, 400.0, amount_left + 50.0, 410.0),
            ],
        )
    }

    #[test]
    fn test_deposit_routes_to_withdrawal_column() {
        // amount mid 420 < split 465.12 → deposit → tag at 0.76 * width
        let p = transaction_page(395.0);
        let c = SantanderClassifier
            .classify(&row_of(&p), &p, &ctx())
            .expect("transaction row");
        match c.plan {
            HorizontalPlan::FixedColumn { x, align } => {
                assert!((x - 612.0 * 0.76).abs() < 1e-9);
                assert_eq!(align, Align::Left);
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_withdrawal_routes_to_deposit_column() {
        // amount mid 495 > split → withdrawal → tag at 0.64 * width
        let p = transaction_page(470.0);
        let c = SantanderClassifier
            .classify(&row_of(&p), &p, &ctx())
            .expect("transaction row");
        match c.plan {
            HorizontalPlan::FixedColumn { x, .. } => {
                assert!((x - 612.0 * 0.64).abs() < 1e-9);
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_row_without_left_zone_date_is_skipped() {
        let p = page(
            0,
            612.0,
            792.0,
            vec![
                tok("SALDO", 120.0, 400.0, 160.0, 410.0),
                tok("1,500.00", 400.0, 400.0, 450.0, 410.0),
            ],
        );
        assert!(SantanderClassifier
            .classify(&row_of(&p), &p, &ctx())
            .is_none());
    }

    #[test]
    fn test_amount_outside_band_is_ignored() {
        // amount sits in the running-balance column (mid > 0.85 * width)
        let p = transaction_page(550.0);
        assert!(SantanderClassifier
            .classify(&row_of(&p), &p, &ctx())
            .is_none());
    }

    #[test]
    fn test_numeric_date_form_accepted() {
        let p = page(
            0,
            612.0,
            792.0,
            vec![
                tok("12/12", 30.0, 400.0, 60.0, 410.0),
                tok("PAGO", 120.0, 400.0, 160.0, 410.0),
                tok("800.00", 400.0, 400.0, 440.0, 410.0),
            ],
        );
        assert!(SantanderClassifier
            .classify(&row_of(&p), &p, &ctx())
            .is_some());
    }
}
