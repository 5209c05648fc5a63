//! Monex statement layout.
//!
//! The structural anchor is the 8-digit operation reference. Everything to
//! its right within a narrow vertical band forms the numeric zone; the
//! transaction amount there is paired with a literal `0.00` balance
//! placeholder. That placeholder gets masked with a white rectangle and the
//! tag takes its place.

use once_cell::sync::Lazy;
use regex::Regex;

use tagger_core::{
    parse_number, Align, Bank, BankProfile, DocumentContext, HorizontalPlan, PageWords, Row,
    RowClassifier, Token, TransactionCandidate,
};

static REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{8}\b").unwrap());

/// Vertical half-height of the numeric zone around the reference midline.
const ZONE_TOLERANCE: f64 = 20.0;
/// White-out margin around the masked `0.00`, points.
const MASK_PAD_X: f64 = 5.0;
const MASK_PAD_Y: f64 = 2.0;

pub struct MonexClassifier;

impl MonexClassifier {
    /// Page tokens right of the reference within the vertical band, sorted
    /// left-to-right so amount-then-balance reading order holds.
    fn zone_tokens<'a>(&self, page: &'a PageWords, reference: &Token) -> Vec<&'a Token> {
        let mid = reference.bbox.mid_y();
        let mut zone: Vec<&Token> = page
            .tokens
            .iter()
            .filter(|t| (t.bbox.mid_y() - mid).abs() < ZONE_TOLERANCE)
            .filter(|t| t.bbox.left > reference.bbox.right)
            .collect();
        zone.sort_by(|a, b| {
            a.bbox
                .left
                .partial_cmp(&b.bbox.left)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        zone
    }

    /// The `0.00` placeholder adjacent to a positive amount, if the zone
    /// holds that pairing in either order.
    fn find_zero_target<'a>(&self, zone: &[&'a Token]) -> Option<&'a Token> {
        let numbers: Vec<(f64, &Token)> = zone
            .iter()
            .filter_map(|t| parse_number(&t.text).map(|v| (v, *t)))
            .collect();

        for (i, (val, _)) in numbers.iter().enumerate() {
            if *val <= 0.0 {
                continue;
            }
            if let Some((next_val, next_tok)) = numbers.get(i + 1) {
                if *next_val == 0.0 {
                    return Some(next_tok);
                }
            }
            if i > 0 {
                let (prev_val, prev_tok) = numbers[i - 1];
                if prev_val == 0.0 {
                    return Some(prev_tok);
                }
            }
        }
        None
    }
}

impl RowClassifier for MonexClassifier {
    fn bank(&self) -> Bank {
        Bank::Monex
    }

    fn profile(&self) -> &'static BankProfile {
        BankProfile::for_bank(Bank::Monex)
    }

    fn classify(
        &self,
        row: &Row<'_>,
        page: &PageWords,
        ctx: &DocumentContext,
    ) -> Option<TransactionCandidate> {
        let line_text = row
            .tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let reference_text = REFERENCE.find(&line_text)?.as_str();
        let reference: &Token = row.tokens.iter().find(|t| t.text == reference_text)?;

        let zone = self.zone_tokens(page, reference);
        let zero = self.find_zero_target(&zone)?;

        let profile = self.profile();
        let mut font_size = reference.bbox.height();
        if let Some(min) = profile.min_font_size {
            font_size = font_size.max(min);
        }

        let tag_x = zero.bbox.left - profile.padding;
        let mask = zero.bbox.inflate(MASK_PAD_X, MASK_PAD_Y);

        Some(TransactionCandidate {
            anchor: reference.clone(),
            plan: HorizontalPlan::FixedColumn {
                x: tag_x,
                align: Align::Left,
            },
            font_size,
            // aligned with the reference line rather than the masked zero
            baseline_y: reference.bbox.bottom,
            mask: Some(mask),
            marker: ctx
                .debug_markers
                .then_some((tag_x, reference.bbox.bottom)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{page, row_of, tok};
    use tagger_core::Rect;

    fn ctx() -> DocumentContext {
        DocumentContext::new(false)
    }

    fn statement_page() -> tagger_core::PageWords {
        page(
            0,
            612.0,
            792.0,
            vec![
                tok("12345678", 40.0, 300.0, 100.0, 312.0),
                tok("TRASPASO", 110.0, 300.0, 180.0, 312.0),
                tok("25,000.00", 300.0, 300.0, 360.0, 312.0),
                tok("0.00", 420.0, 300.0, 450.0, 312.0),
            ],
        )
    }

    #[test]
    fn test_zero_balance_is_masked_and_tag_takes_its_place() {
        let p = statement_page();
        let c = MonexClassifier
            .classify(&row_of(&p), &p, &ctx())
            .expect("transaction row");

        let mask = c.mask.expect("mask over the 0.00");
        assert_eq!(mask, Rect::new(415.0, 298.0, 455.0, 314.0));

        match c.plan {
            HorizontalPlan::FixedColumn { x, align } => {
                assert!((x - 410.0).abs() < 1e-9);
                assert_eq!(align, Align::Left);
            }
            other => panic!("unexpected plan {:?}", other),
        }
        // font and baseline follow the reference token, not the zero
        assert!((c.font_size - 12.0).abs() < 1e-9);
        assert!((c.baseline_y - 312.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_before_amount_also_matches() {
        let p = page(
            0,
            612.0,
            792.0,
            vec![
                tok("87654321", 40.0, 300.0, 100.0, 312.0),
                tok("0.00", 300.0, 300.0, 330.0, 312.0),
                tok("25,000.00", 420.0, 300.0, 480.0, 312.0),
            ],
        );
        let c = MonexClassifier
            .classify(&row_of(&p), &p, &ctx())
            .expect("transaction row");
        let mask = c.mask.expect("mask");
        assert!((mask.left - 295.0).abs() < 1e-9);
    }

    #[test]
    fn test_row_without_reference_is_skipped() {
        let p = page(
            0,
            612.0,
            792.0,
            vec![
                tok("TRASPASO", 110.0, 300.0, 180.0, 312.0),
                tok("25,000.00", 300.0, 300.0, 360.0, 312.0),
                tok("0.00", 420.0, 300.0, 450.0, 312.0),
            ],
        );
        assert!(MonexClassifier.classify(&row_of(&p), &p, &ctx()).is_none());
    }

    #[test]
    fn test_amount_without_zero_partner_is_skipped() {
        let p = page(
            0,
            612.0,
            792.0,
            vec![
                tok("12345678", 40.0, 300.0, 100.0, 312.0),
                tok("25,000.00", 300.0, 300.0, 360.0, 312.0),
                tok("31,500.00", 420.0, 300.0, 480.0, 312.0),
            ],
        );
        assert!(MonexClassifier.classify(&row_of(&p), &p, &ctx()).is_none());
    }

    #[test]
    fn test_zone_excludes_far_rows() {
        // the 0.00 lives 40pt below the reference line; not in the zone
        let p = page(
            0,
            612.0,
            792.0,
            vec![
                tok("12345678", 40.0, 300.0, 100.0, 312.0),
                tok("25,000.00", 300.0, 300.0, 360.0, 312.0),
                tok("0.00", 420.0, 340.0, 450.0, 352.0),
            ],
        );
        assert!(MonexClassifier.classify(&row_of(&p), &p, &ctx()).is_none());
    }

    #[test]
    fn test_reference_min_font_floor() {
        let p = page(
            0,
            612.0,
            792.0,
            vec![
                tok("12345678", 40.0, 300.0, 100.0, 306.0),
                tok("25,000.00", 300.0, 300.0, 360.0, 306.0),
                tok("0.00", 420.0, 300.0, 450.0, 306.0),
            ],
        );
        let c = MonexClassifier
            .classify(&row_of(&p), &p, &ctx())
            .expect("transaction row");
        assert!((c.font_size - 10.0).abs() < 1e-9);
    }
}
