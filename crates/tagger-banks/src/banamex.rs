//! Banamex statement layout.
//!
//! Rows above the per-page "DETALLE DE OPERACIONES" header are summary
//! material. Transaction rows carry a `DD MMM` style date and at least one
//! money-shaped token; the first money token anchors the tag, which lands
//! beside it on whichever side has room.

use once_cell::sync::Lazy;
use regex::Regex;

use tagger_core::{
    contains_any, group_rows, has_amount_shape, Bank, BankProfile, DocumentContext,
    HorizontalPlan, PageWords, Row, RowClassifier, TransactionCandidate,
};

/// `05 ENE`, `12/DIC`, `03-FEB` and the like, anywhere in the row.
static DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{2}[\s/.-]+[A-Za-z]{3}").unwrap());

pub struct BanamexClassifier;

impl RowClassifier for BanamexClassifier {
    fn bank(&self) -> Bank {
        Bank::Banamex
    }

    fn profile(&self) -> &'static BankProfile {
        BankProfile::for_bank(Bank::Banamex)
    }

    fn begin_page(&self, page: &PageWords, ctx: &mut DocumentContext) {
        // Per-page geometric gate: everything at or above the operations
        // header row key is skipped. Pages without the header are open.
        ctx.min_y = 0.0;
        for row in group_rows(&page.tokens, self.profile().grouping) {
            let text = row.joined_text_upper();
            if text.contains("DETALLE") && text.contains("OPERACIONES") {
                ctx.min_y = row.key;
                break;
            }
        }
    }

    fn classify(
        &self,
        row: &Row<'_>,
        _page: &PageWords,
        ctx: &DocumentContext,
    ) -> Option<TransactionCandidate> {
        if ctx.min_y != 0.0 && row.key <= ctx.min_y {
            return None;
        }

        let text = row
            .tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let upper = text.to_uppercase();

        let profile = self.profile();
        if contains_any(&upper, profile.stoplist) {
            return None;
        }
        if !DATE.is_match(&text) {
            return None;
        }
        if !has_amount_shape(&text) {
            return None;
        }

        let money = row.tokens.iter().find(|t| has_amount_shape(&t.text))?;
        Some(TransactionCandidate::anchored(
            money,
            HorizontalPlan::BesideAnchor {
                padding: profile.padding,
                flip_fraction: profile.flip_fraction,
            },
            profile.min_font_size,
        ))
    }
}
