//! BBVA statement layout.
//!
//! Transactions start with a `DD/MMM` date token and only appear after the
//! page carrying the "DETALLE DE MOVIMIENTOS" section header. The statement
//! publishes its own movement totals ("TOTAL MOVIMIENTOS CARGOS/ABONOS"),
//! which we read back for validation.

use once_cell::sync::Lazy;
use regex::Regex;

use tagger_core::{
    Bank, BankProfile, DocumentContext, HorizontalPlan, PageWords, Row, RowClassifier,
    TransactionCandidate,
};

/// `02/OCT`, `15/ENE` and the like.
static DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}/[A-Z]{3}").unwrap());

static TOTAL_CARGOS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"TOTAL MOVIMIENTOS CARGOS\s*\D*\s*(\d+)").unwrap());
static TOTAL_ABONOS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"TOTAL MOVIMIENTOS ABONOS\s*\D*\s*(\d+)").unwrap());

pub struct BbvaClassifier;

impl RowClassifier for BbvaClassifier {
    fn bank(&self) -> Bank {
        Bank::Bbva
    }

    fn profile(&self) -> &'static BankProfile {
        BankProfile::for_bank(Bank::Bbva)
    }

    fn begin_page(&self, page: &PageWords, ctx: &mut DocumentContext) {
        // Pages before the movement-detail section are summary and
        // advertising material; their dates must not be tagged.
        if !ctx.tagging_started && page.joined_text_upper().contains("DETALLE DE MOVIMIENTOS") {
            log::debug!("movement detail section starts on page {}", page.index + 1);
            ctx.tagging_started = true;
        }
    }

    fn classify(
        &self,
        row: &Row<'_>,
        _page: &PageWords,
        ctx: &DocumentContext,
    ) -> Option<TransactionCandidate> {
        if !ctx.tagging_started {
            return None;
        }

        let text = row.joined_text_upper();
        if text.contains("FECHA") && text.contains("OPER") {
            return None;
        }

        let first = row.first()?;
        let clean: String = first
            .text
            .to_uppercase()
            .chars()
            .filter(|c| *c != '.' && *c != ',')
            .collect();
        if !DATE.is_match(&clean) {
            return None;
        }

        let profile = self.profile();
        Some(TransactionCandidate::anchored(
            first,
            HorizontalPlan::RightMargin {
                margin: profile.right_margin,
            },
            profile.min_font_size,
        ))
    }

    fn expected_total(&self, pages_text: &[String]) -> Option<u32> {
        // The summary table sits on or near the last page; scan backwards.
        for (i, text) in pages_text.iter().enumerate().rev() {
            let upper = text.to_uppercase();
            let flat: String = upper.split_whitespace().collect::<Vec<_>>().join(" ");
            if !flat.contains("TOTAL MOVIMIENTOS") {
                continue;
            }
            log::debug!("found movement summary on page {}", i + 1);
            let cargos = capture_count(&TOTAL_CARGOS, &flat);
            let abonos = capture_count(&TOTAL_ABONOS, &flat);
            if cargos > 0 || abonos > 0 {
                return Some(cargos + abonos);
            }
        }
        None
    }
}

fn capture_count(re: &Regex, text: &str) -> u32 {
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}
