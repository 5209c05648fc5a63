//! Deutsche Bank statement layout.
//!
//! Each page carries a transaction table bounded by the BOOKDATE / START
//! BALANCE header and the SUM OF / CLOSE BALANCE footer. Rows inside the
//! bounds hold one or more strict amounts; with two or more, the last is
//! the running balance and the one before it is the transaction. A lone
//! amount counts only when it sits left of the balance column.

use tagger_core::{
    group_rows, is_strict_amount, Bank, BankProfile, DocumentContext, HorizontalPlan, PageWords,
    Row, RowClassifier, Token, TransactionCandidate,
};

/// Table-top fallback when no header keyword is on the page.
const FALLBACK_TOP: f64 = 100.0;
/// Table-bottom fallback, measured up from the page bottom.
const FALLBACK_BOTTOM_MARGIN: f64 = 100.0;

const HEADER_KEYWORDS: &[&str] = &["BOOKDATE", "START BALANCE"];
const FOOTER_KEYWORDS: &[&str] = &["SUM OF", "CLOSE BALANCE", "NO. DEBIT"];

pub struct DbClassifier;

impl RowClassifier for DbClassifier {
    fn bank(&self) -> Bank {
        Bank::Db
    }

    fn profile(&self) -> &'static BankProfile {
        BankProfile::for_bank(Bank::Db)
    }

    fn begin_page(&self, page: &PageWords, ctx: &mut DocumentContext) {
        let (top, bottom) = table_bounds(page);
        ctx.min_y = top;
        ctx.max_y = bottom;
    }

    fn classify(
        &self,
        row: &Row<'_>,
        page: &PageWords,
        ctx: &DocumentContext,
    ) -> Option<TransactionCandidate> {
        let first = row.first()?;
        if first.bbox.top < ctx.min_y || first.bbox.top > ctx.max_y {
            return None;
        }

        let amounts: Vec<&Token> = row
            .tokens
            .iter()
            .filter(|t| is_strict_amount(&t.text))
            .copied()
            .collect();

        let profile = self.profile();
        let target: &Token = match amounts.len() {
            0 => return None,
            1 => {
                // A lone amount at the far right is the running balance.
                let balance_x = page.width * profile.balance_fraction?;
                if amounts[0].bbox.left < balance_x {
                    amounts[0]
                } else {
                    return None;
                }
            }
            n => amounts[n - 2],
        };

        Some(TransactionCandidate::anchored(
            target,
            HorizontalPlan::BesideGuarded {
                padding: profile.padding,
                right_guard: 50.0,
                left_offset: 60.0,
            },
            profile.min_font_size,
        ))
    }
}

/// Vertical extent of the transaction table on one page.
///
/// The keywords span word boundaries, so they are matched against whole-row
/// text rather than single tokens.
fn table_bounds(page: &PageWords) -> (f64, f64) {
    let mut top = 0.0f64;
    let mut bottom = page.height;
    let grouping = BankProfile::for_bank(Bank::Db).grouping;

    for row in group_rows(&page.tokens, grouping) {
        let text = row.joined_text_upper();
        if HEADER_KEYWORDS.iter().any(|k| text.contains(k)) {
            let row_bottom = row
                .tokens
                .iter()
                .map(|t| t.bbox.bottom)
                .fold(0.0f64, f64::max);
            top = top.max(row_bottom);
        }
        if FOOTER_KEYWORDS.iter().any(|k| text.contains(k)) {
            let row_top = row
                .tokens
                .iter()
                .map(|t| t.bbox.top)
                .fold(f64::INFINITY, f64::min);
            bottom = bottom.min(row_top);
        }
    }

    if top == 0.0 {
        top = FALLBACK_TOP;
    }
    if bottom >= page.height {
        bottom = page.height - FALLBACK_BOTTOM_MARGIN;
    }
    (top, bottom)
}
