//! Core types and heuristics for bank statement tagging.
//!
//! Everything that does not touch a PDF library lives here: the token/row
//! data model, per-bank layout profiles, line reconstruction, amount and
//! date matchers, the `RowClassifier` seam, and tag placement math.

pub mod classify;
pub mod error;
pub mod lines;
pub mod matchers;
pub mod placement;
pub mod profile;
pub mod token;

pub use classify::{
    number_transactions, DetectedTransaction, DocumentContext, RowClassifier,
    TransactionCandidate,
};
pub use error::{Result, TagError};
pub use lines::{group_rows, RowAnchor, RowGrouping};
pub use matchers::{
    contains_any, has_amount_shape, is_strict_amount, is_valid_day, parse_amount, parse_number,
};
pub use placement::{Align, Color, HorizontalPlan, TagPlacement};
pub use profile::{Bank, BankProfile};
pub use token::{PageWords, Rect, Row, Token};
