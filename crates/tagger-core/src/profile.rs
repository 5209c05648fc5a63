//! Immutable per-bank layout profiles.
//!
//! Every tolerance, column fraction, and keyword list a classifier needs
//! lives in one explicit record per bank, selected by `BankProfile::for_bank`.
//! Fractions are relative to page width.

use std::fmt;
use std::str::FromStr;

use crate::error::TagError;
use crate::lines::{RowAnchor, RowGrouping};

/// Supported bank statement layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bank {
    Bbva,
    Banamex,
    Santander,
    Hsbc,
    Monex,
    Db,
}

impl Bank {
    pub const ALL: [Bank; 6] = [
        Bank::Bbva,
        Bank::Banamex,
        Bank::Santander,
        Bank::Hsbc,
        Bank::Monex,
        Bank::Db,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bank::Bbva => "bbva",
            Bank::Banamex => "banamex",
            Bank::Santander => "santander",
            Bank::Hsbc => "hsbc",
            Bank::Monex => "monex",
            Bank::Db => "db",
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bank {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bbva" | "bancomer" => Ok(Bank::Bbva),
            "banamex" | "citibanamex" => Ok(Bank::Banamex),
            "santander" => Ok(Bank::Santander),
            "hsbc" => Ok(Bank::Hsbc),
            "monex" => Ok(Bank::Monex),
            "db" | "deutsche" => Ok(Bank::Db),
            other => Err(TagError::Config(format!("unknown bank: {}", other))),
        }
    }
}

/// Layout constants for one bank variant.
#[derive(Debug, Clone)]
pub struct BankProfile {
    pub bank: Bank,
    pub grouping: RowGrouping,
    /// Suffix replacing ".pdf" on the output file.
    pub output_suffix: &'static str,
    /// Rows whose joined text contains any of these are never transactions.
    pub stoplist: &'static [&'static str],
    /// Horizontal zone (fractions) an amount's reference x must fall in.
    pub amount_zone: Option<(f64, f64)>,
    /// Debit/credit boundary as a fraction of page width.
    pub split_fraction: Option<f64>,
    /// Tag landing columns (left column, right column) as width fractions.
    pub tag_columns: Option<(f64, f64)>,
    /// Single amounts right of this fraction are running balances.
    pub balance_fraction: Option<f64>,
    /// Date anchor must start left of this fraction.
    pub date_zone_fraction: Option<f64>,
    /// Anchor-left-edge fraction past which a beside-anchor tag flips left.
    pub flip_fraction: f64,
    /// Gap between tag and anchor, points.
    pub padding: f64,
    /// Margin for right-edge-aligned tags, points.
    pub right_margin: f64,
    /// Floor applied to the anchor-derived font size, if any.
    pub min_font_size: Option<f64>,
}

const BANAMEX_STOPLIST: &[&str] = &[
    "RESUMEN",
    "PERIODO",
    "SALDO",
    "TOTAL",
    "INVERSION",
    "DEPÓSITOS",
    "RETIROS",
    "HOJA",
    "PÁGINA",
    "PAGINA",
    "ANTERIOR",
    "PROMEDIO",
    "DÍAS",
    "DIAS",
    "CORTE",
    "CLABE",
    "CUENTA",
    "CHEQUES",
    "INICIAL",
    "FINAL",
];

const HSBC_STOPLIST: &[&str] = &[
    "SALDO PROMEDIO",
    "SALDO FINAL",
    "TOTAL",
    "RESUMEN",
    "INFORMATIVO",
    "PAGINA",
    "HOJA",
    "DIAS TRANSCURRIDOS",
    "SALDO INICIAL",
    "DEPOSITOS",
    "RETIROS",
];

impl BankProfile {
    pub fn for_bank(bank: Bank) -> &'static BankProfile {
        match bank {
            Bank::Bbva => &BBVA,
            Bank::Banamex => &BANAMEX,
            Bank::Santander => &SANTANDER,
            Bank::Hsbc => &HSBC,
            Bank::Monex => &MONEX,
            Bank::Db => &DB,
        }
    }
}

static BBVA: BankProfile = BankProfile {
    bank: Bank::Bbva,
    grouping: RowGrouping::Scan {
        anchor: RowAnchor::Top,
        tolerance: 5.0,
    },
    output_suffix: "_BBVA_TAGGED.pdf",
    stoplist: &[],
    amount_zone: None,
    split_fraction: None,
    tag_columns: None,
    balance_fraction: None,
    date_zone_fraction: None,
    flip_fraction: 0.7,
    padding: 10.0,
    right_margin: 40.0,
    min_font_size: None,
};

static BANAMEX: BankProfile = BankProfile {
    bank: Bank::Banamex,
    grouping: RowGrouping::Scan {
        anchor: RowAnchor::Top,
        tolerance: 10.0,
    },
    output_suffix: "_BANAMEX_TAGGED.pdf",
    stoplist: BANAMEX_STOPLIST,
    amount_zone: None,
    split_fraction: None,
    tag_columns: None,
    balance_fraction: None,
    date_zone_fraction: None,
    flip_fraction: 0.7,
    padding: 10.0,
    right_margin: 40.0,
    min_font_size: None,
};

static SANTANDER: BankProfile = BankProfile {
    bank: Bank::Santander,
    grouping: RowGrouping::Scan {
        anchor: RowAnchor::Mid,
        tolerance: 4.0,
    },
    output_suffix: "_TAGGED.pdf",
    stoplist: &[],
    amount_zone: Some((0.60, 0.85)),
    split_fraction: Some(0.76),
    // deposit tags land at 0.64, withdrawal tags at 0.76
    tag_columns: Some((0.64, 0.76)),
    balance_fraction: None,
    date_zone_fraction: Some(0.18),
    flip_fraction: 0.7,
    padding: 10.0,
    right_margin: 40.0,
    min_font_size: None,
};

static HSBC: BankProfile = BankProfile {
    bank: Bank::Hsbc,
    grouping: RowGrouping::Scan {
        anchor: RowAnchor::Mid,
        tolerance: 10.0,
    },
    output_suffix: "_TAGGED.pdf",
    stoplist: HSBC_STOPLIST,
    amount_zone: Some((0.50, 0.82)),
    split_fraction: Some(0.67),
    // withdrawal column at 0.61, deposit column at 0.74
    tag_columns: Some((0.61, 0.74)),
    balance_fraction: None,
    date_zone_fraction: Some(0.20),
    flip_fraction: 0.7,
    padding: 10.0,
    right_margin: 40.0,
    min_font_size: Some(10.0),
};

static MONEX: BankProfile = BankProfile {
    bank: Bank::Monex,
    grouping: RowGrouping::Scan {
        anchor: RowAnchor::Top,
        tolerance: 10.0,
    },
    output_suffix: "_MONEX_TAGGED.pdf",
    stoplist: &[],
    amount_zone: None,
    split_fraction: None,
    tag_columns: None,
    balance_fraction: None,
    date_zone_fraction: None,
    flip_fraction: 0.7,
    padding: 10.0,
    right_margin: 40.0,
    min_font_size: Some(10.0),
};

static DB: BankProfile = BankProfile {
    bank: Bank::Db,
    grouping: RowGrouping::Quantize { step: 5.0 },
    output_suffix: "_TAGGED.pdf",
    stoplist: &[],
    amount_zone: None,
    split_fraction: None,
    tag_columns: None,
    balance_fraction: Some(0.82),
    date_zone_fraction: None,
    flip_fraction: 0.7,
    padding: 10.0,
    right_margin: 40.0,
    min_font_size: None,
};
