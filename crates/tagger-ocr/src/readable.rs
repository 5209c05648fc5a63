//! Native-text-presence check.
//!
//! A document counts as readable when its extracted text is long enough and
//! carries at least one word of statement vocabulary. The check is pure:
//! running it on a readable document never touches OCR.

use tagger_pdf::PdfDocument;

/// Minimum extracted characters for a document to count as readable.
const MIN_TEXT_LEN: usize = 50;

/// Bilingual statement vocabulary; one hit is enough.
const KEYWORDS: &[&str] = &[
    "FECHA",
    "SALDO",
    "MOVIMIENTO",
    "DATE",
    "BALANCE",
    "DEPOSITO",
    "RETIRO",
    "ABONO",
    "CARGO",
    "REFERENCIA",
];

/// Judge extracted text. Empty or keyword-free text means the document is
/// likely an image-only scan.
pub fn is_readable(text: &str) -> bool {
    if text.trim().len() < MIN_TEXT_LEN {
        return false;
    }
    let upper = text.to_uppercase();
    KEYWORDS.iter().any(|k| upper.contains(k))
}

/// Extract the whole document's text and judge it.
pub fn has_readable_text(doc: &PdfDocument) -> bool {
    let text = doc.pages_text().join("\n");
    is_readable(&text)
}
