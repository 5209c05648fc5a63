//! OCR fallback: deciding whether a document has usable text, and
//! recovering text from image-only scans when it does not.

mod force;
mod readable;

pub use force::force_ocr;
pub use readable::{has_readable_text, is_readable};
