//! PDF document access for the tagger: word extraction with bounding boxes
//! and in-place page composition, both on `lopdf`.
//!
//! Coordinates facing the rest of the workspace are top-origin (y grows
//! downward); conversion to PDF user space happens at this boundary.

mod compose;
mod document;
mod words;

pub use document::PdfDocument;
