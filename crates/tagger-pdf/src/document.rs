//! Document wrapper: load/save, page geometry, text access, page merge.

use std::path::Path;

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};

use tagger_core::{PageWords, Rect, Result, TagError};

use crate::compose;
use crate::words;

/// A loaded PDF plus its resolved page list and sizes.
///
/// Mutation is insertion-only: composition appends new content streams and
/// never rewrites existing ones.
pub struct PdfDocument {
    doc: Document,
    pages: Vec<ObjectId>,
    /// (width, height) per page in points.
    sizes: Vec<(f64, f64)>,
}

impl PdfDocument {
    pub fn open(path: &Path) -> Result<Self> {
        let doc = Document::load(path)
            .map_err(|e| TagError::Pdf(format!("failed to load {}: {}", path.display(), e)))?;
        Self::from_document(doc)
    }

    fn from_document(doc: Document) -> Result<Self> {
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        let mut sizes = Vec::with_capacity(pages.len());
        for &page_id in &pages {
            sizes.push(media_box_size(&doc, page_id)?);
        }
        Ok(Self { doc, pages, sizes })
    }

    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.doc
            .save(path)
            .map_err(|e| TagError::Pdf(format!("failed to save {}: {}", path.display(), e)))?;
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page_size(&self, page: usize) -> (f64, f64) {
        self.sizes[page]
    }

    /// Plain text of one page, as extracted by lopdf. Used by readability
    /// checks and document-level gates, not by row classification.
    pub fn page_text(&self, page: usize) -> String {
        let number = page as u32 + 1;
        self.doc.extract_text(&[number]).unwrap_or_default()
    }

    /// Plain text of every page, in page order.
    pub fn pages_text(&self) -> Vec<String> {
        (0..self.page_count()).map(|i| self.page_text(i)).collect()
    }

    /// Extract word tokens with bounding boxes for one page.
    /// Coordinates are top-origin page points.
    pub fn page_words(&self, page: usize) -> Result<PageWords> {
        let (width, height) = self.sizes[page];
        let tokens = words::extract_words(&self.doc, self.pages[page], height)?;
        log::debug!("page {}: extracted {} words", page + 1, tokens.len());
        Ok(PageWords {
            index: page,
            width,
            height,
            tokens,
        })
    }

    /// Stamp text at a top-origin baseline position.
    pub fn insert_text(
        &mut self,
        page: usize,
        x: f64,
        y: f64,
        text: &str,
        font_size: f64,
        color: tagger_core::Color,
    ) -> Result<()> {
        let height = self.sizes[page].1;
        compose::insert_text(&mut self.doc, self.pages[page], height, x, y, text, font_size, color)
    }

    /// Fill a top-origin rect with a solid color (zero-balance masking).
    pub fn fill_rect(&mut self, page: usize, rect: Rect, color: tagger_core::Color) -> Result<()> {
        let height = self.sizes[page].1;
        compose::fill_rect(&mut self.doc, self.pages[page], height, rect, color)
    }

    /// Draw a small filled circle (debug marker).
    pub fn draw_circle(
        &mut self,
        page: usize,
        center: (f64, f64),
        radius: f64,
        color: tagger_core::Color,
    ) -> Result<()> {
        let height = self.sizes[page].1;
        compose::draw_circle(&mut self.doc, self.pages[page], height, center, radius, color)
    }

    /// Assemble single-page documents (OCR output) into one document.
    ///
    /// Inherited page attributes are flattened onto each page dict before
    /// the source page trees are discarded.
    pub fn merge(sources: Vec<PdfDocument>) -> Result<PdfDocument> {
        let mut merged = Document::with_version("1.5");
        let pages_id = merged.new_object_id();
        let mut kids: Vec<Object> = Vec::new();

        for source in sources {
            let mut doc = source.doc;
            let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

            // Flatten inheritance while the parent chain still exists.
            for &page_id in &page_ids {
                for key in [b"Resources".as_slice(), b"MediaBox", b"Rotate"] {
                    let inherited = inherited_entry(&doc, page_id, key);
                    if let Some(value) = inherited {
                        if let Ok(Object::Dictionary(page_dict)) = doc.get_object_mut(page_id) {
                            if !page_dict.has(key) {
                                page_dict.set(key, value);
                            }
                        }
                    }
                }
            }

            doc.renumber_objects_with(merged.max_id + 1);
            let renumbered_pages: Vec<ObjectId> = doc.get_pages().into_values().collect();

            for (object_id, object) in std::mem::take(&mut doc.objects) {
                let is_tree_node = object
                    .as_dict()
                    .ok()
                    .and_then(|d| d.get(b"Type").ok())
                    .is_some_and(|t| {
                        matches!(t, Object::Name(n) if n == b"Catalog" || n == b"Pages")
                    });
                if !is_tree_node {
                    merged.objects.insert(object_id, object);
                }
            }
            merged.max_id = merged.max_id.max(doc.max_id);

            for page_id in renumbered_pages {
                if let Ok(Object::Dictionary(page_dict)) = merged.get_object_mut(page_id) {
                    page_dict.set("Parent", Object::Reference(pages_id));
                }
                kids.push(Object::Reference(page_id));
            }
        }

        let count = kids.len() as i64;
        merged.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = merged.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        merged.trailer.set("Root", Object::Reference(catalog_id));
        merged.renumber_objects();

        Self::from_document(merged)
    }

    #[cfg(test)]
    pub(crate) fn from_raw(doc: Document) -> Result<Self> {
        Self::from_document(doc)
    }
}

/// Look up a page attribute, walking the Parent chain for inherited values.
pub(crate) fn inherited_entry(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    for _ in 0..16 {
        let dict = resolve_dict(doc, current)?;
        if let Ok(value) = dict.get(key) {
            let value = match value {
                Object::Reference(id) => doc.get_object(*id).ok()?.clone(),
                other => other.clone(),
            };
            return Some(value);
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => current = *parent,
            _ => return None,
        }
    }
    None
}

fn resolve_dict(doc: &Document, id: ObjectId) -> Option<&Dictionary> {
    doc.get_object(id).ok()?.as_dict().ok()
}

/// Resolve a page's media box to (width, height).
fn media_box_size(doc: &Document, page_id: ObjectId) -> Result<(f64, f64)> {
    let media_box = inherited_entry(doc, page_id, b"MediaBox")
        .ok_or_else(|| TagError::Pdf("page has no MediaBox".to_string()))?;
    let array = media_box
        .as_array()
        .map_err(|e| TagError::Pdf(format!("bad MediaBox: {}", e)))?;
    if array.len() != 4 {
        return Err(TagError::Pdf("bad MediaBox length".to_string()));
    }
    let mut values = [0.0f64; 4];
    for (i, obj) in array.iter().enumerate() {
        values[i] = match obj {
            Object::Integer(n) => *n as f64,
            Object::Real(r) => *r as f64,
            _ => return Err(TagError::Pdf("non-numeric MediaBox entry".to_string())),
        };
    }
    Ok((values[2] - values[0], values[3] - values[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::tests::minimal_document;

    #[test]
    fn test_media_box_and_page_count() {
        let doc = minimal_document(&[]);
        let pdf = PdfDocument::from_raw(doc).unwrap();
        assert_eq!(pdf.page_count(), 1);
        let (w, h) = pdf.page_size(0);
        assert_eq!((w, h), (612.0, 792.0));
    }

    #[test]
    fn test_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        let mut pdf = PdfDocument::from_raw(minimal_document(&[])).unwrap();
        pdf.save(&path).unwrap();
        let reopened = PdfDocument::open(&path).unwrap();
        assert_eq!(reopened.page_count(), 1);
        assert_eq!(reopened.page_size(0), (612.0, 792.0));
    }

    #[test]
    fn test_merge_combines_pages() {
        let a = PdfDocument::from_raw(minimal_document(&[])).unwrap();
        let b = PdfDocument::from_raw(minimal_document(&[])).unwrap();
        let merged = PdfDocument::merge(vec![a, b]).unwrap();
        assert_eq!(merged.page_count(), 2);
        assert_eq!(merged.page_size(1), (612.0, 792.0));
    }
}
