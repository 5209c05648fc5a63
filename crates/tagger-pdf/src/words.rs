//! Word extraction from page content streams.
//!
//! A small text-object interpreter: tracks the text matrix, font and
//! spacing state, decodes shown strings through the font's encoding, and
//! assembles words from glyph runs. Widths come from the font's /Widths
//! array when present, otherwise a Helvetica-like default, which is good
//! enough for column classification working in page-width fractions.
//!
//! Positions are reported top-origin. The glyph box is approximated as
//! 80% ascent / 20% descent of the effective font size, which matches how
//! the layouts' tolerances were calibrated.

use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};

use tagger_core::{Rect, Result, TagError, Token};

/// Fraction of the font size treated as ascent above the baseline.
const ASCENT: f64 = 0.8;
/// Fraction of the font size treated as descent below the baseline.
const DESCENT: f64 = 0.2;
/// Pen jumps larger than this fraction of the font size split words.
const GAP_SPLIT: f64 = 0.3;
/// Advance for glyphs with no width information, 1/1000 em.
const DEFAULT_ADVANCE: f64 = 500.0;

/// Glyph metrics for one page font.
struct FontMetrics {
    first_char: u32,
    widths: Vec<f64>,
}

impl FontMetrics {
    fn advance(&self, code: u8) -> f64 {
        let index = (code as u32).wrapping_sub(self.first_char) as usize;
        self.widths.get(index).copied().unwrap_or(DEFAULT_ADVANCE)
    }
}

fn load_metrics(doc: &Document, font: &Dictionary) -> FontMetrics {
    let first_char = font
        .get(b"FirstChar")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(0) as u32;
    let widths = font
        .get(b"Widths")
        .ok()
        .and_then(|o| resolve(doc, o).as_array().ok().cloned())
        .map(|arr| arr.iter().filter_map(number).collect())
        .unwrap_or_default();
    FontMetrics { first_char, widths }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Decode a shown string through the current font's encoding, falling back
/// to UTF-16BE or Latin-1.
fn decode_text(doc: &Document, font: Option<&&Dictionary>, bytes: &[u8]) -> String {
    if let Some(font) = font {
        if let Ok(encoding) = font.get_font_encoding(doc) {
            if let Ok(text) = Document::decode_text(&encoding, bytes) {
                return text;
            }
        }
    }
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Accumulates glyph runs into word tokens.
struct WordBuilder {
    page_height: f64,
    tokens: Vec<Token>,
    text: String,
    start_x: f64,
    pen_x: f64,
    baseline: f64,
    size: f64,
}

impl WordBuilder {
    fn new(page_height: f64) -> Self {
        Self {
            page_height,
            tokens: Vec::new(),
            text: String::new(),
            start_x: 0.0,
            pen_x: 0.0,
            baseline: 0.0,
            size: 0.0,
        }
    }

    fn flush(&mut self) {
        if self.text.trim().is_empty() {
            self.text.clear();
            return;
        }
        let top = self.page_height - (self.baseline + self.size * ASCENT);
        let bottom = self.page_height - (self.baseline - self.size * DESCENT);
        self.tokens.push(Token::new(
            std::mem::take(&mut self.text),
            Rect::new(self.start_x, top, self.pen_x, bottom),
        ));
    }

    fn push(&mut self, c: char, x: f64, advance: f64, baseline: f64, size: f64) {
        if c == ' ' {
            self.flush();
            return;
        }
        let moved = (x - self.pen_x).abs() > size * GAP_SPLIT;
        let line_change = (baseline - self.baseline).abs() > 0.1;
        if self.text.is_empty() || moved || line_change {
            self.flush();
            self.start_x = x;
            self.baseline = baseline;
            self.size = size;
        }
        self.text.push(c);
        self.pen_x = x + advance;
    }
}

/// Extract word tokens from one page, in content-stream order.
pub(crate) fn extract_words(
    doc: &Document,
    page_id: ObjectId,
    page_height: f64,
) -> Result<Vec<Token>> {
    let fonts: BTreeMap<Vec<u8>, &Dictionary> = doc.get_page_fonts(page_id).unwrap_or_default();
    let metrics: BTreeMap<Vec<u8>, FontMetrics> = fonts
        .iter()
        .map(|(name, dict)| (name.clone(), load_metrics(doc, dict)))
        .collect();

    let data = doc
        .get_page_content(page_id)
        .map_err(|e| TagError::Pdf(format!("no page content: {}", e)))?;
    let content =
        Content::decode(&data).map_err(|e| TagError::Pdf(format!("content decode: {}", e)))?;

    let mut builder = WordBuilder::new(page_height);

    // text state
    let mut font_name: Vec<u8> = Vec::new();
    let mut font_size: f64 = 12.0;
    let mut char_spacing: f64 = 0.0;
    let mut word_spacing: f64 = 0.0;
    let mut leading: f64 = 0.0;
    let mut text_matrix = [1.0f64, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut line_matrix = text_matrix;

    for op in &content.operations {
        match op.operator.as_str() {
            "BT" => {
                text_matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
                line_matrix = text_matrix;
            }
            "ET" => builder.flush(),
            "Tf" => {
                if op.operands.len() >= 2 {
                    if let Ok(name) = op.operands[0].as_name() {
                        font_name = name.to_vec();
                    }
                    if let Some(size) = number(&op.operands[1]) {
                        font_size = size;
                    }
                }
            }
            "Tc" => {
                if let Some(v) = op.operands.first().and_then(number) {
                    char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = op.operands.first().and_then(number) {
                    word_spacing = v;
                }
            }
            "TL" => {
                if let Some(v) = op.operands.first().and_then(number) {
                    leading = v;
                }
            }
            "Td" => {
                if op.operands.len() >= 2 {
                    let tx = number(&op.operands[0]).unwrap_or(0.0);
                    let ty = number(&op.operands[1]).unwrap_or(0.0);
                    translate(&mut line_matrix, tx, ty);
                    text_matrix = line_matrix;
                }
            }
            "TD" => {
                if op.operands.len() >= 2 {
                    let tx = number(&op.operands[0]).unwrap_or(0.0);
                    let ty = number(&op.operands[1]).unwrap_or(0.0);
                    leading = -ty;
                    translate(&mut line_matrix, tx, ty);
                    text_matrix = line_matrix;
                }
            }
            "Tm" => {
                if op.operands.len() >= 6 {
                    for (i, operand) in op.operands.iter().take(6).enumerate() {
                        text_matrix[i] =
                            number(operand).unwrap_or(if i == 0 || i == 3 { 1.0 } else { 0.0 });
                    }
                    line_matrix = text_matrix;
                }
            }
            "T*" => {
                let drop = if leading != 0.0 { leading } else { font_size * 1.2 };
                translate(&mut line_matrix, 0.0, -drop);
                text_matrix = line_matrix;
            }
            "Tj" | "'" | "\"" => {
                if op.operator != "Tj" {
                    let drop = if leading != 0.0 { leading } else { font_size * 1.2 };
                    translate(&mut line_matrix, 0.0, -drop);
                    text_matrix = line_matrix;
                }
                // the operand order of " is (aw ac string); take the last
                if let Some(Object::String(bytes, _)) = op.operands.last() {
                    show_string(
                        doc,
                        &fonts,
                        &metrics,
                        &font_name,
                        bytes,
                        font_size,
                        char_spacing,
                        word_spacing,
                        &mut text_matrix,
                        &mut builder,
                    );
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => show_string(
                                doc,
                                &fonts,
                                &metrics,
                                &font_name,
                                bytes,
                                font_size,
                                char_spacing,
                                word_spacing,
                                &mut text_matrix,
                                &mut builder,
                            ),
                            other => {
                                if let Some(adjust) = number(other) {
                                    let dx = -adjust / 1000.0 * font_size * text_matrix[0];
                                    text_matrix[4] += dx;
                                }
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
    builder.flush();

    Ok(builder.tokens)
}

fn translate(matrix: &mut [f64; 6], tx: f64, ty: f64) {
    matrix[4] += tx * matrix[0] + ty * matrix[2];
    matrix[5] += tx * matrix[1] + ty * matrix[3];
}

#[allow(clippy::too_many_arguments)]
fn show_string(
    doc: &Document,
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    metrics: &BTreeMap<Vec<u8>, FontMetrics>,
    font_name: &[u8],
    bytes: &[u8],
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    text_matrix: &mut [f64; 6],
    builder: &mut WordBuilder,
) {
    let font = fonts.get(font_name);
    let text = decode_text(doc, font, bytes);
    if text.is_empty() {
        return;
    }

    let h_scale = text_matrix[0];
    let effective_size = font_size * text_matrix[3].abs();
    let baseline = text_matrix[5];

    // Total advance from glyph codes; distributed evenly across decoded
    // chars when a multi-byte encoding makes counts disagree.
    let font_metrics = metrics.get(font_name);
    let total_advance: f64 = bytes
        .iter()
        .map(|&code| {
            let glyph = font_metrics
                .map(|m| m.advance(code))
                .unwrap_or(DEFAULT_ADVANCE);
            let mut adv = glyph / 1000.0 * font_size + char_spacing;
            if code == b' ' {
                adv += word_spacing;
            }
            adv * h_scale
        })
        .sum();

    let char_count = text.chars().count();
    let per_char = total_advance / char_count as f64;

    let mut x = text_matrix[4];
    for c in text.chars() {
        builder.push(c, x, per_char, baseline, effective_size);
        x += per_char;
    }
    text_matrix[4] += total_advance;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::tests::minimal_document;
    use lopdf::content::Operation;

    fn text_ops(lines: &[(f64, f64, &str)]) -> Vec<Operation> {
        let mut ops = vec![Operation::new("BT", vec![])];
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(b"F1".to_vec()), Object::Real(12.0)],
        ));
        for (x, y, text) in lines {
            ops.push(Operation::new(
                "Tm",
                vec![
                    Object::Real(1.0),
                    Object::Real(0.0),
                    Object::Real(0.0),
                    Object::Real(1.0),
                    Object::Real(*x as f32),
                    Object::Real(*y as f32),
                ],
            ));
            ops.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
        }
        ops.push(Operation::new("ET", vec![]));
        ops
    }

    fn words_from(ops: Vec<Operation>) -> Vec<Token> {
        let doc = minimal_document(&ops);
        let page_id = *doc.get_pages().values().next().unwrap();
        extract_words(&doc, page_id, 792.0).unwrap()
    }

    #[test]
    fn test_words_split_on_spaces() {
        let tokens = words_from(text_ops(&[(72.0, 700.0, "PAGO TARJETA 1,500.00")]));
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["PAGO", "TARJETA", "1,500.00"]);
    }

    #[test]
    fn test_top_origin_conversion() {
        let tokens = words_from(text_ops(&[(72.0, 700.0, "HOLA")]));
        let bbox = tokens[0].bbox;
        // baseline at pdf y=700 → top-origin bottom = 792 - (700 - 0.2*12)
        assert!((bbox.bottom - (792.0 - 700.0 + 12.0 * DESCENT)).abs() < 1e-6);
        assert!((bbox.height() - 12.0).abs() < 1e-6);
        assert!((bbox.left - 72.0).abs() < 1e-6);
    }

    #[test]
    fn test_words_on_same_baseline_have_increasing_x() {
        let tokens = words_from(text_ops(&[(72.0, 700.0, "AB CD EF")]));
        assert_eq!(tokens.len(), 3);
        assert!(tokens[0].bbox.left < tokens[1].bbox.left);
        assert!(tokens[1].bbox.left < tokens[2].bbox.left);
        assert!(tokens[0].bbox.right <= tokens[1].bbox.left);
    }

    #[test]
    fn test_separate_show_ops_same_line_merge_or_split_by_gap() {
        // adjacent ops with a big x jump stay separate words
        let tokens = words_from(text_ops(&[
            (72.0, 700.0, "SALDO"),
            (300.0, 700.0, "1,000.00"),
        ]));
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].text, "1,000.00");
        assert!((tokens[1].bbox.left - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_multiple_lines_produce_distinct_baselines() {
        let tokens = words_from(text_ops(&[(72.0, 700.0, "UNO"), (72.0, 680.0, "DOS")]));
        assert_eq!(tokens.len(), 2);
        assert!(tokens[1].bbox.top > tokens[0].bbox.top);
    }
}
