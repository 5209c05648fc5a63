//! Page composition: appending text, rectangles, and debug markers.
//!
//! New drawing goes into a fresh content stream appended to the page's
//! Contents; existing streams are never touched. A Helvetica font resource
//! is registered on the page on first use.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use tagger_core::{Color, Rect, Result, TagError};

use crate::document::inherited_entry;

/// Resource name of the font the tags are stamped with.
const TAG_FONT: &[u8] = b"TagHelv";

/// Bezier control-point factor approximating a quarter circle.
const CIRCLE_K: f64 = 0.5523;

#[allow(clippy::too_many_arguments)]
pub(crate) fn insert_text(
    doc: &mut Document,
    page_id: ObjectId,
    page_height: f64,
    x: f64,
    y: f64,
    text: &str,
    font_size: f64,
    color: Color,
) -> Result<()> {
    ensure_tag_font(doc, page_id)?;
    let baseline = page_height - y;
    let ops = vec![
        Operation::new("q", vec![]),
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![
                Object::Name(TAG_FONT.to_vec()),
                Object::Real(font_size as f32),
            ],
        ),
        rg(color),
        Operation::new(
            "Tm",
            vec![
                Object::Real(1.0),
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(1.0),
                Object::Real(x as f32),
                Object::Real(baseline as f32),
            ],
        ),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ];
    append_content(doc, page_id, ops)
}

pub(crate) fn fill_rect(
    doc: &mut Document,
    page_id: ObjectId,
    page_height: f64,
    rect: Rect,
    color: Color,
) -> Result<()> {
    let ops = vec![
        Operation::new("q", vec![]),
        rg(color),
        Operation::new(
            "re",
            vec![
                Object::Real(rect.left as f32),
                Object::Real((page_height - rect.bottom) as f32),
                Object::Real(rect.width() as f32),
                Object::Real(rect.height() as f32),
            ],
        ),
        Operation::new("f", vec![]),
        Operation::new("Q", vec![]),
    ];
    append_content(doc, page_id, ops)
}

pub(crate) fn draw_circle(
    doc: &mut Document,
    page_id: ObjectId,
    page_height: f64,
    center: (f64, f64),
    radius: f64,
    color: Color,
) -> Result<()> {
    let (cx, cy) = (center.0, page_height - center.1);
    let k = CIRCLE_K * radius;
    let mut ops = vec![
        Operation::new("q", vec![]),
        rg(color),
        Operation::new("m", reals(&[cx + radius, cy])),
    ];
    // four quarter arcs, counter-clockwise
    ops.push(Operation::new(
        "c",
        reals(&[cx + radius, cy + k, cx + k, cy + radius, cx, cy + radius]),
    ));
    ops.push(Operation::new(
        "c",
        reals(&[cx - k, cy + radius, cx - radius, cy + k, cx - radius, cy]),
    ));
    ops.push(Operation::new(
        "c",
        reals(&[cx - radius, cy - k, cx - k, cy - radius, cx, cy - radius]),
    ));
    ops.push(Operation::new(
        "c",
        reals(&[cx + k, cy - radius, cx + radius, cy - k, cx + radius, cy]),
    ));
    ops.push(Operation::new("f", vec![]));
    ops.push(Operation::new("Q", vec![]));
    append_content(doc, page_id, ops)
}

fn rg(color: Color) -> Operation {
    Operation::new(
        "rg",
        vec![
            Object::Real(color.r),
            Object::Real(color.g),
            Object::Real(color.b),
        ],
    )
}

fn reals(values: &[f64]) -> Vec<Object> {
    values.iter().map(|v| Object::Real(*v as f32)).collect()
}

/// Append a new content stream to the page without rewriting existing ones.
fn append_content(doc: &mut Document, page_id: ObjectId, ops: Vec<Operation>) -> Result<()> {
    let data = Content { operations: ops }
        .encode()
        .map_err(|e| TagError::Pdf(format!("content encode failed: {}", e)))?;
    let stream_id = doc.add_object(Object::Stream(Stream::new(dictionary! {}, data)));

    let current = doc
        .get_dictionary(page_id)
        .map_err(|e| TagError::Pdf(format!("bad page object: {}", e)))?
        .get(b"Contents")
        .ok()
        .cloned();

    let new_contents = match current {
        Some(Object::Array(mut streams)) => {
            streams.push(Object::Reference(stream_id));
            Object::Array(streams)
        }
        Some(Object::Reference(existing)) => {
            match doc.get_object(existing).ok() {
                // reference to an array of streams: extend a copy inline
                Some(Object::Array(streams)) => {
                    let mut streams = streams.clone();
                    streams.push(Object::Reference(stream_id));
                    Object::Array(streams)
                }
                _ => Object::Array(vec![
                    Object::Reference(existing),
                    Object::Reference(stream_id),
                ]),
            }
        }
        _ => Object::Reference(stream_id),
    };

    let page = doc
        .get_object_mut(page_id)
        .and_then(|o| o.as_dict_mut())
        .map_err(|e| TagError::Pdf(format!("bad page object: {}", e)))?;
    page.set("Contents", new_contents);
    Ok(())
}

/// Make sure the page can resolve the tag font resource name.
fn ensure_tag_font(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    if tag_font_present(doc, page_id) {
        return Ok(());
    }

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let direct = doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|d| d.get(b"Resources").ok().cloned());

    match direct {
        Some(Object::Reference(res_id)) => {
            let res = doc
                .get_object(res_id)
                .ok()
                .and_then(|o| o.as_dict().ok())
                .cloned()
                .unwrap_or_default();
            let updated = with_tag_font(doc, res, font_id);
            if let Ok(obj) = doc.get_object_mut(res_id) {
                *obj = Object::Dictionary(updated);
            }
        }
        other => {
            // Inline resources, or inherited ones that become page-local so
            // the inherited set is not shadowed away.
            let res = match other {
                Some(Object::Dictionary(d)) => d,
                _ => inherited_entry(doc, page_id, b"Resources")
                    .and_then(|o| o.as_dict().ok().cloned())
                    .unwrap_or_default(),
            };
            let updated = with_tag_font(doc, res, font_id);
            let page = doc
                .get_object_mut(page_id)
                .and_then(|o| o.as_dict_mut())
                .map_err(|e| TagError::Pdf(format!("bad page object: {}", e)))?;
            page.set("Resources", Object::Dictionary(updated));
        }
    }
    Ok(())
}

fn with_tag_font(doc: &Document, mut res: Dictionary, font_id: ObjectId) -> Dictionary {
    let mut fonts = match res.get(b"Font") {
        Ok(Object::Dictionary(d)) => d.clone(),
        Ok(Object::Reference(id)) => doc
            .get_object(*id)
            .ok()
            .and_then(|o| o.as_dict().ok())
            .cloned()
            .unwrap_or_default(),
        _ => Dictionary::new(),
    };
    if !fonts.has(TAG_FONT) {
        fonts.set(TAG_FONT, Object::Reference(font_id));
    }
    res.set("Font", Object::Dictionary(fonts));
    res
}

fn tag_font_present(doc: &Document, page_id: ObjectId) -> bool {
    let Some(res) = inherited_entry(doc, page_id, b"Resources") else {
        return false;
    };
    let Ok(res) = res.as_dict() else {
        return false;
    };
    let fonts = match res.get(b"Font") {
        Ok(Object::Dictionary(d)) => d.clone(),
        Ok(Object::Reference(id)) => match doc.get_object(*id).ok().and_then(|o| o.as_dict().ok())
        {
            Some(d) => d.clone(),
            None => return false,
        },
        _ => return false,
    };
    fonts.has(TAG_FONT)
}
