//! Tag placement: where and at what size to stamp "{prefix}_{index}".
//!
//! Font size always equals the anchor token's bounding-box height so the
//! stamped label matches the surrounding document typography regardless of
//! scan resolution. Label width is estimated from a fixed Helvetica
//! advance-width table; no font rasterization happens here.

use crate::token::Rect;

/// RGB color in the 0.0-1.0 range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const RED: Color = Color {
        r: 1.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };
    pub const BLUE: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 1.0,
    };
}

/// Horizontal text alignment relative to the computed x coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    /// Text starts at x.
    Left,
    /// Text ends at x.
    Right,
}

/// How the label's horizontal position is derived once its width is known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HorizontalPlan {
    /// Right-aligned against the page edge: `x = page_width - width - margin`.
    RightMargin { margin: f64 },
    /// Beside the anchor with padding; flips to the anchor's left (making
    /// room for the full label width) when the anchor's left edge exceeds
    /// `flip_fraction` of the page width.
    BesideAnchor { padding: f64, flip_fraction: f64 },
    /// Beside the anchor with padding; flips to a fixed offset left of the
    /// anchor when the computed position comes within `right_guard` points
    /// of the page edge.
    BesideGuarded {
        padding: f64,
        right_guard: f64,
        left_offset: f64,
    },
    /// Fixed column position with explicit alignment (debit/credit routing).
    FixedColumn { x: f64, align: Align },
}

/// Fully resolved placement for one tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TagPlacement {
    pub text: String,
    pub x: f64,
    /// Baseline y in top-origin coordinates.
    pub y: f64,
    pub font_size: f64,
    pub color: Color,
    /// Rect to fill white before the tag is written (zero-balance masking).
    pub mask: Option<Rect>,
    /// Debug marker center, drawn as a small filled circle when enabled.
    pub marker: Option<(f64, f64)>,
}

/// Fraction of the font size the baseline is raised above the anchor's
/// bottom edge, visually centering the label against the cap height.
pub const BASELINE_RAISE: f64 = 0.15;

/// Baseline for a label aligned with an anchor's bottom edge.
pub fn baseline_for(anchor: &Rect, font_size: f64) -> f64 {
    anchor.bottom - font_size * BASELINE_RAISE
}

/// Resolve a horizontal plan into a concrete left-edge x for the label.
pub fn resolve_x(plan: HorizontalPlan, anchor: &Rect, label_width: f64, page_width: f64) -> f64 {
    match plan {
        HorizontalPlan::RightMargin { margin } => page_width - label_width - margin,
        HorizontalPlan::BesideAnchor {
            padding,
            flip_fraction,
        } => {
            if anchor.left > page_width * flip_fraction {
                anchor.left - label_width - padding
            } else {
                anchor.right + padding
            }
        }
        HorizontalPlan::BesideGuarded {
            padding,
            right_guard,
            left_offset,
        } => {
            let x = anchor.right + padding;
            if x > page_width - right_guard {
                anchor.left - left_offset
            } else {
                x
            }
        }
        HorizontalPlan::FixedColumn { x, align } => match align {
            Align::Left => x,
            Align::Right => x - label_width,
        },
    }
}

/// Helvetica advance width for one character, in 1/1000 em units.
fn helvetica_advance(c: char) -> f64 {
    match c {
        '0'..='9' => 556.0,
        '_' => 556.0,
        ' ' => 278.0,
        '.' | ',' => 278.0,
        '-' => 333.0,
        '/' => 278.0,
        'I' => 278.0,
        'J' => 500.0,
        'F' | 'T' | 'Z' => 611.0,
        'A' | 'B' | 'E' | 'K' | 'P' | 'S' | 'V' | 'X' | 'Y' => 667.0,
        'C' | 'D' | 'H' | 'N' | 'R' | 'U' => 722.0,
        'G' | 'O' | 'Q' => 778.0,
        'M' => 833.0,
        'W' => 944.0,
        'i' | 'j' | 'l' => 222.0,
        'f' | 't' => 278.0,
        'r' => 333.0,
        'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' => 500.0,
        'm' => 833.0,
        'w' => 722.0,
        _ => 556.0,
    }
}

/// Estimated rendered width of `text` in Helvetica at `font_size`.
pub fn text_width(text: &str, font_size: f64) -> f64 {
    text.chars().map(helvetica_advance).sum::<f64>() / 1000.0 * font_size
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor() -> Rect {
        Rect::new(500.0, 100.0, 560.0, 112.0)
    }

    #[test]
    fn test_baseline_raised_by_fraction_of_font_size() {
        let a = anchor();
        let fs = a.height();
        assert!((baseline_for(&a, fs) - (112.0 - 12.0 * 0.15)).abs() < 1e-9);
    }

    #[test]
    fn test_right_margin_alignment() {
        let x = resolve_x(
            HorizontalPlan::RightMargin { margin: 40.0 },
            &anchor(),
            55.0,
            600.0,
        );
        assert!((x - (600.0 - 55.0 - 40.0)).abs() < 1e-9);
    }

    #[test]
    fn test_beside_anchor_flips_past_fraction() {
        let plan = HorizontalPlan::BesideAnchor {
            padding: 10.0,
            flip_fraction: 0.7,
        };
        // anchor.left = 500 > 0.7 * 600 = 420 → label goes left
        let x = resolve_x(plan, &anchor(), 50.0, 600.0);
        assert!((x - (500.0 - 50.0 - 10.0)).abs() < 1e-9);

        // wide page: 500 < 0.7 * 1000 → label goes right
        let x = resolve_x(plan, &anchor(), 50.0, 1000.0);
        assert!((x - (560.0 + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_beside_guarded_falls_back_left() {
        let plan = HorizontalPlan::BesideGuarded {
            padding: 10.0,
            right_guard: 50.0,
            left_offset: 60.0,
        };
        // 560 + 10 = 570 > 600 - 50 → flip to 500 - 60
        let x = resolve_x(plan, &anchor(), 50.0, 600.0);
        assert!((x - 440.0).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_column_right_align_subtracts_width() {
        let plan = HorizontalPlan::FixedColumn {
            x: 400.0,
            align: Align::Right,
        };
        let x = resolve_x(plan, &anchor(), 80.0, 600.0);
        assert!((x - 320.0).abs() < 1e-9);
    }

    #[test]
    fn test_text_width_scales_with_font_size() {
        let w1 = text_width("HSBC_1", 10.0);
        let w2 = text_width("HSBC_1", 20.0);
        assert!((w2 - 2.0 * w1).abs() < 1e-9);
        assert!(w1 > 0.0);
    }

    #[test]
    fn test_text_width_digits() {
        // six digits at 556/1000 em
        let w = text_width("123456", 10.0);
        assert!((w - 6.0 * 5.56).abs() < 1e-9);
    }
}
