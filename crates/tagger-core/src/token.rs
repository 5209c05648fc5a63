//! Word tokens, bounding boxes, and reconstructed rows.
//!
//! Coordinates are top-origin page points (y grows downward), matching the
//! reading order the classifiers reason in. The PDF layer converts from the
//! native bottom-origin user space on extraction.

/// Axis-aligned bounding box in top-origin page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn mid_x(&self) -> f64 {
        (self.left + self.right) / 2.0
    }

    pub fn mid_y(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }

    /// Grow the box by `dx` on each side horizontally and `dy` vertically.
    pub fn inflate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.left - dx, self.top - dy, self.right + dx, self.bottom + dy)
    }
}

/// A single word as recovered from a page: immutable text plus bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    pub bbox: Rect,
}

impl Token {
    pub fn new(text: impl Into<String>, bbox: Rect) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// All tokens of one page plus its geometry.
#[derive(Debug, Clone)]
pub struct PageWords {
    /// 0-based page index within the document.
    pub index: usize,
    pub width: f64,
    pub height: f64,
    pub tokens: Vec<Token>,
}

impl PageWords {
    /// Joined upper-cased text of every token, in extraction order.
    pub fn joined_text_upper(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase()
    }
}

/// Tokens judged to lie on the same visual line, sorted left-to-right.
#[derive(Debug, Clone)]
pub struct Row<'a> {
    /// Representative vertical coordinate the row was keyed on.
    pub key: f64,
    pub tokens: Vec<&'a Token>,
}

impl<'a> Row<'a> {
    /// Upper-cased row text with single spaces between tokens.
    pub fn joined_text_upper(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase()
    }

    pub fn first(&self) -> Option<&'a Token> {
        self.tokens.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_dimensions() {
        let r = Rect::new(10.0, 20.0, 110.0, 32.0);
        assert_eq!(r.width(), 100.0);
        assert_eq!(r.height(), 12.0);
        assert_eq!(r.mid_x(), 60.0);
        assert_eq!(r.mid_y(), 26.0);
    }

    #[test]
    fn test_rect_inflate() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0).inflate(5.0, 2.0);
        assert_eq!(r, Rect::new(5.0, 18.0, 35.0, 42.0));
    }

    #[test]
    fn test_row_joined_text() {
        let a = Token::new("pago", Rect::new(0.0, 0.0, 10.0, 5.0));
        let b = Token::new("Tarjeta", Rect::new(12.0, 0.0, 30.0, 5.0));
        let row = Row {
            key: 2.5,
            tokens: vec![&a, &b],
        };
        assert_eq!(row.joined_text_upper(), "PAGO TARJETA");
    }
}
