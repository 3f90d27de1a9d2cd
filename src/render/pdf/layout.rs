//! Line layout: markup parsing, word measurement, greedy line breaking and
//! horizontal placement.

use super::metrics::{text_width, Face};
use crate::inline;
use regex::Regex;
use std::sync::LazyLock;

static SUPERSCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<sup>(.*?)</sup>").expect("superscript pattern is valid"));

/// Superscript glyphs are drawn at this fraction of the base size.
const SUPERSCRIPT_SCALE: f32 = 0.7;
/// Baseline rise of superscripts as a fraction of the base size.
const SUPERSCRIPT_RISE: f32 = 0.33;

/// Horizontal alignment of a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
    /// Both edges flush; the last line is left aligned.
    Justify,
}

/// A measured piece of uniformly styled text.
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    pub text: String,
    pub face: Face,
    pub size: f32,
    pub rise: f32,
    pub underline: bool,
    pub width: f32,
}

/// An unbreakable sequence of pieces.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Word {
    pub pieces: Vec<Piece>,
    pub width: f32,
}

impl Word {
    fn push_char(&mut self, c: char, face: Face, size: f32, rise: f32, underline: bool) {
        match self.pieces.last_mut() {
            Some(last)
                if last.face == face
                    && last.size == size
                    && last.rise == rise
                    && last.underline == underline =>
            {
                last.text.push(c);
            }
            _ => self.pieces.push(Piece {
                text: c.to_string(),
                face,
                size,
                rise,
                underline,
                width: 0.0,
            }),
        }
    }

    fn measure(mut self) -> Self {
        for piece in &mut self.pieces {
            piece.width = text_width(&piece.text, piece.face, piece.size);
        }
        self.width = self.pieces.iter().map(|p| p.width).sum();
        self
    }
}

/// One laid-out line.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub words: Vec<Word>,
    /// Width of the words plus single spaces between them
    pub natural_width: f32,
    pub first: bool,
    pub last: bool,
}

/// A styled span before word splitting.
struct Span {
    text: String,
    face: Face,
    size: f32,
    rise: f32,
    underline: bool,
}

/// Parse paragraph markup into styled spans.
///
/// Understands the inline style markers and `<sup>…</sup>` footnote
/// references; everything else is literal text.
fn parse_markup(text: &str, base: Face, size: f32) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut push_styled = |segment: &str, spans: &mut Vec<Span>| {
        for run in inline::decode(segment) {
            let mut face = base;
            if run.style.bold {
                face = face.bolder();
            }
            if run.style.italic {
                face = face.italicized();
            }
            spans.push(Span {
                text: run.text,
                face,
                size,
                rise: 0.0,
                underline: run.style.underline,
            });
        }
    };

    let mut last = 0;
    for caps in SUPERSCRIPT.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_styled(&text[last..whole.start()], &mut spans);
        spans.push(Span {
            text: inline::plain_text(inner.as_str()),
            face: base,
            size: size * SUPERSCRIPT_SCALE,
            rise: size * SUPERSCRIPT_RISE,
            underline: false,
        });
        last = whole.end();
    }
    push_styled(&text[last..], &mut spans);

    spans
}

/// Split markup into measured words.
pub fn words(text: &str, base: Face, size: f32) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current = Word::default();

    for span in parse_markup(text, base, size) {
        for c in span.text.chars() {
            if c.is_whitespace() {
                if !current.pieces.is_empty() {
                    words.push(std::mem::take(&mut current).measure());
                }
            } else {
                current.push_char(c, span.face, span.size, span.rise, span.underline);
            }
        }
    }
    if !current.pieces.is_empty() {
        words.push(current.measure());
    }

    words
}

/// Break words into lines greedily.
///
/// A word wider than the line is placed on a line of its own.
pub fn break_lines(words: Vec<Word>, width: f32, first_indent: f32, space: f32) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut current: Vec<Word> = Vec::new();
    let mut current_width = 0.0;
    let mut available = width - first_indent;

    for word in words {
        let needed = if current.is_empty() {
            word.width
        } else {
            current_width + space + word.width
        };
        if !current.is_empty() && needed > available {
            lines.push(Line {
                words: std::mem::take(&mut current),
                natural_width: current_width,
                first: lines.is_empty(),
                last: false,
            });
            available = width;
            current_width = word.width;
        } else {
            current_width = needed;
        }
        current.push(word);
    }

    if !current.is_empty() {
        lines.push(Line {
            words: current,
            natural_width: current_width,
            first: lines.is_empty(),
            last: true,
        });
    }

    lines
}

/// Compute the x position of every piece on a line.
///
/// `x0` is the left edge of the paragraph box and `width` its width.
pub fn place_line<'a>(
    line: &'a Line,
    align: Align,
    x0: f32,
    width: f32,
    first_indent: f32,
    space: f32,
) -> Vec<(f32, &'a Piece)> {
    let indent = if line.first { first_indent } else { 0.0 };
    let available = width - indent;
    let slack = (available - line.natural_width).max(0.0);
    let gaps = line.words.len().saturating_sub(1);

    let (mut x, gap) = match align {
        Align::Left => (x0 + indent, space),
        Align::Right => (x0 + indent + slack, space),
        Align::Center => (x0 + indent + slack / 2.0, space),
        Align::Justify if !line.last && gaps > 0 => {
            (x0 + indent, space + slack / gaps as f32)
        }
        Align::Justify => (x0 + indent, space),
    };

    let mut placed = Vec::new();
    for (i, word) in line.words.iter().enumerate() {
        if i > 0 {
            x += gap;
        }
        for piece in &word.pieces {
            placed.push((x, piece));
            x += piece.width;
        }
    }
    placed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_with_styles_and_superscript() {
        let ws = words("plain <b>bold</b>, end<sup>12</sup>", Face::Roman, 10.0);
        assert_eq!(ws.len(), 3);
        assert_eq!(ws[1].pieces[0].face, Face::Bold);
        assert_eq!(ws[1].pieces[1].text, ",");
        let sup = &ws[2].pieces[1];
        assert_eq!(sup.text, "12");
        assert!((sup.size - 7.0).abs() < 1e-4);
        assert!(sup.rise > 0.0);
    }

    #[test]
    fn test_italic_base_with_bold_run() {
        let ws = words("<b>x</b>", Face::Italic, 10.0);
        assert_eq!(ws[0].pieces[0].face, Face::BoldItalic);
    }

    #[test]
    fn test_greedy_breaking() {
        // each "aa" is 8.88pt at 10pt, space 2.5pt
        let ws = words("aa aa aa aa", Face::Roman, 10.0);
        let lines = break_lines(ws, 21.0, 0.0, 2.5);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].words.len(), 2);
        assert!(lines[0].first && !lines[0].last);
        assert!(lines[1].last);
    }

    #[test]
    fn test_first_indent_narrows_first_line() {
        let ws = words("aa aa aa", Face::Roman, 10.0);
        let lines = break_lines(ws, 21.0, 10.0, 2.5);
        assert_eq!(lines[0].words.len(), 1);
        assert_eq!(lines[1].words.len(), 2);
    }

    #[test]
    fn test_overlong_word_gets_own_line() {
        let ws = words("a verylongwordthatdoesnotfit b", Face::Roman, 10.0);
        let lines = break_lines(ws, 30.0, 0.0, 2.5);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_alignment() {
        let ws = words("aa aa aa aa", Face::Roman, 10.0);
        let lines = break_lines(ws, 21.0, 0.0, 2.5);

        let right = place_line(&lines[1], Align::Right, 100.0, 21.0, 0.0, 2.5);
        let last = right.last().unwrap();
        assert!((last.0 + last.1.width - 121.0).abs() < 1e-3);

        let justified = place_line(&lines[0], Align::Justify, 0.0, 21.0, 0.0, 2.5);
        let end = justified.last().unwrap();
        assert!((end.0 + end.1.width - 21.0).abs() < 1e-3);

        // last line of a justified paragraph stays left aligned
        let tail = place_line(&lines[1], Align::Justify, 0.0, 21.0, 0.0, 2.5);
        assert_eq!(tail[0].0, 0.0);
    }
}
