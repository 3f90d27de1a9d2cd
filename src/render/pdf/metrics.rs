//! Font faces and glyph metrics for the standard Type 1 fonts.

use encoding_rs::WINDOWS_1252;
use pdf_writer::Name;
use unicode_normalization::UnicodeNormalization;

/// Standard font faces used by the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Roman,
    Bold,
    Italic,
    BoldItalic,
    Mono,
}

impl Face {
    pub const ALL: [Face; 5] = [
        Face::Roman,
        Face::Bold,
        Face::Italic,
        Face::BoldItalic,
        Face::Mono,
    ];

    /// Face for a bold/italic combination of the Times family.
    pub fn times(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => Face::Roman,
            (true, false) => Face::Bold,
            (false, true) => Face::Italic,
            (true, true) => Face::BoldItalic,
        }
    }

    /// Add bold to this face.
    pub fn bolder(self) -> Self {
        match self {
            Face::Roman => Face::Bold,
            Face::Italic => Face::BoldItalic,
            other => other,
        }
    }

    /// Add italic to this face.
    pub fn italicized(self) -> Self {
        match self {
            Face::Roman => Face::Italic,
            Face::Bold => Face::BoldItalic,
            other => other,
        }
    }

    /// PostScript name of the standard font.
    pub fn base_font(self) -> Name<'static> {
        match self {
            Face::Roman => Name(b"Times-Roman"),
            Face::Bold => Name(b"Times-Bold"),
            Face::Italic => Name(b"Times-Italic"),
            Face::BoldItalic => Name(b"Times-BoldItalic"),
            Face::Mono => Name(b"Courier"),
        }
    }

    /// Resource name used in page content streams.
    pub fn resource(self) -> Name<'static> {
        match self {
            Face::Roman => Name(b"F1"),
            Face::Bold => Name(b"F2"),
            Face::Italic => Name(b"F3"),
            Face::BoldItalic => Name(b"F4"),
            Face::Mono => Name(b"F5"),
        }
    }

    fn is_bold(self) -> bool {
        matches!(self, Face::Bold | Face::BoldItalic)
    }
}

/// Advance widths of Times-Roman for ASCII 32..=126, in 1/1000 em.
const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278, // ' '../
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444, // 0..?
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722, // @..O
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500, // P.._
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500, // `..o
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541, // p..~
];

const COURIER_WIDTH: f32 = 600.0;
const FALLBACK_WIDTH: f32 = 500.0;
const BOLD_SCALE: f32 = 1.05;

fn units(c: char, face: Face) -> f32 {
    if face == Face::Mono {
        return COURIER_WIDTH;
    }

    // Accented letters take the width of their base letter.
    let base = if c.is_ascii() {
        c
    } else {
        std::iter::once(c).nfd().next().unwrap_or(c)
    };

    let width = match base as u32 {
        code @ 32..=126 => f32::from(TIMES_ROMAN[(code - 32) as usize]),
        _ => FALLBACK_WIDTH,
    };

    if face.is_bold() {
        width * BOLD_SCALE
    } else {
        width
    }
}

/// Width of a string in points.
pub fn text_width(text: &str, face: Face, size: f32) -> f32 {
    text.chars().map(|c| units(c, face)).sum::<f32>() * size / 1000.0
}

/// Encode text for a WinAnsi-encoded standard font.
///
/// Characters outside Windows-1252 become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for c in text.chars() {
        let (bytes, _, had_errors) = WINDOWS_1252.encode(c.encode_utf8(&mut buf));
        if had_errors || bytes.len() != 1 {
            out.push(b'?');
        } else {
            out.extend_from_slice(&bytes);
        }
    }
    out
}
