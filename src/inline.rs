//! Inline style codec.
//!
//! Paragraph content stores bold, italic and underline spans as paired
//! markers (`<b>…</b>`, `<i>…</i>`, `<u>…</u>`). This module converts that
//! representation into a neutral list of [`TextRun`]s and back.
//!
//! Markers that have no partner, or that close across another open span,
//! are kept as literal text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)([biu])>").expect("marker pattern is valid"));

/// One of the three inline styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    /// `<b>`
    Bold,
    /// `<i>`
    Italic,
    /// `<u>`
    Underline,
}

impl Style {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "b" => Some(Style::Bold),
            "i" => Some(Style::Italic),
            "u" => Some(Style::Underline),
            _ => None,
        }
    }

    /// Opening marker.
    pub fn open_tag(self) -> &'static str {
        match self {
            Style::Bold => "<b>",
            Style::Italic => "<i>",
            Style::Underline => "<u>",
        }
    }

    /// Closing marker.
    pub fn close_tag(self) -> &'static str {
        match self {
            Style::Bold => "</b>",
            Style::Italic => "</i>",
            Style::Underline => "</u>",
        }
    }
}

/// Text styling properties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextStyle {
    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,

    /// Underlined text
    pub underline: bool,
}

impl TextStyle {
    /// Unstyled text.
    pub const PLAIN: TextStyle = TextStyle {
        bold: false,
        italic: false,
        underline: false,
    };

    /// Check if no style is applied.
    pub fn is_plain(&self) -> bool {
        !self.bold && !self.italic && !self.underline
    }

    fn with(mut self, style: Style) -> Self {
        match style {
            Style::Bold => self.bold = true,
            Style::Italic => self.italic = true,
            Style::Underline => self.underline = true,
        }
        self
    }

    /// Styles in canonical nesting order: bold, italic, underline.
    pub fn styles(&self) -> impl Iterator<Item = Style> {
        [
            (self.bold, Style::Bold),
            (self.italic, Style::Italic),
            (self.underline, Style::Underline),
        ]
        .into_iter()
        .filter_map(|(on, style)| on.then_some(style))
    }
}

/// A run of text with consistent styling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    /// The text content
    pub text: String,

    /// Text styling
    pub style: TextStyle,
}

impl TextRun {
    /// Create a new text run with default style.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
        }
    }

    /// Create a run with an explicit style.
    pub fn styled(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Create a bold text run.
    pub fn bold(text: impl Into<String>) -> Self {
        Self::styled(text, TextStyle::PLAIN.with(Style::Bold))
    }

    /// Create an italic text run.
    pub fn italic(text: impl Into<String>) -> Self {
        Self::styled(text, TextStyle::PLAIN.with(Style::Italic))
    }

    /// Create an underlined text run.
    pub fn underline(text: impl Into<String>) -> Self {
        Self::styled(text, TextStyle::PLAIN.with(Style::Underline))
    }
}

enum Token<'a> {
    Text(&'a str),
    Marker { style: Style, open: bool, raw: &'a str },
}

fn tokenize(content: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for caps in MARKER.captures_iter(content) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last {
            tokens.push(Token::Text(&content[last..whole.start()]));
        }
        if let Some(style) = Style::from_tag(&caps[2]) {
            tokens.push(Token::Marker {
                style,
                open: caps[1].is_empty(),
                raw: whole.as_str(),
            });
        }
        last = whole.end();
    }
    if last < content.len() {
        tokens.push(Token::Text(&content[last..]));
    }

    tokens
}

/// Pair markers. A close only pairs with the innermost open span of the
/// same style; everything else stays unpaired.
fn pair_markers(tokens: &[Token<'_>]) -> Vec<bool> {
    let mut paired = vec![false; tokens.len()];
    let mut stack: Vec<(Style, usize)> = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        if let Token::Marker { style, open, .. } = token {
            if *open {
                stack.push((*style, i));
            } else if let Some(&(top, j)) = stack.last() {
                if top == *style {
                    stack.pop();
                    paired[i] = true;
                    paired[j] = true;
                }
            }
        }
    }

    paired
}

fn push_run(runs: &mut Vec<TextRun>, text: &str, style: TextStyle) {
    if text.is_empty() {
        return;
    }
    match runs.last_mut() {
        Some(last) if last.style == style => last.text.push_str(text),
        _ => runs.push(TextRun::styled(text, style)),
    }
}

/// Decode tagged content into runs.
///
/// Adjacent runs with identical style are merged and empty runs dropped.
pub fn decode(content: &str) -> Vec<TextRun> {
    let tokens = tokenize(content);
    let paired = pair_markers(&tokens);

    let mut runs = Vec::new();
    let mut active: Vec<Style> = Vec::new();

    for (token, is_paired) in tokens.iter().zip(paired) {
        let style = active
            .iter()
            .fold(TextStyle::PLAIN, |acc, s| acc.with(*s));
        match token {
            Token::Text(text) => push_run(&mut runs, text, style),
            Token::Marker { raw, .. } if !is_paired => push_run(&mut runs, raw, style),
            Token::Marker { style: s, open, .. } => {
                if *open {
                    active.push(*s);
                } else {
                    active.pop();
                }
            }
        }
    }

    runs
}

/// Encode runs back into tagged content.
///
/// Opening markers are emitted in the order bold, italic, underline and
/// closed in reverse.
pub fn encode(runs: &[TextRun]) -> String {
    let mut out = String::new();
    for run in runs {
        for style in run.style.styles() {
            out.push_str(style.open_tag());
        }
        out.push_str(&run.text);
        let styles: Vec<Style> = run.style.styles().collect();
        for style in styles.iter().rev() {
            out.push_str(style.close_tag());
        }
    }
    out
}

/// Check whether every marker in the content has a partner.
pub fn is_well_formed(content: &str) -> bool {
    let tokens = tokenize(content);
    let paired = pair_markers(&tokens);
    tokens
        .iter()
        .zip(paired)
        .all(|(token, is_paired)| !matches!(token, Token::Marker { .. }) || is_paired)
}

/// Strip paired markers, keeping only the text.
pub fn plain_text(content: &str) -> String {
    decode(content).into_iter().map(|run| run.text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain() {
        let runs = decode("Hello world");
        assert_eq!(runs, vec![TextRun::new("Hello world")]);
    }

    #[test]
    fn test_decode_mixed() {
        let runs = decode("A <b>bold</b> and <i>italic</i> word");
        assert_eq!(
            runs,
            vec![
                TextRun::new("A "),
                TextRun::bold("bold"),
                TextRun::new(" and "),
                TextRun::italic("italic"),
                TextRun::new(" word"),
            ]
        );
    }

    #[test]
    fn test_decode_nested() {
        let runs = decode("<b>x<i>y</i></b>");
        assert_eq!(runs.len(), 2);
        assert!(runs[1].style.bold && runs[1].style.italic);
    }

    #[test]
    fn test_unmatched_marker_is_literal() {
        let runs = decode("a <b>b");
        assert_eq!(runs, vec![TextRun::new("a <b>b")]);
        assert!(!is_well_formed("a <b>b"));

        let runs = decode("x</u>");
        assert_eq!(runs, vec![TextRun::new("x</u>")]);
    }

    #[test]
    fn test_overlapping_close_is_literal() {
        let runs = decode("<b>x<i>y</b>z</i>");
        let text: String = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(text, "<b>xy</b>z");
        assert!(runs.iter().any(|r| r.style.italic && r.text == "y</b>z"));
    }

    #[test]
    fn test_other_angle_text_untouched() {
        assert_eq!(plain_text("1 < 2 and <sup>x</sup>"), "1 < 2 and <sup>x</sup>");
    }

    #[test]
    fn test_encode_order() {
        let style = TextStyle {
            bold: true,
            italic: true,
            underline: true,
        };
        let encoded = encode(&[TextRun::styled("x", style)]);
        assert_eq!(encoded, "<b><i><u>x</u></i></b>");
    }

    #[test]
    fn test_round_trip() {
        let runs = vec![
            TextRun::new("plain "),
            TextRun::underline("under"),
            TextRun::bold("bold"),
        ];
        assert_eq!(decode(&encode(&runs)), runs);
    }

    #[test]
    fn test_empty_spans_dropped() {
        assert_eq!(decode("a<b></b>b"), vec![TextRun::new("ab")]);
        assert!(decode("").is_empty());
    }
}
