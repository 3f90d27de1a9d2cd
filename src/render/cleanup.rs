//! Text cleanup pipeline for the text-based targets.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static INTERIOR_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\S)[ \t]{2,}").expect("whitespace pattern is valid"));

static TRAILING_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)[ \t]+$").expect("trailing pattern is valid"));

/// Cleanup preset levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPreset {
    /// Minimal cleanup: Unicode NFC normalization only
    Minimal,
    /// Standard cleanup: NFC + whitespace normalization + blank line limit
    #[default]
    Standard,
}

/// Options for text cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Normalize Unicode to NFC form
    pub normalize_unicode: bool,

    /// Remove Unicode replacement character (U+FFFD)
    pub remove_replacement_char: bool,

    /// Collapse runs of spaces between words (leading indentation is kept)
    pub normalize_whitespace: bool,

    /// Strip spaces at the end of every line
    pub trim_trailing_whitespace: bool,

    /// Maximum consecutive newlines (0 = unlimited)
    pub max_consecutive_newlines: u8,

    /// Preserve YAML frontmatter during cleanup
    pub preserve_frontmatter: bool,
}

impl CleanupOptions {
    /// Create options from a preset.
    pub fn from_preset(preset: CleanupPreset) -> Self {
        match preset {
            CleanupPreset::Minimal => Self::minimal(),
            CleanupPreset::Standard => Self::standard(),
        }
    }

    /// Minimal cleanup options.
    pub fn minimal() -> Self {
        Self {
            normalize_unicode: true,
            remove_replacement_char: false,
            normalize_whitespace: false,
            trim_trailing_whitespace: false,
            max_consecutive_newlines: 0,
            preserve_frontmatter: true,
        }
    }

    /// Standard cleanup options.
    pub fn standard() -> Self {
        Self {
            normalize_unicode: true,
            remove_replacement_char: true,
            normalize_whitespace: true,
            trim_trailing_whitespace: true,
            // Blank lines separate blocks, so keep one.
            max_consecutive_newlines: 2,
            preserve_frontmatter: true,
        }
    }
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self::standard()
    }
}

/// Rendered output split into text that cleanup may rewrite and verbatim
/// spans (code listings, equations) it must leave untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segments {
    parts: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Verbatim(String),
}

impl Segments {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text subject to cleanup.
    pub fn push_str(&mut self, text: &str) {
        match self.parts.last_mut() {
            Some(Segment::Text(last)) => last.push_str(text),
            _ => self.parts.push(Segment::Text(text.to_string())),
        }
    }

    /// Append a single character subject to cleanup.
    pub fn push(&mut self, c: char) {
        self.push_str(c.encode_utf8(&mut [0; 4]));
    }

    /// Append text that cleanup must not touch.
    pub fn push_verbatim(&mut self, text: &str) {
        self.parts.push(Segment::Verbatim(text.to_string()));
    }

    /// Drop trailing whitespace from the end of the buffer.
    pub fn trim_end(&mut self) {
        while let Some(last) = self.parts.last_mut() {
            let text = match last {
                Segment::Text(t) | Segment::Verbatim(t) => t,
            };
            text.truncate(text.trim_end().len());
            if !text.is_empty() {
                break;
            }
            self.parts.pop();
        }
    }

    /// Concatenate every segment unchanged.
    pub fn into_string(self) -> String {
        self.parts
            .into_iter()
            .map(|part| match part {
                Segment::Text(t) | Segment::Verbatim(t) => t,
            })
            .collect()
    }
}

impl From<&str> for Segments {
    fn from(text: &str) -> Self {
        let mut segments = Self::new();
        segments.push_str(text);
        segments
    }
}

/// Text cleanup pipeline.
pub struct CleanupPipeline {
    options: CleanupOptions,
}

impl CleanupPipeline {
    /// Create a new cleanup pipeline with the given options.
    pub fn new(options: CleanupOptions) -> Self {
        Self { options }
    }

    /// Create a pipeline from a preset.
    pub fn from_preset(preset: CleanupPreset) -> Self {
        Self::new(CleanupOptions::from_preset(preset))
    }

    /// Process text through the cleanup pipeline.
    pub fn process(&self, text: &str) -> String {
        self.process_segments(Segments::from(text))
    }

    /// Process rendered output, copying verbatim segments through as is.
    ///
    /// The blank line limit counts newlines across segment boundaries but
    /// never drops a newline inside a verbatim segment.
    pub fn process_segments(&self, segments: Segments) -> String {
        let mut out = String::new();
        let mut newlines = NewlineLimit::new(self.options.max_consecutive_newlines);

        for (i, part) in segments.parts.into_iter().enumerate() {
            match part {
                Segment::Verbatim(text) => newlines.push(&mut out, &text, false),
                Segment::Text(text) => {
                    let frontmatter = if i == 0 && self.options.preserve_frontmatter {
                        extract_frontmatter(&text)
                    } else {
                        None
                    };
                    let body = match frontmatter {
                        Some((fm, body)) => {
                            newlines.push(&mut out, fm, false);
                            body
                        }
                        None => text.as_str(),
                    };
                    newlines.push(&mut out, &self.process_content(body), true);
                }
            }
        }

        out
    }

    fn process_content(&self, text: &str) -> String {
        let mut result = if self.options.normalize_unicode {
            text.nfc().collect()
        } else {
            text.to_string()
        };

        if self.options.remove_replacement_char {
            result = result.replace('\u{FFFD}', "");
        }

        if self.options.normalize_whitespace {
            result = INTERIOR_WHITESPACE.replace_all(&result, "$1 ").into_owned();
        }

        if self.options.trim_trailing_whitespace {
            result = TRAILING_WHITESPACE.replace_all(&result, "").into_owned();
        }

        result
    }
}

/// Running count of consecutive newlines written so far.
struct NewlineLimit {
    max: usize,
    run: usize,
}

impl NewlineLimit {
    fn new(max: u8) -> Self {
        Self {
            max: max as usize,
            run: 0,
        }
    }

    fn push(&mut self, out: &mut String, text: &str, enforce: bool) {
        for c in text.chars() {
            if c == '\n' {
                self.run += 1;
                if enforce && self.max > 0 && self.run > self.max {
                    continue;
                }
            } else {
                self.run = 0;
            }
            out.push(c);
        }
    }
}

fn extract_frontmatter(text: &str) -> Option<(&str, &str)> {
    let stripped = text.strip_prefix("---\n")?;
    let end_pos = stripped.find("\n---\n")?;
    let fm_end = 4 + end_pos + 5;
    Some((&text[..fm_end], &text[fm_end..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nfc_normalization() {
        let pipeline = CleanupPipeline::from_preset(CleanupPreset::Minimal);
        // "e" + combining acute accent
        let result = pipeline.process("caf\u{0065}\u{0301}");
        assert_eq!(result, "caf\u{00E9}");
    }

    #[test]
    fn test_leading_indentation_kept() {
        let pipeline = CleanupPipeline::from_preset(CleanupPreset::Standard);
        let result = pipeline.process("        quoted   text  \n    indented");
        assert_eq!(result, "        quoted text\n    indented");
    }

    #[test]
    fn test_limit_newlines() {
        let pipeline = CleanupPipeline::from_preset(CleanupPreset::Standard);
        assert_eq!(pipeline.process("a\n\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_frontmatter_preserved() {
        let pipeline = CleanupPipeline::from_preset(CleanupPreset::Standard);
        let text = "---\ntitle: \"x\"   \n---\nbody   text";
        let result = pipeline.process(text);
        assert!(result.starts_with("---\ntitle: \"x\"   \n---\n"));
        assert!(result.ends_with("body text"));
    }

    #[test]
    fn test_replacement_char_removed() {
        let pipeline = CleanupPipeline::from_preset(CleanupPreset::Standard);
        assert_eq!(pipeline.process("a\u{FFFD}b"), "ab");
    }

    #[test]
    fn test_verbatim_segments_untouched() {
        let pipeline = CleanupPipeline::from_preset(CleanupPreset::Standard);
        let mut segments = Segments::new();
        segments.push_str("text   here\n\n\n\n");
        segments.push_verbatim("let  x    = 1;\n\n\n\nlet y = 2;  ");
        segments.push_str("\n\n\n\nafter   it");

        assert_eq!(
            pipeline.process_segments(segments),
            "text here\n\nlet  x    = 1;\n\n\n\nlet y = 2;  \n\nafter it"
        );
    }

    #[test]
    fn test_segments_trim_end() {
        let mut segments = Segments::new();
        segments.push_verbatim("code  ");
        segments.push_str("\n\n");
        segments.trim_end();
        assert_eq!(segments.into_string(), "code");
    }
}
