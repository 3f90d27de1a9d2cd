//! Paragraph-level types.

use serde::{Deserialize, Serialize};

use super::ImageMetadata;

/// The structural role of a paragraph in an academic text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphKind {
    /// Section heading
    #[serde(rename = "title_1")]
    Title1,
    /// Subsection heading
    #[serde(rename = "title_2")]
    Title2,
    /// Opens a logical paragraph
    Introduction,
    /// Develops the current logical paragraph
    Argument,
    /// Reopens a logical paragraph after an interruption
    ArgumentResumption,
    /// Long quotation set apart from the running text
    #[serde(alias = "argument_quote")]
    Quote,
    /// Epigraph, set flush right
    Epigraph,
    /// Closes a logical paragraph
    Conclusion,
    /// Figure; content is a JSON metadata record
    Image,
    /// Verbatim code listing
    Code,
    /// Display equation in typesetting-language syntax
    Equation,
}

impl ParagraphKind {
    /// All kinds, in declaration order.
    pub const ALL: [ParagraphKind; 11] = [
        ParagraphKind::Title1,
        ParagraphKind::Title2,
        ParagraphKind::Introduction,
        ParagraphKind::Argument,
        ParagraphKind::ArgumentResumption,
        ParagraphKind::Quote,
        ParagraphKind::Epigraph,
        ParagraphKind::Conclusion,
        ParagraphKind::Image,
        ParagraphKind::Code,
        ParagraphKind::Equation,
    ];

    /// Whether paragraphs of this kind are merged into running text.
    pub fn is_running_text(self) -> bool {
        match self {
            ParagraphKind::Introduction
            | ParagraphKind::Argument
            | ParagraphKind::ArgumentResumption
            | ParagraphKind::Conclusion => true,
            ParagraphKind::Title1
            | ParagraphKind::Title2
            | ParagraphKind::Quote
            | ParagraphKind::Epigraph
            | ParagraphKind::Image
            | ParagraphKind::Code
            | ParagraphKind::Equation => false,
        }
    }

    /// Whether content of this kind is reproduced literally, with no inline
    /// markup decoding or whitespace rewriting.
    pub fn is_verbatim(self) -> bool {
        matches!(self, ParagraphKind::Code | ParagraphKind::Equation)
    }

    /// Whether a running-text paragraph of this kind opens a new, indented block.
    pub fn opens_block(self) -> bool {
        match self {
            ParagraphKind::Introduction | ParagraphKind::ArgumentResumption => true,
            ParagraphKind::Argument
            | ParagraphKind::Conclusion
            | ParagraphKind::Title1
            | ParagraphKind::Title2
            | ParagraphKind::Quote
            | ParagraphKind::Epigraph
            | ParagraphKind::Image
            | ParagraphKind::Code
            | ParagraphKind::Equation => false,
        }
    }

    /// Whether a following paragraph of this kind makes the grouper flush
    /// pending running text immediately.
    ///
    /// Only a narrow set of successors qualifies. `Epigraph`, `Image`, `Code`,
    /// `Equation` and `ArgumentResumption` still end the block, but only when
    /// they are themselves processed.
    pub fn forces_flush_before(self) -> bool {
        match self {
            ParagraphKind::Introduction
            | ParagraphKind::Title1
            | ParagraphKind::Title2
            | ParagraphKind::Quote => true,
            ParagraphKind::Argument
            | ParagraphKind::ArgumentResumption
            | ParagraphKind::Conclusion
            | ParagraphKind::Epigraph
            | ParagraphKind::Image
            | ParagraphKind::Code
            | ParagraphKind::Equation => false,
        }
    }

    /// Stable snake_case name, as used in saved projects.
    pub fn as_str(self) -> &'static str {
        match self {
            ParagraphKind::Title1 => "title_1",
            ParagraphKind::Title2 => "title_2",
            ParagraphKind::Introduction => "introduction",
            ParagraphKind::Argument => "argument",
            ParagraphKind::ArgumentResumption => "argument_resumption",
            ParagraphKind::Quote => "quote",
            ParagraphKind::Epigraph => "epigraph",
            ParagraphKind::Conclusion => "conclusion",
            ParagraphKind::Image => "image",
            ParagraphKind::Code => "code",
            ParagraphKind::Equation => "equation",
        }
    }
}

/// A single typed paragraph of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Identifier, unique within the project
    pub id: String,

    /// Structural role
    #[serde(rename = "type")]
    pub kind: ParagraphKind,

    /// Inline-style-tagged text, or a JSON record for images
    #[serde(default)]
    pub content: String,

    /// Footnote bodies attached to this paragraph, in order
    #[serde(default)]
    pub footnotes: Vec<String>,

    /// Position in the project
    #[serde(default)]
    pub order: usize,
}

impl Paragraph {
    /// Create a new paragraph.
    pub fn new(id: impl Into<String>, kind: ParagraphKind, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            content: content.into(),
            footnotes: Vec::new(),
            order: 0,
        }
    }

    /// Attach a footnote body.
    pub fn with_footnote(mut self, body: impl Into<String>) -> Self {
        self.footnotes.push(body.into());
        self
    }

    /// Create an image paragraph from a metadata record.
    pub fn image(id: impl Into<String>, metadata: &ImageMetadata) -> Self {
        Self::new(id, ParagraphKind::Image, metadata.to_json())
    }

    /// Parse the image metadata record, if this is an image paragraph.
    pub fn image_metadata(&self) -> Option<ImageMetadata> {
        if self.kind != ParagraphKind::Image {
            return None;
        }
        ImageMetadata::from_json(&self.content).ok()
    }

    /// Content without surrounding whitespace.
    ///
    /// Verbatim kinds keep the indentation of their first line; only blank
    /// leading lines and trailing whitespace are dropped.
    pub fn trimmed_content(&self) -> &str {
        if self.kind.is_verbatim() {
            self.content.trim_end().trim_start_matches(['\n', '\r'])
        } else {
            self.content.trim()
        }
    }

    /// Word count of the stored content.
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }

    /// Character count of the stored content.
    pub fn char_count(&self, include_spaces: bool) -> usize {
        if include_spaces {
            self.content.chars().count()
        } else {
            self.content.chars().filter(|c| *c != ' ').count()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_text_kinds() {
        let running: Vec<_> = ParagraphKind::ALL
            .iter()
            .filter(|k| k.is_running_text())
            .collect();
        assert_eq!(running.len(), 4);
        assert!(ParagraphKind::ArgumentResumption.is_running_text());
        assert!(!ParagraphKind::Epigraph.is_running_text());
    }

    #[test]
    fn test_flush_successors_are_narrow() {
        assert!(ParagraphKind::Quote.forces_flush_before());
        assert!(!ParagraphKind::Epigraph.forces_flush_before());
        assert!(!ParagraphKind::Image.forces_flush_before());
        assert!(!ParagraphKind::ArgumentResumption.forces_flush_before());
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&ParagraphKind::Title1).unwrap();
        assert_eq!(json, "\"title_1\"");

        let kind: ParagraphKind = serde_json::from_str("\"argument_quote\"").unwrap();
        assert_eq!(kind, ParagraphKind::Quote);

        for kind in ParagraphKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_counts() {
        let p = Paragraph::new("p1", ParagraphKind::Argument, "one two  three");
        assert_eq!(p.word_count(), 3);
        assert_eq!(p.char_count(true), 14);
        assert_eq!(p.char_count(false), 11);
    }

    #[test]
    fn test_image_metadata_only_for_images() {
        let p = Paragraph::new("p1", ParagraphKind::Argument, "{}");
        assert!(p.image_metadata().is_none());
    }

    #[test]
    fn test_trimmed_content_keeps_code_indentation() {
        let code = Paragraph::new("c", ParagraphKind::Code, "\n    indented\n  body  \n\n");
        assert_eq!(code.trimmed_content(), "    indented\n  body");

        let text = Paragraph::new("t", ParagraphKind::Argument, "   spaced   ");
        assert_eq!(text.trimmed_content(), "spaced");

        assert!(ParagraphKind::Equation.is_verbatim());
        assert!(!ParagraphKind::Quote.is_verbatim());
    }
}
