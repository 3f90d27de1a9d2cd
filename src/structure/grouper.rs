//! Structural grouping of paragraphs into blocks.
//!
//! Running-text paragraphs (introduction, argument, argument resumption,
//! conclusion) are merged into `Content` blocks; every other kind becomes an
//! atomic block of its own. The fold is expressed as a pure step function over
//! [`FoldState`] so it can be exercised without any renderer.

use super::FootnoteTable;
use crate::error::Error;
use crate::model::{ImageMetadata, Paragraph, ParagraphKind};

/// Output unit of the grouper.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Section heading
    Title1(String),
    /// Subsection heading
    Title2(String),
    /// Block quotation
    Quote(String),
    /// Epigraph
    Epigraph(String),
    /// Figure
    Image(ImageMetadata),
    /// Code listing or display equation
    Code(String),
    /// Merged running text
    Content {
        /// Encoded text of all merged paragraphs, joined by single spaces
        text: String,
        /// Whether the block opens a logical paragraph
        indent_first_line: bool,
    },
}

impl Block {
    /// Short name of the variant, for logs and statistics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Block::Title1(_) => "title1",
            Block::Title2(_) => "title2",
            Block::Quote(_) => "quote",
            Block::Epigraph(_) => "epigraph",
            Block::Image(_) => "image",
            Block::Code(_) => "code",
            Block::Content { .. } => "content",
        }
    }
}

/// Per-target encoding of paragraph text before grouping.
///
/// Grouped renderers supply one of these so that the merged `Content` text is
/// already in the target's syntax (escaped, with footnote references).
pub trait FragmentEncoder {
    /// Encode the content of a text paragraph.
    fn encode_text(&mut self, paragraph: &Paragraph) -> String {
        paragraph.trimmed_content().to_string()
    }

    /// Encode a reference to footnote `number`.
    fn encode_reference(&mut self, number: usize, body: &str) -> String;
}

/// Encoder that keeps content as stored and marks references as `^N`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaretReferences;

impl FragmentEncoder for CaretReferences {
    fn encode_reference(&mut self, number: usize, _body: &str) -> String {
        format!("^{}", number)
    }
}

/// A paragraph prepared for the fold.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Encoded text (with references for running text)
    Text(String),
    /// Parsed image metadata; `None` when the record was unreadable
    Image(Option<ImageMetadata>),
}

/// State carried across the fold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoldState {
    /// Pending running-text fragments
    pub buffer: Vec<String>,
    /// Indentation of the pending block
    pub indent_first_line: bool,
    /// Whether the previous paragraph was a quote or an epigraph
    pub last_was_quote_or_epigraph: bool,
}

impl FoldState {
    /// Take the pending buffer as a `Content` block and reset.
    fn flush(&mut self) -> Option<Block> {
        if self.buffer.is_empty() {
            return None;
        }
        let text = self.buffer.join(" ");
        let indent_first_line = self.indent_first_line;
        self.buffer.clear();
        self.indent_first_line = false;
        Some(Block::Content {
            text,
            indent_first_line,
        })
    }

    /// Flush whatever is left after the last paragraph.
    pub fn finish(mut self) -> Option<Block> {
        self.flush()
    }
}

/// Advance the fold by one paragraph.
///
/// `next` is the kind of the following paragraph, `None` for the last one.
/// Returns the new state and the blocks emitted by this step, in order.
pub fn fold_step(
    mut state: FoldState,
    kind: ParagraphKind,
    fragment: Fragment,
    next: Option<ParagraphKind>,
) -> (FoldState, Vec<Block>) {
    let mut emitted = Vec::new();

    if !kind.is_running_text() {
        emitted.extend(state.flush());
        let block = match (kind, fragment) {
            (_, Fragment::Image(metadata)) => metadata.map(Block::Image),
            (ParagraphKind::Title1, Fragment::Text(t)) => Some(Block::Title1(t)),
            (ParagraphKind::Title2, Fragment::Text(t)) => Some(Block::Title2(t)),
            (ParagraphKind::Quote, Fragment::Text(t)) => Some(Block::Quote(t)),
            (ParagraphKind::Epigraph, Fragment::Text(t)) => Some(Block::Epigraph(t)),
            (_, Fragment::Text(t)) => Some(Block::Code(t)),
        };
        emitted.extend(block);
        state.last_was_quote_or_epigraph =
            matches!(kind, ParagraphKind::Quote | ParagraphKind::Epigraph);
        return (state, emitted);
    }

    let starts_new_block =
        kind.opens_block() || state.last_was_quote_or_epigraph || state.buffer.is_empty();
    if starts_new_block {
        emitted.extend(state.flush());
    }
    if state.buffer.is_empty() {
        state.indent_first_line = kind.opens_block();
    }

    let text = match fragment {
        Fragment::Text(t) => t,
        Fragment::Image(_) => String::new(),
    };
    state.buffer.push(text);

    let force_flush = next.map_or(true, ParagraphKind::forces_flush_before);
    if force_flush {
        emitted.extend(state.flush());
    }

    state.last_was_quote_or_epigraph = false;
    (state, emitted)
}

/// Prepare a paragraph for the fold using the given encoder.
pub fn prepare_fragment(
    paragraph: &Paragraph,
    footnotes: &FootnoteTable,
    encoder: &mut dyn FragmentEncoder,
) -> Fragment {
    if paragraph.kind == ParagraphKind::Image {
        let metadata = paragraph.image_metadata();
        if metadata.is_none() {
            log::warn!("{}", Error::InvalidImageMetadata(paragraph.id.clone()));
        }
        return Fragment::Image(metadata);
    }

    let mut text = encoder.encode_text(paragraph);
    if paragraph.kind.is_running_text() {
        for &number in footnotes.references(&paragraph.id) {
            let body = footnotes.body(number).unwrap_or_default();
            text.push_str(&encoder.encode_reference(number, body));
        }
    }
    Fragment::Text(text)
}

/// Fold the paragraph sequence into blocks.
pub fn group(
    paragraphs: &[Paragraph],
    footnotes: &FootnoteTable,
    encoder: &mut dyn FragmentEncoder,
) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut state = FoldState::default();

    for (i, paragraph) in paragraphs.iter().enumerate() {
        let fragment = prepare_fragment(paragraph, footnotes, encoder);
        let next = paragraphs.get(i + 1).map(|p| p.kind);
        let (new_state, emitted) = fold_step(state, paragraph.kind, fragment, next);
        state = new_state;
        blocks.extend(emitted);
    }
    blocks.extend(state.finish());

    blocks
}

/// Group with stored content and `^N` references.
pub fn group_plain(paragraphs: &[Paragraph], footnotes: &FootnoteTable) -> Vec<Block> {
    group(paragraphs, footnotes, &mut CaretReferences)
}
