//! Plain text rendering.
//!
//! Running text is written as merged by the grouper, with one exception:
//! plain text has no way to show bold, italic or underline, so paired inline
//! markers are dropped and only their text is kept. Unpaired markers stay
//! literal. Code listings and equations are copied through unchanged,
//! markers included, and are exempt from cleanup.

use crate::convert::Target;
use crate::error::Result;
use crate::inline;
use crate::model::{Paragraph, Project};
use crate::structure::{Block, FootnoteTable, FragmentEncoder};

use super::{apply_cleanup, AssetTracker, GroupedRenderer, RenderOptions, RenderResult, Segments};

const QUOTE_INDENT: &str = "        ";
const EPIGRAPH_INDENT: &str = "                            ";
const PARAGRAPH_INDENT: &str = "    ";

/// Plain text renderer.
///
/// Footnote references become `^N`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextRenderer;

/// Fragment encoder for plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextFragments;

impl FragmentEncoder for PlainTextFragments {
    fn encode_text(&mut self, paragraph: &Paragraph) -> String {
        if paragraph.kind.is_verbatim() {
            paragraph.trimmed_content().to_string()
        } else {
            inline::plain_text(paragraph.trimmed_content())
        }
    }

    fn encode_reference(&mut self, number: usize, _body: &str) -> String {
        format!("^{}", number)
    }
}

impl GroupedRenderer for PlainTextRenderer {
    type Encoder = PlainTextFragments;

    fn target(&self) -> Target {
        Target::PlainText
    }

    fn encoder(&self, _project: &Project, _options: &RenderOptions) -> Self::Encoder {
        PlainTextFragments
    }

    fn render_blocks(
        &self,
        project: &Project,
        blocks: &[Block],
        footnotes: &FootnoteTable,
        options: &RenderOptions,
    ) -> Result<RenderResult> {
        let mut output = Segments::new();
        let title = project.name.as_str();
        output.push_str(title);
        output.push('\n');
        output.push_str(&"=".repeat(title.chars().count()));
        output.push_str("\n\n");

        let image_label = options.image_placeholder_prefix.to_uppercase();
        let mut assets = AssetTracker::new();
        for block in blocks {
            if let Block::Image(metadata) = block {
                assets.check(metadata);
            }
            render_block(&mut output, block, &image_label);
        }

        if !footnotes.is_empty() {
            output.push('\n');
            output.push_str(&"=".repeat(20));
            output.push('\n');
            output.push_str(&options.footnotes_heading);
            output.push_str("\n\n");
            for (number, body) in footnotes.entries() {
                output.push_str(&format!("{}. {}\n\n", number, body));
            }
        }

        let output = apply_cleanup(output, options);
        Ok(RenderResult::text(output, Target::PlainText.mime_type())
            .with_missing_assets(assets.into_missing()))
    }
}

fn render_block(output: &mut Segments, block: &Block, image_label: &str) {
    match block {
        Block::Title1(text) => {
            output.push_str(&format!("\n{}\n", text));
            output.push_str(&"-".repeat(text.chars().count()));
            output.push_str("\n\n");
        }
        Block::Title2(text) => output.push_str(&format!("\n{}\n\n", text)),
        Block::Quote(text) => output.push_str(&format!("{}{}\n\n", QUOTE_INDENT, text)),
        Block::Epigraph(text) => output.push_str(&format!("{}{}\n\n", EPIGRAPH_INDENT, text)),
        Block::Image(metadata) => {
            output.push_str(&format!("\n{}\n\n", metadata.placeholder(image_label)));
        }
        Block::Code(text) => {
            let mut listing = String::new();
            for line in text.lines() {
                if !line.is_empty() {
                    listing.push_str(PARAGRAPH_INDENT);
                }
                listing.push_str(line);
                listing.push('\n');
            }
            output.push_verbatim(&listing);
            output.push('\n');
        }
        Block::Content {
            text,
            indent_first_line,
        } => {
            if *indent_first_line {
                output.push_str(PARAGRAPH_INDENT);
            }
            output.push_str(text);
            output.push_str("\n\n");
        }
    }
}
