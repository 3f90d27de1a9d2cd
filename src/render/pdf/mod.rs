//! Paginated layout rendering.
//!
//! Blocks are laid out with the standard Type 1 fonts (Times and Courier) on
//! pages sized from the project's formatting. Footnote references are set as
//! superscript numbers and the deduplicated footnote bodies are listed after
//! the body text.

mod layout;
mod metrics;
mod writer;

use crate::convert::Target;
use crate::error::Result;
use crate::inline;
use crate::model::{DocumentFormatting, ImageAlignment, ImageMetadata, Project};
use crate::structure::{Block, FootnoteTable, FragmentEncoder};

use self::layout::Align;
use self::metrics::Face;
use self::writer::{DocumentInfo, EmbeddedImage, PageBuilder, PageSetup, ParagraphStyle, PT_PER_CM};
use super::{AssetTracker, GroupedRenderer, RenderOptions, RenderResult};

const FIGURE_SPACING: f32 = 6.0;

/// PDF renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

/// Fragment encoder for the page layout: content keeps its inline markers
/// and references become superscripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfFragments;

impl FragmentEncoder for PdfFragments {
    fn encode_reference(&mut self, number: usize, _body: &str) -> String {
        format!("<sup>{}</sup>", number)
    }
}

impl GroupedRenderer for PdfRenderer {
    type Encoder = PdfFragments;

    fn target(&self) -> Target {
        Target::PaginatedLayout
    }

    fn encoder(&self, _project: &Project, _options: &RenderOptions) -> Self::Encoder {
        PdfFragments
    }

    fn render_blocks(
        &self,
        project: &Project,
        blocks: &[Block],
        footnotes: &FootnoteTable,
        options: &RenderOptions,
    ) -> Result<RenderResult> {
        let fmt = &project.document_formatting;
        let styles = Styles::new(fmt);
        let mut pages = PageBuilder::new(PageSetup::from_formatting(fmt));
        let mut assets = AssetTracker::new();

        pages.paragraph(&project.name, &styles.title);
        for block in blocks {
            match block {
                Block::Title1(text) => pages.paragraph(text, &styles.title1),
                Block::Title2(text) => pages.paragraph(text, &styles.title2),
                Block::Quote(text) => pages.paragraph(text, &styles.quote),
                Block::Epigraph(text) => pages.paragraph(text, &styles.epigraph),
                Block::Code(text) => pages.preformatted(text, &styles.code),
                Block::Content {
                    text,
                    indent_first_line,
                } => {
                    let style = if *indent_first_line {
                        &styles.introduction
                    } else {
                        &styles.normal
                    };
                    pages.paragraph(text, style);
                }
                Block::Image(metadata) => {
                    place_image(&mut pages, &mut assets, metadata, fmt, &styles, options)
                }
            }
        }

        if !footnotes.is_empty() {
            pages.paragraph(&options.footnotes_heading, &styles.title2);
            for (number, body) in footnotes.entries() {
                pages.paragraph(&format!("{}. {}", number, body), &styles.footnote);
            }
        }

        let info = DocumentInfo {
            title: inline::plain_text(&project.name),
            author: project.metadata.author.clone(),
            subject: project.metadata.subject.clone(),
            creator: options.generator.clone(),
        };
        let bytes = pages.finish(&info)?;

        Ok(RenderResult::new(bytes, Target::PaginatedLayout.mime_type())
            .with_missing_assets(assets.into_missing()))
    }
}

/// Paragraph styles derived from the document formatting.
struct Styles {
    title: ParagraphStyle,
    title1: ParagraphStyle,
    title2: ParagraphStyle,
    introduction: ParagraphStyle,
    normal: ParagraphStyle,
    quote: ParagraphStyle,
    epigraph: ParagraphStyle,
    footnote: ParagraphStyle,
    caption: ParagraphStyle,
    code: ParagraphStyle,
}

impl Styles {
    fn new(fmt: &DocumentFormatting) -> Self {
        let size = fmt.font_size as f32;
        let leading = size * fmt.line_spacing as f32;
        let normal = ParagraphStyle::new(Face::Roman, size, leading)
            .spacing(12.0, 12.0)
            .aligned(Align::Justify);

        Self {
            title: ParagraphStyle::new(Face::Bold, 18.0, 24.0)
                .spacing(0.0, 24.0)
                .aligned(Align::Center),
            title1: ParagraphStyle::new(Face::Bold, 16.0, 20.0).spacing(24.0, 12.0),
            title2: ParagraphStyle::new(Face::Bold, 14.0, 18.0).spacing(18.0, 9.0),
            introduction: normal.indented(0.0, 1.5 * PT_PER_CM),
            normal,
            quote: ParagraphStyle::new(Face::Italic, 10.0, 12.0)
                .spacing(12.0, 12.0)
                .aligned(Align::Justify)
                .indented(4.0 * PT_PER_CM, 0.0),
            epigraph: ParagraphStyle::new(Face::Italic, 12.0, 18.0)
                .spacing(12.0, 12.0)
                .aligned(Align::Right)
                .indented(7.5 * PT_PER_CM, 0.0),
            footnote: ParagraphStyle::new(Face::Roman, 9.0, 11.0).spacing(6.0, 6.0),
            caption: ParagraphStyle::new(Face::Italic, 10.0, 12.0).spacing(0.0, 12.0),
            code: ParagraphStyle::new(Face::Mono, 10.0, 12.0).spacing(12.0, 12.0),
        }
    }
}

fn place_image(
    pages: &mut PageBuilder,
    assets: &mut AssetTracker,
    metadata: &ImageMetadata,
    fmt: &DocumentFormatting,
    styles: &Styles,
    options: &RenderOptions,
) {
    let align = match metadata.alignment {
        ImageAlignment::Left => Align::Left,
        ImageAlignment::Center => Align::Center,
        ImageAlignment::Right => Align::Right,
    };
    let caption = styles.caption.aligned(align);

    let decoded = assets.load(metadata).and_then(|bytes| {
        EmbeddedImage::decode(&bytes)
            .map_err(|err| assets.record_missing(&metadata.path, &err))
            .ok()
    });

    match decoded {
        Some(image) => {
            let (width, height) = metadata.physical_size_cm(fmt.usable_width_cm());
            pages.image(
                image,
                width as f32 * PT_PER_CM,
                height as f32 * PT_PER_CM,
                align,
                FIGURE_SPACING,
            );
            if !metadata.caption.is_empty() {
                pages.paragraph(&metadata.caption, &caption);
            }
        }
        None => {
            let placeholder = metadata.placeholder(&options.image_placeholder_prefix);
            pages.paragraph(&placeholder, &caption);
        }
    }
}
