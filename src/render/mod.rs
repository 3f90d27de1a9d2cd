//! Rendering module for compiling projects to the supported targets.
//!
//! Every target implements [`Renderer`]. Two strategies sit behind it:
//!
//! - [`GroupedRenderer`] (plain text, XML package, paginated layout) consumes
//!   the shared block list and the deduplicated footnote table.
//! - [`DirectRenderer`] (markdown, typesetting source) walks the paragraph
//!   sequence itself and numbers footnotes per occurrence.
//!
//! The two strategies do not produce the same footnote numbering.

mod assets;
mod cleanup;
mod latex;
mod markdown;
mod odt;
mod options;
mod pdf;
mod result;
mod text;

pub use assets::AssetTracker;
pub use cleanup::{CleanupOptions, CleanupPipeline, CleanupPreset, Segments};
pub use latex::LatexRenderer;
pub use markdown::MarkdownRenderer;
pub use odt::OdtRenderer;
pub use options::RenderOptions;
pub use pdf::PdfRenderer;
pub use result::{RenderResult, RenderStats};
pub use text::PlainTextRenderer;

use crate::convert::Target;
use crate::error::{Error, Result};
use crate::inline;
use crate::model::{ParagraphKind, Project};
use crate::structure::{group, Block, FootnoteTable, FragmentEncoder};

/// A renderer for one export target.
pub trait Renderer: Send + Sync {
    /// Target this renderer produces.
    fn target(&self) -> Target;

    /// Name of this renderer.
    fn name(&self) -> &str {
        self.target().as_str()
    }

    /// Render the project into an in-memory artifact.
    fn render(&self, project: &Project, options: &RenderOptions) -> Result<RenderResult>;
}

/// Renderer built on the shared grouping and footnote policies.
pub trait GroupedRenderer: Send + Sync {
    /// Encoder used to prepare paragraph text before grouping.
    type Encoder: FragmentEncoder;

    /// Target this renderer produces.
    fn target(&self) -> Target;

    /// Create a fresh encoder for one render call.
    fn encoder(&self, project: &Project, options: &RenderOptions) -> Self::Encoder;

    /// Render grouped blocks into an artifact.
    fn render_blocks(
        &self,
        project: &Project,
        blocks: &[Block],
        footnotes: &FootnoteTable,
        options: &RenderOptions,
    ) -> Result<RenderResult>;
}

/// Renderer that traverses the paragraph sequence itself.
pub trait DirectRenderer: Send + Sync {
    /// Target this renderer produces.
    fn target(&self) -> Target;

    /// Render the paragraphs into an artifact.
    fn render_paragraphs(&self, project: &Project, options: &RenderOptions)
        -> Result<RenderResult>;
}

/// Adapter exposing a [`GroupedRenderer`] as a [`Renderer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Grouped<R>(pub R);

/// Adapter exposing a [`DirectRenderer`] as a [`Renderer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Direct<R>(pub R);

impl<R: GroupedRenderer> Renderer for Grouped<R> {
    fn target(&self) -> Target {
        self.0.target()
    }

    fn render(&self, project: &Project, options: &RenderOptions) -> Result<RenderResult> {
        report_malformed_markup(project);

        let footnotes = FootnoteTable::resolve(&project.paragraphs);
        let mut encoder = self.0.encoder(project, options);
        let blocks = group(&project.paragraphs, &footnotes, &mut encoder);
        log::debug!(
            "{}: {} paragraphs grouped into {} blocks, {} footnotes",
            self.target(),
            project.paragraphs.len(),
            blocks.len(),
            footnotes.len()
        );

        let mut result = self
            .0
            .render_blocks(project, &blocks, &footnotes, options)?
            .with_footnote_count(footnotes.len());

        if options.collect_stats {
            let mut stats = RenderStats::new();
            stats.count_blocks(&blocks);
            finish_stats(&mut stats, project, &result);
            result = result.with_stats(stats);
        }

        Ok(result)
    }
}

impl<R: DirectRenderer> Renderer for Direct<R> {
    fn target(&self) -> Target {
        self.0.target()
    }

    fn render(&self, project: &Project, options: &RenderOptions) -> Result<RenderResult> {
        report_malformed_markup(project);

        let mut result = self.0.render_paragraphs(project, options)?;

        if options.collect_stats {
            let mut stats = RenderStats::new();
            stats.image_count = project
                .paragraphs
                .iter()
                .filter(|p| p.kind == ParagraphKind::Image)
                .count() as u32;
            finish_stats(&mut stats, project, &result);
            result = result.with_stats(stats);
        }

        Ok(result)
    }
}

fn finish_stats(stats: &mut RenderStats, project: &Project, result: &RenderResult) {
    stats.paragraph_count = project.paragraphs.len() as u32;
    match result.as_text() {
        Some(text) if result.mime_type.starts_with("text/") => stats.count_text(text),
        _ => {
            for paragraph in &project.paragraphs {
                if paragraph.kind != ParagraphKind::Image {
                    stats.count_text(&inline::plain_text(&paragraph.content));
                }
            }
        }
    }
}

/// Log every paragraph whose inline markers do not pair up.
///
/// Rendering continues; the offending markers come out as literal text.
fn report_malformed_markup(project: &Project) {
    for paragraph in &project.paragraphs {
        if paragraph.kind != ParagraphKind::Image && !inline::is_well_formed(&paragraph.content) {
            log::warn!("{}", Error::MalformedInlineMarkup(paragraph.id.clone()));
        }
    }
}

/// Apply the configured cleanup pipeline, if any.
pub(crate) fn apply_cleanup(output: Segments, options: &RenderOptions) -> String {
    match options.cleanup {
        Some(ref cleanup_options) => {
            CleanupPipeline::new(cleanup_options.clone()).process_segments(output)
        }
        None => output.into_string(),
    }
}
