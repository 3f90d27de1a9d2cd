//! Markdown rendering.
//!
//! Markdown walks the paragraphs directly: no running-text merging, and
//! footnotes are numbered per occurrence without deduplication.

use crate::convert::Target;
use crate::error::Result;
use crate::inline::{self, TextRun};
use crate::model::{ImageMetadata, Paragraph, ParagraphKind, Project};

use super::{apply_cleanup, AssetTracker, DirectRenderer, RenderOptions, RenderResult, Segments};

/// Markdown renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl DirectRenderer for MarkdownRenderer {
    fn target(&self) -> Target {
        Target::Markdown
    }

    fn render_paragraphs(&self, project: &Project, options: &RenderOptions) -> Result<RenderResult> {
        let mut state = MarkdownState::new(options);
        let output = state.render(project);

        let output = apply_cleanup(output, options);
        Ok(RenderResult::text(output, Target::Markdown.mime_type())
            .with_footnote_count(state.notes.len())
            .with_auxiliary_files(state.linked)
            .with_missing_assets(state.assets.into_missing()))
    }
}

struct MarkdownState<'a> {
    options: &'a RenderOptions,
    notes: Vec<String>,
    linked: Vec<std::path::PathBuf>,
    assets: AssetTracker,
}

impl<'a> MarkdownState<'a> {
    fn new(options: &'a RenderOptions) -> Self {
        Self {
            options,
            notes: Vec::new(),
            linked: Vec::new(),
            assets: AssetTracker::new(),
        }
    }

    fn render(&mut self, project: &Project) -> Segments {
        let mut output = Segments::new();

        if self.options.include_frontmatter {
            output.push_str(&project.to_yaml_frontmatter());
            output.push('\n');
        }

        output.push_str("# ");
        output.push_str(&self.inline(&project.name));
        output.push_str("\n\n");

        for paragraph in &project.paragraphs {
            self.render_paragraph(&mut output, paragraph);
        }

        if !self.notes.is_empty() {
            for (i, body) in self.notes.iter().enumerate() {
                output.push_str(&format!("[^{}]: {}\n", i + 1, body));
            }
        }

        output.trim_end();
        output.push('\n');
        output
    }

    fn render_paragraph(&mut self, output: &mut Segments, para: &Paragraph) {
        match para.kind {
            ParagraphKind::Title1 => {
                output.push_str(&format!("# {}\n\n", self.styled(para)));
            }
            ParagraphKind::Title2 => {
                output.push_str(&format!("## {}\n\n", self.styled(para)));
            }
            ParagraphKind::Quote => {
                let text = self.styled(para);
                for line in text.lines() {
                    output.push_str("> ");
                    output.push_str(line);
                    output.push('\n');
                }
                output.push('\n');
            }
            ParagraphKind::Epigraph => {
                output.push_str(&format!("> *{}*\n\n", self.styled(para)));
            }
            ParagraphKind::Code => {
                let code = para.trimmed_content();
                let fence = code_fence(code);
                output.push_str(&format!("{}\n", fence));
                output.push_verbatim(code);
                output.push_str(&format!("\n{}\n\n", fence));
            }
            ParagraphKind::Equation => {
                output.push_str("$$\n");
                output.push_verbatim(para.trimmed_content());
                output.push_str("\n$$\n\n");
            }
            ParagraphKind::Image => match para.image_metadata() {
                Some(metadata) => self.render_image(output, &metadata),
                None => log::warn!(
                    "{}",
                    crate::error::Error::InvalidImageMetadata(para.id.clone())
                ),
            },
            ParagraphKind::Introduction
            | ParagraphKind::Argument
            | ParagraphKind::ArgumentResumption
            | ParagraphKind::Conclusion => {
                output.push_str(&self.styled(para));
                output.push_str("\n\n");
            }
        }
    }

    fn render_image(&mut self, output: &mut Segments, metadata: &ImageMetadata) {
        if !self.assets.check(metadata) {
            let placeholder = metadata.placeholder(&self.options.image_placeholder_prefix);
            output.push_str(&format!("*{}*\n\n", self.escape(&placeholder)));
            return;
        }

        let alt = if !metadata.alt_text.is_empty() {
            &metadata.alt_text
        } else if !metadata.caption.is_empty() {
            &metadata.caption
        } else {
            &metadata.filename
        };
        let path = metadata.path.to_string_lossy().replace(' ', "%20");
        output.push_str(&format!("![{}]({})\n", self.escape(alt), path));
        if !metadata.caption.is_empty() {
            output.push_str(&format!("*{}*\n", self.escape(&metadata.caption)));
        }
        output.push('\n');
        self.linked.push(metadata.path.clone());
    }

    /// Paragraph content with inline styles and footnote references.
    fn styled(&mut self, para: &Paragraph) -> String {
        let mut text = self.inline(para.content.trim());
        for body in &para.footnotes {
            let note = self.inline(body);
            self.notes.push(note);
            text.push_str(&format!("[^{}]", self.notes.len()));
        }
        text
    }

    fn inline(&self, content: &str) -> String {
        inline::decode(content)
            .iter()
            .map(|run| self.render_text_run(run))
            .collect()
    }

    fn render_text_run(&self, run: &TextRun) -> String {
        let text = self.escape(&run.text);
        // Emphasis markers must hug the text.
        let trimmed = text.trim();
        if trimmed.is_empty() || run.style.is_plain() {
            return text;
        }

        let mut styled = trimmed.to_string();
        if run.style.italic {
            styled = format!("*{}*", styled);
        }
        if run.style.bold {
            styled = format!("**{}**", styled);
        }
        if run.style.underline {
            styled = format!("<u>{}</u>", styled);
        }

        let leading = &text[..text.len() - text.trim_start().len()];
        let trailing = &text[text.trim_end().len()..];
        format!("{}{}{}", leading, styled, trailing)
    }

    fn escape(&self, text: &str) -> String {
        if self.options.escape_special_chars {
            escape_markdown(text)
        } else {
            text.to_string()
        }
    }
}

/// Backtick fence longer than any backtick run inside the listing.
fn code_fence(code: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in code.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

/// Escape special Markdown characters.
/// Only escape characters that could be misinterpreted as Markdown syntax.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '|' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}
