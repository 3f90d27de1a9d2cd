//! LaTeX source rendering.
//!
//! This target runs its own single-pass fold over the paragraphs: running
//! text is buffered and flushed at every atomic paragraph, and footnotes are
//! attached per paragraph as `\footnote{}` with no deduplication.

use crate::convert::Target;
use crate::error::{Error, Result};
use crate::inline::{self, TextRun};
use crate::model::{ImageAlignment, ImageMetadata, Paragraph, ParagraphKind, Project};
use std::path::PathBuf;

use super::{AssetTracker, DirectRenderer, RenderOptions, RenderResult};

/// LaTeX renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatexRenderer;

impl DirectRenderer for LatexRenderer {
    fn target(&self) -> Target {
        Target::TypesettingSource
    }

    fn render_paragraphs(&self, project: &Project, options: &RenderOptions) -> Result<RenderResult> {
        let mut writer = LatexWriter::new(options);
        writer.preamble(project);

        for paragraph in &project.paragraphs {
            writer.paragraph(paragraph);
        }
        writer.flush();
        writer.out.push_str("\\end{document}\n");

        Ok(RenderResult::text(writer.out, Target::TypesettingSource.mime_type())
            .with_footnote_count(writer.footnote_count)
            .with_auxiliary_files(writer.figures)
            .with_missing_assets(writer.assets.into_missing()))
    }
}

struct LatexWriter<'a> {
    options: &'a RenderOptions,
    out: String,
    buffer: Vec<String>,
    indent: bool,
    footnote_count: usize,
    figures: Vec<PathBuf>,
    assets: AssetTracker,
}

impl<'a> LatexWriter<'a> {
    fn new(options: &'a RenderOptions) -> Self {
        Self {
            options,
            out: String::new(),
            buffer: Vec::new(),
            indent: false,
            footnote_count: 0,
            figures: Vec::new(),
            assets: AssetTracker::new(),
        }
    }

    fn preamble(&mut self, project: &Project) {
        let fmt = &project.document_formatting;
        let font_size = match fmt.font_size.round() as i64 {
            i64::MIN..=10 => 10,
            11 => 11,
            _ => 12,
        };
        let m = &fmt.margins;

        self.out.push_str(&format!(
            "\\documentclass[{}pt,{}]{{article}}\n",
            font_size,
            fmt.page_size.paper_name()
        ));
        self.out.push_str("\\usepackage[utf8]{inputenc}\n");
        self.out.push_str("\\usepackage[T1]{fontenc}\n");
        self.out.push_str("\\usepackage{graphicx}\n");
        self.out.push_str(&format!(
            "\\usepackage[top={}cm,bottom={}cm,left={}cm,right={}cm]{{geometry}}\n",
            m.top, m.bottom, m.left, m.right
        ));
        self.out.push_str("\\usepackage{setspace}\n");
        self.out.push_str("\\usepackage[normalem]{ulem}\n");
        self.out.push_str("\\usepackage{amsmath}\n");
        self.out.push_str(&format!("\\setstretch{{{}}}\n", fmt.line_spacing));
        if !fmt.show_page_numbers {
            self.out.push_str("\\pagestyle{empty}\n");
        }
        self.out.push('\n');
        self.out
            .push_str(&format!("\\title{{{}}}\n", escape_latex(&inline::plain_text(&project.name))));
        self.out.push_str(&format!(
            "\\author{{{}}}\n",
            escape_latex(&project.metadata.author)
        ));
        self.out.push_str("\\date{}\n\n");
        self.out.push_str("\\begin{document}\n\\maketitle\n\n");
    }

    fn paragraph(&mut self, para: &Paragraph) {
        match para.kind {
            ParagraphKind::Introduction
            | ParagraphKind::Argument
            | ParagraphKind::ArgumentResumption
            | ParagraphKind::Conclusion => {
                if para.kind.opens_block() {
                    self.flush();
                    self.indent = true;
                } else if self.buffer.is_empty() {
                    self.indent = false;
                }
                let text = self.annotated(para);
                self.buffer.push(text);
            }
            ParagraphKind::Title1 => {
                self.flush();
                let text = self.annotated(para);
                self.out.push_str(&format!("\\section*{{{}}}\n\n", text));
            }
            ParagraphKind::Title2 => {
                self.flush();
                let text = self.annotated(para);
                self.out.push_str(&format!("\\subsection*{{{}}}\n\n", text));
            }
            ParagraphKind::Quote => {
                self.flush();
                let text = self.annotated(para);
                self.out.push_str(&format!(
                    "\\begin{{quote}}\n\\small\\itshape {}\n\\end{{quote}}\n\n",
                    text
                ));
            }
            ParagraphKind::Epigraph => {
                self.flush();
                let text = self.annotated(para);
                self.out.push_str(&format!(
                    "\\begin{{flushright}}\n\\itshape {}\n\\end{{flushright}}\n\n",
                    text
                ));
            }
            ParagraphKind::Code => {
                self.flush();
                self.out.push_str(&code_listing(para.trimmed_content()));
            }
            ParagraphKind::Equation => {
                self.flush();
                self.out.push_str("\\begin{equation*}\n");
                self.out.push_str(para.trimmed_content());
                self.out.push_str("\n\\end{equation*}\n\n");
            }
            ParagraphKind::Image => {
                self.flush();
                match para.image_metadata() {
                    Some(metadata) => self.figure(&metadata),
                    None => log::warn!("{}", Error::InvalidImageMetadata(para.id.clone())),
                }
            }
        }
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        if !self.indent {
            self.out.push_str("\\noindent ");
        }
        self.out.push_str(&self.buffer.join(" "));
        self.out.push_str("\n\n");
        self.buffer.clear();
        self.indent = false;
    }

    fn figure(&mut self, metadata: &ImageMetadata) {
        let align = match metadata.alignment {
            ImageAlignment::Left => "\\raggedright",
            ImageAlignment::Center => "\\centering",
            ImageAlignment::Right => "\\raggedleft",
        };
        let width = (metadata.width_percent / 100.0).clamp(0.0, 1.0);

        self.out.push_str("\\begin{figure}[htbp]\n");
        self.out.push_str(align);
        self.out.push('\n');
        if self.assets.check(metadata) {
            let path = metadata.path.to_string_lossy().replace('\\', "/");
            self.out.push_str(&format!(
                "\\includegraphics[width={:.2}\\linewidth]{{{}}}\n",
                width, path
            ));
            self.figures.push(metadata.path.clone());
        } else {
            let placeholder = metadata.placeholder(&self.options.image_placeholder_prefix);
            self.out.push_str(&format!(
                "\\fbox{{\\parbox{{{:.2}\\linewidth}}{{\\centering {}}}}}\n",
                width,
                escape_latex(&placeholder)
            ));
        }
        if !metadata.caption.is_empty() {
            self.out
                .push_str(&format!("\\caption{{{}}}\n", styled(&metadata.caption)));
        }
        self.out.push_str("\\end{figure}\n\n");
    }

    /// Styled paragraph text followed by its footnotes.
    fn annotated(&mut self, para: &Paragraph) -> String {
        let mut text = styled(para.content.trim());
        for body in &para.footnotes {
            text.push_str(&format!("\\footnote{{{}}}", styled(body)));
            self.footnote_count += 1;
        }
        text
    }
}

/// Escape LaTeX special characters, then wrap styled runs in commands.
fn styled(content: &str) -> String {
    inline::decode(content).iter().map(render_run).collect()
}

fn render_run(run: &TextRun) -> String {
    let mut text = escape_latex(&run.text);
    if run.style.underline {
        text = format!("\\uline{{{}}}", text);
    }
    if run.style.italic {
        text = format!("\\textit{{{}}}", text);
    }
    if run.style.bold {
        text = format!("\\textbf{{{}}}", text);
    }
    text
}

/// Code listing as a `verbatim` environment.
///
/// A listing that contains the environment's own terminator cannot be set
/// verbatim; it falls back to escaped typewriter lines with hard spaces.
fn code_listing(code: &str) -> String {
    if !code.contains("\\end{verbatim}") {
        return format!("\\begin{{verbatim}}\n{}\n\\end{{verbatim}}\n\n", code);
    }

    let lines: Vec<String> = code
        .lines()
        .map(|line| {
            if line.is_empty() {
                "\\mbox{}".to_string()
            } else {
                escape_latex(line).replace(' ', "~")
            }
        })
        .collect();
    format!(
        "\\begin{{flushleft}}\\ttfamily\n{}\n\\end{{flushleft}}\n\n",
        lines.join("\\\\\n")
    )
}

fn escape_latex(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => result.push_str("\\textbackslash{}"),
            '~' => result.push_str("\\textasciitilde{}"),
            '^' => result.push_str("\\textasciicircum{}"),
            '{' | '}' | '$' | '&' | '%' | '#' | '_' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Direct, Renderer};

    fn render(project: &Project) -> RenderResult {
        Direct(LatexRenderer)
            .render(project, &RenderOptions::default())
            .unwrap()
    }

    #[test]
    fn test_escape_latex() {
        assert_eq!(escape_latex("50% & $5"), "50\\% \\& \\$5");
        assert_eq!(escape_latex("a_b^c"), "a\\_b\\textasciicircum{}c");
        assert_eq!(escape_latex("\\x{}"), "\\textbackslash{}x\\{\\}");
    }

    #[test]
    fn test_styled_runs() {
        assert_eq!(styled("<b>a&b</b> c"), "\\textbf{a\\&b} c");
        assert_eq!(
            styled("<b><i>x</i></b>"),
            "\\textbf{\\textit{x}}"
        );
        assert_eq!(styled("<u>u</u>"), "\\uline{u}");
        // unmatched markers stay literal and harmless
        assert_eq!(styled("<b>x"), "<b>x");
    }

    #[test]
    fn test_preamble_and_document() {
        let mut project = Project::new("Essay");
        project.metadata.author = "Ana".into();
        project.add_paragraph(ParagraphKind::Title1, "Part");

        let tex = String::from_utf8(render(&project).content).unwrap();
        assert!(tex.starts_with("\\documentclass[12pt,a4paper]{article}\n"));
        assert!(tex.contains("\\usepackage[top=2.5cm,bottom=2.5cm,left=3cm,right=3cm]{geometry}"));
        assert!(tex.contains("\\title{Essay}\n\\author{Ana}"));
        assert!(tex.contains("\\section*{Part}"));
        assert!(tex.trim_end().ends_with("\\end{document}"));
    }

    #[test]
    fn test_own_fold() {
        let mut project = Project::new("E");
        project.add_paragraph(ParagraphKind::Introduction, "A");
        project.add_paragraph(ParagraphKind::Argument, "B");
        project.add_paragraph(ParagraphKind::Quote, "Q");
        project.add_paragraph(ParagraphKind::Argument, "C");
        project.add_paragraph(ParagraphKind::ArgumentResumption, "D");

        let tex = String::from_utf8(render(&project).content).unwrap();
        assert!(tex.contains("\\maketitle\n\nA B\n\n\\begin{quote}"));
        assert!(tex.contains("\\end{quote}\n\n\\noindent C\n\nD\n\n\\end{document}"));
    }

    #[test]
    fn test_footnotes_inline_without_dedup() {
        let mut project = Project::new("E");
        project
            .add_paragraph(ParagraphKind::Introduction, "A")
            .footnotes
            .push("Same".into());
        project
            .add_paragraph(ParagraphKind::Argument, "B")
            .footnotes
            .push("Same".into());

        let result = render(&project);
        let tex = result.as_text().unwrap();
        assert!(tex.contains("A\\footnote{Same} B\\footnote{Same}"));
        assert_eq!(result.footnote_count, 2);
    }

    #[test]
    fn test_figure_paths_passed_through() {
        let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        let mut project = Project::new("E");
        let present = ImageMetadata::new(file.path(), (4, 3)).with_caption("Fig");
        let absent = ImageMetadata::new("/nowhere/missing.png", (4, 3));
        project.push(Paragraph::image("a", &present));
        project.push(Paragraph::image("b", &absent));

        let result = render(&project);
        let tex = result.as_text().unwrap();
        assert!(tex.contains("\\includegraphics[width=0.80\\linewidth]"));
        assert!(tex.contains("\\caption{Fig}"));
        assert!(tex.contains("\\fbox{"));
        assert_eq!(result.auxiliary_files, vec![file.path().to_path_buf()]);
        assert_eq!(result.missing_assets, vec![PathBuf::from("/nowhere/missing.png")]);
    }

    #[test]
    fn test_code_listing_environments() {
        assert_eq!(
            code_listing("x  = <b>1</b>"),
            "\\begin{verbatim}\nx  = <b>1</b>\n\\end{verbatim}\n\n"
        );

        let listing = code_listing("\\end{verbatim}\n\n  done");
        assert!(!listing.contains("\\begin{verbatim}"));
        assert_eq!(
            listing,
            "\\begin{flushleft}\\ttfamily\n\
             \\textbackslash{}end\\{verbatim\\}\\\\\n\
             \\mbox{}\\\\\n\
             ~~done\n\
             \\end{flushleft}\n\n"
        );
    }
}
