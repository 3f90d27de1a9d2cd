//! # tacexport
//!
//! Document compilation engine for structured academic writing.
//!
//! A [`Project`] is an ordered list of typed paragraphs (introduction,
//! argument, quote, image, ...). This library compiles it into one of five
//! export targets: plain text, Markdown, an OpenDocument text package, a PDF
//! page description, or LaTeX source.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tacexport::{compile, ParagraphKind, Project, RenderOptions, Target};
//!
//! fn main() -> tacexport::Result<()> {
//!     let mut project = Project::new("On Method");
//!     project.add_paragraph(ParagraphKind::Title1, "Introduction");
//!     project.add_paragraph(ParagraphKind::Introduction, "A <i>first</i> claim.")
//!         .footnotes
//!         .push("Source, p. 3.".into());
//!
//!     let artifact = compile(&project, Target::XmlPackage, "method.odt", &RenderOptions::default())?;
//!     println!("{} footnotes", artifact.footnote_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Five targets**: plain text, Markdown, ODT, PDF, LaTeX
//! - **Shared structure**: running text is merged into logical paragraphs,
//!   footnotes are deduplicated into a bibliography
//! - **Non-fatal assets**: missing images become placeholders
//! - **Atomic writes**: artifacts are persisted from a temporary file
//! - **Parallel compiles**: several targets at once with Rayon
//! - **Cleanup pipeline**: Unicode and whitespace normalization for text output

pub mod convert;
pub mod error;
pub mod inline;
pub mod model;
pub mod render;
pub mod structure;

// Re-export commonly used types
pub use convert::{Artifact, RendererRegistry, Target};
pub use error::{Error, Result};
pub use inline::{TextRun, TextStyle};
pub use model::{
    DocumentFormatting, ImageAlignment, ImageMetadata, Margins, PageSize, Paragraph,
    ParagraphKind, Project, ProjectMetadata,
};
pub use render::{
    CleanupOptions, CleanupPreset, RenderOptions, RenderResult, RenderStats, Renderer,
};
pub use structure::{Block, FootnoteTable};

use std::path::{Path, PathBuf};

/// Render a project into memory with the built-in renderers.
///
/// # Example
///
/// ```
/// use tacexport::{render, ParagraphKind, Project, RenderOptions, Target};
///
/// let mut project = Project::new("Notes");
/// project.add_paragraph(ParagraphKind::Argument, "Plain words.");
///
/// let result = render(&project, Target::PlainText, &RenderOptions::default()).unwrap();
/// assert!(result.as_text().unwrap().contains("Plain words."));
/// ```
pub fn render(project: &Project, target: Target, options: &RenderOptions) -> Result<RenderResult> {
    RendererRegistry::with_defaults().render(project, target, options)
}

/// Compile a project to a file with the built-in renderers.
pub fn compile<P: AsRef<Path>>(
    project: &Project,
    target: Target,
    path: P,
    options: &RenderOptions,
) -> Result<Artifact> {
    RendererRegistry::with_defaults().compile(project, target, path, options)
}

/// Compile a project for a selector string such as `"pdf"` or `"markdown"`.
///
/// Unknown selectors fail with [`Error::UnsupportedTarget`].
pub fn compile_selector<P: AsRef<Path>>(
    project: &Project,
    selector: &str,
    path: P,
    options: &RenderOptions,
) -> Result<Artifact> {
    let target: Target = selector.parse()?;
    compile(project, target, path, options)
}

/// Compile several targets in parallel with the built-in renderers.
pub fn compile_many(
    project: &Project,
    jobs: &[(Target, PathBuf)],
    options: &RenderOptions,
) -> Vec<Result<Artifact>> {
    RendererRegistry::with_defaults().compile_many(project, jobs, options)
}

/// Builder bundling a renderer registry with render options.
///
/// # Example
///
/// ```no_run
/// use tacexport::{CleanupPreset, Compiler, Project, Target};
///
/// let project = Project::new("Essay");
/// let artifacts = Compiler::new()
///     .with_frontmatter()
///     .with_cleanup(CleanupPreset::Standard)
///     .compile_all(&project, "out", "essay");
/// assert_eq!(artifacts.len(), 5);
/// ```
pub struct Compiler {
    registry: RendererRegistry,
    options: RenderOptions,
}

impl Compiler {
    /// Create a compiler with the built-in renderers and default options.
    pub fn new() -> Self {
        Self {
            registry: RendererRegistry::with_defaults(),
            options: RenderOptions::default(),
        }
    }

    /// Replace the renderer for one target.
    pub fn with_renderer(mut self, renderer: std::sync::Arc<dyn Renderer>) -> Self {
        self.registry.register(renderer);
        self
    }

    /// Replace the render options.
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Include YAML frontmatter in Markdown output.
    pub fn with_frontmatter(mut self) -> Self {
        self.options = self.options.with_frontmatter(true);
        self
    }

    /// Set cleanup preset for text targets.
    pub fn with_cleanup(mut self, preset: CleanupPreset) -> Self {
        self.options = self.options.with_cleanup_preset(preset);
        self
    }

    /// Set the footnote section heading.
    pub fn with_footnotes_heading(mut self, heading: impl Into<String>) -> Self {
        self.options = self.options.with_footnotes_heading(heading);
        self
    }

    /// Set the image placeholder label.
    pub fn with_image_placeholder(mut self, prefix: impl Into<String>) -> Self {
        self.options = self.options.with_image_placeholder(prefix);
        self
    }

    /// Get the render options.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render one target into memory.
    pub fn render(&self, project: &Project, target: Target) -> Result<RenderResult> {
        self.registry.render(project, target, &self.options)
    }

    /// Compile one target to a file.
    pub fn compile<P: AsRef<Path>>(
        &self,
        project: &Project,
        target: Target,
        path: P,
    ) -> Result<Artifact> {
        self.registry.compile(project, target, path, &self.options)
    }

    /// Compile every registered target into `dir`, naming each file
    /// `{stem}.{extension}`.
    pub fn compile_all<P: AsRef<Path>>(
        &self,
        project: &Project,
        dir: P,
        stem: &str,
    ) -> Vec<Result<Artifact>> {
        let dir = dir.as_ref();
        let jobs: Vec<(Target, PathBuf)> = self
            .registry
            .targets()
            .into_iter()
            .map(|t| (t, dir.join(format!("{}.{}", stem, t.extension()))))
            .collect();
        self.registry.compile_many(project, &jobs, &self.options)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiler_builder() {
        let compiler = Compiler::new()
            .with_frontmatter()
            .with_cleanup(CleanupPreset::Standard)
            .with_footnotes_heading("Notes");

        assert!(compiler.options().include_frontmatter);
        assert!(compiler.options().cleanup.is_some());
        assert_eq!(compiler.options().footnotes_heading, "Notes");
    }

    #[test]
    fn test_compiler_default() {
        let compiler = Compiler::default();
        assert!(!compiler.options().include_frontmatter);
        assert_eq!(compiler.registry.targets().len(), 5);
    }

    #[test]
    fn test_compile_selector_rejects_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let result = compile_selector(
            &Project::new("E"),
            "rtf",
            dir.path().join("out.rtf"),
            &RenderOptions::default(),
        );
        assert!(matches!(result, Err(Error::UnsupportedTarget(_))));
        assert!(!dir.path().join("out.rtf").exists());
    }

    #[test]
    fn test_compile_all_writes_every_target() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = Project::new("All");
        project.add_paragraph(ParagraphKind::Introduction, "Body");

        let artifacts = Compiler::new().compile_all(&project, dir.path(), "all");
        assert_eq!(artifacts.len(), 5);
        for artifact in artifacts {
            let artifact = artifact.unwrap();
            assert!(artifact.path.exists());
            assert_eq!(
                artifact.path.extension().unwrap(),
                artifact.target.extension()
            );
        }
    }

    #[test]
    fn test_render_empty_project() {
        let project = Project::new("Empty");
        for target in Target::ALL {
            let result = render(&project, target, &RenderOptions::default()).unwrap();
            assert!(!result.content.is_empty());
            assert_eq!(result.footnote_count, 0);
        }
    }
}
