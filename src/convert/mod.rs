//! Target registry and the compile entry points.
//!
//! A [`RendererRegistry`] maps each [`Target`] to a renderer. Rendering
//! happens in memory; compiling additionally writes the artifact through a
//! temporary file in the destination directory, so a failed compile never
//! leaves a partial file at the destination path.
//!
//! # Example
//!
//! ```no_run
//! use tacexport::convert::{RendererRegistry, Target};
//! use tacexport::{Project, RenderOptions};
//!
//! fn main() -> tacexport::Result<()> {
//!     let project = Project::from_json(&std::fs::read_to_string("essay.json")?)?;
//!     let registry = RendererRegistry::with_defaults();
//!
//!     let artifact = registry.compile(
//!         &project,
//!         Target::PaginatedLayout,
//!         "essay.pdf",
//!         &RenderOptions::default(),
//!     )?;
//!     println!("{} bytes", artifact.size);
//!     Ok(())
//! }
//! ```

mod target;

pub use target::Target;

use crate::error::{Error, Result};
use crate::model::Project;
use crate::render::{
    Direct, Grouped, LatexRenderer, MarkdownRenderer, OdtRenderer, PdfRenderer,
    PlainTextRenderer, RenderOptions, RenderResult, RenderStats, Renderer,
};
use rayon::prelude::*;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// An artifact written to disk.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Target the artifact was compiled for
    pub target: Target,

    /// Destination path
    pub path: PathBuf,

    /// Size of the written file in bytes
    pub size: usize,

    /// MIME type of the artifact
    pub mime_type: &'static str,

    /// Number of footnotes the artifact carries
    pub footnote_count: usize,

    /// Files the artifact references but does not embed
    pub auxiliary_files: Vec<PathBuf>,

    /// Images that were replaced by placeholders
    pub missing_assets: Vec<PathBuf>,

    /// Rendering statistics
    pub stats: RenderStats,
}

impl Artifact {
    fn new(target: Target, path: PathBuf, result: RenderResult) -> Self {
        Self {
            target,
            path,
            size: result.content.len(),
            mime_type: result.mime_type,
            footnote_count: result.footnote_count,
            auxiliary_files: result.auxiliary_files,
            missing_assets: result.missing_assets,
            stats: result.stats,
        }
    }

    /// Whether every referenced image made it into the artifact.
    pub fn is_complete(&self) -> bool {
        self.missing_assets.is_empty()
    }
}

/// Registry of renderers, one per target.
pub struct RendererRegistry {
    renderers: HashMap<Target, Arc<dyn Renderer>>,
}

impl RendererRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /// Create a registry with the five built-in renderers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(Grouped(PlainTextRenderer)));
        registry.register(Arc::new(Direct(MarkdownRenderer)));
        registry.register(Arc::new(Grouped(OdtRenderer)));
        registry.register(Arc::new(Grouped(PdfRenderer)));
        registry.register(Arc::new(Direct(LatexRenderer)));
        registry
    }

    /// Register a renderer, replacing any renderer for the same target.
    pub fn register(&mut self, renderer: Arc<dyn Renderer>) {
        self.renderers.insert(renderer.target(), renderer);
    }

    /// Get the renderer for a target.
    pub fn get(&self, target: Target) -> Option<Arc<dyn Renderer>> {
        self.renderers.get(&target).cloned()
    }

    /// Get a renderer by selector name or extension alias.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn Renderer>> {
        name.parse().ok().and_then(|target| self.get(target))
    }

    /// Check if a target has a renderer.
    pub fn supports(&self, target: Target) -> bool {
        self.renderers.contains_key(&target)
    }

    /// Registered targets, in selector order.
    pub fn targets(&self) -> Vec<Target> {
        Target::ALL
            .into_iter()
            .filter(|t| self.supports(*t))
            .collect()
    }

    /// Render a project into memory.
    pub fn render(
        &self,
        project: &Project,
        target: Target,
        options: &RenderOptions,
    ) -> Result<RenderResult> {
        let renderer = self
            .get(target)
            .ok_or_else(|| Error::UnsupportedTarget(target.to_string()))?;

        log::debug!(
            "rendering \"{}\" ({} paragraphs) with {}",
            project.name,
            project.paragraphs.len(),
            renderer.name()
        );
        renderer.render(project, options)
    }

    /// Render a project and write the artifact to `path`.
    ///
    /// The destination directory must exist. Any failure other than an
    /// unsupported target is reported as [`Error::ArtifactWriteFailed`].
    pub fn compile(
        &self,
        project: &Project,
        target: Target,
        path: impl AsRef<Path>,
        options: &RenderOptions,
    ) -> Result<Artifact> {
        let path = path.as_ref();
        let result = self
            .render(project, target, options)
            .and_then(|result| write_atomically(path, &result.content).map(|()| result))
            .map_err(|err| artifact_error(err, target, project))?;

        if !result.missing_assets.is_empty() {
            log::warn!(
                "{} for \"{}\" written with {} missing image(s)",
                target,
                project.name,
                result.missing_assets.len()
            );
        }
        log::debug!(
            "wrote {} ({} bytes, {} footnotes)",
            path.display(),
            result.content.len(),
            result.footnote_count
        );

        Ok(Artifact::new(target, path.to_path_buf(), result))
    }

    /// Compile several targets in parallel.
    ///
    /// Each job gets its own result; one failing job does not affect the
    /// others. Destination paths must be distinct.
    pub fn compile_many(
        &self,
        project: &Project,
        jobs: &[(Target, PathBuf)],
        options: &RenderOptions,
    ) -> Vec<Result<Artifact>> {
        jobs.par_iter()
            .map(|(target, path)| self.compile(project, *target, path, options))
            .collect()
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn artifact_error(err: Error, target: Target, project: &Project) -> Error {
    match err {
        Error::UnsupportedTarget(_) => err,
        err => {
            log::error!(
                "compiling \"{}\" to {} failed: {}",
                project.name,
                target,
                err
            );
            Error::ArtifactWriteFailed {
                target,
                document: project.name.clone(),
                source: Box::new(err),
            }
        }
    }
}

/// Write through a temporary file next to `path`, then rename it into place.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
