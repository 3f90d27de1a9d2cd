//! Integration tests for the renderer registry.

use std::sync::Arc;
use tacexport::convert::{RendererRegistry, Target};
use tacexport::error::Result;
use tacexport::render::{Grouped, PlainTextRenderer, RenderOptions, RenderResult, Renderer};
use tacexport::{Error, Project};

/// Mock renderer for testing.
struct MockRenderer {
    target: Target,
    name: &'static str,
}

impl MockRenderer {
    fn new(target: Target, name: &'static str) -> Self {
        Self { target, name }
    }
}

impl Renderer for MockRenderer {
    fn target(&self) -> Target {
        self.target
    }

    fn name(&self) -> &str {
        self.name
    }

    fn render(&self, project: &Project, _options: &RenderOptions) -> Result<RenderResult> {
        Ok(RenderResult::text(
            format!("Rendered {} by {}", project.name, self.name),
            self.target.mime_type(),
        ))
    }
}

/// Renderer that always fails.
struct FailingRenderer;

impl Renderer for FailingRenderer {
    fn target(&self) -> Target {
        Target::PaginatedLayout
    }

    fn render(&self, _project: &Project, _options: &RenderOptions) -> Result<RenderResult> {
        Err(Error::Layout("page tree exploded".into()))
    }
}

#[test]
fn test_registry_new() {
    let registry = RendererRegistry::new();

    // Empty registry should support nothing
    assert!(!registry.supports(Target::PlainText));
    assert!(registry.targets().is_empty());
}

#[test]
fn test_registry_with_defaults() {
    let registry = RendererRegistry::with_defaults();
    for target in Target::ALL {
        assert!(registry.supports(target));
    }
}

#[test]
fn test_registry_get_by_name() {
    let registry = RendererRegistry::with_defaults();

    assert!(registry.get_by_name("markdown").is_some());
    assert!(registry.get_by_name("MD").is_some()); // Case insensitive
    assert!(registry.get_by_name("unknown").is_none());
}

#[test]
fn test_register_replaces_target() {
    let mut registry = RendererRegistry::with_defaults();
    registry.register(Arc::new(MockRenderer::new(Target::Markdown, "mock-md")));

    let renderer = registry.get(Target::Markdown).unwrap();
    assert_eq!(renderer.name(), "mock-md");

    let result = registry
        .render(&Project::new("Doc"), Target::Markdown, &RenderOptions::default())
        .unwrap();
    assert_eq!(result.as_text(), Some("Rendered Doc by mock-md"));
}

#[test]
fn test_default_renderer_names_are_selectors() {
    let renderer = Grouped(PlainTextRenderer);
    assert_eq!(renderer.name(), "plain_text");
    assert_eq!(renderer.target(), Target::PlainText);
}

#[test]
fn test_render_missing_target() {
    let mut registry = RendererRegistry::new();
    registry.register(Arc::new(MockRenderer::new(Target::PlainText, "text")));

    let result = registry.render(&Project::new("Doc"), Target::XmlPackage, &RenderOptions::default());
    assert!(matches!(result, Err(Error::UnsupportedTarget(ref t)) if t == "xml_package"));
}

#[test]
fn test_render_error_wrapped_at_compile() {
    let mut registry = RendererRegistry::new();
    registry.register(Arc::new(FailingRenderer));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pdf");
    let err = registry
        .compile(
            &Project::new("Broken"),
            Target::PaginatedLayout,
            &path,
            &RenderOptions::default(),
        )
        .unwrap_err();

    match err {
        Error::ArtifactWriteFailed { source, .. } => {
            assert!(matches!(*source, Error::Layout(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    // nothing written at the destination
    assert!(!path.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
