//! Rendering options and configuration.

use super::{CleanupOptions, CleanupPreset};

/// Options for rendering a project.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Heading of the trailing footnote section (plain text, PDF)
    pub footnotes_heading: String,

    /// Label used in image placeholders, e.g. `[Image: fig.png]`
    pub image_placeholder_prefix: String,

    /// Include YAML frontmatter with metadata (markdown)
    pub include_frontmatter: bool,

    /// Escape special Markdown characters
    pub escape_special_chars: bool,

    /// Text cleanup options (plain text and markdown only)
    pub cleanup: Option<CleanupOptions>,

    /// Collect statistics during rendering
    pub collect_stats: bool,

    /// Generator name written into package and PDF metadata
    pub generator: String,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the footnote section heading.
    pub fn with_footnotes_heading(mut self, heading: impl Into<String>) -> Self {
        self.footnotes_heading = heading.into();
        self
    }

    /// Set the image placeholder label.
    pub fn with_image_placeholder(mut self, prefix: impl Into<String>) -> Self {
        self.image_placeholder_prefix = prefix.into();
        self
    }

    /// Enable or disable frontmatter.
    pub fn with_frontmatter(mut self, include: bool) -> Self {
        self.include_frontmatter = include;
        self
    }

    /// Enable or disable markdown escaping.
    pub fn with_escaping(mut self, escape: bool) -> Self {
        self.escape_special_chars = escape;
        self
    }

    /// Set cleanup options.
    pub fn with_cleanup(mut self, cleanup: CleanupOptions) -> Self {
        self.cleanup = Some(cleanup);
        self
    }

    /// Set cleanup preset.
    pub fn with_cleanup_preset(mut self, preset: CleanupPreset) -> Self {
        self.cleanup = Some(CleanupOptions::from_preset(preset));
        self
    }

    /// Enable statistics collection during rendering.
    pub fn with_stats(mut self, collect: bool) -> Self {
        self.collect_stats = collect;
        self
    }

    /// Set the generator name.
    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = generator.into();
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            footnotes_heading: "Footnotes:".to_string(),
            image_placeholder_prefix: "Image".to_string(),
            include_frontmatter: false,
            escape_special_chars: true,
            cleanup: None,
            collect_stats: true,
            generator: concat!("tacexport/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_builder() {
        let options = RenderOptions::new()
            .with_frontmatter(true)
            .with_footnotes_heading("Notes")
            .with_cleanup_preset(CleanupPreset::Minimal)
            .with_stats(false);

        assert!(options.include_frontmatter);
        assert_eq!(options.footnotes_heading, "Notes");
        assert_eq!(options.cleanup, Some(CleanupOptions::minimal()));
        assert!(!options.collect_stats);
    }

    #[test]
    fn test_defaults() {
        let options = RenderOptions::default();
        assert_eq!(options.footnotes_heading, "Footnotes:");
        assert_eq!(options.image_placeholder_prefix, "Image");
        assert!(options.escape_special_chars);
        assert!(options.cleanup.is_none());
        assert!(options.generator.starts_with("tacexport/"));
    }
}
