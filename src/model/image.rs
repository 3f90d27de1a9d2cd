//! Image metadata records stored in image paragraphs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Horizontal placement of a figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageAlignment {
    /// Flush left
    Left,
    /// Centered
    #[default]
    Center,
    /// Flush right
    Right,
}

/// Metadata describing an embedded image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// File name used inside packages
    #[serde(default = "default_filename")]
    pub filename: String,

    /// Location of the source image on disk
    #[serde(default)]
    pub path: PathBuf,

    /// Pixel dimensions of the source image (width, height)
    #[serde(default = "default_original_size")]
    pub original_size: (u32, u32),

    /// Pixel dimensions used by the editor preview
    #[serde(default)]
    pub display_size: Option<(u32, u32)>,

    /// Horizontal placement
    #[serde(default)]
    pub alignment: ImageAlignment,

    /// Caption shown below the figure
    #[serde(default)]
    pub caption: String,

    /// Alternative text
    #[serde(default)]
    pub alt_text: String,

    /// Display width as a percentage of the usable page width
    #[serde(default = "default_width_percent")]
    pub width_percent: f64,
}

fn default_filename() -> String {
    "image".to_string()
}

fn default_original_size() -> (u32, u32) {
    (800, 600)
}

fn default_width_percent() -> f64 {
    80.0
}

impl ImageMetadata {
    /// Create metadata for an image file.
    ///
    /// The package file name defaults to the last path component.
    pub fn new(path: impl Into<PathBuf>, original_size: (u32, u32)) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(default_filename);
        Self {
            filename,
            path,
            original_size,
            display_size: None,
            alignment: ImageAlignment::default(),
            caption: String::new(),
            alt_text: String::new(),
            width_percent: default_width_percent(),
        }
    }

    /// Set the caption.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    /// Set the alternative text.
    pub fn with_alt_text(mut self, alt: impl Into<String>) -> Self {
        self.alt_text = alt.into();
        self
    }

    /// Set the alignment.
    pub fn with_alignment(mut self, alignment: ImageAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Set the display width percentage.
    pub fn with_width_percent(mut self, percent: f64) -> Self {
        self.width_percent = percent;
        self
    }

    /// Parse a metadata record.
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Serialize the record as stored in paragraph content.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Height divided by width of the source image.
    pub fn aspect_ratio(&self) -> f64 {
        let (width, height) = self.original_size;
        if width == 0 {
            return 0.75;
        }
        f64::from(height) / f64::from(width)
    }

    /// Physical size in centimeters for a given usable page width.
    pub fn physical_size_cm(&self, usable_width_cm: f64) -> (f64, f64) {
        let width = usable_width_cm * (self.width_percent / 100.0);
        (width, width * self.aspect_ratio())
    }

    /// Whether the source image file exists.
    pub fn source_exists(&self) -> bool {
        self.path.is_file()
    }

    /// MIME type derived from the file extension.
    pub fn mime_type(&self) -> &'static str {
        mime_for_extension(Path::new(&self.filename))
    }

    /// Text for placeholders when the image cannot be embedded.
    pub fn placeholder(&self, prefix: &str) -> String {
        if self.caption.is_empty() {
            format!("[{}: {}]", prefix, self.filename)
        } else {
            format!("[{}: {} - {}]", prefix, self.filename, self.caption)
        }
    }
}

/// MIME type for an image path, defaulting to PNG.
pub fn mime_for_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_sparse_record() {
        let meta = ImageMetadata::from_json(r#"{"filename": "fig.png", "path": "/x/fig.png"}"#)
            .unwrap();
        assert_eq!(meta.original_size, (800, 600));
        assert_eq!(meta.width_percent, 80.0);
        assert_eq!(meta.alignment, ImageAlignment::Center);
        assert!(meta.caption.is_empty());
    }

    #[test]
    fn test_physical_size() {
        let meta = ImageMetadata::new("/x/fig.png", (1000, 500)).with_width_percent(50.0);
        let (w, h) = meta.physical_size_cm(15.0);
        assert!((w - 7.5).abs() < 1e-9);
        assert!((h - 3.75).abs() < 1e-9);
    }

    #[test]
    fn test_zero_width_aspect_ratio() {
        let meta = ImageMetadata::new("/x/fig.png", (0, 10));
        assert_eq!(meta.aspect_ratio(), 0.75);
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_for_extension(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(mime_for_extension(Path::new("a.webp")), "image/webp");
        assert_eq!(mime_for_extension(Path::new("a")), "image/png");
    }

    #[test]
    fn test_placeholder() {
        let meta = ImageMetadata::new("/x/fig.png", (10, 10));
        assert_eq!(meta.placeholder("Image"), "[Image: fig.png]");
        let meta = meta.with_caption("A chart");
        assert_eq!(meta.placeholder("IMAGE"), "[IMAGE: fig.png - A chart]");
    }

    #[test]
    fn test_alignment_names() {
        let meta: ImageMetadata =
            serde_json::from_str(r#"{"filename": "a.png", "alignment": "right"}"#).unwrap();
        assert_eq!(meta.alignment, ImageAlignment::Right);
    }
}
