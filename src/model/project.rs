//! Project-level types.

use super::{Paragraph, ParagraphKind};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A writing project: an ordered sequence of typed paragraphs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Project identifier
    #[serde(default)]
    pub id: String,

    /// Document title
    pub name: String,

    /// Descriptive metadata
    #[serde(default)]
    pub metadata: ProjectMetadata,

    /// Page geometry and base font
    #[serde(default)]
    pub document_formatting: DocumentFormatting,

    /// Creation time
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Last modification time
    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,

    /// Paragraphs, iterated in `order`
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
}

impl Project {
    /// Create a new empty project.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            name: name.into(),
            metadata: ProjectMetadata::default(),
            document_formatting: DocumentFormatting::default(),
            created_at: now,
            modified_at: now,
            paragraphs: Vec::new(),
        }
    }

    /// Parse a project snapshot from JSON.
    ///
    /// Paragraphs are sorted by their `order` field.
    pub fn from_json(s: &str) -> Result<Self> {
        let mut project: Project = serde_json::from_str(s)?;
        project.paragraphs.sort_by_key(|p| p.order);
        Ok(project)
    }

    /// Append a paragraph, assigning its `order`.
    pub fn push(&mut self, mut paragraph: Paragraph) {
        paragraph.order = self.paragraphs.len();
        self.paragraphs.push(paragraph);
    }

    /// Append a paragraph built from kind and content, with a generated id.
    pub fn add_paragraph(&mut self, kind: ParagraphKind, content: impl Into<String>) -> &mut Paragraph {
        let id = format!("p{}", self.paragraphs.len() + 1);
        self.push(Paragraph::new(id, kind, content));
        let last = self.paragraphs.len() - 1;
        &mut self.paragraphs[last]
    }

    /// Builder-style variant of [`Project::push`].
    pub fn with_paragraph(mut self, paragraph: Paragraph) -> Self {
        self.push(paragraph);
        self
    }

    /// Get a paragraph by id.
    pub fn get_paragraph(&self, id: &str) -> Option<&Paragraph> {
        self.paragraphs.iter().find(|p| p.id == id)
    }

    /// Check if the project has no paragraphs.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Compute word, character and paragraph statistics.
    pub fn statistics(&self) -> ProjectStatistics {
        let mut by_kind = BTreeMap::new();
        for kind in ParagraphKind::ALL {
            by_kind.insert(kind.as_str().to_string(), 0);
        }
        for p in &self.paragraphs {
            *by_kind.entry(p.kind.as_str().to_string()).or_insert(0) += 1;
        }

        ProjectStatistics {
            logical_paragraphs: count_logical_paragraphs(&self.paragraphs),
            words: self.paragraphs.iter().map(Paragraph::word_count).sum(),
            characters: self.paragraphs.iter().map(|p| p.char_count(true)).sum(),
            characters_no_spaces: self.paragraphs.iter().map(|p| p.char_count(false)).sum(),
            by_kind,
        }
    }

    /// Render metadata as YAML frontmatter.
    pub fn to_yaml_frontmatter(&self) -> String {
        let mut lines = vec!["---".to_string()];
        lines.push(format!("title: \"{}\"", escape_yaml(&self.name)));

        let meta = &self.metadata;
        for (key, value) in [
            ("author", &meta.author),
            ("subject", &meta.subject),
            ("description", &meta.description),
            ("language", &meta.language),
            ("institution", &meta.institution),
        ] {
            if !value.is_empty() {
                lines.push(format!("{}: \"{}\"", key, escape_yaml(value)));
            }
        }
        if !meta.keywords.is_empty() {
            lines.push(format!(
                "keywords: \"{}\"",
                escape_yaml(&meta.keywords.join(", "))
            ));
        }
        lines.push(format!("created: {}", self.created_at.to_rfc3339()));
        lines.push(format!("modified: {}", self.modified_at.to_rfc3339()));

        lines.push("---".to_string());
        lines.push(String::new());

        lines.join("\n")
    }
}

/// Escape special characters for YAML strings.
fn escape_yaml(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Count logical paragraphs.
///
/// Every `Introduction` opens one. An `Argument` or `Conclusion` seen while no
/// logical paragraph is open counts on its own.
fn count_logical_paragraphs(paragraphs: &[Paragraph]) -> usize {
    let mut total = 0;
    let mut open = false;

    for p in paragraphs {
        match p.kind {
            ParagraphKind::Introduction => {
                total += 1;
                open = true;
            }
            ParagraphKind::Argument | ParagraphKind::Conclusion => {
                if !open {
                    total += 1;
                }
            }
            _ => {}
        }
    }

    total
}

/// Descriptive project metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectMetadata {
    /// Author name
    pub author: String,

    /// Short description
    pub description: String,

    /// Subject
    pub subject: String,

    /// Language tag (e.g., "en")
    pub language: String,

    /// Institution
    pub institution: String,

    /// Keywords
    pub keywords: Vec<String>,
}

/// Paper sizes supported by the paginated targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSize {
    /// ISO A4 (21 x 29.7 cm)
    #[default]
    A4,
    /// US Letter (8.5 x 11 in)
    Letter,
}

impl PageSize {
    /// Page dimensions in centimeters (width, height).
    pub fn dimensions_cm(self) -> (f64, f64) {
        match self {
            PageSize::A4 => (21.0, 29.7),
            PageSize::Letter => (21.59, 27.94),
        }
    }

    /// Paper name as understood by typesetting packages.
    pub fn paper_name(self) -> &'static str {
        match self {
            PageSize::A4 => "a4paper",
            PageSize::Letter => "letterpaper",
        }
    }
}

/// Page margins in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    /// Top margin
    pub top: f64,
    /// Bottom margin
    pub bottom: f64,
    /// Left margin
    pub left: f64,
    /// Right margin
    pub right: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 2.5,
            bottom: 2.5,
            left: 3.0,
            right: 3.0,
        }
    }
}

/// Document-wide formatting used by the paginated and package targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentFormatting {
    /// Paper size
    pub page_size: PageSize,

    /// Margins in centimeters
    pub margins: Margins,

    /// Line spacing multiplier
    pub line_spacing: f64,

    /// Base font size in points
    pub font_size: f64,

    /// Print page numbers in the footer
    pub show_page_numbers: bool,
}

impl Default for DocumentFormatting {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            margins: Margins::default(),
            line_spacing: 1.5,
            font_size: 12.0,
            show_page_numbers: true,
        }
    }
}

impl DocumentFormatting {
    /// Width between the left and right margins, in centimeters.
    pub fn usable_width_cm(&self) -> f64 {
        let (width, _) = self.page_size.dimensions_cm();
        (width - self.margins.left - self.margins.right).max(1.0)
    }
}

/// Statistics about a project's content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectStatistics {
    /// Number of logical paragraphs
    pub logical_paragraphs: usize,

    /// Total word count
    pub words: usize,

    /// Total character count
    pub characters: usize,

    /// Character count excluding spaces
    pub characters_no_spaces: usize,

    /// Paragraph count per kind name
    pub by_kind: BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_frontmatter() {
        let mut project = Project::new("On \"Method\"");
        project.metadata.author = "R. Descartes".into();
        let yaml = project.to_yaml_frontmatter();
        assert!(yaml.starts_with("---\ntitle: \"On \\\"Method\\\"\"\n"));
        assert!(yaml.contains("author: \"R. Descartes\""));
        assert!(!yaml.contains("institution:"));
        assert!(yaml.ends_with("---\n"));
    }

    #[test]
    fn test_project_new() {
        let project = Project::new("Essay");
        assert!(project.is_empty());
        assert_eq!(project.name, "Essay");
    }

    #[test]
    fn test_push_assigns_order() {
        let mut project = Project::new("Essay");
        project.add_paragraph(ParagraphKind::Introduction, "A");
        project.add_paragraph(ParagraphKind::Argument, "B");

        assert_eq!(project.paragraphs[0].order, 0);
        assert_eq!(project.paragraphs[1].order, 1);
        assert_eq!(project.paragraphs[1].id, "p2");
        assert!(project.get_paragraph("p1").is_some());
    }

    #[test]
    fn test_from_json_sorts_by_order() {
        let json = r#"{
            "name": "Essay",
            "paragraphs": [
                {"id": "b", "type": "argument", "content": "B", "order": 1},
                {"id": "a", "type": "introduction", "content": "A", "order": 0}
            ]
        }"#;
        let project = Project::from_json(json).unwrap();
        assert_eq!(project.paragraphs[0].id, "a");
        assert_eq!(project.paragraphs[1].id, "b");
        assert_eq!(project.document_formatting, DocumentFormatting::default());
    }

    #[test]
    fn test_usable_width() {
        let formatting = DocumentFormatting::default();
        assert!((formatting.usable_width_cm() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_logical_paragraph_count() {
        let mut project = Project::new("Essay");
        project.add_paragraph(ParagraphKind::Argument, "orphan");
        project.add_paragraph(ParagraphKind::Introduction, "A");
        project.add_paragraph(ParagraphKind::Argument, "B");
        project.add_paragraph(ParagraphKind::Conclusion, "C");
        project.add_paragraph(ParagraphKind::Quote, "Q");

        let stats = project.statistics();
        assert_eq!(stats.logical_paragraphs, 2);
        assert_eq!(stats.words, 5);
        assert_eq!(stats.by_kind["argument"], 2);
        assert_eq!(stats.by_kind["epigraph"], 0);
    }
}
