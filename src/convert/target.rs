//! Export target selectors.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of export targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// UTF-8 plain text
    PlainText,
    /// UTF-8 Markdown
    Markdown,
    /// OpenDocument text package (zip)
    XmlPackage,
    /// PDF page description
    PaginatedLayout,
    /// LaTeX source
    TypesettingSource,
}

impl Target {
    /// All targets, in selector order.
    pub const ALL: [Target; 5] = [
        Target::PlainText,
        Target::Markdown,
        Target::XmlPackage,
        Target::PaginatedLayout,
        Target::TypesettingSource,
    ];

    /// Selector name of the target.
    pub fn as_str(self) -> &'static str {
        match self {
            Target::PlainText => "plain_text",
            Target::Markdown => "markdown",
            Target::XmlPackage => "xml_package",
            Target::PaginatedLayout => "paginated_layout",
            Target::TypesettingSource => "typesetting_source",
        }
    }

    /// Conventional file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Target::PlainText => "txt",
            Target::Markdown => "md",
            Target::XmlPackage => "odt",
            Target::PaginatedLayout => "pdf",
            Target::TypesettingSource => "tex",
        }
    }

    /// MIME type of the produced artifact.
    pub fn mime_type(self) -> &'static str {
        match self {
            Target::PlainText => "text/plain",
            Target::Markdown => "text/markdown",
            Target::XmlPackage => "application/vnd.oasis.opendocument.text",
            Target::PaginatedLayout => "application/pdf",
            Target::TypesettingSource => "application/x-tex",
        }
    }

    /// Whether the artifact is UTF-8 text.
    pub fn is_text(self) -> bool {
        !matches!(self, Target::XmlPackage | Target::PaginatedLayout)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let selector = s.trim().to_lowercase();
        match selector.as_str() {
            "plain_text" | "txt" | "text" => Ok(Target::PlainText),
            "markdown" | "md" => Ok(Target::Markdown),
            "xml_package" | "odt" => Ok(Target::XmlPackage),
            "paginated_layout" | "pdf" => Ok(Target::PaginatedLayout),
            "typesetting_source" | "tex" | "latex" => Ok(Target::TypesettingSource),
            _ => Err(Error::UnsupportedTarget(s.to_string())),
        }
    }
}
