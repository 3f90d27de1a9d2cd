//! Document model types for academic writing projects.
//!
//! The compiler only ever borrows these types immutably; every intermediate
//! structure is derived from them per compile call.

mod image;
mod paragraph;
mod project;

pub use image::{mime_for_extension, ImageAlignment, ImageMetadata};
pub use paragraph::{Paragraph, ParagraphKind};
pub use project::{
    DocumentFormatting, Margins, PageSize, Project, ProjectMetadata, ProjectStatistics,
};
