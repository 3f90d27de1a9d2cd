//! Shared document structure: footnote numbering and block grouping.
//!
//! Three of the five targets (plain text, XML package, paginated layout) are
//! built on top of these; Markdown and LaTeX walk the paragraphs directly.

mod footnotes;
mod grouper;

pub use footnotes::FootnoteTable;
pub use grouper::{
    fold_step, group, group_plain, prepare_fragment, Block, CaretReferences, FoldState, Fragment,
    FragmentEncoder,
};
