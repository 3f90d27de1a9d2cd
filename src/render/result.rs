//! Rendering result with artifact bytes and statistics.

use crate::structure::Block;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of rendering a project to one target, held in memory.
#[derive(Debug, Clone)]
pub struct RenderResult {
    /// The rendered artifact
    pub content: Vec<u8>,

    /// MIME type of the artifact
    pub mime_type: &'static str,

    /// Number of footnotes the artifact carries.
    ///
    /// Grouped targets report the deduplicated bibliography size; direct
    /// targets report every note they emitted.
    pub footnote_count: usize,

    /// Files the artifact references but does not embed
    pub auxiliary_files: Vec<PathBuf>,

    /// Image files that were referenced but could not be read
    pub missing_assets: Vec<PathBuf>,

    /// Rendering statistics
    pub stats: RenderStats,
}

impl RenderResult {
    /// Create a result from artifact bytes.
    pub fn new(content: Vec<u8>, mime_type: &'static str) -> Self {
        Self {
            content,
            mime_type,
            footnote_count: 0,
            auxiliary_files: Vec::new(),
            missing_assets: Vec::new(),
            stats: RenderStats::default(),
        }
    }

    /// Create a result from UTF-8 text.
    pub fn text(content: String, mime_type: &'static str) -> Self {
        Self::new(content.into_bytes(), mime_type)
    }

    /// Set the footnote count.
    pub fn with_footnote_count(mut self, count: usize) -> Self {
        self.footnote_count = count;
        self.stats.footnote_count = count as u32;
        self
    }

    /// Set the auxiliary files.
    pub fn with_auxiliary_files(mut self, files: Vec<PathBuf>) -> Self {
        self.auxiliary_files = files;
        self
    }

    /// Set the missing assets.
    pub fn with_missing_assets(mut self, missing: Vec<PathBuf>) -> Self {
        self.missing_assets = missing;
        self
    }

    /// Set rendering statistics, keeping the footnote count.
    pub fn with_stats(mut self, stats: RenderStats) -> Self {
        let footnote_count = self.stats.footnote_count;
        self.stats = stats;
        self.stats.footnote_count = footnote_count;
        self
    }

    /// Get the artifact length in bytes.
    pub fn content_len(&self) -> usize {
        self.content.len()
    }

    /// View the artifact as text, if it is valid UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}

/// Statistics collected during rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    /// Number of source paragraphs
    pub paragraph_count: u32,

    /// Number of grouped blocks (zero for direct targets)
    pub block_count: u32,

    /// Number of merged running-text blocks
    pub content_block_count: u32,

    /// Number of headings
    pub heading_count: u32,

    /// Number of quotes and epigraphs
    pub quote_count: u32,

    /// Number of code and equation blocks
    pub code_count: u32,

    /// Number of images
    pub image_count: u32,

    /// Number of footnotes carried by the artifact
    pub footnote_count: u32,

    /// Approximate word count (whitespace-separated tokens)
    pub word_count: u32,

    /// Character count (excluding whitespace)
    pub char_count: u32,
}

impl RenderStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one grouped block.
    pub fn add_block(&mut self, block: &Block) {
        self.block_count += 1;
        match block {
            Block::Title1(_) | Block::Title2(_) => self.heading_count += 1,
            Block::Quote(_) | Block::Epigraph(_) => self.quote_count += 1,
            Block::Image(_) => self.image_count += 1,
            Block::Code(_) => self.code_count += 1,
            Block::Content { .. } => self.content_block_count += 1,
        }
    }

    /// Count every block of a grouped rendering.
    pub fn count_blocks(&mut self, blocks: &[Block]) {
        for block in blocks {
            self.add_block(block);
        }
    }

    /// Add word and character counts from text.
    pub fn count_text(&mut self, text: &str) {
        self.word_count += text.split_whitespace().count() as u32;
        self.char_count += text.chars().filter(|c| !c.is_whitespace()).count() as u32;
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &RenderStats) {
        self.paragraph_count += other.paragraph_count;
        self.block_count += other.block_count;
        self.content_block_count += other.content_block_count;
        self.heading_count += other.heading_count;
        self.quote_count += other.quote_count;
        self.code_count += other.code_count;
        self.image_count += other.image_count;
        self.footnote_count += other.footnote_count;
        self.word_count += other.word_count;
        self.char_count += other.char_count;
    }
}
