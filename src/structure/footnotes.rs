//! Footnote resolution.
//!
//! Footnote bodies are deduplicated by exact match across the whole project
//! and numbered globally from 1 in first-seen order.

use crate::model::Paragraph;
use std::collections::HashMap;

/// Deduplicated footnote bibliography plus per-paragraph reference numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FootnoteTable {
    bibliography: Vec<String>,
    references: HashMap<String, Vec<usize>>,
}

impl FootnoteTable {
    /// Walk the paragraphs once and number every footnote body.
    pub fn resolve(paragraphs: &[Paragraph]) -> Self {
        let mut bibliography: Vec<String> = Vec::new();
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut references = HashMap::new();

        for paragraph in paragraphs {
            if paragraph.footnotes.is_empty() {
                continue;
            }

            let numbers = paragraph
                .footnotes
                .iter()
                .map(|body| {
                    *seen.entry(body.as_str()).or_insert_with(|| {
                        bibliography.push(body.clone());
                        bibliography.len()
                    })
                })
                .collect();

            references.insert(paragraph.id.clone(), numbers);
        }

        Self {
            bibliography,
            references,
        }
    }

    /// Distinct footnote bodies; entry `n - 1` has number `n`.
    pub fn bibliography(&self) -> &[String] {
        &self.bibliography
    }

    /// Reference numbers for a paragraph, in its footnote order.
    pub fn references(&self, paragraph_id: &str) -> &[usize] {
        self.references
            .get(paragraph_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Body of footnote number `n` (1-based).
    pub fn body(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|i| self.bibliography.get(i))
            .map(String::as_str)
    }

    /// Iterate `(number, body)` pairs in order.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &str)> {
        self.bibliography
            .iter()
            .enumerate()
            .map(|(i, body)| (i + 1, body.as_str()))
    }

    /// Number of distinct footnotes.
    pub fn len(&self) -> usize {
        self.bibliography.len()
    }

    /// Check if the project has no footnotes.
    pub fn is_empty(&self) -> bool {
        self.bibliography.is_empty()
    }
}
