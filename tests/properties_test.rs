//! Property tests for the inline codec, grouping and footnote numbering.

use proptest::prelude::*;
use std::collections::HashMap;
use tacexport::inline::{decode, encode, TextRun, TextStyle};
use tacexport::structure::{group_plain, Block, FootnoteTable};
use tacexport::{Paragraph, ParagraphKind};

fn style() -> impl Strategy<Value = TextStyle> {
    (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(bold, italic, underline)| TextStyle {
        bold,
        italic,
        underline,
    })
}

/// Runs with non-empty text and no two neighbours sharing a style.
fn runs() -> impl Strategy<Value = Vec<TextRun>> {
    prop::collection::vec(("[a-z .,]{1,8}", style()), 0..8).prop_map(|raw| {
        let mut runs: Vec<TextRun> = Vec::new();
        for (text, style) in raw {
            match runs.last() {
                Some(last) if last.style == style => {}
                _ => runs.push(TextRun::styled(text, style)),
            }
        }
        runs
    })
}

fn text_kind() -> impl Strategy<Value = ParagraphKind> {
    prop::sample::select(
        ParagraphKind::ALL
            .into_iter()
            .filter(|k| *k != ParagraphKind::Image)
            .collect::<Vec<_>>(),
    )
}

/// Paragraphs with word content and footnotes drawn from a small pool, so
/// that duplicates are common.
fn paragraphs() -> impl Strategy<Value = Vec<Paragraph>> {
    let footnote = prop::sample::select(vec!["Ibid.", "Op. cit.", "See above.", "Cf. n. 2"]);
    prop::collection::vec(
        (
            text_kind(),
            "[a-z]{1,6}( [a-z]{1,6}){0,3}",
            prop::collection::vec(footnote, 0..3),
        ),
        0..20,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (kind, content, notes))| {
                let mut p = Paragraph::new(format!("p{}", i), kind, content);
                p.order = i;
                p.footnotes = notes.into_iter().map(String::from).collect();
                p
            })
            .collect()
    })
}

/// Drop `^N` reference markers, keeping everything else.
fn strip_references(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '^' && chars.peek().is_some_and(char::is_ascii_digit) {
            while chars.peek().is_some_and(char::is_ascii_digit) {
                chars.next();
            }
        } else {
            out.push(c);
        }
    }
    out
}

proptest! {
    #[test]
    fn prop_codec_round_trip(runs in runs()) {
        prop_assert_eq!(decode(&encode(&runs)), runs);
    }

    #[test]
    fn prop_text_conservation(paragraphs in paragraphs()) {
        let footnotes = FootnoteTable::resolve(&paragraphs);
        let blocks = group_plain(&paragraphs, &footnotes);

        // Merged fragments are joined by a single space; joining the blocks
        // the same way must give back the running text exactly.
        let grouped: Vec<String> = blocks
            .iter()
            .filter_map(|b| match b {
                Block::Content { text, .. } => Some(strip_references(text)),
                _ => None,
            })
            .collect();
        let source: Vec<&str> = paragraphs
            .iter()
            .filter(|p| p.kind.is_running_text())
            .map(|p| p.content.as_str())
            .collect();

        prop_assert_eq!(grouped.join(" "), source.join(" "));
    }

    #[test]
    fn prop_footnote_stability(paragraphs in paragraphs()) {
        let table = FootnoteTable::resolve(&paragraphs);
        let mut assigned: HashMap<&str, usize> = HashMap::new();

        for paragraph in &paragraphs {
            let numbers = table.references(&paragraph.id);
            prop_assert_eq!(numbers.len(), paragraph.footnotes.len());
            for (body, &number) in paragraph.footnotes.iter().zip(numbers) {
                let first = *assigned.entry(body.as_str()).or_insert(number);
                prop_assert_eq!(first, number);
                prop_assert_eq!(&table.bibliography()[number - 1], body);
            }
        }
        prop_assert_eq!(table.len(), assigned.len());
    }

    #[test]
    fn prop_atomic_kinds_never_merge(paragraphs in paragraphs()) {
        let footnotes = FootnoteTable::resolve(&paragraphs);
        let blocks = group_plain(&paragraphs, &footnotes);

        let atomic = paragraphs.iter().filter(|p| !p.kind.is_running_text()).count();
        let atomic_blocks = blocks
            .iter()
            .filter(|b| !matches!(b, Block::Content { .. }))
            .count();
        prop_assert_eq!(atomic, atomic_blocks);
    }
}
