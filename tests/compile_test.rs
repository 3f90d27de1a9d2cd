//! End-to-end compile tests across all five targets.

use std::io::Read;
use std::path::PathBuf;
use tacexport::{
    compile, compile_many, render, CleanupPreset, ImageMetadata, Paragraph, ParagraphKind,
    Project, RenderOptions, Target,
};
use zip::ZipArchive;

/// A project with two paragraphs carrying the same footnote body.
fn shared_footnote_project() -> Project {
    let mut project = Project::new("Shared Notes");
    project.add_paragraph(ParagraphKind::Title1, "Chapter");
    project
        .add_paragraph(ParagraphKind::Introduction, "First claim.")
        .footnotes
        .push("Ibid., p. 12.".into());
    project
        .add_paragraph(ParagraphKind::Argument, "Second claim.")
        .footnotes
        .push("Ibid., p. 12.".into());
    project
}

fn missing_image_project() -> Project {
    let mut project = Project::new("Figures");
    project.add_paragraph(ParagraphKind::Introduction, "See the figure.");
    let meta = ImageMetadata::new("/definitely/not/here/chart.png", (640, 480))
        .with_caption("Chart");
    project.push(Paragraph::image("fig", &meta));
    project.add_paragraph(ParagraphKind::Conclusion, "Done.");
    project
}

#[test]
fn test_grouped_targets_agree_on_footnote_count() {
    let project = shared_footnote_project();
    let options = RenderOptions::default();

    let text = render(&project, Target::PlainText, &options).unwrap();
    let odt = render(&project, Target::XmlPackage, &options).unwrap();
    let pdf = render(&project, Target::PaginatedLayout, &options).unwrap();

    assert_eq!(text.footnote_count, 1);
    assert_eq!(text.footnote_count, odt.footnote_count);
    assert_eq!(text.footnote_count, pdf.footnote_count);
}

#[test]
fn test_direct_targets_may_diverge_on_footnote_count() {
    let project = shared_footnote_project();
    let options = RenderOptions::default();

    let text = render(&project, Target::PlainText, &options).unwrap();
    let markdown = render(&project, Target::Markdown, &options).unwrap();
    let latex = render(&project, Target::TypesettingSource, &options).unwrap();

    // Markdown and LaTeX number every occurrence; they are allowed to report
    // more notes than the deduplicated table.
    assert!(markdown.footnote_count >= text.footnote_count);
    assert!(latex.footnote_count >= text.footnote_count);
    assert_eq!(markdown.footnote_count, 2);
    assert_eq!(latex.footnote_count, 2);
}

#[test]
fn test_plain_text_shares_reference_number() {
    let project = shared_footnote_project();
    let result = render(&project, Target::PlainText, &RenderOptions::default()).unwrap();
    let text = result.as_text().unwrap();

    assert!(text.contains("First claim.^1 Second claim.^1"));
    assert!(text.contains("1. Ibid., p. 12."));
    assert!(!text.contains("2. Ibid."));
}

#[test]
fn test_missing_image_never_fatal() {
    let project = missing_image_project();
    let dir = tempfile::tempdir().unwrap();

    for target in Target::ALL {
        let path = dir.path().join(format!("figures.{}", target.extension()));
        let artifact = compile(&project, target, &path, &RenderOptions::default())
            .unwrap_or_else(|e| panic!("{target} failed: {e}"));

        assert!(path.is_file());
        assert!(!artifact.is_complete(), "{target} should report the missing image");
        assert_eq!(
            artifact.missing_assets,
            vec![PathBuf::from("/definitely/not/here/chart.png")]
        );
    }

    let text = std::fs::read_to_string(dir.path().join("figures.txt")).unwrap();
    assert!(text.contains("[IMAGE: chart.png - Chart]"));
}

#[test]
fn test_xml_package_layout() {
    let project = shared_footnote_project();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.odt");
    compile(&project, Target::XmlPackage, &path, &RenderOptions::default()).unwrap();

    let file = std::fs::File::open(&path).unwrap();
    let mut archive = ZipArchive::new(file).unwrap();

    // mimetype must be the first entry and stored uncompressed
    {
        let mut first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), "mimetype");
        assert_eq!(first.compression(), zip::CompressionMethod::Stored);
        let mut mimetype = String::new();
        first.read_to_string(&mut mimetype).unwrap();
        assert_eq!(mimetype, "application/vnd.oasis.opendocument.text");
    }

    for name in ["META-INF/manifest.xml", "content.xml", "styles.xml", "meta.xml"] {
        assert!(archive.by_name(name).is_ok(), "missing {name}");
    }

    let mut content = String::new();
    archive
        .by_name("content.xml")
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    assert_eq!(content.matches("<text:note ").count(), 2);
    assert!(content.contains("text:id=\"ftn1\""));
    assert!(content.contains("text:id=\"ftn2\""));
    assert_eq!(
        content
            .matches("<text:note-citation>1</text:note-citation>")
            .count(),
        2
    );
}

#[test]
fn test_pdf_artifact() {
    let project = shared_footnote_project();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.pdf");
    let artifact = compile(&project, Target::PaginatedLayout, &path, &RenderOptions::default())
        .unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    assert_eq!(artifact.mime_type, "application/pdf");
    assert_eq!(artifact.size, bytes.len());
}

#[test]
fn test_compile_many_in_parallel() {
    let project = shared_footnote_project();
    let dir = tempfile::tempdir().unwrap();
    let jobs: Vec<(Target, PathBuf)> = Target::ALL
        .into_iter()
        .map(|t| (t, dir.path().join(format!("out.{}", t.extension()))))
        .collect();

    let results = compile_many(&project, &jobs, &RenderOptions::default());
    assert_eq!(results.len(), jobs.len());
    for ((target, path), result) in jobs.iter().zip(results) {
        let artifact = result.unwrap();
        assert_eq!(artifact.target, *target);
        assert_eq!(&artifact.path, path);
        assert!(path.is_file());
    }
}

#[test]
fn test_compile_overwrites_existing_file() {
    let project = shared_footnote_project();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.md");
    std::fs::write(&path, "stale").unwrap();

    compile(&project, Target::Markdown, &path, &RenderOptions::default()).unwrap();
    let md = std::fs::read_to_string(&path).unwrap();
    assert!(md.starts_with("# Shared Notes"));
}

#[test]
fn test_project_is_not_mutated() {
    let project = shared_footnote_project();
    let before = serde_json::to_string(&project).unwrap();
    for target in Target::ALL {
        render(&project, target, &RenderOptions::default()).unwrap();
    }
    assert_eq!(serde_json::to_string(&project).unwrap(), before);
}

#[test]
fn test_malformed_markup_is_literal() {
    let mut project = Project::new("Markup");
    project.add_paragraph(ParagraphKind::Argument, "open <b>never closed");

    let text = render(&project, Target::PlainText, &RenderOptions::default()).unwrap();
    assert!(text.as_text().unwrap().contains("open <b>never closed"));

    let tex = render(&project, Target::TypesettingSource, &RenderOptions::default()).unwrap();
    assert!(tex.as_text().unwrap().contains("open <b>never closed"));
}

#[test]
fn test_code_listing_identical_across_text_targets() {
    let mut project = Project::new("Listing");
    project.add_paragraph(ParagraphKind::Code, "<b>bold</b> html\nlet  x    = 1;\n\n\n\nlet y = 2;");
    let options = RenderOptions::new().with_cleanup_preset(CleanupPreset::Standard);

    for target in [Target::PlainText, Target::Markdown, Target::TypesettingSource] {
        let result = render(&project, target, &options).unwrap();
        let text = result.as_text().unwrap();
        assert!(text.contains("<b>bold</b> html"), "{target} lost the markers");
        assert!(text.contains("let  x    = 1;"), "{target} rewrote spacing");
        assert!(text.contains("\n\n\n\n"), "{target} dropped blank lines");
    }

    let odt = render(&project, Target::XmlPackage, &options).unwrap();
    let mut archive = ZipArchive::new(std::io::Cursor::new(odt.content)).unwrap();
    let mut content = String::new();
    archive
        .by_name("content.xml")
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    assert!(content.contains("&lt;b&gt;bold&lt;/b&gt; html"));
}

#[test]
fn test_project_from_json_snapshot() {
    let json = r#"{
        "id": "p-1",
        "name": "Snapshot",
        "paragraphs": [
            {"id": "b", "type": "argument", "content": "Second", "order": 1},
            {"id": "a", "type": "introduction", "content": "First", "order": 0}
        ]
    }"#;
    let project = Project::from_json(json).unwrap();
    let result = render(&project, Target::PlainText, &RenderOptions::default()).unwrap();
    assert!(result.as_text().unwrap().contains("First Second"));
}
