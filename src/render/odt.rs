//! OpenDocument text package rendering.
//!
//! The package is assembled in memory as a zip archive: `mimetype` (stored,
//! first), `META-INF/manifest.xml`, `content.xml`, `styles.xml`, `meta.xml`
//! and one `Pictures/` entry per embedded image. Footnotes become native
//! `text:note` elements placed right after their reference point.

use crate::convert::Target;
use crate::error::Result;
use crate::inline::{self, TextStyle};
use crate::model::{ImageAlignment, ImageMetadata, Paragraph, Project};
use crate::structure::{Block, FootnoteTable, FragmentEncoder};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{AssetTracker, GroupedRenderer, RenderOptions, RenderResult};

const MIMETYPE: &str = "application/vnd.oasis.opendocument.text";

const NS_OFFICE: &str = "urn:oasis:names:tc:opendocument:xmlns:office:1.0";
const NS_STYLE: &str = "urn:oasis:names:tc:opendocument:xmlns:style:1.0";
const NS_TEXT: &str = "urn:oasis:names:tc:opendocument:xmlns:text:1.0";
const NS_DRAW: &str = "urn:oasis:names:tc:opendocument:xmlns:drawing:1.0";
const NS_SVG: &str = "urn:oasis:names:tc:opendocument:xmlns:svg-compatible:1.0";
const NS_FO: &str = "urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0";

/// OpenDocument text renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct OdtRenderer;

/// Fragment encoder for ODF content: escaped text, styled spans and inline
/// notes with document-unique ids.
#[derive(Debug, Default)]
pub struct OdtFragments {
    next_note_id: usize,
}

impl FragmentEncoder for OdtFragments {
    fn encode_text(&mut self, paragraph: &Paragraph) -> String {
        if paragraph.kind.is_verbatim() {
            escape_xml(paragraph.trimmed_content())
        } else {
            spans(paragraph.trimmed_content())
        }
    }

    fn encode_reference(&mut self, number: usize, body: &str) -> String {
        self.next_note_id += 1;
        format!(
            "<text:note text:id=\"ftn{}\" text:note-class=\"footnote\">\
             <text:note-citation>{}</text:note-citation>\
             <text:note-body><text:p text:style-name=\"Footnote\">{}</text:p></text:note-body>\
             </text:note>",
            self.next_note_id,
            number,
            spans(body)
        )
    }
}

impl GroupedRenderer for OdtRenderer {
    type Encoder = OdtFragments;

    fn target(&self) -> Target {
        Target::XmlPackage
    }

    fn encoder(&self, _project: &Project, _options: &RenderOptions) -> Self::Encoder {
        OdtFragments::default()
    }

    fn render_blocks(
        &self,
        project: &Project,
        blocks: &[Block],
        _footnotes: &FootnoteTable,
        options: &RenderOptions,
    ) -> Result<RenderResult> {
        let mut pictures = Pictures::default();
        let mut assets = AssetTracker::new();
        let usable_width = project.document_formatting.usable_width_cm();

        let mut body = String::new();
        body.push_str(&format!(
            "<text:p text:style-name=\"Title\">{}</text:p>\n",
            spans(&project.name)
        ));
        for block in blocks {
            match block {
                Block::Image(metadata) => {
                    let embedded = assets
                        .load(metadata)
                        .map(|bytes| pictures.add(metadata, bytes));
                    write_image(&mut body, metadata, embedded.as_deref(), usable_width, options);
                }
                _ => write_block(&mut body, block),
            }
        }

        let package = build_package(
            &content_xml(&body),
            &manifest_xml(&pictures),
            &meta_xml(project, options),
            &pictures,
        )?;

        log::debug!(
            "odt package: {} bytes, {} pictures",
            package.len(),
            pictures.entries.len()
        );

        Ok(RenderResult::new(package, Target::XmlPackage.mime_type())
            .with_missing_assets(assets.into_missing()))
    }
}

/// Images embedded in the package, keyed by unique entry name.
#[derive(Default)]
struct Pictures {
    entries: Vec<(String, &'static str, Vec<u8>)>,
    by_source: HashMap<PathBuf, String>,
}

impl Pictures {
    /// Add an image and return its package entry name.
    fn add(&mut self, metadata: &ImageMetadata, bytes: Vec<u8>) -> String {
        if let Some(name) = self.by_source.get(&metadata.path) {
            return name.clone();
        }

        let file = entry_file_name(&metadata.filename);
        let mut name = format!("Pictures/{}", file);
        let mut n = 0;
        while self.entries.iter().any(|(taken, _, _)| *taken == name) {
            n += 1;
            name = format!("Pictures/{}_{}", n, file);
        }
        self.entries
            .push((name.clone(), metadata.mime_type(), bytes));
        self.by_source.insert(metadata.path.clone(), name.clone());
        name
    }
}

/// Last usable path component of a file name, so that package entries
/// always sit directly under `Pictures/`.
fn entry_file_name(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .find(|part| !part.is_empty() && *part != "." && *part != "..")
        .unwrap_or("image")
}

fn write_block(body: &mut String, block: &Block) {
    let (style, text) = match block {
        Block::Title1(text) => ("Title1", text.clone()),
        Block::Title2(text) => ("Title2", text.clone()),
        Block::Quote(text) => ("Quote", text.clone()),
        Block::Epigraph(text) => ("Epigraph", text.clone()),
        Block::Code(text) => ("Code", preserve_lines(text)),
        Block::Content {
            text,
            indent_first_line,
        } => {
            let style = if *indent_first_line {
                "Introduction"
            } else {
                "Normal"
            };
            (style, text.clone())
        }
        Block::Image(_) => return,
    };
    body.push_str(&format!(
        "<text:p text:style-name=\"{}\">{}</text:p>\n",
        style, text
    ));
}

fn write_image(
    body: &mut String,
    metadata: &ImageMetadata,
    entry: Option<&str>,
    usable_width_cm: f64,
    options: &RenderOptions,
) {
    let Some(entry) = entry else {
        body.push_str(&format!(
            "<text:p text:style-name=\"ImageCaption\">{}</text:p>\n",
            escape_xml(&metadata.placeholder(&options.image_placeholder_prefix))
        ));
        return;
    };

    let (width, height) = metadata.physical_size_cm(usable_width_cm);
    let graphic_style = match metadata.alignment {
        ImageAlignment::Left => "GraphicsLeft",
        ImageAlignment::Center => "GraphicsCenter",
        ImageAlignment::Right => "GraphicsRight",
    };

    body.push_str(&format!(
        "<text:p text:style-name=\"Normal\">\
         <draw:frame draw:style-name=\"{}\" draw:name=\"{}\" text:anchor-type=\"paragraph\" \
         svg:width=\"{:.2}cm\" svg:height=\"{:.2}cm\" draw:z-index=\"0\">\
         <draw:image xlink:href=\"{}\" xlink:type=\"simple\" xlink:show=\"embed\" xlink:actuate=\"onLoad\"/>",
        graphic_style,
        escape_xml(&metadata.filename),
        width,
        height,
        escape_xml(entry)
    ));
    if !metadata.alt_text.is_empty() {
        body.push_str(&format!(
            "<svg:desc>{}</svg:desc>",
            escape_xml(&metadata.alt_text)
        ));
    }
    body.push_str("</draw:frame></text:p>\n");

    if !metadata.caption.is_empty() {
        body.push_str(&format!(
            "<text:p text:style-name=\"ImageCaption\">{}</text:p>\n",
            spans(&metadata.caption)
        ));
    }
}

fn build_package(
    content: &str,
    manifest: &str,
    meta: &str,
    pictures: &Pictures,
) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("mimetype", stored)?;
    zip.write_all(MIMETYPE.as_bytes())?;

    zip.start_file("META-INF/manifest.xml", deflated)?;
    zip.write_all(manifest.as_bytes())?;

    zip.start_file("content.xml", deflated)?;
    zip.write_all(content.as_bytes())?;

    zip.start_file("styles.xml", deflated)?;
    zip.write_all(styles_xml().as_bytes())?;

    zip.start_file("meta.xml", deflated)?;
    zip.write_all(meta.as_bytes())?;

    for (name, _, bytes) in &pictures.entries {
        zip.start_file(name.as_str(), deflated)?;
        zip.write_all(bytes)?;
    }

    Ok(zip.finish()?.into_inner())
}

fn content_xml(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <office:document-content xmlns:office=\"{NS_OFFICE}\" xmlns:style=\"{NS_STYLE}\" \
         xmlns:text=\"{NS_TEXT}\" xmlns:draw=\"{NS_DRAW}\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" \
         xmlns:svg=\"{NS_SVG}\" xmlns:fo=\"{NS_FO}\" office:version=\"1.2\">\n\
         <office:automatic-styles/>\n\
         <office:body>\n<office:text>\n{body}</office:text>\n</office:body>\n\
         </office:document-content>\n"
    )
}

fn manifest_xml(pictures: &Pictures) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <manifest:manifest xmlns:manifest=\"urn:oasis:names:tc:opendocument:xmlns:manifest:1.0\" manifest:version=\"1.2\">\n",
    );
    xml.push_str(&format!(
        "  <manifest:file-entry manifest:full-path=\"/\" manifest:media-type=\"{}\"/>\n",
        MIMETYPE
    ));
    for part in ["content.xml", "styles.xml", "meta.xml"] {
        xml.push_str(&format!(
            "  <manifest:file-entry manifest:full-path=\"{}\" manifest:media-type=\"text/xml\"/>\n",
            part
        ));
    }
    for (name, mime, _) in &pictures.entries {
        xml.push_str(&format!(
            "  <manifest:file-entry manifest:full-path=\"{}\" manifest:media-type=\"{}\"/>\n",
            escape_xml(name),
            mime
        ));
    }
    xml.push_str("</manifest:manifest>\n");
    xml
}

fn meta_xml(project: &Project, options: &RenderOptions) -> String {
    let meta = &project.metadata;
    let mut fields = String::new();
    fields.push_str(&format!(
        "  <meta:generator>{}</meta:generator>\n",
        escape_xml(&options.generator)
    ));
    fields.push_str(&format!(
        "  <dc:title>{}</dc:title>\n",
        escape_xml(&inline::plain_text(&project.name))
    ));
    fields.push_str(&format!(
        "  <dc:creator>{}</dc:creator>\n",
        escape_xml(&meta.author)
    ));
    fields.push_str(&format!(
        "  <dc:description>{}</dc:description>\n",
        escape_xml(&meta.description)
    ));
    if !meta.subject.is_empty() {
        fields.push_str(&format!(
            "  <dc:subject>{}</dc:subject>\n",
            escape_xml(&meta.subject)
        ));
    }
    if !meta.language.is_empty() {
        fields.push_str(&format!(
            "  <dc:language>{}</dc:language>\n",
            escape_xml(&meta.language)
        ));
    }
    for keyword in &meta.keywords {
        fields.push_str(&format!(
            "  <meta:keyword>{}</meta:keyword>\n",
            escape_xml(keyword)
        ));
    }
    fields.push_str(&format!(
        "  <meta:creation-date>{}</meta:creation-date>\n",
        project.created_at.format("%Y-%m-%dT%H:%M:%S")
    ));
    fields.push_str(&format!(
        "  <dc:date>{}</dc:date>\n",
        project.modified_at.format("%Y-%m-%dT%H:%M:%S")
    ));

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <office:document-meta xmlns:office=\"{NS_OFFICE}\" \
         xmlns:meta=\"urn:oasis:names:tc:opendocument:xmlns:meta:1.0\" \
         xmlns:dc=\"http://purl.org/dc/elements/1.1/\" office:version=\"1.2\">\n\
         <office:meta>\n{fields}</office:meta>\n</office:document-meta>\n"
    )
}

fn paragraph_style(name: &str, text: &str, paragraph: &str) -> String {
    format!(
        "  <style:style style:name=\"{name}\" style:family=\"paragraph\">\n\
         \x20   <style:paragraph-properties {paragraph}/>\n\
         \x20   <style:text-properties {text}/>\n\
         \x20 </style:style>\n"
    )
}

fn graphic_style(name: &str, position: &str) -> String {
    format!(
        "  <style:style style:name=\"{name}\" style:family=\"graphic\">\n\
         \x20   <style:graphic-properties style:run-through=\"foreground\" style:wrap=\"none\" \
         style:horizontal-pos=\"{position}\" style:horizontal-rel=\"paragraph\" \
         style:vertical-pos=\"top\" style:vertical-rel=\"paragraph\"/>\n\
         \x20 </style:style>\n"
    )
}

fn styles_xml() -> String {
    let mut styles = String::new();
    styles.push_str(&paragraph_style(
        "Title",
        "fo:font-size=\"18pt\" fo:font-weight=\"bold\"",
        "fo:text-align=\"center\" fo:margin-bottom=\"0.5cm\"",
    ));
    styles.push_str(&paragraph_style(
        "Title1",
        "fo:font-size=\"16pt\" fo:font-weight=\"bold\"",
        "fo:margin-top=\"0.5cm\" fo:margin-bottom=\"0.3cm\"",
    ));
    styles.push_str(&paragraph_style(
        "Title2",
        "fo:font-size=\"14pt\" fo:font-weight=\"bold\"",
        "fo:margin-top=\"0.4cm\" fo:margin-bottom=\"0.2cm\"",
    ));
    styles.push_str(&paragraph_style(
        "Introduction",
        "fo:font-size=\"12pt\"",
        "fo:text-align=\"justify\" fo:text-indent=\"1.5cm\" fo:margin-bottom=\"0cm\" fo:line-height=\"150%\"",
    ));
    styles.push_str(&paragraph_style(
        "Normal",
        "fo:font-size=\"12pt\"",
        "fo:text-align=\"justify\" fo:margin-bottom=\"0cm\" fo:line-height=\"150%\"",
    ));
    styles.push_str(&paragraph_style(
        "Quote",
        "fo:font-size=\"10pt\" fo:font-style=\"italic\"",
        "fo:text-align=\"justify\" fo:margin-left=\"4cm\" fo:margin-bottom=\"0.3cm\" fo:line-height=\"100%\"",
    ));
    styles.push_str(&paragraph_style(
        "Epigraph",
        "fo:font-size=\"12pt\" fo:font-style=\"italic\"",
        "fo:text-align=\"end\" fo:margin-left=\"7.5cm\" fo:margin-bottom=\"0.3cm\" fo:line-height=\"150%\"",
    ));
    styles.push_str(&paragraph_style(
        "Footnote",
        "fo:font-size=\"9pt\"",
        "fo:text-align=\"justify\" fo:margin-bottom=\"0.2cm\" fo:line-height=\"100%\"",
    ));
    styles.push_str(&paragraph_style(
        "ImageCaption",
        "fo:font-size=\"10pt\" fo:font-style=\"italic\"",
        "fo:text-align=\"center\" fo:margin-top=\"0.2cm\" fo:margin-bottom=\"0.5cm\"",
    ));
    styles.push_str(&paragraph_style(
        "Code",
        "fo:font-size=\"10pt\" fo:font-family=\"Courier New\"",
        "fo:margin-left=\"1cm\" fo:margin-bottom=\"0.3cm\" fo:line-height=\"100%\"",
    ));

    for style in all_text_styles() {
        if let Some(name) = text_style_name(style) {
            let mut props = Vec::new();
            if style.bold {
                props.push("fo:font-weight=\"bold\"");
            }
            if style.italic {
                props.push("fo:font-style=\"italic\"");
            }
            if style.underline {
                props.push(
                    "style:text-underline-style=\"solid\" style:text-underline-width=\"auto\" \
                     style:text-underline-color=\"font-color\"",
                );
            }
            styles.push_str(&format!(
                "  <style:style style:name=\"{}\" style:family=\"text\">\n\
                 \x20   <style:text-properties {}/>\n\
                 \x20 </style:style>\n",
                name,
                props.join(" ")
            ));
        }
    }

    styles.push_str(&graphic_style("GraphicsLeft", "left"));
    styles.push_str(&graphic_style("GraphicsCenter", "center"));
    styles.push_str(&graphic_style("GraphicsRight", "right"));

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <office:document-styles xmlns:office=\"{NS_OFFICE}\" xmlns:style=\"{NS_STYLE}\" \
         xmlns:text=\"{NS_TEXT}\" xmlns:fo=\"{NS_FO}\" office:version=\"1.2\">\n\
         <office:styles>\n{styles}</office:styles>\n</office:document-styles>\n"
    )
}

fn all_text_styles() -> impl Iterator<Item = TextStyle> {
    (0u8..8).map(|bits| TextStyle {
        bold: bits & 1 != 0,
        italic: bits & 2 != 0,
        underline: bits & 4 != 0,
    })
}

/// Name of the text style for a bold/italic/underline combination.
fn text_style_name(style: TextStyle) -> Option<&'static str> {
    match (style.bold, style.italic, style.underline) {
        (false, false, false) => None,
        (true, false, false) => Some("Bold"),
        (false, true, false) => Some("Italic"),
        (false, false, true) => Some("Underline"),
        (true, true, false) => Some("BoldItalic"),
        (true, false, true) => Some("BoldUnderline"),
        (false, true, true) => Some("ItalicUnderline"),
        (true, true, true) => Some("BoldItalicUnderline"),
    }
}

/// Escape inline-tagged content for XML and wrap styled runs in spans.
fn spans(content: &str) -> String {
    inline::decode(content)
        .iter()
        .map(|run| {
            let text = escape_xml(&run.text);
            match text_style_name(run.style) {
                Some(name) => format!("<text:span text:style-name=\"{}\">{}</text:span>", name, text),
                None => text,
            }
        })
        .collect()
}

/// Turn newlines inside already-encoded text into ODF line breaks.
/// Keep the line breaks, tabs and space runs of an escaped listing, which
/// ODF would otherwise collapse.
fn preserve_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut spaces = 0;
    let mut line_start = true;

    let flush_spaces = |out: &mut String, spaces: &mut usize, line_start: bool| {
        match (*spaces, line_start) {
            (0, _) => {}
            (1, false) => out.push(' '),
            (n, false) => out.push_str(&format!(" <text:s text:c=\"{}\"/>", n - 1)),
            (1, true) => out.push_str("<text:s/>"),
            (n, true) => out.push_str(&format!("<text:s text:c=\"{}\"/>", n)),
        }
        *spaces = 0;
    };

    for c in text.chars() {
        match c {
            ' ' => spaces += 1,
            '\n' => {
                flush_spaces(&mut out, &mut spaces, line_start);
                out.push_str("<text:line-break/>");
                line_start = true;
            }
            '\t' => {
                flush_spaces(&mut out, &mut spaces, line_start);
                out.push_str("<text:tab/>");
                line_start = false;
            }
            _ => {
                flush_spaces(&mut out, &mut spaces, line_start);
                out.push(c);
                line_start = false;
            }
        }
    }
    flush_spaces(&mut out, &mut spaces, line_start);
    out
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
