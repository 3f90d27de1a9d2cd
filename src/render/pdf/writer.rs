//! Page building and final PDF assembly.

use super::layout::{break_lines, place_line, words, Align};
use super::metrics::{encode_win_ansi, text_width, Face};
use crate::error::{Error, Result};
use crate::model::DocumentFormatting;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str, TextStr};
use std::io::Write;

/// Points per centimeter.
pub const PT_PER_CM: f32 = 28.3465;

const PAGE_NUMBER_SIZE: f32 = 10.0;
const UNDERLINE_OFFSET: f32 = 0.12;
const UNDERLINE_THICKNESS: f32 = 0.05;

/// Page geometry in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSetup {
    pub width: f32,
    pub height: f32,
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
    pub page_numbers: bool,
}

impl PageSetup {
    pub fn from_formatting(fmt: &DocumentFormatting) -> Self {
        let (width, height) = fmt.page_size.dimensions_cm();
        let cm = |v: f64| v as f32 * PT_PER_CM;
        Self {
            width: cm(width),
            height: cm(height),
            top: cm(fmt.margins.top),
            bottom: cm(fmt.margins.bottom),
            left: cm(fmt.margins.left),
            right: cm(fmt.margins.right),
            page_numbers: fmt.show_page_numbers,
        }
    }

    /// Width between the side margins.
    pub fn content_width(&self) -> f32 {
        (self.width - self.left - self.right).max(PT_PER_CM)
    }

    /// Height between the top and bottom margins.
    pub fn content_height(&self) -> f32 {
        (self.height - self.top - self.bottom).max(PT_PER_CM)
    }
}

/// Typographic parameters of one paragraph style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParagraphStyle {
    pub face: Face,
    pub size: f32,
    pub leading: f32,
    pub space_before: f32,
    pub space_after: f32,
    pub align: Align,
    pub left_indent: f32,
    pub first_indent: f32,
}

impl ParagraphStyle {
    pub fn new(face: Face, size: f32, leading: f32) -> Self {
        Self {
            face,
            size,
            leading,
            space_before: 0.0,
            space_after: 0.0,
            align: Align::Left,
            left_indent: 0.0,
            first_indent: 0.0,
        }
    }

    pub fn spacing(mut self, before: f32, after: f32) -> Self {
        self.space_before = before;
        self.space_after = after;
        self
    }

    pub fn aligned(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn indented(mut self, left: f32, first: f32) -> Self {
        self.left_indent = left;
        self.first_indent = first;
        self
    }
}

/// A decoded raster image ready to become an XObject.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    /// Zlib-compressed RGB samples
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl EmbeddedImage {
    /// Decode an encoded image file.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| Error::Layout(format!("cannot decode image: {}", e)))?;
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(Self {
            data: deflate(rgb.as_raw())?,
            width,
            height,
        })
    }
}

/// Document information dictionary entries.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub creator: String,
}

struct Page {
    content: Content,
    images: Vec<usize>,
}

impl Page {
    fn new() -> Self {
        Self {
            content: Content::new(),
            images: Vec::new(),
        }
    }
}

/// Flows paragraphs and images down pages.
pub struct PageBuilder {
    setup: PageSetup,
    pages: Vec<Page>,
    images: Vec<EmbeddedImage>,
    cursor: f32,
    at_top: bool,
}

impl PageBuilder {
    pub fn new(setup: PageSetup) -> Self {
        Self {
            setup,
            pages: vec![Page::new()],
            images: Vec::new(),
            cursor: setup.height - setup.top,
            at_top: true,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn new_page(&mut self) {
        self.pages.push(Page::new());
        self.cursor = self.setup.height - self.setup.top;
        self.at_top = true;
    }

    /// Make room for `height` points, breaking the page when needed.
    fn reserve(&mut self, height: f32) {
        if !self.at_top && self.cursor - height < self.setup.bottom {
            self.new_page();
        }
    }

    fn skip(&mut self, space: f32) {
        if !self.at_top {
            self.cursor -= space;
        }
    }

    fn page(&mut self) -> &mut Page {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Lay out a paragraph of markup.
    pub fn paragraph(&mut self, markup: &str, style: &ParagraphStyle) {
        let space = text_width(" ", style.face, style.size);
        let width = self.setup.content_width() - style.left_indent;
        let lines = break_lines(words(markup, style.face, style.size), width, style.first_indent, space);
        if lines.is_empty() {
            return;
        }

        self.skip(style.space_before);
        let x0 = self.setup.left + style.left_indent;
        for line in &lines {
            self.reserve(style.leading);
            let baseline = self.cursor - style.size;
            let placed = place_line(line, style.align, x0, width, style.first_indent, space);

            let content = &mut self.page().content;
            content.begin_text();
            for (x, piece) in &placed {
                content.set_font(piece.face.resource(), piece.size);
                content.set_rise(piece.rise);
                content.set_text_matrix([1.0, 0.0, 0.0, 1.0, *x, baseline]);
                content.show(Str(&encode_win_ansi(&piece.text)));
            }
            content.end_text();

            for (x, piece) in placed.iter().filter(|(_, p)| p.underline) {
                let y = baseline - piece.size * UNDERLINE_OFFSET;
                content.set_line_width(piece.size * UNDERLINE_THICKNESS);
                content.move_to(*x, y);
                content.line_to(*x + piece.width, y);
                content.stroke();
            }

            self.cursor -= style.leading;
            self.at_top = false;
        }
        self.cursor -= style.space_after;
    }

    /// Lay out text line by line without breaking or markup.
    pub fn preformatted(&mut self, text: &str, style: &ParagraphStyle) {
        self.skip(style.space_before);
        let x = self.setup.left + style.left_indent;
        for line in text.trim_end().lines() {
            self.reserve(style.leading);
            let baseline = self.cursor - style.size;
            let content = &mut self.page().content;
            content.begin_text();
            content.set_font(style.face.resource(), style.size);
            content.set_text_matrix([1.0, 0.0, 0.0, 1.0, x, baseline]);
            content.show(Str(&encode_win_ansi(line)));
            content.end_text();
            self.cursor -= style.leading;
            self.at_top = false;
        }
        self.cursor -= style.space_after;
    }

    /// Place an image of the given size, scaled down to fit the page.
    pub fn image(&mut self, image: EmbeddedImage, width: f32, height: f32, align: Align, spacing: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let max_width = self.setup.content_width();
        let max_height = self.setup.content_height();
        let scale = (max_width / width).min(max_height / height).min(1.0);
        let (width, height) = (width * scale, height * scale);

        self.skip(spacing);
        self.reserve(height);

        let x = self.setup.left
            + match align {
                Align::Left | Align::Justify => 0.0,
                Align::Center => (max_width - width) / 2.0,
                Align::Right => max_width - width,
            };
        let y = self.cursor - height;

        let index = self.images.len();
        self.images.push(image);
        let name = image_name(index);

        let page = self.page();
        page.images.push(index);
        page.content.save_state();
        page.content.transform([width, 0.0, 0.0, height, x, y]);
        page.content.x_object(Name(name.as_bytes()));
        page.content.restore_state();

        self.cursor = y - spacing;
        self.at_top = false;
    }

    /// Serialize all pages into a PDF file.
    pub fn finish(self, info: &DocumentInfo) -> Result<Vec<u8>> {
        let setup = self.setup;
        let mut alloc = Ref::new(1);
        let catalog_id = alloc.bump();
        let tree_id = alloc.bump();
        let info_id = alloc.bump();
        let font_ids: Vec<(Face, Ref)> = Face::ALL.iter().map(|&f| (f, alloc.bump())).collect();
        let image_ids: Vec<Ref> = self.images.iter().map(|_| alloc.bump()).collect();
        let page_ids: Vec<(Ref, Ref)> = self
            .pages
            .iter()
            .map(|_| (alloc.bump(), alloc.bump()))
            .collect();

        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(tree_id);
        pdf.pages(tree_id)
            .kids(page_ids.iter().map(|(page, _)| *page))
            .count(page_ids.len() as i32);

        for (face, id) in &font_ids {
            pdf.type1_font(*id)
                .base_font(face.base_font())
                .encoding_predefined(Name(b"WinAnsiEncoding"));
        }

        for (image, id) in self.images.iter().zip(&image_ids) {
            let mut xobject = pdf.image_xobject(*id, &image.data);
            xobject.filter(Filter::FlateDecode);
            xobject.width(image.width as i32);
            xobject.height(image.height as i32);
            xobject.color_space().device_rgb();
            xobject.bits_per_component(8);
        }

        let total = self.pages.len();
        for (number, (page, (page_id, content_id))) in self.pages.into_iter().zip(&page_ids).enumerate() {
            let mut content = page.content;
            if setup.page_numbers {
                draw_page_number(&mut content, &setup, number + 1);
            }

            let mut writer = pdf.page(*page_id);
            writer
                .media_box(Rect::new(0.0, 0.0, setup.width, setup.height))
                .parent(tree_id)
                .contents(*content_id);
            let mut resources = writer.resources();
            {
                let mut fonts = resources.fonts();
                for (face, id) in &font_ids {
                    fonts.pair(face.resource(), *id);
                }
            }
            if !page.images.is_empty() {
                let names: Vec<(String, Ref)> = page
                    .images
                    .iter()
                    .map(|&i| (image_name(i), image_ids[i]))
                    .collect();
                let mut xobjects = resources.x_objects();
                for (name, id) in &names {
                    xobjects.pair(Name(name.as_bytes()), *id);
                }
            }
            resources.finish();
            writer.finish();

            let data = deflate(&content.finish())?;
            pdf.stream(*content_id, &data).filter(Filter::FlateDecode);
        }

        let mut doc_info = pdf.document_info(info_id);
        doc_info.title(TextStr(&info.title));
        if !info.author.is_empty() {
            doc_info.author(TextStr(&info.author));
        }
        if !info.subject.is_empty() {
            doc_info.subject(TextStr(&info.subject));
        }
        doc_info.creator(TextStr(&info.creator));
        doc_info.finish();

        log::debug!("pdf: {} pages, {} images", total, image_ids.len());
        Ok(pdf.finish())
    }
}

fn draw_page_number(content: &mut Content, setup: &PageSetup, number: usize) {
    let label = number.to_string();
    let width = text_width(&label, Face::Roman, PAGE_NUMBER_SIZE);
    let x = setup.left + (setup.content_width() - width) / 2.0;
    let y = setup.bottom / 2.0;
    content.begin_text();
    content.set_font(Face::Roman.resource(), PAGE_NUMBER_SIZE);
    content.set_text_matrix([1.0, 0.0, 0.0, 1.0, x, y]);
    content.show(Str(label.as_bytes()));
    content.end_text();
}

fn image_name(index: usize) -> String {
    format!("Im{}", index + 1)
}

/// Compress data with zlib.
fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(6));
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Additional methods for [`Ref`].
trait RefExt {
    /// Bump the reference up by one and return the previous one.
    fn bump(&mut self) -> Self;
}

impl RefExt for Ref {
    fn bump(&mut self) -> Self {
        let prev = *self;
        *self = Self::new(prev.get() + 1);
        prev
    }
}
