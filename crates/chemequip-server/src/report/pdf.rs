//! Page-flowing PDF canvas on top of `pdf-writer`
//!
//! Text and rules only, set in the standard Helvetica faces so no font data
//! has to be embedded. Output depends only on what was drawn: there is no
//! creation date and object ids are fixed, so equal input gives equal bytes.

use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str, TextStr};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 54.0;

/// Space kept free at the bottom of every page for the footer.
const FOOTER_HEIGHT: f32 = 24.0;

const CATALOG_ID: Ref = Ref::new(1);
const PAGE_TREE_ID: Ref = Ref::new(2);
const REGULAR_FONT_ID: Ref = Ref::new(3);
const BOLD_FONT_ID: Ref = Ref::new(4);
const INFO_ID: Ref = Ref::new(5);
const FIRST_PAGE_ID: i32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> Name<'static> {
        match self {
            Font::Regular => Name(b"F1"),
            Font::Bold => Name(b"F2"),
        }
    }
}

/// Page-flowing text canvas. The cursor moves down; content that does not
/// fit starts a new page.
pub struct PdfWriter {
    title: String,
    pages: Vec<Content>,
    current: Content,
    current_empty: bool,
    y: f32,
}

impl PdfWriter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            pages: Vec::new(),
            current: Content::new(),
            current_empty: true,
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    /// Make sure `height` points are left above the footer. Returns true
    /// when that required a page break.
    pub fn reserve(&mut self, height: f32) -> bool {
        if self.y - height < MARGIN + FOOTER_HEIGHT && !self.current_empty {
            self.new_page();
            true
        } else {
            false
        }
    }

    pub fn new_page(&mut self) {
        self.pages.push(std::mem::replace(&mut self.current, Content::new()));
        self.current_empty = true;
        self.y = PAGE_HEIGHT - MARGIN;
    }

    pub fn advance(&mut self, dy: f32) {
        self.y -= dy;
    }

    /// Draw `text` with its baseline at the cursor.
    pub fn text(&mut self, x: f32, font: Font, size: f32, text: &str) {
        push_text(&mut self.current, x, self.y, font, size, text);
        self.current_empty = false;
    }

    /// One full-width line of text followed by a line feed.
    pub fn line(&mut self, font: Font, size: f32, text: &str) {
        let leading = size * 1.4;
        self.reserve(leading);
        self.advance(size);
        self.text(MARGIN, font, size, text);
        self.advance(leading - size);
    }

    /// Horizontal rule across the text block.
    pub fn rule(&mut self) {
        self.reserve(8.0);
        self.advance(4.0);
        self.current
            .set_line_width(0.5)
            .move_to(MARGIN, self.y)
            .line_to(PAGE_WIDTH - MARGIN, self.y)
            .stroke();
        self.current_empty = false;
        self.advance(4.0);
    }

    /// Serialize every page. `footer` is drawn bottom-left on each page,
    /// next to the page number.
    pub fn finish(mut self, footer: Option<&str>) -> Vec<u8> {
        if !self.current_empty || self.pages.is_empty() {
            self.pages.push(self.current);
        }

        let page_count = self.pages.len();
        let page_ids: Vec<Ref> = (0..page_count)
            .map(|i| Ref::new(FIRST_PAGE_ID + 2 * i as i32))
            .collect();

        let mut pdf = Pdf::new();
        pdf.set_version(1, 4);
        pdf.catalog(CATALOG_ID).pages(PAGE_TREE_ID);
        pdf.pages(PAGE_TREE_ID)
            .kids(page_ids.iter().copied())
            .count(page_count as i32);
        pdf.type1_font(REGULAR_FONT_ID)
            .base_font(Name(b"Helvetica"))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
        pdf.type1_font(BOLD_FONT_ID)
            .base_font(Name(b"Helvetica-Bold"))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
        pdf.document_info(INFO_ID)
            .title(TextStr(&self.title))
            .producer(TextStr("chemequip"));

        for (index, (mut content, page_id)) in self.pages.into_iter().zip(page_ids).enumerate() {
            let content_id = Ref::new(page_id.get() + 1);

            let page_label = format!("Page {} of {}", index + 1, page_count);
            push_text(&mut content, PAGE_WIDTH - MARGIN - 60.0, MARGIN, Font::Regular, 8.0, &page_label);
            if let Some(footer) = footer {
                push_text(&mut content, MARGIN, MARGIN, Font::Regular, 8.0, footer);
            }

            {
                let mut page = pdf.page(page_id);
                page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT))
                    .parent(PAGE_TREE_ID)
                    .contents(content_id);
                page.resources()
                    .fonts()
                    .pair(Font::Regular.resource(), REGULAR_FONT_ID)
                    .pair(Font::Bold.resource(), BOLD_FONT_ID);
            }

            let data = content.finish();
            pdf.stream(content_id, &data);
        }

        pdf.finish()
    }
}

fn push_text(content: &mut Content, x: f32, y: f32, font: Font, size: f32, text: &str) {
    content
        .begin_text()
        .set_font(font.resource(), size)
        .next_line(x, y)
        .show(Str(&encode_text(text)))
        .end_text();
}

/// Encode `text` for the WinAnsi-encoded standard fonts.
///
/// Latin-1 characters map to their own byte; anything outside it becomes
/// `?`. Line breaks and tabs become spaces.
pub fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\t' | '\n' | '\r' => b' ',
            ' '..='~' | '\u{a0}'..='\u{ff}' => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}
