//! Single-page PDF export.
//!
//! Produces an A4 page with the title at the top and the body text below it,
//! set in the standard Helvetica font so no font data needs embedding.

use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str};

use crate::export::text::plain_text;

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;

const MARGIN_LEFT: f32 = 50.0;
/// Distances from the top edge, as laid out on the page canvas.
const TITLE_TOP: f32 = 50.0;
const BODY_TOP: f32 = 100.0;
const BOTTOM_MARGIN: f32 = 50.0;

const TITLE_SIZE: f32 = 18.0;
const TITLE_LEADING: f32 = 22.0;
const TITLE_MAX_LINES: usize = 2;
const BODY_SIZE: f32 = 14.0;
const BODY_LEADING: f32 = 17.0;
/// Helvetica averages about half an em per glyph over 495pt of usable width.
const TITLE_WRAP_COLUMNS: usize = 55;
const BODY_WRAP_COLUMNS: usize = 70;

const FONT: Name<'static> = Name(b"F1");

/// Render a document as a one-page PDF.
///
/// `content` is editor HTML; it is reduced to plain text first. Text that does
/// not fit on the page is cut off.
pub fn render(title: &str, content: &str) -> Vec<u8> {
    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let page_id = Ref::new(3);
    let font_id = Ref::new(4);
    let content_id = Ref::new(5);

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);

    let mut page = pdf.page(page_id);
    page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
    page.parent(page_tree_id);
    page.contents(content_id);
    page.resources().fonts().pair(FONT, font_id);
    page.finish();

    pdf.type1_font(font_id)
        .base_font(Name(b"Helvetica"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));

    let stream = content_stream(&layout_title(title), &layout_body(&plain_text(content)));
    pdf.stream(content_id, &stream);

    pdf.finish()
}

fn content_stream(title_lines: &[String], body_lines: &[String]) -> Vec<u8> {
    let mut content = Content::new();
    write_block(
        &mut content,
        title_lines,
        TITLE_SIZE,
        TITLE_LEADING,
        PAGE_HEIGHT - TITLE_TOP,
    );
    write_block(
        &mut content,
        body_lines,
        BODY_SIZE,
        BODY_LEADING,
        PAGE_HEIGHT - BODY_TOP,
    );
    content.finish().to_vec()
}

fn write_block(content: &mut Content, lines: &[String], size: f32, leading: f32, top: f32) {
    if lines.is_empty() {
        return;
    }
    content.begin_text();
    content.set_font(FONT, size);
    content.set_leading(leading);
    content.next_line(MARGIN_LEFT, top);
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            content.next_line_using_leading();
        }
        content.show(Str(&win_ansi(line)));
    }
    content.end_text();
}

/// Wrap the title over at most two lines, marking a cut with an ellipsis.
fn layout_title(title: &str) -> Vec<String> {
    let mut lines = wrap(title, TITLE_WRAP_COLUMNS);
    if lines.len() > TITLE_MAX_LINES {
        lines.truncate(TITLE_MAX_LINES);
        if let Some(last) = lines.last_mut() {
            let kept: String = last.chars().take(TITLE_WRAP_COLUMNS - 1).collect();
            *last = format!("{}\u{2026}", kept.trim_end());
        }
    }
    lines
}

/// Wrap the body to the page width and drop whatever runs past the bottom margin.
fn layout_body(text: &str) -> Vec<String> {
    let max_lines = ((PAGE_HEIGHT - BODY_TOP - BOTTOM_MARGIN) / BODY_LEADING) as usize + 1;

    text.lines()
        .flat_map(|paragraph| wrap(paragraph, BODY_WRAP_COLUMNS))
        .take(max_lines)
        .collect()
}

fn wrap(paragraph: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in paragraph.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        // Words longer than a line are hard-broken
        while word.len() > columns {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(columns);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if current.is_empty() {
            word.len()
        } else {
            current.chars().count() + 1 + word.len()
        };
        if needed > columns && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Encode text for the WinAnsi-encoded standard font.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\t' => b' ',
            ' '..='~' | '\u{a0}'..='\u{ff}' => c as u8,
            '\u{20ac}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            _ => b'?',
        })
        .collect()
}
