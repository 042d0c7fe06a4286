//! Pagination – splits a flat list of positioned boxes into pages.
//!
//! Handles:
//! - Page boundaries from the resolved [`PageSetup`]
//! - Page-break-before / page-break-after hints, at any nesting depth
//! - Text blocks taller than a page, split between lines
//! - `page-break-after: avoid` (a heading moves with the block after it)
//! - Table row splitting across pages
//! - Running headers and footers in the page margin boxes

use crate::fonts::FontManager;
use crate::layout::{BoxContent, PositionedBox};
use crate::layout_config::*;
use crate::page::{MarginBox, MarginBoxPosition, PageSetup};
use crate::style::{self, ComputedStyle};

/// Recursively expand any pure-container box that is taller than a page or
/// holds a forced break, so its children paginate individually.
fn flatten_for_pagination<'a>(
    boxes: &'a [PositionedBox],
    content_height: f32,
) -> Vec<&'a PositionedBox> {
    let mut result = Vec::new();
    for pbox in boxes {
        if (pbox.height > content_height || pbox.children.iter().any(has_forced_break))
            && matches!(pbox.content, BoxContent::None)
            && !pbox.children.is_empty()
            && !is_table_like(pbox)
        {
            result.extend(flatten_for_pagination(&pbox.children, content_height));
        } else {
            result.push(pbox);
        }
    }
    result
}

fn has_forced_break(pbox: &PositionedBox) -> bool {
    pbox.page_break_before || pbox.page_break_after || pbox.children.iter().any(has_forced_break)
}

struct Paginator<'a> {
    page: &'a PageSetup,
    fonts: &'a FontManager,
    content_height: f32,
    pages: Vec<PageLayout>,
    current: PageLayout,
    /// Document-space y at which the current page begins.
    page_start_doc_y: f32,
    /// The last box placed, when it asked to stay with its successor.
    keep_with_next: Option<&'a PositionedBox>,
}

impl<'a> Paginator<'a> {
    fn new_page(&mut self, start_doc_y: f32) {
        let next = PageLayout {
            page_index: self.pages.len() + 1,
            boxes: Vec::new(),
        };
        self.pages.push(std::mem::replace(&mut self.current, next));
        self.page_start_doc_y = start_doc_y;
    }

    fn place(&mut self, pbox: &'a PositionedBox) {
        let y_on_page = (pbox.y - self.page_start_doc_y).max(0.0);
        let lb = build_layout_box(pbox, pbox.x, self.page.margin_top + y_on_page, self.fonts);
        self.current.boxes.push(lb);
        self.keep_with_next = pbox.page_break_after_avoid.then_some(pbox);
    }

    /// Start a new page for `pbox`, carrying along a preceding box that must
    /// not be separated from it.
    fn break_before(&mut self, pbox: &'a PositionedBox) {
        match self.keep_with_next.take() {
            Some(prev) if self.current.boxes.len() > 1 => {
                self.current.boxes.pop();
                self.new_page(prev.y);
                self.place(prev);
            }
            _ => self.new_page(pbox.y),
        }
    }

    fn add(&mut self, pbox: &'a PositionedBox) {
        if pbox.page_break_before && !self.current.boxes.is_empty() {
            self.new_page(pbox.y);
        }

        let y_on_page = (pbox.y - self.page_start_doc_y).max(0.0);
        if y_on_page + pbox.height > self.content_height {
            if is_table_like(pbox) && !pbox.page_break_inside_avoid {
                self.split_table(pbox);
                return;
            }
            if is_splittable_text(pbox) {
                self.split_text(pbox);
                return;
            }
            if !self.current.boxes.is_empty() {
                self.break_before(pbox);
            }
        }

        self.place(pbox);

        if pbox.page_break_after {
            self.new_page(pbox.y + pbox.height);
            self.keep_with_next = None;
        }
    }

    fn split_table(&mut self, table: &'a PositionedBox) {
        let mut first = true;
        for row in &table.children {
            let y_on_page = (row.y - self.page_start_doc_y).max(0.0);
            if y_on_page + row.height > self.content_height && !self.current.boxes.is_empty() {
                if first {
                    self.break_before(row);
                } else {
                    self.new_page(row.y);
                }
            }
            self.place(row);
            first = false;
        }
        self.keep_with_next = None;
    }

    /// Spread a text block over as many pages as it needs, breaking between
    /// lines. Each page gets a copy of the box holding its share of lines.
    fn split_text(&mut self, pbox: &'a PositionedBox) {
        let BoxContent::Text { lines, .. } = &pbox.content else {
            return;
        };
        let s = &pbox.style;
        let line_height = self.fonts.line_height_px(s.font_size, s.line_height);
        let lead = s.padding_top + s.border_width;
        let whole = build_layout_box(pbox, pbox.x, 0.0, self.fonts);
        let Some(text) = whole.text.as_ref() else {
            return;
        };

        let mut start = 0;
        while start < lines.len() {
            let first_line_doc_y = pbox.y + lead + start as f32 * line_height;
            let top_doc_y = if start == 0 { pbox.y } else { first_line_doc_y };
            let y_on_page = (first_line_doc_y - self.page_start_doc_y).max(0.0);
            let mut fit = ((self.content_height - y_on_page) / line_height).floor().max(0.0) as usize;
            if fit == 0 {
                if !self.current.boxes.is_empty() {
                    if start == 0 {
                        self.break_before(pbox);
                    } else {
                        self.new_page(top_doc_y);
                    }
                    continue;
                }
                fit = 1;
            }
            let end = (start + fit).min(lines.len());

            let mut slice = whole.clone();
            let y_on_page = (top_doc_y - self.page_start_doc_y).max(0.0);
            slice.y = self.page.margin_top + y_on_page;
            let shift = top_doc_y - pbox.y;
            let mut part = text.clone();
            part.lines = text.lines[start..end]
                .iter()
                .cloned()
                .map(|mut line| {
                    line.y_offset -= shift;
                    line
                })
                .collect();
            slice.text = Some(part);
            slice.height = if end == lines.len() {
                pbox.height - shift
            } else {
                lead + end as f32 * line_height - shift
            };
            self.current.boxes.push(slice);
            self.keep_with_next = None;

            if end < lines.len() {
                self.new_page(pbox.y + lead + end as f32 * line_height);
            }
            start = end;
        }
    }

    fn finish(mut self) -> Vec<PageLayout> {
        if !self.current.boxes.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

/// Convert positioned boxes into a paginated LayoutConfig.
pub fn paginate(
    boxes: &[PositionedBox],
    page: &PageSetup,
    fonts: &FontManager,
    title: Option<&str>,
) -> LayoutConfig {
    let mut config = LayoutConfig::new(page.width, page.height);
    if let Some(title) = title {
        config.title = title.to_string();
    }
    config.margins_pt = [
        page.margin_top,
        page.margin_right,
        page.margin_bottom,
        page.margin_left,
    ];

    let content_height = page.content_height();
    let flat = flatten_for_pagination(boxes, content_height);

    let mut paginator = Paginator {
        page,
        fonts,
        content_height,
        pages: Vec::new(),
        current: PageLayout {
            page_index: 0,
            boxes: Vec::new(),
        },
        page_start_doc_y: 0.0,
        keep_with_next: None,
    };
    for pbox in flat {
        paginator.add(pbox);
    }
    config.pages = paginator.finish();

    let total = config.pages.len();
    for (i, page_layout) in config.pages.iter_mut().enumerate() {
        page_layout.page_index = i;
        for mbox in &page.margin_boxes {
            let text = mbox.resolve_text(i + 1, total);
            if !text.is_empty() {
                page_layout.boxes.push(margin_box_layout(mbox, &text, page, fonts));
            }
        }
    }
    config
}

fn is_table_like(pbox: &PositionedBox) -> bool {
    pbox.style.display == style::Display::Grid && !pbox.children.is_empty()
}

fn is_splittable_text(pbox: &PositionedBox) -> bool {
    !pbox.page_break_inside_avoid && matches!(&pbox.content, BoxContent::Text { lines, .. } if lines.len() > 1)
}

/// Place one line of running content inside the page margin.
fn margin_box_layout(mbox: &MarginBox, text: &str, page: &PageSetup, fonts: &FontManager) -> LayoutBox {
    let width = fonts.measure_text_width(text, mbox.font_size, false, false, &mbox.font_family);
    let line_height = fonts.line_height_px(mbox.font_size, 1.2);
    let x = match mbox.position {
        MarginBoxPosition::TopLeft | MarginBoxPosition::BottomLeft => page.margin_left,
        MarginBoxPosition::TopCenter | MarginBoxPosition::BottomCenter => {
            page.margin_left + (page.content_width() - width) / 2.0
        }
        MarginBoxPosition::TopRight | MarginBoxPosition::BottomRight => {
            page.width - page.margin_right - width
        }
    };
    let y = if mbox.position.is_top() {
        ((page.margin_top - line_height) / 2.0).max(0.0)
    } else {
        page.height - page.margin_bottom + ((page.margin_bottom - line_height) / 2.0).max(0.0)
    };

    let mut lb = LayoutBox::new(x, y, width, line_height);
    let c = mbox.color;
    lb.text = Some(TextContent {
        lines: vec![TextLine {
            text: text.to_string(),
            x_offset: 0.0,
            y_offset: 0.0,
            width,
        }],
        font_family: mbox.font_family.clone(),
        font_size: mbox.font_size,
        bold: false,
        italic: false,
        color: [c.r, c.g, c.b, c.a],
        line_height,
        text_align: "left".to_string(),
        underline: false,
        list_marker: None,
    });
    lb
}

fn text_align_name(align: style::TextAlign) -> String {
    match align {
        style::TextAlign::Left => "left".to_string(),
        style::TextAlign::Center => "center".to_string(),
        style::TextAlign::Right => "right".to_string(),
    }
}

fn text_content(style: &ComputedStyle, lines: Vec<TextLine>, line_height: f32, marker: Option<String>) -> TextContent {
    let c = &style.color;
    TextContent {
        lines,
        font_family: style.font_family.clone(),
        font_size: style.font_size,
        bold: style.font_weight == style::FontWeight::Bold,
        italic: style.font_style == style::FontStyle::Italic,
        color: [c.r, c.g, c.b, c.a],
        line_height,
        text_align: text_align_name(style.text_align),
        underline: style.text_decoration == style::TextDecoration::Underline,
        list_marker: marker,
    }
}

/// Recursively build a LayoutBox tree where every box carries *page-absolute*
/// x/y coordinates (origin = top-left of the physical page).
///
/// For each child, its absolute y is derived by:
///   `child_abs_y = parent_abs_y + (child.y − parent.y)`
/// because PositionedBox.y values are accumulated document-space absolutes.
fn build_layout_box(pbox: &PositionedBox, abs_x: f32, abs_y: f32, fonts: &FontManager) -> LayoutBox {
    let s = &pbox.style;
    let mut lb = LayoutBox::new(abs_x, abs_y, pbox.width, pbox.height);

    if !s.background_color.is_transparent() {
        let c = &s.background_color;
        lb.background_color = Some([c.r, c.g, c.b, c.a]);
    }

    if s.border_width > 0.0 {
        let c = &s.border_color;
        lb.border = Some(BorderStyle {
            width: s.border_width,
            color: [c.r, c.g, c.b, c.a],
        });
    }

    match &pbox.content {
        BoxContent::Text { lines, .. } => {
            let line_height = fonts.line_height_px(s.font_size, s.line_height);
            let bold = s.font_weight == style::FontWeight::Bold;
            let italic = s.font_style == style::FontStyle::Italic;
            let left = s.padding_left + s.border_width;
            let inner = (pbox.width - left - s.padding_right - s.border_width).max(0.0);
            let top = s.padding_top + s.border_width;
            let text_lines = lines
                .iter()
                .enumerate()
                .map(|(i, line)| {
                    let width = fonts.measure_text_width(line, s.font_size, bold, italic, &s.font_family);
                    let shift = match s.text_align {
                        style::TextAlign::Left => 0.0,
                        style::TextAlign::Center => ((inner - width) / 2.0).max(0.0),
                        style::TextAlign::Right => (inner - width).max(0.0),
                    };
                    TextLine {
                        text: line.clone(),
                        x_offset: left + shift,
                        y_offset: top + i as f32 * line_height,
                        width,
                    }
                })
                .collect();
            lb.text = Some(text_content(s, text_lines, line_height, None));
        }
        BoxContent::Image { src } => {
            lb.image = Some(ImageContent {
                src: src.clone(),
                width: pbox.width,
                height: pbox.height,
            });
        }
        BoxContent::ListItem { marker } => {
            // The marker is drawn in the left gutter; the item's own text
            // comes from its child boxes.
            let line_height = fonts.line_height_px(s.font_size, s.line_height);
            let mut content = text_content(s, Vec::new(), line_height, Some(marker.clone()));
            content.underline = false;
            lb.text = Some(content);
        }
        BoxContent::None => {}
    }

    for child in &pbox.children {
        let child_abs_y = abs_y + (child.y - pbox.y);
        lb.children.push(build_layout_box(child, child.x, child_abs_y, fonts));
    }

    lb
}
