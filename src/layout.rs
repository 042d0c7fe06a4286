//! Layout engine – uses Taffy to compute flexbox / grid layout from a styled
//! DOM tree, then converts the result into a tree of positioned boxes in
//! document coordinates.

use std::collections::HashMap;
use taffy::prelude::*;

use crate::dom::Tag;
use crate::fonts::{wrap_text, FontManager};
use crate::page::PageSetup;
use crate::resources::{ImageData, ImageStore};
use crate::style::{self, ComputedStyle, FontStyle as CssFontStyle, FontWeight, StyledNode};

// ---------------------------------------------------------------------------
// Intermediate layout tree (pre-pagination)
// ---------------------------------------------------------------------------

/// A positioned box in document coordinates (before page splitting).
#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub style: ComputedStyle,
    pub content: BoxContent,
    pub children: Vec<PositionedBox>,
    pub page_break_before: bool,
    pub page_break_after: bool,
    pub page_break_after_avoid: bool,
    pub page_break_inside_avoid: bool,
}

#[derive(Debug, Clone)]
pub enum BoxContent {
    None,
    Text {
        text: String,
        lines: Vec<String>,
    },
    Image {
        src: String,
    },
    /// List item marker
    ListItem {
        marker: String,
    },
}

fn layout_err(e: taffy::TaffyError) -> String {
    format!("layout failed: {e}")
}

// ---------------------------------------------------------------------------
// Build Taffy tree from styled nodes
// ---------------------------------------------------------------------------

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    fonts: &'a FontManager,
    images: &'a ImageStore,
    node_styles: HashMap<NodeId, ComputedStyle>,
    node_content: HashMap<NodeId, BoxContent>,
    available_width: f32,
}

impl<'a> LayoutBuilder<'a> {
    fn new(fonts: &'a FontManager, images: &'a ImageStore, available_width: f32) -> Self {
        Self {
            taffy: TaffyTree::new(),
            fonts,
            images,
            node_styles: HashMap::new(),
            node_content: HashMap::new(),
            available_width,
        }
    }

    /// Collect all text content from an inline subtree. `<br>` becomes a
    /// newline.
    fn collect_inline_text(node: &StyledNode) -> String {
        match node {
            StyledNode::Text { text, .. } => text.clone(),
            StyledNode::Element { tag: Tag::Br, .. } => "\n".to_string(),
            StyledNode::Element { children, .. } => children
                .iter()
                .map(Self::collect_inline_text)
                .collect::<Vec<_>>()
                .join(""),
        }
    }

    /// Return true when every child is a text node or a display:inline element
    /// (no block-level children).
    fn all_inline(children: &[StyledNode]) -> bool {
        children.iter().all(|c| match c {
            StyledNode::Text { .. } => true,
            StyledNode::Element {
                tag,
                style,
                children: gc,
                ..
            } => {
                *tag != Tag::Img
                    && matches!(
                        style.display,
                        style::Display::Inline | style::Display::InlineBlock
                    )
                    && Self::all_inline(gc)
            }
        })
    }

    fn build_node(&mut self, styled: &StyledNode, parent_width: f32) -> Result<NodeId, String> {
        match styled {
            StyledNode::Text { text, style } => self.build_text_node(text, style, parent_width, false),
            StyledNode::Element {
                tag,
                style,
                children,
                attrs,
            } => self.build_element_node(tag, style, children, attrs, parent_width),
        }
    }

    /// Build a wrapped text leaf. With `as_block` the leaf also carries the
    /// enclosing block's margin, padding and border, so a paragraph becomes a
    /// single box that stretches to its container.
    fn build_text_node(
        &mut self,
        text: &str,
        style: &ComputedStyle,
        parent_width: f32,
        as_block: bool,
    ) -> Result<NodeId, String> {
        let bold = style.font_weight == FontWeight::Bold;
        let italic = style.font_style == CssFontStyle::Italic;
        let family = &style.font_family;
        let font_size = style.font_size;
        let line_height_px = self.fonts.line_height_px(font_size, style.line_height);

        let (inset_x, inset_y, outset_x) = if as_block {
            (
                style.padding_left + style.padding_right + 2.0 * style.border_width,
                style.padding_top + style.padding_bottom + 2.0 * style.border_width,
                style.margin_left + style.margin_right,
            )
        } else {
            (0.0, 0.0, 0.0)
        };

        let avail = if parent_width > 0.0 {
            parent_width
        } else {
            self.available_width
        };
        let max_w = (avail - inset_x - outset_x).max(1.0);
        let lines = wrap_text(text.trim(), font_size, bold, italic, family, max_w, self.fonts);

        let text_width = lines
            .iter()
            .map(|l| self.fonts.measure_text_width(l, font_size, bold, italic, family))
            .fold(0.0f32, f32::max);
        let text_height = lines.len() as f32 * line_height_px;

        let taffy_style = if as_block {
            Style {
                size: Size {
                    width: Dimension::Auto,
                    height: Dimension::Length(text_height + inset_y),
                },
                min_size: Size {
                    width: Dimension::Length(text_width + inset_x),
                    height: Dimension::Auto,
                },
                margin: margin_rect(style),
                padding: padding_rect(style),
                border: border_rect(style),
                ..Default::default()
            }
        } else {
            Style {
                size: Size {
                    width: Dimension::Length(text_width),
                    height: Dimension::Length(text_height),
                },
                ..Default::default()
            }
        };

        let node = self.taffy.new_leaf(taffy_style).map_err(layout_err)?;
        self.node_styles.insert(node, style.clone());
        self.node_content.insert(
            node,
            BoxContent::Text {
                text: text.trim().to_string(),
                lines,
            },
        );
        Ok(node)
    }

    fn build_element_node(
        &mut self,
        tag: &Tag,
        style: &ComputedStyle,
        children: &[StyledNode],
        attrs: &HashMap<String, String>,
        parent_width: f32,
    ) -> Result<NodeId, String> {
        // A block whose children are all inline gets their text merged into
        // one wrapped text node so spans flow on the same line. Paragraphs
        // and headings become that text box themselves.
        let merged = if *tag != Tag::Img && !children.is_empty() && Self::all_inline(children) {
            merge_inline_text(children)
        } else {
            None
        };
        if let Some(combined) = merged.as_deref() {
            if *tag == Tag::P || tag.is_heading() {
                return self.build_text_node(combined, style, parent_width, true);
            }
        }

        // Compute the width available for children
        let my_width = match style.width {
            style::Dimension::Px(w) => w,
            style::Dimension::Percent(p) => parent_width * p / 100.0,
            style::Dimension::Auto => parent_width - style.margin_left - style.margin_right,
        };
        let inner_width =
            my_width - style.padding_left - style.padding_right - 2.0 * style.border_width;

        // Estimate per-child width for flex-row containers and table rows so
        // that text is word-wrapped to the right column width at build time.
        let is_flex_row = style.display == style::Display::Flex
            && style.flex_direction == style::FlexDirection::Row;
        let is_table_row = *tag == Tag::Tr;

        let elem_child_count = children
            .iter()
            .filter(|c| matches!(c, StyledNode::Element { .. }))
            .count()
            .max(1);

        let child_build_width = if is_flex_row || is_table_row {
            let gap_total = style.gap * (elem_child_count.saturating_sub(1)) as f32;
            ((inner_width - gap_total) / elem_child_count as f32).max(1.0)
        } else {
            inner_width.max(1.0)
        };

        // Build child nodes
        let mut child_nodes = Vec::new();
        let mut list_counter = 0u32;

        let block_children = match merged.as_deref() {
            Some(combined) => {
                let text = self.build_text_node(combined, &style.for_inline_text(), child_build_width, true)?;
                child_nodes.push(text);
                &[][..]
            }
            None => children,
        };

        for child in block_children {
            // For list items, compute and record the marker string so it can
            // be rendered as a bullet / number in the left gutter.
            let li_marker = match child {
                StyledNode::Element { tag: Tag::Li, .. } => {
                    list_counter += 1;
                    Some(if *tag == Tag::Ol {
                        format!("{}. ", list_counter)
                    } else {
                        "\u{2022} ".to_string()
                    })
                }
                _ => None,
            };

            let child_id = self.build_node(child, child_build_width)?;

            if let Some(marker) = li_marker {
                self.node_content
                    .insert(child_id, BoxContent::ListItem { marker });
            }

            child_nodes.push(child_id);
        }

        if style.border_collapse {
            self.collapse_borders(tag, children, &child_nodes)?;
        }

        // <img> gets concrete dimensions from its intrinsic size, otherwise
        // a childless box with auto size collapses to 0×0.
        let style_override = if *tag == Tag::Img {
            let data = attrs.get("src").and_then(|src| self.images.get(src.trim()));
            data.and_then(|d| resolve_img_dimensions(d, style, parent_width))
        } else {
            None
        };

        let effective_style = style_override.as_ref().unwrap_or(style);
        let taffy_style = self.computed_to_taffy(effective_style, tag);
        let node = self
            .taffy
            .new_with_children(taffy_style, &child_nodes)
            .map_err(layout_err)?;
        self.node_styles.insert(node, effective_style.clone());

        if *tag == Tag::Img {
            let src = attrs.get("src").map(|s| s.trim().to_string()).unwrap_or_default();
            self.node_content.insert(node, BoxContent::Image { src });
        }

        Ok(node)
    }

    /// Shared table borders: every cell after the first in a row, and every
    /// row after the first, is pulled back over its neighbour's border.
    fn collapse_borders(&mut self, tag: &Tag, children: &[StyledNode], child_nodes: &[NodeId]) -> Result<(), String> {
        for (child, &node) in children.iter().zip(child_nodes).skip(1) {
            let overlap = match (tag, child) {
                (Tag::Tr, StyledNode::Element { tag: Tag::Td | Tag::Th, style, .. }) => style.border_width,
                (Tag::Table, StyledNode::Element { tag: Tag::Tr, children: cells, .. }) => cells
                    .iter()
                    .map(|cell| match cell {
                        StyledNode::Element { style, .. } => style.border_width,
                        StyledNode::Text { .. } => 0.0,
                    })
                    .fold(0.0, f32::max),
                _ => continue,
            };
            if overlap <= 0.0 {
                continue;
            }
            let mut ts = self.taffy.style(node).map_err(layout_err)?.clone();
            if *tag == Tag::Tr {
                ts.margin.left = LengthPercentageAuto::Length(-overlap);
            } else {
                ts.margin.top = LengthPercentageAuto::Length(-overlap);
            }
            self.taffy.set_style(node, ts).map_err(layout_err)?;
        }
        Ok(())
    }

    fn computed_to_taffy(&self, s: &ComputedStyle, tag: &Tag) -> Style {
        let mut ts = Style::default();

        // HTML table model: always use flex regardless of computed display.
        match tag {
            Tag::Table => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
                ts.size.width = self.dim_to_taffy(s.width);
                ts.size.height = self.dim_to_taffy(s.height);
                ts.min_size.width = taffy::Dimension::Length(0.0);
                ts.padding = padding_rect(s);
                ts.margin = margin_rect(s);
                ts.border = border_rect(s);
                return ts;
            }
            Tag::Tr => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Row;
                ts.align_items = Some(taffy::AlignItems::Stretch);
                ts.size.width = taffy::Dimension::Percent(1.0);
                ts.min_size.width = taffy::Dimension::Length(0.0);
                ts.margin = margin_rect(s);
                return ts;
            }
            Tag::Td | Tag::Th => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
                ts.flex_grow = 1.0;
                ts.flex_shrink = 1.0;
                ts.flex_basis = taffy::Dimension::Length(0.0); // equal columns
                ts.min_size.width = taffy::Dimension::Length(0.0);
                ts.padding = padding_rect(s);
                ts.border = border_rect(s);
                return ts;
            }
            _ => {}
        }

        // Display / layout mode
        match s.display {
            style::Display::Flex => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = match s.flex_direction {
                    style::FlexDirection::Row => taffy::FlexDirection::Row,
                    style::FlexDirection::Column => taffy::FlexDirection::Column,
                };
                ts.flex_wrap = match s.flex_wrap {
                    style::FlexWrap::NoWrap => taffy::FlexWrap::NoWrap,
                    style::FlexWrap::Wrap => taffy::FlexWrap::Wrap,
                };
                ts.justify_content = Some(match s.justify_content {
                    style::JustifyContent::Start => taffy::JustifyContent::Start,
                    style::JustifyContent::End => taffy::JustifyContent::End,
                    style::JustifyContent::Center => taffy::JustifyContent::Center,
                    style::JustifyContent::SpaceBetween => taffy::JustifyContent::SpaceBetween,
                    style::JustifyContent::SpaceAround => taffy::JustifyContent::SpaceAround,
                    style::JustifyContent::SpaceEvenly => taffy::JustifyContent::SpaceEvenly,
                });
                ts.align_items = Some(match s.align_items {
                    style::AlignItems::Start => taffy::AlignItems::Start,
                    style::AlignItems::End => taffy::AlignItems::End,
                    style::AlignItems::Center => taffy::AlignItems::Center,
                    style::AlignItems::Stretch => taffy::AlignItems::Stretch,
                });
            }
            style::Display::Grid => {
                ts.display = taffy::Display::Grid;
                let cols = s.grid_columns.max(1);
                ts.grid_template_columns = vec![taffy::TrackSizingFunction::from_flex(1.0); cols];
            }
            style::Display::Block
            | style::Display::ListItem
            | style::Display::TableRow
            | style::Display::TableCell
            | style::Display::InlineBlock => {
                // Use flex column for block-level elements (vertical stacking)
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
            }
            style::Display::Inline => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Row;
                ts.flex_wrap = taffy::FlexWrap::Wrap;
            }
            style::Display::None => {
                ts.display = taffy::Display::None;
            }
        }

        ts.size = Size {
            width: self.dim_to_taffy(s.width),
            height: self.dim_to_taffy(s.height),
        };
        // Allow flex/shrink items to compress below their natural content size
        ts.min_size = Size {
            width: if s.flex_shrink > 0.0 || s.flex_grow > 0.0 {
                taffy::Dimension::Length(0.0)
            } else {
                self.dim_to_taffy(s.min_width)
            },
            height: taffy::Dimension::Auto,
        };
        ts.max_size = Size {
            width: self.dim_to_taffy(s.max_width),
            height: taffy::Dimension::Auto,
        };

        ts.flex_grow = s.flex_grow;
        ts.flex_shrink = s.flex_shrink;
        ts.margin = margin_rect(s);
        ts.padding = padding_rect(s);
        ts.border = border_rect(s);
        ts.gap = Size {
            width: LengthPercentage::Length(s.gap),
            height: LengthPercentage::Length(s.gap),
        };

        ts
    }

    fn dim_to_taffy(&self, d: style::Dimension) -> taffy::Dimension {
        match d {
            style::Dimension::Auto => taffy::Dimension::Auto,
            style::Dimension::Px(v) => taffy::Dimension::Length(v),
            style::Dimension::Percent(v) => taffy::Dimension::Percent(v / 100.0),
        }
    }

    /// Extract positioned boxes after layout computation.
    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> Result<PositionedBox, String> {
        let layout = self.taffy.layout(node).map_err(layout_err)?;
        let style = self.node_styles.get(&node).cloned().unwrap_or_default();
        let content = self
            .node_content
            .get(&node)
            .cloned()
            .unwrap_or(BoxContent::None);

        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;

        let children = self
            .taffy
            .children(node)
            .map_err(layout_err)?
            .iter()
            .map(|&child| self.extract(child, x, y))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PositionedBox {
            x,
            y,
            width: layout.size.width,
            height: layout.size.height,
            page_break_before: style.page_break_before,
            page_break_after: style.page_break_after,
            page_break_after_avoid: style.page_break_after_avoid,
            page_break_inside_avoid: style.page_break_inside_avoid,
            style,
            content,
            children,
        })
    }
}

/// Flatten inline children to one string, collapsing whitespace within each
/// line and keeping `<br>` breaks. `None` when there is no visible text.
fn merge_inline_text(children: &[StyledNode]) -> Option<String> {
    let raw: String = children.iter().map(LayoutBuilder::collect_inline_text).collect();
    let combined = raw
        .split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n");
    (!combined.trim().is_empty()).then_some(combined)
}

fn margin_rect(s: &ComputedStyle) -> Rect<LengthPercentageAuto> {
    Rect {
        top: LengthPercentageAuto::Length(s.margin_top),
        right: LengthPercentageAuto::Length(s.margin_right),
        bottom: LengthPercentageAuto::Length(s.margin_bottom),
        left: LengthPercentageAuto::Length(s.margin_left),
    }
}

fn padding_rect(s: &ComputedStyle) -> Rect<LengthPercentage> {
    Rect {
        top: LengthPercentage::Length(s.padding_top),
        right: LengthPercentage::Length(s.padding_right),
        bottom: LengthPercentage::Length(s.padding_bottom),
        left: LengthPercentage::Length(s.padding_left),
    }
}

fn border_rect(s: &ComputedStyle) -> Rect<LengthPercentage> {
    Rect {
        top: LengthPercentage::Length(s.border_width),
        right: LengthPercentage::Length(s.border_width),
        bottom: LengthPercentage::Length(s.border_width),
        left: LengthPercentage::Length(s.border_width),
    }
}

// ---------------------------------------------------------------------------
// Image intrinsic-size helper
// ---------------------------------------------------------------------------

/// Return a cloned [`ComputedStyle`] with `Auto` width/height replaced by
/// concrete values from the image's intrinsic size (1 px = 1 pt), scaled
/// down to honour `max-width`. `None` when nothing needs changing.
fn resolve_img_dimensions(
    img: &ImageData,
    style: &ComputedStyle,
    parent_width: f32,
) -> Option<ComputedStyle> {
    let (px_w, px_h) = (img.px_width as f32, img.px_height as f32);
    let aspect = px_w / px_h;

    let known_w = match style.width {
        style::Dimension::Px(v) => Some(v),
        style::Dimension::Percent(p) => Some(parent_width * p / 100.0),
        style::Dimension::Auto => None,
    };
    let known_h = match style.height {
        style::Dimension::Px(v) => Some(v),
        _ => None,
    };
    let max_w = match style.max_width {
        style::Dimension::Px(v) => Some(v),
        style::Dimension::Percent(p) => Some(parent_width * p / 100.0),
        style::Dimension::Auto => None,
    };

    let (mut w, mut h) = match (known_w, known_h) {
        (Some(w), None) => (w, (w / aspect).max(1.0)),
        (None, Some(h)) => ((h * aspect).max(1.0), h),
        (None, None) => (px_w, px_h),
        (Some(w), Some(h)) => (w, h),
    };
    if let Some(max_w) = max_w.filter(|m| *m > 0.0 && w > *m) {
        // Keep the aspect ratio unless both sides were given explicitly.
        if known_h.is_none() || known_w.is_none() {
            h = (h * max_w / w).max(1.0);
        }
        w = max_w;
    }
    if known_w == Some(w) && known_h == Some(h) {
        return None;
    }
    let mut s = style.clone();
    s.width = style::Dimension::Px(w);
    s.height = style::Dimension::Px(h);
    Some(s)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute layout for a styled tree, returning the top-level positioned boxes
/// in document coordinates. `x` is page-absolute; `y` starts at 0 for the top
/// of the content area.
pub fn compute_layout(
    styled_nodes: &[StyledNode],
    page: &PageSetup,
    fonts: &FontManager,
    images: &ImageStore,
) -> Result<Vec<PositionedBox>, String> {
    let content_width = page.content_width();
    let mut builder = LayoutBuilder::new(fonts, images, content_width);

    let child_ids = styled_nodes
        .iter()
        .map(|node| builder.build_node(node, content_width))
        .collect::<Result<Vec<_>, _>>()?;

    let root_style = Style {
        display: taffy::Display::Flex,
        flex_direction: taffy::FlexDirection::Column,
        size: Size {
            width: taffy::Dimension::Length(content_width),
            height: taffy::Dimension::Auto,
        },
        ..Default::default()
    };

    let root = builder
        .taffy
        .new_with_children(root_style, &child_ids)
        .map_err(layout_err)?;

    builder
        .taffy
        .compute_layout(
            root,
            Size {
                width: AvailableSpace::Definite(content_width),
                height: AvailableSpace::MaxContent,
            },
        )
        .map_err(layout_err)?;

    let root_box = builder.extract(root, page.margin_left, 0.0)?;
    Ok(root_box.children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::Stylesheet;
    use crate::dom::parse_html;
    use crate::style::Cascade;

    fn layout(html: &str, css: &str) -> Vec<PositionedBox> {
        layout_with_images(html, css, &ImageStore::default())
    }

    fn layout_with_images(html: &str, css: &str, images: &ImageStore) -> Vec<PositionedBox> {
        let sheet = Stylesheet::parse(css);
        let styled = Cascade::new(vec![&sheet]).style_document(&parse_html(html));
        let page = PageSetup::from_stylesheets(&[&sheet]);
        compute_layout(&styled, &page, &FontManager::default(), images).unwrap()
    }

    #[test]
    fn layout_simple_paragraph() {
        let boxes = layout("<p>Hello world</p>", "");
        assert!(!boxes.is_empty(), "Should produce at least one box");
        let first = &boxes[0];
        assert!(first.width > 0.0, "Box should have width");
        assert!(first.height > 0.0, "Box should have height");
        assert_eq!(first.x, 40.0);
    }

    #[test]
    fn layout_flex_row() {
        let boxes = layout(
            r#"<div class="row"><div class="cell">A</div><div class="cell">B</div></div>"#,
            ".row { display: flex } .cell { flex: 1 }",
        );
        assert_eq!(boxes[0].children.len(), 2);
        let (a, b) = (&boxes[0].children[0], &boxes[0].children[1]);
        assert!((a.width - b.width).abs() < 0.5);
        assert!(b.x > a.x);
    }

    #[test]
    fn paragraph_uses_page_margins() {
        let boxes = layout("<p>x</p>", "@page { size: letter; margin: 1in }");
        assert_eq!(boxes[0].x, 72.0);
        assert!((boxes[0].width - (612.0 - 144.0)).abs() < 0.5);
    }

    #[test]
    fn line_breaks_are_kept() {
        let boxes = layout("<p>one<br>two<br/>three</p>", "");
        let BoxContent::Text { lines, .. } = &boxes[0].content else {
            panic!("Expected merged paragraph text");
        };
        assert_eq!(lines, &vec!["one", "two", "three"]);
    }

    fn text_lines(pbox: &PositionedBox, out: &mut Vec<Vec<String>>) {
        if let BoxContent::Text { lines, .. } = &pbox.content {
            out.push(lines.clone());
        }
        for child in &pbox.children {
            text_lines(child, out);
        }
    }

    #[test]
    fn inline_runs_in_a_cell_share_one_line() {
        let boxes = layout("<table><tr><td>Total: <b>42</b> units</td></tr></table>", "");
        let mut found = Vec::new();
        text_lines(&boxes[0], &mut found);
        assert_eq!(found, vec![vec!["Total: 42 units".to_string()]]);
    }

    #[test]
    fn merged_div_keeps_its_own_box() {
        let boxes = layout(
            r#"<div style="height: 200px; background: #eee">Plain <em>and</em> styled</div>"#,
            "",
        );
        assert!((boxes[0].height - 200.0).abs() < 0.5);
        assert_eq!(boxes[0].children.len(), 1);
        let text = &boxes[0].children[0];
        assert!(matches!(&text.content, BoxContent::Text { lines, .. } if lines == &["Plain and styled"]));
        assert!(text.style.background_color.is_transparent());
    }

    #[test]
    fn collapsed_borders_are_shared() {
        let html = "<table><tr><td>A</td><td>B</td></tr><tr><td>C</td><td>D</td></tr></table>";
        let cells = "td { border: 2px solid #000; padding: 4px }";

        let separate = layout(html, cells);
        let (a, b) = (&separate[0].children[0].children[0], &separate[0].children[0].children[1]);
        assert!((b.x - (a.x + a.width)).abs() < 0.01);

        let collapsed = layout(html, &format!("table {{ border-collapse: collapse }} {cells}"));
        let rows = &collapsed[0].children;
        let (a, b) = (&rows[0].children[0], &rows[0].children[1]);
        assert!((b.x - (a.x + a.width - 2.0)).abs() < 0.01);
        assert!((rows[1].y - (rows[0].y + rows[0].height - 2.0)).abs() < 0.01);
        let row_width = rows[0].width;
        let right_edge = b.x + b.width;
        assert!((right_edge - (rows[0].x + row_width)).abs() < 0.01);
    }

    #[test]
    fn heading_keeps_avoid_flag() {
        let boxes = layout("<h2>Title</h2><p>Body</p>", "h2 { page-break-after: avoid }");
        assert!(boxes[0].page_break_after_avoid);
        assert!(!boxes[1].page_break_after_avoid);
    }

    #[test]
    fn image_respects_max_width() {
        let img = ::image::RgbImage::new(2000, 1000);
        let mut png = std::io::Cursor::new(Vec::new());
        ::image::DynamicImage::ImageRgb8(img)
            .write_to(&mut png, ::image::ImageFormat::Png)
            .unwrap();
        let mut images = ImageStore::default();
        images.insert("wide.png", png.into_inner()).unwrap();

        let boxes = layout_with_images(
            r#"<div><img src="wide.png"></div>"#,
            "img { max-width: 100% }",
            &images,
        );
        let img_box = &boxes[0].children[0];
        assert!((img_box.width - (595.28 - 80.0)).abs() < 0.5);
        assert!((img_box.height - img_box.width / 2.0).abs() < 0.5);
    }
}
