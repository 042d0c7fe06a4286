//! Style resolver – runs the cascade over the DOM and produces a flat
//! [`ComputedStyle`] per element for the layout engine.
//!
//! Precedence, lowest first: tag defaults, stylesheet rules (by specificity,
//! then source order across the sheets in the order given), the `style`
//! attribute, then `!important` declarations in the same order.

use std::collections::HashMap;

use crate::css::{self, parse_abs_length, parse_declarations, Declaration, Length, Specificity, Stylesheet};
use crate::dom::{DomNode, ElementNode, Tag};

/// Fully resolved style for a single element.
#[derive(Debug, Clone)]
pub struct ComputedStyle {
    // Display / layout
    pub display: Display,
    pub flex_direction: FlexDirection,
    pub flex_wrap: FlexWrap,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub gap: f32,

    // Grid
    pub grid_columns: usize,

    // Sizing
    pub width: Dimension,
    pub height: Dimension,
    pub min_width: Dimension,
    pub max_width: Dimension,

    // Spacing (pt)
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub padding_top: f32,
    pub padding_right: f32,
    pub padding_bottom: f32,
    pub padding_left: f32,

    // Border
    pub border_width: f32,
    pub border_color: Color,
    /// Table cells share borders with their neighbours (inherited).
    pub border_collapse: bool,

    // Typography
    pub font_size: f32,
    pub font_weight: FontWeight,
    /// One of the builtin families: "Helvetica", "Times" or "Courier".
    pub font_family: String,
    pub color: Color,
    pub text_align: TextAlign,
    pub line_height: f32,
    pub text_decoration: TextDecoration,
    pub font_style: FontStyle,

    // Background
    pub background_color: Color,

    // Page break
    pub page_break_before: bool,
    pub page_break_after: bool,
    pub page_break_after_avoid: bool,
    pub page_break_inside_avoid: bool,
}

impl ComputedStyle {
    /// The style of anonymous inline text inside this box: typography only.
    pub fn for_inline_text(&self) -> Self {
        Self {
            border_width: 0.0,
            background_color: Color::TRANSPARENT,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            padding_top: 0.0,
            padding_right: 0.0,
            padding_bottom: 0.0,
            padding_left: 0.0,
            width: Dimension::Auto,
            height: Dimension::Auto,
            page_break_before: false,
            page_break_after: false,
            page_break_after_avoid: false,
            ..self.clone()
        }
    }
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            flex_direction: FlexDirection::Row,
            flex_wrap: FlexWrap::NoWrap,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            gap: 0.0,
            grid_columns: 0,
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_width: Dimension::Auto,
            max_width: Dimension::Auto,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            padding_top: 0.0,
            padding_right: 0.0,
            padding_bottom: 0.0,
            padding_left: 0.0,
            border_width: 0.0,
            border_color: Color::BLACK,
            border_collapse: false,
            font_size: 16.0,
            font_weight: FontWeight::Normal,
            font_family: "Helvetica".to_string(),
            color: Color::BLACK,
            text_align: TextAlign::Left,
            line_height: 1.4,
            text_decoration: TextDecoration::None,
            font_style: FontStyle::Normal,
            background_color: Color::TRANSPARENT,
            page_break_before: false,
            page_break_after: false,
            page_break_after_avoid: false,
            page_break_inside_avoid: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Supporting enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Flex,
    Grid,
    Inline,
    InlineBlock,
    ListItem,
    TableRow,
    TableCell,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexDirection {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexWrap {
    NoWrap,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JustifyContent {
    Start,
    End,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignItems {
    Start,
    End,
    Center,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDecoration {
    None,
    Underline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Px(f32),
    Percent(f32),
}

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
        match hex.len() {
            6 | 8 => {
                let mut c = Self::rgb(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?);
                if hex.len() == 8 {
                    c.a = channel(&hex[6..8])?;
                }
                Some(c)
            }
            3 | 4 => {
                let mut c = Self::rgb(
                    channel(&hex[0..1].repeat(2))?,
                    channel(&hex[1..2].repeat(2))?,
                    channel(&hex[2..3].repeat(2))?,
                );
                if hex.len() == 4 {
                    c.a = channel(&hex[3..4].repeat(2))?;
                }
                Some(c)
            }
            _ => None,
        }
    }

    /// Parse `#hex`, `rgb()`/`rgba()` or a named colour.
    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim().to_ascii_lowercase();
        if v.starts_with('#') {
            return Self::from_hex(&v);
        }
        if let Some(args) = v
            .strip_prefix("rgba(")
            .or_else(|| v.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<&str> = args
                .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
                .filter(|p| !p.is_empty())
                .collect();
            if parts.len() < 3 {
                return None;
            }
            let channel = |p: &str| -> Option<f32> {
                match p.strip_suffix('%') {
                    Some(pct) => pct.parse::<f32>().ok().map(|x| x / 100.0),
                    None => p.parse::<f32>().ok().map(|x| x / 255.0),
                }
            };
            let mut c = Self::rgb(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?);
            if let Some(alpha) = parts.get(3) {
                c.a = match alpha.strip_suffix('%') {
                    Some(pct) => pct.parse::<f32>().ok()? / 100.0,
                    None => alpha.parse().ok()?,
                };
            }
            return Some(c);
        }
        let named = match v.as_str() {
            "transparent" => Self::TRANSPARENT,
            "black" => Self::BLACK,
            "white" => Self::WHITE,
            "red" => Self::rgb(1.0, 0.0, 0.0),
            "green" => Self::rgb(0.0, 0.502, 0.0),
            "blue" => Self::rgb(0.0, 0.0, 1.0),
            "navy" => Self::rgb(0.0, 0.0, 0.502),
            "gray" | "grey" => Self::rgb(0.502, 0.502, 0.502),
            "silver" => Self::rgb(0.753, 0.753, 0.753),
            "lightgray" | "lightgrey" => Self::rgb(0.827, 0.827, 0.827),
            "darkgray" | "darkgrey" => Self::rgb(0.663, 0.663, 0.663),
            "maroon" => Self::rgb(0.502, 0.0, 0.0),
            "orange" => Self::rgb(1.0, 0.647, 0.0),
            "yellow" => Self::rgb(1.0, 1.0, 0.0),
            "purple" => Self::rgb(0.502, 0.0, 0.502),
            "teal" => Self::rgb(0.0, 0.502, 0.502),
            _ => return None,
        };
        Some(named)
    }
}

// ---------------------------------------------------------------------------
// Cascade
// ---------------------------------------------------------------------------

/// `(important, inline, specificity, sheet, rule, declaration)`
type CascadeKey = (bool, bool, Specificity, usize, usize, usize);

/// The ordered set of stylesheets applied to a document.
pub struct Cascade<'a> {
    sheets: Vec<&'a Stylesheet>,
}

impl<'a> Cascade<'a> {
    pub fn new(sheets: Vec<&'a Stylesheet>) -> Self {
        Self { sheets }
    }

    /// Resolve the style of `element`. `ancestors` runs from the root down
    /// to the element's parent.
    pub fn compute(
        &self,
        element: &ElementNode,
        ancestors: &[&ElementNode],
        parent: Option<&ComputedStyle>,
    ) -> ComputedStyle {
        let mut style = ComputedStyle::default();
        if let Some(p) = parent {
            inherit(&mut style, p);
        }
        let parent_font_size = style.font_size;
        apply_tag_defaults(&mut style, &element.tag);

        let mut chain: Vec<&ElementNode> = ancestors.to_vec();
        chain.push(element);

        let mut matched: Vec<(CascadeKey, &Declaration)> = Vec::new();
        for (sheet_idx, sheet) in self.sheets.iter().enumerate() {
            for (rule_idx, rule) in sheet.rules.iter().enumerate() {
                let specificity = rule
                    .selectors
                    .iter()
                    .filter(|s| s.matches(&chain))
                    .map(|s| s.specificity())
                    .max();
                let Some(specificity) = specificity else {
                    continue;
                };
                for (decl_idx, decl) in rule.declarations.iter().enumerate() {
                    matched.push((
                        (decl.important, false, specificity, sheet_idx, rule_idx, decl_idx),
                        decl,
                    ));
                }
            }
        }

        let inline = element.inline_style().map(parse_declarations).unwrap_or_default();
        for (decl_idx, decl) in inline.iter().enumerate() {
            matched.push((
                (decl.important, true, Specificity::default(), 0, 0, decl_idx),
                decl,
            ));
        }

        matched.sort_by(|a, b| a.0.cmp(&b.0));

        // font-size first so em lengths in the other declarations see it.
        for (_, decl) in matched.iter().filter(|(_, d)| d.property == "font-size") {
            apply_font_size(&mut style, &decl.value, parent_font_size);
        }
        for (_, decl) in matched.iter().filter(|(_, d)| d.property != "font-size") {
            apply_css_property(&mut style, &decl.property, &decl.value);
        }
        style
    }

    /// Style a whole document. `html` and `body` are resolved first so their
    /// inherited properties reach the content; the returned nodes are the
    /// children of `body` (or of the top level when there is no body).
    pub fn style_document(&self, nodes: &[DomNode]) -> Vec<StyledNode> {
        let mut ancestors: Vec<&ElementNode> = Vec::new();
        let mut parent: Option<ComputedStyle> = None;
        let mut current = nodes;
        while let Some(root) = current.iter().find_map(|n| match n {
            DomNode::Element(e) if matches!(e.tag, Tag::Html | Tag::Body) => Some(e),
            _ => None,
        }) {
            let style = self.compute(root, &ancestors, parent.as_ref());
            ancestors.push(root);
            parent = Some(style);
            current = &root.children;
            if root.tag == Tag::Body {
                break;
            }
        }
        self.build_styled_tree(current, parent.as_ref(), &mut ancestors)
    }

    /// Build a styled tree from a DOM tree, resolving styles top-down.
    /// Elements with `display: none` are dropped with their subtree.
    pub fn build_styled_tree<'n>(
        &self,
        nodes: &'n [DomNode],
        parent_style: Option<&ComputedStyle>,
        ancestors: &mut Vec<&'n ElementNode>,
    ) -> Vec<StyledNode> {
        let mut result = Vec::new();
        for node in nodes {
            match node {
                DomNode::Element(e) => {
                    let style = self.compute(e, ancestors, parent_style);
                    if style.display == Display::None {
                        continue;
                    }
                    ancestors.push(e);
                    let children = self.build_styled_tree(&e.children, Some(&style), ancestors);
                    ancestors.pop();
                    result.push(StyledNode::Element {
                        tag: e.tag.clone(),
                        style,
                        children,
                        attrs: e.attributes.clone(),
                    });
                }
                DomNode::Text(text) => {
                    if text.trim().is_empty() {
                        continue;
                    }
                    let style = parent_style.map(ComputedStyle::for_inline_text).unwrap_or_default();
                    result.push(StyledNode::Text {
                        text: text.clone(),
                        style,
                    });
                }
            }
        }
        result
    }
}

fn inherit(s: &mut ComputedStyle, p: &ComputedStyle) {
    s.font_size = p.font_size;
    s.font_weight = p.font_weight;
    s.font_family = p.font_family.clone();
    s.color = p.color;
    s.text_align = p.text_align;
    s.line_height = p.line_height;
    s.font_style = p.font_style;
    s.border_collapse = p.border_collapse;
}

/// User-agent defaults based on tag semantics.
fn apply_tag_defaults(s: &mut ComputedStyle, tag: &Tag) {
    let heading = |s: &mut ComputedStyle, scale: f32| {
        s.font_size *= scale;
        s.font_weight = FontWeight::Bold;
        s.margin_top = 0.67 * s.font_size;
        s.margin_bottom = 0.5 * s.font_size;
    };
    match tag {
        Tag::H1 => heading(s, 2.0),
        Tag::H2 => heading(s, 1.5),
        Tag::H3 => heading(s, 1.25),
        Tag::H4 => heading(s, 1.0),
        Tag::H5 => heading(s, 0.875),
        Tag::H6 => heading(s, 0.75),
        Tag::P => {
            s.margin_top = 0.0;
            s.margin_bottom = 10.0;
        }
        Tag::Ul | Tag::Ol => {
            s.margin_top = 0.0;
            s.margin_bottom = 10.0;
            s.padding_left = 24.0;
        }
        Tag::Li => {
            s.display = Display::ListItem;
            s.margin_bottom = 4.0;
        }
        Tag::Table => {
            // Grid marks the box as splittable by row during pagination.
            s.display = Display::Grid;
        }
        Tag::Tr => {
            s.display = Display::TableRow;
        }
        Tag::Td | Tag::Th => {
            s.display = Display::TableCell;
            s.padding_top = 4.0;
            s.padding_right = 8.0;
            s.padding_bottom = 4.0;
            s.padding_left = 8.0;
            if *tag == Tag::Th {
                s.font_weight = FontWeight::Bold;
            }
        }
        Tag::Span | Tag::Br => {
            s.display = Display::Inline;
        }
        Tag::Strong => {
            s.display = Display::Inline;
            s.font_weight = FontWeight::Bold;
        }
        Tag::Em => {
            s.display = Display::Inline;
            s.font_style = FontStyle::Italic;
        }
        Tag::U => {
            s.display = Display::Inline;
            s.text_decoration = TextDecoration::Underline;
        }
        Tag::A => {
            s.display = Display::Inline;
            s.text_decoration = TextDecoration::Underline;
            s.color = Color::rgb(0.0, 0.0, 0.933);
        }
        Tag::Img => {
            s.display = Display::InlineBlock;
        }
        Tag::Hr => {
            s.margin_top = 8.0;
            s.margin_bottom = 8.0;
            s.border_width = 1.0;
            s.border_color = Color::rgb(0.5, 0.5, 0.5);
            s.height = Dimension::Px(0.0);
        }
        Tag::Div | Tag::Section | Tag::Body | Tag::Html | Tag::Thead | Tag::Tbody | Tag::Tfoot => {}
        Tag::Head | Tag::Title | Tag::Style | Tag::Link | Tag::Meta | Tag::Script | Tag::Unknown(_) => {
            // Metadata and unrecognised elements are not rendered.
            s.display = Display::None;
        }
    }
}

fn apply_font_size(s: &mut ComputedStyle, val: &str, parent_font_size: f32) {
    let keyword = match val.trim() {
        "xx-small" => Some(9.0),
        "x-small" => Some(10.0),
        "small" => Some(13.0),
        "medium" => Some(16.0),
        "large" => Some(18.0),
        "x-large" => Some(24.0),
        "xx-large" => Some(32.0),
        "smaller" => Some(parent_font_size / 1.2),
        "larger" => Some(parent_font_size * 1.2),
        _ => None,
    };
    let size = keyword.or_else(|| match css::parse_length(val, parent_font_size)? {
        Length::Pt(v) => Some(v),
        Length::Percent(p) => Some(parent_font_size * p / 100.0),
    });
    if let Some(size) = size.filter(|v| *v > 0.0) {
        s.font_size = size;
    }
}

fn apply_css_property(s: &mut ComputedStyle, prop: &str, val: &str) {
    if matches!(val, "inherit" | "initial" | "unset") {
        return;
    }
    let fs = s.font_size;
    let px = |v: &str| parse_abs_length(v, fs);
    match prop {
        "display" => {
            s.display = match val {
                "flex" | "inline-flex" => Display::Flex,
                "grid" => Display::Grid,
                "block" | "table" => Display::Block,
                "inline" => Display::Inline,
                "inline-block" => Display::InlineBlock,
                "list-item" => Display::ListItem,
                "table-row" => Display::TableRow,
                "table-cell" => Display::TableCell,
                "none" => Display::None,
                _ => s.display,
            }
        }
        "flex-direction" => {
            s.flex_direction = match val {
                "row" | "row-reverse" => FlexDirection::Row,
                "column" | "column-reverse" => FlexDirection::Column,
                _ => s.flex_direction,
            }
        }
        "flex-wrap" => {
            s.flex_wrap = match val {
                "wrap" | "wrap-reverse" => FlexWrap::Wrap,
                _ => FlexWrap::NoWrap,
            }
        }
        "flex-grow" => {
            if let Ok(v) = val.parse() {
                s.flex_grow = v;
            }
        }
        "flex-shrink" => {
            if let Ok(v) = val.parse() {
                s.flex_shrink = v;
            }
        }
        "flex" => {
            let parts = css::split_value(val);
            if let Some(Ok(grow)) = parts.first().map(|p| p.parse::<f32>()) {
                s.flex_grow = grow;
                s.flex_shrink = parts.get(1).and_then(|p| p.parse().ok()).unwrap_or(1.0);
            } else if val == "none" {
                s.flex_grow = 0.0;
                s.flex_shrink = 0.0;
            }
        }
        "justify-content" => {
            s.justify_content = match val {
                "flex-start" | "start" | "left" => JustifyContent::Start,
                "flex-end" | "end" | "right" => JustifyContent::End,
                "center" => JustifyContent::Center,
                "space-between" => JustifyContent::SpaceBetween,
                "space-around" => JustifyContent::SpaceAround,
                "space-evenly" => JustifyContent::SpaceEvenly,
                _ => s.justify_content,
            }
        }
        "align-items" => {
            s.align_items = match val {
                "flex-start" | "start" => AlignItems::Start,
                "flex-end" | "end" => AlignItems::End,
                "center" => AlignItems::Center,
                "stretch" => AlignItems::Stretch,
                _ => s.align_items,
            }
        }
        "grid-template-columns" => {
            s.grid_columns = count_grid_tracks(val);
        }
        "font-weight" => {
            s.font_weight = match val {
                "bold" | "bolder" | "600" | "700" | "800" | "900" => FontWeight::Bold,
                _ => FontWeight::Normal,
            }
        }
        "font-style" => {
            s.font_style = match val {
                "italic" | "oblique" => FontStyle::Italic,
                _ => FontStyle::Normal,
            }
        }
        "font-family" => {
            if let Some(family) = builtin_family(val) {
                s.font_family = family.to_string();
            }
        }
        "color" => {
            if let Some(c) = Color::parse(val) {
                s.color = c;
            }
        }
        "background-color" => {
            if let Some(c) = Color::parse(val) {
                s.background_color = c;
            }
        }
        "background" => {
            if let Some(c) = css::split_value(val).into_iter().find_map(Color::parse) {
                s.background_color = c;
            } else if val == "none" {
                s.background_color = Color::TRANSPARENT;
            }
        }
        "text-align" => {
            s.text_align = match val {
                "center" => TextAlign::Center,
                "right" | "end" => TextAlign::Right,
                _ => TextAlign::Left,
            }
        }
        "text-decoration" | "text-decoration-line" => {
            s.text_decoration = if val.split_whitespace().any(|t| t == "underline") {
                TextDecoration::Underline
            } else {
                TextDecoration::None
            }
        }
        "width" => s.width = parse_dimension(val, fs),
        "height" => s.height = parse_dimension(val, fs),
        "min-width" => s.min_width = parse_dimension(val, fs),
        "max-width" => {
            s.max_width = if val == "none" {
                Dimension::Auto
            } else {
                parse_dimension(val, fs)
            }
        }
        "margin" => apply_shorthand_spacing(
            val,
            fs,
            [
                &mut s.margin_top,
                &mut s.margin_right,
                &mut s.margin_bottom,
                &mut s.margin_left,
            ],
        ),
        "margin-top" => set_if(&mut s.margin_top, px(val)),
        "margin-right" => set_if(&mut s.margin_right, px(val)),
        "margin-bottom" => set_if(&mut s.margin_bottom, px(val)),
        "margin-left" => set_if(&mut s.margin_left, px(val)),
        "padding" => apply_shorthand_spacing(
            val,
            fs,
            [
                &mut s.padding_top,
                &mut s.padding_right,
                &mut s.padding_bottom,
                &mut s.padding_left,
            ],
        ),
        "padding-top" => set_if(&mut s.padding_top, px(val)),
        "padding-right" => set_if(&mut s.padding_right, px(val)),
        "padding-bottom" => set_if(&mut s.padding_bottom, px(val)),
        "padding-left" => set_if(&mut s.padding_left, px(val)),
        "border" => apply_border(s, val),
        "border-width" => set_if(&mut s.border_width, border_width(val, fs)),
        "border-color" => {
            if let Some(c) = Color::parse(val) {
                s.border_color = c;
            }
        }
        "border-collapse" => match val {
            "collapse" => s.border_collapse = true,
            "separate" => s.border_collapse = false,
            _ => {}
        },
        "border-style" => {
            if val == "none" || val == "hidden" {
                s.border_width = 0.0;
            }
        }
        "line-height" => {
            if val == "normal" {
                s.line_height = 1.2;
            } else if let Ok(v) = val.parse::<f32>() {
                s.line_height = v;
            } else {
                match css::parse_length(val, fs) {
                    Some(Length::Pt(v)) if fs > 0.0 => s.line_height = v / fs,
                    Some(Length::Percent(p)) => s.line_height = p / 100.0,
                    _ => {}
                }
            }
        }
        "gap" => {
            if let Some(v) = css::split_value(val).first().and_then(|v| px(*v)) {
                s.gap = v;
            }
        }
        "break-before" | "page-break-before" => {
            s.page_break_before = val == "always" || val == "page";
        }
        "break-after" | "page-break-after" => {
            s.page_break_after = val == "always" || val == "page";
            s.page_break_after_avoid = val == "avoid" || val == "avoid-page";
        }
        "break-inside" | "page-break-inside" => {
            s.page_break_inside_avoid = val == "avoid" || val == "avoid-page";
        }
        _ => {}
    }
}

fn set_if(target: &mut f32, value: Option<f32>) {
    if let Some(v) = value {
        *target = v;
    }
}

/// Map a `font-family` list onto the builtin PDF families.
pub fn builtin_family(list: &str) -> Option<&'static str> {
    list.split(',').find_map(|f| {
        let f = f.trim().trim_matches(|c| c == '"' || c == '\'').to_ascii_lowercase();
        match f.as_str() {
            "arial" | "helvetica" | "helvetica neue" | "liberation sans" | "sans-serif"
            | "system-ui" | "verdana" => Some("Helvetica"),
            "times" | "times new roman" | "georgia" | "serif" | "liberation serif" => Some("Times"),
            "courier" | "courier new" | "monospace" | "consolas" => Some("Courier"),
            _ => None,
        }
    })
}

fn parse_dimension(s: &str, font_size: f32) -> Dimension {
    if s.trim() == "auto" {
        return Dimension::Auto;
    }
    match css::parse_length(s, font_size) {
        Some(Length::Pt(v)) => Dimension::Px(v),
        Some(Length::Percent(p)) => Dimension::Percent(p),
        None => Dimension::Auto,
    }
}

fn border_width(val: &str, font_size: f32) -> Option<f32> {
    match val {
        "thin" => Some(1.0),
        "medium" => Some(3.0),
        "thick" => Some(5.0),
        _ => parse_abs_length(val, font_size),
    }
}

/// `border: <width> <style> <color>` in any order.
fn apply_border(s: &mut ComputedStyle, val: &str) {
    if val == "none" || val == "0" {
        s.border_width = 0.0;
        return;
    }
    let mut width = None;
    for part in css::split_value(val) {
        if let Some(w) = border_width(part, s.font_size) {
            width = Some(w);
        } else if let Some(c) = Color::parse(part) {
            s.border_color = c;
        } else if part == "none" || part == "hidden" {
            width = Some(0.0);
        }
    }
    // A border with a style but no width is `medium`, which we draw at 1pt.
    s.border_width = width.unwrap_or(1.0);
}

fn count_grid_tracks(val: &str) -> usize {
    let val = val.trim();
    if let Some(args) = val.strip_prefix("repeat(") {
        return args
            .split(',')
            .next()
            .and_then(|n| n.trim().parse().ok())
            .unwrap_or(0);
    }
    if val == "none" {
        return 0;
    }
    css::split_value(val).len()
}

fn apply_shorthand_spacing(val: &str, font_size: f32, [top, right, bottom, left]: [&mut f32; 4]) {
    // `auto` margins collapse to zero; centring is not supported.
    let parts: Vec<f32> = css::split_value(val)
        .into_iter()
        .map(|p| if p == "auto" { Some(0.0) } else { parse_abs_length(p, font_size) })
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default();
    match parts.len() {
        1 => {
            *top = parts[0];
            *right = parts[0];
            *bottom = parts[0];
            *left = parts[0];
        }
        2 => {
            *top = parts[0];
            *bottom = parts[0];
            *right = parts[1];
            *left = parts[1];
        }
        3 => {
            *top = parts[0];
            *right = parts[1];
            *left = parts[1];
            *bottom = parts[2];
        }
        4 => {
            *top = parts[0];
            *right = parts[1];
            *bottom = parts[2];
            *left = parts[3];
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Styled DOM tree
// ---------------------------------------------------------------------------

/// A DOM node annotated with its computed style.
#[derive(Debug, Clone)]
pub enum StyledNode {
    Element {
        tag: Tag,
        style: ComputedStyle,
        children: Vec<StyledNode>,
        /// Original attributes (for images src, etc.)
        attrs: HashMap<String, String>,
    },
    Text {
        text: String,
        style: ComputedStyle,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn first_element(html: &str, sheets: &[&Stylesheet]) -> ComputedStyle {
        let cascade = Cascade::new(sheets.to_vec());
        match cascade.style_document(&parse_html(html)).remove(0) {
            StyledNode::Element { style, .. } => style,
            StyledNode::Text { .. } => panic!("Expected element"),
        }
    }

    #[test]
    fn class_rule_sets_padding() {
        let sheet = Stylesheet::parse(".box { padding: 16px }");
        let s = first_element(r#"<div class="box">x</div>"#, &[&sheet]);
        assert_eq!(s.padding_top, 16.0);
        assert_eq!(s.padding_left, 16.0);
    }

    #[test]
    fn inline_style_font_size() {
        let s = first_element(r#"<p style="font-size: 24px; color: #ff0000">x</p>"#, &[]);
        assert_eq!(s.font_size, 24.0);
        assert!((s.color.r - 1.0).abs() < 0.01);
    }

    #[test]
    fn specificity_beats_source_order() {
        let sheet = Stylesheet::parse("p.note { color: #00ff00 } p { color: #0000ff }");
        let s = first_element(r#"<p class="note">x</p>"#, &[&sheet]);
        assert_eq!(s.color, Color::rgb(0.0, 1.0, 0.0));
    }

    #[test]
    fn later_sheet_wins_at_equal_specificity() {
        let doc = Stylesheet::parse("td { padding: 2px }");
        let injected = Stylesheet::parse("td { padding: 8px }");
        let StyledNode::Element { style, children, .. } = Cascade::new(vec![&doc, &injected])
            .style_document(&parse_html("<table><tr><td>x</td></tr></table>"))
            .remove(0)
        else {
            panic!("Expected table");
        };
        assert_eq!(style.display, Display::Grid);
        let StyledNode::Element { children: cells, .. } = &children[0] else {
            panic!("Expected row");
        };
        let StyledNode::Element { style: cell, .. } = &cells[0] else {
            panic!("Expected cell");
        };
        assert_eq!(cell.padding_top, 8.0);
    }

    #[test]
    fn inline_beats_sheet_but_important_beats_inline() {
        let sheet = Stylesheet::parse("p { margin-bottom: 4px } p { margin-top: 9px !important }");
        let s = first_element(
            r#"<p style="margin-bottom: 2px; margin-top: 1px">x</p>"#,
            &[&sheet],
        );
        assert_eq!(s.margin_bottom, 2.0);
        assert_eq!(s.margin_top, 9.0);
    }

    #[test]
    fn body_properties_are_inherited() {
        let sheet = Stylesheet::parse("body { font-family: Arial, sans-serif; line-height: 1.5 }");
        let s = first_element("<html><body><p>x</p></body></html>", &[&sheet]);
        assert_eq!(s.font_family, "Helvetica");
        assert_eq!(s.line_height, 1.5);
    }

    #[test]
    fn em_lengths_follow_element_font_size() {
        let sheet = Stylesheet::parse("h1 { margin-top: 1em; margin-bottom: 0.5em }");
        let s = first_element("<h1>Title</h1>", &[&sheet]);
        assert_eq!(s.font_size, 32.0);
        assert_eq!(s.margin_top, 32.0);
        assert_eq!(s.margin_bottom, 16.0);
    }

    #[test]
    fn page_break_class() {
        let sheet = Stylesheet::parse(".page-break { page-break-after: always } h2 { page-break-after: avoid }");
        assert!(first_element(r#"<div class="page-break"></div>"#, &[&sheet]).page_break_after);
        let h2 = first_element("<h2>x</h2>", &[&sheet]);
        assert!(h2.page_break_after_avoid);
        assert!(!h2.page_break_after);
    }

    #[test]
    fn border_shorthand() {
        let sheet = Stylesheet::parse("div { border: 1px solid #ddd }");
        let s = first_element("<div>x</div>", &[&sheet]);
        assert_eq!(s.border_width, 1.0);
        assert!((s.border_color.r - 0.867).abs() < 0.01);
    }

    #[test]
    fn hidden_elements_are_dropped() {
        let cascade = Cascade::new(vec![]);
        let styled = cascade.style_document(&parse_html(
            "<html><head><title>T</title><style>p{}</style></head><body><p>x</p></body></html>",
        ));
        assert_eq!(styled.len(), 1);
    }

    #[test]
    fn color_parsing() {
        let c = Color::from_hex("#ff8800").unwrap();
        assert!((c.r - 1.0).abs() < 0.01);
        assert!((c.g - 0.533).abs() < 0.01);
        assert_eq!(Color::parse("rgb(255, 0, 0)"), Some(Color::rgb(1.0, 0.0, 0.0)));
        assert_eq!(Color::parse("#666"), Color::from_hex("666666"));
        assert!(Color::parse("rgba(0,0,0,0)").unwrap().is_transparent());
        assert_eq!(Color::parse("nonsense"), None);
    }
}
