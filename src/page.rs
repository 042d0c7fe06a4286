//! Page geometry and running content, resolved from `@page` rules.

use crate::css::{self, parse_abs_length, Declaration, Stylesheet};
use crate::style::{builtin_family, Color};

/// Page margin used when no `@page` rule sets one.
pub const PAGE_MARGIN_PT: f32 = 40.0;

const A4: (f32, f32) = (595.28, 841.89);

/// Size, margins and margin boxes shared by every page of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSetup {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_boxes: Vec<MarginBox>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginBoxPosition {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl MarginBoxPosition {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "top-left" => Self::TopLeft,
            "top-center" => Self::TopCenter,
            "top-right" => Self::TopRight,
            "bottom-left" => Self::BottomLeft,
            "bottom-center" => Self::BottomCenter,
            "bottom-right" => Self::BottomRight,
            _ => return None,
        })
    }

    pub fn is_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopCenter | Self::TopRight)
    }
}

/// One piece of generated `content`.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    /// `counter(page)`
    Page,
    /// `counter(pages)`
    Pages,
}

/// Running header or footer text.
#[derive(Debug, Clone, PartialEq)]
pub struct MarginBox {
    pub position: MarginBoxPosition,
    pub content: Vec<ContentPart>,
    pub font_size: f32,
    pub font_family: String,
    pub color: Color,
}

impl MarginBox {
    fn new(position: MarginBoxPosition) -> Self {
        Self {
            position,
            content: Vec::new(),
            font_size: 16.0,
            font_family: "Helvetica".to_string(),
            color: Color::BLACK,
        }
    }

    /// The text for page `page` (1-based) of `pages`.
    pub fn resolve_text(&self, page: usize, pages: usize) -> String {
        self.content
            .iter()
            .map(|part| match part {
                ContentPart::Text(t) => t.clone(),
                ContentPart::Page => page.to_string(),
                ContentPart::Pages => pages.to_string(),
            })
            .collect()
    }

    fn apply(&mut self, decl: &Declaration) {
        match decl.property.as_str() {
            "content" => self.content = parse_content(&decl.value),
            "font-size" => {
                if let Some(v) = parse_abs_length(&decl.value, self.font_size).filter(|v| *v > 0.0) {
                    self.font_size = v;
                }
            }
            "font-family" => {
                if let Some(f) = builtin_family(&decl.value) {
                    self.font_family = f.to_string();
                }
            }
            "color" => {
                if let Some(c) = Color::parse(&decl.value) {
                    self.color = c;
                }
            }
            _ => {}
        }
    }
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            width: A4.0,
            height: A4.1,
            margin_top: PAGE_MARGIN_PT,
            margin_right: PAGE_MARGIN_PT,
            margin_bottom: PAGE_MARGIN_PT,
            margin_left: PAGE_MARGIN_PT,
            margin_boxes: Vec::new(),
        }
    }
}

impl PageSetup {
    /// Fold the unqualified `@page` rules of `sheets`, in order, over the
    /// default setup. Later declarations win.
    pub fn from_stylesheets(sheets: &[&Stylesheet]) -> Self {
        let mut setup = Self::default();
        let rules = sheets
            .iter()
            .flat_map(|s| s.page_rules.iter())
            .filter(|r| r.selector.is_empty());
        for rule in rules {
            for decl in &rule.declarations {
                setup.apply(decl);
            }
            for mbox in &rule.margin_boxes {
                let Some(position) = MarginBoxPosition::from_name(&mbox.name) else {
                    continue;
                };
                let idx = match setup.margin_boxes.iter().position(|b| b.position == position) {
                    Some(i) => i,
                    None => {
                        setup.margin_boxes.push(MarginBox::new(position));
                        setup.margin_boxes.len() - 1
                    }
                };
                for decl in &mbox.declarations {
                    setup.margin_boxes[idx].apply(decl);
                }
            }
        }
        setup.margin_boxes.retain(|b| !b.content.is_empty());
        setup
    }

    pub fn content_width(&self) -> f32 {
        (self.width - self.margin_left - self.margin_right).max(1.0)
    }

    pub fn content_height(&self) -> f32 {
        (self.height - self.margin_top - self.margin_bottom).max(1.0)
    }

    fn apply(&mut self, decl: &Declaration) {
        let value = decl.value.as_str();
        match decl.property.as_str() {
            "size" => self.apply_size(value),
            "margin" => {
                let parts: Option<Vec<f32>> = css::split_value(value)
                    .into_iter()
                    .map(|p| parse_abs_length(p, 16.0))
                    .collect();
                let (t, r, b, l) = match parts.as_deref() {
                    Some([a]) => (*a, *a, *a, *a),
                    Some([v, h]) => (*v, *h, *v, *h),
                    Some([t, h, b]) => (*t, *h, *b, *h),
                    Some([t, r, b, l]) => (*t, *r, *b, *l),
                    _ => return,
                };
                self.margin_top = t;
                self.margin_right = r;
                self.margin_bottom = b;
                self.margin_left = l;
            }
            "margin-top" => set_if(&mut self.margin_top, parse_abs_length(value, 16.0)),
            "margin-right" => set_if(&mut self.margin_right, parse_abs_length(value, 16.0)),
            "margin-bottom" => set_if(&mut self.margin_bottom, parse_abs_length(value, 16.0)),
            "margin-left" => set_if(&mut self.margin_left, parse_abs_length(value, 16.0)),
            _ => {}
        }
    }

    fn apply_size(&mut self, value: &str) {
        let mut size: Option<(f32, f32)> = None;
        let mut lengths = Vec::new();
        let mut orientation = None;
        for part in css::split_value(value) {
            match part.to_ascii_lowercase().as_str() {
                "auto" => size = Some(A4),
                "letter" => size = Some((612.0, 792.0)),
                "legal" => size = Some((612.0, 1008.0)),
                "a3" => size = Some((841.89, 1190.55)),
                "a4" => size = Some(A4),
                "a5" => size = Some((419.53, 595.28)),
                "landscape" => orientation = Some(true),
                "portrait" => orientation = Some(false),
                other => match parse_abs_length(other, 16.0) {
                    Some(v) if v > 0.0 => lengths.push(v),
                    _ => return,
                },
            }
        }
        match lengths.as_slice() {
            [] => {}
            [side] => size = Some((*side, *side)),
            [w, h] => size = Some((*w, *h)),
            _ => return,
        }
        let (mut w, mut h) = match (size, orientation) {
            (Some(s), _) => s,
            (None, Some(_)) => (self.width, self.height),
            (None, None) => return,
        };
        match orientation {
            Some(true) if h > w => std::mem::swap(&mut w, &mut h),
            Some(false) if w > h => std::mem::swap(&mut w, &mut h),
            _ => {}
        }
        self.width = w;
        self.height = h;
    }
}

fn set_if(target: &mut f32, value: Option<f32>) {
    if let Some(v) = value {
        *target = v;
    }
}

/// Parse a `content` value into literal strings and page counters.
fn parse_content(value: &str) -> Vec<ContentPart> {
    let mut parts = Vec::new();
    for token in css::split_value(value) {
        if let Some(quoted) = unquote(token) {
            parts.push(ContentPart::Text(quoted));
            continue;
        }
        let compact: String = token.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.to_ascii_lowercase().as_str() {
            "counter(page)" => parts.push(ContentPart::Page),
            "counter(pages)" => parts.push(ContentPart::Pages),
            // `none`, `normal` and unsupported functions generate nothing.
            _ => {}
        }
    }
    parts
}

fn unquote(token: &str) -> Option<String> {
    let quote = token.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let inner = token.strip_prefix(quote)?;
    let inner = inner.strip_suffix(quote).unwrap_or(inner);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}
