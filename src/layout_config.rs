//! Layout config – the intermediate representation between layout computation
//! and PDF rendering. This is the "frozen" structure that encodes exactly what
//! goes on each page.

use serde::{Deserialize, Serialize};

/// A complete document layout ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Document title embedded in the PDF metadata.
    #[serde(default = "LayoutConfig::default_title")]
    pub title: String,
    /// Width of each page in PDF points (1 pt = 1/72 inch).
    pub page_width_pt: f32,
    /// Height of each page in PDF points.
    pub page_height_pt: f32,
    /// Page margins in points, `[top, right, bottom, left]`.
    #[serde(default)]
    pub margins_pt: [f32; 4],
    /// Ordered list of pages.
    pub pages: Vec<PageLayout>,
}

/// One page of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_index: usize,
    pub boxes: Vec<LayoutBox>,
}

/// A positioned rectangle with optional content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutBox {
    /// Position relative to page top-left, in points.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    pub background_color: Option<[f32; 4]>,
    pub border: Option<BorderStyle>,

    /// Content (mutually exclusive in practice)
    pub text: Option<TextContent>,
    pub image: Option<ImageContent>,

    pub children: Vec<LayoutBox>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorderStyle {
    pub width: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    /// Pre-wrapped lines of text.
    pub lines: Vec<TextLine>,
    pub font_family: String,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: [f32; 4],
    pub line_height: f32,
    pub text_align: String,
    pub underline: bool,
    /// List bullet/number prefix (e.g. "• " or "1. ")
    pub list_marker: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    /// X offset within the layout box (padding plus alignment)
    pub x_offset: f32,
    /// Y offset from the top of the layout box
    pub y_offset: f32,
    /// Measured width of the line
    #[serde(default)]
    pub width: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageContent {
    /// The `src` attribute, used as the key into the image store.
    pub src: String,
    pub width: f32,
    pub height: f32,
}

impl LayoutConfig {
    /// An empty layout for pages of the given size.
    pub fn new(page_width_pt: f32, page_height_pt: f32) -> Self {
        Self {
            title: Self::default_title(),
            page_width_pt,
            page_height_pt,
            margins_pt: [0.0; 4],
            pages: Vec::new(),
        }
    }

    fn default_title() -> String {
        "Report".to_string()
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }

    /// All text on `page`, line by line, in box order.
    pub fn page_text(&self, page: usize) -> Vec<String> {
        fn walk(lbox: &LayoutBox, out: &mut Vec<String>) {
            if let Some(text) = &lbox.text {
                out.extend(text.lines.iter().map(|l| l.text.clone()));
            }
            for child in &lbox.children {
                walk(child, out);
            }
        }
        let mut out = Vec::new();
        if let Some(p) = self.pages.get(page) {
            for lbox in &p.boxes {
                walk(lbox, &mut out);
            }
        }
        out
    }
}

impl LayoutBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            background_color: None,
            border: None,
            text: None,
            image: None,
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_keeps_pages_and_margins() {
        let mut config = LayoutConfig::new(612.0, 792.0);
        config.margins_pt = [28.35; 4];
        config.pages.push(PageLayout {
            page_index: 0,
            boxes: vec![LayoutBox::new(28.35, 28.35, 100.0, 20.0)],
        });
        let back = LayoutConfig::from_json(&config.to_json()).unwrap();
        assert_eq!(back.page_width_pt, 612.0);
        assert_eq!(back.margins_pt, [28.35; 4]);
        assert_eq!(back.pages[0].boxes.len(), 1);
    }

    #[test]
    fn missing_optional_fields_use_defaults() {
        let config =
            LayoutConfig::from_json(r#"{"page_width_pt": 100, "page_height_pt": 200, "pages": []}"#).unwrap();
        assert_eq!(config.title, "Report");
        assert_eq!(config.margins_pt, [0.0; 4]);
    }
}
