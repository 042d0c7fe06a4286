//! Pipeline – ties together styling, layout, pagination, and rendering into a
//! single function call.

use crate::css::Stylesheet;
use crate::diagnostics::Diagnostics;
use crate::document::Document;
use crate::fonts::{FontManager, UnicodeFont, UNICODE_FONT_ENV};
use crate::layout::compute_layout;
use crate::layout_config::LayoutConfig;
use crate::page::PageSetup;
use crate::pagination::paginate;
use crate::render::render_pdf;
use crate::style::Cascade;

/// Output of a full pipeline run.
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub layout: LayoutConfig,
}

/// Builtin metrics, plus a Unicode face when one can be found.
fn load_fonts(diag: &Diagnostics) -> FontManager {
    match UnicodeFont::discover() {
        Some((path, font)) => {
            diag.debug(format_args!("Unicode font: {}", path.display()));
            FontManager::with_unicode_font(font)
        }
        None => {
            diag.debug(format_args!(
                "No Unicode font found (set {UNICODE_FONT_ENV}); builtin faces only"
            ));
            FontManager::new()
        }
    }
}

/// Style, lay out and paginate `document`. `extra_sheets` apply after the
/// document's own stylesheets.
pub fn compute_layout_config(
    document: &Document,
    extra_sheets: &[Stylesheet],
    diag: &Diagnostics,
) -> Result<LayoutConfig, String> {
    layout_document(document, extra_sheets, &load_fonts(diag), diag)
}

fn layout_document(
    document: &Document,
    extra_sheets: &[Stylesheet],
    fonts: &FontManager,
    diag: &Diagnostics,
) -> Result<LayoutConfig, String> {
    let sheets: Vec<&Stylesheet> = document.stylesheets.iter().chain(extra_sheets).collect();

    // 1. Page geometry from @page rules
    let page = PageSetup::from_stylesheets(&sheets);
    diag.debug(format_args!(
        "Page {:.2}x{:.2}pt, margins {:.2} {:.2} {:.2} {:.2}pt, {} margin box(es)",
        page.width,
        page.height,
        page.margin_top,
        page.margin_right,
        page.margin_bottom,
        page.margin_left,
        page.margin_boxes.len()
    ));

    // 2. Build styled tree
    let styled = Cascade::new(sheets).style_document(&document.nodes);

    // 3. Compute layout
    let boxes = compute_layout(&styled, &page, fonts, &document.images)?;

    // 4. Paginate
    let layout = paginate(&boxes, &page, fonts, document.title.as_deref());
    diag.debug(format_args!("Laid out {} page(s)", layout.pages.len()));
    Ok(layout)
}

/// Full pipeline: document → PDF bytes.
pub fn generate_pdf(
    document: &Document,
    extra_sheets: &[Stylesheet],
    diag: &Diagnostics,
) -> Result<RenderedPdf, String> {
    let fonts = load_fonts(diag);
    let layout = layout_document(document, extra_sheets, &fonts, diag)?;
    if diag.enabled(log::Level::Trace) {
        diag.trace(format_args!("Layout:\n{}", layout.to_json()));
    }

    // 5. Render PDF
    let bytes = render_pdf(&layout, &document.images, &fonts, diag)?;
    Ok(RenderedPdf { bytes, layout })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stylesheet::default_stylesheet;

    #[test]
    fn pipeline_basic() {
        let diag = Diagnostics::default();
        let doc = Document::from_html("<h1>Hello</h1><p>World</p>", None, &diag);
        let out = generate_pdf(&doc, &[], &diag).unwrap();
        assert!(!out.layout.pages.is_empty());
        assert_eq!(&out.bytes[0..5], b"%PDF-");
    }

    #[test]
    fn injected_sheet_overrides_document_sheet() {
        let diag = Diagnostics::default();
        let doc = Document::from_html(
            "<style>@page { size: a5 }</style><p>x</p>",
            None,
            &diag,
        );
        let layout = compute_layout_config(&doc, &[default_stylesheet()], &diag).unwrap();
        assert_eq!(layout.page_width_pt, 612.0);
        assert_eq!(layout.page_text(0), vec!["x", "Report Writer", "Page 1 of 1"]);
    }

    #[test]
    fn debug_mode_dumps_layout() {
        let (diag, buf) = Diagnostics::capture(true);
        let doc = Document::from_html("<p>dump me</p>", None, &diag);
        generate_pdf(&doc, &[], &diag).unwrap();
        let log = buf.contents();
        assert!(log.contains("TRACE: Layout:"));
        assert!(log.contains("\"dump me\""));
    }
}
