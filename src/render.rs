//! PDF renderer – takes a [`LayoutConfig`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).

use std::collections::{BTreeSet, HashMap};

use printpdf::*;

use crate::diagnostics::Diagnostics;
use crate::fonts::{winansi_byte, Family, FontManager, UNICODE_FONT_ENV};
use crate::layout_config::*;
use crate::resources::ImageStore;

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// Which font a run of text is drawn with.
#[derive(Debug, Clone, PartialEq)]
enum Face {
    /// The standard face itself; only ASCII goes here.
    Builtin,
    Embedded(FontId),
}

/// Embedded faces for text the builtin faces cannot carry.
///
/// printpdf writes builtin-font strings as their UTF-8 bytes, so anything
/// beyond ASCII is drawn from an embedded copy of the same builtin face
/// (WinAnsi characters) or from the Unicode font.
struct TextFaces<'a> {
    doc: &'a mut PdfDocument,
    latin: HashMap<BuiltinFont, Option<(FontId, ParsedFont)>>,
    unicode: Option<(FontId, ParsedFont)>,
    missing: BTreeSet<char>,
}

impl<'a> TextFaces<'a> {
    fn new(doc: &'a mut PdfDocument, fonts: &FontManager, diag: &Diagnostics) -> Self {
        let unicode = fonts.unicode_font().and_then(|font| {
            let mut warnings = Vec::new();
            match ParsedFont::from_bytes(font.bytes(), 0, &mut warnings) {
                Some(parsed) => Some((doc.add_font(&parsed), parsed)),
                None => {
                    diag.warn(format_args!("Unicode font could not be embedded: {warnings:?}"));
                    None
                }
            }
        });
        Self {
            doc,
            latin: HashMap::new(),
            unicode,
            missing: BTreeSet::new(),
        }
    }

    fn embedded(&mut self, builtin: BuiltinFont, c: char) -> Option<FontId> {
        if winansi_byte(c).is_some() {
            let doc = &mut *self.doc;
            let latin = self.latin.entry(builtin).or_insert_with(|| {
                let mut warnings = Vec::new();
                ParsedFont::from_bytes(&builtin.get_subset_font().bytes, 0, &mut warnings)
                    .map(|parsed| (doc.add_font(&parsed), parsed))
            });
            if let Some((id, parsed)) = latin {
                if has_glyph(parsed, c) {
                    return Some(id.clone());
                }
            }
        }
        match &self.unicode {
            Some((id, parsed)) if has_glyph(parsed, c) => Some(id.clone()),
            _ => None,
        }
    }

    fn runs(&mut self, text: &str, builtin: BuiltinFont) -> Vec<(Face, String)> {
        let mut missing = std::mem::take(&mut self.missing);
        let runs = text_runs(text, |c| self.embedded(builtin, c).map(Face::Embedded), &mut missing);
        self.missing = missing;
        runs
    }
}

fn has_glyph(font: &ParsedFont, c: char) -> bool {
    matches!(font.lookup_glyph_index(c as u32), Some(gid) if gid != 0)
}

/// Split `text` into runs sharing one face. Characters no face can draw are
/// recorded in `missing` and drawn as `?`.
fn text_runs(
    text: &str,
    mut face_for: impl FnMut(char) -> Option<Face>,
    missing: &mut BTreeSet<char>,
) -> Vec<(Face, String)> {
    let mut runs: Vec<(Face, String)> = Vec::new();
    for c in text.chars() {
        let c = if c.is_whitespace() { ' ' } else { c };
        let (face, c) = if c.is_ascii() && !c.is_ascii_control() {
            (Face::Builtin, c)
        } else {
            match face_for(c) {
                Some(face) => (face, c),
                None => {
                    missing.insert(c);
                    (Face::Builtin, '?')
                }
            }
        };
        if let Some((last, run)) = runs.last_mut() {
            if *last == face {
                run.push(c);
                continue;
            }
        }
        runs.push((face, c.to_string()));
    }
    runs
}

/// Render a LayoutConfig into PDF bytes.
///
/// Images missing from `images` are left out; ones printpdf cannot embed
/// are skipped with a warning. Characters no available font covers are
/// drawn as `?` with a warning.
pub fn render_pdf(
    config: &LayoutConfig,
    images: &ImageStore,
    fonts: &FontManager,
    diag: &Diagnostics,
) -> Result<Vec<u8>, String> {
    let page_w = Mm(config.page_width_pt * 0.352778); // pt → mm
    let page_h = Mm(config.page_height_pt * 0.352778);

    let mut doc = PdfDocument::new(&config.title);

    // ── Pre-register all images ────────────────────────────────────────────
    let mut all_srcs: BTreeSet<&str> = BTreeSet::new();
    for page_layout in &config.pages {
        for lbox in &page_layout.boxes {
            collect_image_srcs(lbox, &mut all_srcs);
        }
    }

    let mut image_resources: HashMap<String, ImageResource> = HashMap::new();
    let mut img_warnings: Vec<PdfWarnMsg> = Vec::new();

    for src in &all_srcs {
        let Some(data) = images.get(src) else {
            diag.debug(format_args!("No image data for {src}, leaving it out"));
            continue;
        };
        let raw = match RawImage::decode_from_bytes(&data.bytes, &mut img_warnings) {
            Ok(r) => r,
            Err(e) => {
                diag.warn(format_args!("Skipping image {src}: PDF encode error: {e}"));
                continue;
            }
        };
        let xobj_id = doc.add_image(&raw);

        image_resources.insert(
            src.to_string(),
            ImageResource {
                xobj_id,
                px_width: data.px_width,
                px_height: data.px_height,
            },
        );
    }

    // ── Render pages ──────────────────────────────────────────────────────
    let mut pages = Vec::new();
    let mut faces = TextFaces::new(&mut doc, fonts, diag);

    for page_layout in &config.pages {
        let mut ops = Vec::new();

        for lbox in &page_layout.boxes {
            render_box(&mut ops, lbox, config.page_height_pt, &image_resources, &mut faces);
        }

        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    if !faces.missing.is_empty() {
        let chars: String = faces.missing.iter().collect();
        diag.warn(format_args!(
            "No font covers {chars:?}; drawn as '?'. Point {UNICODE_FONT_ENV} at a TTF that has them"
        ));
    }

    // Ensure at least one page.
    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    diag.debug(format_args!(
        "Writing {} page(s) with {} image(s)",
        pages.len(),
        image_resources.len()
    ));

    doc.with_pages(pages);
    let mut save_warnings = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut save_warnings);
    for w in img_warnings.iter().chain(save_warnings.iter()) {
        diag.trace(format_args!("printpdf: {w:?}"));
    }

    Ok(bytes)
}

/// Pick the builtin face for a family and weight/slant.
fn builtin_font(family: &str, bold: bool, italic: bool) -> BuiltinFont {
    match (Family::from_name(family), bold, italic) {
        (Family::Helvetica, true, true) => BuiltinFont::HelveticaBoldOblique,
        (Family::Helvetica, true, false) => BuiltinFont::HelveticaBold,
        (Family::Helvetica, false, true) => BuiltinFont::HelveticaOblique,
        (Family::Helvetica, false, false) => BuiltinFont::Helvetica,
        (Family::Times, true, true) => BuiltinFont::TimesBoldItalic,
        (Family::Times, true, false) => BuiltinFont::TimesBold,
        (Family::Times, false, true) => BuiltinFont::TimesItalic,
        (Family::Times, false, false) => BuiltinFont::TimesRoman,
        (Family::Courier, true, true) => BuiltinFont::CourierBoldOblique,
        (Family::Courier, true, false) => BuiltinFont::CourierBold,
        (Family::Courier, false, true) => BuiltinFont::CourierOblique,
        (Family::Courier, false, false) => BuiltinFont::Courier,
    }
}

/// Recursively collect all unique `image.src` strings from a [`LayoutBox`] tree.
fn collect_image_srcs<'a>(lbox: &'a LayoutBox, srcs: &mut BTreeSet<&'a str>) {
    if let Some(img) = &lbox.image {
        srcs.insert(img.src.as_str());
    }
    for child in &lbox.children {
        collect_image_srcs(child, srcs);
    }
}

fn rgb(c: &[f32; 4]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

#[allow(clippy::too_many_arguments)]
fn write_text(
    ops: &mut Vec<Op>,
    faces: &mut TextFaces<'_>,
    text: &str,
    x: f32,
    y: f32,
    size: f32,
    line_height: f32,
    font: BuiltinFont,
    color: &[f32; 4],
) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point { x: Pt(x), y: Pt(y) },
    });
    ops.push(Op::SetLineHeight { lh: Pt(line_height) });
    ops.push(Op::SetFillColor { col: rgb(color) });
    for (face, run) in faces.runs(text, font) {
        let items = vec![TextItem::Text(run)];
        match face {
            Face::Builtin => {
                ops.push(Op::SetFontSizeBuiltinFont { size: Pt(size), font });
                ops.push(Op::WriteTextBuiltinFont { items, font });
            }
            Face::Embedded(id) => {
                ops.push(Op::SetFontSize {
                    size: Pt(size),
                    font: id.clone(),
                });
                ops.push(Op::WriteText { items, font: id });
            }
        }
    }
    ops.push(Op::EndTextSection);
}

/// Recursively render a LayoutBox and its children into PDF ops.
fn render_box(
    ops: &mut Vec<Op>,
    lbox: &LayoutBox,
    page_height: f32,
    images: &HashMap<String, ImageResource>,
    faces: &mut TextFaces<'_>,
) {
    // PDF origin is bottom-left; layout origin is top-left.
    let pdf_y = page_height - lbox.y;
    let x1 = lbox.x;
    let y1 = pdf_y - lbox.height;
    let x2 = lbox.x + lbox.width;
    let y2 = pdf_y;

    if let Some(bg) = &lbox.background_color {
        ops.push(Op::SetFillColor { col: rgb(bg) });
        ops.push(Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing {
                    points: vec![point(x1, y1), point(x2, y1), point(x2, y2), point(x1, y2)],
                }],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        });
    }

    if let Some(border) = &lbox.border {
        ops.push(Op::SetOutlineColor { col: rgb(&border.color) });
        ops.push(Op::SetOutlineThickness { pt: Pt(border.width) });
        // Stroke along the centre of the border band.
        let inset = border.width / 2.0;
        ops.push(Op::DrawLine {
            line: Line {
                points: vec![
                    point(x1 + inset, y2 - inset),
                    point(x2 - inset, y2 - inset),
                    point(x2 - inset, y1 + inset),
                    point(x1 + inset, y1 + inset),
                ],
                is_closed: true,
            },
        });
    }

    if let Some(text) = &lbox.text {
        let font = builtin_font(&text.font_family, text.bold, text.italic);
        let ascender_offset = text.font_size * 0.75;

        for tline in &text.lines {
            if tline.text.is_empty() {
                continue;
            }
            let text_x = lbox.x + tline.x_offset;
            // Baseline sits one ascender below the line top.
            let text_y = pdf_y - tline.y_offset - ascender_offset;
            write_text(ops, faces, &tline.text, text_x, text_y, text.font_size, text.line_height, font, &text.color);

            if text.underline {
                let underline_y = text_y - text.font_size * 0.1;
                ops.push(Op::SetOutlineThickness { pt: Pt(0.5) });
                ops.push(Op::SetOutlineColor { col: rgb(&text.color) });
                ops.push(Op::DrawLine {
                    line: Line {
                        points: vec![point(text_x, underline_y), point(text_x + tline.width, underline_y)],
                        is_closed: false,
                    },
                });
            }
        }

        if let Some(marker) = &text.list_marker {
            let marker_font = builtin_font(&text.font_family, false, false);
            write_text(
                ops,
                faces,
                marker,
                lbox.x - 16.0,
                pdf_y - ascender_offset,
                text.font_size,
                text.line_height,
                marker_font,
                &text.color,
            );
        }
    }

    if let Some(img) = &lbox.image {
        if let Some(res) = images.get(&img.src) {
            let img_bottom_y = page_height - lbox.y - img.height;

            // At dpi=72 printpdf renders 1 px = 1 pt, so
            // scale = desired_pt / px_dim.
            let scale_x = img.width / res.px_width.max(1) as f32;
            let scale_y = img.height / res.px_height.max(1) as f32;

            ops.push(Op::UseXobject {
                id: res.xobj_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(lbox.x)),
                    translate_y: Some(Pt(img_bottom_y)),
                    dpi: Some(72.0),
                    scale_x: Some(scale_x),
                    scale_y: Some(scale_y),
                    rotate: None,
                },
            });
        }
    }

    for child in &lbox.children {
        render_box(ops, child, page_height, images, faces);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_empty_page() {
        let config = LayoutConfig::new(612.0, 792.0);
        let bytes = render_pdf(&config, &ImageStore::default(), &FontManager::default(), &Diagnostics::default()).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn family_selects_builtin_face() {
        assert!(matches!(builtin_font("Times", true, false), BuiltinFont::TimesBold));
        assert!(matches!(builtin_font("Courier", false, false), BuiltinFont::Courier));
        assert!(matches!(builtin_font("anything", false, true), BuiltinFont::HelveticaOblique));
    }

    #[test]
    fn missing_image_is_skipped() {
        let mut config = LayoutConfig::new(612.0, 792.0);
        let mut lbox = LayoutBox::new(10.0, 10.0, 50.0, 50.0);
        lbox.image = Some(ImageContent {
            src: "gone.png".to_string(),
            width: 50.0,
            height: 50.0,
        });
        config.pages.push(PageLayout {
            page_index: 0,
            boxes: vec![lbox],
        });
        let (diag, buf) = Diagnostics::capture(true);
        let bytes = render_pdf(&config, &ImageStore::default(), &FontManager::default(), &diag).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
        assert!(buf.contents().contains("gone.png"));
    }

    fn one_line_page(text: &str) -> LayoutConfig {
        let mut config = LayoutConfig::new(612.0, 792.0);
        let mut lbox = LayoutBox::new(40.0, 40.0, 300.0, 20.0);
        lbox.text = Some(TextContent {
            lines: vec![TextLine {
                text: text.to_string(),
                x_offset: 0.0,
                y_offset: 0.0,
                width: 100.0,
            }],
            font_family: "Helvetica".to_string(),
            font_size: 12.0,
            bold: false,
            italic: false,
            color: [0.0, 0.0, 0.0, 1.0],
            line_height: 14.4,
            text_align: "left".to_string(),
            underline: false,
            list_marker: None,
        });
        config.pages.push(PageLayout {
            page_index: 0,
            boxes: vec![lbox],
        });
        config
    }

    #[test]
    fn runs_split_on_face_changes() {
        let mut missing = BTreeSet::new();
        let quote = FontId("quote".to_string());
        let runs = text_runs(
            "\u{201C}ok\u{201D}\u{a0}\u{2665}",
            |c| (c != '\u{2665}').then(|| Face::Embedded(quote.clone())),
            &mut missing,
        );
        assert_eq!(
            runs,
            vec![
                (Face::Embedded(quote.clone()), "\u{201C}".to_string()),
                (Face::Builtin, "ok".to_string()),
                (Face::Embedded(quote), "\u{201D}".to_string()),
                (Face::Builtin, " ?".to_string()),
            ]
        );
        assert_eq!(missing.into_iter().collect::<String>(), "\u{2665}");
    }

    #[test]
    fn latin_text_uses_embedded_builtin_face() {
        let (diag, buf) = Diagnostics::capture(true);
        let config = one_line_page("Caf\u{e9} \u{201C}quoted\u{201D}");
        let bytes = render_pdf(&config, &ImageStore::default(), &FontManager::default(), &diag).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
        assert!(bytes.windows(9).any(|w| w == b"FontFile2"));
        assert!(!buf.contents().contains("No font covers"));
    }

    #[test]
    fn uncovered_symbols_warn() {
        let (diag, buf) = Diagnostics::capture(true);
        let config = one_line_page("\u{2665} \u{2666}");
        let bytes = render_pdf(&config, &ImageStore::default(), &FontManager::default(), &diag).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
        let log = buf.contents();
        assert!(log.contains("WARN: No font covers"), "{log}");
        assert!(log.contains(UNICODE_FONT_ENV));
    }
}
