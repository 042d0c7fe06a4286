//! Integration tests for the report-pdf converter.
//!
//! These tests validate:
//! - Requests are validated before anything touches the filesystem
//! - PDF output exists, has a valid header and lands where requested
//! - The default stylesheet drives page geometry, header and footer
//! - Base URLs resolve relative resources
//! - Layout is stable across runs

use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

use report_pdf::document::Document;
use report_pdf::layout_config::{LayoutBox, LayoutConfig};
use report_pdf::pipeline::compute_layout_config;
use report_pdf::{
    default_stylesheet, generate_pdf, Diagnostics, Engine, Error, HtmlSource, RenderError, RenderRequest, Renderer,
    ValidationError,
};

// =====================================================================
// Helper
// =====================================================================

const TITLE_HTML: &str = "<html><body><h1>Title</h1></body></html>";

fn assert_valid_pdf(path: &Path) {
    let bytes = fs::read(path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

/// Lay out `html` the way a conversion would, without writing a file.
fn layout_for(html: &str, base_url: Option<&str>) -> LayoutConfig {
    let diag = Diagnostics::default();
    let document: Document = Engine.load(HtmlSource::Inline(html), base_url, &diag).unwrap();
    compute_layout_config(&document, &[default_stylesheet()], &diag).unwrap()
}

fn visit_box(lbox: &LayoutBox, f: &mut dyn FnMut(&LayoutBox)) {
    f(lbox);
    for child in &lbox.children {
        visit_box(child, f);
    }
}

// =====================================================================
// Conversion tests
// =====================================================================

#[test]
fn converts_into_nested_output_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let output = tmp.path().join("out/report.pdf");
    let request = RenderRequest::from_html(TITLE_HTML, &output);

    let written = generate_pdf(&request, &Diagnostics::default()).unwrap();
    assert_eq!(written, output);
    assert!(tmp.path().join("out").is_dir());
    assert_valid_pdf(&output);
}

#[test]
fn converts_from_file() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("report.html");
    fs::write(&input, TITLE_HTML).unwrap();
    let output = tmp.path().join("a/b/c/report.pdf");

    generate_pdf(&RenderRequest::from_file(&input, &output), &Diagnostics::default()).unwrap();
    assert_valid_pdf(&output);
}

#[test]
fn second_run_overwrites_output() {
    let tmp = tempfile::tempdir().unwrap();
    let output = tmp.path().join("report.pdf");
    fs::write(&output, b"stale").unwrap();

    let request = RenderRequest::from_html(TITLE_HTML, &output);
    generate_pdf(&request, &Diagnostics::default()).unwrap();
    let first = fs::metadata(&output).unwrap().len();
    generate_pdf(&request, &Diagnostics::default()).unwrap();

    assert_valid_pdf(&output);
    assert!(first > 100);
}

// =====================================================================
// Validation and error tests
// =====================================================================

#[test]
fn missing_source_is_a_validation_error() {
    let tmp = tempfile::tempdir().unwrap();
    let output = tmp.path().join("never/report.pdf");
    let request = RenderRequest {
        output_path: Some(output.clone()),
        ..RenderRequest::default()
    };

    let err = generate_pdf(&request, &Diagnostics::default()).unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::MissingSource)));
    assert_eq!(err.to_string(), "Either HTML content or file path is required");
    assert!(!output.exists());
    assert!(!tmp.path().join("never").exists());
}

#[test]
fn empty_output_path_is_a_validation_error() {
    let request = RenderRequest::from_html(TITLE_HTML, "");
    let err = generate_pdf(&request, &Diagnostics::default()).unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::MissingOutputPath)));
    assert_eq!(err.to_string(), "Output path is required");
}

#[test]
fn missing_input_file_is_a_render_error() {
    let tmp = tempfile::tempdir().unwrap();
    let request = RenderRequest::from_file(tmp.path().join("nope.html"), tmp.path().join("out.pdf"));
    let err = generate_pdf(&request, &Diagnostics::default()).unwrap_err();
    assert!(matches!(err, Error::Render(RenderError::ReadSource { .. })));
    assert!(!tmp.path().join("out.pdf").exists());
}

#[test]
fn render_errors_reach_the_sink_in_debug_mode() {
    let tmp = tempfile::tempdir().unwrap();
    let request = RenderRequest::from_file(tmp.path().join("nope.html"), tmp.path().join("out.pdf")).with_debug(true);
    let (diag, buf) = Diagnostics::capture(true);

    let err = generate_pdf(&request, &diag).unwrap_err();
    assert!(err.is_render());
    let log = buf.contents();
    assert!(log.contains("ERROR: Error generating PDF:"), "log was: {log}");
    assert!(log.contains("nope.html"));
}

#[test]
fn debug_mode_reports_success() {
    let tmp = tempfile::tempdir().unwrap();
    let output = tmp.path().join("report.pdf");
    let request = RenderRequest::from_html(TITLE_HTML, &output).with_debug(true);
    let (diag, buf) = Diagnostics::capture(true);

    generate_pdf(&request, &diag).unwrap();
    let log = buf.contents();
    assert!(log.contains(&format!("INFO: PDF generated successfully: {}", output.display())));
    assert!(log.contains("TRACE: Layout:"));
}

// =====================================================================
// Default stylesheet tests
// =====================================================================

#[test]
fn unstyled_html_gets_letter_pages_with_1cm_margins() {
    let config = layout_for(TITLE_HTML, None);
    assert_eq!(config.page_width_pt, 612.0);
    assert_eq!(config.page_height_pt, 792.0);
    for margin in config.margins_pt {
        assert!((margin - 28.35).abs() < 0.01, "margin {margin}");
    }
    let title_box = &config.pages[0].boxes[0];
    assert!(title_box.x >= 28.0 && title_box.y >= 28.0);
}

#[test]
fn header_and_footer_on_every_page() {
    let html = r#"<p>one</p><div class="page-break"></div><p>two</p><div class="page-break"></div><p>three</p>"#;
    let config = layout_for(html, None);
    assert_eq!(config.pages.len(), 3);
    for (i, _) in config.pages.iter().enumerate() {
        let text = config.page_text(i);
        assert!(text.contains(&"Report Writer".to_string()));
        assert!(text.contains(&format!("Page {} of 3", i + 1)), "page {i}: {text:?}");
    }
}

#[test]
fn document_title_becomes_pdf_title() {
    let config = layout_for("<html><head><title>Q3 Sales</title></head><body><p>x</p></body></html>", None);
    assert_eq!(config.title, "Q3 Sales");
}

// =====================================================================
// Resource resolution tests
// =====================================================================

#[test]
fn base_url_resolves_relative_images() {
    let tmp = tempfile::tempdir().unwrap();
    image::RgbImage::from_pixel(40, 20, image::Rgb([200, 30, 30]))
        .save(tmp.path().join("logo.png"))
        .unwrap();
    let base = format!("{}/", tmp.path().display());

    let config = layout_for(r#"<p>Logo:</p><img src="logo.png">"#, Some(&base));
    let mut found = None;
    for lbox in &config.pages[0].boxes {
        visit_box(lbox, &mut |b| {
            if let Some(img) = &b.image {
                found = Some((img.src.clone(), b.width, b.height));
            }
        });
    }
    let (src, w, h) = found.expect("image box");
    assert_eq!(src, "logo.png");
    assert!((w - 40.0).abs() < 0.01 && (h - 20.0).abs() < 0.01, "{w}x{h}");

    let output = tmp.path().join("logo.pdf");
    let request = RenderRequest::from_html(r#"<img src="logo.png">"#, &output).with_base_url(base);
    generate_pdf(&request, &Diagnostics::default()).unwrap();
    assert_valid_pdf(&output);
}

#[test]
fn linked_stylesheet_is_applied_before_default_sheet() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("doc.css"), "@page { size: a4 } p { color: #ff0000 }").unwrap();
    let input = tmp.path().join("doc.html");
    fs::write(&input, r#"<link rel="stylesheet" href="doc.css"><p>red</p>"#).unwrap();

    let diag = Diagnostics::default();
    let document = Engine.load(HtmlSource::File(&input), None, &diag).unwrap();
    let config = compute_layout_config(&document, &[default_stylesheet()], &diag).unwrap();
    // The injected sheet comes later, so its letter size wins.
    assert_eq!(config.page_width_pt, 612.0);
    let mut colors = Vec::new();
    for lbox in &config.pages[0].boxes {
        visit_box(lbox, &mut |b| {
            if let Some(t) = &b.text {
                if t.lines.iter().any(|l| l.text == "red") {
                    colors.push(t.color);
                }
            }
        });
    }
    assert_eq!(colors, vec![[1.0, 0.0, 0.0, 1.0]]);
}

// =====================================================================
// Golden-sample stability test
// =====================================================================

#[test]
fn layout_is_deterministic() {
    let html = r#"<html><head><style>td { padding: 6px }</style></head><body>
        <h1>Summary</h1>
        <table><tr><th>Item</th><th>Total</th></tr><tr><td>A</td><td>10</td></tr></table>
        <ul><li>first</li><li>second</li></ul>
    </body></html>"#;
    let digest = |config: &LayoutConfig| Sha256::digest(config.to_json().as_bytes());
    assert_eq!(digest(&layout_for(html, None)), digest(&layout_for(html, None)));

    let json = layout_for(html, None).to_json();
    let reparsed = LayoutConfig::from_json(&json).unwrap();
    assert_eq!(reparsed.to_json(), json);
}
