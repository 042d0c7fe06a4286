//! A parsed HTML document with its stylesheets and images loaded.

use url::Url;

use crate::css::Stylesheet;
use crate::diagnostics::Diagnostics;
use crate::dom::{self, DomNode, StyleSource};
use crate::resources::{self, ImageStore};

/// Everything the pipeline needs from the source document.
#[derive(Debug, Clone)]
pub struct Document {
    pub nodes: Vec<DomNode>,
    pub base_url: Option<Url>,
    /// `<style>` blocks and linked sheets, in document order.
    pub stylesheets: Vec<Stylesheet>,
    pub images: ImageStore,
    pub title: Option<String>,
}

impl Document {
    /// Parse `html` and load what it references. Resources that cannot be
    /// loaded are reported as warnings and left out.
    pub fn from_html(html: &str, base_url: Option<Url>, diag: &Diagnostics) -> Self {
        let nodes = dom::parse_html(html);
        let title = dom::document_title(&nodes);

        let mut stylesheets = Vec::new();
        for source in dom::collect_style_sources(&nodes) {
            match source {
                StyleSource::Inline(css) => stylesheets.push(Stylesheet::parse(&css)),
                StyleSource::Link(href) => match resources::fetch(&href, base_url.as_ref()) {
                    Ok(bytes) => {
                        diag.debug(format_args!("Loaded stylesheet {href}"));
                        stylesheets.push(Stylesheet::parse(&String::from_utf8_lossy(&bytes)));
                    }
                    Err(e) => diag.warn(format_args!("Failed to load stylesheet {href}: {e}")),
                },
            }
        }
        let skipped: usize = stylesheets.iter().map(|s| s.skipped_rules).sum();
        if skipped > 0 {
            diag.debug(format_args!("Ignored {skipped} unsupported CSS rule(s)"));
        }

        let mut images = ImageStore::default();
        for src in dom::collect_image_sources(&nodes) {
            let loaded = resources::fetch(&src, base_url.as_ref()).and_then(|bytes| images.insert(&src, bytes));
            match loaded {
                Ok(()) => diag.debug(format_args!("Loaded image {}", short(&src))),
                Err(e) => diag.warn(format_args!("Failed to load image {}: {e}", short(&src))),
            }
        }

        diag.debug(format_args!(
            "Parsed document: {} top-level node(s), {} stylesheet(s), {} image(s)",
            nodes.len(),
            stylesheets.len(),
            images.len()
        ));

        Self {
            nodes,
            base_url,
            stylesheets,
            images,
            title,
        }
    }
}

/// Data URIs can be huge; keep log lines readable.
fn short(src: &str) -> &str {
    match src.char_indices().nth(60) {
        Some((i, _)) if src.starts_with("data:") => &src[..i],
        _ => src,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn collects_inline_and_linked_sheets() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("print.css"), "p { color: red }").unwrap();
        let base = resources::resolve_base(Some(tmp.path().to_str().unwrap()), None).unwrap();
        let html = r#"<html><head><title>Quarterly  Report</title>
            <link rel="stylesheet" href="print.css">
            <style>h1 { font-size: 20px }</style></head><body><h1>Q3</h1></body></html>"#;
        let doc = Document::from_html(html, base, &Diagnostics::default());
        assert_eq!(doc.stylesheets.len(), 2);
        assert_eq!(doc.title.as_deref(), Some("Quarterly Report"));
    }

    #[test]
    fn unreachable_resources_are_warned_and_skipped() {
        let (diag, buf) = Diagnostics::capture(true);
        let html = r#"<link rel="stylesheet" href="https://cdn.example.com/x.css"><img src="missing.png">"#;
        let doc = Document::from_html(html, None, &diag);
        assert!(doc.stylesheets.is_empty());
        assert!(doc.images.is_empty());
        let log = buf.contents();
        assert!(log.contains("WARN: Failed to load stylesheet https://cdn.example.com/x.css"));
        assert!(log.contains("WARN: Failed to load image missing.png"));
    }
}
