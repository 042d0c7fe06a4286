//! The rendering engine boundary.
//!
//! [`Renderer`] is the seam between request handling and HTML/CSS rendering:
//! one call loads a document, another writes it out as PDF with extra
//! stylesheets applied. [`Engine`] is the built-in implementation.

use std::fs;
use std::path::Path;

use crate::css::Stylesheet;
use crate::diagnostics::Diagnostics;
use crate::document::Document;
use crate::error::RenderError;
use crate::pipeline;
use crate::request::HtmlSource;
use crate::resources;

/// Loads HTML documents and writes them as PDF.
pub trait Renderer {
    type Document;

    /// Build a document from inline HTML or a file. Relative references
    /// resolve against `base_url`.
    fn load(
        &self,
        source: HtmlSource<'_>,
        base_url: Option<&str>,
        diag: &Diagnostics,
    ) -> Result<Self::Document, RenderError>;

    /// Render `document` with `stylesheets` applied after its own styles and
    /// write the PDF to `output`.
    fn write_pdf(
        &self,
        document: &Self::Document,
        stylesheets: &[Stylesheet],
        output: &Path,
        diag: &Diagnostics,
    ) -> Result<(), RenderError>;
}

/// The built-in taffy + printpdf engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine;

impl Renderer for Engine {
    type Document = Document;

    fn load(
        &self,
        source: HtmlSource<'_>,
        base_url: Option<&str>,
        diag: &Diagnostics,
    ) -> Result<Document, RenderError> {
        let (html, file) = match source {
            HtmlSource::Inline(html) => (html.to_string(), None),
            HtmlSource::File(path) => {
                let bytes = fs::read(path).map_err(|source| RenderError::ReadSource {
                    path: path.to_path_buf(),
                    source,
                })?;
                let html = String::from_utf8(bytes).map_err(|_| RenderError::Encoding {
                    path: path.to_path_buf(),
                })?;
                diag.debug(format_args!("Read {} bytes from {}", html.len(), path.display()));
                (html, Some(path))
            }
        };
        let base = resources::resolve_base(base_url, file)?;
        if let Some(base) = &base {
            diag.debug(format_args!("Resolving relative URLs against {base}"));
        }
        Ok(Document::from_html(&html, base, diag))
    }

    fn write_pdf(
        &self,
        document: &Document,
        stylesheets: &[Stylesheet],
        output: &Path,
        diag: &Diagnostics,
    ) -> Result<(), RenderError> {
        let rendered = pipeline::generate_pdf(document, stylesheets, diag).map_err(RenderError::Engine)?;
        fs::write(output, &rendered.bytes).map_err(|source| RenderError::WritePdf {
            path: output.to_path_buf(),
            source,
        })?;
        diag.debug(format_args!(
            "Wrote {} bytes ({} page(s)) to {}",
            rendered.bytes.len(),
            rendered.layout.pages.len(),
            output.display()
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Engine
            .load(HtmlSource::File(Path::new("/definitely/not/here.html")), None, &Diagnostics::default())
            .unwrap_err();
        assert!(matches!(err, RenderError::ReadSource { .. }));
    }

    #[test]
    fn non_utf8_file_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("latin1.html");
        fs::write(&file, [b'<', b'p', b'>', 0xE9, b'<', b'/', b'p', b'>']).unwrap();
        let err = Engine
            .load(HtmlSource::File(&file), None, &Diagnostics::default())
            .unwrap_err();
        assert!(matches!(err, RenderError::Encoding { .. }));
    }

    #[test]
    fn unwritable_output_is_a_write_error() {
        let tmp = tempfile::tempdir().unwrap();
        let diag = Diagnostics::default();
        let doc = Engine.load(HtmlSource::Inline("<p>x</p>"), None, &diag).unwrap();
        // The output path is an existing directory.
        let err = Engine.write_pdf(&doc, &[], tmp.path(), &diag).unwrap_err();
        assert!(matches!(err, RenderError::WritePdf { .. }));
    }
}
