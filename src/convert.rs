//! The conversion entry point: validate a [`RenderRequest`], prepare the
//! output directory, and render with the default stylesheet injected.

use std::path::{Path, PathBuf};

use crate::diagnostics::Diagnostics;
use crate::error::{Error, RenderError, Result};
use crate::renderer::{Engine, Renderer};
use crate::request::{ensure_output_dir, HtmlSource, RenderRequest};
use crate::stylesheet::default_stylesheet;

/// Convert `request` with the built-in engine. Returns the output path.
pub fn generate_pdf(request: &RenderRequest, diag: &Diagnostics) -> Result<PathBuf> {
    generate_pdf_with(&Engine, request, diag)
}

/// Convert `request` with any [`Renderer`].
///
/// Both validations run before anything touches the filesystem, so an
/// invalid request leaves no trace. Render failures are logged at error
/// level when `request.debug` is set, then returned.
pub fn generate_pdf_with<R: Renderer>(renderer: &R, request: &RenderRequest, diag: &Diagnostics) -> Result<PathBuf> {
    let output = request.output_path()?;
    let source = request.source()?;
    ensure_output_dir(output)?;

    match render(renderer, source, request.base_url(), output, diag) {
        Ok(()) => {
            diag.info(format_args!("PDF generated successfully: {}", output.display()));
            Ok(output.to_path_buf())
        }
        Err(e) => {
            if request.debug {
                diag.error(format_args!("Error generating PDF: {e}"));
            }
            Err(Error::Render(e))
        }
    }
}

fn render<R: Renderer>(
    renderer: &R,
    source: HtmlSource<'_>,
    base_url: Option<&str>,
    output: &Path,
    diag: &Diagnostics,
) -> std::result::Result<(), RenderError> {
    let stylesheet = default_stylesheet();
    let document = renderer.load(source, base_url, diag)?;
    renderer.write_pdf(&document, std::slice::from_ref(&stylesheet), output, diag)
}
