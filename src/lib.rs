//! # report-pdf – HTML → PDF report converter
//!
//! Converts an HTML document (inline string or file) into a paginated PDF.
//! A default print stylesheet is injected after the document's own styles
//! so every report gets letter pages, 1 cm margins, a "Report Writer"
//! header and a "Page N of M" footer.
//!
//! The entry point is [`generate_pdf`]. Internally the work is split into:
//!
//! 1. **Request** – validate the [`RenderRequest`] and prepare the output directory ([`request`], [`convert`])
//! 2. **Load** – parse HTML, fetch linked stylesheets and images ([`dom`], [`resources`], [`document`])
//! 3. **Style** – cascade CSS and `style` attributes ([`css`], [`style`], [`stylesheet`])
//! 4. **Layout** – compute block/flex/grid layout with Taffy ([`layout`])
//! 5. **Paginate** – split into pages with `@page` geometry and margin boxes ([`page`], [`pagination`])
//! 6. **Render** – emit PDF bytes via printpdf ([`render`])
//!
//! [`Renderer`] is the seam between request handling and the engine, so
//! callers can swap in their own implementation.

pub mod convert;
pub mod css;
pub mod diagnostics;
pub mod document;
pub mod dom;
pub mod error;
pub mod fonts;
pub mod layout;
pub mod layout_config;
pub mod page;
pub mod pagination;
pub mod pipeline;
pub mod render;
pub mod renderer;
pub mod request;
pub mod resources;
pub mod style;
pub mod stylesheet;

// Re-exports for convenience
pub use convert::{generate_pdf, generate_pdf_with};
pub use diagnostics::{CaptureBuffer, Diagnostics, Sink};
pub use error::{Error, RenderError, Result, ValidationError};
pub use renderer::{Engine, Renderer};
pub use request::{HtmlSource, RenderRequest};
pub use stylesheet::{default_stylesheet, DEFAULT_STYLESHEET};
