//! The stylesheet injected into every render, applied after the document's
//! own styles.

use crate::css::Stylesheet;

/// Letter pages with 1cm margins, a running header and a page counter
/// footer, plus print-friendly defaults for headings, tables and images.
pub const DEFAULT_STYLESHEET: &str = r#"
@page {
    size: letter;
    margin: 1cm;
    @top-center {
        content: "Report Writer";
        font-size: 9pt;
        color: #666;
    }
    @bottom-center {
        content: "Page " counter(page) " of " counter(pages);
        font-size: 9pt;
        color: #666;
    }
}
body {
    font-family: Arial, sans-serif;
    line-height: 1.5;
}
h1, h2, h3, h4, h5, h6 {
    margin-top: 1em;
    margin-bottom: 0.5em;
    page-break-after: avoid;
}
p {
    margin-bottom: 0.5em;
}
table {
    border-collapse: collapse;
    width: 100%;
    margin-bottom: 1em;
}
th, td {
    border: 1px solid #ddd;
    padding: 8px;
    text-align: left;
}
th {
    background-color: #f2f2f2;
}
img {
    max-width: 100%;
}
.page-break {
    page-break-after: always;
}
"#;

/// Parse [`DEFAULT_STYLESHEET`]. Each call returns a fresh value.
pub fn default_stylesheet() -> Stylesheet {
    Stylesheet::parse(DEFAULT_STYLESHEET)
}
