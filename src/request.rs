//! Render requests and their validation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, ValidationError};

/// Everything needed for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderRequest {
    pub html_content: Option<String>,
    pub html_file: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub base_url: Option<String>,
    pub debug: bool,
}

/// Where the HTML comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlSource<'a> {
    Inline(&'a str),
    File(&'a Path),
}

impl RenderRequest {
    pub fn from_html(html: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            html_content: Some(html.into()),
            output_path: Some(output.into()),
            ..Self::default()
        }
    }

    pub fn from_file(file: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            html_file: Some(file.into()),
            output_path: Some(output.into()),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// The destination path. Absent and empty paths are both rejected.
    pub fn output_path(&self) -> Result<&Path, ValidationError> {
        match self.output_path.as_deref() {
            Some(p) if !p.as_os_str().is_empty() => Ok(p),
            _ => Err(ValidationError::MissingOutputPath),
        }
    }

    /// The HTML source to render.
    ///
    /// Inline content takes precedence: when both `html_content` and
    /// `html_file` are set, the file is ignored. An empty inline string
    /// counts as absent.
    pub fn source(&self) -> Result<HtmlSource<'_>, ValidationError> {
        if let Some(html) = self.html_content.as_deref().filter(|h| !h.is_empty()) {
            return Ok(HtmlSource::Inline(html));
        }
        match self.html_file.as_deref() {
            Some(p) if !p.as_os_str().is_empty() => Ok(HtmlSource::File(p)),
            _ => Err(ValidationError::MissingSource),
        }
    }

    /// The base URL, ignoring blank strings.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref().map(str::trim).filter(|b| !b.is_empty())
    }
}

/// Create the parent directory tree of `output` if it does not exist yet.
pub fn ensure_output_dir(output: &Path) -> Result<(), Error> {
    let Some(parent) = output.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(parent).map_err(|source| Error::OutputDir {
        path: parent.to_path_buf(),
        source,
    })
}
