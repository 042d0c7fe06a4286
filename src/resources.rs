//! Resource loading – base URL resolution, `data:` and `file:` fetches, and
//! the decoded image store shared by layout and rendering.
//!
//! Only local resources are read. Any other scheme is reported as an error
//! so the caller can log it and carry on without the resource.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::RenderError;

/// Work out the URL relative references resolve against.
///
/// An explicit `base_url` is tried as an absolute URL first and otherwise
/// taken as a filesystem path (a directory when it ends in `/` or exists as
/// one). Without it, a file source resolves against the file itself.
pub fn resolve_base(base_url: Option<&str>, source_file: Option<&Path>) -> Result<Option<Url>, RenderError> {
    if let Some(base) = base_url {
        // A single-letter "scheme" is a Windows drive, not a URL.
        if let Ok(url) = Url::parse(base) {
            if url.scheme().len() > 1 {
                return Ok(Some(url));
            }
        }
        let path = absolute(Path::new(base)).map_err(|reason| RenderError::BaseUrl {
            url: base.to_string(),
            reason,
        })?;
        let url = if base.ends_with('/') || path.is_dir() {
            Url::from_directory_path(&path)
        } else {
            Url::from_file_path(&path)
        };
        return url.map(Some).map_err(|()| RenderError::BaseUrl {
            url: base.to_string(),
            reason: "not a valid URL or path".to_string(),
        });
    }
    match source_file {
        Some(file) => {
            let path = absolute(file).map_err(|reason| RenderError::BaseUrl {
                url: file.display().to_string(),
                reason,
            })?;
            Ok(Url::from_file_path(&path).ok())
        }
        None => Ok(None),
    }
}

fn absolute(path: &Path) -> Result<std::path::PathBuf, String> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|e| format!("cannot resolve relative path: {e}"))
}

/// Resolve `href` against `base`.
pub fn resolve_href(href: &str, base: Option<&Url>) -> Result<Url, String> {
    match Url::parse(href) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => match base {
            Some(base) => base.join(href).map_err(|e| format!("invalid URL '{href}': {e}")),
            None => Err(format!("relative URL '{href}' without a base URL")),
        },
        Err(e) => Err(format!("invalid URL '{href}': {e}")),
    }
}

/// Fetch the bytes behind `href`.
pub fn fetch(href: &str, base: Option<&Url>) -> Result<Vec<u8>, String> {
    let href = href.trim();
    if let Some(rest) = href.get(..5).filter(|p| p.eq_ignore_ascii_case("data:")).map(|_| &href[5..]) {
        return decode_data_uri(&format!("data:{rest}"));
    }
    let url = resolve_href(href, base)?;
    match url.scheme() {
        "file" => {
            let path = url
                .to_file_path()
                .map_err(|()| format!("'{url}' is not a local file"))?;
            fs::read(&path).map_err(|e| format!("cannot read '{}': {e}", path.display()))
        }
        other => Err(format!("unsupported URL scheme '{other}' in '{url}'")),
    }
}

/// Decode a `data:[<mime>][;base64],<data>` URI.
pub fn decode_data_uri(src: &str) -> Result<Vec<u8>, String> {
    let rest = src
        .strip_prefix("data:")
        .ok_or_else(|| "not a data URI".to_string())?;
    let comma_pos = rest.find(',').ok_or_else(|| {
        "Invalid data URI: missing `,` separator between header and data".to_string()
    })?;
    let header = &rest[..comma_pos];
    let payload = &rest[comma_pos + 1..];
    if header.split(';').any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        let cleaned: String = percent_decode_str(payload)
            .filter(|b| !b.is_ascii_whitespace())
            .map(char::from)
            .collect();
        BASE64_STD
            .decode(cleaned)
            .map_err(|e| format!("Base64 decode error: {e}"))
    } else {
        Ok(percent_decode_str(payload).collect())
    }
}

/// An encoded image and its pixel size.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    pub px_width: u32,
    pub px_height: u32,
}

/// Images referenced by a document, keyed by their `src` attribute as
/// written in the markup.
#[derive(Debug, Clone, Default)]
pub struct ImageStore {
    images: HashMap<String, ImageData>,
}

impl ImageStore {
    /// Decode `bytes` to learn the pixel size and keep them under `src`.
    pub fn insert(&mut self, src: &str, bytes: Vec<u8>) -> Result<(), String> {
        let img = ::image::load_from_memory(&bytes).map_err(|e| format!("decode error: {e}"))?;
        let (px_width, px_height) = (img.width(), img.height());
        if px_width == 0 || px_height == 0 {
            return Err("image has no pixels".to_string());
        }
        self.images.insert(
            src.to_string(),
            ImageData {
                bytes,
                px_width,
                px_height,
            },
        );
        Ok(())
    }

    pub fn get(&self, src: &str) -> Option<&ImageData> {
        self.images.get(src)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_accepts_urls_and_paths() {
        let url = resolve_base(Some("https://example.com/reports/"), None).unwrap().unwrap();
        assert_eq!(url.as_str(), "https://example.com/reports/");

        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_str().unwrap();
        let url = resolve_base(Some(dir), None).unwrap().unwrap();
        assert_eq!(url.scheme(), "file");
        assert!(url.as_str().ends_with('/'));
    }

    #[test]
    fn file_source_is_its_own_base() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("report.html");
        let base = resolve_base(None, Some(&file)).unwrap().unwrap();
        let logo = resolve_href("img/logo.png", Some(&base)).unwrap();
        assert_eq!(logo.to_file_path().unwrap(), tmp.path().join("img/logo.png"));
        assert_eq!(resolve_base(None, None).unwrap(), None);
    }

    #[test]
    fn relative_href_needs_base() {
        assert!(resolve_href("style.css", None).is_err());
    }

    #[test]
    fn data_uris() {
        assert_eq!(decode_data_uri("data:text/css,p%20%7B%7D").unwrap(), b"p {}");
        assert_eq!(decode_data_uri("data:text/plain;base64,aGk=").unwrap(), b"hi");
        assert!(decode_data_uri("data:text/plain;base64").is_err());
        assert!(decode_data_uri("data:;base64,!!!").is_err());
    }

    #[test]
    fn data_uri_escapes_at_the_end_and_malformed() {
        assert_eq!(decode_data_uri("data:text/plain,a%41").unwrap(), b"aA");
        assert_eq!(decode_data_uri("data:text/plain,50%").unwrap(), b"50%");
        assert_eq!(decode_data_uri("data:text/plain,%zz").unwrap(), b"%zz");
        assert_eq!(decode_data_uri("data:text/plain;base64,a%47k%3D").unwrap(), b"hi");
    }

    #[test]
    fn fetch_reads_files_and_rejects_remote() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.css"), "h1 { color: red }").unwrap();
        let base = resolve_base(Some(tmp.path().to_str().unwrap()), None).unwrap();
        assert_eq!(fetch("a.css", base.as_ref()).unwrap(), b"h1 { color: red }");
        assert!(fetch("missing.css", base.as_ref()).is_err());
        let err = fetch("https://example.com/x.png", None).unwrap_err();
        assert!(err.contains("unsupported URL scheme 'https'"));
    }

    #[test]
    fn image_store_rejects_garbage() {
        let mut store = ImageStore::default();
        assert!(store.insert("x.png", b"not an image".to_vec()).is_err());
        assert!(store.is_empty());
    }
}
