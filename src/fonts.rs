//! Text measurement for the builtin PDF fonts, plus an optional TrueType
//! face for characters the builtin faces cannot encode.
//!
//! Latin text is set in the standard Helvetica, Times and Courier families.
//! Their widths come from an average-advance heuristic per family and weight,
//! which is enough to feed Taffy and the line wrapper. Anything outside
//! WinAnsi, such as card suits or arrows, is measured with `ttf-parser` against
//! the [`UnicodeFont`], when one was found.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The builtin families text can be set in.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Family {
    Helvetica,
    Times,
    Courier,
}

impl Family {
    /// Unknown names fall back to Helvetica.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Times" => Self::Times,
            "Courier" => Self::Courier,
            _ => Self::Helvetica,
        }
    }
}

/// Per-face metrics, in 1/1000 em.
#[derive(Debug, Clone, Copy)]
pub struct FontMetrics {
    pub avg_advance: f32,
    pub ascender: f32,
    pub descender: f32,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: Family,
    pub bold: bool,
    pub italic: bool,
}

/// Environment variable naming a TTF/OTF file to use for non-WinAnsi text.
pub const UNICODE_FONT_ENV: &str = "REPORT_PDF_FONT";

/// Well-known locations of a broad-coverage sans face, tried in order.
const UNICODE_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/TTF/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// A TrueType face embedded in the PDF for text WinAnsi cannot encode.
#[derive(Clone)]
pub struct UnicodeFont {
    /// Raw font bytes (kept alive for ttf-parser's zero-copy API).
    bytes: Vec<u8>,
    units_per_em: f32,
}

impl std::fmt::Debug for UnicodeFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnicodeFont")
            .field("len", &self.bytes.len())
            .field("units_per_em", &self.units_per_em)
            .finish()
    }
}

impl UnicodeFont {
    /// Parse a TTF/OTF font from bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, String> {
        let face = ttf_parser::Face::parse(&bytes, 0).map_err(|e| format!("Failed to parse font: {e}"))?;
        let units_per_em = face.units_per_em() as f32;
        Ok(Self { bytes, units_per_em })
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let bytes = std::fs::read(path).map_err(|e| format!("{}: {e}", path.display()))?;
        Self::from_bytes(bytes).map_err(|e| format!("{}: {e}", path.display()))
    }

    /// Look for a usable face: `REPORT_PDF_FONT` first, then the usual
    /// system locations.
    pub fn discover() -> Option<(PathBuf, Self)> {
        let from_env = std::env::var_os(UNICODE_FONT_ENV).map(PathBuf::from);
        from_env
            .into_iter()
            .chain(UNICODE_FONT_CANDIDATES.iter().map(|p| PathBuf::from(*p)))
            .find_map(|path| Self::load(&path).ok().map(|font| (path, font)))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn covers(&self, c: char) -> bool {
        ttf_parser::Face::parse(&self.bytes, 0)
            .map(|face| glyph(&face, c).is_some())
            .unwrap_or(false)
    }

    fn advance(&self, c: char, font_size: f32) -> Option<f32> {
        let face = ttf_parser::Face::parse(&self.bytes, 0).ok()?;
        let gid = glyph(&face, c)?;
        let advance = face.glyph_hor_advance(gid)?;
        Some(advance as f32 * font_size / self.units_per_em)
    }
}

/// Glyph for `c`, treating `.notdef` as missing.
fn glyph(face: &ttf_parser::Face<'_>, c: char) -> Option<ttf_parser::GlyphId> {
    face.glyph_index(c).filter(|gid| gid.0 != 0)
}

/// The single-byte WinAnsi (Windows-1252) code for `c`, if it has one.
pub fn winansi_byte(c: char) -> Option<u8> {
    let code = c as u32;
    if (0x20..0x7F).contains(&code) || (0xA0..=0xFF).contains(&code) {
        return Some(code as u8);
    }
    let byte = match c {
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Metrics for every builtin face, and the optional Unicode face.
pub struct FontManager {
    fonts: HashMap<FontKey, FontMetrics>,
    unicode: Option<UnicodeFont>,
}

impl FontManager {
    pub fn new() -> Self {
        let mut fonts = HashMap::new();
        let faces = [
            (Family::Helvetica, 500.0, 550.0, 718.0, -207.0),
            (Family::Times, 450.0, 500.0, 683.0, -217.0),
            (Family::Courier, 600.0, 600.0, 629.0, -157.0),
        ];
        for (family, regular, bold_advance, ascender, descender) in faces {
            for bold in [false, true] {
                for italic in [false, true] {
                    fonts.insert(
                        FontKey { family, bold, italic },
                        FontMetrics {
                            avg_advance: if bold { bold_advance } else { regular },
                            ascender,
                            descender,
                        },
                    );
                }
            }
        }
        Self { fonts, unicode: None }
    }

    /// Builtin metrics plus a face for non-WinAnsi text.
    pub fn with_unicode_font(font: UnicodeFont) -> Self {
        Self {
            unicode: Some(font),
            ..Self::new()
        }
    }

    pub fn unicode_font(&self) -> Option<&UnicodeFont> {
        self.unicode.as_ref()
    }

    fn get(&self, family: &str, bold: bool, italic: bool) -> FontMetrics {
        let key = FontKey {
            family: Family::from_name(family),
            bold,
            italic,
        };
        self.fonts.get(&key).copied().unwrap_or(FontMetrics {
            avg_advance: 500.0,
            ascender: 718.0,
            descender: -207.0,
        })
    }

    /// Width of `text` at `font_size`, in points.
    pub fn measure_text_width(&self, text: &str, font_size: f32, bold: bool, italic: bool, family: &str) -> f32 {
        let avg = font_size * self.get(family, bold, italic).avg_advance / 1000.0;
        text.chars()
            .map(|c| match (&self.unicode, winansi_byte(c)) {
                (Some(font), None) => font.advance(c, font_size).unwrap_or(avg),
                _ => avg,
            })
            .sum()
    }

    pub fn line_height_px(&self, font_size: f32, line_height_factor: f32) -> f32 {
        font_size * line_height_factor
    }

    pub fn ascender_px(&self, font_size: f32, bold: bool, italic: bool, family: &str) -> f32 {
        self.get(family, bold, italic).ascender * font_size / 1000.0
    }
}

impl Default for FontManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Word-wrap text to fit within `max_width` points. Existing newlines are
/// kept as hard breaks.
pub fn wrap_text(
    text: &str,
    font_size: f32,
    bold: bool,
    italic: bool,
    family: &str,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<String> {
    if max_width <= 0.0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        for word in &words {
            let candidate = if current_line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current_line, word)
            };
            let w = fonts.measure_text_width(&candidate, font_size, bold, italic, family);
            if w > max_width && !current_line.is_empty() {
                lines.push(current_line);
                current_line = word.to_string();
            } else {
                current_line = candidate;
            }
        }
        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_text_width() {
        let mgr = FontManager::default();
        let w = mgr.measure_text_width("Hello", 16.0, false, false, "Helvetica");
        // 5 chars × 16 × 0.5 = 40
        assert!((w - 40.0).abs() < 0.1);
    }

    #[test]
    fn courier_is_wider_than_times() {
        let mgr = FontManager::default();
        let courier = mgr.measure_text_width("Report", 10.0, false, false, "Courier");
        let times = mgr.measure_text_width("Report", 10.0, false, false, "Times");
        assert!((courier - 36.0).abs() < 0.1);
        assert!(times < courier);
    }

    #[test]
    fn winansi_covers_latin1_and_typographic_marks() {
        assert_eq!(winansi_byte('A'), Some(b'A'));
        assert_eq!(winansi_byte('\u{e9}'), Some(0xE9));
        assert_eq!(winansi_byte('\u{201C}'), Some(0x93));
        assert_eq!(winansi_byte('\u{20AC}'), Some(0x80));
        assert_eq!(winansi_byte('\u{2665}'), None);
        assert_eq!(winansi_byte('\n'), None);
    }

    #[test]
    fn unreadable_font_is_rejected() {
        assert!(UnicodeFont::from_bytes(b"not a font".to_vec()).is_err());
        assert!(UnicodeFont::load(Path::new("/nonexistent/font.ttf")).is_err());
    }

    #[test]
    fn unicode_font_reports_coverage() {
        // printpdf ships the builtin faces as WinAnsi subsets; good enough
        // as a real TrueType file.
        let bytes = printpdf::BuiltinFont::Helvetica.get_subset_font().bytes;
        let font = UnicodeFont::from_bytes(bytes).unwrap();
        assert!(font.covers('\u{e9}'));
        assert!(!font.covers('\u{2665}'));

        let mgr = FontManager::with_unicode_font(font);
        assert!(mgr.unicode_font().is_some());
        let plain = mgr.measure_text_width("ab", 10.0, false, false, "Helvetica");
        assert!((plain - 10.0).abs() < 0.01);
    }

    #[test]
    fn builtin_only_measures_every_char_alike() {
        let mgr = FontManager::default();
        assert!(mgr.unicode_font().is_none());
        let hearts = mgr.measure_text_width("\u{2665}\u{2666}", 10.0, false, false, "Helvetica");
        assert!((hearts - 10.0).abs() < 0.01);
    }

    #[test]
    fn word_wrap_basic() {
        let mgr = FontManager::default();
        let lines = wrap_text("Hello world foo bar", 16.0, false, false, "Helvetica", 60.0, &mgr);
        assert!(lines.len() >= 2, "Expected wrapping, got {:?}", lines);
    }

    #[test]
    fn hard_breaks_survive_wrapping() {
        let mgr = FontManager::default();
        let lines = wrap_text("one\ntwo", 12.0, false, false, "Helvetica", 500.0, &mgr);
        assert_eq!(lines, vec!["one", "two"]);
    }
}
