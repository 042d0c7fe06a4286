//! CSS stylesheet parser.
//!
//! Parsing never fails: malformed or unsupported rules are skipped and
//! counted in [`Stylesheet::skipped_rules`], the way CSS error recovery drops
//! a rule and continues with the next one.
//!
//! Supported selectors are `*`, type, `.class` and `#id` compounds joined by
//! descendant (whitespace) or child (`>`) combinators. `@page` rules keep
//! their declarations and `@top-*` / `@bottom-*` margin boxes; `@media print`
//! and `@media all` blocks are inlined; other at-rules are ignored.

use crate::dom::ElementNode;

/// A parsed stylesheet.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    pub rules: Vec<StyleRule>,
    pub page_rules: Vec<PageRule>,
    pub skipped_rules: usize,
}

#[derive(Debug, Clone)]
pub struct StyleRule {
    pub selectors: Vec<Selector>,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// An `@page` rule. Only rules with an empty `selector` apply to every page.
#[derive(Debug, Clone, Default)]
pub struct PageRule {
    pub selector: String,
    pub declarations: Vec<Declaration>,
    pub margin_boxes: Vec<MarginBoxRule>,
}

/// A margin box nested in `@page`, e.g. `@bottom-center { ... }`.
#[derive(Debug, Clone)]
pub struct MarginBoxRule {
    /// At-keyword without the `@`, e.g. `top-center`.
    pub name: String,
    pub declarations: Vec<Declaration>,
}

/// `(ids, classes, types)`, compared lexicographically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity(pub u32, pub u32, pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

/// One compound selector such as `td.total` or `#summary`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
}

/// A complex selector. `combinators[i]` joins `compounds[i]` and
/// `compounds[i + 1]`; the last compound is the subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub compounds: Vec<Compound>,
    pub combinators: Vec<Combinator>,
}

impl Stylesheet {
    pub fn parse(source: &str) -> Self {
        let mut sheet = Stylesheet::default();
        let cleaned = strip_comments(source);
        parse_rule_list(&cleaned, &mut sheet);
        sheet
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.page_rules.is_empty()
    }
}

impl Compound {
    fn matches(&self, element: &ElementNode) -> bool {
        if let Some(tag) = &self.tag {
            if *tag != element.name {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.id() != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|c| element.has_class(c))
    }
}

impl Selector {
    pub fn specificity(&self) -> Specificity {
        self.compounds.iter().fold(Specificity::default(), |acc, c| {
            Specificity(
                acc.0 + c.id.is_some() as u32,
                acc.1 + c.classes.len() as u32,
                acc.2 + c.tag.is_some() as u32,
            )
        })
    }

    /// Match against an element given as its ancestor chain, root first and
    /// the element itself last.
    pub fn matches(&self, chain: &[&ElementNode]) -> bool {
        if self.compounds.is_empty() {
            return false;
        }
        self.matches_at(self.compounds.len() - 1, chain)
    }

    fn matches_at(&self, idx: usize, chain: &[&ElementNode]) -> bool {
        let Some((element, ancestors)) = chain.split_last() else {
            return false;
        };
        if !self.compounds[idx].matches(element) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match self.combinators[idx - 1] {
            Combinator::Child => self.matches_at(idx - 1, ancestors),
            Combinator::Descendant => {
                (0..ancestors.len()).rev().any(|i| self.matches_at(idx - 1, &ancestors[..=i]))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Rule parsing
// ---------------------------------------------------------------------------

fn parse_rule_list(src: &str, sheet: &mut Stylesheet) {
    let bytes = src.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }

        if bytes[pos] == b'@' {
            let name_end = scan_ident(bytes, pos + 1);
            let name = src[pos + 1..name_end].to_ascii_lowercase();
            let Some(stop) = find_top_level(bytes, name_end, b"{;") else {
                break;
            };
            if bytes[stop] == b';' {
                // @charset, @import and friends.
                pos = stop + 1;
                continue;
            }
            let Some(close) = find_block_end(bytes, stop) else {
                sheet.skipped_rules += 1;
                break;
            };
            let prelude = src[name_end..stop].trim();
            let body = &src[stop + 1..close];
            match name.as_str() {
                "page" => sheet.page_rules.push(parse_page_rule(prelude, body)),
                "media" if media_applies(prelude) => parse_rule_list(body, sheet),
                "media" => {}
                _ => sheet.skipped_rules += 1,
            }
            pos = close + 1;
            continue;
        }

        let Some(open) = find_top_level(bytes, pos, b"{") else {
            break;
        };
        let Some(close) = find_block_end(bytes, open) else {
            sheet.skipped_rules += 1;
            break;
        };
        let prelude = &src[pos..open];
        let body = &src[open + 1..close];
        match parse_selector_list(prelude) {
            Some(selectors) => sheet.rules.push(StyleRule {
                selectors,
                declarations: parse_declarations(body),
            }),
            None => sheet.skipped_rules += 1,
        }
        pos = close + 1;
    }
}

fn media_applies(prelude: &str) -> bool {
    let p = prelude.to_ascii_lowercase();
    p.split(',').any(|q| q.contains("print") || q.contains("all"))
}

fn parse_page_rule(prelude: &str, body: &str) -> PageRule {
    let bytes = body.as_bytes();
    let mut rule = PageRule {
        selector: prelude.trim().to_string(),
        ..PageRule::default()
    };
    let mut plain = String::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let Some(at) = find_top_level(bytes, pos, b"@") else {
            plain.push_str(&body[pos..]);
            break;
        };
        plain.push_str(&body[pos..at]);
        let name_end = scan_ident(bytes, at + 1);
        let name = body[at + 1..name_end].to_ascii_lowercase();
        let Some(open) = find_top_level(bytes, name_end, b"{") else {
            break;
        };
        let Some(close) = find_block_end(bytes, open) else {
            break;
        };
        rule.margin_boxes.push(MarginBoxRule {
            name,
            declarations: parse_declarations(&body[open + 1..close]),
        });
        // Keep the declaration list well-formed around the removed block.
        plain.push(';');
        pos = close + 1;
    }
    rule.declarations = parse_declarations(&plain);
    rule
}

/// Parse a declaration block body (without braces).
pub fn parse_declarations(body: &str) -> Vec<Declaration> {
    let bytes = body.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;
    while start < bytes.len() {
        let end = find_top_level(bytes, start, b";").unwrap_or(bytes.len());
        if let Some(decl) = parse_declaration(&body[start..end]) {
            out.push(decl);
        }
        start = end + 1;
    }
    out
}

fn parse_declaration(text: &str) -> Option<Declaration> {
    let colon = text.find(':')?;
    let property = text[..colon].trim().to_ascii_lowercase();
    if property.is_empty() || !property.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        return None;
    }
    let mut value = text[colon + 1..].trim();
    let mut important = false;
    if let Some(bang) = value.rfind('!') {
        if value[bang + 1..].trim().eq_ignore_ascii_case("important") {
            important = true;
            value = value[..bang].trim_end();
        }
    }
    if value.is_empty() {
        return None;
    }
    Some(Declaration {
        property,
        value: value.to_string(),
        important,
    })
}

// ---------------------------------------------------------------------------
// Selector parsing
// ---------------------------------------------------------------------------

/// Parse a comma-separated selector list. One unsupported selector
/// invalidates the whole list, as in CSS.
pub fn parse_selector_list(text: &str) -> Option<Vec<Selector>> {
    let selectors = text
        .split(',')
        .map(parse_selector)
        .collect::<Option<Vec<_>>>()?;
    if selectors.is_empty() {
        None
    } else {
        Some(selectors)
    }
}

fn parse_selector(text: &str) -> Option<Selector> {
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();
    let mut pending: Option<Combinator> = None;
    let bytes = text.trim().as_bytes();
    let text = text.trim();
    let mut pos = 0;

    while pos < bytes.len() {
        let b = bytes[pos];
        if b.is_ascii_whitespace() {
            if !compounds.is_empty() && pending.is_none() {
                pending = Some(Combinator::Descendant);
            }
            pos += 1;
            continue;
        }
        if b == b'>' {
            if compounds.is_empty() {
                return None;
            }
            pending = Some(Combinator::Child);
            pos += 1;
            continue;
        }

        let (compound, next) = parse_compound(text, pos)?;
        if !compounds.is_empty() {
            combinators.push(pending.take().unwrap_or(Combinator::Descendant));
        }
        pending = None;
        compounds.push(compound);
        pos = next;
    }

    if compounds.is_empty() || matches!(pending, Some(Combinator::Child)) {
        return None;
    }
    Some(Selector {
        compounds,
        combinators,
    })
}

fn parse_compound(text: &str, mut pos: usize) -> Option<(Compound, usize)> {
    let bytes = text.as_bytes();
    let mut compound = Compound::default();
    let mut any = false;
    while pos < bytes.len() {
        match bytes[pos] {
            b'*' if !any => {
                pos += 1;
            }
            b'.' => {
                let end = scan_ident(bytes, pos + 1);
                if end == pos + 1 {
                    return None;
                }
                compound.classes.push(text[pos + 1..end].to_string());
                pos = end;
            }
            b'#' => {
                let end = scan_ident(bytes, pos + 1);
                if end == pos + 1 {
                    return None;
                }
                compound.id = Some(text[pos + 1..end].to_string());
                pos = end;
            }
            b if is_ident_byte(b) && !any => {
                let end = scan_ident(bytes, pos);
                compound.tag = Some(text[pos..end].to_ascii_lowercase());
                pos = end;
            }
            b if b.is_ascii_whitespace() || b == b'>' => break,
            // Pseudo-classes, attribute selectors, sibling combinators.
            _ => return None,
        }
        any = true;
    }
    Some((compound, pos))
}

// ---------------------------------------------------------------------------
// Scanning helpers
// ---------------------------------------------------------------------------

fn strip_comments(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b >= 0x80
}

fn scan_ident(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && is_ident_byte(bytes[pos]) {
        pos += 1;
    }
    pos
}

/// First index at or after `start` holding one of `targets`, outside quoted
/// strings, parentheses and nested blocks.
fn find_top_level(bytes: &[u8], start: usize, targets: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = start;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        if depth == 0 && targets.contains(&b) {
            return Some(i);
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Index of the `}` matching the `{` at `open`.
fn find_block_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = open;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == q {
                quote = None;
            }
        } else {
            match b {
                b'"' | b'\'' => quote = Some(b),
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A resolved length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    /// Points. CSS `px` map 1:1 onto points in this engine.
    Pt(f32),
    Percent(f32),
}

/// Parse a length; `em` resolves against `font_size`, `rem` against the
/// 16pt root size. Bare numbers are taken as px.
pub fn parse_length(value: &str, font_size: f32) -> Option<Length> {
    let v = value.trim().to_ascii_lowercase();
    if let Some(p) = v.strip_suffix('%') {
        return p.trim().parse().ok().map(Length::Percent);
    }
    const UNITS: [(&str, f32); 7] = [
        ("px", 1.0),
        ("pt", 1.0),
        ("pc", 12.0),
        ("in", 72.0),
        ("cm", 72.0 / 2.54),
        ("mm", 72.0 / 25.4),
        ("rem", 16.0),
    ];
    for (unit, factor) in UNITS {
        if let Some(n) = v.strip_suffix(unit) {
            return n.trim().parse::<f32>().ok().map(|n| Length::Pt(n * factor));
        }
    }
    if let Some(n) = v.strip_suffix("em") {
        return n.trim().parse::<f32>().ok().map(|n| Length::Pt(n * font_size));
    }
    v.parse::<f32>().ok().map(Length::Pt)
}

/// Like [`parse_length`] but only absolute results.
pub fn parse_abs_length(value: &str, font_size: f32) -> Option<f32> {
    match parse_length(value, font_size)? {
        Length::Pt(v) => Some(v),
        Length::Percent(_) => None,
    }
}

/// Split a value on top-level whitespace, keeping quoted strings and
/// function calls together.
pub fn split_value(value: &str) -> Vec<&str> {
    let bytes = value.as_bytes();
    let mut out = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }
        let end = find_top_level(bytes, pos, b" \t\n\r").unwrap_or(bytes.len());
        // A quote or parenthesis that never closes swallows the rest.
        let end = end.max(pos + 1);
        out.push(&value[pos..end]);
        pos = end;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_html, DomNode};

    fn element_chain(nodes: &[DomNode]) -> Vec<&ElementNode> {
        let mut chain = Vec::new();
        let mut current = nodes;
        while let Some(DomNode::Element(e)) = current.first() {
            chain.push(e);
            current = &e.children;
        }
        chain
    }

    #[test]
    fn parses_rules_and_declarations() {
        let sheet = Stylesheet::parse(
            "/* banner */ h1, h2 { margin-top: 1em; color: #333 !important }\n p{margin-bottom:.5em}",
        );
        assert_eq!(sheet.rules.len(), 2);
        assert_eq!(sheet.rules[0].selectors.len(), 2);
        let decls = &sheet.rules[0].declarations;
        assert_eq!(decls[0].property, "margin-top");
        assert_eq!(decls[1].value, "#333");
        assert!(decls[1].important);
        assert_eq!(sheet.rules[1].declarations[0].value, ".5em");
    }

    #[test]
    fn page_rule_keeps_margin_boxes() {
        let sheet = Stylesheet::parse(
            r#"@page { size: letter; margin: 1cm;
                 @top-center { content: "Report {draft}"; font-size: 9pt }
                 @bottom-center { content: "Page " counter(page) " of " counter(pages); } }"#,
        );
        assert_eq!(sheet.page_rules.len(), 1);
        let page = &sheet.page_rules[0];
        assert_eq!(page.declarations.len(), 2);
        assert_eq!(page.margin_boxes.len(), 2);
        assert_eq!(page.margin_boxes[0].name, "top-center");
        assert_eq!(page.margin_boxes[0].declarations[0].value, "\"Report {draft}\"");
        assert_eq!(page.margin_boxes[1].name, "bottom-center");
    }

    #[test]
    fn unsupported_selectors_are_skipped() {
        let sheet = Stylesheet::parse("a:hover, p { color: red } td { padding: 8px }");
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.skipped_rules, 1);
    }

    #[test]
    fn print_media_is_inlined() {
        let sheet = Stylesheet::parse(
            "@media print { p { color: red } } @media screen { p { color: blue } } @font-face { src: x }",
        );
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].declarations[0].value, "red");
    }

    #[test]
    fn descendant_and_child_matching() {
        let nodes = parse_html(r#"<div id="main"><table class="t"><tr><td class="total">1</td></tr></table></div>"#);
        let chain = element_chain(&nodes);
        assert_eq!(chain.len(), 4);

        let sel = |s: &str| parse_selector_list(s).unwrap().remove(0);
        assert!(sel("td").matches(&chain));
        assert!(sel("#main td.total").matches(&chain));
        assert!(sel("table.t > tr > td").matches(&chain));
        assert!(!sel("div > td").matches(&chain));
        assert!(!sel("td.missing").matches(&chain));
        assert!(sel("*").matches(&chain));
    }

    #[test]
    fn specificity_orders_ids_classes_types() {
        let sel = |s: &str| parse_selector_list(s).unwrap().remove(0).specificity();
        assert_eq!(sel("#a .b td"), Specificity(1, 1, 1));
        assert!(sel(".page-break") > sel("div p"));
    }

    #[test]
    fn lengths_convert_to_points() {
        assert_eq!(parse_length("1in", 16.0), Some(Length::Pt(72.0)));
        assert_eq!(parse_length("2em", 9.0), Some(Length::Pt(18.0)));
        assert_eq!(parse_length("100%", 16.0), Some(Length::Percent(100.0)));
        let cm = parse_abs_length("1cm", 16.0).unwrap();
        assert!((cm - 28.346).abs() < 0.01);
        assert_eq!(parse_abs_length("8px", 16.0), Some(8.0));
        assert_eq!(parse_abs_length("wide", 16.0), None);
    }

    #[test]
    fn value_splitting_respects_strings() {
        assert_eq!(
            split_value(r#""Page " counter(page) " of " counter(pages)"#),
            vec![r#""Page ""#, "counter(page)", r#"" of ""#, "counter(pages)"]
        );
        assert_eq!(split_value("1px solid #ddd"), vec!["1px", "solid", "#ddd"]);
    }
}
