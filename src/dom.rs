//! HTML parser – converts an HTML string into a simple DOM tree.
//!
//! The parser is tolerant: it never fails. Unclosed elements are closed by
//! the first end tag that matches an ancestor, stray end tags are dropped,
//! and unknown elements are kept (they render as `display: none`).
//!
//! Supported elements:
//! - Structural: div, section, article, header, footer, main, nav, blockquote,
//!   p, h1-h6, ul, ol, li, table (with thead/tbody/tfoot), tr, td, th, hr
//! - Inline: span, strong, b, em, i, u, a, small, code, br, img
//! - Metadata: head, title, style, link, meta, script

use std::collections::HashMap;

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

/// The tag name of a supported element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Html,
    Head,
    Body,
    Title,
    Style,
    Link,
    Meta,
    Script,
    Div,
    Section,
    P,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Ul,
    Ol,
    Li,
    Table,
    Thead,
    Tbody,
    Tfoot,
    Tr,
    Td,
    Th,
    Span,
    Strong,
    Em,
    U,
    A,
    Br,
    Hr,
    Img,
    /// Catch-all for unknown tags – kept but not rendered.
    Unknown(String),
}

impl Tag {
    pub fn from_name(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "html" => Tag::Html,
            "head" => Tag::Head,
            "body" => Tag::Body,
            "title" => Tag::Title,
            "style" => Tag::Style,
            "link" => Tag::Link,
            "meta" => Tag::Meta,
            "script" => Tag::Script,
            "div" => Tag::Div,
            "section" | "article" | "header" | "footer" | "main" | "nav" | "aside"
            | "blockquote" | "figure" | "address" => Tag::Section,
            "p" => Tag::P,
            "h1" => Tag::H1,
            "h2" => Tag::H2,
            "h3" => Tag::H3,
            "h4" => Tag::H4,
            "h5" => Tag::H5,
            "h6" => Tag::H6,
            "ul" => Tag::Ul,
            "ol" => Tag::Ol,
            "li" => Tag::Li,
            "table" => Tag::Table,
            "thead" => Tag::Thead,
            "tbody" => Tag::Tbody,
            "tfoot" => Tag::Tfoot,
            "tr" => Tag::Tr,
            "td" => Tag::Td,
            "th" => Tag::Th,
            "span" | "small" | "code" | "label" | "sup" | "sub" => Tag::Span,
            "strong" | "b" => Tag::Strong,
            "em" | "i" => Tag::Em,
            "u" => Tag::U,
            "a" => Tag::A,
            "br" => Tag::Br,
            "hr" => Tag::Hr,
            "img" => Tag::Img,
            other => Tag::Unknown(other.to_string()),
        }
    }

    /// Elements that never have children or an end tag.
    pub fn is_void(&self) -> bool {
        matches!(self, Tag::Img | Tag::Br | Tag::Hr | Tag::Link | Tag::Meta)
            || matches!(self, Tag::Unknown(n) if n == "input" || n == "wbr" || n == "col")
    }

    /// Elements whose content is raw text, not markup.
    pub fn is_raw_text(&self) -> bool {
        matches!(self, Tag::Style | Tag::Script)
    }

    pub fn is_heading(&self) -> bool {
        matches!(
            self,
            Tag::H1 | Tag::H2 | Tag::H3 | Tag::H4 | Tag::H5 | Tag::H6
        )
    }

    pub fn is_row_group(&self) -> bool {
        matches!(self, Tag::Thead | Tag::Tbody | Tag::Tfoot)
    }
}

/// A node in our DOM tree.
#[derive(Debug, Clone)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

/// An element node carrying tag, attributes, and children.
#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag: Tag,
    /// Lower-cased element name as written in the source.
    pub name: String,
    pub attributes: HashMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(name: &str) -> Self {
        Self {
            tag: Tag::from_name(name),
            name: name.to_ascii_lowercase(),
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    pub fn classes(&self) -> Vec<&str> {
        self.attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().contains(&class)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn inline_style(&self) -> Option<&str> {
        self.attr("style")
    }

    pub fn src(&self) -> Option<&str> {
        self.attr("src")
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                DomNode::Text(t) => out.push_str(t),
                DomNode::Element(e) => out.push_str(&e.text_content()),
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Parser – simple recursive descent over HTML
// ---------------------------------------------------------------------------

/// Parse an HTML string into a list of DOM nodes.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    let mut parser = Parser::new(html);
    parser.parse_nodes()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    /// Names of the currently open elements, innermost last.
    open: Vec<String>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            open: Vec::new(),
        }
    }

    fn parse_nodes(&mut self) -> Vec<DomNode> {
        let mut nodes = Vec::new();
        loop {
            self.skip_whitespace_preserve();
            if self.eof() {
                break;
            }
            if self.starts_with("</") {
                let name = self.peek_end_tag_name();
                if self.open.iter().any(|o| *o == name) {
                    // Closes this element or an ancestor; the owner consumes it.
                    break;
                }
                // Stray end tag.
                self.skip_end_tag();
                continue;
            }
            if let Some(node) = self.parse_node() {
                nodes.push(node);
            }
        }
        nodes
    }

    fn parse_node(&mut self) -> Option<DomNode> {
        if self.starts_with("<!--") {
            self.skip_comment();
            return None;
        }
        if self.starts_with("<!") || self.starts_with("<?") {
            // Skip doctype / processing instructions
            self.skip_past(">");
            return None;
        }
        if self.starts_with("<") && self.next_is_tag_start() {
            Some(self.parse_element())
        } else {
            Some(self.parse_text())
        }
    }

    fn parse_text(&mut self) -> DomNode {
        let start = self.pos;
        // A lone '<' that does not open a tag is literal text.
        if self.starts_with("<") {
            self.advance(1);
        }
        while !self.eof() && !self.starts_with("<") {
            self.advance(1);
        }
        let text = &self.input[start..self.pos];
        DomNode::Text(decode_entities(text))
    }

    fn parse_element(&mut self) -> DomNode {
        // Consume '<'
        self.advance(1);
        let tag_name = self.parse_tag_name();
        let mut elem = ElementNode::new(&tag_name);

        // Parse attributes
        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let (key, value) = self.parse_attribute();
            if key.is_empty() {
                // Unparseable byte inside the tag; skip it.
                self.advance(1);
                continue;
            }
            elem.attributes.entry(key).or_insert(value);
        }

        if self.starts_with("/>") {
            self.advance(2);
            return DomNode::Element(elem);
        }
        if self.starts_with(">") {
            self.advance(1);
        }
        if elem.tag.is_void() {
            return DomNode::Element(elem);
        }

        if elem.tag.is_raw_text() {
            let close = format!("</{}", elem.name);
            let start = self.pos;
            let end = find_ascii_case_insensitive(&self.input[start..], &close)
                .map(|i| start + i)
                .unwrap_or(self.input.len());
            let raw = &self.input[start..end];
            if !raw.trim().is_empty() {
                elem.children.push(DomNode::Text(raw.to_string()));
            }
            self.pos = end;
            self.consume_end_tag(&elem.name);
            return DomNode::Element(elem);
        }

        // Parse children
        self.open.push(elem.name.clone());
        elem.children = self.parse_nodes();
        self.open.pop();

        if elem.tag == Tag::Table {
            elem.children = flatten_row_groups(std::mem::take(&mut elem.children));
        }

        self.consume_end_tag(&elem.name);
        DomNode::Element(elem)
    }

    /// Consume `</name>` if it is next; an end tag for an ancestor is left
    /// in place so the ancestor can close.
    fn consume_end_tag(&mut self, name: &str) {
        if self.starts_with("</") && self.peek_end_tag_name() == name {
            self.skip_end_tag();
        }
    }

    fn peek_end_tag_name(&self) -> String {
        let rest = &self.input[self.pos + 2..];
        rest.chars()
            .take_while(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
            .collect::<String>()
            .to_ascii_lowercase()
    }

    fn skip_end_tag(&mut self) {
        self.skip_past(">");
    }

    fn next_is_tag_start(&self) -> bool {
        self.input[self.pos + 1..]
            .chars()
            .next()
            .map(|c| c.is_ascii_alphabetic())
            .unwrap_or(false)
    }

    fn parse_tag_name(&mut self) -> String {
        let start = self.pos;
        while !self.eof() {
            let c = self.current_char();
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ':' {
                self.advance(1);
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_attribute(&mut self) -> (String, String) {
        let key = self.parse_tag_name().to_ascii_lowercase();
        self.skip_whitespace();
        if !self.starts_with("=") {
            return (key, String::new());
        }
        self.advance(1); // skip '='
        self.skip_whitespace();
        let value = self.parse_attr_value();
        (key, value)
    }

    fn parse_attr_value(&mut self) -> String {
        for quote in ["\"", "'"] {
            if self.starts_with(quote) {
                self.advance(1);
                let start = self.pos;
                while !self.eof() && !self.starts_with(quote) {
                    self.advance(1);
                }
                let val = self.input[start..self.pos].to_string();
                if !self.eof() {
                    self.advance(1);
                }
                return decode_entities(&val);
            }
        }
        let start = self.pos;
        while !self.eof() {
            let c = self.current_char();
            if c.is_whitespace() || c == '>' {
                break;
            }
            self.advance(1);
        }
        decode_entities(&self.input[start..self.pos])
    }

    fn skip_whitespace(&mut self) {
        while !self.eof() && self.current_char().is_whitespace() {
            self.advance(1);
        }
    }

    fn skip_whitespace_preserve(&mut self) {
        // Skip runs of pure whitespace between elements.
        let saved = self.pos;
        while !self.eof() && self.current_char().is_whitespace() {
            self.advance(1);
        }
        // If we reached a tag or EOF, keep the skip. Otherwise revert.
        if !self.eof() && !self.starts_with("<") {
            self.pos = saved;
        }
    }

    fn skip_comment(&mut self) {
        self.advance(4); // skip <!--
        while !self.eof() && !self.starts_with("-->") {
            self.advance(1);
        }
        if !self.eof() {
            self.advance(3);
        }
    }

    fn skip_past(&mut self, s: &str) {
        match self.input[self.pos..].find(s) {
            Some(i) => self.pos += i + s.len(),
            None => self.pos = self.input.len(),
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn current_char(&self) -> char {
        self.input[self.pos..].chars().next().unwrap_or('\0')
    }

    fn advance(&mut self, n: usize) {
        // Advance by `n` characters (not bytes).
        for _ in 0..n {
            if let Some(c) = self.input[self.pos..].chars().next() {
                self.pos += c.len_utf8();
            }
        }
    }
}

/// Hoist rows out of thead/tbody/tfoot so a table's children are its rows.
fn flatten_row_groups(children: Vec<DomNode>) -> Vec<DomNode> {
    let mut rows = Vec::new();
    for child in children {
        match child {
            DomNode::Element(e) if e.tag.is_row_group() => rows.extend(e.children),
            other => rows.push(other),
        }
    }
    rows
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.len() > h.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

/// Decode character references: the common named ones plus `&#NN;` and
/// `&#xHH;`. Unknown references are kept verbatim.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').filter(|&end| end <= 10).and_then(|end| {
            let name = &rest[1..end];
            decode_reference(name).map(|c| (c, end + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00A0}',
        "copy" => '\u{00A9}',
        "reg" => '\u{00AE}',
        "trade" => '\u{2122}',
        "euro" => '\u{20AC}',
        "pound" => '\u{00A3}',
        "deg" => '\u{00B0}',
        "bull" => '\u{2022}',
        "hellip" => '\u{2026}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        _ => return None,
    };
    Some(c)
}

// ---------------------------------------------------------------------------
// Document queries
// ---------------------------------------------------------------------------

/// A stylesheet referenced by the document itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleSource {
    /// Contents of a `<style>` element.
    Inline(String),
    /// `href` of a `<link rel="stylesheet">`.
    Link(String),
}

/// Collect `<style>` blocks and stylesheet links in document order.
/// Elements whose `media` excludes print are skipped.
pub fn collect_style_sources(nodes: &[DomNode]) -> Vec<StyleSource> {
    let mut out = Vec::new();
    walk_elements(nodes, &mut |e| {
        if !applies_to_print(e.attr("media")) {
            return;
        }
        match e.tag {
            Tag::Style => out.push(StyleSource::Inline(e.text_content())),
            Tag::Link => {
                let is_sheet = e
                    .attr("rel")
                    .map(|r| r.split_whitespace().any(|t| t.eq_ignore_ascii_case("stylesheet")))
                    .unwrap_or(false);
                if let (true, Some(href)) = (is_sheet, e.attr("href")) {
                    out.push(StyleSource::Link(href.trim().to_string()));
                }
            }
            _ => {}
        }
    });
    out
}

/// Every distinct `<img src>` in document order.
pub fn collect_image_sources(nodes: &[DomNode]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    walk_elements(nodes, &mut |e| {
        if e.tag == Tag::Img {
            if let Some(src) = e.src().map(str::trim).filter(|s| !s.is_empty()) {
                if !out.iter().any(|s| s == src) {
                    out.push(src.to_string());
                }
            }
        }
    });
    out
}

/// Text of the first `<title>` element.
pub fn document_title(nodes: &[DomNode]) -> Option<String> {
    let mut title = None;
    walk_elements(nodes, &mut |e| {
        if title.is_none() && e.tag == Tag::Title {
            let text = e.text_content().split_whitespace().collect::<Vec<_>>().join(" ");
            if !text.is_empty() {
                title = Some(text);
            }
        }
    });
    title
}

fn applies_to_print(media: Option<&str>) -> bool {
    match media {
        None => true,
        Some(m) => m.split(',').any(|q| {
            let q = q.trim().to_ascii_lowercase();
            q.is_empty() || q.contains("print") || q.contains("all")
        }),
    }
}

fn walk_elements<'a>(nodes: &'a [DomNode], f: &mut dyn FnMut(&'a ElementNode)) {
    for node in nodes {
        if let DomNode::Element(e) = node {
            f(e);
            walk_elements(&e.children, f);
        }
    }
}
