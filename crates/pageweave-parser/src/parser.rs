//! Hand-rolled recursive-descent scanner for the superset-HTML syntax.
//!
//! This is the "external parser" the design calls out as someone else's
//! problem — `pageweave-core` only ever talks to it through
//! [`MarkupParser`]. The grammar it accepts is deliberately small: elements
//! with quoted/unquoted/mustache attribute values, text runs, and `{{ ... }}`
//! expression islands in text. It tracks byte offset plus line/column for
//! every node so the rest of the pipeline can keep source locations through
//! every splice and clone.

use async_trait::async_trait;
use pageweave_types::{AttrValue, Attribute, Element, ExprFragment, Node, Position, Span, TextNode};

use crate::error::ParseError;

/// The top-level result of a parse: an ordered list of statements. The
/// bridge in `pageweave-core` is the one that insists the first statement
/// is a single element; this crate just reports what it scanned.
pub type Document = Vec<Node>;

/// A pluggable parser implementation. Kept as a trait (rather than a bare
/// function) so the loader can be driven by a test double without touching
/// the filesystem.
#[async_trait]
pub trait MarkupParser: Send + Sync {
    async fn parse(&self, text: &str, filename: &str) -> Result<Document, ParseError>;
}

/// The concrete parser this repo ships.
#[derive(Debug, Default)]
pub struct SimpleMarkupParser;

#[async_trait]
impl MarkupParser for SimpleMarkupParser {
    async fn parse(&self, text: &str, _filename: &str) -> Result<Document, ParseError> {
        Scanner::new(text).parse_document()
    }
}

impl SimpleMarkupParser {
    /// Synchronous entry point, handy from non-async call sites and tests.
    pub fn parse_sync(text: &str) -> Result<Document, ParseError> {
        Scanner::new(text).parse_document()
    }
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
    line: u32,
    col: u32,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0, line: 1, col: 1 }
    }

    fn position(&self) -> Position {
        Position { offset: self.pos, line: self.line, column: self.col }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn starts_with(&self, pat: &str) -> bool {
        self.rest().starts_with(pat)
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn parse_document(&mut self) -> Result<Document, ParseError> {
        self.parse_nodes(None)
    }

    /// Parses nodes until EOF (when `stop_tag` is `None`) or a matching
    /// closing tag is consumed (when `stop_tag` is `Some`).
    fn parse_nodes(&mut self, stop_tag: Option<&str>) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();
        loop {
            if self.eof() {
                if let Some(tag) = stop_tag {
                    return Err(ParseError::UnexpectedEof { expected: format!("</{}>", tag) });
                }
                return Ok(nodes);
            }

            if self.starts_with("<!--") {
                self.skip_comment();
                continue;
            }

            if self.starts_with("</") {
                self.advance_by(2);
                let name = self.scan_name();
                self.skip_ws();
                if self.peek_char() == Some('>') {
                    self.bump();
                }
                match stop_tag {
                    Some(expected) if expected == name => return Ok(nodes),
                    Some(expected) => {
                        return Err(ParseError::MismatchedClosingTag {
                            expected: expected.to_string(),
                            found: name,
                        })
                    }
                    None => {
                        // A stray closing tag at the top level is not
                        // itself a statement; skip it and keep scanning.
                        continue;
                    }
                }
            }

            if self.starts_with('<') {
                let el = self.parse_element()?;
                nodes.push(Node::Element(el));
                continue;
            }

            if self.starts_with("{{") {
                let frag = self.parse_expr_fragment()?;
                nodes.push(Node::Expr(frag));
                continue;
            }

            nodes.push(self.parse_text());
        }
    }

    fn skip_comment(&mut self) {
        self.advance_by(4); // "<!--"
        while !self.eof() && !self.starts_with("-->") {
            self.bump();
        }
        if self.starts_with("-->") {
            self.advance_by(3);
        }
    }

    fn parse_text(&mut self) -> Node {
        let start = self.position();
        let mut text = String::new();
        while !self.eof() && !self.starts_with('<') && !self.starts_with("{{") {
            if let Some(c) = self.bump() {
                text.push(c);
            }
        }
        let end = self.position();
        Node::Text(TextNode { text, span: Span { start, end } })
    }

    fn parse_expr_fragment(&mut self) -> Result<ExprFragment, ParseError> {
        let start = self.position();
        let offset = self.pos;
        self.advance_by(2); // "{{"
        let mut raw = String::new();
        while !self.eof() && !self.starts_with("}}") {
            if let Some(c) = self.bump() {
                raw.push(c);
            }
        }
        if !self.starts_with("}}") {
            return Err(ParseError::UnterminatedExpr { offset });
        }
        self.advance_by(2);
        let end = self.position();
        Ok(ExprFragment { raw: raw.trim().to_string(), span: Span { start, end } })
    }

    fn scan_name(&mut self) -> String {
        let mut name = String::new();
        if matches!(self.peek_char(), Some(':')) {
            name.push(self.bump().unwrap());
        }
        while matches!(self.peek_char(), Some(c) if c.is_alphanumeric() || c == '-' || c == '_') {
            name.push(self.bump().unwrap());
        }
        name
    }

    fn parse_element(&mut self) -> Result<Element, ParseError> {
        let start = self.position();
        self.bump(); // '<'
        let tag = self.scan_name();
        if tag.is_empty() {
            return Err(ParseError::InvalidTagName { found: self.rest().chars().take(8).collect() });
        }

        let mut attrs = Vec::new();
        loop {
            self.skip_ws();
            if self.starts_with("/>") || self.starts_with('>') || self.eof() {
                break;
            }
            attrs.push(self.parse_attribute()?);
        }

        if self.starts_with("/>") {
            self.advance_by(2);
            let end = self.position();
            return Ok(Element {
                tag,
                attrs,
                self_closing: true,
                children: Vec::new(),
                span: Span { start, end },
            });
        }

        if self.peek_char() == Some('>') {
            self.bump();
        } else if self.eof() {
            return Err(ParseError::UnexpectedEof { expected: format!("'>' for <{}>", tag) });
        }

        let children = self.parse_nodes(Some(&tag))?;
        let end = self.position();
        Ok(Element { tag, attrs, self_closing: false, children, span: Span { start, end } })
    }

    fn parse_attribute(&mut self) -> Result<Attribute, ParseError> {
        let start = self.position();
        let name = self.scan_attr_name();
        self.skip_ws();
        if self.peek_char() != Some('=') {
            let end = self.position();
            return Ok(Attribute {
                name,
                value: AttrValue::Literal(String::new()),
                span: Span { start, end },
            });
        }
        self.bump(); // '='
        self.skip_ws();
        let value = self.parse_attr_value()?;
        let end = self.position();
        Ok(Attribute { name, value, span: Span { start, end } })
    }

    fn scan_attr_name(&mut self) -> String {
        let mut name = String::new();
        while matches!(self.peek_char(), Some(c) if !c.is_whitespace() && c != '=' && c != '>' && c != '/') {
            name.push(self.bump().unwrap());
        }
        name
    }

    fn parse_attr_value(&mut self) -> Result<AttrValue, ParseError> {
        if self.starts_with("{{") {
            return Ok(AttrValue::Expr(self.parse_expr_fragment()?));
        }

        if let Some(quote) = self.peek_char().filter(|c| *c == '"' || *c == '\'') {
            let offset = self.pos;
            self.bump();
            let mut value = String::new();
            while !self.eof() && self.peek_char() != Some(quote) {
                value.push(self.bump().unwrap());
            }
            if self.peek_char() != Some(quote) {
                return Err(ParseError::UnterminatedAttribute { offset });
            }
            self.bump();
            return Ok(AttrValue::Literal(value));
        }

        let mut value = String::new();
        while matches!(self.peek_char(), Some(c) if !c.is_whitespace() && c != '>' && c != '/') {
            value.push(self.bump().unwrap());
        }
        Ok(AttrValue::Literal(value))
    }
}
